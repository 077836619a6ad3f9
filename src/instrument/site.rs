//! Callable descriptors for automatic instrumentation.
//!
//! A [`CallSite`] describes one wrappable callable: where it is defined, what
//! owns it, and which calling convention it uses. Descriptors are constructed
//! once at the definition site (the wrapping macros build them as constants),
//! so no runtime inspection happens per call.

/// The calling convention of a wrapped callable.
///
/// One wrapping strategy exists per variant, chosen when the descriptor is
/// built rather than on every invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// A free function.
    Function,

    /// A method taking a receiver (`&self` or `&mut self`).
    Method,

    /// An associated function defined on a type but taking no receiver.
    Associated,
}

/// Identity of one instrumented callable.
///
/// # Examples
///
/// ```
/// use reqtrace::{CallKind, CallSite};
///
/// const SITE: CallSite = CallSite::method("app::store", "Store", "flush");
/// assert_eq!(SITE.default_name(), "Store.flush");
/// assert_eq!(SITE.kind, CallKind::Method);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite {
    /// Path of the defining module, as produced by `module_path!`.
    pub module: &'static str,

    /// Name of the owning type for methods and associated functions.
    pub owner: Option<&'static str>,

    /// The callable's own name.
    pub name: &'static str,

    /// Calling convention of the callable.
    pub kind: CallKind,
}

impl CallSite {
    /// Describes a free function.
    #[must_use]
    pub const fn function(module: &'static str, name: &'static str) -> Self {
        Self {
            module,
            owner: None,
            name,
            kind: CallKind::Function,
        }
    }

    /// Describes a receiver-taking method of `owner`.
    #[must_use]
    pub const fn method(module: &'static str, owner: &'static str, name: &'static str) -> Self {
        Self {
            module,
            owner: Some(owner),
            name,
            kind: CallKind::Method,
        }
    }

    /// Describes an associated (receiver-less) function of `owner`.
    #[must_use]
    pub const fn associated(module: &'static str, owner: &'static str, name: &'static str) -> Self {
        Self {
            module,
            owner: Some(owner),
            name,
            kind: CallKind::Associated,
        }
    }

    /// Derives the default span name: `Owner.name` when an owner exists,
    /// otherwise the bare callable name.
    #[must_use]
    pub fn default_name(&self) -> String {
        match self.owner {
            Some(owner) => format!("{owner}.{}", self.name),
            None => self.name.to_string(),
        }
    }
}
