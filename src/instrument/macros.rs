//! Definition-time wrapping macros.
//!
//! These macros are the composition-time counterpart of per-call wrapping:
//! a function or an entire inherent impl defined through them is instrumented
//! at the point of definition, so call sites stay untouched and no per-method
//! opt-in exists. Each expansion builds a constant [`crate::CallSite`]
//! describing the callable and brackets the body with a span guard, so the
//! End event is emitted on every exit path, panic unwind included, and the
//! body's return value and failure behavior pass through unchanged.
//!
//! Supported method forms are `&self`, `&mut self`, and associated functions
//! (no receiver); the generated items preserve the original calling
//! convention. Methods with generic parameters are out of reach for a
//! declarative macro — wrap those bodies with [`crate::Traced::call`]
//! directly.

/// Defines one or more free functions wrapped in a Begin/End span.
///
/// The span is named after the function and its Begin event is seeded with
/// the defining module path.
///
/// # Examples
///
/// ```no_run
/// reqtrace::traced_fn! {
///     pub fn parse_manifest(raw: String) -> usize {
///         raw.lines().count()
///     }
/// }
///
/// fn main() {
///     reqtrace::context::set_current("req-1");
///     let lines = parse_manifest("a\nb".to_string());
///     assert_eq!(lines, 2);
/// }
/// ```
#[macro_export]
macro_rules! traced_fn {
    ($($(#[$attr:meta])* $vis:vis fn $name:ident ( $($arg:ident : $argty:ty),* $(,)? ) $(-> $ret:ty)? $body:block)+) => {
        $(
            $(#[$attr])*
            $vis fn $name ( $($arg : $argty),* ) $(-> $ret)? {
                const __TRACE_SITE: $crate::instrument::CallSite =
                    $crate::instrument::CallSite::function(
                        ::core::module_path!(),
                        ::core::stringify!($name),
                    );
                let _trace_span = $crate::instrument::Traced::new().enter_site(&__TRACE_SITE);
                $body
            }
        )+
    };
}

/// Defines an inherent impl in which every method is wrapped in a span.
///
/// Spans are named `Type.method`. All directly defined methods are wrapped —
/// receiver-taking and associated alike — with their calling convention
/// preserved: an associated function stays callable on the type with no
/// receiver.
///
/// # Examples
///
/// ```no_run
/// struct Counter {
///     value: u32,
/// }
///
/// reqtrace::traced_impl! {
///     impl Counter {
///         pub fn add(&mut self, n: u32) -> u32 {
///             self.value += n;
///             self.value
///         }
///
///         pub fn fresh() -> Self {
///             Self { value: 0 }
///         }
///     }
/// }
///
/// fn main() {
///     let mut counter = Counter::fresh();
///     assert_eq!(counter.add(2), 2);
/// }
/// ```
#[macro_export]
macro_rules! traced_impl {
    (impl $owner:ident { $($methods:tt)* }) => {
        impl $owner {
            $crate::__traced_methods! { owner $owner; $($methods)* }
        }
    };
}

/// Implementation detail of [`traced_impl!`]: munches one method definition
/// per step, choosing the wrapping strategy from the receiver form.
#[doc(hidden)]
#[macro_export]
macro_rules! __traced_methods {
    (owner $owner:ident;) => {};

    // `&mut self` methods.
    (owner $owner:ident;
        $(#[$attr:meta])* $vis:vis fn $name:ident
            ( & mut $self_tok:ident $(, $arg:ident : $argty:ty)* $(,)? )
            $(-> $ret:ty)? $body:block
        $($rest:tt)*
    ) => {
        $(#[$attr])*
        $vis fn $name ( & mut $self_tok $(, $arg : $argty)* ) $(-> $ret)? {
            const __TRACE_SITE: $crate::instrument::CallSite =
                $crate::instrument::CallSite::method(
                    ::core::module_path!(),
                    ::core::stringify!($owner),
                    ::core::stringify!($name),
                );
            let _trace_span = $crate::instrument::Traced::new().enter_site(&__TRACE_SITE);
            $body
        }
        $crate::__traced_methods! { owner $owner; $($rest)* }
    };

    // `&self` methods.
    (owner $owner:ident;
        $(#[$attr:meta])* $vis:vis fn $name:ident
            ( & $self_tok:ident $(, $arg:ident : $argty:ty)* $(,)? )
            $(-> $ret:ty)? $body:block
        $($rest:tt)*
    ) => {
        $(#[$attr])*
        $vis fn $name ( & $self_tok $(, $arg : $argty)* ) $(-> $ret)? {
            const __TRACE_SITE: $crate::instrument::CallSite =
                $crate::instrument::CallSite::method(
                    ::core::module_path!(),
                    ::core::stringify!($owner),
                    ::core::stringify!($name),
                );
            let _trace_span = $crate::instrument::Traced::new().enter_site(&__TRACE_SITE);
            $body
        }
        $crate::__traced_methods! { owner $owner; $($rest)* }
    };

    // Associated functions (no receiver).
    (owner $owner:ident;
        $(#[$attr:meta])* $vis:vis fn $name:ident
            ( $($arg:ident : $argty:ty),* $(,)? )
            $(-> $ret:ty)? $body:block
        $($rest:tt)*
    ) => {
        $(#[$attr])*
        $vis fn $name ( $($arg : $argty),* ) $(-> $ret)? {
            const __TRACE_SITE: $crate::instrument::CallSite =
                $crate::instrument::CallSite::associated(
                    ::core::module_path!(),
                    ::core::stringify!($owner),
                    ::core::stringify!($name),
                );
            let _trace_span = $crate::instrument::Traced::new().enter_site(&__TRACE_SITE);
            $body
        }
        $crate::__traced_methods! { owner $owner; $($rest)* }
    };
}
