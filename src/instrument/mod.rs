//! Automatic instrumentation of callables.
//!
//! This layer turns callables into traced callables without touching their
//! call sites. A [`CallSite`] descriptor fixes the identity and calling
//! convention of each wrappable item once, at definition time; [`Traced`]
//! applies the Begin/End bracketing around an invocation; and the
//! [`traced_fn!`](crate::traced_fn) / [`traced_impl!`](crate::traced_impl)
//! macros perform the wrapping wholesale when functions and inherent impls
//! are defined.
//!
//! Instrumentation is transparent by construction: return values and panics
//! pass through unchanged, and the End event is guaranteed by scoped-exit
//! semantics rather than catch-and-rethrow.
//!
//! # Organization
//!
//! - [`site`]: callable descriptors and default span naming
//! - [`traced`]: the per-invocation wrapper and its builder options
//! - [`macros`]: definition-time wrapping of functions and impl blocks

#[macro_use]
pub mod macros;
pub mod site;
pub mod traced;

pub use site::{CallKind, CallSite};
pub use traced::Traced;
