//! Domain layer for the reqtrace library.
//!
//! This module contains the core types of the tracing pipeline, independent of
//! file-system or thread-registry concerns: the trace event wire model and the
//! crate's error types.
//!
//! # Organization
//!
//! - [`error`]: Error types and result aliases
//! - [`event`]: Trace event record model and argument merging
//!
//! # Examples
//!
//! ```
//! use reqtrace::domain::{Phase, Result, TraceEvent};
//!
//! fn make_marker() -> Result<TraceEvent> {
//!     Ok(TraceEvent::new(Phase::Metadata, "req-1:1", "1", "example"))
//! }
//! ```

pub mod error;
pub mod event;

pub use error::{Result, TraceError};
pub use event::{merge_args, Args, Phase, TraceEvent};
