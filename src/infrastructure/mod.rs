//! Infrastructure utilities for the reqtrace library.
//!
//! This module provides the platform-facing pieces the tracing pipeline needs:
//! trace file location and listing, and the process/thread identity tags
//! stamped onto every event.
//!
//! # Organization
//!
//! - [`paths`]: Trace directory defaults, per-request file paths, listing
//! - [`ident`]: Process tag, thread tag, and default category derivation

pub mod ident;
pub mod paths;

pub use ident::{process_tag, program_name, thread_tag};
pub use paths::{default_trace_dir, list_trace_files, trace_path};
