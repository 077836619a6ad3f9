//! Worker-pool execution with request-context propagation.
//!
//! Hand-off to a borrowed thread is the one place correlation would silently
//! break, so this module owns both sides of the seam: the propagation hook
//! that captures the dispatching thread's request id and installs it around
//! exactly one unit of work, and a bounded pool that applies the hook on
//! every dispatch.
//!
//! # Organization
//!
//! - `job`: capture/install/span/invoke/restore wrapper around one callable
//! - `pool`: bounded thread pool applying the wrapper at its dispatch seam

pub mod job;
pub mod pool;

pub use job::{traced_job, TracedJob};
pub use pool::WorkerPool;
