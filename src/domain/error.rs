//! Error types for the reqtrace library.
//!
//! This module defines the centralized error type [`TraceError`] and a type alias
//! [`Result`] for convenient error handling throughout the crate. All errors are
//! implemented using the `thiserror` crate for automatic `Error` trait implementation.

use thiserror::Error;

/// The main error type for reqtrace operations.
///
/// This enum consolidates all error conditions that can occur while recording
/// trace events, from file I/O to configuration problems. Most variants wrap
/// underlying errors from external crates using `#[from]` for automatic conversion.
///
/// Two conditions are deliberately *not* errors and never produce a variant:
/// emitting with no active request id, and emitting for a request whose trace
/// file was never created. Both are the documented opt-in no-op cases.
///
/// # Examples
///
/// ```
/// use reqtrace::{Result, TraceError};
///
/// fn validate_config() -> Result<()> {
///     Err(TraceError::Config("trace_dir is not a directory".to_string()))
/// }
/// ```
#[derive(Debug, Error)]
pub enum TraceError {
    /// Filesystem or I/O operation failed.
    ///
    /// Wraps errors from standard library I/O operations. Automatically converts
    /// from `std::io::Error` using the `#[from]` attribute. A missing trace file
    /// on emit is swallowed before this variant is ever constructed; only
    /// unexpected failures (permissions, disk full, missing directory for a
    /// request that *was* initialized) surface here.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing a trace event or record failed.
    ///
    /// The string contains a description of what went wrong. With JSON-safe
    /// argument values this should not occur in practice.
    #[error("Encode error: {0}")]
    Encode(String),

    /// Dispatching work to the worker pool failed.
    ///
    /// Occurs when a job cannot be handed to the pool, typically because the
    /// pool has already shut down and closed its channel.
    #[error("Worker dispatch error: {0}")]
    Worker(String),

    /// Configuration is invalid or missing.
    ///
    /// Occurs when a configuration file cannot be parsed or contains malformed
    /// values. The string describes the specific configuration problem.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// A specialized `Result` type for reqtrace operations.
///
/// This is a type alias for `std::result::Result<T, TraceError>` that simplifies
/// function signatures throughout the codebase.
///
/// # Examples
///
/// ```
/// use reqtrace::Result;
///
/// fn record_something() -> Result<()> {
///     Ok(())
/// }
/// ```
pub type Result<T> = std::result::Result<T, TraceError>;
