//! Path utilities for locating per-request trace files.
//!
//! This module maps request identifiers to their on-disk trace files under the
//! configured trace directory, and enumerates the files an external viewer can
//! list. One file exists per request id; the emitter never deletes them.

use std::path::{Path, PathBuf};

use crate::domain::Result;

/// File extension used for per-request trace files.
const TRACE_EXTENSION: &str = "trace";

/// Returns the default directory for trace files.
///
/// Falls back to the platform temporary directory, matching the common case
/// where tracing is enabled ad hoc and files are collected by a viewer rather
/// than retained long-term.
///
/// # Examples
///
/// ```
/// use reqtrace::infrastructure::default_trace_dir;
///
/// let dir = default_trace_dir();
/// assert!(dir.is_absolute());
/// ```
#[must_use]
pub fn default_trace_dir() -> PathBuf {
    std::env::temp_dir()
}

/// Returns the trace file path for a request id under the given directory.
///
/// The file is named `<request_id>.trace`. The request id is used verbatim;
/// callers supply opaque tokens that are already safe as file names.
///
/// # Examples
///
/// ```
/// use reqtrace::infrastructure::trace_path;
/// use std::path::Path;
///
/// let path = trace_path(Path::new("/tmp"), "req-1");
/// assert_eq!(path, Path::new("/tmp/req-1.trace"));
/// ```
#[must_use]
pub fn trace_path(dir: &Path, request_id: &str) -> PathBuf {
    dir.join(format!("{request_id}.{TRACE_EXTENSION}"))
}

/// Lists the trace files present under a directory, sorted by file name.
///
/// This is the set an external viewer offers for selection. Non-trace entries
/// are skipped; unreadable directory entries are ignored rather than failing
/// the whole listing.
///
/// # Errors
///
/// Returns an error if the directory itself cannot be read.
pub fn list_trace_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext == TRACE_EXTENSION)
        })
        .collect();

    files.sort();

    tracing::debug!(dir = ?dir, count = files.len(), "listed trace files");
    Ok(files)
}
