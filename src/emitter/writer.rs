//! Append-only trace file writer.
//!
//! Each emission performs its own open/append/flush/close cycle so no file
//! handle outlives a single record. Writes targeting the same request id are
//! serialized through an emitter-local lock so concurrent emitters can never
//! interleave bytes of two records; unrelated requests share no lock.

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock};

use crate::domain::Result;

/// Opening marker written when a trace file is created. The stream that
/// follows is a sequence of `{json},\n` records and is deliberately not
/// self-terminating; readers fix it up (see [`crate::emitter::read_trace_file`]).
pub(crate) const STREAM_OPENER: &[u8] = b"[\n";

/// Per-request write locks, created lazily on first use.
///
/// Entries are a handful of bytes each and live for the process, matching the
/// lifetime of the trace files themselves.
static FILE_LOCKS: OnceLock<Mutex<HashMap<String, Arc<Mutex<()>>>>> = OnceLock::new();

/// Returns the write lock for a request id, creating it on first use.
fn lock_for(request_id: &str) -> Arc<Mutex<()>> {
    let registry = FILE_LOCKS.get_or_init(|| Mutex::new(HashMap::new()));
    let mut map = registry
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    Arc::clone(
        map.entry(request_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(()))),
    )
}

/// Creates or truncates the trace file for a request and writes the opener.
///
/// # Errors
///
/// Any I/O failure propagates; enabling tracing is an explicit act and a
/// failure to do so must not pass silently.
pub(crate) fn create_trace_file(request_id: &str, path: &Path) -> Result<()> {
    let lock = lock_for(request_id);
    let _held = lock.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    file.write_all(STREAM_OPENER)?;
    file.flush()?;

    tracing::debug!(request_id = %request_id, path = ?path, "trace file created");
    Ok(())
}

/// Appends one pre-serialized record to a request's trace file.
///
/// Returns `Ok(true)` when the record was written and `Ok(false)` when the
/// file does not exist — tracing was never enabled for this request and the
/// record is dropped by design. The record is written with a single
/// `write_all` while the per-request lock is held.
///
/// # Errors
///
/// Any I/O failure other than the file being absent propagates.
pub(crate) fn append_record(request_id: &str, path: &Path, record: &str) -> Result<bool> {
    let lock = lock_for(request_id);
    let _held = lock.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

    let mut file = match OpenOptions::new().append(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::trace!(request_id = %request_id, "trace file absent, dropping record");
            return Ok(false);
        }
        Err(e) => return Err(e.into()),
    };

    file.write_all(record.as_bytes())?;
    file.flush()?;
    Ok(true)
}
