//! Trace event emitter with per-request append-only files.
//!
//! The emitter owns the on-disk side of the pipeline: one file per request id
//! under the configured trace directory, created when tracing is enabled for a
//! request and appended to by every subsequent emission.
//!
//! # File format
//!
//! A trace file starts with a literal `[\n` and continues as a sequence of
//! single-line JSON objects, each followed by `,\n`. The stream is therefore
//! not valid JSON on its own — the trailing separator always dangles. This is
//! deliberate: appends stay cheap and crash-safe, and readers fix the stream
//! up ([`read_trace_file`] does exactly that).
//!
//! # Opt-in semantics
//!
//! Tracing is opt-in per request. Emitting with no ambient request id, or for
//! a request whose file was never created, is a silent no-op rather than an
//! error. Only unexpected I/O failures surface to the caller.
//!
//! # Modules
//!
//! - `writer`: per-request locking and the open/append/close cycle

mod writer;

use std::path::Path;

use crate::context;
use crate::domain::{Args, Phase, Result, TraceError, TraceEvent};
use crate::infrastructure::{process_tag, thread_tag, trace_path};

/// Metadata event name understood by trace viewers as the stream's
/// human-readable label.
const METADATA_NAME: &str = "thread_name";

/// Enables tracing for a request: creates (or truncates) its trace file,
/// writes the opening marker, and records one Metadata event carrying
/// `initial_args`.
///
/// Must be called once per request before any emission targeting it; an
/// emission for a request that was never enabled is silently dropped.
/// Callers use `initial_args` to record identifying context, such as a
/// human-readable operation name.
///
/// The configured trace directory is created if it does not exist yet.
///
/// # Errors
///
/// Any I/O failure propagates.
///
/// # Examples
///
/// ```no_run
/// use reqtrace::begin_request_trace;
///
/// begin_request_trace("req-1", None)?;
/// # Ok::<(), reqtrace::TraceError>(())
/// ```
pub fn begin_request_trace(request_id: &str, initial_args: Option<Args>) -> Result<()> {
    let config = crate::active_config();
    std::fs::create_dir_all(&config.trace_dir)?;

    let path = trace_path(&config.trace_dir, request_id);
    writer::create_trace_file(request_id, &path)?;

    emit_for(request_id, Phase::Metadata, Some(METADATA_NAME), initial_args, &[])
}

/// Enables tracing for the calling thread's ambient request.
///
/// Convenience over [`begin_request_trace`] for callers that have already
/// bound the request id via [`context::set_current`]. A no-op when no request
/// is active.
///
/// # Errors
///
/// Any I/O failure propagates.
pub fn trace_current_request(initial_args: Option<Args>) -> Result<()> {
    match context::current() {
        Some(request_id) => begin_request_trace(&request_id, initial_args),
        None => Ok(()),
    }
}

/// Emits one trace event for the calling thread's ambient request.
///
/// Resolves the ambient request id; if none is active, returns silently with
/// no side effect. Otherwise appends one event to the request's trace file:
/// timestamp is the emission time, the process tag is `<request_id>:<pid>`,
/// the thread tag identifies the emitting thread, and the category is the
/// configured default tag joined with any supplied `tags`.
///
/// # Errors
///
/// Unexpected I/O failures propagate. The trace file being absent is the
/// documented opt-in case and is swallowed.
///
/// # Examples
///
/// ```no_run
/// use reqtrace::{context, emit, Phase};
///
/// context::set_current("req-1");
/// emit(Phase::Begin, Some("handler"), None, &["api"])?;
/// # Ok::<(), reqtrace::TraceError>(())
/// ```
pub fn emit(phase: Phase, name: Option<&str>, args: Option<Args>, tags: &[&str]) -> Result<()> {
    match context::current() {
        Some(request_id) => emit_for(&request_id, phase, name, args, tags),
        None => Ok(()),
    }
}

/// Emits one trace event targeting an explicit request id.
///
/// Used where the ambient registry is not the source of truth, such as
/// recording the initial Metadata event before the caller has bound the id to
/// any thread.
///
/// # Errors
///
/// Unexpected I/O failures propagate; an absent trace file is swallowed.
pub fn emit_for(
    request_id: &str,
    phase: Phase,
    name: Option<&str>,
    args: Option<Args>,
    tags: &[&str],
) -> Result<()> {
    let config = crate::active_config();
    let path = trace_path(&config.trace_dir, request_id);

    let mut category = config.category.clone();
    for tag in tags {
        category.push(',');
        category.push_str(tag);
    }

    let mut event = TraceEvent::new(phase, process_tag(request_id), thread_tag(), category);
    event.name = name.map(str::to_string);
    event.args = args;

    let json = serde_json::to_string(&event)
        .map_err(|e| TraceError::Encode(format!("failed to serialize trace event: {e}")))?;
    let record = format!("{json},\n");

    writer::append_record(request_id, &path, &record)?;
    Ok(())
}

/// Reads a trace file back into events, fixing up the streaming format.
///
/// Performs the read-side fix-up the format demands: strips the opening
/// marker and the dangling trailing separator, closes the array, and parses.
/// An unmatched Begin at the tail (a process killed mid-request) parses fine;
/// only truncated bytes inside a record fail.
///
/// # Errors
///
/// Returns an error if the file cannot be read or a record is malformed.
///
/// # Examples
///
/// ```no_run
/// use reqtrace::read_trace_file;
/// use std::path::Path;
///
/// let events = read_trace_file(Path::new("/tmp/req-1.trace"))?;
/// # Ok::<(), reqtrace::TraceError>(())
/// ```
pub fn read_trace_file(path: &Path) -> Result<Vec<TraceEvent>> {
    let contents = std::fs::read_to_string(path)?;

    let body = contents.strip_prefix("[\n").unwrap_or(&contents);
    let body = body.trim_end();
    let body = body.strip_suffix(',').unwrap_or(body);

    let document = format!("[{body}]");
    serde_json::from_str(&document)
        .map_err(|e| TraceError::Encode(format!("failed to parse trace file: {e}")))
}
