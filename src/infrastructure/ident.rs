//! Process and thread identity tags for trace events.
//!
//! Trace viewers group events into lanes by `pid` and `tid`. The process tag
//! deliberately embeds the request id so one request's events form a single
//! top-level group even when several requests trace through the same OS
//! process concurrently.

use std::sync::atomic::{AtomicU64, Ordering};

/// Next unassigned thread tag. Tags start at 1 so 0 never appears in output.
static NEXT_THREAD_TAG: AtomicU64 = AtomicU64::new(1);

thread_local! {
    /// Tag for the current thread, assigned on first use.
    static THREAD_TAG: u64 = NEXT_THREAD_TAG.fetch_add(1, Ordering::Relaxed);
}

/// Returns the process tag for a request: `<request_id>:<os_pid>`.
///
/// # Examples
///
/// ```
/// use reqtrace::infrastructure::process_tag;
///
/// let tag = process_tag("req-1");
/// assert!(tag.starts_with("req-1:"));
/// ```
#[must_use]
pub fn process_tag(request_id: &str) -> String {
    format!("{request_id}:{}", std::process::id())
}

/// Returns the tag of the calling thread as a string.
///
/// Tags are process-unique ordinals assigned on first use; std's `ThreadId`
/// exposes no stable numeric accessor. Consumers only need per-thread
/// distinctness within one process to reconstruct nesting.
#[must_use]
pub fn thread_tag() -> String {
    THREAD_TAG.with(|tag| tag.to_string())
}

/// Returns the program name used as the default event category.
///
/// Derived from the file name of the first command-line argument, falling back
/// to `"trace"` when the argument vector is empty or unusable (as under some
/// embedders and test harnesses).
#[must_use]
pub fn program_name() -> String {
    std::env::args()
        .next()
        .as_deref()
        .map(std::path::Path::new)
        .and_then(|path| path.file_name())
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| "trace".to_string())
}
