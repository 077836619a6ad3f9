//! Trace event model for the on-disk event stream.
//!
//! This module defines the record types written to per-request trace files.
//! These types are separate from the span lifecycle layer to maintain a clear
//! boundary between the wire representation and the recording logic. The field
//! set follows the Chrome trace-event convention (`ph`, `ts`, `cat`, `pid`,
//! `tid`, `name`, `args`) so existing trace viewers can consume the files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Argument map attached to a trace event.
///
/// Keys map to arbitrary JSON-safe values. A `BTreeMap` keeps serialized
/// output deterministic, which makes trace files diffable and test
/// assertions stable.
pub type Args = BTreeMap<String, serde_json::Value>;

/// The phase of a trace event.
///
/// Serialized as the single-letter codes the trace-viewer format expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Start of a traced interval.
    #[serde(rename = "B")]
    Begin,

    /// End of a traced interval.
    #[serde(rename = "E")]
    End,

    /// Out-of-band metadata for a request's event stream, such as a
    /// human-readable operation name recorded when tracing is enabled.
    #[serde(rename = "M")]
    Metadata,
}

/// One serialized record in a request's event stream.
///
/// Every event belongs to exactly one request's trace file. Ordering within a
/// file follows emission order; the timestamp is advisory and consumers must
/// use `tid` to reconstruct per-thread nesting.
///
/// # Examples
///
/// ```
/// use reqtrace::{Phase, TraceEvent};
///
/// let event = TraceEvent::new(Phase::Begin, "req-1:4242", "7", "api");
/// assert!(event.name.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEvent {
    /// Event phase (`B`, `E`, or `M`).
    pub ph: Phase,

    /// Emission time in microseconds since the Unix epoch.
    pub ts: f64,

    /// Comma-joined category tags. The first tag is the configured default
    /// category (normally the program name).
    pub cat: String,

    /// Process tag in the form `<request_id>:<os_pid>`. Keying the process
    /// lane by request id is what groups one request's events in a viewer.
    pub pid: String,

    /// Tag of the emitting thread, unique within the process.
    pub tid: String,

    /// Span or metadata name, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Structured arguments attached to the event, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Args>,
}

impl TraceEvent {
    /// Creates an event stamped with the current wall-clock time.
    ///
    /// `name` and `args` start out empty; callers fill them in before the
    /// event is serialized.
    pub fn new(
        ph: Phase,
        pid: impl Into<String>,
        tid: impl Into<String>,
        cat: impl Into<String>,
    ) -> Self {
        Self {
            ph,
            ts: chrono::Utc::now().timestamp_micros() as f64,
            cat: cat.into(),
            pid: pid.into(),
            tid: tid.into(),
            name: None,
            args: None,
        }
    }
}

/// Merges two optional argument maps, with `extra` winning on key conflicts.
///
/// Either side may be absent, in which case the merge degrades to a clone of
/// whichever side is present, or `None` if both are absent.
///
/// # Examples
///
/// ```
/// use reqtrace::merge_args;
/// use serde_json::json;
/// use std::collections::BTreeMap;
///
/// let base = BTreeMap::from([("k".to_string(), json!(1))]);
/// let extra = BTreeMap::from([("k".to_string(), json!(2))]);
///
/// let merged = merge_args(Some(&base), Some(&extra)).unwrap();
/// assert_eq!(merged["k"], json!(2));
/// assert!(merge_args(None, None).is_none());
/// ```
#[must_use]
pub fn merge_args(base: Option<&Args>, extra: Option<&Args>) -> Option<Args> {
    match (base, extra) {
        (None, None) => None,
        (Some(a), None) => Some(a.clone()),
        (None, Some(b)) => Some(b.clone()),
        (Some(a), Some(b)) => {
            let mut merged = a.clone();
            for (key, value) in b {
                merged.insert(key.clone(), value.clone());
            }
            Some(merged)
        }
    }
}
