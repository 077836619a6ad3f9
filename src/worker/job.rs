//! Request-context propagation across the worker-pool hand-off.
//!
//! A unit of work dispatched to a borrowed thread runs outside the normal
//! call stack of the requesting thread, so the ambient request lookup on the
//! borrowed thread would find nothing. [`TracedJob`] closes that gap: it
//! snapshots the dispatching thread's ambient request id at construction and,
//! when run, installs the id around exactly the one invocation — bracketed by
//! a synthetic span covering the hand-off — then restores the thread's
//! previous state so later, unrelated work is not misattributed.

use crate::context::{self, CapturedRequest};
use crate::span::Span;

/// Span-name prefix for the synthetic hand-off span.
const JOB_SPAN_PREFIX: &str = "worker";

/// One unit of work carrying its originating request context.
///
/// Construct on the dispatching thread, run on the borrowed one. When no
/// request was active at construction the job degrades to a pure
/// pass-through: no tracing, no ambient-slot mutation.
///
/// # Examples
///
/// ```
/// use reqtrace::{context, TracedJob};
///
/// context::set_current("req-7");
/// let job = TracedJob::new("Cache.refill", || 2 + 2);
/// context::clear_current();
///
/// let four = std::thread::spawn(move || job.run()).join().unwrap();
/// assert_eq!(four, 4);
/// ```
#[derive(Debug)]
pub struct TracedJob<F> {
    captured: CapturedRequest,
    label: String,
    f: F,
}

impl<F, R> TracedJob<F>
where
    F: FnOnce() -> R,
{
    /// Captures the calling thread's ambient request id and packages the
    /// callable for dispatch. `label` names the dispatched callable,
    /// qualified by its owner where one exists (e.g. `"Store.flush"`).
    pub fn new(label: impl Into<String>, f: F) -> Self {
        let captured = context::capture();
        let label = label.into();
        tracing::debug!(
            label = %label,
            request_id = captured.request_id().unwrap_or("<none>"),
            "captured request context for dispatch"
        );
        Self { captured, label, f }
    }

    /// Executes the unit of work on the current thread.
    ///
    /// With a captured request id: installs it, opens the synthetic hand-off
    /// span, invokes the callable, ends the span unconditionally, and
    /// restores the thread's previous ambient state — in exactly that order,
    /// so the install/restore pair brackets the single invocation. Without
    /// one, invokes the callable directly.
    pub fn run(self) -> R {
        if !self.captured.is_active() {
            return (self.f)();
        }

        // Guard declared before the span so it drops after the End event:
        // the End must be emitted while the request id is still installed.
        let _binding = self.captured.install();

        let span = Span::new(format!("{JOB_SPAN_PREFIX}: {}", self.label));
        match span.enter() {
            Ok(entered) => {
                let ret = (self.f)();
                if let Err(e) = entered.end() {
                    tracing::error!(label = %self.label, error = %e, "failed to end hand-off span");
                }
                ret
            }
            Err(e) => {
                tracing::error!(label = %self.label, error = %e, "failed to begin hand-off span");
                (self.f)()
            }
        }
    }
}

/// Wraps a callable for dispatch, capturing the ambient request id now and
/// propagating it around the invocation later.
///
/// This is the adapter for foreign dispatch primitives: whatever executes the
/// returned closure gets the install/span/restore bracketing of
/// [`TracedJob::run`].
pub fn traced_job<F, R>(label: impl Into<String>, f: F) -> impl FnOnce() -> R
where
    F: FnOnce() -> R,
{
    let job = TracedJob::new(label, f);
    move || job.run()
}
