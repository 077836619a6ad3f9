//! Ambient request-id registry with explicit cross-thread propagation.
//!
//! Every tracing operation resolves the request it belongs to through this
//! registry: a thread-local slot holding the currently active request id.
//! The hosting request framework calls [`set_current`] once per inbound
//! request; tracing becomes a no-op on threads where the slot is empty.
//!
//! Crossing a thread boundary never happens implicitly. The dispatching side
//! takes a [`CapturedRequest`] snapshot, ships it with the unit of work, and
//! the borrowed thread installs it through a [`RequestGuard`] that restores
//! the previous binding (including absence) when the work completes, on every
//! exit path. This keeps the ambient state from leaking onto unrelated work
//! that later runs on the same thread.

use std::cell::RefCell;

thread_local! {
    /// The active request id for this thread, if any. `None` is distinct from
    /// a present-but-empty id.
    static CURRENT_REQUEST: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Establishes the active request id for the calling thread.
///
/// Replaces any previously active id. Safe to call from any thread; the
/// binding is visible only to the calling thread.
///
/// # Examples
///
/// ```
/// reqtrace::context::set_current("req-1");
/// assert_eq!(reqtrace::context::current().as_deref(), Some("req-1"));
/// reqtrace::context::clear_current();
/// ```
pub fn set_current(request_id: impl Into<String>) {
    let request_id = request_id.into();
    tracing::debug!(request_id = %request_id, "binding request to thread");
    CURRENT_REQUEST.with(|slot| *slot.borrow_mut() = Some(request_id));
}

/// Returns the calling thread's active request id, or `None` when no request
/// is active. Never blocks.
#[must_use]
pub fn current() -> Option<String> {
    CURRENT_REQUEST.with(|slot| slot.borrow().clone())
}

/// Removes the calling thread's active request id, if any.
pub fn clear_current() {
    CURRENT_REQUEST.with(|slot| {
        if slot.borrow_mut().take().is_some() {
            tracing::debug!("cleared request binding");
        }
    });
}

/// A snapshot of the dispatching thread's ambient request id.
///
/// Capturing absence is legal and means the unit of work travels
/// uninstrumented. The snapshot is inert until [`CapturedRequest::install`]
/// binds it to the executing thread.
///
/// # Examples
///
/// ```
/// use reqtrace::context;
///
/// context::set_current("req-7");
/// let captured = context::capture();
///
/// std::thread::spawn(move || {
///     let _guard = captured.install();
///     assert_eq!(context::current().as_deref(), Some("req-7"));
/// })
/// .join()
/// .unwrap();
/// # context::clear_current();
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedRequest {
    request_id: Option<String>,
}

impl CapturedRequest {
    /// Returns the captured request id, if one was active at capture time.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// Returns `true` if a request id was active at capture time.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.request_id.is_some()
    }

    /// Installs the captured id into the calling thread's ambient slot.
    ///
    /// The returned guard restores the slot's previous contents when dropped.
    /// Installing an empty capture still returns a guard, which restores the
    /// previous state just the same; callers that want pass-through semantics
    /// check [`CapturedRequest::is_active`] first.
    #[must_use = "dropping the guard immediately would restore the previous binding at once"]
    pub fn install(&self) -> RequestGuard {
        let previous = CURRENT_REQUEST.with(|slot| {
            std::mem::replace(&mut *slot.borrow_mut(), self.request_id.clone())
        });
        RequestGuard { previous }
    }
}

/// Takes a snapshot of the calling thread's ambient request id.
#[must_use]
pub fn capture() -> CapturedRequest {
    CapturedRequest {
        request_id: current(),
    }
}

/// Guard that restores a thread's previous request binding on drop.
///
/// Created by [`CapturedRequest::install`]. Restoration runs on every exit
/// path, panic unwind included, so a borrowed pool thread always reverts to
/// its prior state before picking up unrelated work.
#[derive(Debug)]
pub struct RequestGuard {
    previous: Option<String>,
}

impl Drop for RequestGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CURRENT_REQUEST.with(|slot| *slot.borrow_mut() = previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_clear_round_trip() {
        set_current("req-a");
        assert_eq!(current().as_deref(), Some("req-a"));

        clear_current();
        assert_eq!(current(), None);
    }

    #[test]
    fn empty_id_is_distinct_from_absent() {
        set_current("");
        assert_eq!(current().as_deref(), Some(""));
        clear_current();
    }

    #[test]
    fn bindings_are_thread_scoped() {
        set_current("req-main");
        let seen = std::thread::spawn(current).join().unwrap();
        assert_eq!(seen, None);
        clear_current();
    }

    #[test]
    fn guard_restores_previous_binding() {
        set_current("outer");
        let captured = CapturedRequest {
            request_id: Some("inner".to_string()),
        };

        {
            let _guard = captured.install();
            assert_eq!(current().as_deref(), Some("inner"));
        }

        assert_eq!(current().as_deref(), Some("outer"));
        clear_current();
    }

    #[test]
    fn guard_restores_absence() {
        clear_current();
        let captured = CapturedRequest {
            request_id: Some("transient".to_string()),
        };

        {
            let _guard = captured.install();
            assert_eq!(current().as_deref(), Some("transient"));
        }

        assert_eq!(current(), None);
    }

    #[test]
    fn guard_restores_on_panic() {
        clear_current();
        let captured = CapturedRequest {
            request_id: Some("panicky".to_string()),
        };

        let result = std::panic::catch_unwind(|| {
            let _guard = captured.install();
            panic!("boom");
        });

        assert!(result.is_err());
        assert_eq!(current(), None);
    }

    #[test]
    fn capture_reflects_ambient_state() {
        clear_current();
        assert!(!capture().is_active());

        set_current("req-c");
        let captured = capture();
        assert_eq!(captured.request_id(), Some("req-c"));
        clear_current();
    }
}
