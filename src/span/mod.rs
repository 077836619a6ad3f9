//! Span lifecycle: named Begin/End intervals over the emitter.
//!
//! A [`Span`] is a value owned by the call frame that created it. Construction
//! is free of side effects; [`Span::begin`] and [`Span::end`] emit the paired
//! events, and `end` is idempotent so redundant calls are benign no-ops.
//!
//! The scoped form is the one instrumented code actually uses:
//! [`Span::enter`] emits Begin and returns an [`EnteredSpan`] whose `Drop`
//! guarantees the End event on every exit path, panic unwind included. Within
//! one thread spans therefore nest correctly by construction; across threads
//! consumers reconstruct nesting from the per-thread tag on each event.

use crate::domain::{merge_args, Args, Phase, Result};
use crate::emitter;

/// A named traced interval with optional begin/end metadata.
///
/// # Examples
///
/// ```no_run
/// use reqtrace::Span;
///
/// let span = Span::new("Store.flush");
/// let entered = span.enter()?;
/// // ... traced work ...
/// entered.end()?;
/// # Ok::<(), reqtrace::TraceError>(())
/// ```
#[derive(Debug)]
pub struct Span {
    name: String,
    begin_args: Option<Args>,
    end_args: Option<Args>,
    ended: bool,
}

impl Span {
    /// Creates a span with no attached metadata. Nothing is emitted.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_args(name, None, None)
    }

    /// Creates a span carrying metadata for its future Begin and End events.
    /// Nothing is emitted.
    #[must_use]
    pub fn with_args(
        name: impl Into<String>,
        begin_args: Option<Args>,
        end_args: Option<Args>,
    ) -> Self {
        Self {
            name: name.into(),
            begin_args,
            end_args,
            ended: false,
        }
    }

    /// Returns the span's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` once the End event has been emitted.
    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Emits the Begin event, merging the span's begin metadata with `extra`
    /// (keys from `extra` win on conflict).
    ///
    /// # Errors
    ///
    /// Unexpected I/O failures propagate; with no active request this is a
    /// silent no-op.
    pub fn begin(&mut self, extra: Option<&Args>) -> Result<()> {
        emitter::emit(
            Phase::Begin,
            Some(self.name.as_str()),
            merge_args(self.begin_args.as_ref(), extra),
            &[],
        )
    }

    /// Emits the End event, merging the span's end metadata with `extra`.
    ///
    /// Only the first call emits; subsequent calls are no-ops returning `Ok`.
    ///
    /// # Errors
    ///
    /// Unexpected I/O failures propagate, in which case the span does not
    /// count as ended and a retry may emit.
    pub fn end(&mut self, extra: Option<&Args>) -> Result<()> {
        if self.ended {
            return Ok(());
        }
        emitter::emit(
            Phase::End,
            Some(self.name.as_str()),
            merge_args(self.end_args.as_ref(), extra),
            &[],
        )?;
        self.ended = true;
        Ok(())
    }

    /// Emits Begin and converts the span into its scoped form.
    ///
    /// The returned [`EnteredSpan`] emits End when dropped, so the interval
    /// closes on every exit path of the enclosing scope.
    ///
    /// # Errors
    ///
    /// Propagates a Begin emission failure; in that case no guard exists and
    /// no End will be written.
    pub fn enter(mut self) -> Result<EnteredSpan> {
        self.begin(None)?;
        Ok(EnteredSpan { span: self })
    }
}

/// A span that has emitted Begin and owes exactly one End.
///
/// Dropping the guard emits the End event if [`EnteredSpan::end`] was not
/// called explicitly. Emission failures on the drop path cannot propagate and
/// are reported through the diagnostic log instead.
#[derive(Debug)]
pub struct EnteredSpan {
    span: Span,
}

impl EnteredSpan {
    /// Ends the span now, surfacing any emission failure.
    ///
    /// # Errors
    ///
    /// Unexpected I/O failures propagate. The guard's later drop is a no-op
    /// either way once the End event has been written.
    pub fn end(self) -> Result<()> {
        self.end_with(None)
    }

    /// Ends the span now with extra End metadata (keys from `extra` win).
    ///
    /// # Errors
    ///
    /// Unexpected I/O failures propagate. A failed explicit end is not
    /// retried by the guard's drop; the failure was already surfaced here.
    pub fn end_with(mut self, extra: Option<&Args>) -> Result<()> {
        let result = self.span.end(extra);
        self.span.ended = true;
        result
    }
}

impl Drop for EnteredSpan {
    fn drop(&mut self) {
        if let Err(e) = self.span.end(None) {
            tracing::error!(span = %self.span.name, error = %e, "failed to emit end event on drop");
        }
    }
}
