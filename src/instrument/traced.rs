//! The instrumentation wrapper around callables.
//!
//! [`Traced`] turns one invocation of a callable into a Begin/End span pair
//! while staying transparent to the callable itself: the return value passes
//! through unchanged and a panic propagates unchanged, with the End event
//! emitted first via the span's drop guard. Emission failures inside the
//! wrapper are reported through the diagnostic log rather than allowed to
//! alter the wrapped call's observable behavior.

use serde_json::json;

use crate::domain::{merge_args, Args};
use crate::span::{EnteredSpan, Span};

use super::site::CallSite;

/// Naming callback: receives the derived default name and the call site,
/// returns the span name to use.
type NameFn = Box<dyn Fn(&str, &CallSite) -> String + Send + Sync>;

/// Instrumentation configuration applied around a callable.
///
/// Name resolution precedence: an explicitly configured name overrides the
/// naming callback, which overrides the `Owner.method` / `function` default
/// derived from the call site.
///
/// # Examples
///
/// ```no_run
/// use reqtrace::{CallSite, Traced};
///
/// const SITE: CallSite = CallSite::function(module_path!(), "load");
///
/// let loaded = Traced::new().call(&SITE, || 42);
/// assert_eq!(loaded, 42);
/// ```
#[derive(Default)]
pub struct Traced {
    name: Option<String>,
    name_fn: Option<NameFn>,
    begin_args: Option<Args>,
    end_args: Option<Args>,
}

impl Traced {
    /// Creates an instrumentation wrapper with default naming and no static
    /// metadata.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the span name outright.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets a naming callback invoked with the derived default name.
    #[must_use]
    pub fn with_name_fn(
        mut self,
        name_fn: impl Fn(&str, &CallSite) -> String + Send + Sync + 'static,
    ) -> Self {
        self.name_fn = Some(Box::new(name_fn));
        self
    }

    /// Attaches static metadata to every Begin event.
    #[must_use]
    pub fn with_begin_args(mut self, begin_args: Args) -> Self {
        self.begin_args = Some(begin_args);
        self
    }

    /// Attaches static metadata to every End event.
    #[must_use]
    pub fn with_end_args(mut self, end_args: Args) -> Self {
        self.end_args = Some(end_args);
        self
    }

    /// Resolves the span name for a call site per the precedence rules.
    #[must_use]
    pub fn resolve_name(&self, site: &CallSite) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        let default = site.default_name();
        match &self.name_fn {
            Some(name_fn) => name_fn(&default, site),
            None => default,
        }
    }

    /// Begin metadata seeded with the defining module, merged with the
    /// configured static args (configured keys win over the seed).
    fn seeded_begin_args(&self, site: &CallSite) -> Option<Args> {
        let seed = Args::from([("module".to_string(), json!(site.module))]);
        merge_args(Some(&seed), self.begin_args.as_ref())
    }

    /// Invokes `f` inside a span for `site`.
    ///
    /// Equivalent to [`Traced::call_with`] with no per-call metadata.
    pub fn call<R>(&self, site: &CallSite, f: impl FnOnce() -> R) -> R {
        self.call_with(site, None, f, |_| None)
    }

    /// Invokes `f` inside a span for `site`, with per-call Begin metadata and
    /// End metadata derived from the return value.
    ///
    /// `begin_extra` keys win over the seeded/static Begin metadata. `end_fn`
    /// runs only on the normal return path; on unwind the End event carries
    /// the static End metadata alone.
    pub fn call_with<R>(
        &self,
        site: &CallSite,
        begin_extra: Option<&Args>,
        f: impl FnOnce() -> R,
        end_fn: impl FnOnce(&R) -> Option<Args>,
    ) -> R {
        let entered = self.enter_at(site, begin_extra);
        let ret = f();
        if let Some(entered) = entered {
            if let Err(e) = entered.end_with(end_fn(&ret).as_ref()) {
                tracing::error!(error = %e, "failed to emit end event");
            }
        }
        ret
    }

    /// Opens the span for one invocation at `site`, logging rather than
    /// propagating emission failures.
    ///
    /// Returns `None` when Begin could not be emitted; the invocation then
    /// proceeds untraced. The returned guard still emits End on unwind, which
    /// is what makes [`Traced::call_with`] panic-transparent.
    #[must_use]
    pub fn enter_at(&self, site: &CallSite, begin_extra: Option<&Args>) -> Option<EnteredSpan> {
        let begin_args = merge_args(self.seeded_begin_args(site).as_ref(), begin_extra);
        let span = Span::with_args(self.resolve_name(site), begin_args, self.end_args.clone());
        match span.enter() {
            Ok(entered) => Some(entered),
            Err(e) => {
                tracing::error!(site = %site.default_name(), error = %e, "failed to emit begin event");
                None
            }
        }
    }

    /// Opens the span for one invocation at `site` with no per-call metadata.
    ///
    /// This is the form the wrapping macros expand to: bind the guard, run
    /// the body, and let scope exit close the interval.
    #[must_use]
    pub fn enter_site(&self, site: &CallSite) -> Option<EnteredSpan> {
        self.enter_at(site, None)
    }
}

impl std::fmt::Debug for Traced {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Traced")
            .field("name", &self.name)
            .field("begin_args", &self.begin_args)
            .field("end_args", &self.end_args)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context;
    use crate::domain::Phase;
    use crate::emitter::read_trace_file;
    use crate::infrastructure::trace_path;
    use crate::testsupport;

    const FREE_SITE: CallSite = CallSite::function("tests::module", "free_op");
    const METHOD_SITE: CallSite = CallSite::method("tests::module", "Widget", "draw");

    fn args(pairs: &[(&str, serde_json::Value)]) -> Args {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    fn enable(request_id: &str) {
        crate::begin_request_trace(request_id, None).unwrap();
        context::set_current(request_id);
    }

    #[test]
    fn name_precedence_explicit_over_callback_over_default() {
        let derived = Traced::new().resolve_name(&METHOD_SITE);
        assert_eq!(derived, "Widget.draw");

        let via_callback = Traced::new()
            .with_name_fn(|default, _| format!("cb:{default}"))
            .resolve_name(&METHOD_SITE);
        assert_eq!(via_callback, "cb:Widget.draw");

        let explicit = Traced::new()
            .with_name("fixed")
            .with_name_fn(|default, _| format!("cb:{default}"))
            .resolve_name(&METHOD_SITE);
        assert_eq!(explicit, "fixed");
    }

    #[test]
    fn call_passes_value_through_and_brackets_once() {
        let dir = testsupport::trace_dir();
        enable("traced-value");

        let out = Traced::new().call(&FREE_SITE, || "payload");
        context::clear_current();
        assert_eq!(out, "payload");

        let events = read_trace_file(&trace_path(dir, "traced-value")).unwrap();
        let begins = events.iter().filter(|e| e.ph == Phase::Begin).count();
        let ends = events.iter().filter(|e| e.ph == Phase::End).count();
        assert_eq!((begins, ends), (1, 1));
    }

    #[test]
    fn begin_event_is_seeded_with_module() {
        let dir = testsupport::trace_dir();
        enable("traced-module");

        Traced::new().call(&FREE_SITE, || ());
        context::clear_current();

        let events = read_trace_file(&trace_path(dir, "traced-module")).unwrap();
        let begin = events.iter().find(|e| e.ph == Phase::Begin).unwrap();
        assert_eq!(
            begin.args.as_ref().unwrap()["module"],
            serde_json::json!("tests::module")
        );
    }

    #[test]
    fn end_metadata_is_derived_from_return_value() {
        let dir = testsupport::trace_dir();
        enable("traced-endfn");

        let rows = Traced::new().call_with(
            &METHOD_SITE,
            None,
            || vec![1u32, 2, 3],
            |ret| Some(args(&[("rows", serde_json::json!(ret.len()))])),
        );
        context::clear_current();
        assert_eq!(rows.len(), 3);

        let events = read_trace_file(&trace_path(dir, "traced-endfn")).unwrap();
        let end = events.iter().find(|e| e.ph == Phase::End).unwrap();
        assert_eq!(end.args.as_ref().unwrap()["rows"], serde_json::json!(3));
        assert_eq!(end.name.as_deref(), Some("Widget.draw"));
    }

    #[test]
    fn panic_propagates_after_end_is_emitted() {
        let dir = testsupport::trace_dir();
        enable("traced-panic");

        let result = std::panic::catch_unwind(|| {
            Traced::new().call(&FREE_SITE, || -> u32 { panic!("wrapped failure") })
        });
        context::clear_current();
        assert!(result.is_err());

        let events = read_trace_file(&trace_path(dir, "traced-panic")).unwrap();
        let ends = events.iter().filter(|e| e.ph == Phase::End).count();
        assert_eq!(ends, 1);
    }

    #[test]
    fn per_call_begin_args_win_over_static() {
        let dir = testsupport::trace_dir();
        enable("traced-begin-extra");

        Traced::new()
            .with_begin_args(args(&[("k", serde_json::json!("static"))]))
            .call_with(
                &FREE_SITE,
                Some(&args(&[("k", serde_json::json!("per-call"))])),
                || (),
                |()| None,
            );
        context::clear_current();

        let events = read_trace_file(&trace_path(dir, "traced-begin-extra")).unwrap();
        let begin = events.iter().find(|e| e.ph == Phase::Begin).unwrap();
        assert_eq!(
            begin.args.as_ref().unwrap()["k"],
            serde_json::json!("per-call")
        );
    }
}
