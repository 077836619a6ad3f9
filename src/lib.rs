//! Reqtrace: request-correlated tracing with per-request event logs.
//!
//! Reqtrace associates every unit of work with an opaque request identifier
//! and records timed Begin/End events into one append-only trace file per
//! request, in the Chrome trace-event JSON convention an external viewer can
//! consume. Correlation survives hand-off to borrowed worker-pool threads,
//! and whole functions and impl blocks can be instrumented at definition
//! time with no per-call-site changes.
//!
//! # Architecture
//!
//! The crate follows a layered architecture pattern:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  Instrumentation Layer (instrument/)                │  ← traced_fn!/traced_impl!
//! │  - Callable descriptors (CallSite)                  │  ← per-invocation wrapping
//! │  - Transparent Begin/End bracketing                 │
//! └─────────────────────────────────────────────────────┘
//!          │                               │
//! ┌───────────────────┐          ┌───────────────────────┐
//! │ Span Layer        │          │ Worker Layer          │
//! │ (span/)           │          │ (worker/)             │
//! │ - Begin/End pairs │          │ - Context propagation │
//! │ - Idempotent end  │          │ - Bounded pool        │
//! │ - Drop guard      │          │ - Hand-off spans      │
//! └───────────────────┘          └───────────────────────┘
//!          │                               │
//! ┌─────────────────────────────────────────────────────┐
//! │  Context Registry (context/)                        │  ← ambient request id
//! │  - Thread-local binding                             │  ← capture/install/restore
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Emitter (emitter/)                                 │  ← per-request trace files
//! │  - Append-only event records                        │
//! │  - Per-request write locks                          │
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Domain & Infrastructure Layers                     │
//! │  - Event model (domain/event)                       │
//! │  - Error types (domain/error)                       │
//! │  - Paths and identity tags (infrastructure/)        │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`context`]: ambient request-id registry with explicit propagation
//! - [`domain`]: trace event model and error types
//! - [`emitter`]: per-request append-only trace files
//! - [`infrastructure`]: trace file paths, process/thread tags
//! - [`instrument`]: automatic wrapping of callables and impl blocks
//! - [`span`]: Begin/End span lifecycle
//! - [`worker`]: worker pool and cross-thread propagation hook
//! - [`logging`]: diagnostic log subscriber for the crate's own internals
//!
//! # Tracing a request
//!
//! ```no_run
//! use reqtrace::{context, Span};
//!
//! // Once per inbound request, as supplied by the hosting framework:
//! context::set_current("req-1");
//! reqtrace::trace_current_request(None)?;
//!
//! // Anywhere below, spans land in req-1's trace file:
//! let entered = Span::new("Handler.dispatch").enter()?;
//! // ... work ...
//! entered.end()?;
//!
//! context::clear_current();
//! # Ok::<(), reqtrace::TraceError>(())
//! ```
//!
//! # Instrumenting at definition time
//!
//! ```no_run
//! struct Store {
//!     rows: Vec<String>,
//! }
//!
//! reqtrace::traced_impl! {
//!     impl Store {
//!         pub fn insert(&mut self, row: String) -> usize {
//!             self.rows.push(row);
//!             self.rows.len()
//!         }
//!     }
//! }
//! ```
//!
//! # Key Design Decisions
//!
//! ## Opt-in, per-request recording
//!
//! Tracing costs nothing for requests that never enabled it: emission with
//! no ambient request id, or for a request whose trace file was never
//! created, is a silent no-op. Only unexpected I/O failures surface.
//!
//! ## Append-cheaply, fix-up-on-read files
//!
//! Trace files open with `[\n` and grow by one `{json},\n` record per event.
//! The stream is never finalized — a killed process leaves a valid-enough
//! file with an unmatched Begin — and [`read_trace_file`] performs the
//! documented fix-up when loading one.
//!
//! ## Explicit cross-thread propagation
//!
//! The ambient id never leaks between threads implicitly. The worker layer
//! captures it at dispatch and installs it around exactly one unit of work,
//! restoring the borrowed thread's previous state afterwards.

pub mod context;
pub mod domain;
pub mod emitter;
pub mod infrastructure;
#[macro_use]
pub mod instrument;
pub mod logging;
pub mod span;
pub mod worker;

pub use domain::{merge_args, Args, Phase, Result, TraceError, TraceEvent};
pub use emitter::{begin_request_trace, emit, read_trace_file, trace_current_request};
pub use instrument::{CallKind, CallSite, Traced};
pub use span::{EnteredSpan, Span};
pub use worker::{traced_job, TracedJob, WorkerPool};

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{OnceLock, RwLock};

/// Library configuration.
///
/// A process carries one active configuration, installed with [`configure`]
/// (or [`init`]) and defaulting to sensible values when never set.
///
/// # Examples
///
/// ```
/// use reqtrace::TraceConfig;
/// use std::path::PathBuf;
///
/// let config = TraceConfig {
///     trace_dir: PathBuf::from("/var/tmp/traces"),
///     ..Default::default()
/// };
/// reqtrace::configure(config);
/// ```
#[derive(Debug, Clone)]
pub struct TraceConfig {
    /// Directory where per-request trace files are written.
    ///
    /// Created on demand when tracing is enabled for a request.
    /// Default: the platform temporary directory.
    pub trace_dir: PathBuf,

    /// Default category tag stamped onto every event, ahead of any
    /// per-emission tags. Default: the program name.
    pub category: String,

    /// Diagnostic log filter for the crate's own internals.
    ///
    /// Options: `trace`, `debug`, `info`, `warn`, `error`, or any
    /// `tracing-subscriber` filter directive. Default: `"info"`.
    pub log_level: Option<String>,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            trace_dir: infrastructure::default_trace_dir(),
            category: infrastructure::program_name(),
            log_level: None,
        }
    }
}

/// On-disk representation of a configuration file. Absent keys fall back to
/// the defaults of [`TraceConfig`].
#[derive(Debug, serde::Deserialize)]
struct TraceConfigFile {
    trace_dir: Option<PathBuf>,
    category: Option<String>,
    log_level: Option<String>,
}

impl TraceConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # File Format
    ///
    /// ```toml
    /// trace_dir = "/var/tmp/traces"
    /// category = "api-server"
    /// log_level = "debug"
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid TOML.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let file: TraceConfigFile = toml::from_str(&contents)
            .map_err(|e| TraceError::Config(format!("failed to parse config TOML: {e}")))?;

        let defaults = Self::default();
        Ok(Self {
            trace_dir: file.trace_dir.unwrap_or(defaults.trace_dir),
            category: file.category.unwrap_or(defaults.category),
            log_level: file.log_level.or(defaults.log_level),
        })
    }

    /// Builds configuration from a string map, as supplied by embedders that
    /// carry settings as flat key/value pairs. Unknown keys are ignored;
    /// missing keys fall back to defaults.
    #[must_use]
    pub fn from_map(map: &BTreeMap<String, String>) -> Self {
        let defaults = Self::default();
        Self {
            trace_dir: map
                .get("trace_dir")
                .map(PathBuf::from)
                .unwrap_or(defaults.trace_dir),
            category: map
                .get("category")
                .cloned()
                .unwrap_or(defaults.category),
            log_level: map.get("log_level").cloned(),
        }
    }
}

/// Process-global configuration slot, lazily holding defaults until
/// [`configure`] installs something else.
static CONFIG: OnceLock<RwLock<TraceConfig>> = OnceLock::new();

fn config_cell() -> &'static RwLock<TraceConfig> {
    CONFIG.get_or_init(|| RwLock::new(TraceConfig::default()))
}

/// Installs the active configuration, replacing the previous one.
///
/// Emissions already in flight finish under the configuration they started
/// with; subsequent operations observe the new one.
pub fn configure(config: TraceConfig) {
    tracing::debug!(trace_dir = ?config.trace_dir, category = %config.category, "installing configuration");
    let mut slot = config_cell()
        .write()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    *slot = config;
}

/// Returns a snapshot of the active configuration.
pub(crate) fn active_config() -> TraceConfig {
    config_cell()
        .read()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .clone()
}

/// One-call setup: initializes diagnostic logging and installs `config`.
///
/// # Examples
///
/// ```
/// reqtrace::init(reqtrace::TraceConfig::default());
/// ```
pub fn init(config: TraceConfig) {
    logging::init(&config);
    configure(config);
}
