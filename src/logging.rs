//! Diagnostic logging setup for the library's own internals.
//!
//! The crate's components log through `tracing` macros; this module wires a
//! `tracing-subscriber` pipeline for hosts that do not install their own.
//! This is the crate's self-observability channel and is entirely separate
//! from the per-request trace files the emitter produces.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::TraceConfig;

/// Default diagnostic log level when neither the environment nor the config
/// specifies one.
const DEFAULT_LOG_LEVEL: &str = "info";

/// Initializes the diagnostic log subscriber.
///
/// # Level Resolution
///
/// 1. `RUST_LOG` environment variable (highest priority)
/// 2. `log_level` in [`TraceConfig`]
/// 3. Default: `"info"`
///
/// # Initialization Behavior
///
/// Idempotent: if a global subscriber is already installed (by this function
/// or by the host application), the call is a silent no-op.
///
/// # Examples
///
/// ```
/// use reqtrace::TraceConfig;
///
/// let config = TraceConfig {
///     log_level: Some("debug".to_string()),
///     ..Default::default()
/// };
/// reqtrace::logging::init(&config);
///
/// tracing::debug!("diagnostics are live");
/// ```
pub fn init(config: &TraceConfig) {
    let level = config
        .log_level
        .clone()
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false);

    let subscriber = tracing_subscriber::registry().with(filter).with(fmt_layer);

    let _ = subscriber.try_init();
}
