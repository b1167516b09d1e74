//! Structured telemetry initialisation for the router host.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::{Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

use ferry_config::{LogFormat, RouterConfig};

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

const ROUTER_TARGET: &str = env!("CARGO_PKG_NAME");
const HEALTH_DIRECTIVE: &str = concat!(env!("CARGO_PKG_NAME"), "::health=info");

/// Handle returned when telemetry has been initialised.
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetryHandle;

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Failed to parse the configured log filter expression.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Failed to install the tracing subscriber.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Configures the global tracing subscriber when invoked for the first time.
///
/// Unless the configured filter already names a router target, lifecycle
/// events on the health target stay enabled at `info` so a quiet host filter
/// such as `warn` still records router start and stop.
///
/// Embedding applications that already own a subscriber should skip this
/// call. Repeated calls are idempotent: only the first installs the global
/// subscriber, later calls return a fresh [`TelemetryHandle`].
pub fn initialise(config: &RouterConfig) -> Result<TelemetryHandle, TelemetryError> {
    TELEMETRY_GUARD
        .get_or_try_init(|| install_subscriber(config))
        .map(|_| TelemetryHandle)
}

fn install_subscriber(config: &RouterConfig) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_new(filter_directives(config.log_filter()))
        .map_err(|error| TelemetryError::Filter(error.to_string()))?;

    let builder = |filter: EnvFilter| {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_writer(io::stderr)
            // Colour only on interactive terminals.
            .with_ansi(io::stderr().is_terminal())
            .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
    };

    let subscriber: Box<dyn Subscriber + Send + Sync> = match config.log_format() {
        LogFormat::Json => Box::new(builder(filter).json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder(filter).compact().finish()),
    };

    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)
}

fn filter_directives(configured: &str) -> String {
    let configured = configured.trim();
    let names_router = configured
        .split(',')
        .map(str::trim)
        .any(|directive| directive.starts_with(ROUTER_TARGET));
    if names_router {
        configured.to_owned()
    } else if configured.is_empty() {
        HEALTH_DIRECTIVE.to_owned()
    } else {
        format!("{configured},{HEALTH_DIRECTIVE}")
    }
}
