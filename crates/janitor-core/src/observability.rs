//! Observability infrastructure.
//!
//! Structured logging with consistent spans: an initialization helper
//! for binaries plus span constructors shared by the retention
//! policies.

use std::sync::Once;
use tracing::Span;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Log output format.
#[derive(Debug, Clone, Copy, Default)]
pub enum LogFormat {
    /// JSON structured logs (for production).
    Json,
    /// Pretty-printed logs (for development).
    #[default]
    Pretty,
}

/// Initializes the logging subsystem.
///
/// Call once at application startup. Safe to call multiple times;
/// subsequent calls are no-ops.
///
/// # Environment Variables
///
/// - `RUST_LOG`: Controls log levels (e.g., `info`, `janitor_retention=debug`)
///
/// # Example
///
/// ```rust
/// use janitor_core::observability::{init_logging, LogFormat};
///
/// init_logging(LogFormat::Pretty);
/// ```
pub fn init_logging(format: LogFormat) {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        match format {
            LogFormat::Json => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().json())
                    .init();
            }
            LogFormat::Pretty => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().pretty())
                    .init();
            }
        }
    });
}

/// Creates a span for one retention policy run.
///
/// # Example
///
/// ```rust
/// use janitor_core::observability::policy_span;
///
/// let span = policy_span("snapshot-query");
/// let _guard = span.enter();
/// // ... run the policy
/// ```
#[must_use]
pub fn policy_span(policy: &str) -> Span {
    tracing::info_span!("policy", name = policy)
}
