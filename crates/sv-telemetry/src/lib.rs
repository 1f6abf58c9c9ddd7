//! # Sidechain Validator Telemetry
//!
//! Logging and metrics shared by every subsystem.
//!
//! ## Components
//!
//! - **Logs**: `tracing-subscriber` with an env filter, pretty or JSON output
//! - **Metrics**: Prometheus counters and histograms in a process-wide registry
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sv_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let _guard = init_telemetry(TelemetryConfig::from_env())?;
//!     // Logs and metrics are now being collected
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SV_SERVICE_NAME` | `sidechain-validator` | Service name in log records |
//! | `SV_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `SV_JSON_LOGS` | `false` (`true` in containers) | JSON formatted logs |
//! | `SV_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `SV_METRICS_PORT` | `9100` | Prometheus scrape port |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::{init_logging, LoggingHandle};
pub use metrics::{
    encode_metrics, register_metrics, MetricsHandle, CHECKPOINTS_ACKED, CHECKPOINT_NO_ACKS,
    LAST_FINALIZED_HEIGHT, MILESTONES_COMMITTED, PAYLOAD_BUILD_FAILURES, PRE_BLOCK_DURATION,
    PROPOSALS_REJECTED, SIDE_TX_OUTCOMES, SIDE_TX_VOTES, VOTE_EXTENSIONS_REJECTED,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and metrics.
///
/// Returns a guard that must be held for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    // Metrics first, logging may report on them
    let metrics_handle = register_metrics()?;
    let logging_handle = init_logging(&config)?;

    Ok(TelemetryGuard {
        _logging: logging_handle,
        _metrics: metrics_handle,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    _logging: LoggingHandle,
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}

/// Convenience macro for recording a metric with a value.
#[macro_export]
macro_rules! metric_observe {
    ($metric:expr, $value:expr) => {
        $metric.observe($value)
    };
    ($metric:expr, $labels:expr, $value:expr) => {
        $metric.with_label_values($labels).observe($value)
    };
}
