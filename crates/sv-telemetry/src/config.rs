//! Telemetry configuration from environment variables.

use serde::Deserialize;
use std::env;

/// Configuration for logging and metrics.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Service name attached to log records
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error) or a full
    /// `EnvFilter` directive
    pub log_level: String,

    /// Whether to write logs to stdout
    pub console_output: bool,

    /// Whether to enable JSON formatted logs
    pub json_logs: bool,

    /// Prometheus metrics port
    pub metrics_port: u16,

    /// Chain identifier, included in the startup record
    pub chain_id: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "sidechain-validator".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            metrics_port: 9100,
            chain_id: "sidechain-1".to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SV_SERVICE_NAME`: Service name (default: sidechain-validator)
    /// - `SV_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `SV_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `SV_JSON_LOGS`: Enable JSON logs (default: false in dev, true in containers)
    /// - `SV_METRICS_PORT`: Prometheus metrics port (default: 9100)
    /// - `SV_CHAIN_ID`: Chain identifier
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();
        let defaults = Self::default();

        Self {
            service_name: env::var("SV_SERVICE_NAME").unwrap_or(defaults.service_name),

            log_level: env::var("SV_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or(defaults.log_level),

            console_output: env::var("SV_CONSOLE_OUTPUT")
                .map(|v| parse_flag(&v, true))
                .unwrap_or(true),

            json_logs: env::var("SV_JSON_LOGS")
                .map(|v| parse_flag(&v, false))
                .unwrap_or(is_container),

            metrics_port: env::var("SV_METRICS_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.metrics_port),

            chain_id: env::var("SV_CHAIN_ID").unwrap_or(defaults.chain_id),
        }
    }
}

/// `true`/`1` and `false`/`0`, case-insensitive; anything else keeps `default`.
fn parse_flag(value: &str, default: bool) -> bool {
    match value.to_lowercase().as_str() {
        "true" | "1" => true,
        "false" | "0" => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "sidechain-validator");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.metrics_port, 9100);
        assert_eq!(config.chain_id, "sidechain-1");
        assert!(!config.json_logs);
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("TRUE", false));
        assert!(parse_flag("1", false));
        assert!(!parse_flag("false", true));
        assert!(parse_flag("maybe", true));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: TelemetryConfig =
            serde_json::from_str(r#"{"json_logs": true, "log_level": "debug"}"#).unwrap();
        assert!(config.json_logs);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.metrics_port, 9100);
    }
}
