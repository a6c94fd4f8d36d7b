// Telemetry Module
//
// Structured logging for the scheduler and automation engine:
// - EnvFilter driven by RUST_LOG / LOG_LEVEL
// - Human-readable or JSON fmt output

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

// ============================================================================
// Telemetry Configuration
// ============================================================================

/// Configuration for logging
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to the startup event
    pub service_name: String,
    /// Whether to enable console logging
    pub enable_console: bool,
    /// Emit one JSON object per event instead of text
    pub json: bool,
    /// Log filter (e.g., "info", "debug", "upkeep_core=debug")
    pub log_filter: Option<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "upkeep".to_string(),
            enable_console: true,
            json: false,
            log_filter: None,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables
    ///
    /// Environment variables:
    /// - `UPKEEP_SERVICE_NAME`: Service name (default: "upkeep")
    /// - `RUST_LOG` or `LOG_LEVEL`: Log filter
    ///
    /// JSON output is not read here; it comes from
    /// [`UpkeepConfig::log_json`](crate::config::UpkeepConfig::log_json) via
    /// [`with_json`](Self::with_json).
    pub fn from_env() -> Self {
        Self {
            service_name: std::env::var("UPKEEP_SERVICE_NAME")
                .unwrap_or_else(|_| "upkeep".to_string()),
            enable_console: true,
            json: false,
            log_filter: std::env::var("RUST_LOG")
                .ok()
                .or_else(|| std::env::var("LOG_LEVEL").ok()),
        }
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = Some(filter.into());
        self
    }

    fn filter(&self) -> EnvFilter {
        self.log_filter
            .as_ref()
            .and_then(|f| EnvFilter::try_new(f).ok())
            .unwrap_or_else(|| EnvFilter::new("info"))
    }
}

// ============================================================================
// Initialization
// ============================================================================

/// Guard returned by [`init_telemetry`]; logs shutdown when dropped
pub struct TelemetryGuard {
    service_name: String,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::debug!(service = %self.service_name, "Telemetry shutting down");
    }
}

/// Install the global tracing subscriber
///
/// Keep the returned guard alive for the lifetime of the application. A
/// second call leaves the first subscriber in place.
///
/// # Example
///
/// ```ignore
/// use upkeep_core::telemetry::{init_telemetry, TelemetryConfig};
///
/// #[tokio::main]
/// async fn main() {
///     let _guard = init_telemetry(TelemetryConfig::from_env());
///     // ... your application code
/// }
/// ```
pub fn init_telemetry(config: TelemetryConfig) -> TelemetryGuard {
    let console_layer = if config.enable_console {
        let layer = if config.json {
            tracing_subscriber::fmt::layer()
                .json()
                .with_target(true)
                .with_filter(config.filter())
                .boxed()
        } else {
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_filter(config.filter())
                .boxed()
        };
        Some(layer)
    } else {
        None
    };

    let installed = tracing_subscriber::registry()
        .with(console_layer)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!(
            service = %config.service_name,
            json = config.json,
            "Telemetry initialized"
        );
    }

    TelemetryGuard {
        service_name: config.service_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "upkeep");
        assert!(config.enable_console);
        assert!(!config.json);
        assert!(config.log_filter.is_none());
    }

    #[test]
    fn test_builder_overrides() {
        let config = TelemetryConfig::default()
            .with_json(true)
            .with_log_filter("upkeep_core=debug");
        assert!(config.json);
        assert_eq!(config.log_filter.as_deref(), Some("upkeep_core=debug"));
    }

    #[test]
    fn test_init_twice_does_not_panic() {
        let _first = init_telemetry(TelemetryConfig::default());
        let _second = init_telemetry(TelemetryConfig::default().with_json(true));
    }
}
