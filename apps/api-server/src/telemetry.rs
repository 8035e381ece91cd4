//! Log output setup.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "info,api_server=debug,forum_infra=debug";
const DEFAULT_SERVICE: &str = "forum-api";

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// One JSON object per line instead of human-readable output.
    pub json_logs: bool,
    pub service_name: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            json_logs: false,
            service_name: DEFAULT_SERVICE.to_string(),
        }
    }
}

impl TelemetryConfig {
    /// `LOG_FORMAT=json` switches to JSON lines; `OTEL_SERVICE_NAME` names the service.
    pub fn from_env() -> Self {
        let json_logs =
            matches!(std::env::var("LOG_FORMAT"), Ok(v) if v.eq_ignore_ascii_case("json"));
        let service_name =
            std::env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| DEFAULT_SERVICE.to_string());

        Self {
            json_logs,
            service_name,
        }
    }
}

/// Install the global subscriber. `RUST_LOG` replaces the default filter.
pub fn init_telemetry(config: &TelemetryConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    // Exactly one of the two output layers is present.
    let json = config.json_logs.then(|| fmt::layer().json());
    let pretty = (!config.json_logs).then(|| fmt::layer().pretty());

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(pretty)
        .init();

    tracing::info!(
        service = %config.service_name,
        json_logs = config.json_logs,
        "Logging ready"
    );
}
