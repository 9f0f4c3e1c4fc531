use crate::adverts::cms::CmsError;
use crate::config::ConfigError;
use crate::telemetry::TelemetryError;

/// Startup and process-level failures surfaced by the binaries. Request
/// handlers map their own errors to responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cms client error: {0}")]
    Cms(#[from] CmsError),
}
