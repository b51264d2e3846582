use imgvault_core::{ErrorMetadata, LogLevel, StoreError};
use serde::Serialize;

/// Error body printed when a command fails.
#[derive(Debug, Serialize)]
pub struct ErrorReport {
    pub error: String,
    pub code: &'static str,
    pub recoverable: bool,
}

impl From<&StoreError> for ErrorReport {
    fn from(err: &StoreError) -> Self {
        ErrorReport {
            error: err.to_string(),
            code: err.error_code(),
            recoverable: err.is_recoverable(),
        }
    }
}

/// Log a store error at the level its metadata asks for.
pub fn log_error(err: &StoreError) {
    let code = err.error_code();
    match err.log_level() {
        LogLevel::Debug => tracing::debug!(error = %err, code, "Command failed"),
        LogLevel::Warn => tracing::warn!(error = %err, code, "Command failed"),
        LogLevel::Error => tracing::error!(error = %err, code, "Command failed"),
    }
}

/// Initialize tracing for the CLI. Logs go to stderr so stdout stays JSON.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
