pub mod config;
pub mod error;
pub mod http;

pub use config::{
    AuthConfig, CalendarConfig, Config, EndpointsConfig, ValidationResult, WorkflowConfig,
};
pub use error::{ApiError, AppError, AuthError, ConfigError};

use anyhow::Result;

/// Initialize logging for the helper binaries
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))?;

    tracing::info!("gworkspace-helper core initialized");
    Ok(())
}
