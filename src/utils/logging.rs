use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, LoggingSettings};
use crate::error::AppError;

/// `RUST_LOG` wins; otherwise this crate logs at the configured level and
/// everything else at `warn`.
pub fn env_filter(level: &str) -> EnvFilter {
    let level = level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::INFO);

    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("warn,price_monitor={},tower_http={}", level, level)
            .to_lowercase()
            .into()
    })
}

pub fn init_tracing(settings: &LoggingSettings) -> Result<(), AppError> {
    let registry = tracing_subscriber::registry().with(env_filter(&settings.level));

    let result = match settings.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).try_init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer().pretty()).try_init(),
        LogFormat::Compact => registry.with(tracing_subscriber::fmt::layer().compact()).try_init(),
    };
    result.map_err(|e| AppError::ConfigError(format!("Failed to initialise logging: {}", e)))?;

    info!(level = %settings.level, format = ?settings.format, "Logging initialized");
    Ok(())
}
