pub mod app;
pub mod config;
pub mod error;

pub use app::App;
pub use config::{ApiConfig, Config, RetrySettings, SearchConfig, ValidationResult, API_KEY_ENV};
pub use error::{AppError, ConfigError};

use anyhow::Result;

/// Install the tracing subscriber. `RUST_LOG` overrides the default `info`.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("SkyCast core initialized");
    Ok(())
}
