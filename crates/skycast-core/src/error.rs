//! Application-level error types.
//!
//! Lower layers keep their own error enums; everything converges on
//! [`AppError`] at the application edge, which can produce a message fit for
//! display.

use skycast_weather::WeatherError;
use thiserror::Error;

/// Top-level application error type.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Weather service error: {0}")]
    Weather(#[from] WeatherError),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// A short, non-technical message for the UI.
    ///
    /// Weather errors already carry display-ready text and are passed through.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Config(e) => e.user_message().to_string(),
            AppError::Weather(e) => e.user_message(),
            // Config loading reports through anyhow with context attached
            AppError::Other(e) => match e.downcast_ref::<ConfigError>() {
                Some(config) => config.user_message().to_string(),
                None => "An unexpected error occurred. Please try again.".to_string(),
            },
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weather_error_conversion() {
        let app_err: AppError = WeatherError::NotFound.into();
        assert!(matches!(app_err, AppError::Weather(WeatherError::NotFound)));
        assert_eq!(app_err.user_message(), "City not found");
    }

    #[test]
    fn test_config_user_message() {
        let app_err = AppError::Config(ConfigError::Invalid("api.timeout_secs: zero".into()));
        assert_eq!(
            app_err.user_message(),
            "Invalid configuration. Check your settings."
        );
        assert!(app_err.to_string().contains("api.timeout_secs"));
    }

    #[test]
    fn test_config_errors_found_behind_context() {
        let err = anyhow::Error::new(ConfigError::ParseError("line 1".into()))
            .context("Failed to parse config.toml");
        assert_eq!(
            AppError::from(err).user_message(),
            "Configuration file is malformed. Check your settings."
        );
    }

    #[test]
    fn test_other_errors_hide_details() {
        let app_err = AppError::from(anyhow::anyhow!("socket exploded"));
        assert!(!app_err.user_message().contains("socket"));
    }
}
