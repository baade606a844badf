//! Failure types for the weather data layer.
//!
//! `FetchError` is what a [`crate::Fetcher`] reports: raw, possibly transient.
//! `WeatherError` is what the gateway hands out once retries are exhausted:
//! classified, with a `Display` suitable for showing to the user as-is.

use thiserror::Error;

/// Raw failure from a fetcher call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The provider answered with a non-success status
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Connection refused/reset, timeout, DNS...
    #[error("Transport error: {0}")]
    Transport(String),

    /// The body could not be understood
    #[error("Decode error: {0}")]
    Decode(String),
}

impl FetchError {
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            return Self::http(status.as_u16(), e.to_string());
        }
        if e.is_decode() {
            return Self::decode(e.to_string());
        }
        Self::transport(e.to_string())
    }
}

/// Classified, terminal failure of a gateway operation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WeatherError {
    #[error("City not found")]
    NotFound,

    #[error("Too many requests. Please try again later")]
    RateLimited,

    #[error("Invalid API key")]
    Unauthorized,

    #[error("Error Code: {status}\nMessage: {message}")]
    Api { status: u16, message: String },

    #[error("Error: {0}")]
    Network(String),

    #[error("Error: invalid response: {0}")]
    InvalidResponse(String),
}

impl WeatherError {
    /// Message shown to the user (same as `Display`).
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::NotFound => Some(404),
            Self::RateLimited => Some(429),
            Self::Unauthorized => Some(401),
            Self::Api { status, .. } => Some(*status),
            Self::Network(_) | Self::InvalidResponse(_) => None,
        }
    }
}

impl From<FetchError> for WeatherError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::Http { status: 404, .. } => Self::NotFound,
            FetchError::Http { status: 429, .. } => Self::RateLimited,
            FetchError::Http { status: 401, .. } => Self::Unauthorized,
            FetchError::Http { status, message } => Self::Api { status, message },
            FetchError::Transport(msg) => Self::Network(msg),
            FetchError::Decode(msg) => Self::InvalidResponse(msg),
        }
    }
}
