//! Weather data layer for SkyCast
//!
//! Fetches city search results, current conditions, forecasts and air
//! quality from OpenWeather, with a 15-minute in-memory cache, retry of
//! transient failures and classified errors.

pub mod aggregate;
pub mod cache;
pub mod clock;
pub mod error;
pub mod fetcher;
pub mod gateway;
pub mod notifier;
pub mod retry;
pub mod types;

pub use aggregate::{aggregate_forecast, MAX_FORECAST_DAYS};
pub use cache::TtlCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{FetchError, WeatherError};
pub use fetcher::{Fetcher, FetcherSettings, OpenWeatherFetcher};
pub use gateway::{WeatherGateway, MIN_QUERY_LEN};
pub use notifier::{ChannelNotifier, Notification, Notifier, Severity, TracingNotifier};
pub use retry::RetryConfig;
pub use types::*;
