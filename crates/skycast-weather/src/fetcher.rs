//! Network access to the weather provider.
//!
//! The gateway only sees the [`Fetcher`] trait; [`OpenWeatherFetcher`] is the
//! real implementation against the OpenWeather REST API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::FetchError;
use crate::types::PollutantComponents;

pub const DEFAULT_WEATHER_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_GEOCODING_URL: &str = "https://api.openweathermap.org/geo/1.0";
const REQUEST_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = "SkyCast/0.1.0";

/// One geocoding hit
#[derive(Debug, Clone, Deserialize)]
pub struct RawCity {
    pub name: String,
    #[serde(default)]
    pub country: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawMain {
    pub temp: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCondition {
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCurrentWeather {
    #[serde(default)]
    pub name: Option<String>,
    pub main: RawMain,
    pub weather: Vec<RawCondition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawForecastItem {
    /// Unix seconds
    pub dt: i64,
    pub main: RawMain,
    pub weather: Vec<RawCondition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawForecast {
    pub list: Vec<RawForecastItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawAqiMain {
    pub aqi: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawAirPollutionItem {
    pub main: RawAqiMain,
    #[serde(default)]
    pub components: Option<PollutantComponents>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawAirPollution {
    pub list: Vec<RawAirPollutionItem>,
}

/// The four provider calls the gateway needs.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn search_cities(&self, query: &str, limit: u32) -> Result<Vec<RawCity>, FetchError>;

    async fn current_weather(&self, lat: f64, lon: f64) -> Result<RawCurrentWeather, FetchError>;

    /// 3-hourly samples, oldest first
    async fn forecast(&self, lat: f64, lon: f64) -> Result<RawForecast, FetchError>;

    async fn air_quality(&self, lat: f64, lon: f64) -> Result<RawAirPollution, FetchError>;
}

/// Endpoint and credential settings for [`OpenWeatherFetcher`]
#[derive(Debug, Clone)]
pub struct FetcherSettings {
    pub weather_url: String,
    pub geocoding_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl FetcherSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            weather_url: DEFAULT_WEATHER_URL.to_string(),
            geocoding_url: DEFAULT_GEOCODING_URL.to_string(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OpenWeatherFetcher {
    client: Arc<Client>,
    weather_url: String,
    geocoding_url: String,
    api_key: String,
}

impl OpenWeatherFetcher {
    pub fn new(settings: FetcherSettings) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client: Arc::new(client),
            weather_url: settings.weather_url.trim_end_matches('/').to_string(),
            geocoding_url: settings.geocoding_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: String,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .query(query)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string());
            tracing::debug!("{} returned status {}: {}", url, status, message);
            return Err(FetchError::http(status.as_u16(), message));
        }

        Ok(response.json::<T>().await?)
    }

    fn coordinates(lat: f64, lon: f64) -> [(&'static str, String); 2] {
        [("lat", lat.to_string()), ("lon", lon.to_string())]
    }
}

#[async_trait]
impl Fetcher for OpenWeatherFetcher {
    async fn search_cities(&self, query: &str, limit: u32) -> Result<Vec<RawCity>, FetchError> {
        self.get_json(
            format!("{}/direct", self.geocoding_url),
            &[("q", query.to_string()), ("limit", limit.to_string())],
        )
        .await
    }

    async fn current_weather(&self, lat: f64, lon: f64) -> Result<RawCurrentWeather, FetchError> {
        let [lat, lon] = Self::coordinates(lat, lon);
        self.get_json(
            format!("{}/weather", self.weather_url),
            &[lat, lon, ("units", "metric".to_string())],
        )
        .await
    }

    async fn forecast(&self, lat: f64, lon: f64) -> Result<RawForecast, FetchError> {
        let [lat, lon] = Self::coordinates(lat, lon);
        self.get_json(
            format!("{}/forecast", self.weather_url),
            &[lat, lon, ("units", "metric".to_string())],
        )
        .await
    }

    async fn air_quality(&self, lat: f64, lon: f64) -> Result<RawAirPollution, FetchError> {
        self.get_json(
            format!("{}/air_pollution", self.weather_url),
            &Self::coordinates(lat, lon),
        )
        .await
    }
}
