//! Weather data gateway: cache, fetch, map, classify.
//!
//! Every network call goes through [`with_retry`], so transient failures get
//! two more attempts before being turned into a [`WeatherError`]. Terminal
//! failures are also pushed to the [`Notifier`] as an error toast.

use std::sync::Arc;

use crate::aggregate::aggregate_forecast;
use crate::cache::TtlCache;
use crate::clock::{Clock, SystemClock};
use crate::error::{FetchError, WeatherError};
use crate::fetcher::{Fetcher, RawAirPollution, RawCity, RawCurrentWeather, RawForecast};
use crate::notifier::{Notification, Notifier, Severity};
use crate::retry::{with_retry, RetryConfig};
use crate::types::{round_celsius, AirQuality, City, ForecastDay, ForecastSample, WeatherSnapshot};

/// Queries shorter than this never reach the provider
pub const MIN_QUERY_LEN: usize = 3;
pub const DEFAULT_SEARCH_LIMIT: u32 = 5;

/// What the shared cache holds. Weather and air quality live side by side,
/// separated by key prefix.
#[derive(Debug, Clone)]
pub enum CachedPayload {
    Weather(WeatherSnapshot),
    AirQuality(AirQuality),
}

fn weather_key(city: &City) -> String {
    format!("weather-{}-{}", city.lat(), city.lon())
}

fn air_key(city: &City) -> String {
    format!("air-{}-{}", city.lat(), city.lon())
}

pub struct WeatherGateway {
    fetcher: Arc<dyn Fetcher>,
    notifier: Arc<dyn Notifier>,
    cache: TtlCache<CachedPayload>,
    clock: Arc<dyn Clock>,
    retry: RetryConfig,
    search_limit: u32,
}

impl WeatherGateway {
    pub fn new(fetcher: Arc<dyn Fetcher>, notifier: Arc<dyn Notifier>) -> Self {
        Self::with_clock(fetcher, notifier, Arc::new(SystemClock))
    }

    /// Same clock for cache expiry and `observed_at`
    pub fn with_clock(fetcher: Arc<dyn Fetcher>, notifier: Arc<dyn Notifier>, clock: Arc<dyn Clock>) -> Self {
        Self {
            fetcher,
            notifier,
            cache: TtlCache::with_clock(clock.clone()),
            clock,
            retry: RetryConfig::default(),
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_search_limit(mut self, limit: u32) -> Self {
        self.search_limit = limit;
        self
    }

    pub fn cache(&self) -> &TtlCache<CachedPayload> {
        &self.cache
    }

    /// Geocode a free-text query. Short queries return nothing without
    /// touching the network.
    pub async fn search_cities(&self, query: &str) -> Result<Vec<City>, WeatherError> {
        if query.chars().count() < MIN_QUERY_LEN {
            return Ok(Vec::new());
        }

        let hits = self
            .fetch(|| self.fetcher.search_cities(query, self.search_limit))
            .await?;
        tracing::debug!("Search '{}' returned {} cities", query, hits.len());
        Ok(hits.into_iter().map(map_city).collect())
    }

    /// Current conditions, served from cache for up to 15 minutes.
    pub async fn get_weather_data(&self, city: &City) -> Result<WeatherSnapshot, WeatherError> {
        let key = weather_key(city);
        if let Some(CachedPayload::Weather(mut snapshot)) = self.cache.get(&key) {
            tracing::debug!("Weather cache hit for {}", city.id());
            // Entries are shared by every city at these coordinates
            snapshot.city_id = city.id().to_string();
            snapshot.city = city.name().to_string();
            return Ok(snapshot);
        }

        let raw = self
            .fetch(|| self.fetcher.current_weather(city.lat(), city.lon()))
            .await?;
        let snapshot = self.map_current_weather(raw, city)?;
        self.cache.set(key, CachedPayload::Weather(snapshot.clone()));
        Ok(snapshot)
    }

    /// Up to four daily summaries. Never cached.
    pub async fn get_forecast(&self, city: &City) -> Result<Vec<ForecastDay>, WeatherError> {
        let raw = self.fetch(|| self.fetcher.forecast(city.lat(), city.lon())).await?;
        Ok(aggregate_forecast(&map_forecast_samples(raw)))
    }

    /// Air quality, cached like weather. Every successful call, cache hit or
    /// not, shows one air-quality notification.
    pub async fn get_air_quality(&self, city: &City) -> Result<AirQuality, WeatherError> {
        let key = air_key(city);
        let air = match self.cache.get(&key) {
            Some(CachedPayload::AirQuality(air)) => {
                tracing::debug!("Air quality cache hit for {}", city.id());
                air
            }
            _ => {
                let raw = self.fetch(|| self.fetcher.air_quality(city.lat(), city.lon())).await?;
                let air = map_air_quality(raw).map_err(|e| self.report(e))?;
                self.cache.set(key, CachedPayload::AirQuality(air.clone()));
                air
            }
        };

        self.notifier.show(air_quality_notification(&air, city.name()));
        Ok(air)
    }

    async fn fetch<T, F, Fut>(&self, operation: F) -> Result<T, WeatherError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, FetchError>>,
    {
        with_retry(&self.retry, operation).await.map_err(|e| {
            tracing::debug!("Request failed with status {:?}: {}", e.status(), e);
            self.report(WeatherError::from(e))
        })
    }

    fn report(&self, error: WeatherError) -> WeatherError {
        self.notifier
            .show(Notification::new("Error", error.user_message(), Severity::Destructive));
        error
    }

    fn map_current_weather(&self, raw: RawCurrentWeather, city: &City) -> Result<WeatherSnapshot, WeatherError> {
        let condition = raw
            .weather
            .into_iter()
            .next()
            .ok_or_else(|| self.report(WeatherError::InvalidResponse("no weather conditions".into())))?;

        Ok(WeatherSnapshot {
            city_id: city.id().to_string(),
            city: city.name().to_string(),
            temperature: round_celsius(raw.main.temp),
            conditions: condition.description,
            icon: condition.icon,
            observed_at: self.clock.now(),
        })
    }
}

impl std::fmt::Debug for WeatherGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherGateway")
            .field("cache", &self.cache)
            .field("retry", &self.retry)
            .field("search_limit", &self.search_limit)
            .finish()
    }
}

fn map_city(raw: RawCity) -> City {
    City::new(raw.name, raw.country, raw.lat, raw.lon)
}

fn map_forecast_samples(raw: RawForecast) -> Vec<ForecastSample> {
    raw.list
        .into_iter()
        .map(|item| {
            let (icon, description) = item
                .weather
                .into_iter()
                .next()
                .map(|c| (c.icon, c.description))
                .unwrap_or_default();
            ForecastSample {
                timestamp: item.dt,
                temperature: item.main.temp,
                icon,
                description,
            }
        })
        .collect()
}

fn map_air_quality(raw: RawAirPollution) -> Result<AirQuality, WeatherError> {
    let item = raw
        .list
        .into_iter()
        .next()
        .ok_or_else(|| WeatherError::InvalidResponse("empty air pollution list".into()))?;
    Ok(AirQuality {
        aqi: item.main.aqi,
        components: item.components,
    })
}

fn air_quality_notification(air: &AirQuality, city_name: &str) -> Notification {
    let (label, severity) = match air.level() {
        Some(level) if level.is_concerning() => (level.label(), Severity::Destructive),
        Some(level) => (level.label(), Severity::Primary),
        None => ("Unknown", Severity::Primary),
    };
    Notification::new(
        "Air Quality Alert",
        format!("Air quality in {}: {}", city_name, label),
        severity,
    )
}
