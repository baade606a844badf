//! Gateway behaviour against a scripted in-memory fetcher.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::Mutex;

use skycast_weather::fetcher::{
    RawAirPollution, RawAirPollutionItem, RawAqiMain, RawCity, RawCondition, RawCurrentWeather,
    RawForecast, RawForecastItem, RawMain,
};
use skycast_weather::{
    City, FetchError, Fetcher, ManualClock, Notification, Notifier, RetryConfig, Severity,
    WeatherError, WeatherGateway,
};

type Script<T> = Mutex<VecDeque<Result<T, FetchError>>>;

/// Pops one scripted result per call; falls back to a canned success once
/// the script is empty.
#[derive(Default)]
struct ScriptedFetcher {
    search: Script<Vec<RawCity>>,
    weather: Script<RawCurrentWeather>,
    forecast: Script<RawForecast>,
    air: Script<RawAirPollution>,
    search_calls: AtomicU32,
    weather_calls: AtomicU32,
    forecast_calls: AtomicU32,
    air_calls: AtomicU32,
}

fn next<T>(script: &Script<T>, fallback: impl FnOnce() -> T) -> Result<T, FetchError> {
    script.lock().pop_front().unwrap_or_else(|| Ok(fallback()))
}

fn raw_weather(temp: f64) -> RawCurrentWeather {
    RawCurrentWeather {
        name: Some("London".to_string()),
        main: RawMain { temp },
        weather: vec![RawCondition {
            description: "light rain".to_string(),
            icon: "10d".to_string(),
        }],
    }
}

fn raw_forecast(days: i64) -> RawForecast {
    // 2024-01-01 00:00 UTC
    let start = 1_704_067_200;
    RawForecast {
        list: (0..days * 8)
            .map(|i| RawForecastItem {
                dt: start + i * 3 * 3600,
                main: RawMain { temp: 10.0 },
                weather: vec![RawCondition {
                    description: "clear sky".to_string(),
                    icon: "01d".to_string(),
                }],
            })
            .collect(),
    }
}

fn raw_air(aqi: u8) -> RawAirPollution {
    RawAirPollution {
        list: vec![RawAirPollutionItem {
            main: RawAqiMain { aqi },
            components: None,
        }],
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn search_cities(&self, _query: &str, _limit: u32) -> Result<Vec<RawCity>, FetchError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        next(&self.search, Vec::new)
    }

    async fn current_weather(&self, _lat: f64, _lon: f64) -> Result<RawCurrentWeather, FetchError> {
        self.weather_calls.fetch_add(1, Ordering::SeqCst);
        next(&self.weather, || raw_weather(12.4))
    }

    async fn forecast(&self, _lat: f64, _lon: f64) -> Result<RawForecast, FetchError> {
        self.forecast_calls.fetch_add(1, Ordering::SeqCst);
        next(&self.forecast, || raw_forecast(5))
    }

    async fn air_quality(&self, _lat: f64, _lon: f64) -> Result<RawAirPollution, FetchError> {
        self.air_calls.fetch_add(1, Ordering::SeqCst);
        next(&self.air, || raw_air(1))
    }
}

#[derive(Default)]
struct RecordingNotifier {
    shown: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    fn all(&self) -> Vec<Notification> {
        self.shown.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn show(&self, notification: Notification) {
        self.shown.lock().push(notification);
    }
}

struct Harness {
    gateway: WeatherGateway,
    fetcher: Arc<ScriptedFetcher>,
    notifier: Arc<RecordingNotifier>,
    clock: Arc<ManualClock>,
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

fn harness() -> Harness {
    let fetcher = Arc::new(ScriptedFetcher::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let clock = Arc::new(ManualClock::new(start()));
    let gateway = WeatherGateway::with_clock(fetcher.clone(), notifier.clone(), clock.clone())
        .with_retry_config(RetryConfig::new(2, 0, 0));
    Harness {
        gateway,
        fetcher,
        notifier,
        clock,
    }
}

fn london() -> City {
    City::new("London", "GB", 51.5073, -0.1276)
}

#[tokio::test]
async fn test_short_query_skips_network() {
    let h = harness();
    let cities = h.gateway.search_cities("Lo").await.unwrap();

    assert!(cities.is_empty());
    assert_eq!(h.fetcher.search_calls.load(Ordering::SeqCst), 0);
    assert!(h.notifier.all().is_empty());
}

#[tokio::test]
async fn test_search_maps_hits_to_cities() {
    let h = harness();
    h.fetcher.search.lock().push_back(Ok(vec![
        RawCity {
            name: "London".to_string(),
            country: "GB".to_string(),
            lat: 51.507_321_5,
            lon: -0.127_647_4,
            state: Some("England".to_string()),
        },
        RawCity {
            name: "London".to_string(),
            country: "CA".to_string(),
            lat: 42.983_389,
            lon: -81.233_04,
            state: Some("Ontario".to_string()),
        },
    ]));

    let cities = h.gateway.search_cities("Lon").await.unwrap();

    assert_eq!(cities.len(), 2);
    assert_eq!(cities[0].id(), "London-51.5073--0.1276-GB");
    assert_eq!(cities[1].country(), "CA");
    assert_eq!(h.fetcher.search_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_weather_is_mapped_and_stamped_with_fetch_time() {
    let h = harness();
    let snapshot = h.gateway.get_weather_data(&london()).await.unwrap();

    assert_eq!(snapshot.city_id, london().id());
    assert_eq!(snapshot.city, "London");
    assert_eq!(snapshot.temperature, 12);
    assert_eq!(snapshot.conditions, "light rain");
    assert_eq!(snapshot.icon, "10d");
    assert_eq!(snapshot.observed_at, start());
}

#[tokio::test]
async fn test_weather_cache_hit_and_expiry() {
    let h = harness();
    let city = london();

    h.gateway.get_weather_data(&city).await.unwrap();
    h.clock.advance(Duration::minutes(14));
    let cached = h.gateway.get_weather_data(&city).await.unwrap();
    assert_eq!(h.fetcher.weather_calls.load(Ordering::SeqCst), 1);
    assert_eq!(cached.observed_at, start());

    h.clock.advance(Duration::minutes(2));
    let fresh = h.gateway.get_weather_data(&city).await.unwrap();
    assert_eq!(h.fetcher.weather_calls.load(Ordering::SeqCst), 2);
    assert_eq!(fresh.observed_at, start() + Duration::minutes(16));
}

#[tokio::test]
async fn test_cache_hit_is_stamped_with_requesting_city() {
    let h = harness();
    let londres = City::new("Londres", "GB", 51.5073, -0.1276);

    h.gateway.get_weather_data(&londres).await.unwrap();
    let snapshot = h.gateway.get_weather_data(&london()).await.unwrap();

    assert_eq!(h.fetcher.weather_calls.load(Ordering::SeqCst), 1);
    assert_eq!(snapshot.city_id, london().id());
    assert_eq!(snapshot.city, "London");
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let h = harness();
    {
        let mut script = h.fetcher.weather.lock();
        script.push_back(Err(FetchError::http(503, "unavailable")));
        script.push_back(Err(FetchError::transport("connection reset")));
    }

    let snapshot = h.gateway.get_weather_data(&london()).await.unwrap();

    assert_eq!(snapshot.temperature, 12);
    assert_eq!(h.fetcher.weather_calls.load(Ordering::SeqCst), 3);
    assert!(h.notifier.all().is_empty());
}

#[tokio::test]
async fn test_retries_exhausted_after_three_attempts() {
    let h = harness();
    {
        let mut script = h.fetcher.weather.lock();
        for _ in 0..3 {
            script.push_back(Err(FetchError::http(500, "boom")));
        }
    }

    let err = h.gateway.get_weather_data(&london()).await.unwrap_err();

    assert_eq!(err.to_string(), "Error Code: 500\nMessage: boom");
    assert_eq!(h.fetcher.weather_calls.load(Ordering::SeqCst), 3);
    assert!(h.gateway.cache().is_empty());
}

#[tokio::test]
async fn test_not_found_is_terminal_and_notified() {
    let h = harness();
    h.fetcher
        .weather
        .lock()
        .push_back(Err(FetchError::http(404, "city not found")));

    let err = h.gateway.get_weather_data(&london()).await.unwrap_err();

    assert_eq!(err, WeatherError::NotFound);
    assert_eq!(err.to_string(), "City not found");
    assert_eq!(h.fetcher.weather_calls.load(Ordering::SeqCst), 1);

    let shown = h.notifier.all();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].title, "Error");
    assert_eq!(shown[0].description, "City not found");
    assert_eq!(shown[0].severity, Severity::Destructive);
}

#[tokio::test]
async fn test_forecast_is_never_cached() {
    let h = harness();
    let city = london();

    let first = h.gateway.get_forecast(&city).await.unwrap();
    let second = h.gateway.get_forecast(&city).await.unwrap();

    assert_eq!(first.len(), 4);
    assert_eq!(first, second);
    assert_eq!(h.fetcher.forecast_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_forecast_with_fewer_days() {
    let h = harness();
    h.fetcher.forecast.lock().push_back(Ok(raw_forecast(2)));

    let days = h.gateway.get_forecast(&london()).await.unwrap();
    assert_eq!(days.len(), 2);
    assert_eq!(days[0].day, "Mon");
    assert_eq!(days[0].temperature, 10);
}

#[tokio::test]
async fn test_air_quality_notifies_on_every_call() {
    let h = harness();
    h.fetcher.air.lock().push_back(Ok(raw_air(3)));
    let city = london();

    let first = h.gateway.get_air_quality(&city).await.unwrap();
    let second = h.gateway.get_air_quality(&city).await.unwrap();

    assert_eq!(first.aqi, 3);
    assert_eq!(second.aqi, 3);
    assert_eq!(h.fetcher.air_calls.load(Ordering::SeqCst), 1);

    let shown = h.notifier.all();
    assert_eq!(shown.len(), 2);
    for n in shown {
        assert_eq!(n.title, "Air Quality Alert");
        assert_eq!(n.description, "Air quality in London: Moderate");
        assert_eq!(n.severity, Severity::Destructive);
    }
}

#[tokio::test]
async fn test_weather_and_air_quality_share_cache_without_colliding() {
    let h = harness();
    let city = london();

    h.gateway.get_weather_data(&city).await.unwrap();
    let air = h.gateway.get_air_quality(&city).await.unwrap();
    let weather = h.gateway.get_weather_data(&city).await.unwrap();

    assert_eq!(air.aqi, 1);
    assert_eq!(weather.temperature, 12);
    assert_eq!(h.gateway.cache().len(), 2);
    assert_eq!(h.fetcher.weather_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.fetcher.air_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_air_quality_failure_shows_error_only() {
    let h = harness();
    h.fetcher
        .air
        .lock()
        .push_back(Err(FetchError::http(401, "Invalid API key")));

    let err = h.gateway.get_air_quality(&london()).await.unwrap_err();

    assert_eq!(err, WeatherError::Unauthorized);
    let shown = h.notifier.all();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].title, "Error");
}
