//! Dashboard state and the reducer that moves it forward.
//!
//! `WeatherState` is never mutated in place once published: every [`Action`]
//! produces a fresh value via [`WeatherState::reduce`], and the store swaps
//! it in whole.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use skycast_weather::{City, ForecastDay, WeatherSnapshot, MAX_FORECAST_DAYS};

/// Everything that can happen to the dashboard state.
#[derive(Debug, Clone)]
pub enum Action {
    /// Search results arrived; replaces the previous suggestions
    SuggestionsLoaded(Vec<City>),
    SuggestionsCleared,
    /// Start watching a city: append, select, mark loading
    CityAdded(City),
    /// Stop watching the city with this id
    CityRemoved(String),
    CitySelected(City),
    /// Weather for the city with this id; keyed by the requested city, not
    /// by whatever the snapshot carries
    WeatherLoaded { city_id: String, snapshot: WeatherSnapshot },
    WeatherFailed { city_id: String, message: String },
    /// Weather request finished, whatever the outcome
    WeatherSettled { city_id: String },
    ForecastStarted,
    ForecastLoaded(Vec<ForecastDay>),
    ForecastSettled,
}

/// Snapshot of the dashboard.
///
/// Per-city maps are keyed by [`City::id`] and only ever hold ids of watched
/// cities.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WeatherState {
    watched_cities: Vec<City>,
    weather_by_id: HashMap<String, WeatherSnapshot>,
    loading_by_id: HashMap<String, bool>,
    error_by_id: HashMap<String, String>,
    selected_city: Option<City>,
    forecast: Vec<ForecastDay>,
    suggestions: Vec<City>,
    forecast_loading: bool,
}

impl WeatherState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `action`, returning the next state. `self` is left untouched.
    pub fn reduce(&self, action: Action) -> Self {
        let mut next = self.clone();

        match action {
            Action::SuggestionsLoaded(cities) => {
                next.suggestions = cities;
            }
            Action::SuggestionsCleared => {
                next.suggestions.clear();
            }
            Action::CityAdded(city) => {
                if self.is_watched(city.id()) {
                    return next;
                }
                next.loading_by_id.insert(city.id().to_string(), true);
                next.suggestions.clear();
                next.selected_city = Some(city.clone());
                next.watched_cities.push(city);
            }
            Action::CityRemoved(city_id) => {
                next.watched_cities.retain(|c| c.id() != city_id);
                next.weather_by_id.remove(&city_id);
                next.loading_by_id.remove(&city_id);
                next.error_by_id.remove(&city_id);
                if next.selected_city.as_ref().is_some_and(|c| c.id() == city_id) {
                    next.selected_city = None;
                }
            }
            Action::CitySelected(city) => {
                if self.is_watched(city.id()) {
                    next.selected_city = Some(city);
                } else {
                    tracing::debug!("Ignoring selection of unwatched city {}", city.id());
                }
            }
            // Results for a city removed while its request was in flight are
            // dropped so the maps never hold orphaned ids
            Action::WeatherLoaded { city_id, mut snapshot } => {
                if self.is_watched(&city_id) {
                    snapshot.city_id = city_id.clone();
                    next.weather_by_id.insert(city_id, snapshot);
                }
            }
            Action::WeatherFailed { city_id, message } => {
                if self.is_watched(&city_id) {
                    next.error_by_id.insert(city_id, message);
                }
            }
            Action::WeatherSettled { city_id } => {
                if self.is_watched(&city_id) {
                    next.loading_by_id.insert(city_id, false);
                }
            }
            Action::ForecastStarted => {
                next.forecast_loading = true;
            }
            Action::ForecastLoaded(mut days) => {
                days.truncate(MAX_FORECAST_DAYS);
                next.forecast = days;
            }
            Action::ForecastSettled => {
                next.forecast_loading = false;
            }
        }

        next
    }

    pub fn is_watched(&self, city_id: &str) -> bool {
        self.watched_cities.iter().any(|c| c.id() == city_id)
    }

    /// Watched cities in the order they were added
    pub fn watched_cities(&self) -> &[City] {
        &self.watched_cities
    }

    pub fn city_weather_map(&self) -> &HashMap<String, WeatherSnapshot> {
        &self.weather_by_id
    }

    pub fn weather_for(&self, city_id: &str) -> Option<&WeatherSnapshot> {
        self.weather_by_id.get(city_id)
    }

    pub fn loading_states(&self) -> &HashMap<String, bool> {
        &self.loading_by_id
    }

    pub fn is_loading(&self, city_id: &str) -> bool {
        self.loading_by_id.get(city_id).copied().unwrap_or(false)
    }

    pub fn errors(&self) -> &HashMap<String, String> {
        &self.error_by_id
    }

    pub fn error_for(&self, city_id: &str) -> Option<&str> {
        self.error_by_id.get(city_id).map(String::as_str)
    }

    pub fn selected_city(&self) -> Option<&City> {
        self.selected_city.as_ref()
    }

    /// Weather of the selected city, if both exist
    pub fn current_weather(&self) -> Option<&WeatherSnapshot> {
        self.selected_city
            .as_ref()
            .and_then(|c| self.weather_by_id.get(c.id()))
    }

    pub fn forecast_days(&self) -> &[ForecastDay] {
        &self.forecast
    }

    pub fn is_forecast_loading(&self) -> bool {
        self.forecast_loading
    }

    /// Search suggestions minus anything already watched. Computed on every
    /// call; the raw result list is what's stored.
    pub fn city_suggestions(&self) -> Vec<City> {
        let watched: HashSet<&str> = self.watched_cities.iter().map(City::id).collect();
        self.suggestions
            .iter()
            .filter(|c| !watched.contains(c.id()))
            .cloned()
            .collect()
    }
}
