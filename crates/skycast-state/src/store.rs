//! The weather store: owns the current [`WeatherState`] and runs the async
//! work behind each user intent.
//!
//! Each state change is a single [`Action`] applied under a short write lock
//! that is never held across an `.await`, so readers always see a complete
//! snapshot.

use std::sync::Arc;

use parking_lot::RwLock;
use skycast_weather::{City, ForecastDay, WeatherGateway, WeatherSnapshot, MIN_QUERY_LEN};

use crate::state::{Action, WeatherState};

pub struct WeatherStore {
    gateway: Arc<WeatherGateway>,
    state: RwLock<Arc<WeatherState>>,
}

impl WeatherStore {
    pub fn new(gateway: Arc<WeatherGateway>) -> Self {
        Self {
            gateway,
            state: RwLock::new(Arc::new(WeatherState::new())),
        }
    }

    /// Current snapshot. Cheap; later updates don't affect it.
    pub fn snapshot(&self) -> Arc<WeatherState> {
        self.state.read().clone()
    }

    fn dispatch(&self, action: Action) {
        let mut state = self.state.write();
        let next = state.reduce(action);
        *state = Arc::new(next);
    }

    /// Apply `action` only if `guard` holds for the current state. Check and
    /// apply happen under the same lock.
    fn dispatch_if(&self, guard: impl FnOnce(&WeatherState) -> bool, action: Action) -> bool {
        let mut state = self.state.write();
        if !guard(&state) {
            return false;
        }
        let next = state.reduce(action);
        *state = Arc::new(next);
        true
    }

    /// Update suggestions for `term`. Short terms just clear them.
    ///
    /// Responses are applied in completion order: a slow search can
    /// overwrite the results of a newer one.
    pub async fn search_cities(&self, term: &str) {
        if term.chars().count() < MIN_QUERY_LEN {
            self.dispatch(Action::SuggestionsCleared);
            return;
        }

        match self.gateway.search_cities(term).await {
            Ok(cities) => self.dispatch(Action::SuggestionsLoaded(cities)),
            Err(e) => tracing::warn!("City search for '{}' failed: {}", term, e),
        }
    }

    /// Start watching `city`: select it, load its weather and forecast, then
    /// kick off an air-quality check in the background.
    pub async fn add_city(&self, city: City) {
        let added = self.dispatch_if(|s| !s.is_watched(city.id()), Action::CityAdded(city.clone()));
        if !added {
            tracing::debug!("City {} already watched", city.id());
            return;
        }
        tracing::info!("Watching {}", city.id());

        // Adding selects the city, which loads its forecast alongside the weather
        tokio::join!(self.load_weather(&city), self.load_forecast(&city));
    }

    async fn load_weather(&self, city: &City) {
        let city_id = city.id().to_string();

        match self.gateway.get_weather_data(city).await {
            Ok(snapshot) => self.dispatch(Action::WeatherLoaded {
                city_id: city_id.clone(),
                snapshot,
            }),
            Err(e) => {
                tracing::warn!("Weather for {} failed (status {:?}): {}", city_id, e.status(), e);
                self.dispatch(Action::WeatherFailed {
                    city_id: city_id.clone(),
                    message: e.user_message(),
                });
            }
        }
        self.dispatch(Action::WeatherSettled { city_id });

        let gateway = self.gateway.clone();
        let city = city.clone();
        tokio::spawn(async move {
            if let Err(e) = gateway.get_air_quality(&city).await {
                tracing::debug!("Air quality for {} failed: {}", city.id(), e);
            }
        });
    }

    /// Stop watching `city`. Unknown cities are ignored.
    pub fn delete_city(&self, city: &City) {
        tracing::info!("Removing {}", city.id());
        self.dispatch(Action::CityRemoved(city.id().to_string()));
    }

    /// Select a watched city and load its forecast. Selecting the already
    /// selected city loads it again.
    pub async fn select_city(&self, city: City) {
        let selected = self.dispatch_if(|s| s.is_watched(city.id()), Action::CitySelected(city.clone()));
        if !selected {
            tracing::debug!("Cannot select unwatched city {}", city.id());
            return;
        }
        self.load_forecast(&city).await;
    }

    pub fn clear_suggestions(&self) {
        self.dispatch(Action::SuggestionsCleared);
    }

    // Failures leave the previous forecast in place and are only logged
    async fn load_forecast(&self, city: &City) {
        self.dispatch(Action::ForecastStarted);
        match self.gateway.get_forecast(city).await {
            Ok(days) => self.dispatch(Action::ForecastLoaded(days)),
            Err(e) => tracing::warn!("Forecast for {} failed: {}", city.id(), e),
        }
        self.dispatch(Action::ForecastSettled);
    }

    pub fn watched_cities(&self) -> Vec<City> {
        self.snapshot().watched_cities().to_vec()
    }

    pub fn weather_for(&self, city: &City) -> Option<WeatherSnapshot> {
        self.snapshot().weather_for(city.id()).cloned()
    }

    pub fn is_loading(&self, city: &City) -> bool {
        self.snapshot().is_loading(city.id())
    }

    pub fn error_for(&self, city: &City) -> Option<String> {
        self.snapshot().error_for(city.id()).map(str::to_string)
    }

    pub fn selected_city(&self) -> Option<City> {
        self.snapshot().selected_city().cloned()
    }

    pub fn current_weather(&self) -> Option<WeatherSnapshot> {
        self.snapshot().current_weather().cloned()
    }

    pub fn forecast_days(&self) -> Vec<ForecastDay> {
        self.snapshot().forecast_days().to_vec()
    }

    pub fn is_forecast_loading(&self) -> bool {
        self.snapshot().is_forecast_loading()
    }

    pub fn city_suggestions(&self) -> Vec<City> {
        self.snapshot().city_suggestions()
    }
}

impl std::fmt::Debug for WeatherStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherStore")
            .field("state", &self.snapshot())
            .finish()
    }
}
