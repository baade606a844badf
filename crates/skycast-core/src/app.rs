use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use skycast_state::{spawn_search_driver, WeatherStore};
use skycast_weather::{
    ChannelNotifier, City, Fetcher, Notification, Notifier, OpenWeatherFetcher, WeatherGateway,
};

use crate::{AppError, Config};

/// Wires configuration, the OpenWeather fetcher, the gateway and the store
pub struct App {
    config: Arc<Config>,
    gateway: Arc<WeatherGateway>,
    store: Arc<WeatherStore>,
    notifications: Option<mpsc::UnboundedReceiver<Notification>>,
}

impl App {
    /// Create an application from the user's validated config file
    pub fn new() -> Result<Self, AppError> {
        let (config, _) = Config::load_validated()?;
        Self::with_config(config)
    }

    pub fn with_config(config: Config) -> Result<Self, AppError> {
        let fetcher = OpenWeatherFetcher::new(config.fetcher_settings())
            .context("Failed to build HTTP client")?;
        Ok(Self::with_fetcher(config, Arc::new(fetcher)))
    }

    /// Build around any fetcher; notifications go to a channel drained via
    /// [`App::take_notifications`]
    pub fn with_fetcher(config: Config, fetcher: Arc<dyn Fetcher>) -> Self {
        let (notifier, rx) = ChannelNotifier::new();
        let gateway = Arc::new(
            WeatherGateway::new(fetcher, Arc::new(notifier))
                .with_retry_config(config.retry_config())
                .with_search_limit(config.api.search_limit),
        );

        tracing::info!("SkyCast initialized");

        Self {
            config: Arc::new(config),
            store: Arc::new(WeatherStore::new(gateway.clone())),
            gateway,
            notifications: Some(rx),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> Arc<WeatherStore> {
        self.store.clone()
    }

    /// Resolve `query` to its `pick`-th match (1-based). Unlike the store's
    /// suggestion search, failures are returned to the caller.
    pub async fn find_city(&self, query: &str, pick: usize) -> Result<Option<City>, AppError> {
        let mut cities = self.gateway.search_cities(query).await?;
        let index = pick.saturating_sub(1);
        Ok((index < cities.len()).then(|| cities.swap_remove(index)))
    }

    /// The notification stream. Only the first caller gets it.
    pub fn take_notifications(&mut self) -> Option<mpsc::UnboundedReceiver<Notification>> {
        self.notifications.take()
    }

    /// Forward pending notifications to `sink` until none arrives for `wait`.
    /// Returns how many were forwarded; zero once the stream has been taken.
    pub async fn drain_notifications(&mut self, sink: &dyn Notifier, wait: Duration) -> usize {
        let Some(rx) = self.notifications.as_mut() else {
            return 0;
        };

        let mut forwarded = 0;
        while let Ok(Some(notification)) = tokio::time::timeout(wait, rx.recv()).await {
            sink.show(notification);
            forwarded += 1;
        }
        forwarded
    }

    /// Start a debounced search driver using the configured quiet period
    pub fn spawn_search(&self, input: mpsc::Receiver<String>) -> JoinHandle<()> {
        spawn_search_driver(self.store.clone(), input, self.config.debounce())
    }
}
