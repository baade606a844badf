//! Dashboard state for SkyCast
//!
//! A reducer-style container for the watch list, per-city weather and the
//! selected city's forecast, plus the store that drives the weather gateway.

pub mod search;
pub mod state;
pub mod store;

pub use search::{spawn_search_driver, DEFAULT_DEBOUNCE_MS};
pub use state::{Action, WeatherState};
pub use store::WeatherStore;
