use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const ICON_BASE_URL: &str = "https://openweathermap.org/img/wn";

/// Round a Celsius reading to the nearest whole degree, halves rounding up
/// (so `-2.5` becomes `-2`, matching the provider's own display rounding).
pub fn round_celsius(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}

fn icon_url(icon: &str) -> String {
    format!("{}/{}@2x.png", ICON_BASE_URL, icon)
}

/// A city the user can watch.
///
/// Identity is the derived `id` (name, coordinates rounded to 4 decimals,
/// country), not the struct itself: two values built from the same search hit
/// compare equal even if they were constructed separately.
#[derive(Debug, Clone, Serialize)]
pub struct City {
    name: String,
    country: String,
    lat: f64,
    lon: f64,
    id: String,
}

impl City {
    pub fn new(name: impl Into<String>, country: impl Into<String>, lat: f64, lon: f64) -> Self {
        let name = name.into();
        let country = country.into();
        let id = format!("{}-{:.4}-{:.4}-{}", name, lat, lon, country);
        Self {
            name,
            country,
            lat,
            lon,
            id,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl PartialEq for City {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for City {}

impl std::hash::Hash for City {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Current conditions for one city. Replaced wholesale on every refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub city_id: String,
    pub city: String,
    /// Degrees Celsius, rounded
    pub temperature: i32,
    pub conditions: String,
    pub icon: String,
    /// When we fetched it, not the provider's observation time
    pub observed_at: DateTime<Utc>,
}

impl WeatherSnapshot {
    pub fn icon_url(&self) -> String {
        icon_url(&self.icon)
    }
}

/// One day of the aggregated forecast.
///
/// Only built by [`crate::aggregate::aggregate_forecast`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    /// Short weekday label ("Mon", "Tue", ...)
    pub day: String,
    pub temperature: i32,
    pub icon: String,
    pub description: String,
}

impl ForecastDay {
    pub fn icon_url(&self) -> String {
        icon_url(&self.icon)
    }
}

/// One raw 3-hourly forecast sample, as fed to the aggregator.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSample {
    /// Unix seconds
    pub timestamp: i64,
    pub temperature: f64,
    pub icon: String,
    pub description: String,
}

/// Pollutant concentrations in μg/m³.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PollutantComponents {
    #[serde(default)]
    pub co: Option<f64>,
    #[serde(default)]
    pub no: Option<f64>,
    #[serde(default)]
    pub no2: Option<f64>,
    #[serde(default)]
    pub o3: Option<f64>,
    #[serde(default)]
    pub so2: Option<f64>,
    #[serde(default)]
    pub pm2_5: Option<f64>,
    #[serde(default)]
    pub pm10: Option<f64>,
    #[serde(default)]
    pub nh3: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQuality {
    /// 1 (good) to 5 (very poor)
    pub aqi: u8,
    pub components: Option<PollutantComponents>,
}

impl AirQuality {
    pub fn level(&self) -> Option<AqiLevel> {
        AqiLevel::from_index(self.aqi)
    }
}

/// Air quality index categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AqiLevel {
    Good,
    Fair,
    Moderate,
    Poor,
    VeryPoor,
}

impl AqiLevel {
    pub fn from_index(aqi: u8) -> Option<Self> {
        match aqi {
            1 => Some(Self::Good),
            2 => Some(Self::Fair),
            3 => Some(Self::Moderate),
            4 => Some(Self::Poor),
            5 => Some(Self::VeryPoor),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Moderate => "Moderate",
            Self::Poor => "Poor",
            Self::VeryPoor => "Very Poor",
        }
    }

    /// Moderate and worse get a destructive notification
    pub fn is_concerning(&self) -> bool {
        matches!(self, Self::Moderate | Self::Poor | Self::VeryPoor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_city_id_rounds_coordinates() {
        let city = City::new("London", "GB", 51.507_321_5, -0.127_647_4);
        assert_eq!(city.id(), "London-51.5073--0.1276-GB");
    }

    #[test]
    fn test_city_equality_uses_derived_id() {
        let a = City::new("Paris", "FR", 48.856_61, 2.351_499);
        let b = City::new("Paris", "FR", 48.856_613, 2.351_5);
        assert_eq!(a, b);

        let other_country = City::new("Paris", "US", 48.856_61, 2.351_499);
        assert_ne!(a, other_country);
    }

    #[test]
    fn test_round_celsius_halves_round_up() {
        assert_eq!(round_celsius(14.5), 15);
        assert_eq!(round_celsius(14.49), 14);
        assert_eq!(round_celsius(-2.5), -2);
        assert_eq!(round_celsius(-2.6), -3);
    }

    #[test]
    fn test_aqi_levels() {
        assert_eq!(AqiLevel::from_index(1), Some(AqiLevel::Good));
        assert_eq!(AqiLevel::from_index(5), Some(AqiLevel::VeryPoor));
        assert_eq!(AqiLevel::from_index(0), None);
        assert_eq!(AqiLevel::from_index(6), None);
        assert_eq!(AqiLevel::VeryPoor.label(), "Very Poor");
    }

    #[test]
    fn test_aqi_concerning_from_moderate() {
        assert!(!AqiLevel::Good.is_concerning());
        assert!(!AqiLevel::Fair.is_concerning());
        assert!(AqiLevel::Moderate.is_concerning());
        assert!(AqiLevel::Poor.is_concerning());
        assert!(AqiLevel::VeryPoor.is_concerning());
    }

    #[test]
    fn test_icon_url() {
        let day = ForecastDay {
            day: "Mon".to_string(),
            temperature: 12,
            icon: "10d".to_string(),
            description: "light rain".to_string(),
        };
        assert_eq!(day.icon_url(), "https://openweathermap.org/img/wn/10d@2x.png");
    }
}
