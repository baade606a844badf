//! Daily summaries from the provider's 3-hourly forecast list.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate};

use crate::types::{round_celsius, ForecastDay, ForecastSample};

/// Number of days shown in the forecast strip
pub const MAX_FORECAST_DAYS: usize = 4;

struct DayGroup {
    day: String,
    icon: String,
    description: String,
    temperature: i32,
    temp_sum: f64,
    count: u32,
}

/// Collapse samples into at most [`MAX_FORECAST_DAYS`] daily summaries.
///
/// Days are keyed by UTC calendar date and kept in the order they first
/// appear. Each day's icon and description come from its first sample; the
/// temperature is the rounded mean of every sample seen for that day.
pub fn aggregate_forecast(samples: &[ForecastSample]) -> Vec<ForecastDay> {
    let mut groups: Vec<DayGroup> = Vec::new();
    let mut index_by_date: HashMap<NaiveDate, usize> = HashMap::new();

    for sample in samples {
        let Some(at) = DateTime::from_timestamp(sample.timestamp, 0) else {
            tracing::debug!("Skipping forecast sample with invalid timestamp {}", sample.timestamp);
            continue;
        };
        let date = at.date_naive();

        match index_by_date.get(&date) {
            Some(&idx) => {
                let group = &mut groups[idx];
                group.temp_sum += sample.temperature;
                group.count += 1;
                group.temperature = round_celsius(group.temp_sum / f64::from(group.count));
            }
            None => {
                index_by_date.insert(date, groups.len());
                groups.push(DayGroup {
                    day: at.format("%a").to_string(),
                    icon: sample.icon.clone(),
                    description: sample.description.clone(),
                    temperature: round_celsius(sample.temperature),
                    temp_sum: sample.temperature,
                    count: 1,
                });
            }
        }
    }

    groups
        .into_iter()
        .take(MAX_FORECAST_DAYS)
        .map(|g| ForecastDay {
            day: g.day,
            temperature: g.temperature,
            icon: g.icon,
            description: g.description,
        })
        .collect()
}
