// Luggage Testdata - Core generator
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Core fleet generation logic.
//!
//! Every item walks away from a common base position with normal noise,
//! may park for the rest of the trip, reports a temperature per sample and
//! raises fall/tamper alerts as Bernoulli trials. The same seed always yields
//! the same fleet.

use chrono::{DateTime, Duration, TimeZone, Utc};
use luggage_telemetry::{
    AlertEvent, LocationSample, LuggageItem, StatusClassifier, Tag, TemperatureSample,
};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::{Bernoulli, Normal};
use serde::{Deserialize, Serialize};

use crate::dataset::{DatasetError, FleetDataset};
use crate::scenario::Scenario;

const NAMES: [&str; 8] = [
    "Blue suitcase",
    "Black duffel",
    "Red carry-on",
    "Camera bag",
    "Golf bag",
    "Kids' backpack",
    "Grey trunk",
    "Green holdall",
];

const DESTINATIONS: [&str; 5] = ["MNL", "CEB", "DVO", "ILO", "KLO"];

/// Generator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Start timestamp in milliseconds.
    pub start_time_ms: i64,
    /// Interval between samples in milliseconds.
    pub sample_interval_ms: u64,
    /// Number of samples per item.
    pub num_samples: usize,
    /// Random seed for reproducibility.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            start_time_ms: 1706745600000, // 2024-02-01 00:00:00 UTC
            sample_interval_ms: 60_000,   // 1 minute
            num_samples: 60,              // 1 hour
            seed: None,
        }
    }
}

impl GeneratorConfig {
    /// Create a new generator config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set start timestamp.
    pub fn with_start_time(mut self, timestamp_ms: i64) -> Self {
        self.start_time_ms = timestamp_ms;
        self
    }

    /// Set sample interval in seconds.
    pub fn with_sample_interval_secs(mut self, secs: u64) -> Self {
        self.sample_interval_ms = secs * 1000;
        self
    }

    /// Set number of samples.
    pub fn with_num_samples(mut self, n: usize) -> Self {
        self.num_samples = n;
        self
    }

    /// Set duration in hours (calculates num_samples from interval).
    pub fn with_duration_hours(mut self, hours: f64) -> Self {
        let total_ms = hours * 3_600_000.0;
        self.num_samples = (total_ms / self.sample_interval_ms.max(1) as f64).ceil() as usize;
        self
    }

    /// Set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Timestamp of sample `i`.
    pub fn sample_time(&self, i: usize) -> Option<DateTime<Utc>> {
        let start = Utc.timestamp_millis_opt(self.start_time_ms).single()?;
        let offset = Duration::milliseconds(self.sample_interval_ms as i64 * i as i64);
        start.checked_add_signed(offset)
    }

    /// Timestamp of the last sample.
    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.sample_time(self.num_samples.saturating_sub(1))
    }
}

/// Fleet shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetConfig {
    /// Number of registered items.
    pub items: usize,
    /// Tag prefix; tags are `<prefix>-0000`, `<prefix>-0001`, ...
    pub tag_prefix: String,
    /// Latitude every item starts from (also the owner's position).
    pub base_latitude: f64,
    /// Longitude every item starts from.
    pub base_longitude: f64,
    /// Standard deviation of one random-walk step, in degrees.
    pub step_std_deg: f64,
    /// Owner reference written on every item.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            items: 5,
            tag_prefix: "LG".to_string(),
            base_latitude: 14.5086, // NAIA Terminal 3
            base_longitude: 121.0194,
            step_std_deg: 0.0003, // ~33 m
            user_id: None,
        }
    }
}

impl FleetConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set item count.
    pub fn with_items(mut self, items: usize) -> Self {
        self.items = items;
        self
    }

    /// Set base position.
    pub fn with_base(mut self, latitude: f64, longitude: f64) -> Self {
        self.base_latitude = latitude;
        self.base_longitude = longitude;
        self
    }

    /// Set random-walk step size.
    pub fn with_step_std_deg(mut self, std: f64) -> Self {
        self.step_std_deg = std;
        self
    }

    /// Set owner reference.
    pub fn with_user(mut self, user_id: &str) -> Self {
        self.user_id = Some(user_id.to_string());
        self
    }

    fn tag(&self, i: usize) -> Tag {
        Tag::new(format!("{}-{:04}", self.tag_prefix, i))
    }
}

fn invalid(what: &str, err: impl std::fmt::Display) -> DatasetError {
    DatasetError::InvalidParameter(format!("{}: {}", what, err))
}

/// Generate a fleet.
///
/// Orphaned tags (scenario `Orphaned`) emit alerts and temperatures but are
/// left out of the item list.
pub fn generate_fleet(
    config: &GeneratorConfig,
    fleet: &FleetConfig,
    scenario: Scenario,
) -> Result<FleetDataset, DatasetError> {
    let mut rng: StdRng = match config.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };
    let params = scenario.params();

    let step = Normal::new(0.0, fleet.step_std_deg).map_err(|e| invalid("step_std_deg", e))?;
    let temperature = Normal::new(params.temperature_mean, params.temperature_std)
        .map_err(|e| invalid("temperature_std", e))?;
    let fall = Bernoulli::new(params.fall_probability).map_err(|e| invalid("fall_probability", e))?;
    let tamper =
        Bernoulli::new(params.tamper_probability).map_err(|e| invalid("tamper_probability", e))?;
    let park = Bernoulli::new(params.park_probability).map_err(|e| invalid("park_probability", e))?;

    let times: Vec<DateTime<Utc>> = (0..config.num_samples)
        .map(|i| config.sample_time(i))
        .collect::<Option<_>>()
        .ok_or_else(|| invalid("start_time_ms", "timestamp out of range"))?;
    let end = times.last().copied();

    let base = (fleet.base_latitude, fleet.base_longitude);
    let classifier = StatusClassifier::default();
    let mut dataset = FleetDataset::default();

    for i in 0..fleet.items + params.orphan_items {
        let tag = fleet.tag(i);
        let orphan = i >= fleet.items;

        let mut position = base;
        let mut parked = false;
        let mut history = Vec::with_capacity(times.len());

        for &ts in &times {
            if !parked {
                parked = i % 2 == 1 && park.sample(&mut rng);
            }
            if !parked {
                position.0 += step.sample(&mut rng);
                position.1 += step.sample(&mut rng);
            }
            history.push(LocationSample::new(tag.clone(), ts, position.0, position.1));

            let reading = (temperature.sample(&mut rng) * 10.0).round() / 10.0;
            dataset
                .temperatures
                .push(TemperatureSample::new(tag.clone(), ts, reading));

            if fall.sample(&mut rng) {
                dataset
                    .falls
                    .push(AlertEvent::new(tag.clone(), ts).with_severity("high"));
            }
            if tamper.sample(&mut rng) {
                dataset.tampers.push(AlertEvent::new(tag.clone(), ts));
            }
        }

        if orphan {
            dataset.metadata.orphan_tags.push(tag.to_string());
        } else {
            let mut item = LuggageItem::new(tag.clone(), NAMES[i % NAMES.len()])
                .with_destination(DESTINATIONS[i % DESTINATIONS.len()])
                .with_position(position.0, position.1);
            if let Some(end) = end {
                let derived = classifier.derive(&history, Some(base), end);
                item = item.with_status(derived.status).with_updated_at(end);
                if let Some(moved) = derived.last_moved {
                    item = item.with_last_moved(moved);
                }
            }
            if let Some(user) = &fleet.user_id {
                item = item.with_user(user);
            }
            dataset.items.push(item);
            dataset.locations.extend(history);
        }
    }

    dataset.metadata.scenario = scenario.name().to_string();
    dataset.metadata.seed = config.seed;
    dataset.metadata.sample_interval_ms = config.sample_interval_ms;
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use luggage_telemetry::{LuggageStatus, TimedRecord};

    fn config() -> GeneratorConfig {
        GeneratorConfig::new().with_num_samples(120).with_seed(42)
    }

    #[test]
    fn test_generator_config_builder() {
        let config = GeneratorConfig::new()
            .with_sample_interval_secs(30)
            .with_duration_hours(1.0);
        assert_eq!(config.sample_interval_ms, 30_000);
        assert_eq!(config.num_samples, 120);
        assert_eq!(
            config.end_time().unwrap() - config.sample_time(0).unwrap(),
            Duration::seconds(119 * 30)
        );
    }

    #[test]
    fn test_generate_shapes() {
        let fleet = FleetConfig::new().with_items(4).with_user("user-1");
        let dataset = generate_fleet(&config(), &fleet, Scenario::NormalTrip).unwrap();

        assert_eq!(dataset.items.len(), 4);
        assert_eq!(dataset.locations.len(), 4 * 120);
        assert_eq!(dataset.temperatures.len(), 4 * 120);
        assert_eq!(dataset.items[0].tag.as_str(), "LG-0000");
        assert_eq!(dataset.items[0].user_id.as_deref(), Some("user-1"));
        assert!(dataset.items.iter().all(|i| i.status != LuggageStatus::Unknown));
        assert!(dataset.metadata.orphan_tags.is_empty());
    }

    #[test]
    fn test_deterministic_with_seed() {
        let fleet = FleetConfig::new();
        let a = generate_fleet(&config(), &fleet, Scenario::RoughHandling).unwrap();
        let b = generate_fleet(&config(), &fleet, Scenario::RoughHandling).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rough_handling_has_more_falls() {
        let fleet = FleetConfig::new().with_items(10);
        let normal = generate_fleet(&config(), &fleet, Scenario::NormalTrip).unwrap();
        let rough = generate_fleet(&config(), &fleet, Scenario::RoughHandling).unwrap();
        assert!(rough.falls.len() > normal.falls.len());
    }

    #[test]
    fn test_cold_hold_temperatures() {
        let dataset = generate_fleet(&config(), &FleetConfig::new(), Scenario::ColdHold).unwrap();
        let mean: f64 = dataset
            .temperatures
            .iter()
            .filter_map(|t| t.value())
            .sum::<f64>()
            / dataset.temperatures.len() as f64;
        assert!((mean - 4.0).abs() < 0.5, "mean was {}", mean);
    }

    #[test]
    fn test_orphaned_tags_not_registered() {
        let fleet = FleetConfig::new().with_items(3);
        let dataset = generate_fleet(&config(), &fleet, Scenario::Orphaned).unwrap();

        assert_eq!(dataset.items.len(), 3);
        assert_eq!(dataset.metadata.orphan_tags, vec!["LG-0003", "LG-0004"]);
        assert!(dataset
            .temperatures
            .iter()
            .any(|t| t.tag.as_str() == "LG-0004"));
        assert!(dataset.locations.iter().all(|l| l.tag.as_str() < "LG-0003"));
    }

    #[test]
    fn test_invalid_parameters_are_errors() {
        let fleet = FleetConfig::new().with_step_std_deg(-1.0);
        let result = generate_fleet(&config(), &fleet, Scenario::NormalTrip);
        assert!(matches!(result, Err(DatasetError::InvalidParameter(_))));
    }
}
