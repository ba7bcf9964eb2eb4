// Luggage Testdata - Realistic fleet generator
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # Luggage Testdata
//!
//! Realistic fleet generator for the luggage telemetry engine.
//!
//! Produces items, location pings, fall and tamper alerts and temperature
//! samples for a simulated trip, with:
//!
//! - **Scenarios**: normal trip, rough handling, tampering, cold hold, orphaned alerts
//! - **Derived status**: item status comes from the generated location history
//! - **Dataset directories**: one JSON file per source, in the store's field names
//!
//! ## Quick Start
//!
//! ```rust
//! use luggage_testdata::{generate_fleet, FleetConfig, GeneratorConfig, Scenario};
//! use luggage_telemetry::{Selection, TelemetryEngine};
//!
//! let config = GeneratorConfig::new()
//!     .with_duration_hours(2.0)
//!     .with_sample_interval_secs(60)
//!     .with_seed(42);
//! let fleet = FleetConfig::new().with_items(3);
//!
//! let dataset = generate_fleet(&config, &fleet, Scenario::RoughHandling).unwrap();
//! let view = TelemetryEngine::default().render_dashboard(&dataset.to_snapshot(), &Selection::All);
//! assert_eq!(view.fall_count, dataset.falls.len());
//! ```

pub mod dataset;
pub mod generator;
pub mod scenario;

// Re-exports for convenience
pub use dataset::{DatasetError, FleetDataset, FleetMetadata};
pub use generator::{generate_fleet, FleetConfig, GeneratorConfig};
pub use scenario::{Scenario, ScenarioParams};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
