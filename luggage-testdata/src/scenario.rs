// Luggage Testdata - Trip scenarios
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Trip scenario presets.
//!
//! A scenario only tunes rates and distributions; the generator does the rest.

use serde::{Deserialize, Serialize};

/// Trip scenario types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    /// Ordinary trip: rare alerts, cabin temperature.
    #[default]
    NormalTrip,
    /// Frequent falls (careless baggage handling).
    RoughHandling,
    /// Repeated tamper alerts.
    Tampering,
    /// Unheated cargo hold.
    ColdHold,
    /// Alerts for items that were since removed from the fleet.
    Orphaned,
}

impl Scenario {
    pub const ALL: [Scenario; 5] = [
        Scenario::NormalTrip,
        Scenario::RoughHandling,
        Scenario::Tampering,
        Scenario::ColdHold,
        Scenario::Orphaned,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Scenario::NormalTrip => "normal_trip",
            Scenario::RoughHandling => "rough_handling",
            Scenario::Tampering => "tampering",
            Scenario::ColdHold => "cold_hold",
            Scenario::Orphaned => "orphaned",
        }
    }

    /// Parse a scenario name as produced by [`Scenario::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    /// Generation parameters for this scenario.
    pub fn params(&self) -> ScenarioParams {
        let base = ScenarioParams::default();
        match self {
            Scenario::NormalTrip => base,
            Scenario::RoughHandling => ScenarioParams {
                fall_probability: 0.08,
                ..base
            },
            Scenario::Tampering => ScenarioParams {
                tamper_probability: 0.05,
                ..base
            },
            Scenario::ColdHold => ScenarioParams {
                temperature_mean: 4.0,
                temperature_std: 1.5,
                ..base
            },
            Scenario::Orphaned => ScenarioParams {
                fall_probability: 0.03,
                tamper_probability: 0.02,
                orphan_items: 2,
                ..base
            },
        }
    }
}

/// Rates and distributions used by the generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioParams {
    /// Chance of a fall alert per item per sample.
    pub fall_probability: f64,
    /// Chance of a tamper alert per item per sample.
    pub tamper_probability: f64,
    /// Mean temperature (°C).
    pub temperature_mean: f64,
    /// Temperature standard deviation (°C).
    pub temperature_std: f64,
    /// Chance an item stops moving for the rest of the trip, per sample.
    pub park_probability: f64,
    /// Extra tags that emit alerts but are not in the item list.
    pub orphan_items: usize,
}

impl Default for ScenarioParams {
    fn default() -> Self {
        Self {
            fall_probability: 0.005,
            tamper_probability: 0.002,
            temperature_mean: 22.0,
            temperature_std: 0.8,
            park_probability: 0.02,
            orphan_items: 0,
        }
    }
}
