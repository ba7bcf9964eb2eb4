// Luggage Telemetry - Aggregation and status engine
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Engine configuration.

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TelemetryError};

/// Largest UTC offset accepted for display (±14h).
pub const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

/// Master configuration for the telemetry engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Bucketing and orphan handling.
    pub aggregation: AggregationConfig,

    /// Status display and derivation.
    pub status: StatusConfig,

    /// Relative-time recomputation.
    pub refresh: RefreshConfig,

    /// Presentation settings.
    pub display: DisplayConfig,
}

impl EngineConfig {
    /// Check value ranges. Called by `TelemetryEngine::new`.
    pub fn validate(&self) -> Result<()> {
        if self.aggregation.bucket_secs == 0 {
            return Err(TelemetryError::InvalidConfig(
                "aggregation.bucket_secs must be > 0".to_string(),
            ));
        }
        if self.aggregation.timeline_bucket_secs == 0 {
            return Err(TelemetryError::InvalidConfig(
                "aggregation.timeline_bucket_secs must be > 0".to_string(),
            ));
        }
        if self.aggregation.temperature_precision > 6 {
            return Err(TelemetryError::InvalidConfig(format!(
                "aggregation.temperature_precision {} exceeds 6",
                self.aggregation.temperature_precision
            )));
        }
        if self.refresh.interval_secs == 0 {
            return Err(TelemetryError::InvalidConfig(
                "refresh.interval_secs must be > 0".to_string(),
            ));
        }
        for (name, value) in [
            ("status.range_radius_m", self.status.range_radius_m),
            ("status.movement_epsilon_m", self.status.movement_epsilon_m),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(TelemetryError::InvalidConfig(format!(
                    "{} must be a non-negative distance, got {}",
                    name, value
                )));
            }
        }
        if self.display.utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(TelemetryError::InvalidConfig(format!(
                "display.utc_offset_minutes {} outside ±{}",
                self.display.utc_offset_minutes, MAX_UTC_OFFSET_MINUTES
            )));
        }
        Ok(())
    }

    /// Parse from JSON. Missing sections and fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty JSON.
    pub fn to_json_pretty(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// How events whose tag matches no current luggage item are counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanPolicy {
    /// Valid tags are re-derived from the current item list; orphans vanish everywhere.
    #[default]
    Drop,
    /// Orphaned fall/tamper events still count toward "All" totals.
    Count,
}

/// Aggregation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Temperature bucket width for the "All" series, in seconds.
    pub bucket_secs: u32,

    /// Bucket width for fall/tamper timelines, in seconds.
    pub timeline_bucket_secs: u32,

    /// Orphaned-reference policy for fall/tamper totals.
    pub orphan_policy: OrphanPolicy,

    /// Decimal places of the "All" average temperature.
    pub temperature_precision: u32,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            bucket_secs: 60,
            timeline_bucket_secs: 3600,
            orphan_policy: OrphanPolicy::Drop,
            temperature_precision: 1,
        }
    }
}

/// Status display and derivation thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    /// Shown instead of a status when none is meaningful.
    pub placeholder: String,

    /// Max distance from the base position to count as in range (m).
    pub range_radius_m: f64,

    /// Pings closer than this to the newest one count as not moving (m).
    pub movement_epsilon_m: f64,

    /// Time without movement before an item is stationary (s).
    pub stationary_after_secs: u32,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            placeholder: "-".to_string(),
            range_radius_m: 200.0,
            movement_epsilon_m: 25.0,
            stationary_after_secs: 900, // 15 minutes
        }
    }
}

/// Relative-time refresh configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Recompute "last updated" text every N seconds.
    pub interval_secs: u32,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self { interval_secs: 60 }
    }
}

/// Presentation configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Offset used to decide "same calendar day" and render times of day.
    pub utc_offset_minutes: i32,
}

impl DisplayConfig {
    /// Offset as a chrono timezone; UTC if out of range.
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or(Utc.fix())
    }
}
