// Luggage Telemetry - Aggregation and status engine
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Status classification
//!
//! Status normally arrives already classified by the store. The classifier
//! validates it against the closed set, decides what the dashboard shows for
//! a selection, and can also derive a status from location history when the
//! collaborator delegates that to the engine.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::StatusConfig;
use crate::error::Degradation;
use crate::places::distance_m;
use crate::record::{LocationSample, TimedRecord};
use crate::selection::FilteredView;

/// Closed set of luggage states.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum LuggageStatus {
    /// No classification yet (newly registered, or unrecognized input)
    #[default]
    Unknown,
    /// Within range of its owner / base station
    #[serde(rename = "In Range")]
    InRange,
    /// Beyond range of its owner / base station
    #[serde(rename = "Out of Range")]
    OutOfRange,
    /// Has not moved since its last-moved timestamp
    Stationary,
}

impl LuggageStatus {
    pub const ALL: [LuggageStatus; 4] = [
        LuggageStatus::Unknown,
        LuggageStatus::InRange,
        LuggageStatus::OutOfRange,
        LuggageStatus::Stationary,
    ];

    /// Display name, as stored by the sample store.
    pub fn as_str(&self) -> &'static str {
        match self {
            LuggageStatus::Unknown => "Unknown",
            LuggageStatus::InRange => "In Range",
            LuggageStatus::OutOfRange => "Out of Range",
            LuggageStatus::Stationary => "Stationary",
        }
    }

    /// Visual emphasis used by map popups.
    pub fn tone(&self) -> StatusTone {
        match self {
            LuggageStatus::InRange => StatusTone::Ok,
            LuggageStatus::OutOfRange => StatusTone::Warning,
            LuggageStatus::Stationary | LuggageStatus::Unknown => StatusTone::Alert,
        }
    }

    /// Parse without ever failing.
    ///
    /// Display names and identifier spellings are accepted in any case, with
    /// spaces, `_` or `-` between words. Anything else maps to `Unknown` and
    /// comes back with an `UnknownStatusValue` degradation.
    pub fn parse_lenient(raw: &str) -> (LuggageStatus, Option<Degradation>) {
        let normalized: String = raw
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect();

        let status = match normalized.as_str() {
            "unknown" => Some(LuggageStatus::Unknown),
            "inrange" => Some(LuggageStatus::InRange),
            "outofrange" => Some(LuggageStatus::OutOfRange),
            "stationary" => Some(LuggageStatus::Stationary),
            _ => None,
        };

        match status {
            Some(status) => (status, None),
            None => (
                LuggageStatus::Unknown,
                Some(Degradation::UnknownStatusValue {
                    tag: None,
                    value: raw.to_string(),
                }),
            ),
        }
    }
}

impl fmt::Display for LuggageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visual emphasis of a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusTone {
    Ok,
    Warning,
    Alert,
}

/// What the status card shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatusDisplay {
    /// A validated status for one selected item
    Status(LuggageStatus),
    /// No single status is meaningful ("All", or an unknown tag)
    Placeholder(String),
}

impl StatusDisplay {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, StatusDisplay::Placeholder(_))
    }

    pub fn status(&self) -> Option<LuggageStatus> {
        match self {
            StatusDisplay::Status(status) => Some(*status),
            StatusDisplay::Placeholder(_) => None,
        }
    }
}

impl fmt::Display for StatusDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusDisplay::Status(status) => f.write_str(status.as_str()),
            StatusDisplay::Placeholder(text) => f.write_str(text),
        }
    }
}

/// Status computed from location history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedStatus {
    pub status: LuggageStatus,
    /// When the item arrived at its current spot.
    pub last_moved: Option<DateTime<Utc>>,
}

/// Status classifier.
#[derive(Debug, Clone)]
pub struct StatusClassifier {
    config: StatusConfig,
}

impl Default for StatusClassifier {
    fn default() -> Self {
        Self::new(StatusConfig::default())
    }
}

impl StatusClassifier {
    /// Create a new classifier
    pub fn new(config: StatusConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StatusConfig {
        &self.config
    }

    /// Validate a status string coming from the collaborator.
    ///
    /// Unrecognized values become `Unknown` and are logged.
    pub fn validate(&self, raw: &str, tag: Option<&str>) -> LuggageStatus {
        let (status, degradation) = LuggageStatus::parse_lenient(raw);
        if degradation.is_some() {
            Degradation::UnknownStatusValue {
                tag: tag.map(str::to_string),
                value: raw.to_string(),
            }
            .log();
        }
        status
    }

    /// Status shown for a filtered view.
    pub fn display(&self, view: &FilteredView<'_>) -> StatusDisplay {
        match view.item() {
            Some(item) if !view.selection().is_all() => StatusDisplay::Status(item.status),
            _ => StatusDisplay::Placeholder(self.config.placeholder.clone()),
        }
    }

    /// Derive a status from an item's location history.
    ///
    /// `history` may be unordered and may include other tags' pings only if
    /// the caller has not filtered; samples without timestamps are skipped.
    /// `base` is the owner's or base station's position; without it range
    /// cannot be judged and a moving item stays `Unknown`.
    pub fn derive(
        &self,
        history: &[LocationSample],
        base: Option<(f64, f64)>,
        now: DateTime<Utc>,
    ) -> DerivedStatus {
        let mut timed: Vec<(DateTime<Utc>, (f64, f64))> = history
            .iter()
            .filter_map(|s| s.timestamp().map(|ts| (ts, (s.latitude, s.longitude))))
            .collect();
        timed.sort_by(|a, b| b.0.cmp(&a.0));

        let Some(&(newest_ts, newest_pos)) = timed.first() else {
            return DerivedStatus {
                status: LuggageStatus::Unknown,
                last_moved: None,
            };
        };

        // Trailing run of pings that stayed put around the newest one
        let mut run_len = 0;
        let mut last_moved = newest_ts;
        for (ts, pos) in &timed {
            if distance_m(*pos, newest_pos) > self.config.movement_epsilon_m {
                break;
            }
            run_len += 1;
            last_moved = *ts;
        }

        let still_for = (now - last_moved).num_seconds();
        if run_len >= 2 && still_for >= i64::from(self.config.stationary_after_secs) {
            return DerivedStatus {
                status: LuggageStatus::Stationary,
                last_moved: Some(last_moved),
            };
        }

        let status = match base {
            Some(base) if distance_m(newest_pos, base) <= self.config.range_radius_m => {
                LuggageStatus::InRange
            }
            Some(_) => LuggageStatus::OutOfRange,
            None => LuggageStatus::Unknown,
        };

        DerivedStatus {
            status,
            last_moved: Some(last_moved),
        }
    }
}
