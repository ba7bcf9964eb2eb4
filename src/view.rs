// Luggage Telemetry - Aggregation and status engine
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Display-ready views produced by the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregator::SeriesPoint;
use crate::error::Degradation;
use crate::record::Tag;
use crate::selection::Selection;
use crate::status::{LuggageStatus, StatusDisplay, StatusTone};

/// Version of the view format.
pub const VIEW_VERSION: &str = "0.1.0";

/// Title of the temperature card under "All".
pub const AVERAGE_TEMPERATURE_TITLE: &str = "Average Temperature";
/// Title of the temperature card for one item.
pub const TEMPERATURE_TITLE: &str = "Temperature";

/// The four dashboard metrics plus the temperature chart, for one selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardView {
    /// Format version.
    pub version: String,
    /// Selection every metric below was computed with.
    pub selection: Selection,
    pub status: StatusDisplay,
    /// Average under "All", newest reading for one item; 0 with no data.
    pub temperature: f64,
    pub temperature_title: String,
    pub fall_count: usize,
    pub tamper_count: usize,
    /// Ascending by timestamp.
    pub temperature_series: Vec<SeriesPoint>,
    /// Degraded inputs behind this view.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub diagnostics: Vec<Degradation>,
}

impl DashboardView {
    /// The fully defined zero state for `selection`.
    pub fn empty(selection: Selection, placeholder: &str) -> Self {
        let temperature_title = if selection.is_all() {
            AVERAGE_TEMPERATURE_TITLE
        } else {
            TEMPERATURE_TITLE
        };
        Self {
            version: VIEW_VERSION.to_string(),
            selection,
            status: StatusDisplay::Placeholder(placeholder.to_string()),
            temperature: 0.0,
            temperature_title: temperature_title.to_string(),
            fall_count: 0,
            tamper_count: 0,
            temperature_series: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Detail card for one tracked item (map popup / bottom sheet).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingCard {
    pub tag: Tag,
    pub name: String,
    /// Resolved place of the newest location sample.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place_name: Option<String>,
    pub destination: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    /// Instant the "last updated" text is computed from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// "Last updated ..." text; absent when nothing is timed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    pub status: LuggageStatus,
    pub tone: StatusTone,
    /// "Since ..." text, only for stationary items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stationary_since: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub diagnostics: Vec<Degradation>,
}

impl TrackingCard {
    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// One map pin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapMarker {
    pub tag: Tag,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub status: LuggageStatus,
    pub tone: StatusTone,
}

/// Count of items in one status, for the status pie chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: LuggageStatus,
    pub count: usize,
}
