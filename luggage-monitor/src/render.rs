// Luggage Monitor - Frame rendering
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! One JSON document per render.

use chrono::{DateTime, Utc};
use luggage_telemetry::{
    DashboardView, Gazetteer, MapMarker, PlaceResolver, Selection, SelectionOption, StatusCount,
    Tag, TelemetryEngine, TelemetrySnapshot, TrackingCard,
};
use serde::Serialize;

/// What the monitor shows.
#[derive(Debug, Clone, Default)]
pub struct ViewRequest {
    pub selection: Selection,
    pub track: Option<Tag>,
}

/// Everything rendered from one snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct Frame {
    pub rendered_at: DateTime<Utc>,
    /// Sources that have settled, out of five.
    pub settled: usize,
    pub options: Vec<SelectionOption>,
    pub dashboard: DashboardView,
    pub statuses: Vec<StatusCount>,
    pub markers: Vec<MapMarker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking: Option<TrackingCard>,
}

impl Frame {
    pub fn to_json(&self, pretty: bool) -> Result<String, serde_json::Error> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}

/// Render every view for `request` from a single snapshot.
pub fn render_frame(
    engine: &TelemetryEngine,
    snapshot: &TelemetrySnapshot,
    request: &ViewRequest,
    places: Option<&Gazetteer>,
    settled: usize,
    now: DateTime<Utc>,
) -> Frame {
    let resolver = places.map(|g| g as &dyn PlaceResolver);
    Frame {
        rendered_at: now,
        settled,
        options: engine.options(snapshot),
        dashboard: engine.render_dashboard(snapshot, &request.selection),
        statuses: engine.status_counts(snapshot),
        markers: engine.render_markers(snapshot),
        tracking: request
            .track
            .as_ref()
            .and_then(|tag| engine.render_tracking(snapshot, tag, now, resolver)),
    }
}
