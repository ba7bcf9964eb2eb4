// Luggage Telemetry - Aggregation and status engine
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Engine orchestration
//!
//! [`TelemetryEngine`] turns a [`TelemetrySnapshot`] plus a selection and
//! `now` into display-ready views. Every call works on its own resolved copy
//! of the snapshot, so consecutive renders never share state.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregator::{round_to, AggregateResult, Aggregator};
use crate::config::EngineConfig;
use crate::error::{Degradation, Result};
use crate::places::PlaceResolver;
use crate::record::{LocationSample, Tag, TimedRecord};
use crate::relative_time::{describe, describe_stationary_since, RefreshSchedule};
use crate::selection::{apply_selection, selection_options, Selection, SelectionOption};
use crate::snapshot::{ResolvedTelemetry, TelemetrySnapshot};
use crate::status::{DerivedStatus, LuggageStatus, StatusClassifier};
use crate::view::{
    DashboardView, MapMarker, StatusCount, TrackingCard, AVERAGE_TEMPERATURE_TITLE,
    TEMPERATURE_TITLE,
};

/// Alert log a timeline is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Fall,
    Tamper,
}

/// Telemetry engine
#[derive(Debug, Clone)]
pub struct TelemetryEngine {
    config: EngineConfig,
    aggregator: Aggregator,
    classifier: StatusClassifier,
}

impl TelemetryEngine {
    /// Create an engine; the configuration is validated first.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            aggregator: Aggregator::new(config.aggregation.clone()),
            classifier: StatusClassifier::new(config.status.clone()),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub fn classifier(&self) -> &StatusClassifier {
        &self.classifier
    }

    /// Cadence of "last updated" recomputation.
    pub fn refresh_schedule(&self) -> RefreshSchedule {
        RefreshSchedule::from_secs(self.config.refresh.interval_secs)
    }

    /// Selector entries for the current item list.
    pub fn options(&self, snapshot: &TelemetrySnapshot) -> Vec<SelectionOption> {
        selection_options(snapshot.items())
    }

    /// Dashboard metrics for one selection.
    ///
    /// Status, temperature and both alert counts all come from the same
    /// resolved selection. A tag no current item carries renders the zero
    /// state.
    pub fn render_dashboard(
        &self,
        snapshot: &TelemetrySnapshot,
        selection: &Selection,
    ) -> DashboardView {
        let resolved = snapshot.resolve(&self.config.aggregation);
        let view = apply_selection(resolved.items, selection);

        let mut out = DashboardView::empty(selection.clone(), &self.config.status.placeholder);
        out.diagnostics = resolved.degradations.clone();
        if !view.is_known() {
            log::debug!("selection {} matches no current item", selection);
            return out;
        }

        out.status = self.classifier.display(&view);

        let temperatures = self.aggregator.aggregate(&resolved.temperatures, selection);
        out.temperature_series = temperatures.series;

        match selection {
            Selection::All => {
                out.temperature_title = AVERAGE_TEMPERATURE_TITLE.to_string();
                out.temperature = self
                    .aggregator
                    .mean_value(&resolved.temperatures, selection)
                    .map(|mean| round_to(mean, self.config.aggregation.temperature_precision))
                    .unwrap_or(0.0);
            }
            Selection::Tag(_) => {
                out.temperature_title = TEMPERATURE_TITLE.to_string();
                out.temperature = self
                    .aggregator
                    .latest_value(&resolved.temperatures, selection)
                    .unwrap_or(0.0);
            }
        }

        out.fall_count = self.alert_count(&resolved, AlertKind::Fall, selection);
        out.tamper_count = self.alert_count(&resolved, AlertKind::Tamper, selection);
        out
    }

    fn alert_count(
        &self,
        resolved: &ResolvedTelemetry<'_>,
        kind: AlertKind,
        selection: &Selection,
    ) -> usize {
        let (known, orphans) = match kind {
            AlertKind::Fall => (&resolved.falls, &resolved.orphan_falls),
            AlertKind::Tamper => (&resolved.tampers, &resolved.orphan_tampers),
        };
        let count = self.aggregator.aggregate(known, selection).count;
        if selection.is_all() {
            count + orphans.len()
        } else {
            count
        }
    }

    /// Alert counts per `timeline_bucket_secs` bucket (hourly by default).
    ///
    /// Under the `Count` orphan policy, "All" timelines include orphaned
    /// alerts so the timeline total matches the dashboard count.
    pub fn event_timeline(
        &self,
        snapshot: &TelemetrySnapshot,
        kind: AlertKind,
        selection: &Selection,
    ) -> AggregateResult {
        let resolved = snapshot.resolve(&self.config.aggregation);
        if !apply_selection(resolved.items, selection).is_known() {
            return AggregateResult::default();
        }

        let (known, orphans) = match kind {
            AlertKind::Fall => (resolved.falls, resolved.orphan_falls),
            AlertKind::Tamper => (resolved.tampers, resolved.orphan_tampers),
        };
        let mut events = known;
        if selection.is_all() {
            events.extend(orphans);
        }
        self.aggregator.timeline(&events, selection)
    }

    /// Number of items per status, every status present.
    pub fn status_breakdown(&self, snapshot: &TelemetrySnapshot) -> BTreeMap<LuggageStatus, usize> {
        let mut counts: BTreeMap<LuggageStatus, usize> =
            LuggageStatus::ALL.iter().map(|status| (*status, 0)).collect();
        for item in snapshot.items() {
            *counts.entry(item.status).or_insert(0) += 1;
        }
        counts
    }

    /// `status_breakdown` as a list, in status order.
    pub fn status_counts(&self, snapshot: &TelemetrySnapshot) -> Vec<StatusCount> {
        self.status_breakdown(snapshot)
            .into_iter()
            .map(|(status, count)| StatusCount { status, count })
            .collect()
    }

    /// One pin per item with a known position.
    ///
    /// The newest timed location sample wins over the item's stored position.
    pub fn render_markers(&self, snapshot: &TelemetrySnapshot) -> Vec<MapMarker> {
        let resolved = snapshot.resolve(&self.config.aggregation);
        resolved
            .items
            .iter()
            .filter_map(|item| {
                let position = newest_location(&resolved.locations, &item.tag)
                    .map(|s| (s.latitude, s.longitude))
                    .or_else(|| item.position())?;
                Some(MapMarker {
                    tag: item.tag.clone(),
                    name: item.display_name().to_string(),
                    latitude: position.0,
                    longitude: position.1,
                    status: item.status,
                    tone: item.status.tone(),
                })
            })
            .collect()
    }

    /// Detail card for one item, or `None` if no current item has `tag`.
    ///
    /// The place name comes from the newest location sample; when it has
    /// none and a resolver is given, the resolver is asked. A failed lookup
    /// only leaves the place empty.
    pub fn render_tracking(
        &self,
        snapshot: &TelemetrySnapshot,
        tag: &Tag,
        now: DateTime<Utc>,
        resolver: Option<&dyn PlaceResolver>,
    ) -> Option<TrackingCard> {
        let resolved = snapshot.resolve(&self.config.aggregation);
        let item = resolved.items.iter().find(|item| &item.tag == tag)?;
        let newest = newest_location(&resolved.locations, tag);
        let mut diagnostics = Vec::new();

        let place_name = match (newest, resolver) {
            (Some(sample), _) if sample.place_name.is_some() => sample.place_name.clone(),
            (Some(sample), Some(resolver)) => {
                match resolver.resolve(sample.latitude, sample.longitude) {
                    Ok(name) => Some(name),
                    Err(e) => {
                        let degradation = Degradation::PlaceUnresolved {
                            tag: tag.to_string(),
                            reason: e.to_string(),
                        };
                        degradation.log();
                        diagnostics.push(degradation);
                        None
                    }
                }
            }
            _ => None,
        };

        let position = newest
            .map(|s| (s.latitude, s.longitude))
            .or_else(|| item.position());

        let updated_at = item
            .updated_at
            .or_else(|| newest.and_then(|s| s.timestamp()))
            .or(item.last_moved);

        let stationary_since = if item.status == LuggageStatus::Stationary {
            item.last_moved
                .or_else(|| self.history_last_moved(&resolved, tag, now))
                .map(|moved| describe_stationary_since(moved, now, self.config.display.offset()))
        } else {
            None
        };

        Some(TrackingCard {
            tag: item.tag.clone(),
            name: item.display_name().to_string(),
            place_name,
            destination: item.destination.clone(),
            latitude: position.map(|p| p.0),
            longitude: position.map(|p| p.1),
            updated_at,
            last_updated: updated_at.map(|ts| describe(ts, now)),
            status: item.status,
            tone: item.status.tone(),
            stationary_since,
            diagnostics,
        })
    }

    /// Status derived from the item's location history, for collaborators
    /// that leave classification to the engine.
    ///
    /// `base` defaults to the item's stored position.
    pub fn derive_status(
        &self,
        snapshot: &TelemetrySnapshot,
        tag: &Tag,
        base: Option<(f64, f64)>,
        now: DateTime<Utc>,
    ) -> Option<DerivedStatus> {
        let resolved = snapshot.resolve(&self.config.aggregation);
        let item = resolved.items.iter().find(|item| &item.tag == tag)?;
        let history = history_of(&resolved, tag);
        Some(
            self.classifier
                .derive(&history, base.or_else(|| item.position()), now),
        )
    }

    fn history_last_moved(
        &self,
        resolved: &ResolvedTelemetry<'_>,
        tag: &Tag,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        let history = history_of(resolved, tag);
        self.classifier.derive(&history, None, now).last_moved
    }
}

impl Default for TelemetryEngine {
    fn default() -> Self {
        let config = EngineConfig::default();
        Self {
            aggregator: Aggregator::new(config.aggregation.clone()),
            classifier: StatusClassifier::new(config.status.clone()),
            config,
        }
    }
}

fn newest_location<'a>(locations: &[&'a LocationSample], tag: &Tag) -> Option<&'a LocationSample> {
    locations
        .iter()
        .copied()
        .filter(|s| &s.tag == tag)
        .filter_map(|s| Some((s.timestamp()?, s)))
        .max_by_key(|(ts, _)| *ts)
        .map(|(_, s)| s)
}

fn history_of(resolved: &ResolvedTelemetry<'_>, tag: &Tag) -> Vec<LocationSample> {
    resolved
        .locations
        .iter()
        .filter(|s| &s.tag == tag)
        .map(|s| (*s).clone())
        .collect()
}
