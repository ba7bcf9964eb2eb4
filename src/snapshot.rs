// Luggage Telemetry - Aggregation and status engine
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Per-source snapshots and merge
//!
//! Each source is fetched independently and may land in any order, or fail.
//! A fetch outcome replaces exactly one source's state in the
//! [`TelemetryStore`]; render passes work on an immutable
//! [`TelemetrySnapshot`] taken from it. Pending and failed sources read as
//! empty.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::{AggregationConfig, OrphanPolicy};
use crate::error::Degradation;
use crate::record::{
    decode_source, FallEvent, LocationSample, LuggageItem, Tag, TamperEvent, TemperatureSample,
    TimedRecord, WireFall, WireLocation, WireLuggage, WireRecord, WireTamper, WireTemperature,
};

/// The independent data sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Luggage,
    Location,
    Fall,
    Tamper,
    Temperature,
}

impl SourceKind {
    pub const ALL: [SourceKind; 5] = [
        SourceKind::Luggage,
        SourceKind::Location,
        SourceKind::Fall,
        SourceKind::Tamper,
        SourceKind::Temperature,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Luggage => "luggage",
            SourceKind::Location => "location",
            SourceKind::Fall => "fall",
            SourceKind::Tamper => "tamper",
            SourceKind::Temperature => "temperature",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Records of one successful fetch plus what was degraded while decoding them.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceData<T> {
    pub records: Vec<T>,
    pub degradations: Vec<Degradation>,
}

impl<T> SourceData<T> {
    pub fn new(records: Vec<T>, degradations: Vec<Degradation>) -> Self {
        Self {
            records,
            degradations,
        }
    }
}

impl<T> From<Vec<T>> for SourceData<T> {
    fn from(records: Vec<T>) -> Self {
        Self::new(records, Vec::new())
    }
}

/// Latest known state of one source.
#[derive(Debug)]
pub enum SourceState<T> {
    /// Not returned yet
    Pending,
    /// Last fetch succeeded
    Ready(Arc<SourceData<T>>),
    /// Last fetch failed
    Failed(String),
}

impl<T> Clone for SourceState<T> {
    fn clone(&self) -> Self {
        match self {
            SourceState::Pending => SourceState::Pending,
            SourceState::Ready(data) => SourceState::Ready(Arc::clone(data)),
            SourceState::Failed(reason) => SourceState::Failed(reason.clone()),
        }
    }
}

impl<T> Default for SourceState<T> {
    fn default() -> Self {
        SourceState::Pending
    }
}

impl<T> SourceState<T> {
    fn from_fetch(fetch: Fetch<T>) -> Self {
        match fetch {
            Ok(data) => SourceState::Ready(Arc::new(data)),
            Err(reason) => SourceState::Failed(reason),
        }
    }

    /// Records, empty unless ready.
    pub fn records(&self) -> &[T] {
        match self {
            SourceState::Ready(data) => &data.records,
            _ => &[],
        }
    }

    pub fn degradations(&self) -> &[Degradation] {
        match self {
            SourceState::Ready(data) => &data.degradations,
            _ => &[],
        }
    }

    /// Ready or failed.
    pub fn is_settled(&self) -> bool {
        !matches!(self, SourceState::Pending)
    }

    fn missing(&self, source: SourceKind) -> Option<Degradation> {
        match self {
            SourceState::Ready(_) => None,
            SourceState::Pending => Some(Degradation::MissingSource {
                source,
                reason: None,
            }),
            SourceState::Failed(reason) => Some(Degradation::MissingSource {
                source,
                reason: Some(reason.clone()),
            }),
        }
    }
}

/// Outcome of one fetch; the error is a human-readable reason.
pub type Fetch<T> = std::result::Result<SourceData<T>, String>;

/// One fetch outcome, for exactly one source.
#[derive(Debug, Clone)]
pub enum SourceUpdate {
    Luggage(Fetch<LuggageItem>),
    Location(Fetch<LocationSample>),
    Fall(Fetch<FallEvent>),
    Tamper(Fetch<TamperEvent>),
    Temperature(Fetch<TemperatureSample>),
}

fn decode_fetch<W: WireRecord>(json: &str) -> Fetch<W::Record> {
    decode_source::<W>(json)
        .map(|(records, degradations)| SourceData::new(records, degradations))
        .map_err(|e| e.to_string())
}

impl SourceUpdate {
    pub fn kind(&self) -> SourceKind {
        match self {
            SourceUpdate::Luggage(_) => SourceKind::Luggage,
            SourceUpdate::Location(_) => SourceKind::Location,
            SourceUpdate::Fall(_) => SourceKind::Fall,
            SourceUpdate::Tamper(_) => SourceKind::Tamper,
            SourceUpdate::Temperature(_) => SourceKind::Temperature,
        }
    }

    /// A failed fetch for `kind`.
    pub fn failed(kind: SourceKind, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        match kind {
            SourceKind::Luggage => SourceUpdate::Luggage(Err(reason)),
            SourceKind::Location => SourceUpdate::Location(Err(reason)),
            SourceKind::Fall => SourceUpdate::Fall(Err(reason)),
            SourceKind::Tamper => SourceUpdate::Tamper(Err(reason)),
            SourceKind::Temperature => SourceUpdate::Temperature(Err(reason)),
        }
    }

    /// Decode a store JSON array for `kind`. A payload that does not decode
    /// becomes a failed fetch.
    pub fn from_json(kind: SourceKind, json: &str) -> Self {
        match kind {
            SourceKind::Luggage => SourceUpdate::Luggage(decode_fetch::<WireLuggage>(json)),
            SourceKind::Location => SourceUpdate::Location(decode_fetch::<WireLocation>(json)),
            SourceKind::Fall => SourceUpdate::Fall(decode_fetch::<WireFall>(json)),
            SourceKind::Tamper => SourceUpdate::Tamper(decode_fetch::<WireTamper>(json)),
            SourceKind::Temperature => {
                SourceUpdate::Temperature(decode_fetch::<WireTemperature>(json))
            }
        }
    }

    pub fn is_ok(&self) -> bool {
        match self {
            SourceUpdate::Luggage(f) => f.is_ok(),
            SourceUpdate::Location(f) => f.is_ok(),
            SourceUpdate::Fall(f) => f.is_ok(),
            SourceUpdate::Tamper(f) => f.is_ok(),
            SourceUpdate::Temperature(f) => f.is_ok(),
        }
    }
}

/// Latest state of every source. The only mutable piece of the engine.
#[derive(Debug, Clone, Default)]
pub struct TelemetryStore {
    current: TelemetrySnapshot,
    updates: u64,
}

impl TelemetryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace one source's state with a fetch outcome.
    pub fn apply(&mut self, update: SourceUpdate) -> SourceKind {
        let kind = update.kind();
        let snap = &mut self.current;
        match update {
            SourceUpdate::Luggage(f) => snap.luggage = SourceState::from_fetch(f),
            SourceUpdate::Location(f) => snap.locations = SourceState::from_fetch(f),
            SourceUpdate::Fall(f) => snap.falls = SourceState::from_fetch(f),
            SourceUpdate::Tamper(f) => snap.tampers = SourceState::from_fetch(f),
            SourceUpdate::Temperature(f) => snap.temperatures = SourceState::from_fetch(f),
        }
        self.updates += 1;
        for degradation in self.current.degradations_of(kind) {
            degradation.log();
        }
        log::debug!("applied {} update #{}", kind, self.updates);
        kind
    }

    /// Immutable view of the latest state.
    pub fn snapshot(&self) -> TelemetrySnapshot {
        self.current.clone()
    }

    /// Number of updates applied so far.
    pub fn update_count(&self) -> u64 {
        self.updates
    }

    /// Every source has either returned or failed.
    pub fn all_settled(&self) -> bool {
        self.current.settled_sources().len() == SourceKind::ALL.len()
    }
}

/// Immutable state of every source at one point in time.
#[derive(Debug, Clone, Default)]
pub struct TelemetrySnapshot {
    luggage: SourceState<LuggageItem>,
    locations: SourceState<LocationSample>,
    falls: SourceState<FallEvent>,
    tampers: SourceState<TamperEvent>,
    temperatures: SourceState<TemperatureSample>,
}

impl TelemetrySnapshot {
    /// Snapshot with every source ready.
    pub fn from_parts(
        items: Vec<LuggageItem>,
        locations: Vec<LocationSample>,
        falls: Vec<FallEvent>,
        tampers: Vec<TamperEvent>,
        temperatures: Vec<TemperatureSample>,
    ) -> Self {
        Self {
            luggage: SourceState::Ready(Arc::new(items.into())),
            locations: SourceState::Ready(Arc::new(locations.into())),
            falls: SourceState::Ready(Arc::new(falls.into())),
            tampers: SourceState::Ready(Arc::new(tampers.into())),
            temperatures: SourceState::Ready(Arc::new(temperatures.into())),
        }
    }

    pub fn items(&self) -> &[LuggageItem] {
        self.luggage.records()
    }

    pub fn locations(&self) -> &[LocationSample] {
        self.locations.records()
    }

    pub fn falls(&self) -> &[FallEvent] {
        self.falls.records()
    }

    pub fn tampers(&self) -> &[TamperEvent] {
        self.tampers.records()
    }

    pub fn temperatures(&self) -> &[TemperatureSample] {
        self.temperatures.records()
    }

    /// Sources that have returned or failed.
    pub fn settled_sources(&self) -> Vec<SourceKind> {
        let states = [
            (SourceKind::Luggage, self.luggage.is_settled()),
            (SourceKind::Location, self.locations.is_settled()),
            (SourceKind::Fall, self.falls.is_settled()),
            (SourceKind::Tamper, self.tampers.is_settled()),
            (SourceKind::Temperature, self.temperatures.is_settled()),
        ];
        states
            .into_iter()
            .filter(|(_, settled)| *settled)
            .map(|(kind, _)| kind)
            .collect()
    }

    /// One `MissingSource` per pending or failed source.
    pub fn missing_sources(&self) -> Vec<Degradation> {
        [
            self.luggage.missing(SourceKind::Luggage),
            self.locations.missing(SourceKind::Location),
            self.falls.missing(SourceKind::Fall),
            self.tampers.missing(SourceKind::Tamper),
            self.temperatures.missing(SourceKind::Temperature),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn degradations_of(&self, kind: SourceKind) -> &[Degradation] {
        match kind {
            SourceKind::Luggage => self.luggage.degradations(),
            SourceKind::Location => self.locations.degradations(),
            SourceKind::Fall => self.falls.degradations(),
            SourceKind::Tamper => self.tampers.degradations(),
            SourceKind::Temperature => self.temperatures.degradations(),
        }
    }

    /// Degradations recorded while decoding the ready sources.
    pub fn ingest_degradations(&self) -> Vec<Degradation> {
        let mut out = Vec::new();
        out.extend_from_slice(self.luggage.degradations());
        out.extend_from_slice(self.locations.degradations());
        out.extend_from_slice(self.falls.degradations());
        out.extend_from_slice(self.tampers.degradations());
        out.extend_from_slice(self.temperatures.degradations());
        out
    }

    /// Split every source into records of known items and orphans.
    ///
    /// Valid tags are re-derived from the current item list on every call.
    /// Until the luggage source is ready every record is an orphan; those are
    /// dropped without `UnresolvedReference` noise, since `MissingSource`
    /// already covers it.
    pub fn resolve(&self, config: &AggregationConfig) -> ResolvedTelemetry<'_> {
        let known: HashSet<&Tag> = self.items().iter().map(|item| &item.tag).collect();
        let mut degradations = self.missing_sources();
        degradations.extend(self.ingest_degradations());

        let mut unresolved = Vec::new();
        let (locations, _) = partition(self.locations(), &known, SourceKind::Location, &mut unresolved);
        let (falls, orphan_falls) = partition(self.falls(), &known, SourceKind::Fall, &mut unresolved);
        let (tampers, orphan_tampers) =
            partition(self.tampers(), &known, SourceKind::Tamper, &mut unresolved);
        let (temperatures, _) = partition(
            self.temperatures(),
            &known,
            SourceKind::Temperature,
            &mut unresolved,
        );
        if matches!(self.luggage, SourceState::Ready(_)) {
            degradations.extend(unresolved);
        }

        let (orphan_falls, orphan_tampers) = match config.orphan_policy {
            OrphanPolicy::Drop => (Vec::new(), Vec::new()),
            OrphanPolicy::Count => (orphan_falls, orphan_tampers),
        };

        ResolvedTelemetry {
            items: self.items(),
            locations,
            falls,
            tampers,
            temperatures,
            orphan_falls,
            orphan_tampers,
            degradations,
        }
    }
}

fn partition<'a, T: TimedRecord>(
    records: &'a [T],
    known: &HashSet<&Tag>,
    source: SourceKind,
    degradations: &mut Vec<Degradation>,
) -> (Vec<&'a T>, Vec<&'a T>) {
    let mut kept = Vec::with_capacity(records.len());
    let mut orphans = Vec::new();
    let mut orphan_tags: BTreeMap<&Tag, usize> = BTreeMap::new();

    for record in records {
        if known.contains(record.tag()) {
            kept.push(record);
        } else {
            *orphan_tags.entry(record.tag()).or_insert(0) += 1;
            orphans.push(record);
        }
    }

    degradations.extend(orphan_tags.into_iter().map(|(tag, records)| {
        Degradation::UnresolvedReference {
            source,
            tag: tag.to_string(),
            records,
        }
    }));
    (kept, orphans)
}

/// A snapshot split by tag validity, ready for aggregation.
#[derive(Debug, Clone)]
pub struct ResolvedTelemetry<'a> {
    pub items: &'a [LuggageItem],
    /// Records of known items only.
    pub locations: Vec<&'a LocationSample>,
    pub falls: Vec<&'a FallEvent>,
    pub tampers: Vec<&'a TamperEvent>,
    pub temperatures: Vec<&'a TemperatureSample>,
    /// Orphaned alerts still counted in "All" totals; empty under `Drop`.
    pub orphan_falls: Vec<&'a FallEvent>,
    pub orphan_tampers: Vec<&'a TamperEvent>,
    /// Missing sources, ingest problems and unresolved references.
    pub degradations: Vec<Degradation>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::AlertEvent;
    use chrono::{TimeZone, Utc};

    fn ts() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_source_kind_serde() {
        assert_eq!(serde_json::to_string(&SourceKind::Temperature).unwrap(), "\"temperature\"");
        assert_eq!(SourceKind::Fall.to_string(), "fall");
    }

    #[test]
    fn test_empty_store_reads_as_empty() {
        let store = TelemetryStore::new();
        let snap = store.snapshot();
        assert!(snap.items().is_empty());
        assert!(snap.temperatures().is_empty());
        assert_eq!(snap.missing_sources().len(), 5);
        assert!(!store.all_settled());
    }

    #[test]
    fn test_apply_replaces_one_source() {
        let mut store = TelemetryStore::new();
        store.apply(SourceUpdate::Temperature(Ok(vec![TemperatureSample::new("T1", ts(), 20.0)].into())));
        let first = store.snapshot();

        store.apply(SourceUpdate::Fall(Ok(vec![AlertEvent::new("T1", ts())].into())));
        let second = store.snapshot();

        // Earlier snapshots are unaffected by later updates
        assert!(first.falls().is_empty());
        assert_eq!(second.falls().len(), 1);
        assert_eq!(second.temperatures().len(), 1);
        assert_eq!(store.update_count(), 2);
    }

    #[test]
    fn test_failed_fetch_is_empty_until_next_success() {
        let mut store = TelemetryStore::new();
        store.apply(SourceUpdate::Fall(Ok(vec![AlertEvent::new("T1", ts())].into())));
        store.apply(SourceUpdate::failed(SourceKind::Fall, "timeout"));

        let snap = store.snapshot();
        assert!(snap.falls().is_empty());
        assert!(snap.missing_sources().contains(&Degradation::MissingSource {
            source: SourceKind::Fall,
            reason: Some("timeout".to_string()),
        }));

        store.apply(SourceUpdate::Fall(Ok(vec![AlertEvent::new("T1", ts())].into())));
        assert_eq!(store.snapshot().falls().len(), 1);
    }

    #[test]
    fn test_all_settled() {
        let mut store = TelemetryStore::new();
        for kind in SourceKind::ALL {
            assert!(!store.all_settled());
            store.apply(SourceUpdate::failed(kind, "offline"));
        }
        assert!(store.all_settled());
    }

    #[test]
    fn test_from_json_decodes_and_degrades() {
        let update = SourceUpdate::from_json(
            SourceKind::Luggage,
            r#"[{"tag": "T1", "status": "Corrupted"}]"#,
        );
        assert!(update.is_ok());
        let mut store = TelemetryStore::new();
        store.apply(update);
        let snap = store.snapshot();
        assert_eq!(snap.items().len(), 1);
        assert_eq!(snap.ingest_degradations().len(), 1);

        let update = SourceUpdate::from_json(SourceKind::Fall, "not json");
        assert!(!update.is_ok());
        assert_eq!(update.kind(), SourceKind::Fall);
    }

    #[test]
    fn test_from_json_keeps_source_with_null_timestamp() {
        let update = SourceUpdate::from_json(
            SourceKind::Fall,
            r#"[{"tag": "T1", "timestamp": "2024-03-01T10:00:00Z"}, {"tag": "T1", "timestamp": null}]"#,
        );
        assert!(update.is_ok());

        let mut store = TelemetryStore::new();
        store.apply(update);
        let snap = store.snapshot();
        assert_eq!(snap.falls().len(), 2);
        assert_eq!(snap.ingest_degradations().len(), 1);
        assert!(!snap.missing_sources().iter().any(|d| matches!(
            d,
            Degradation::MissingSource { source: SourceKind::Fall, .. }
        )));
    }

    #[test]
    fn test_resolve_drops_orphans() {
        let snap = TelemetrySnapshot::from_parts(
            vec![LuggageItem::new("T1", "Blue")],
            vec![LocationSample::new("GONE", ts(), 0.0, 0.0)],
            vec![AlertEvent::new("T1", ts()), AlertEvent::new("GONE", ts()), AlertEvent::new("GONE", ts())],
            vec![],
            vec![TemperatureSample::new("GONE", ts(), 40.0)],
        );

        let resolved = snap.resolve(&AggregationConfig::default());
        assert_eq!(resolved.falls.len(), 1);
        assert!(resolved.orphan_falls.is_empty());
        assert!(resolved.locations.is_empty());
        assert!(resolved.temperatures.is_empty());
        assert!(resolved.degradations.contains(&Degradation::UnresolvedReference {
            source: SourceKind::Fall,
            tag: "GONE".to_string(),
            records: 2,
        }));
    }

    #[test]
    fn test_resolve_without_luggage_skips_unresolved_references() {
        let mut store = TelemetryStore::new();
        store.apply(SourceUpdate::failed(SourceKind::Luggage, "offline"));
        store.apply(SourceUpdate::Fall(Ok(vec![AlertEvent::new("T1", ts())].into())));
        store.apply(SourceUpdate::Temperature(Ok(vec![TemperatureSample::new("T1", ts(), 20.0)].into())));

        let snapshot = store.snapshot();
        let resolved = snapshot.resolve(&AggregationConfig::default());
        assert!(resolved.falls.is_empty());
        assert!(resolved.temperatures.is_empty());
        assert!(resolved.degradations.contains(&Degradation::MissingSource {
            source: SourceKind::Luggage,
            reason: Some("offline".to_string()),
        }));
        assert!(!resolved
            .degradations
            .iter()
            .any(|d| matches!(d, Degradation::UnresolvedReference { .. })));
    }

    #[test]
    fn test_resolve_count_policy_keeps_orphan_alerts() {
        let snap = TelemetrySnapshot::from_parts(
            vec![LuggageItem::new("T1", "Blue")],
            vec![],
            vec![AlertEvent::new("GONE", ts())],
            vec![AlertEvent::new("GONE", ts())],
            vec![TemperatureSample::new("GONE", ts(), 40.0)],
        );
        let config = AggregationConfig {
            orphan_policy: OrphanPolicy::Count,
            ..Default::default()
        };

        let resolved = snap.resolve(&config);
        assert!(resolved.falls.is_empty());
        assert_eq!(resolved.orphan_falls.len(), 1);
        assert_eq!(resolved.orphan_tampers.len(), 1);
        assert!(resolved.temperatures.is_empty());
    }
}
