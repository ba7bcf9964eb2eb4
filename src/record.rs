// Luggage Telemetry - Aggregation and status engine
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Data model and wire shapes
//!
//! The sample store hands the engine one JSON array per record type. Each
//! `Wire*` struct mirrors one of those shapes and converts into its domain
//! type without failing: a timestamp that does not parse becomes `None`, and
//! a status outside the closed set becomes [`LuggageStatus::Unknown`]. Both
//! are reported as [`Degradation`]s.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Degradation, Result};
use crate::snapshot::SourceKind;
use crate::status::LuggageStatus;

/// Unique identifier correlating every sample and event to one luggage item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(String);

impl Tag {
    /// Create a tag, trimming surrounding whitespace.
    pub fn new(tag: impl AsRef<str>) -> Self {
        Self(tag.as_ref().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Tag {
    fn from(tag: &str) -> Self {
        Tag::new(tag)
    }
}

impl From<String> for Tag {
    fn from(tag: String) -> Self {
        Tag::new(tag)
    }
}

/// A record carrying a luggage tag and a timestamp.
///
/// This is the only view of a record the aggregator needs.
pub trait TimedRecord {
    fn tag(&self) -> &Tag;

    /// `None` when the source timestamp was malformed.
    fn timestamp(&self) -> Option<DateTime<Utc>>;

    /// Numeric payload, if the record type has one.
    fn value(&self) -> Option<f64> {
        None
    }
}

impl<T: TimedRecord + ?Sized> TimedRecord for &T {
    fn tag(&self) -> &Tag {
        (**self).tag()
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        (**self).timestamp()
    }

    fn value(&self) -> Option<f64> {
        (**self).value()
    }
}

/// A registered luggage item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LuggageItem {
    pub tag: Tag,
    pub custom_name: String,
    pub destination: String,
    pub status: LuggageStatus,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub last_moved: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub user_id: Option<String>,
}

impl LuggageItem {
    /// Create a freshly registered item (status `Unknown`, no position yet).
    pub fn new(tag: impl Into<Tag>, custom_name: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            custom_name: custom_name.into(),
            destination: String::new(),
            status: LuggageStatus::Unknown,
            latitude: None,
            longitude: None,
            last_moved: None,
            updated_at: None,
            user_id: None,
        }
    }

    /// Builder: set destination.
    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = destination.into();
        self
    }

    /// Builder: set status.
    pub fn with_status(mut self, status: LuggageStatus) -> Self {
        self.status = status;
        self
    }

    /// Builder: set last known position.
    pub fn with_position(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    /// Builder: set last-moved timestamp.
    pub fn with_last_moved(mut self, last_moved: DateTime<Utc>) -> Self {
        self.last_moved = Some(last_moved);
        self
    }

    /// Builder: set last-updated timestamp.
    pub fn with_updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = Some(updated_at);
        self
    }

    /// Builder: set owning user reference.
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Name shown in selectors; falls back to the tag.
    pub fn display_name(&self) -> &str {
        if self.custom_name.trim().is_empty() {
            self.tag.as_str()
        } else {
            &self.custom_name
        }
    }

    pub fn position(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

/// A location ping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    pub tag: Tag,
    pub timestamp: Option<DateTime<Utc>>,
    pub latitude: f64,
    pub longitude: f64,
    /// Human-readable place, filled in asynchronously when available.
    pub place_name: Option<String>,
}

impl LocationSample {
    pub fn new(tag: impl Into<Tag>, timestamp: DateTime<Utc>, latitude: f64, longitude: f64) -> Self {
        Self {
            tag: tag.into(),
            timestamp: Some(timestamp),
            latitude,
            longitude,
            place_name: None,
        }
    }
}

impl TimedRecord for LocationSample {
    fn tag(&self) -> &Tag {
        &self.tag
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }
}

/// A fall-detection or tamper alert. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub tag: Tag,
    pub timestamp: Option<DateTime<Utc>>,
    pub severity: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

pub type FallEvent = AlertEvent;
pub type TamperEvent = AlertEvent;

impl AlertEvent {
    pub fn new(tag: impl Into<Tag>, timestamp: DateTime<Utc>) -> Self {
        Self {
            tag: tag.into(),
            timestamp: Some(timestamp),
            severity: None,
            metadata: None,
        }
    }

    /// Builder: set severity.
    pub fn with_severity(mut self, severity: impl Into<String>) -> Self {
        self.severity = Some(severity.into());
        self
    }
}

impl TimedRecord for AlertEvent {
    fn tag(&self) -> &Tag {
        &self.tag
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }
}

/// A temperature reading in °C.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureSample {
    pub tag: Tag,
    pub timestamp: Option<DateTime<Utc>>,
    pub temperature: Option<f64>,
}

impl TemperatureSample {
    pub fn new(tag: impl Into<Tag>, timestamp: DateTime<Utc>, temperature: f64) -> Self {
        Self {
            tag: tag.into(),
            timestamp: Some(timestamp),
            temperature: Some(temperature),
        }
    }
}

impl TimedRecord for TemperatureSample {
    fn tag(&self) -> &Tag {
        &self.tag
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    fn value(&self) -> Option<f64> {
        self.temperature.filter(|t| t.is_finite())
    }
}

/// Parse a wire timestamp.
///
/// Accepts RFC 3339 (`2024-03-01T10:15:00Z`, with or without offset),
/// naive ISO-8601 read as UTC, and integer epoch milliseconds.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    raw.parse::<i64>()
        .ok()
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
}

/// Timestamp as it appears on the wire: text or epoch milliseconds.
///
/// Any other JSON shape (`null`, a float, an object) lands in `Raw` and reads
/// as malformed, so one bad value never fails the whole array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireTimestamp {
    Millis(i64),
    Text(String),
    Raw(serde_json::Value),
}

impl Default for WireTimestamp {
    fn default() -> Self {
        WireTimestamp::Text(String::new())
    }
}

impl WireTimestamp {
    pub fn parse(&self) -> Option<DateTime<Utc>> {
        match self {
            WireTimestamp::Millis(ms) => Utc.timestamp_millis_opt(*ms).single(),
            WireTimestamp::Text(text) => parse_timestamp(text),
            WireTimestamp::Raw(_) => None,
        }
    }

    fn raw(&self) -> String {
        match self {
            WireTimestamp::Millis(ms) => ms.to_string(),
            WireTimestamp::Text(text) => text.clone(),
            WireTimestamp::Raw(value) => value.to_string(),
        }
    }
}

impl From<DateTime<Utc>> for WireTimestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        WireTimestamp::Text(dt.to_rfc3339())
    }
}

fn timestamp_or_degrade(
    raw: &WireTimestamp,
    source: SourceKind,
    tag: &Tag,
    degradations: &mut Vec<Degradation>,
) -> Option<DateTime<Utc>> {
    let parsed = raw.parse();
    if parsed.is_none() {
        degradations.push(Degradation::MalformedTimestamp {
            source,
            tag: tag.to_string(),
            value: raw.raw(),
        });
    }
    parsed
}

/// A wire shape that converts into a domain record.
pub trait WireRecord: DeserializeOwned {
    type Record;

    /// The source this shape is fetched from.
    const SOURCE: SourceKind;

    /// Convert, pushing any degradation found along the way.
    fn into_record(self, degradations: &mut Vec<Degradation>) -> Self::Record;
}

/// Decode one source's JSON array into domain records.
///
/// Only a structurally invalid payload is an error; bad field values degrade.
pub fn decode_source<W: WireRecord>(json: &str) -> Result<(Vec<W::Record>, Vec<Degradation>)> {
    let wire: Vec<W> = serde_json::from_str(json)?;
    Ok(convert_wire(wire))
}

/// Convert already-deserialized wire records.
pub fn convert_wire<W: WireRecord>(wire: Vec<W>) -> (Vec<W::Record>, Vec<Degradation>) {
    let mut degradations = Vec::new();
    let records = wire
        .into_iter()
        .map(|w| w.into_record(&mut degradations))
        .collect();
    (records, degradations)
}

/// Luggage item as served by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireLuggage {
    #[serde(rename = "luggage_tag_number", alias = "tag")]
    pub tag: String,
    #[serde(rename = "luggage_custom_name", alias = "custom_name", default)]
    pub custom_name: String,
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(rename = "lastMoved", alias = "last_moved", default)]
    pub last_moved: Option<WireTimestamp>,
    #[serde(rename = "updatedAt", alias = "updated_at", default)]
    pub updated_at: Option<WireTimestamp>,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl WireRecord for WireLuggage {
    type Record = LuggageItem;
    const SOURCE: SourceKind = SourceKind::Luggage;

    fn into_record(self, degradations: &mut Vec<Degradation>) -> LuggageItem {
        let tag = Tag::new(&self.tag);

        let status = match self.status.as_deref() {
            None => LuggageStatus::Unknown,
            Some(raw) => {
                let (status, degradation) = LuggageStatus::parse_lenient(raw);
                if let Some(Degradation::UnknownStatusValue { value, .. }) = degradation {
                    degradations.push(Degradation::UnknownStatusValue {
                        tag: Some(tag.to_string()),
                        value,
                    });
                }
                status
            }
        };

        let last_moved = self
            .last_moved
            .as_ref()
            .and_then(|raw| timestamp_or_degrade(raw, Self::SOURCE, &tag, degradations));
        let updated_at = self
            .updated_at
            .as_ref()
            .and_then(|raw| timestamp_or_degrade(raw, Self::SOURCE, &tag, degradations));

        LuggageItem {
            tag,
            custom_name: self.custom_name,
            destination: self.destination,
            status,
            latitude: self.latitude.filter(|v| v.is_finite()),
            longitude: self.longitude.filter(|v| v.is_finite()),
            last_moved,
            updated_at,
            user_id: self.user_id,
        }
    }
}

impl From<&LuggageItem> for WireLuggage {
    fn from(item: &LuggageItem) -> Self {
        Self {
            tag: item.tag.to_string(),
            custom_name: item.custom_name.clone(),
            destination: item.destination.clone(),
            status: Some(item.status.as_str().to_string()),
            latitude: item.latitude,
            longitude: item.longitude,
            last_moved: item.last_moved.map(WireTimestamp::from),
            updated_at: item.updated_at.map(WireTimestamp::from),
            user_id: item.user_id.clone(),
        }
    }
}

/// Location ping as served by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireLocation {
    #[serde(rename = "luggage_tag_number", alias = "tag")]
    pub tag: String,
    #[serde(alias = "timeStamp", default)]
    pub timestamp: WireTimestamp,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(alias = "currentLocation", default, skip_serializing_if = "Option::is_none")]
    pub place_name: Option<String>,
}

impl WireRecord for WireLocation {
    type Record = LocationSample;
    const SOURCE: SourceKind = SourceKind::Location;

    fn into_record(self, degradations: &mut Vec<Degradation>) -> LocationSample {
        let tag = Tag::new(&self.tag);
        let timestamp = timestamp_or_degrade(&self.timestamp, Self::SOURCE, &tag, degradations);
        LocationSample {
            tag,
            timestamp,
            latitude: self.latitude,
            longitude: self.longitude,
            place_name: self.place_name.filter(|p| !p.trim().is_empty()),
        }
    }
}

impl From<&LocationSample> for WireLocation {
    fn from(sample: &LocationSample) -> Self {
        Self {
            tag: sample.tag.to_string(),
            timestamp: sample.timestamp.map(WireTimestamp::from).unwrap_or_default(),
            latitude: sample.latitude,
            longitude: sample.longitude,
            place_name: sample.place_name.clone(),
        }
    }
}

/// Fall or tamper alert as served by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireAlert {
    #[serde(rename = "luggage_tag_number", alias = "tag")]
    pub tag: String,
    #[serde(alias = "timeStamp", default)]
    pub timestamp: WireTimestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl WireAlert {
    fn into_alert(
        self,
        source: SourceKind,
        degradations: &mut Vec<Degradation>,
    ) -> AlertEvent {
        let tag = Tag::new(&self.tag);
        let timestamp = timestamp_or_degrade(&self.timestamp, source, &tag, degradations);
        AlertEvent {
            tag,
            timestamp,
            severity: self.severity,
            metadata: self.metadata,
        }
    }
}

impl From<&AlertEvent> for WireAlert {
    fn from(event: &AlertEvent) -> Self {
        Self {
            tag: event.tag.to_string(),
            timestamp: event.timestamp.map(WireTimestamp::from).unwrap_or_default(),
            severity: event.severity.clone(),
            metadata: event.metadata.clone(),
        }
    }
}

/// Fall log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WireFall(pub WireAlert);

impl WireRecord for WireFall {
    type Record = FallEvent;
    const SOURCE: SourceKind = SourceKind::Fall;

    fn into_record(self, degradations: &mut Vec<Degradation>) -> FallEvent {
        self.0.into_alert(Self::SOURCE, degradations)
    }
}

/// Tamper log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WireTamper(pub WireAlert);

impl WireRecord for WireTamper {
    type Record = TamperEvent;
    const SOURCE: SourceKind = SourceKind::Tamper;

    fn into_record(self, degradations: &mut Vec<Degradation>) -> TamperEvent {
        self.0.into_alert(Self::SOURCE, degradations)
    }
}

/// Temperature log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireTemperature {
    #[serde(rename = "luggage_tag_number", alias = "tag")]
    pub tag: String,
    #[serde(alias = "timeStamp", default)]
    pub timestamp: WireTimestamp,
    #[serde(default)]
    pub temperature: Option<f64>,
}

impl WireRecord for WireTemperature {
    type Record = TemperatureSample;
    const SOURCE: SourceKind = SourceKind::Temperature;

    fn into_record(self, degradations: &mut Vec<Degradation>) -> TemperatureSample {
        let tag = Tag::new(&self.tag);
        let timestamp = timestamp_or_degrade(&self.timestamp, Self::SOURCE, &tag, degradations);
        TemperatureSample {
            tag,
            timestamp,
            temperature: self.temperature,
        }
    }
}

impl From<&TemperatureSample> for WireTemperature {
    fn from(sample: &TemperatureSample) -> Self {
        Self {
            tag: sample.tag.to_string(),
            timestamp: sample.timestamp.map(WireTimestamp::from).unwrap_or_default(),
            temperature: sample.temperature,
        }
    }
}
