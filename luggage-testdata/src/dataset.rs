// Luggage Testdata - Dataset structures
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Fleet dataset and directory I/O.
//!
//! A dataset directory holds one JSON array per source, in the sample
//! store's wire shapes, plus a `manifest.json` describing how it was made.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use luggage_telemetry::record::{
    decode_source, WireAlert, WireFall, WireLocation, WireLuggage, WireRecord, WireTamper,
    WireTemperature,
};
use luggage_telemetry::{
    AlertEvent, Degradation, LocationSample, LuggageItem, SourceKind, SourceUpdate,
    TelemetrySnapshot, TemperatureSample,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Dataset error types.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Decode error in {file}: {message}")]
    Decode { file: String, message: String },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// File name of a source inside a dataset directory.
pub fn source_file(kind: SourceKind) -> &'static str {
    match kind {
        SourceKind::Luggage => "luggage.json",
        SourceKind::Location => "locations.json",
        SourceKind::Fall => "falls.json",
        SourceKind::Tamper => "tamper.json",
        SourceKind::Temperature => "temperatures.json",
    }
}

/// File name of the manifest.
pub const MANIFEST_FILE: &str = "manifest.json";

/// How a dataset was generated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FleetMetadata {
    /// Scenario name.
    pub scenario: String,
    /// Generation seed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Sample interval in milliseconds.
    pub sample_interval_ms: u64,
    /// Tags that have records but no registered item.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub orphan_tags: Vec<String>,
}

/// A generated fleet: items and every record stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FleetDataset {
    pub items: Vec<LuggageItem>,
    pub locations: Vec<LocationSample>,
    pub falls: Vec<AlertEvent>,
    pub tampers: Vec<AlertEvent>,
    pub temperatures: Vec<TemperatureSample>,
    pub metadata: FleetMetadata,
}

impl FleetDataset {
    /// Total number of records across every source.
    pub fn record_count(&self) -> usize {
        self.items.len()
            + self.locations.len()
            + self.falls.len()
            + self.tampers.len()
            + self.temperatures.len()
    }

    /// Snapshot with every source ready.
    pub fn to_snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot::from_parts(
            self.items.clone(),
            self.locations.clone(),
            self.falls.clone(),
            self.tampers.clone(),
            self.temperatures.clone(),
        )
    }

    /// One successful fetch per source.
    pub fn to_updates(&self) -> Vec<SourceUpdate> {
        vec![
            SourceUpdate::Luggage(Ok(self.items.clone().into())),
            SourceUpdate::Location(Ok(self.locations.clone().into())),
            SourceUpdate::Fall(Ok(self.falls.clone().into())),
            SourceUpdate::Tamper(Ok(self.tampers.clone().into())),
            SourceUpdate::Temperature(Ok(self.temperatures.clone().into())),
        ]
    }

    /// Write one JSON file per source plus the manifest into `dir`.
    pub fn write_dir(&self, dir: impl AsRef<Path>) -> Result<(), DatasetError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let luggage: Vec<WireLuggage> = self.items.iter().map(WireLuggage::from).collect();
        let locations: Vec<WireLocation> = self.locations.iter().map(WireLocation::from).collect();
        let falls: Vec<WireAlert> = self.falls.iter().map(WireAlert::from).collect();
        let tampers: Vec<WireAlert> = self.tampers.iter().map(WireAlert::from).collect();
        let temperatures: Vec<WireTemperature> =
            self.temperatures.iter().map(WireTemperature::from).collect();

        write_json(dir.join(source_file(SourceKind::Luggage)), &luggage)?;
        write_json(dir.join(source_file(SourceKind::Location)), &locations)?;
        write_json(dir.join(source_file(SourceKind::Fall)), &falls)?;
        write_json(dir.join(source_file(SourceKind::Tamper)), &tampers)?;
        write_json(dir.join(source_file(SourceKind::Temperature)), &temperatures)?;
        write_json(dir.join(MANIFEST_FILE), &self.metadata)?;
        Ok(())
    }

    /// Read a directory written by [`FleetDataset::write_dir`].
    ///
    /// Every source file must exist; the manifest is optional. Degradations
    /// found while decoding are returned alongside the dataset.
    pub fn read_dir(dir: impl AsRef<Path>) -> Result<(Self, Vec<Degradation>), DatasetError> {
        let dir = dir.as_ref();
        let mut degradations = Vec::new();

        let items = read_source::<WireLuggage>(dir, &mut degradations)?;
        let locations = read_source::<WireLocation>(dir, &mut degradations)?;
        let falls = read_source::<WireFall>(dir, &mut degradations)?;
        let tampers = read_source::<WireTamper>(dir, &mut degradations)?;
        let temperatures = read_source::<WireTemperature>(dir, &mut degradations)?;

        let manifest = dir.join(MANIFEST_FILE);
        let metadata = if manifest.exists() {
            read_json(&manifest)?
        } else {
            FleetMetadata::default()
        };

        let dataset = Self {
            items,
            locations,
            falls,
            tampers,
            temperatures,
            metadata,
        };
        Ok((dataset, degradations))
    }
}

fn write_json<T: Serialize + ?Sized>(
    path: impl AsRef<Path>,
    value: &T,
) -> Result<(), DatasetError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, DatasetError> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

fn read_source<W: WireRecord>(
    dir: &Path,
    degradations: &mut Vec<Degradation>,
) -> Result<Vec<W::Record>, DatasetError> {
    let file = source_file(W::SOURCE);
    let json = fs::read_to_string(dir.join(file))?;
    let (records, found) = decode_source::<W>(&json).map_err(|e| DatasetError::Decode {
        file: file.to_string(),
        message: e.to_string(),
    })?;
    degradations.extend(found);
    Ok(records)
}
