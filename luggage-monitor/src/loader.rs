// Luggage Monitor - Source loader
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Independent source fetching.
//!
//! Every source is read by its own task and reported on the event channel as
//! soon as it settles, so a slow or broken source never holds back the others.

use luggage_telemetry::record::{
    convert_wire, WireFall, WireLocation, WireLuggage, WireRecord, WireTamper, WireTemperature,
};
use luggage_telemetry::snapshot::Fetch;
use luggage_telemetry::{SourceData, SourceKind, SourceUpdate};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[cfg(feature = "demo")]
use luggage_testdata::FleetDataset;

/// Anything that makes the monitor re-render.
#[derive(Debug)]
pub enum MonitorEvent {
    /// A source settled.
    Source(SourceUpdate),
    /// Relative-time refresh.
    Tick,
}

/// Where source records come from.
#[derive(Debug, Clone)]
pub enum DataSource {
    /// One file per source, JSON or CSV.
    Directory(PathBuf),
    /// A generated fleet held in memory.
    #[cfg(feature = "demo")]
    Demo(FleetDataset),
}

/// File formats a source may be stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Json,
    Csv,
}

impl SourceFormat {
    pub const ALL: [SourceFormat; 2] = [SourceFormat::Json, SourceFormat::Csv];

    pub fn extension(&self) -> &'static str {
        match self {
            SourceFormat::Json => "json",
            SourceFormat::Csv => "csv",
        }
    }
}

/// File stem of a source inside a data directory.
pub fn file_stem(kind: SourceKind) -> &'static str {
    match kind {
        SourceKind::Luggage => "luggage",
        SourceKind::Location => "locations",
        SourceKind::Fall => "falls",
        SourceKind::Tamper => "tamper",
        SourceKind::Temperature => "temperatures",
    }
}

/// Spawn one fetch task per source. Each task sends exactly one update.
pub fn spawn_loaders(source: &DataSource, tx: &mpsc::Sender<MonitorEvent>) -> Vec<JoinHandle<()>> {
    match source {
        DataSource::Directory(dir) => SourceKind::ALL
            .into_iter()
            .map(|kind| {
                let dir = dir.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let update = fetch(&dir, kind).await;
                    send(&tx, update).await;
                })
            })
            .collect(),
        #[cfg(feature = "demo")]
        DataSource::Demo(dataset) => dataset
            .to_updates()
            .into_iter()
            .map(|update| {
                let tx = tx.clone();
                tokio::spawn(async move { send(&tx, update).await })
            })
            .collect(),
    }
}

async fn send(tx: &mpsc::Sender<MonitorEvent>, update: SourceUpdate) {
    let kind = update.kind();
    if tx.send(MonitorEvent::Source(update)).await.is_err() {
        debug!("Monitor gone, dropping {} update", kind);
    }
}

/// Fetch one source from `dir`, preferring JSON over CSV.
///
/// A missing, unreadable or undecodable file is a failed fetch.
pub async fn fetch(dir: &Path, kind: SourceKind) -> SourceUpdate {
    let stem = file_stem(kind);
    for format in SourceFormat::ALL {
        let path = dir.join(format!("{}.{}", stem, format.extension()));
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => {
                let update = decode(kind, format, &text);
                if !update.is_ok() {
                    warn!("Source {} failed to decode from {}", kind, path.display());
                }
                return update;
            }
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(e) => {
                warn!("Source {} unreadable: {}", kind, e);
                return SourceUpdate::failed(kind, format!("{}: {}", path.display(), e));
            }
        }
    }
    SourceUpdate::failed(
        kind,
        format!("no {}.json or {}.csv in {}", stem, stem, dir.display()),
    )
}

/// Decode a source payload.
pub fn decode(kind: SourceKind, format: SourceFormat, text: &str) -> SourceUpdate {
    match format {
        SourceFormat::Json => SourceUpdate::from_json(kind, text),
        SourceFormat::Csv => match kind {
            SourceKind::Luggage => SourceUpdate::Luggage(decode_csv::<WireLuggage>(text)),
            SourceKind::Location => SourceUpdate::Location(decode_csv::<WireLocation>(text)),
            SourceKind::Fall => SourceUpdate::Fall(decode_csv::<WireFall>(text)),
            SourceKind::Tamper => SourceUpdate::Tamper(decode_csv::<WireTamper>(text)),
            SourceKind::Temperature => {
                SourceUpdate::Temperature(decode_csv::<WireTemperature>(text))
            }
        },
    }
}

/// Decode a headed CSV table with the store's column names.
fn decode_csv<W: WireRecord>(text: &str) -> Fetch<W::Record> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    let wire = reader
        .deserialize::<W>()
        .collect::<Result<Vec<W>, csv::Error>>()
        .map_err(|e| e.to_string())?;
    let (records, degradations) = convert_wire(wire);
    Ok(SourceData::new(records, degradations))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const LUGGAGE_JSON: &str = r#"[
        {"luggage_tag_number": "LG-1", "luggage_custom_name": "Blue", "status": "In Range"},
        {"luggage_tag_number": "LG-2", "luggage_custom_name": "Red", "status": "Lost"}
    ]"#;

    const FALLS_CSV: &str = "\
luggage_tag_number,timestamp,severity
LG-1,2024-03-01T10:00:00Z,high
LG-1,not-a-time,
";

    #[test]
    fn test_decode_json_degrades_unknown_status() {
        match decode(SourceKind::Luggage, SourceFormat::Json, LUGGAGE_JSON) {
            SourceUpdate::Luggage(Ok(data)) => {
                assert_eq!(data.records.len(), 2);
                assert_eq!(data.degradations.len(), 1);
            }
            other => panic!("unexpected update: {:?}", other),
        }
    }

    #[test]
    fn test_decode_csv_alerts() {
        match decode(SourceKind::Fall, SourceFormat::Csv, FALLS_CSV) {
            SourceUpdate::Fall(Ok(data)) => {
                assert_eq!(data.records.len(), 2);
                assert_eq!(data.records[0].severity.as_deref(), Some("high"));
                assert!(data.records[0].timestamp.is_some());
                assert!(data.records[1].timestamp.is_none());
                assert_eq!(data.degradations.len(), 1);
            }
            other => panic!("unexpected update: {:?}", other),
        }
    }

    #[test]
    fn test_decode_garbage_is_failed_fetch() {
        let update = decode(SourceKind::Temperature, SourceFormat::Json, "{not json");
        assert_eq!(update.kind(), SourceKind::Temperature);
        assert!(!update.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_missing_file_fails() {
        let dir = tempdir().unwrap();
        let update = fetch(dir.path(), SourceKind::Tamper).await;
        assert_eq!(update.kind(), SourceKind::Tamper);
        assert!(!update.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_prefers_json() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("luggage.json"), LUGGAGE_JSON).unwrap();
        fs::write(dir.path().join("luggage.csv"), "garbage").unwrap();

        assert!(fetch(dir.path(), SourceKind::Luggage).await.is_ok());
    }

    #[tokio::test]
    async fn test_every_source_reports_once() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("luggage.json"), LUGGAGE_JSON).unwrap();
        fs::write(dir.path().join("falls.csv"), FALLS_CSV).unwrap();

        let (tx, mut rx) = mpsc::channel(16);
        let handles = spawn_loaders(&DataSource::Directory(dir.path().to_path_buf()), &tx);
        drop(tx);
        for handle in handles {
            handle.await.unwrap();
        }

        let mut kinds = Vec::new();
        let mut ok = 0;
        while let Some(event) = rx.recv().await {
            if let MonitorEvent::Source(update) = event {
                if update.is_ok() {
                    ok += 1;
                }
                kinds.push(update.kind());
            }
        }
        kinds.sort();
        assert_eq!(kinds, SourceKind::ALL.to_vec());
        assert_eq!(ok, 2);
    }
}
