// Luggage Monitor - Error types
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Monitor errors.
//!
//! Only startup problems are errors. Source fetch failures travel as failed
//! `SourceUpdate`s and never stop the monitor.

use thiserror::Error;

/// Result type for monitor operations.
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Monitor error types.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Engine error: {0}")]
    Telemetry(#[from] luggage_telemetry::TelemetryError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "demo")]
    #[error("Demo dataset error: {0}")]
    Dataset(#[from] luggage_testdata::DatasetError),

    #[error("No data source: pass --data <dir> or --demo")]
    NoSource,
}

impl MonitorError {
    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        MonitorError::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}
