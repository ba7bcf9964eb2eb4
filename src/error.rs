//! Error types for the luggage telemetry engine
//!
//! Two families live here. [`TelemetryError`] covers the few hard failures at
//! the edges of the engine (decoding wire records, invalid configuration).
//! [`Degradation`] covers everything else: inputs the engine tolerates by
//! degrading a single metric while the rest of the view stays computable.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::snapshot::SourceKind;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Main error type for engine operations
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// Wire payload could not be decoded
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Place lookup failed
    #[error("Place lookup error: {0}")]
    Place(#[from] PlaceError),
}

/// Errors from a reverse-geocoding collaborator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlaceError {
    /// Coordinates are not finite or out of range
    #[error("Invalid coordinates: ({latitude}, {longitude})")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    /// Nothing known near the coordinates
    #[error("No place within {radius_m:.0}m of ({latitude:.5}, {longitude:.5})")]
    NotFound {
        latitude: f64,
        longitude: f64,
        radius_m: f64,
    },

    /// The collaborator itself failed
    #[error("Resolver unavailable: {0}")]
    Unavailable(String),
}

/// A non-fatal problem found while rendering a view.
///
/// Degradations are reported alongside the view they affected and logged;
/// they never abort a render pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Degradation {
    /// A source has not returned yet, or its last fetch failed
    MissingSource {
        source: SourceKind,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    /// A status string outside the closed set, replaced by `Unknown`
    UnknownStatusValue { tag: Option<String>, value: String },
    /// Records whose tag matches no known luggage item
    UnresolvedReference {
        source: SourceKind,
        tag: String,
        records: usize,
    },
    /// A record whose timestamp could not be parsed
    MalformedTimestamp {
        source: SourceKind,
        tag: String,
        value: String,
    },
    /// A location sample whose place name could not be resolved
    PlaceUnresolved { tag: String, reason: String },
}

impl Degradation {
    /// Short machine-readable name of the degradation kind
    pub fn kind(&self) -> &'static str {
        match self {
            Degradation::MissingSource { .. } => "missing_source",
            Degradation::UnknownStatusValue { .. } => "unknown_status_value",
            Degradation::UnresolvedReference { .. } => "unresolved_reference",
            Degradation::MalformedTimestamp { .. } => "malformed_timestamp",
            Degradation::PlaceUnresolved { .. } => "place_unresolved",
        }
    }

    /// Emit this degradation on the `log` facade.
    ///
    /// Bad values in the data are warnings; absent sources and orphaned
    /// references are routine while fetches are in flight or items are removed.
    pub fn log(&self) {
        match self {
            Degradation::UnknownStatusValue { tag, value } => {
                log::warn!(
                    "unrecognized status {:?} for {}; using Unknown",
                    value,
                    tag.as_deref().unwrap_or("<untagged>")
                );
            }
            Degradation::MalformedTimestamp { source, tag, value } => {
                log::warn!(
                    "malformed timestamp {:?} in {} record for {}",
                    value,
                    source.as_str(),
                    tag
                );
            }
            Degradation::MissingSource { source, reason } => match reason {
                Some(reason) => log::debug!("{} source failed: {}", source.as_str(), reason),
                None => log::debug!("{} source not loaded yet", source.as_str()),
            },
            Degradation::UnresolvedReference {
                source,
                tag,
                records,
            } => {
                log::debug!(
                    "{} {} record(s) reference unknown tag {}",
                    records,
                    source.as_str(),
                    tag
                );
            }
            Degradation::PlaceUnresolved { tag, reason } => {
                log::debug!("no place name for {}: {}", tag, reason);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TelemetryError::InvalidConfig("bucket_secs must be > 0".to_string());
        let msg = format!("{}", err);
        assert!(msg.contains("Invalid configuration"));
        assert!(msg.contains("bucket_secs"));
    }

    #[test]
    fn test_error_conversion() {
        let place_err = PlaceError::Unavailable("timeout".to_string());
        let err: TelemetryError = place_err.into();
        assert!(matches!(err, TelemetryError::Place(_)));
    }

    #[test]
    fn test_degradation_kind() {
        let d = Degradation::UnknownStatusValue {
            tag: Some("TAG-1".to_string()),
            value: "Corrupted".to_string(),
        };
        assert_eq!(d.kind(), "unknown_status_value");
        d.log();
    }

    #[test]
    fn test_degradation_json_tagged() {
        let d = Degradation::MissingSource {
            source: SourceKind::Fall,
            reason: None,
        };
        let json = serde_json::to_string(&d).unwrap();
        assert!(json.contains("\"kind\":\"missing_source\""));
        assert!(json.contains("\"source\":\"fall\""));
        assert!(!json.contains("reason"));
    }
}
