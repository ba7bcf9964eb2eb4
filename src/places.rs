// Luggage Telemetry - Aggregation and status engine
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Place names for location samples
//!
//! Reverse geocoding is a collaborator behind [`PlaceResolver`]. A failure
//! leaves that one sample's place name empty and never touches the others.

use serde::{Deserialize, Serialize};

use crate::error::{Degradation, PlaceError, Result};
use crate::record::LocationSample;

/// Mean Earth radius (m).
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two `(lat, lon)` points in metres.
pub fn distance_m(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (lat1, lon1) = (a.0.to_radians(), a.1.to_radians());
    let (lat2, lon2) = (b.0.to_radians(), b.1.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

fn check_coordinates(latitude: f64, longitude: f64) -> std::result::Result<(), PlaceError> {
    let valid = latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude);
    if valid {
        Ok(())
    } else {
        Err(PlaceError::InvalidCoordinates {
            latitude,
            longitude,
        })
    }
}

/// Turns coordinates into a display string.
pub trait PlaceResolver {
    fn resolve(&self, latitude: f64, longitude: f64) -> std::result::Result<String, PlaceError>;
}

impl<F> PlaceResolver for F
where
    F: Fn(f64, f64) -> std::result::Result<String, PlaceError>,
{
    fn resolve(&self, latitude: f64, longitude: f64) -> std::result::Result<String, PlaceError> {
        self(latitude, longitude)
    }
}

/// A named point of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedPlace {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl NamedPlace {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
        }
    }
}

/// In-memory resolver: nearest known place within a radius.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gazetteer {
    places: Vec<NamedPlace>,
    radius_m: f64,
}

impl Gazetteer {
    pub fn new(radius_m: f64) -> Self {
        Self {
            places: Vec::new(),
            radius_m,
        }
    }

    /// Builder: add a place.
    pub fn with_place(mut self, place: NamedPlace) -> Self {
        self.places.push(place);
        self
    }

    pub fn insert(&mut self, place: NamedPlace) {
        self.places.push(place);
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    /// Load from JSON: `{"radius_m": 500, "places": [{"name", "latitude", "longitude"}]}`.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Nearest place with its distance, regardless of radius.
    pub fn nearest(&self, latitude: f64, longitude: f64) -> Option<(&NamedPlace, f64)> {
        self.places
            .iter()
            .map(|p| (p, distance_m((latitude, longitude), (p.latitude, p.longitude))))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }
}

impl PlaceResolver for Gazetteer {
    fn resolve(&self, latitude: f64, longitude: f64) -> std::result::Result<String, PlaceError> {
        check_coordinates(latitude, longitude)?;
        match self.nearest(latitude, longitude) {
            Some((place, distance)) if distance <= self.radius_m => Ok(place.name.clone()),
            _ => Err(PlaceError::NotFound {
                latitude,
                longitude,
                radius_m: self.radius_m,
            }),
        }
    }
}

/// Fill in missing place names.
///
/// Samples that already carry a name are left alone. Each failed lookup
/// yields one `PlaceUnresolved` degradation.
pub fn enrich_places<P: PlaceResolver + ?Sized>(
    samples: &[LocationSample],
    resolver: &P,
) -> (Vec<LocationSample>, Vec<Degradation>) {
    let mut degradations = Vec::new();
    let enriched = samples
        .iter()
        .map(|sample| {
            let mut sample = sample.clone();
            if sample.place_name.is_none() {
                match resolver.resolve(sample.latitude, sample.longitude) {
                    Ok(name) if !name.trim().is_empty() => sample.place_name = Some(name),
                    Ok(_) => degradations.push(Degradation::PlaceUnresolved {
                        tag: sample.tag.to_string(),
                        reason: "empty place name".to_string(),
                    }),
                    Err(e) => degradations.push(Degradation::PlaceUnresolved {
                        tag: sample.tag.to_string(),
                        reason: e.to_string(),
                    }),
                }
            }
            sample
        })
        .collect();
    (enriched, degradations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{TimeZone, Utc};

    fn airport() -> Gazetteer {
        Gazetteer::new(500.0)
            .with_place(NamedPlace::new("Terminal 3", 14.5202, 121.0160))
            .with_place(NamedPlace::new("Baggage Claim B", 14.5086, 121.0194))
    }

    #[test]
    fn test_distance_known_values() {
        assert_relative_eq!(distance_m((0.0, 0.0), (0.0, 0.0)), 0.0);
        // One degree of latitude is ~111.19 km on the mean sphere
        assert_relative_eq!(distance_m((0.0, 0.0), (1.0, 0.0)), 111_194.9, epsilon = 1.0);
        let d = distance_m((14.5, 121.0), (14.6, 121.1));
        assert_relative_eq!(d, distance_m((14.6, 121.1), (14.5, 121.0)));
    }

    #[test]
    fn test_gazetteer_nearest_within_radius() {
        let places = airport();
        assert_eq!(places.resolve(14.5203, 121.0161).unwrap(), "Terminal 3");
        assert_eq!(places.resolve(14.5087, 121.0193).unwrap(), "Baggage Claim B");
    }

    #[test]
    fn test_gazetteer_errors() {
        let places = airport();
        assert!(matches!(
            places.resolve(40.0, -74.0),
            Err(PlaceError::NotFound { .. })
        ));
        assert!(matches!(
            places.resolve(f64::NAN, 0.0),
            Err(PlaceError::InvalidCoordinates { .. })
        ));
        assert!(matches!(
            places.resolve(91.0, 0.0),
            Err(PlaceError::InvalidCoordinates { .. })
        ));
    }

    #[test]
    fn test_gazetteer_from_json() {
        let json = r#"{"radius_m": 100.0, "places": [{"name": "Gate 7", "latitude": 1.0, "longitude": 2.0}]}"#;
        let places = Gazetteer::from_json(json).unwrap();
        assert_eq!(places.len(), 1);
        assert_eq!(places.resolve(1.0, 2.0).unwrap(), "Gate 7");
        assert!(Gazetteer::from_json("[]").is_err());
    }

    #[test]
    fn test_enrich_isolates_failures() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        let mut named = LocationSample::new("T3", ts, 0.0, 0.0);
        named.place_name = Some("Already known".to_string());
        let samples = vec![
            LocationSample::new("T1", ts, 14.5202, 121.0160),
            LocationSample::new("T2", ts, 40.0, -74.0),
            named,
        ];

        let (enriched, degradations) = enrich_places(&samples, &airport());
        assert_eq!(enriched[0].place_name.as_deref(), Some("Terminal 3"));
        assert_eq!(enriched[1].place_name, None);
        assert_eq!(enriched[2].place_name.as_deref(), Some("Already known"));
        assert_eq!(degradations.len(), 1);
        assert_eq!(degradations[0].kind(), "place_unresolved");
    }

    #[test]
    fn test_closure_resolver() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        let offline = |_: f64, _: f64| -> std::result::Result<String, PlaceError> {
            Err(PlaceError::Unavailable("offline".to_string()))
        };
        let samples = vec![LocationSample::new("T1", ts, 1.0, 1.0)];
        let (enriched, degradations) = enrich_places(&samples, &offline);
        assert_eq!(enriched[0].place_name, None);
        assert!(matches!(
            &degradations[0],
            Degradation::PlaceUnresolved { reason, .. } if reason.contains("offline")
        ));
    }
}
