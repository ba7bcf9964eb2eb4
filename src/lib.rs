//! # Luggage Telemetry - Aggregation and status engine
//!
//! Turns raw, per-luggage sensor records (location pings, fall and tamper
//! alerts, temperature samples) into display-ready dashboard and map values.
//!
//! ## Key Features
//!
//! - **Selection-consistent dashboards**: status, temperature, fall and tamper
//!   counts of one render pass all use the same "All"-or-tag selection
//! - **Time-bucketed averages**: order-independent per-minute temperature means
//! - **Closed status set**: unrecognized status strings degrade to `Unknown`
//! - **Partial availability**: each source is fetched and merged independently;
//!   missing sources read as empty
//!
//! ## Quick Start
//!
//! ```rust
//! use luggage_telemetry::{
//!     LuggageItem, LuggageStatus, Selection, SourceUpdate, TelemetryEngine, TelemetryStore,
//!     TemperatureSample,
//! };
//! use chrono::{TimeZone, Utc};
//!
//! let engine = TelemetryEngine::default();
//! let mut store = TelemetryStore::new();
//!
//! // Sources arrive independently, in any order
//! let ts = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
//! store.apply(SourceUpdate::Temperature(Ok(vec![
//!     TemperatureSample::new("LG-1", ts, 21.0),
//!     TemperatureSample::new("LG-2", ts, 23.0),
//! ].into())));
//! store.apply(SourceUpdate::Luggage(Ok(vec![
//!     LuggageItem::new("LG-1", "Blue case").with_status(LuggageStatus::InRange),
//!     LuggageItem::new("LG-2", "Duffel"),
//! ].into())));
//!
//! let view = engine.render_dashboard(&store.snapshot(), &Selection::All);
//! assert_eq!(view.temperature, 22.0);
//! assert_eq!(view.fall_count, 0);
//! ```
//!
//! ## Modules
//!
//! - [`record`]: Data model, wire shapes and timestamp parsing
//! - [`aggregator`]: Counts and time-bucketed series per selection
//! - [`status`]: Status validation, display and derivation
//! - [`relative_time`]: "Last updated" / "Since" text and refresh cadence
//! - [`selection`]: Selection parsing and the filtered view
//! - [`snapshot`]: Per-source state, store and orphan resolution
//! - [`places`]: Reverse-geocoding contract and in-memory gazetteer
//! - [`engine`]: Dashboard, tracking and map rendering
//! - [`view`]: Serializable view types

// Modules
pub mod aggregator;
pub mod config;
pub mod engine;
pub mod error;
pub mod places;
pub mod record;
pub mod relative_time;
pub mod selection;
pub mod snapshot;
pub mod status;
pub mod view;

// Re-exports for convenient access
pub use aggregator::{AggregateResult, Aggregator, SeriesPoint};
pub use config::{
    AggregationConfig, DisplayConfig, EngineConfig, OrphanPolicy, RefreshConfig, StatusConfig,
};
pub use engine::{AlertKind, TelemetryEngine};
pub use error::{Degradation, PlaceError, Result, TelemetryError};
pub use places::{enrich_places, Gazetteer, NamedPlace, PlaceResolver};
pub use record::{
    parse_timestamp, AlertEvent, FallEvent, LocationSample, LuggageItem, Tag, TamperEvent,
    TemperatureSample, TimedRecord,
};
pub use relative_time::{describe, describe_stationary_since, RefreshSchedule};
pub use selection::{apply_selection, selection_options, FilteredView, Selection, SelectionOption};
pub use snapshot::{
    ResolvedTelemetry, SourceData, SourceKind, SourceState, SourceUpdate, TelemetrySnapshot,
    TelemetryStore,
};
pub use status::{DerivedStatus, LuggageStatus, StatusClassifier, StatusDisplay, StatusTone};
pub use view::{DashboardView, MapMarker, StatusCount, TrackingCard};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
