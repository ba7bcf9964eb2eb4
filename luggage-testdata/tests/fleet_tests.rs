// Luggage Testdata - Fleet integration tests
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Generated fleets run through the telemetry engine.

use luggage_telemetry::{
    AlertKind, EngineConfig, OrphanPolicy, Selection, TelemetryEngine, TelemetryStore,
};
use luggage_testdata::{generate_fleet, FleetConfig, FleetDataset, GeneratorConfig, Scenario};

fn config() -> GeneratorConfig {
    GeneratorConfig::new()
        .with_sample_interval_secs(60)
        .with_num_samples(180)
        .with_seed(7)
}

// ============================================================================
// Selection consistency over generated data
// ============================================================================

#[test]
fn test_per_tag_counts_sum_to_all() {
    let dataset = generate_fleet(&config(), &FleetConfig::new().with_items(6), Scenario::RoughHandling)
        .unwrap();
    let engine = TelemetryEngine::default();
    let snapshot = dataset.to_snapshot();

    let all = engine.render_dashboard(&snapshot, &Selection::All);
    let (falls, tampers) = dataset.items.iter().fold((0, 0), |(f, t), item| {
        let view = engine.render_dashboard(&snapshot, &Selection::Tag(item.tag.clone()));
        (f + view.fall_count, t + view.tamper_count)
    });

    assert_eq!(all.fall_count, falls);
    assert_eq!(all.tamper_count, tampers);
    assert!(all.fall_count > 0);
}

#[test]
fn test_tag_view_shows_item_status() {
    let dataset =
        generate_fleet(&config(), &FleetConfig::new().with_items(4), Scenario::NormalTrip).unwrap();
    let engine = TelemetryEngine::default();
    let snapshot = dataset.to_snapshot();

    for item in &dataset.items {
        let view = engine.render_dashboard(&snapshot, &Selection::Tag(item.tag.clone()));
        assert_eq!(view.status.status(), Some(item.status));
    }
}

// ============================================================================
// Orphaned alerts
// ============================================================================

#[test]
fn test_orphans_dropped_by_default() {
    let dataset =
        generate_fleet(&config(), &FleetConfig::new().with_items(3), Scenario::Orphaned).unwrap();
    assert_eq!(dataset.metadata.orphan_tags.len(), 2);

    let known_falls = dataset
        .falls
        .iter()
        .filter(|f| !dataset.metadata.orphan_tags.contains(&f.tag.to_string()))
        .count();

    let view = TelemetryEngine::default().render_dashboard(&dataset.to_snapshot(), &Selection::All);
    assert_eq!(view.fall_count, known_falls);
}

#[test]
fn test_orphans_counted_when_configured() {
    let dataset =
        generate_fleet(&config(), &FleetConfig::new().with_items(3), Scenario::Orphaned).unwrap();

    let mut engine_config = EngineConfig::default();
    engine_config.aggregation.orphan_policy = OrphanPolicy::Count;
    let engine = TelemetryEngine::new(engine_config).unwrap();
    let snapshot = dataset.to_snapshot();

    let view = engine.render_dashboard(&snapshot, &Selection::All);
    assert_eq!(view.fall_count, dataset.falls.len());
    assert_eq!(view.tamper_count, dataset.tampers.len());

    let timeline = engine.event_timeline(&snapshot, AlertKind::Fall, &Selection::All);
    assert_eq!(timeline.count, dataset.falls.len());
}

// ============================================================================
// Dataset directories
// ============================================================================

#[test]
fn test_directory_feeds_store() {
    let dir = tempfile::tempdir().unwrap();
    let dataset =
        generate_fleet(&config(), &FleetConfig::new().with_items(2), Scenario::ColdHold).unwrap();
    dataset.write_dir(dir.path()).unwrap();

    let (loaded, degradations) = FleetDataset::read_dir(dir.path()).unwrap();
    assert!(degradations.is_empty());

    let mut store = TelemetryStore::new();
    for update in loaded.to_updates() {
        store.apply(update);
    }
    assert!(store.all_settled());

    let engine = TelemetryEngine::default();
    let view = engine.render_dashboard(&store.snapshot(), &Selection::All);
    assert!(view.temperature < 10.0);
    assert!(view.diagnostics.is_empty());
}
