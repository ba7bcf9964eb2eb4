//! Stress tests for the telemetry engine
//!
//! Run with: cargo test --release stress -- --ignored

use chrono::{Duration, TimeZone, Utc};
use luggage_telemetry::*;
use std::time::Instant;

fn large_snapshot(items: usize, samples_per_item: usize) -> TelemetrySnapshot {
    let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    let luggage: Vec<LuggageItem> = (0..items)
        .map(|i| LuggageItem::new(format!("LG-{:05}", i), format!("Bag {}", i)))
        .collect();

    let mut temperatures = Vec::with_capacity(items * samples_per_item);
    let mut falls = Vec::new();
    for (i, item) in luggage.iter().enumerate() {
        for j in 0..samples_per_item {
            let ts = t0 + Duration::seconds((j * 30 + i) as i64);
            temperatures.push(TemperatureSample::new(
                item.tag.clone(),
                ts,
                20.0 + ((i + j) as f64 * 0.01).sin() * 5.0,
            ));
            if j % 50 == 0 {
                falls.push(AlertEvent::new(item.tag.clone(), ts));
            }
        }
    }

    TelemetrySnapshot::from_parts(luggage, vec![], falls, vec![], temperatures)
}

#[test]
#[ignore] // Run manually with --ignored
fn stress_test_dashboard_all() {
    let snapshot = large_snapshot(1_000, 1_000);
    let engine = TelemetryEngine::default();

    let iterations = 10;
    let start = Instant::now();
    for _ in 0..iterations {
        let view = engine.render_dashboard(&snapshot, &Selection::All);
        assert_eq!(view.fall_count, 1_000 * 20);
    }

    let elapsed = start.elapsed();
    let rate = (iterations * 1_000_000) as f64 / elapsed.as_secs_f64();

    println!("Rendered {} dashboards over 1M samples in {:?}", iterations, elapsed);
    println!("Rate: {:.0} samples/second", rate);

    assert!(
        rate > 1_000_000.0,
        "Should aggregate at least 1M samples/s, got {:.0}",
        rate
    );
}

#[test]
#[ignore]
fn stress_test_selection_switching() {
    let snapshot = large_snapshot(500, 200);
    let engine = TelemetryEngine::default();
    let options = engine.options(&snapshot);

    let start = Instant::now();
    for option in &options {
        let view = engine.render_dashboard(&snapshot, &option.value);
        assert_eq!(view.selection, option.value);
        if !option.value.is_all() {
            assert_eq!(view.temperature_series.len(), 200);
        }
    }
    let elapsed = start.elapsed();

    println!("Rendered {} selections in {:?}", options.len(), elapsed);
}
