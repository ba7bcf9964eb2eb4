//! Benchmarks for aggregation and dashboard rendering

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use luggage_telemetry::{
    Aggregator, AlertEvent, LuggageItem, Selection, TelemetryEngine, TelemetrySnapshot,
    TemperatureSample,
};

fn generate_temperatures(count: usize, tags: usize) -> Vec<TemperatureSample> {
    let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    (0..count)
        .map(|i| {
            let value = 20.0 + (i as f64 % 10.0) * 0.1;
            TemperatureSample::new(
                format!("LG-{}", i % tags),
                t0 + Duration::seconds(i as i64 * 7),
                value,
            )
        })
        .collect()
}

fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");

    let data = generate_temperatures(10_000, 50);
    let aggregator = Aggregator::default();
    let one = Selection::parse("LG-7");

    group.throughput(Throughput::Elements(10_000));

    group.bench_function("all_10000_samples", |b| {
        b.iter(|| black_box(aggregator.aggregate(black_box(&data), &Selection::All)))
    });

    group.bench_function("tag_10000_samples", |b| {
        b.iter(|| black_box(aggregator.aggregate(black_box(&data), &one)))
    });

    group.finish();
}

fn bench_dashboard(c: &mut Criterion) {
    let mut group = c.benchmark_group("dashboard");

    let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    let items: Vec<LuggageItem> = (0..50)
        .map(|i| LuggageItem::new(format!("LG-{}", i), format!("Bag {}", i)))
        .collect();
    let falls: Vec<AlertEvent> = (0..1_000)
        .map(|i| AlertEvent::new(format!("LG-{}", i % 60), t0 + Duration::minutes(i)))
        .collect();
    let snapshot = TelemetrySnapshot::from_parts(
        items,
        vec![],
        falls.clone(),
        falls,
        generate_temperatures(10_000, 50),
    );
    let engine = TelemetryEngine::default();

    group.throughput(Throughput::Elements(12_000));

    group.bench_function("render_all", |b| {
        b.iter(|| black_box(engine.render_dashboard(&snapshot, &Selection::All)))
    });

    group.finish();
}

criterion_group!(benches, bench_aggregate, bench_dashboard);
criterion_main!(benches);
