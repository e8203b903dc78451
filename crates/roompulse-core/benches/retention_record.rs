//! Criterion benchmarks for status recording.
//!
//! Measures:
//! - steady-state `record` on a full engine (every call migrates and evicts)
//! - throttled `record` (gate rejection only)
//! - `record_ledger` through the shared recorder for growing populations
//! - `read_history` copies at capacity

use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use roompulse_core::clock::ManualClock;
use roompulse_core::config::RetentionConfig;
use roompulse_core::ledger::StatusLedger;
use roompulse_core::recorder::StatusRecorder;
use roompulse_core::retention::RetentionEngine;
use roompulse_core::status::StatusValue;

const SEC: i64 = 1_000;

fn tight_config(max: usize) -> RetentionConfig {
    RetentionConfig {
        dense_snapshot_interval_secs: 1,
        dense_interval_window_secs: 60,
        sparse_snapshot_interval_secs: 5,
        max_snapshot_count: max,
    }
}

fn statuses(n: usize) -> Vec<StatusValue> {
    (0..n).map(|i| StatusValue::ALL[i % StatusValue::COUNT]).collect()
}

fn bench_record_steady_state(c: &mut Criterion) {
    let mut group = c.benchmark_group("retention/record_steady_state");
    group.throughput(Throughput::Elements(1));

    for &max in &[100usize, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::new("max", max), &max, |b, &max| {
            let mut engine = RetentionEngine::new(tight_config(max)).unwrap();
            let population = statuses(50);
            let mut now = 0i64;
            // Fill past the window and the cap before measuring.
            for _ in 0..(max as i64 * 6) {
                engine.record(population.iter().copied(), now);
                now += SEC;
            }
            b.iter(|| {
                let outcome = engine.record(population.iter().copied(), now);
                now += SEC;
                black_box(outcome)
            });
        });
    }

    group.finish();
}

fn bench_record_throttled(c: &mut Criterion) {
    let mut engine = RetentionEngine::new(tight_config(1_000)).unwrap();
    engine.record(statuses(50), 0);
    let population = statuses(50);

    c.bench_function("retention/record_throttled", |b| {
        b.iter(|| black_box(engine.record(population.iter().copied(), black_box(500))));
    });
}

fn bench_record_ledger(c: &mut Criterion) {
    let mut group = c.benchmark_group("recorder/record_ledger");

    for &participants in &[10usize, 100, 1_000] {
        group.throughput(Throughput::Elements(participants as u64));
        group.bench_with_input(
            BenchmarkId::new("participants", participants),
            &participants,
            |b, &participants| {
                let clock = Arc::new(ManualClock::new(0));
                let recorder = StatusRecorder::new(tight_config(1_000), clock.clone()).unwrap();
                let ledger = StatusLedger::new();
                for (i, status) in statuses(participants).into_iter().enumerate() {
                    ledger.set_status(format!("p{i}"), status, 0);
                }
                b.iter(|| {
                    clock.advance_ms(SEC);
                    black_box(recorder.record_ledger(&ledger))
                });
            },
        );
    }

    group.finish();
}

fn bench_read_history(c: &mut Criterion) {
    let clock = Arc::new(ManualClock::new(0));
    let recorder = StatusRecorder::new(tight_config(1_000), clock.clone()).unwrap();
    for _ in 0..5_000 {
        recorder.record(statuses(20));
        clock.advance_ms(SEC);
    }

    c.bench_function("recorder/read_history_at_capacity", |b| {
        b.iter(|| black_box(recorder.read_history()));
    });
}

criterion_group!(
    name = benches;
    config = Criterion::default().sample_size(50);
    targets = bench_record_steady_state, bench_record_throttled, bench_record_ledger, bench_read_history
);
criterion_main!(benches);
