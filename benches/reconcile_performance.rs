//! Performance benchmarks for queue reconciliation and mutations

use chrono::{Local, TimeZone};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use queue_desk::config::QueueSettings;
use queue_desk::types::{CustomerType, JoinRequest, QueueStatus, StatusUpdate, Timestamp};
use queue_desk::wait_time::{EstimateInput, LoadAwareEstimator, WaitTimeConfig, WaitTimeEstimator};
use queue_desk::{ManualClock, QueueManager};
use std::sync::Arc;

fn bench_start() -> Timestamp {
    Local
        .with_ymd_and_hms(2024, 3, 4, 10, 0, 0)
        .single()
        .expect("unambiguous bench time")
}

fn create_bench_queue(waiting: usize) -> (QueueManager, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(bench_start()));
    let settings = QueueSettings {
        counters: 4,
        ..QueueSettings::default()
    };
    let manager = QueueManager::with_clock(&settings, WaitTimeConfig::default(), clock.clone())
        .expect("bench queue");

    let types = [
        CustomerType::WalkIn,
        CustomerType::Appointment,
        CustomerType::Vip,
        CustomerType::Returning,
    ];
    for i in 0..waiting {
        manager
            .join(JoinRequest::new(format!("bench-{}", i)).with_customer_type(types[i % types.len()]))
            .expect("bench join");
        clock.advance_minutes(1);
    }

    (manager, clock)
}

fn bench_estimator(c: &mut Criterion) {
    let estimator = LoadAwareEstimator::new(WaitTimeConfig::default()).expect("estimator");
    let input = EstimateInput {
        position: 12,
        base_minutes: 15.0,
        customer_type: CustomerType::Vip,
        total_counters: 4,
        in_service: 2,
        now: bench_start(),
    };

    c.bench_function("estimate_single_position", |b| {
        b.iter(|| estimator.estimate(black_box(&input)))
    });
}

fn bench_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile");

    for size in [10usize, 100, 1000] {
        let (manager, _clock) = create_bench_queue(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| manager.reconcile().expect("reconcile"))
        });
    }

    group.finish();
}

fn bench_join_and_serve(c: &mut Criterion) {
    c.bench_function("join_then_serve_with_100_waiting", |b| {
        let (manager, clock) = create_bench_queue(100);
        b.iter(|| {
            let entry = manager
                .join(JoinRequest::new("bench-join"))
                .expect("join");
            clock.advance_minutes(1);
            manager
                .update_status(&entry.id, StatusUpdate::new(QueueStatus::InService))
                .expect("serve");
            manager.remove(black_box(&entry.id)).expect("remove");
        })
    });
}

criterion_group!(benches, bench_estimator, bench_reconcile, bench_join_and_serve);
criterion_main!(benches);
