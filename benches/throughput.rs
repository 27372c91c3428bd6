//! Throughput Benchmark for LapseKV
//!
//! Measures item operations on the engine, expiry churn driven by the
//! logical clock, and a full conformance suite run.

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use lapsekv::config::EngineConfig;
use lapsekv::conformance::{run_suite, EngineDriver, SuiteConfig};
use lapsekv::engine::Engine;
use lapsekv::storage::Expiry;
use std::sync::Arc;
use std::time::Duration;

/// Benchmark ADD (fresh keys) and SET operations
fn bench_store(c: &mut Criterion) {
    let engine = Arc::new(Engine::with_manual_clock());

    let mut group = c.benchmark_group("store");
    group.throughput(Throughput::Elements(1));

    group.bench_function("add_fresh", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = Bytes::from(format!("key:{}", i));
            black_box(engine.add(key, Bytes::from("0"), Expiry::Never)).ok();
            i += 1;
        });
    });

    group.bench_function("set_1kb", |b| {
        let mut i = 0u64;
        let value = Bytes::from("x".repeat(1024));
        b.iter(|| {
            let key = Bytes::from(format!("key:{}", i % 10_000));
            engine.set(key, value.clone(), Expiry::Never).ok();
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark GET on live, missing and expired keys
fn bench_get(c: &mut Criterion) {
    let engine = Arc::new(Engine::with_manual_clock());

    for i in 0..100_000 {
        let key = Bytes::from(format!("key:{}", i));
        engine
            .set(key, Bytes::from(format!("value:{}", i)), Expiry::Never)
            .unwrap();
    }
    for i in 0..10_000 {
        let key = Bytes::from(format!("expired:{}", i));
        engine.set(key, Bytes::from("v"), Expiry::At(1)).unwrap();
    }
    engine.advance_clock(1).unwrap();

    let mut group = c.benchmark_group("get");
    group.throughput(Throughput::Elements(1));

    group.bench_function("get_live", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("key:{}", i % 100_000);
            black_box(engine.get(key.as_bytes())).ok();
            i += 1;
        });
    });

    group.bench_function("get_missing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("missing:{}", i);
            black_box(engine.get(key.as_bytes())).ok();
            i += 1;
        });
    });

    group.bench_function("get_expired", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("expired:{}", i % 10_000);
            black_box(engine.get(key.as_bytes())).ok();
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark INCR operations
fn bench_incr(c: &mut Criterion) {
    let engine = Arc::new(Engine::with_manual_clock());

    let mut group = c.benchmark_group("incr");
    group.throughput(Throughput::Elements(1));

    // Single counter (high contention)
    group.bench_function("single_counter", |b| {
        let key = Bytes::from("counter");
        b.iter(|| {
            black_box(engine.incr_with_default(&key, 1, 0, Expiry::Never).unwrap());
        });
    });

    group.bench_function("multiple_counters", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = Bytes::from(format!("counter:{}", i % 1000));
            black_box(engine.incr_with_default(&key, 1, 0, Expiry::Never).unwrap());
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark concurrent ADD contention on shared keys
fn bench_concurrent(c: &mut Criterion) {
    use std::thread;

    let mut group = c.benchmark_group("concurrent");
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("4_threads_add_race", |b| {
        b.iter(|| {
            let engine = Arc::new(Engine::with_manual_clock());
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let engine = Arc::clone(&engine);
                    thread::spawn(move || {
                        for i in 0..10_000 {
                            let key = Bytes::from(format!("key:{}", i));
                            engine.add(key, Bytes::from("0"), Expiry::Never).ok();
                        }
                    })
                })
                .collect();

            for handle in handles {
                handle.join().unwrap();
            }

            black_box(engine.stats().add_conflicts);
        });
    });

    group.finish();
}

/// Benchmark expiry churn: store with a TTL, advance past it, reclaim
fn bench_expiry(c: &mut Criterion) {
    let mut group = c.benchmark_group("expiry");

    group.bench_function("store_advance_reclaim_10k", |b| {
        let engine = Engine::with_manual_clock();
        b.iter(|| {
            let now = engine.now();
            for i in 0..10_000 {
                let key = Bytes::from(format!("key:{}", i));
                engine.set(key, Bytes::from("v"), Expiry::after(now, 2)).unwrap();
            }
            engine.advance_clock(3).unwrap();
            black_box(engine.reclaim_expired());
        });
    });

    group.finish();
}

/// Benchmark a full default conformance run
fn bench_conformance(c: &mut Criterion) {
    let mut group = c.benchmark_group("conformance");
    group.sample_size(10);

    group.bench_function("default_suite", |b| {
        let suite = SuiteConfig::default();
        b.iter(|| {
            let mut driver =
                EngineDriver::new(EngineConfig::default(), suite.key.clone(), suite.expiry);
            run_suite(&suite, &mut driver);
            black_box(driver.into_report().passed);
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_store,
    bench_get,
    bench_incr,
    bench_concurrent,
    bench_expiry,
    bench_conformance,
);

criterion_main!(benches);
