//! Criterion micro-benchmarks for reconciliation and the animation tick.

use std::hint::black_box;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use hamlet_bench::burst_roster;
use hamlet_core::{PostedMessage, TownEvent};
use hamlet_engine::{Town, TownConfig};
use hamlet_map::VILLAGE_MAP;

fn town() -> Town {
    match Town::new(TownConfig::default(), VILLAGE_MAP) {
        Ok(t) => t,
        Err(e) => panic!("default config rejected: {e}"),
    }
}

/// Benchmark: first roster snapshot of 200 agents (spawn + route each).
fn bench_roster_burst_200(c: &mut Criterion) {
    let event = burst_roster(200, 42);
    c.bench_function("roster_burst_200", |b| {
        b.iter_batched(
            town,
            |mut t| black_box(t.apply(event.clone(), Duration::ZERO)),
            BatchSize::SmallInput,
        );
    });
}

/// Benchmark: re-applying an identical 200-agent snapshot (the idempotent path).
fn bench_roster_repeat_200(c: &mut Criterion) {
    let event = burst_roster(200, 42);
    let mut t = town();
    t.apply(event.clone(), Duration::ZERO);
    c.bench_function("roster_repeat_200", |b| {
        b.iter(|| black_box(t.apply(event.clone(), Duration::ZERO)));
    });
}

/// Benchmark: 60 animation ticks with 200 agents walking.
fn bench_tick_200_walking(c: &mut Criterion) {
    let event = burst_roster(200, 42);
    c.bench_function("tick_200_walking_60_frames", |b| {
        b.iter_batched(
            || {
                let mut t = town();
                t.apply(event.clone(), Duration::ZERO);
                t
            },
            |mut t| {
                for frame in 1..=60u64 {
                    t.tick(Duration::from_millis(frame * 16));
                    black_box(t.frame());
                }
            },
            BatchSize::SmallInput,
        );
    });
}

/// Benchmark: 1000 feed messages, half of them redelivered.
fn bench_feed_dedupe_1000(c: &mut Criterion) {
    let messages: Vec<TownEvent> = (0..1000)
        .map(|i| {
            let n = i / 2;
            TownEvent::MessagePosted(PostedMessage::new(
                format!("agent-{}", n % 20),
                format!("message {n}"),
                n.to_string(),
            ))
        })
        .collect();
    c.bench_function("feed_dedupe_1000", |b| {
        b.iter_batched(
            town,
            |mut t| {
                for m in &messages {
                    t.apply(m.clone(), Duration::ZERO);
                }
                black_box(t.feed().len())
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_roster_burst_200,
    bench_roster_repeat_200,
    bench_tick_200_walking,
    bench_feed_dedupe_1000
);
criterion_main!(benches);
