use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;

use criterion::{Criterion, criterion_group, criterion_main};

use cordon::{
    Capacity, IdleTimeout, LimiterOptions, LimiterPolicy, RateLimiter, WindowDuration,
};

fn options(capacity: u64) -> LimiterOptions {
    LimiterOptions {
        policy: LimiterPolicy::TokenBucket,
        capacity: Capacity::try_from(capacity).unwrap(),
        window: WindowDuration::try_from(Duration::from_secs(60)).unwrap(),
        refill_rate: None,
        idle_timeout: IdleTimeout::default(),
    }
}

fn bench_hot_key_allowed(c: &mut Criterion) {
    let mut group = c.benchmark_group("token_bucket/hot_key_allowed");
    group.sample_size(200);

    group.bench_function("check", |b| {
        // Large capacity so the hot key stays in the allowed path.
        let limiter = Arc::new(RateLimiter::new(options(u64::MAX / 2)));
        limiter.check("k", 1);

        b.iter(|| {
            black_box(limiter.check(black_box("k"), black_box(1)));
        });
    });

    group.finish();
}

fn bench_hot_key_denied(c: &mut Criterion) {
    let mut group = c.benchmark_group("token_bucket/hot_key_denied");
    group.sample_size(200);

    group.bench_function("check", |b| {
        let limiter = Arc::new(RateLimiter::new(options(1)));
        limiter.check("k", 1);

        b.iter(|| {
            black_box(limiter.check(black_box("k"), black_box(1)));
        });
    });

    group.finish();
}

fn bench_many_keys(c: &mut Criterion) {
    let mut group = c.benchmark_group("token_bucket/many_keys");
    group.sample_size(100);

    for key_space in [1_000_usize, 100_000] {
        group.bench_function(format!("check/keys={key_space}"), |b| {
            let limiter = Arc::new(RateLimiter::new(options(u64::MAX / 2)));
            let keys: Vec<String> = (0..key_space).map(|i| format!("user_{i}")).collect();
            let mut next = 0usize;

            b.iter(|| {
                let key = &keys[next % keys.len()];
                next = next.wrapping_add(1);
                black_box(limiter.check(black_box(key), black_box(1)));
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_hot_key_allowed,
    bench_hot_key_denied,
    bench_many_keys
);
criterion_main!(benches);
