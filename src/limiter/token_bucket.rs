use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use dashmap::DashMap;
use tracing::trace;

use crate::{
    LimiterOptions, RateLimitDecision,
    clock::Clock,
    limiter::SweepGate,
};

struct BucketState {
    tokens: f64,
    last_refill: Instant,
    last_seen: Instant,
}

/// Burst-tolerant token bucket limiter.
///
/// Each key owns a virtual bucket holding up to `capacity` tokens, refilled
/// continuously at `refill_rate` tokens per second. Refill is lazy: tokens
/// owed for the elapsed time are credited at the top of each call, so no
/// timer runs and behavior is deterministic given timestamps. Buckets start
/// full, so a brand-new key may burst up to `capacity` immediately.
///
/// A whole `check` call is one exclusive critical section on the key's map
/// entry. Concurrent callers on the same key serialize there, which is what
/// makes the capacity bound hold under arbitrary interleaving; callers on
/// other keys proceed in parallel (shard-granular).
pub struct TokenBucketLimiter {
    capacity: u64,
    refill_per_sec: f64,
    idle_timeout: Duration,
    buckets: DashMap<String, BucketState>,
    sweep: SweepGate,
    clock: Arc<dyn Clock>,
}

impl TokenBucketLimiter {
    pub(crate) fn with_clock(options: &LimiterOptions, clock: Arc<dyn Clock>) -> Self {
        let capacity = *options.capacity;
        let refill_per_sec = options
            .refill_rate
            .map(|rate| *rate)
            .unwrap_or(capacity as f64 / options.window.as_secs_f64());

        Self {
            capacity,
            refill_per_sec,
            idle_timeout: *options.idle_timeout,
            buckets: DashMap::new(),
            sweep: SweepGate::new(clock.now()),
            clock,
        }
    }

    /// Admit or deny `cost` permits for `key`, all-or-nothing.
    ///
    /// Denial consumes nothing; the bucket's token count after a denial is
    /// exactly what lazy refill dictates for the current instant, so an
    /// identically-timed repeat call yields the same decision.
    pub fn check(&self, key: &str, cost: u64) -> RateLimitDecision {
        if cost == 0 {
            return RateLimitDecision::Allowed;
        }

        let now = self.clock.now();
        self.maybe_sweep(now);

        let mut state = self
            .buckets
            .entry(key.to_string())
            .or_insert_with(|| BucketState {
                tokens: self.capacity as f64,
                last_refill: now,
                last_seen: now,
            });

        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.refill_per_sec).min(self.capacity as f64);
        state.last_refill = now;
        state.last_seen = now;

        let cost_f = cost as f64;

        if cost <= self.capacity && state.tokens >= cost_f {
            state.tokens -= cost_f;
            return RateLimitDecision::Allowed;
        }

        let remaining = state.tokens as u64;
        let retry_after_ms = if cost > self.capacity {
            // No amount of waiting admits a request larger than the bucket.
            u64::MAX
        } else {
            ((cost_f - state.tokens) / self.refill_per_sec * 1000f64).ceil() as u64
        };

        RateLimitDecision::Denied {
            retry_after_ms,
            remaining,
        }
    } // end method check

    /// Tokens currently available for `key` (read-only; nothing is consumed
    /// and no state is written).
    pub fn remaining(&self, key: &str) -> u64 {
        let Some(state) = self.buckets.get(key) else {
            return self.capacity;
        };

        let elapsed = self.clock.now().duration_since(state.last_refill).as_secs_f64();
        let tokens = (state.tokens + elapsed * self.refill_per_sec).min(self.capacity as f64);
        tokens as u64
    }

    /// Drop `key`'s bucket; the next call starts from a full one.
    pub fn reset(&self, key: &str) {
        self.buckets.remove(key);
    }

    /// Number of keys with live bucket state.
    pub fn tracked_keys(&self) -> usize {
        self.buckets.len()
    }

    fn maybe_sweep(&self, now: Instant) {
        if !self.sweep.try_claim(now, self.idle_timeout) {
            return;
        }

        let before = self.buckets.len();
        self.buckets
            .retain(|_, state| now.duration_since(state.last_seen) <= self.idle_timeout);

        let evicted = before.saturating_sub(self.buckets.len());
        if evicted > 0 {
            trace!(evicted, "evicted idle token buckets");
        }
    } // end method maybe_sweep
} // end of impl
