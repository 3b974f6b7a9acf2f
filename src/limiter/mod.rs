//! Per-key admission control.
//!
//! A [`RateLimiter`] tracks consumption per caller key and answers allow/deny
//! in amortized O(1), using one of two policies: a burst-tolerant token bucket
//! or a strict sliding window. State for a key is created lazily on first use
//! and evicted passively once the key has been idle longer than the configured
//! timeout; the eviction check piggybacks on ordinary access, so no background
//! worker is ever spawned.

mod sliding_window;
pub use sliding_window::SlidingWindowLimiter;

mod token_bucket;
pub use token_bucket::TokenBucketLimiter;

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use crate::{
    Capacity, IdleTimeout, RateLimitDecision, RefillRate, WindowDuration,
    clock::{Clock, MonotonicClock},
};

/// Admission policy selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LimiterPolicy {
    /// Capacity-bounded reservoir refilled continuously; tolerates bursts up
    /// to capacity while converging on the refill rate long-run.
    TokenBucket,
    /// Exact count of admitted cost within any trailing window; a strictly
    /// stronger bound than the token bucket, at the price of storing
    /// per-admission timestamps (bounded by capacity).
    SlidingWindow,
}

/// Configuration for [`RateLimiter`].
///
/// Every field that could be invalid is a validated newtype, so a fully
/// constructed `LimiterOptions` is always usable.
#[derive(Clone, Copy, Debug)]
pub struct LimiterOptions {
    /// Which admission policy to run.
    pub policy: LimiterPolicy,
    /// Maximum permits per window (sliding window) or bucket size (token bucket).
    pub capacity: Capacity,
    /// Trailing window span; for the token bucket this only serves to derive
    /// the default refill rate.
    pub window: WindowDuration,
    /// Token bucket refill rate. `None` derives `capacity / window`, matching
    /// "capacity permits per window" on average. Ignored by the sliding window.
    pub refill_rate: Option<RefillRate>,
    /// Idle duration after which a key's state may be evicted.
    pub idle_timeout: IdleTimeout,
}

enum Inner {
    TokenBucket(TokenBucketLimiter),
    SlidingWindow(SlidingWindowLimiter),
}

/// Policy-selectable per-key rate limiter.
///
/// All methods take `&self` and are safe to call from any number of threads
/// or tasks. Decisions for one key are linearizable: every call observes the
/// effects of all calls on that key that completed before it started.
/// Operations on distinct keys do not block one another beyond map-shard
/// granularity.
pub struct RateLimiter {
    inner: Inner,
}

impl RateLimiter {
    /// Create a limiter running the configured policy.
    pub fn new(options: LimiterOptions) -> Self {
        Self::with_clock(options, Arc::new(MonotonicClock))
    }

    pub(crate) fn with_clock(options: LimiterOptions, clock: Arc<dyn Clock>) -> Self {
        let inner = match options.policy {
            LimiterPolicy::TokenBucket => {
                Inner::TokenBucket(TokenBucketLimiter::with_clock(&options, clock))
            }
            LimiterPolicy::SlidingWindow => {
                Inner::SlidingWindow(SlidingWindowLimiter::with_clock(&options, clock))
            }
        };
        Self { inner }
    }

    /// Admit or deny a single-permit request for `key`.
    ///
    /// Shorthand for `check(key, 1).is_allowed()`.
    pub fn allow(&self, key: &str) -> bool {
        self.check(key, 1).is_allowed()
    }

    /// Admit or deny a request consuming `cost` permits atomically.
    ///
    /// Either all `cost` permits are available and consumed, or none are and
    /// the call returns [`RateLimitDecision::Denied`] with backoff hints.
    /// A `cost` of zero is trivially allowed and consumes nothing.
    pub fn check(&self, key: &str, cost: u64) -> RateLimitDecision {
        match &self.inner {
            Inner::TokenBucket(limiter) => limiter.check(key, cost),
            Inner::SlidingWindow(limiter) => limiter.check(key, cost),
        }
    }

    /// Permits currently available for `key`, without consuming anything.
    pub fn remaining(&self, key: &str) -> u64 {
        match &self.inner {
            Inner::TokenBucket(limiter) => limiter.remaining(key),
            Inner::SlidingWindow(limiter) => limiter.remaining(key),
        }
    }

    /// Administrative clear of a key's state.
    ///
    /// The next call for `key` starts from a fresh (full) allocation.
    pub fn reset(&self, key: &str) {
        match &self.inner {
            Inner::TokenBucket(limiter) => limiter.reset(key),
            Inner::SlidingWindow(limiter) => limiter.reset(key),
        }
    }

    /// Number of keys with live state (idle keys linger until a sweep runs).
    pub fn tracked_keys(&self) -> usize {
        match &self.inner {
            Inner::TokenBucket(limiter) => limiter.tracked_keys(),
            Inner::SlidingWindow(limiter) => limiter.tracked_keys(),
        }
    }
}

/// Gate limiting idle-state sweeps to one claimant per interval.
///
/// Sweeps must run outside any per-key critical section (a sweep locks every
/// map shard), so limiters claim the gate before touching the caller's entry.
pub(crate) struct SweepGate {
    epoch: Instant,
    last_sweep_ms: AtomicU64,
}

impl SweepGate {
    pub(crate) fn new(now: Instant) -> Self {
        Self {
            epoch: now,
            last_sweep_ms: AtomicU64::new(0),
        }
    }

    /// Claim the right to sweep. At most one caller per `interval` wins.
    pub(crate) fn try_claim(&self, now: Instant, interval: Duration) -> bool {
        let now_ms = u64::try_from(now.duration_since(self.epoch).as_millis()).unwrap_or(u64::MAX);
        let last = self.last_sweep_ms.load(Ordering::Relaxed);
        let interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);

        if now_ms.saturating_sub(last) < interval_ms {
            return false;
        }

        self.last_sweep_ms
            .compare_exchange(last, now_ms, Ordering::Relaxed, Ordering::Relaxed)
            .is_ok()
    }
}
