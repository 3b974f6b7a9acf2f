use std::{
    collections::VecDeque,
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

struct WindowSample {
    at: Instant,
    cost: u64,
}

struct WindowState {
    samples: VecDeque<WindowSample>,
    total: u64,
    last_seen: Instant,
}

/// Strict sliding-window limiter.
///
/// Each key owns an oldest-first sequence of admission timestamps (weighted
/// by cost) covering the trailing window. Admission trims the expired prefix,
/// then admits only if the surviving total plus the requested cost fits the
/// capacity. The guarantee is exact: at no instant does admitted cost within
/// any trailing window of the configured span exceed capacity, with no
/// fixed-boundary doubling artifact.
///
/// Memory per key is bounded by capacity (a denied request stores nothing).
/// As with the token bucket, a whole `check` runs inside the key's exclusive
/// map entry, so the bound holds under concurrent callers.
pub struct SlidingWindowLimiter {
    capacity: u64,
    window: Duration,
    idle_timeout: Duration,
    windows: DashMap<String, WindowState>,
    sweep: SweepGate,
    clock: Arc<dyn Clock>,
}

impl SlidingWindowLimiter {
    pub(crate) fn with_clock(options: &LimiterOptions, clock: Arc<dyn Clock>) -> Self {
        Self {
            capacity: *options.capacity,
            window: *options.window,
            idle_timeout: *options.idle_timeout,
            windows: DashMap::new(),
            sweep: SweepGate::new(clock.now()),
            clock,
        }
    }

    /// Admit or deny `cost` permits for `key`, all-or-nothing.
    ///
    /// A sample exits the window once strictly more than the window span has
    /// elapsed since it was admitted; a sample aged exactly one window still
    /// counts. Denial records nothing, so an identically-timed repeat call
    /// yields the same decision.
    pub fn check(&self, key: &str, cost: u64) -> RateLimitDecision {
        if cost == 0 {
            return RateLimitDecision::Allowed;
        }

        let now = self.clock.now();
        self.maybe_sweep(now);

        let mut state = self
            .windows
            .entry(key.to_string())
            .or_insert_with(|| WindowState {
                samples: VecDeque::new(),
                total: 0,
                last_seen: now,
            });

        state.last_seen = now;

        // Expired samples are always the oldest, so this is a prefix trim.
        loop {
            let expired_cost = match state.samples.front() {
                Some(front) if now.duration_since(front.at) > self.window => front.cost,
                _ => break,
            };
            state.total -= expired_cost;
            state.samples.pop_front();
        }

        if cost <= self.capacity && state.total.saturating_add(cost) <= self.capacity {
            state.samples.push_back(WindowSample { at: now, cost });
            state.total += cost;
            return RateLimitDecision::Allowed;
        }

        let remaining = self.capacity - state.total;
        let retry_after_ms = match state.samples.front() {
            Some(front) if cost <= self.capacity => {
                let until_exit = self
                    .window
                    .saturating_sub(now.duration_since(front.at));
                u64::try_from(until_exit.as_millis()).unwrap_or(u64::MAX).saturating_add(1)
            }
            // Over-capacity cost, or nothing in flight to wait out.
            _ => u64::MAX,
        };

        RateLimitDecision::Denied {
            retry_after_ms,
            remaining,
        }
    } // end method check

    /// Permits still admissible for `key` right now (read-only).
    ///
    /// Counts only samples still inside the window; expired ones are ignored
    /// but not trimmed, so this never writes.
    pub fn remaining(&self, key: &str) -> u64 {
        let Some(state) = self.windows.get(key) else {
            return self.capacity;
        };

        let now = self.clock.now();
        let in_window: u64 = state
            .samples
            .iter()
            .filter(|sample| now.duration_since(sample.at) <= self.window)
            .map(|sample| sample.cost)
            .sum();

        self.capacity.saturating_sub(in_window)
    }

    /// Drop `key`'s window; the next call starts from an empty one.
    pub fn reset(&self, key: &str) {
        self.windows.remove(key);
    }

    /// Number of keys with live window state.
    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }

    fn maybe_sweep(&self, now: Instant) {
        if !self.sweep.try_claim(now, self.idle_timeout) {
            return;
        }

        let before = self.windows.len();
        self.windows
            .retain(|_, state| now.duration_since(state.last_seen) <= self.idle_timeout);

        let evicted = before.saturating_sub(self.windows.len());
        if evicted > 0 {
            trace!(evicted, "evicted idle windows");
        }
    }
} // end of impl
