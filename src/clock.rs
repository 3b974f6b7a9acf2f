use std::time::Instant;

/// Monotonic time source consulted for every admission decision.
///
/// Injected so tests can drive refill and window expiry deterministically
/// instead of sleeping.
pub(crate) trait Clock: Send + Sync + 'static {
    fn now(&self) -> Instant;
}

pub(crate) struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
