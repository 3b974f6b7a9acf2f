use std::{ops::Deref, time::Duration};

use crate::ConfigError;

/// Maximum permits admissible within one window (or one full bucket).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capacity(u64);

impl TryFrom<u64> for Capacity {
    type Error = ConfigError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(Self(value))
    }
}

impl Deref for Capacity {
    type Target = u64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Span of the trailing window used for admission decisions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowDuration(Duration);

impl TryFrom<Duration> for WindowDuration {
    type Error = ConfigError;

    fn try_from(value: Duration) -> Result<Self, Self::Error> {
        if value.is_zero() {
            return Err(ConfigError::ZeroWindow);
        }
        Ok(Self(value))
    }
}

impl Deref for WindowDuration {
    type Target = Duration;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Token bucket refill rate in permits per second.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RefillRate(f64);

impl TryFrom<f64> for RefillRate {
    type Error = ConfigError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() || value <= 0f64 {
            return Err(ConfigError::InvalidRefillRate);
        }
        Ok(Self(value))
    }
}

impl Deref for RefillRate {
    type Target = f64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Idle duration after which a key's limiter state becomes eligible for
/// eviction. Defaults to five minutes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IdleTimeout(Duration);

impl Default for IdleTimeout {
    fn default() -> Self {
        Self(Duration::from_secs(300))
    }
}

impl TryFrom<Duration> for IdleTimeout {
    type Error = ConfigError;

    fn try_from(value: Duration) -> Result<Self, Self::Error> {
        if value.is_zero() {
            return Err(ConfigError::ZeroIdleTimeout);
        }
        Ok(Self(value))
    }
}

impl Deref for IdleTimeout {
    type Target = Duration;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Upper bound on attempts per [`RetryScheduler::execute`](crate::RetryScheduler::execute)
/// call, the first attempt included. Defaults to 3.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MaxAttempts(u32);

impl Default for MaxAttempts {
    fn default() -> Self {
        Self(3)
    }
}

impl TryFrom<u32> for MaxAttempts {
    type Error = ConfigError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if value == 0 {
            return Err(ConfigError::ZeroMaxAttempts);
        }
        Ok(Self(value))
    }
}

impl Deref for MaxAttempts {
    type Target = u32;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Nominal delay before the first retry, scaled by the backoff factor for
/// later attempts. Defaults to 100ms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BaseDelay(Duration);

impl Default for BaseDelay {
    fn default() -> Self {
        Self(Duration::from_millis(100))
    }
}

impl TryFrom<Duration> for BaseDelay {
    type Error = ConfigError;

    fn try_from(value: Duration) -> Result<Self, Self::Error> {
        if value.is_zero() {
            return Err(ConfigError::ZeroBaseDelay);
        }
        Ok(Self(value))
    }
}

impl Deref for BaseDelay {
    type Target = Duration;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Multiplier applied to the nominal delay after each failed attempt.
/// Defaults to 2.0.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackoffFactor(f64);

impl Default for BackoffFactor {
    fn default() -> Self {
        Self(2f64)
    }
}

impl TryFrom<f64> for BackoffFactor {
    type Error = ConfigError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() || value < 1f64 {
            return Err(ConfigError::InvalidBackoffFactor);
        }
        Ok(Self(value))
    }
}

impl Deref for BackoffFactor {
    type Target = f64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Outcome of one admission check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// The request is admitted and its cost has been consumed.
    Allowed,
    /// The request is denied and nothing was consumed.
    ///
    /// Includes best-effort hints for callers that want to communicate backoff.
    Denied {
        /// Milliseconds until at least one more permit frees up. `u64::MAX`
        /// when the request can never be admitted (cost above capacity).
        retry_after_ms: u64,
        /// Permits still available right now (insufficient for this request).
        remaining: u64,
    },
}

impl RateLimitDecision {
    /// True when the request was admitted.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}
