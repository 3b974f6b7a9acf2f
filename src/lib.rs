#![doc = include_str!("../README.md")]
#![deny(missing_docs)]
#![forbid(unsafe_code)]

mod limiter;
pub use limiter::*;

mod retry;
pub use retry::*;

mod error;
pub use error::*;

mod clock;

mod common;
pub use common::{
    BackoffFactor, BaseDelay, Capacity, IdleTimeout, MaxAttempts, RateLimitDecision, RefillRate,
    WindowDuration,
};

#[cfg(test)]
mod tests;
