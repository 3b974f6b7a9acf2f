use std::time::Duration;

/// How the nominal backoff delay is randomized before use.
///
/// Jitter decorrelates retry storms from many callers failing at once; full
/// jitter decorrelates the most at the cost of sometimes retrying almost
/// immediately, equal jitter keeps a floor of half the nominal delay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JitterMode {
    /// Use the nominal delay as-is.
    None,
    /// Draw uniformly from `[0, delay]`.
    #[default]
    Full,
    /// `delay/2` plus a uniform draw from `[0, delay/2]`.
    Equal,
}

impl JitterMode {
    pub(crate) fn apply(&self, delay: Duration) -> Duration {
        if delay.is_zero() {
            return delay;
        }

        let secs = delay.as_secs_f64();
        match self {
            Self::None => delay,
            Self::Full => Duration::from_secs_f64(rand::random_range(0f64..=secs)),
            Self::Equal => {
                let half = secs / 2f64;
                Duration::from_secs_f64(half + rand::random_range(0f64..=half))
            }
        }
    }
}

/// Nominal delay before attempt `failed_attempt + 1`:
/// `min(base * factor^(failed_attempt - 1), max_delay)`.
pub(crate) fn nominal_delay(
    base: Duration,
    factor: f64,
    max_delay: Duration,
    failed_attempt: u32,
) -> Duration {
    let exponent = i32::try_from(failed_attempt.saturating_sub(1)).unwrap_or(i32::MAX);
    let secs = (base.as_secs_f64() * factor.powi(exponent)).min(max_delay.as_secs_f64());
    Duration::from_secs_f64(secs)
}
