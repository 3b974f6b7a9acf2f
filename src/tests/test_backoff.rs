use std::time::Duration;

use crate::{JitterMode, retry::nominal_delay};

#[test]
fn nominal_delays_double_until_the_cap() {
    let base = Duration::from_millis(100);
    let max = Duration::from_secs(1);

    // Delays before attempts 2..=5, then capped.
    assert_eq!(nominal_delay(base, 2.0, max, 1), Duration::from_millis(100));
    assert_eq!(nominal_delay(base, 2.0, max, 2), Duration::from_millis(200));
    assert_eq!(nominal_delay(base, 2.0, max, 3), Duration::from_millis(400));
    assert_eq!(nominal_delay(base, 2.0, max, 4), Duration::from_millis(800));
    assert_eq!(nominal_delay(base, 2.0, max, 5), Duration::from_secs(1));
    assert_eq!(nominal_delay(base, 2.0, max, 6), Duration::from_secs(1));
}

#[test]
fn factor_one_keeps_delays_constant() {
    let base = Duration::from_millis(250);
    let max = Duration::from_secs(1);

    for attempt in 1..=10 {
        assert_eq!(nominal_delay(base, 1.0, max, attempt), base);
    }
}

#[test]
fn huge_attempt_indices_saturate_at_the_cap() {
    let base = Duration::from_millis(100);
    let max = Duration::from_secs(30);

    assert_eq!(nominal_delay(base, 2.0, max, 10_000), max);
}

#[test]
fn jitter_none_is_identity() {
    let delay = Duration::from_millis(500);
    assert_eq!(JitterMode::None.apply(delay), delay);
}

#[test]
fn full_jitter_stays_within_nominal() {
    let delay = Duration::from_millis(500);

    for _ in 0..200 {
        let jittered = JitterMode::Full.apply(delay);
        assert!(jittered <= delay);
    }
}

#[test]
fn equal_jitter_keeps_a_floor_of_half_the_nominal() {
    let delay = Duration::from_millis(500);
    let floor = Duration::from_millis(250);

    for _ in 0..200 {
        let jittered = JitterMode::Equal.apply(delay);
        assert!(jittered >= floor);
        assert!(jittered <= delay);
    }
}

#[test]
fn jitter_on_zero_delay_is_zero() {
    assert_eq!(JitterMode::Full.apply(Duration::ZERO), Duration::ZERO);
    assert_eq!(JitterMode::Equal.apply(Duration::ZERO), Duration::ZERO);
}
