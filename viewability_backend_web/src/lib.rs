// Copyright 2026 the Viewability Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web backend for viewability tracking.
//!
//! This crate provides integration with browser APIs:
//!
//! - [`IntervalLoop`]: `setInterval` tick source for driving
//!   [`ViewabilityTracker::advance`](viewability_core::tracker::ViewabilityTracker::advance)
//! - [`now`] and [`timebase`]: the `performance.now()` clock as microsecond
//!   [`HostTime`] ticks

#![no_std]

extern crate alloc;

mod interval;

pub use interval::IntervalLoop;

use viewability_core::time::{HostTime, Timebase};

/// Returns the current host time from `performance.now()`.
///
/// The returned [`HostTime`] is in microsecond ticks. Use [`timebase`] to
/// convert to nanoseconds.
#[must_use]
pub fn now() -> HostTime {
    let ms = interval::performance_now();
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "performance.now() returns small positive f64; µs fits in u64"
    )]
    let us = (ms * 1000.0) as u64;
    HostTime(us)
}

/// Returns the web [`Timebase`]: 1 tick = 1 µs = 1000 ns.
///
/// `Timebase { numer: 1000, denom: 1 }` means `nanoseconds = ticks × 1000`.
#[must_use]
pub fn timebase() -> Timebase {
    Timebase::new(1000, 1)
}

/// Converts a detection interval in seconds to a `setInterval` delay in whole
/// milliseconds, rounded to nearest.
///
/// Browsers clamp small delays on their own; zero, negative and NaN inputs
/// map to `0`, and huge inputs saturate.
#[must_use]
pub fn interval_millis(seconds: f64) -> i32 {
    if seconds.is_nan() || seconds <= 0.0 {
        return 0;
    }
    #[expect(
        clippy::cast_possible_truncation,
        reason = "float-to-int `as` saturates, which is the wanted behavior here"
    )]
    let ms = (seconds * 1000.0).round() as i32;
    ms
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timebase_is_microsecond() {
        let tb = timebase();
        // 1 tick = 1 µs = 1000 ns
        assert_eq!(tb.ticks_to_nanos(1), 1000);
        assert_eq!(tb.ticks_to_nanos(1_000_000), 1_000_000_000);
    }

    #[test]
    fn interval_millis_rounds_and_clamps() {
        assert_eq!(interval_millis(0.1), 100);
        assert_eq!(interval_millis(0.0255), 26);
        assert_eq!(interval_millis(-1.0), 0);
        assert_eq!(interval_millis(f64::NAN), 0);
        assert_eq!(interval_millis(f64::INFINITY), i32::MAX);
    }
}
