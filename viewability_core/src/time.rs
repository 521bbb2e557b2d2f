// Copyright 2026 the Viewability Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Monotonic host time and timebase conversion.
//!
//! [`HostTime`] is a point in time as host-native monotonic ticks (e.g.
//! microseconds from `performance.now()`, nanoseconds from a platform clock).
//! [`Timebase`] converts ticks to nanoseconds as `ticks * numer / denom`.
//!
//! Configuration thresholds are expressed in seconds; the tracker converts them
//! once per use into a tick [`Duration`] so that all accumulation is integer
//! arithmetic and exact across repeated ticks.

use core::fmt;
use core::ops::{Add, Sub};

/// A point in time expressed as host-native monotonic ticks.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HostTime(pub u64);

impl HostTime {
    /// Returns the raw tick value.
    #[inline]
    #[must_use]
    pub const fn ticks(self) -> u64 {
        self.0
    }

    /// Returns the span between `self` and an earlier time, or zero if
    /// `earlier` is after `self`.
    ///
    /// A host clock that steps backwards therefore reads as "no time elapsed"
    /// rather than underflowing.
    #[inline]
    #[must_use]
    pub const fn saturating_duration_since(self, earlier: Self) -> Duration {
        Duration(self.0.saturating_sub(earlier.0))
    }

    /// Adds a duration, saturating at the end of the tick range.
    #[inline]
    #[must_use]
    pub const fn saturating_add(self, duration: Duration) -> Self {
        Self(self.0.saturating_add(duration.0))
    }
}

impl Add<Duration> for HostTime {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Duration) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for HostTime {
    type Output = Duration;

    #[inline]
    fn sub(self, rhs: Self) -> Duration {
        Duration(self.0 - rhs.0)
    }
}

impl fmt::Debug for HostTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostTime({})", self.0)
    }
}

/// Rational conversion factor from ticks to nanoseconds.
///
/// `nanoseconds = ticks * numer / denom`
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timebase {
    /// Numerator of the ticks-to-nanoseconds ratio.
    pub numer: u32,
    /// Denominator of the ticks-to-nanoseconds ratio.
    pub denom: u32,
}

impl Timebase {
    /// A timebase where ticks are already nanoseconds (1:1).
    pub const NANOS: Self = Self { numer: 1, denom: 1 };

    /// A timebase where one tick is one microsecond.
    pub const MICROS: Self = Self {
        numer: 1000,
        denom: 1,
    };

    /// Creates a new timebase with the given numerator and denominator.
    ///
    /// # Panics
    ///
    /// Panics if either component is zero.
    #[inline]
    #[must_use]
    pub const fn new(numer: u32, denom: u32) -> Self {
        assert!(
            numer != 0 && denom != 0,
            "timebase components must not be zero"
        );
        Self { numer, denom }
    }

    /// Converts a tick count to nanoseconds.
    #[inline]
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "u128 intermediate avoids overflow; truncation back to u64 is intentional"
    )]
    pub const fn ticks_to_nanos(self, ticks: u64) -> u64 {
        (ticks as u128 * self.numer as u128 / self.denom as u128) as u64
    }

    /// Converts nanoseconds to a tick count.
    #[inline]
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "u128 intermediate avoids overflow; truncation back to u64 is intentional"
    )]
    pub const fn nanos_to_ticks(self, nanos: u64) -> u64 {
        (nanos as u128 * self.denom as u128 / self.numer as u128) as u64
    }
}

impl fmt::Debug for Timebase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timebase({}/{})", self.numer, self.denom)
    }
}

/// A span of host ticks.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration(pub u64);

impl Duration {
    /// A zero-length duration.
    pub const ZERO: Self = Self(0);

    /// Returns the raw tick value.
    #[inline]
    #[must_use]
    pub const fn ticks(self) -> u64 {
        self.0
    }

    /// Returns `true` for a zero-length duration.
    #[inline]
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Creates a duration from a nanosecond value and timebase.
    #[inline]
    #[must_use]
    pub const fn from_nanos(nanos: u64, timebase: Timebase) -> Self {
        Self(timebase.nanos_to_ticks(nanos))
    }

    /// Creates a duration from seconds, rounded to the nearest nanosecond.
    ///
    /// Negative and NaN inputs yield [`Duration::ZERO`]; values beyond the
    /// tick range saturate.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "float-to-int `as` saturates, which is the wanted behavior here"
    )]
    pub fn from_secs_f64(secs: f64, timebase: Timebase) -> Self {
        if secs.is_nan() || secs <= 0.0 {
            return Self::ZERO;
        }
        let nanos = (secs * 1e9 + 0.5) as u64;
        Self::from_nanos(nanos, timebase)
    }

    /// Converts this duration to nanoseconds using the given timebase.
    #[inline]
    #[must_use]
    pub const fn to_nanos(self, timebase: Timebase) -> u64 {
        timebase.ticks_to_nanos(self.0)
    }

    /// Converts this duration to seconds using the given timebase.
    #[inline]
    #[must_use]
    pub fn to_secs_f64(self, timebase: Timebase) -> f64 {
        self.to_nanos(timebase) as f64 / 1e9
    }
}

impl Add for Duration {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl fmt::Debug for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Duration({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secs_to_ticks_in_nanos() {
        let tb = Timebase::NANOS;
        assert_eq!(Duration::from_secs_f64(1.0, tb), Duration(1_000_000_000));
        assert_eq!(Duration::from_secs_f64(0.25, tb), Duration(250_000_000));
        // 0.1 is not exactly representable; rounding lands on the intended tick.
        assert_eq!(Duration::from_secs_f64(0.1, tb), Duration(100_000_000));
    }

    #[test]
    fn secs_to_ticks_in_micros() {
        let tb = Timebase::MICROS;
        assert_eq!(Duration::from_secs_f64(1.0, tb), Duration(1_000_000));
        assert_eq!(Duration::from_secs_f64(1.0, tb).to_nanos(tb), 1_000_000_000);
    }

    #[test]
    fn non_positive_secs_are_zero() {
        let tb = Timebase::NANOS;
        assert_eq!(Duration::from_secs_f64(-3.0, tb), Duration::ZERO);
        assert_eq!(Duration::from_secs_f64(f64::NAN, tb), Duration::ZERO);
        assert!(Duration::from_secs_f64(0.0, tb).is_zero(), "zero stays zero");
    }

    #[test]
    fn huge_secs_saturate() {
        let d = Duration::from_secs_f64(f64::INFINITY, Timebase::NANOS);
        assert_eq!(d, Duration(u64::MAX));
    }

    #[test]
    fn backwards_clock_reads_as_zero_elapsed() {
        let t = HostTime(1000);
        assert_eq!(t.saturating_duration_since(HostTime(1500)), Duration::ZERO);
        assert_eq!(t.saturating_duration_since(HostTime(400)), Duration(600));
    }

    #[test]
    fn host_time_arithmetic() {
        let t = HostTime(1000);
        assert_eq!((t + Duration(200)).ticks(), 1200);
        assert_eq!(HostTime(1200) - t, Duration(200));
        assert_eq!(HostTime(u64::MAX - 1).saturating_add(Duration(5)), HostTime(u64::MAX));
    }

    #[test]
    #[should_panic(expected = "timebase components must not be zero")]
    fn zero_denominator_panics() {
        let _ = Timebase::new(1, 0);
    }
}
