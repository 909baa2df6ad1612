// Copyright 2026 the Framepace Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Monotonic host time and tick-rate conversion.
//!
//! [`HostTime`] represents a point in time as platform-native monotonic ticks
//! (e.g. `QueryPerformanceCounter` on Windows, `mach_absolute_time` on macOS,
//! `CLOCK_MONOTONIC` nanoseconds on Linux).
//!
//! [`TickRate`] is the counter frequency in ticks per second. It is queried
//! once at start-up and used only where ticks have to become seconds, which
//! is at callback boundaries and in diagnostics.
//!
//! [`Duration`] represents a duration in the same tick units as [`HostTime`].
//! Conversions use `u128` intermediates to avoid overflow.

use core::fmt;
use core::ops::{Add, AddAssign, Sub, SubAssign};

/// A point in time expressed as platform-native monotonic ticks.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HostTime(pub u64);

impl HostTime {
    /// Returns the raw tick value.
    #[inline]
    #[must_use]
    pub const fn ticks(self) -> u64 {
        self.0
    }

    /// Returns the duration between `self` and an earlier time, or zero if
    /// `earlier` is after `self`.
    #[inline]
    #[must_use]
    pub const fn saturating_duration_since(self, earlier: Self) -> Duration {
        Duration(self.0.saturating_sub(earlier.0))
    }

    /// Returns the signed tick distance `self - other`.
    ///
    /// Saturates at the `i64` range, which is far beyond any real counter
    /// span.
    #[inline]
    #[must_use]
    pub const fn signed_ticks_since(self, other: Self) -> i64 {
        let wide = self.0 as i128 - other.0 as i128;
        if wide > i64::MAX as i128 {
            i64::MAX
        } else if wide < i64::MIN as i128 {
            i64::MIN
        } else {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "range checked against i64 bounds above"
            )]
            let narrow = wide as i64;
            narrow
        }
    }
}

impl Add<Duration> for HostTime {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Duration) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign<Duration> for HostTime {
    #[inline]
    fn add_assign(&mut self, rhs: Duration) {
        self.0 += rhs.0;
    }
}

impl Sub<Duration> for HostTime {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Duration) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Debug for HostTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostTime({})", self.0)
    }
}

/// Counter frequency in ticks per second.
///
/// The correct value comes from the platform clock (e.g.
/// `QueryPerformanceFrequency`). [`TickRate::NANOS`] covers clocks that
/// already count nanoseconds.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickRate(u64);

impl TickRate {
    /// One tick per nanosecond.
    pub const NANOS: Self = Self(1_000_000_000);

    /// One tick per microsecond.
    pub const MICROS: Self = Self(1_000_000);

    /// Creates a tick rate from a counter frequency.
    ///
    /// # Panics
    ///
    /// Panics if `ticks_per_second` is zero.
    #[inline]
    #[must_use]
    pub const fn new(ticks_per_second: u64) -> Self {
        assert!(ticks_per_second != 0, "tick rate must not be zero");
        Self(ticks_per_second)
    }

    /// Returns the counter frequency.
    #[inline]
    #[must_use]
    pub const fn ticks_per_second(self) -> u64 {
        self.0
    }

    /// Converts a tick count to nanoseconds.
    #[inline]
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "u128 intermediate avoids overflow; truncation back to u64 is intentional"
    )]
    pub const fn ticks_to_nanos(self, ticks: u64) -> u64 {
        let wide = ticks as u128 * 1_000_000_000 / self.0 as u128;
        wide as u64
    }

    /// Converts seconds to a tick count, truncating toward zero.
    ///
    /// Negative and NaN inputs yield zero; values beyond the `u64` range
    /// saturate.
    #[inline]
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "float-to-int `as` saturates and truncation toward zero is intended"
    )]
    pub fn secs_to_ticks(self, secs: f64) -> u64 {
        (secs * self.0 as f64) as u64
    }

    /// Returns the period of a signal at `hz`, in ticks.
    ///
    /// Returns `None` when `hz` is zero, negative, or not finite, which is
    /// how an unknown display mode is usually reported.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "float-to-int `as` saturates and truncation toward zero is intended"
    )]
    pub fn period_for_hz(self, hz: f64) -> Option<Duration> {
        if !hz.is_finite() || hz <= 0.0 {
            return None;
        }
        let ticks = (self.0 as f64 / hz) as u64;
        (ticks > 0).then_some(Duration(ticks))
    }
}

impl fmt::Debug for TickRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TickRate({}/s)", self.0)
    }
}

/// A duration in platform-native ticks.
///
/// Arithmetic uses the same tick units as [`HostTime`].
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

    /// Returns `true` if this duration is zero ticks long.
    #[inline]
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Converts this duration to seconds.
    #[inline]
    #[must_use]
    pub fn as_secs_f64(self, rate: TickRate) -> f64 {
        self.0 as f64 / rate.ticks_per_second() as f64
    }

    /// Creates a duration from seconds, see [`TickRate::secs_to_ticks`].
    #[inline]
    #[must_use]
    pub fn from_secs_f64(secs: f64, rate: TickRate) -> Self {
        Self(rate.secs_to_ticks(secs))
    }

    /// Saturating addition.
    #[inline]
    #[must_use]
    pub const fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    /// Saturating subtraction.
    #[inline]
    #[must_use]
    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    /// Returns `self / rhs` as a float, or zero if `rhs` is zero.
    #[inline]
    #[must_use]
    pub fn ratio(self, rhs: Self) -> f64 {
        if rhs.0 == 0 {
            0.0
        } else {
            self.0 as f64 / rhs.0 as f64
        }
    }
}

impl Add for Duration {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Duration {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Duration {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Duration {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl fmt::Debug for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Duration({})", self.0)
    }
}
