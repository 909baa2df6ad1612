// Copyright 2026 the Framepace Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A deterministic stand-in for a swap chain and its display.
//!
//! [`SimulatedDisplay`] keeps a true timeline of vertical blanks and
//! presents, and hands out the [`FrameSample`]s a real driver would report
//! for it. Randomness only affects how present times are *measured*, never
//! the true timeline, so [`last_true_delta`](SimulatedDisplay::last_true_delta)
//! is always exact.
//!
//! Each frame the simulated application works for a fixed time after the
//! previous present, then presents:
//!
//! - normally, presentation waits for the next vertical blank, the driver
//!   sync time is that blank and the present counter advances;
//! - with [`tearing`](PathologyToggles::tearing), the present happens as soon
//!   as the work is done, the sync time is the last blank before it and the
//!   present counter stays stuck.
//!
//! The driver reports no statistics for the first
//! [`STATS_WARMUP_FRAMES`] frames, or never with
//! [`missing_stats`](PathologyToggles::missing_stats).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use framepace_core::sample::{FrameSample, FrameStatistics};
use framepace_core::time::{Duration, HostTime, TickRate};

use crate::PathologyToggles;

/// Every this many frames, one frame stalls when stalls are enabled.
pub const STALL_INTERVAL: u64 = 240;
/// Extra work added to a stalled frame, in seconds.
pub const STALL_SECS: f64 = 0.3;
/// Frames between refresh-rate switches when refresh variation is enabled.
pub const REFRESH_SWITCH_INTERVAL: u64 = 300;
/// Frames at start-up for which the driver has no statistics yet.
pub const STATS_WARMUP_FRAMES: u64 = 2;

/// Upper bound of the always-present delay between a present and its
/// measurement.
const PRESENT_LATENCY_SECS: f64 = 50e-6;
/// Share of frames whose measurement is delayed by scheduling jitter.
const JITTER_PROBABILITY: f64 = 0.25;
const JITTER_MIN_SECS: f64 = 0.2e-3;
const JITTER_MAX_SECS: f64 = 2e-3;

/// Simulated clock source.
#[derive(Clone, Debug)]
pub struct SimulatedDisplay {
    rate: TickRate,
    base_refresh_hz: f64,
    boosted: bool,
    period: Duration,
    toggles: PathologyToggles,
    work: Duration,
    rng: StdRng,
    start: HostTime,
    last_vblank: HostTime,
    refresh_count: u32,
    present_count: u32,
    true_present: HostTime,
    last_true_delta: Duration,
    frame: u64,
}

impl SimulatedDisplay {
    /// Creates a display refreshing at `refresh_hz` with a clock running at
    /// `rate`. The same `seed` always produces the same samples.
    ///
    /// Frame work defaults to 40% of a refresh period, so a healthy
    /// application presents once per refresh.
    ///
    /// # Panics
    ///
    /// Panics if `refresh_hz` does not give a refresh period of at least one
    /// tick.
    #[must_use]
    pub fn new(refresh_hz: f64, rate: TickRate, seed: u64) -> Self {
        let Some(period) = rate.period_for_hz(refresh_hz) else {
            panic!("refresh rate must be positive and finite, got {refresh_hz}");
        };
        let start = HostTime(rate.ticks_per_second());
        Self {
            rate,
            base_refresh_hz: refresh_hz,
            boosted: false,
            period,
            toggles: PathologyToggles::default(),
            work: Duration(period.ticks() * 2 / 5),
            rng: StdRng::seed_from_u64(seed),
            start,
            last_vblank: start,
            refresh_count: 0,
            present_count: 0,
            true_present: start,
            last_true_delta: Duration::ZERO,
            frame: 0,
        }
    }

    /// Sets the pathologies to simulate.
    #[must_use]
    pub fn with_toggles(mut self, toggles: PathologyToggles) -> Self {
        self.toggles = toggles;
        self
    }

    /// Sets how long the application works on each frame.
    #[must_use]
    pub fn with_frame_work(mut self, work: Duration) -> Self {
        self.work = work;
        self
    }

    /// Changes the pathologies from the next frame on.
    pub fn set_toggles(&mut self, toggles: PathologyToggles) {
        self.toggles = toggles;
    }

    /// Returns the active pathologies.
    #[must_use]
    pub fn toggles(&self) -> PathologyToggles {
        self.toggles
    }

    /// Returns the clock rate.
    #[must_use]
    pub fn tick_rate(&self) -> TickRate {
        self.rate
    }

    /// Returns the nominal refresh rate for the most recent frame.
    #[must_use]
    pub fn refresh_hz(&self) -> f64 {
        if self.boosted {
            self.base_refresh_hz * 2.0
        } else {
            self.base_refresh_hz
        }
    }

    /// Returns the current refresh period.
    #[must_use]
    pub fn refresh_period(&self) -> Duration {
        self.period
    }

    /// Returns how many frames have been presented.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Returns the true time between the last two presents (for the first
    /// frame, since start-up).
    #[must_use]
    pub fn last_true_delta(&self) -> Duration {
        self.last_true_delta
    }

    /// Returns the true time from start-up to the most recent present.
    #[must_use]
    pub fn true_elapsed(&self) -> Duration {
        self.true_present.saturating_duration_since(self.start)
    }

    /// Simulates one frame and returns what the driver reports for it.
    pub fn next_frame(&mut self) -> FrameSample {
        let frame = self.frame;
        self.frame += 1;

        if self.toggles.vary_refresh && frame > 0 && frame % REFRESH_SWITCH_INTERVAL == 0 {
            self.boosted = !self.boosted;
            self.period = self
                .rate
                .period_for_hz(self.refresh_hz())
                .unwrap_or(self.period);
        }

        let mut work = self.work;
        if self.toggles.stalls && frame % STALL_INTERVAL == STALL_INTERVAL - 1 {
            work += Duration::from_secs_f64(STALL_SECS, self.rate);
        }
        let ready = self.true_present + work;

        let (present, sync_time) = if self.toggles.tearing {
            self.advance_to_blank_before(ready);
            (ready, self.last_vblank)
        } else {
            let blank = self.advance_to_blank_after(ready);
            self.present_count = self.present_count.wrapping_add(1);
            (blank, blank)
        };

        self.last_true_delta = present.saturating_duration_since(self.true_present);
        self.true_present = present;

        let measured = present + self.measurement_delay();
        let stats = if frame < STATS_WARMUP_FRAMES || self.toggles.missing_stats {
            FrameStatistics::default()
        } else {
            FrameStatistics {
                sync_time,
                present_count: self.present_count,
                present_refresh_count: self.refresh_count,
                sync_refresh_count: self.refresh_count,
            }
        };
        FrameSample::with_stats(measured, stats)
    }

    /// Moves the blank grid to the last blank at or before `t`.
    fn advance_to_blank_before(&mut self, t: HostTime) {
        let behind = t.saturating_duration_since(self.last_vblank).ticks();
        self.step_blanks(behind / self.period.ticks());
    }

    /// Moves the blank grid to the first blank strictly after the current
    /// one that is not before `t`, and returns it.
    fn advance_to_blank_after(&mut self, t: HostTime) -> HostTime {
        let behind = t.saturating_duration_since(self.last_vblank).ticks();
        self.step_blanks(behind.div_ceil(self.period.ticks()).max(1));
        self.last_vblank
    }

    fn step_blanks(&mut self, n: u64) {
        self.last_vblank += Duration(n.saturating_mul(self.period.ticks()));
        let n = u32::try_from(n).unwrap_or(u32::MAX);
        self.refresh_count = self.refresh_count.wrapping_add(n);
    }

    fn measurement_delay(&mut self) -> Duration {
        let mut secs = self.rng.gen_range(0.0..PRESENT_LATENCY_SECS);
        if self.toggles.timer_jitter && self.rng.gen_bool(JITTER_PROBABILITY) {
            secs += self.rng.gen_range(JITTER_MIN_SECS..JITTER_MAX_SECS);
        }
        Duration::from_secs_f64(secs, self.rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: TickRate = TickRate::new(10_000_000);
    // 10 MHz at 60 Hz.
    const PERIOD: u64 = 166_666;

    #[test]
    fn vsynced_presents_land_on_blanks() {
        let mut d = SimulatedDisplay::new(60.0, RATE, 1);
        assert_eq!(d.refresh_period(), Duration(PERIOD));
        for i in 0..20 {
            let s = d.next_frame();
            assert_eq!(d.last_true_delta(), Duration(PERIOD));
            if i < STATS_WARMUP_FRAMES {
                assert!(!s.stats.is_available());
                continue;
            }
            let offset = s.sync_offset_ticks().unwrap();
            assert!((0..=500).contains(&offset), "offset {offset}");
            assert_eq!(s.stats.present_count, u32::try_from(i + 1).unwrap());
        }
        assert_eq!(d.true_elapsed(), Duration(20 * PERIOD));
    }

    #[test]
    fn tearing_presents_freeze_the_counter() {
        let toggles = PathologyToggles {
            tearing: true,
            ..PathologyToggles::default()
        };
        let mut d = SimulatedDisplay::new(60.0, RATE, 2)
            .with_toggles(toggles)
            .with_frame_work(Duration(70_000));
        let mut last = None;
        for _ in 0..10 {
            let s = d.next_frame();
            assert_eq!(d.last_true_delta(), Duration(70_000));
            assert_eq!(s.stats.present_count, 0);
            if s.stats.is_available() {
                let offset = s.sync_offset_ticks().unwrap();
                assert!((0..=PERIOD as i64 + 500).contains(&offset), "offset {offset}");
            }
            last = Some(s);
        }
        assert!(last.unwrap().stats.is_available());
    }

    #[test]
    fn stalls_are_periodic() {
        let toggles = PathologyToggles {
            stalls: true,
            ..PathologyToggles::default()
        };
        let mut d = SimulatedDisplay::new(60.0, RATE, 3).with_toggles(toggles);
        let mut long = Vec::new();
        for i in 0..(2 * STALL_INTERVAL) {
            d.next_frame();
            if d.last_true_delta() > Duration(PERIOD) {
                long.push(i);
            }
        }
        assert_eq!(long, [STALL_INTERVAL - 1, 2 * STALL_INTERVAL - 1]);
    }

    #[test]
    fn refresh_switches_and_back() {
        let toggles = PathologyToggles {
            vary_refresh: true,
            ..PathologyToggles::default()
        };
        let mut d = SimulatedDisplay::new(60.0, RATE, 4).with_toggles(toggles);
        for _ in 0..REFRESH_SWITCH_INTERVAL {
            d.next_frame();
        }
        assert_eq!(d.refresh_hz(), 60.0);
        d.next_frame();
        assert_eq!(d.refresh_hz(), 120.0);
        assert_eq!(d.refresh_period(), Duration(83_333));
        assert_eq!(d.last_true_delta(), Duration(83_333));
        for _ in 1..REFRESH_SWITCH_INTERVAL {
            d.next_frame();
        }
        d.next_frame();
        assert_eq!(d.refresh_hz(), 60.0);
    }

    #[test]
    fn missing_stats_never_report() {
        let toggles = PathologyToggles {
            missing_stats: true,
            ..PathologyToggles::default()
        };
        let mut d = SimulatedDisplay::new(60.0, RATE, 5).with_toggles(toggles);
        for _ in 0..50 {
            assert!(!d.next_frame().stats.is_available());
        }
    }

    #[test]
    fn same_seed_same_samples() {
        let toggles = PathologyToggles {
            timer_jitter: true,
            ..PathologyToggles::default()
        };
        let mut a = SimulatedDisplay::new(144.0, RATE, 99).with_toggles(toggles);
        let mut b = SimulatedDisplay::new(144.0, RATE, 99).with_toggles(toggles);
        for _ in 0..100 {
            assert_eq!(a.next_frame(), b.next_frame());
        }
    }

    #[test]
    #[should_panic(expected = "refresh rate must be positive")]
    fn zero_refresh_panics() {
        let _ = SimulatedDisplay::new(0.0, RATE, 0);
    }
}
