// Copyright 2026 the Framepace Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fixed-timestep pacing.
//!
//! The [`FixedTimestepPacer`] banks each frame's delta in an accumulator and
//! drains it in fixed-size steps, so simulation code always sees the same
//! step no matter how fast frames are presented. Per call to
//! [`pace`](FixedTimestepPacer::pace) the host's [`FrameCallbacks`] receive:
//!
//! 1. zero or more [`fixed_update`](FrameCallbacks::fixed_update) calls, each
//!    with the nominal step `1 / update_rate_hz`;
//! 2. at most one [`variable_update`](FrameCallbacks::variable_update) with
//!    the real elapsed seconds, skipped when no time elapsed;
//! 3. exactly one [`render`](FrameCallbacks::render) with the elapsed seconds
//!    and the fraction of a fixed step left in the accumulator, for
//!    interpolating between the previous and current simulation state.
//!
//! A delta longer than [`PacerConfig::hitch_threshold_secs`] (a debugger
//! pause, an OS stall) is treated as a hitch: it is replaced by exactly one
//! fixed step and the banked time is discarded. Catching up on a long stall
//! would mean a burst of fixed updates that makes the next frame even later.

use core::fmt;

use crate::time::{Duration, TickRate};

/// Tuning for the [`FixedTimestepPacer`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PacerConfig {
    /// Fixed simulation rate.
    pub update_rate_hz: f64,
    /// Deltas longer than this are treated as hitches, in seconds.
    pub hitch_threshold_secs: f64,
}

impl PacerConfig {
    /// Creates a configuration for the given simulation rate with the default
    /// quarter-second hitch threshold.
    ///
    /// # Panics
    ///
    /// Panics if `update_rate_hz` is not a positive, finite number.
    #[must_use]
    pub fn new(update_rate_hz: f64) -> Self {
        assert!(
            update_rate_hz.is_finite() && update_rate_hz > 0.0,
            "update rate must be positive and finite, got {update_rate_hz}"
        );
        Self {
            update_rate_hz,
            hitch_threshold_secs: 0.25,
        }
    }

    /// Returns the step passed to every fixed update, in seconds.
    #[inline]
    #[must_use]
    pub fn fixed_step_secs(&self) -> f64 {
        1.0 / self.update_rate_hz
    }
}

/// Receives the per-frame callbacks issued by the pacer.
///
/// Only [`render`](Self::render) is required; the update methods default to
/// no-ops.
pub trait FrameCallbacks {
    /// Advances the simulation by one fixed step of `dt` seconds.
    fn fixed_update(&mut self, dt: f64) {
        _ = dt;
    }

    /// Advances frame-rate dependent state by the real elapsed `dt` seconds.
    fn variable_update(&mut self, dt: f64) {
        _ = dt;
    }

    /// Draws the frame. `interpolation` is in `[0, 1]` in steady state and
    /// says how far the current time lies between the last two fixed steps.
    fn render(&mut self, dt: f64, interpolation: f64);
}

/// Adapts three closures to [`FrameCallbacks`].
pub struct Callbacks<F, V, R> {
    /// Called for each fixed step.
    pub fixed_update: F,
    /// Called once per frame with real elapsed time.
    pub variable_update: V,
    /// Called once per frame to draw.
    pub render: R,
}

impl<F, V, R> Callbacks<F, V, R>
where
    F: FnMut(f64),
    V: FnMut(f64),
    R: FnMut(f64, f64),
{
    /// Bundles the three callbacks.
    pub fn new(fixed_update: F, variable_update: V, render: R) -> Self {
        Self {
            fixed_update,
            variable_update,
            render,
        }
    }
}

impl<F, V, R> FrameCallbacks for Callbacks<F, V, R>
where
    F: FnMut(f64),
    V: FnMut(f64),
    R: FnMut(f64, f64),
{
    fn fixed_update(&mut self, dt: f64) {
        (self.fixed_update)(dt);
    }

    fn variable_update(&mut self, dt: f64) {
        (self.variable_update)(dt);
    }

    fn render(&mut self, dt: f64, interpolation: f64) {
        (self.render)(dt, interpolation);
    }
}

impl<F, V, R> fmt::Debug for Callbacks<F, V, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks").finish_non_exhaustive()
    }
}

/// What one call to [`FixedTimestepPacer::pace`] did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PaceOutcome {
    /// Delta actually consumed (one fixed step after a hitch).
    pub delta: Duration,
    /// Number of fixed updates issued.
    pub fixed_steps: u32,
    /// Whether the input delta was discarded as a hitch.
    pub hitch: bool,
    /// Time left banked after draining.
    pub accumulator: Duration,
    /// Fraction passed to [`FrameCallbacks::render`].
    pub interpolation: f64,
}

/// Drives fixed-rate simulation from variable-rate frames.
#[derive(Clone, Debug)]
pub struct FixedTimestepPacer {
    config: PacerConfig,
    rate: TickRate,
    desired_frame: Duration,
    hitch_threshold: Duration,
    accumulator: Duration,
}

impl FixedTimestepPacer {
    /// Creates a pacer with an empty accumulator.
    #[must_use]
    pub fn new(config: PacerConfig, rate: TickRate) -> Self {
        let desired_frame = rate
            .period_for_hz(config.update_rate_hz)
            .unwrap_or(Duration(1));
        Self {
            config,
            rate,
            desired_frame,
            hitch_threshold: Duration::from_secs_f64(config.hitch_threshold_secs, rate),
            accumulator: Duration::ZERO,
        }
    }

    /// Runs one frame's worth of callbacks for `delta`.
    pub fn pace(&mut self, delta: Duration, callbacks: &mut impl FrameCallbacks) -> PaceOutcome {
        let mut delta = delta;
        let hitch = delta > self.hitch_threshold;
        if hitch {
            delta = self.desired_frame;
            self.accumulator = self.desired_frame;
        }

        self.accumulator = self.accumulator.saturating_add(delta);

        let step = self.config.fixed_step_secs();
        let mut fixed_steps = 0_u32;
        while self.accumulator > self.desired_frame {
            self.accumulator -= self.desired_frame;
            callbacks.fixed_update(step);
            fixed_steps += 1;
        }

        let dt = delta.as_secs_f64(self.rate);
        if !delta.is_zero() {
            callbacks.variable_update(dt);
        }

        let interpolation = self.interpolation();
        callbacks.render(dt, interpolation);

        PaceOutcome {
            delta,
            fixed_steps,
            hitch,
            accumulator: self.accumulator,
            interpolation,
        }
    }

    /// Returns the fraction of a fixed step currently banked.
    #[must_use]
    pub fn interpolation(&self) -> f64 {
        self.accumulator.ratio(self.desired_frame)
    }

    /// Returns the banked time.
    #[must_use]
    pub fn accumulator(&self) -> Duration {
        self.accumulator
    }

    /// Returns the length of one fixed step in ticks.
    #[must_use]
    pub fn desired_frame(&self) -> Duration {
        self.desired_frame
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &PacerConfig {
        &self.config
    }

    /// Empties the accumulator.
    pub fn reset(&mut self) {
        self.accumulator = Duration::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;

    const RATE: TickRate = TickRate::new(1_000_000);

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Fixed(f64),
        Variable(f64),
        Render(f64, f64),
    }

    #[derive(Default)]
    struct Log(Vec<Call>);

    impl FrameCallbacks for Log {
        fn fixed_update(&mut self, dt: f64) {
            self.0.push(Call::Fixed(dt));
        }

        fn variable_update(&mut self, dt: f64) {
            self.0.push(Call::Variable(dt));
        }

        fn render(&mut self, dt: f64, interpolation: f64) {
            self.0.push(Call::Render(dt, interpolation));
        }
    }

    impl Log {
        fn count_fixed(&self) -> usize {
            self.0.iter().filter(|c| matches!(c, Call::Fixed(_))).count()
        }

        fn count_variable(&self) -> usize {
            self.0.iter().filter(|c| matches!(c, Call::Variable(_))).count()
        }

        fn count_render(&self) -> usize {
            self.0.iter().filter(|c| matches!(c, Call::Render(..))).count()
        }
    }

    #[test]
    fn three_steps_per_frame_at_steady_state() {
        let mut pacer = FixedTimestepPacer::new(PacerConfig::new(100.0), RATE);
        assert_eq!(pacer.desired_frame(), Duration(10_000));
        let delta = Duration(30_000);

        // Strict drain: starting empty, one step stays banked.
        let mut log = Log::default();
        let out = pacer.pace(delta, &mut log);
        assert_eq!(out.fixed_steps, 2);
        assert_eq!(out.accumulator, Duration(10_000));

        for _ in 0..10 {
            let mut log = Log::default();
            let out = pacer.pace(delta, &mut log);
            assert_eq!(out.fixed_steps, 3);
            assert_eq!(log.count_fixed(), 3);
            assert_eq!(log.count_variable(), 1);
            assert_eq!(log.count_render(), 1);
            for call in &log.0[..3] {
                assert_eq!(call, &Call::Fixed(0.01));
            }
            assert_eq!(log.0[3], Call::Variable(0.03));
            assert_eq!(log.0[4], Call::Render(0.03, 1.0));
        }
    }

    #[test]
    fn hitch_runs_exactly_one_step() {
        let mut pacer = FixedTimestepPacer::new(PacerConfig::new(60.0), RATE);
        let desired = pacer.desired_frame();
        assert_eq!(desired, Duration(16_666));

        let mut log = Log::default();
        let out = pacer.pace(Duration(1_000_000), &mut log);
        assert!(out.hitch);
        assert_eq!(out.fixed_steps, 1);
        assert_eq!(out.delta, desired);
        assert_eq!(log.count_fixed(), 1);
        assert_eq!(log.0[1], Call::Variable(desired.as_secs_f64(RATE)));
        assert_eq!(log.0[2], Call::Render(desired.as_secs_f64(RATE), 1.0));
    }

    #[test]
    fn hitch_discards_banked_time() {
        let mut pacer = FixedTimestepPacer::new(PacerConfig::new(100.0), RATE);
        pacer.pace(Duration(19_000), &mut Log::default());
        assert_eq!(pacer.accumulator(), Duration(9_000));

        let out = pacer.pace(Duration(300_000), &mut Log::default());
        assert!(out.hitch);
        assert_eq!(out.fixed_steps, 1);
        assert_eq!(pacer.accumulator(), Duration(10_000));
    }

    #[test]
    fn quarter_second_is_not_a_hitch() {
        let mut pacer = FixedTimestepPacer::new(PacerConfig::new(100.0), RATE);
        let out = pacer.pace(Duration(250_000), &mut Log::default());
        assert!(!out.hitch);
        assert_eq!(out.fixed_steps, 24);
    }

    #[test]
    fn zero_delta_only_renders() {
        let mut pacer = FixedTimestepPacer::new(PacerConfig::new(100.0), RATE);
        let mut log = Log::default();
        let out = pacer.pace(Duration::ZERO, &mut log);
        assert_eq!(out.fixed_steps, 0);
        assert_eq!(log.0, [Call::Render(0.0, 0.0)]);
    }

    #[test]
    fn interpolation_tracks_partial_step() {
        let mut pacer = FixedTimestepPacer::new(PacerConfig::new(100.0), RATE);
        let mut log = Log::default();
        let out = pacer.pace(Duration(2_500), &mut log);
        assert_eq!(out.fixed_steps, 0);
        assert!((out.interpolation - 0.25).abs() < 1e-12);
        assert_eq!(log.0.len(), 2, "variable update and render");
    }

    #[test]
    fn closure_callbacks_are_ordered() {
        let mut order = Vec::new();
        {
            let order = core::cell::RefCell::new(&mut order);
            let mut cb = Callbacks::new(
                |_| order.borrow_mut().push('f'),
                |_| order.borrow_mut().push('v'),
                |_, _| order.borrow_mut().push('r'),
            );
            let mut pacer = FixedTimestepPacer::new(PacerConfig::new(50.0), RATE);
            pacer.pace(Duration(45_000), &mut cb);
        }
        assert_eq!(order, ['f', 'f', 'v', 'r']);
    }

    #[test]
    #[should_panic(expected = "update rate must be positive")]
    fn zero_update_rate_panics() {
        let _ = PacerConfig::new(0.0);
    }
}
