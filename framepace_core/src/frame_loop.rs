// Copyright 2026 the Framepace Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-frame pacing cycle.
//!
//! [`FramePacing`] owns one of each component and runs them in strict order
//! for every presented frame:
//!
//! ```text
//!   FrameSample ──► VsyncClassifier::classify() ──► VsyncVerdict
//!                                                        │
//!                 ┌──────────────────────────────────────┘
//!                 ▼
//!   DeltaTimeEstimator::update() ──► delta ──► FixedTimestepPacer::pace()
//!                                                        │
//!                                                        ▼
//!                                    fixed_update* · variable_update? · render
//! ```
//!
//! The host creates one `FramePacing` per swap chain and feeds it after each
//! present. Nothing here is global; a display mode change is handled by
//! calling [`reset`](FramePacing::reset).

use crate::estimator::{DeltaTimeEstimator, EstimatorConfig};
use crate::pacer::{FixedTimestepPacer, FrameCallbacks, PaceOutcome, PacerConfig};
use crate::sample::FrameSample;
use crate::time::{Duration, TickRate};
use crate::trace::{DeltaTimeEvent, FrameSampleEvent, PaceEvent, Tracer, VsyncTransitionEvent};
use crate::vsync::{VsyncClassifier, VsyncConfig, VsyncVerdict};

/// Configuration for all three components, fixed at construction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PacingConfig {
    /// Vsync classifier tuning.
    pub vsync: VsyncConfig,
    /// Delta-time estimator tuning.
    pub estimator: EstimatorConfig,
    /// Fixed-timestep pacer tuning.
    pub pacer: PacerConfig,
}

impl PacingConfig {
    /// Default tuning for a simulation running at `update_rate_hz`.
    ///
    /// # Panics
    ///
    /// Panics if `update_rate_hz` is not a positive, finite number.
    #[must_use]
    pub fn new(update_rate_hz: f64) -> Self {
        Self {
            vsync: VsyncConfig::default(),
            estimator: EstimatorConfig::default(),
            pacer: PacerConfig::new(update_rate_hz),
        }
    }
}

/// What happened during one call to [`FramePacing::frame`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameReport {
    /// Index of the frame, starting at zero after construction or reset.
    pub frame_index: u64,
    /// Classifier verdict used for this frame.
    pub verdict: VsyncVerdict,
    /// Delta produced by the estimator.
    pub delta: Duration,
    /// What the pacer did with it.
    pub outcome: PaceOutcome,
}

/// Classifier, estimator and pacer wired together.
#[derive(Clone, Debug)]
pub struct FramePacing {
    config: PacingConfig,
    rate: TickRate,
    classifier: VsyncClassifier,
    estimator: DeltaTimeEstimator,
    pacer: FixedTimestepPacer,
    previous: Option<FrameSample>,
    refresh_period: Duration,
    frame_index: u64,
}

impl FramePacing {
    /// Creates the pacing state for a clock running at `rate`.
    #[must_use]
    pub fn new(config: PacingConfig, rate: TickRate) -> Self {
        let estimator = DeltaTimeEstimator::new(config.estimator);
        let refresh_period = estimator.refresh_period(rate, 0.0);
        Self {
            config,
            rate,
            classifier: VsyncClassifier::new(config.vsync),
            estimator,
            pacer: FixedTimestepPacer::new(config.pacer, rate),
            previous: None,
            refresh_period,
            frame_index: 0,
        }
    }

    /// Runs one pacing cycle for a presented frame.
    ///
    /// `refresh_rate_hz` is the display's nominal refresh rate; zero or any
    /// other invalid value means unknown.
    pub fn frame(
        &mut self,
        sample: FrameSample,
        refresh_rate_hz: f64,
        callbacks: &mut impl FrameCallbacks,
        tracer: &mut Tracer<'_>,
    ) -> FrameReport {
        let frame_index = self.frame_index;

        let (verdict, observation) = match &self.previous {
            Some(prev) => (
                self.classifier.classify(&sample, prev, self.rate),
                self.classifier.last_observation(),
            ),
            None => (self.classifier.verdict(), None),
        };
        tracer.frame_sample(&FrameSampleEvent::new(
            frame_index,
            &sample,
            observation,
            verdict,
        ));
        if observation.is_some_and(|o| o.transitioned) {
            tracer.vsync_transition(&VsyncTransitionEvent {
                frame_index,
                timestamp: sample.present_time,
                state: verdict.state,
            });
        }

        self.refresh_period = self.estimator.refresh_period(self.rate, refresh_rate_hz);
        let delta = self.estimator.update(&sample, verdict, self.refresh_period);
        let timestamp = sample.frame_timestamp(verdict.is_vsynced());
        tracer.delta_time(&DeltaTimeEvent::new(
            frame_index,
            timestamp,
            verdict.is_vsynced(),
            &self.estimator.last_estimate(),
            self.estimator.state(),
        ));

        let outcome = self.pacer.pace(delta, callbacks);
        tracer.pace(&PaceEvent::new(frame_index, timestamp, &outcome));

        self.previous = Some(sample);
        self.frame_index += 1;

        FrameReport {
            frame_index,
            verdict,
            delta,
            outcome,
        }
    }

    /// Returns the delta reported for the most recent frame.
    #[must_use]
    pub fn delta(&self) -> Duration {
        self.estimator.delta()
    }

    /// Returns the most recent delta in seconds.
    #[must_use]
    pub fn delta_secs(&self) -> f64 {
        self.estimator.delta().as_secs_f64(self.rate)
    }

    /// Returns the refresh period used for the most recent frame.
    #[must_use]
    pub fn refresh_period(&self) -> Duration {
        self.refresh_period
    }

    /// Returns the current vsync verdict.
    #[must_use]
    pub fn verdict(&self) -> VsyncVerdict {
        self.classifier.verdict()
    }

    /// Returns the estimator.
    #[must_use]
    pub fn estimator(&self) -> &DeltaTimeEstimator {
        &self.estimator
    }

    /// Returns the pacer.
    #[must_use]
    pub fn pacer(&self) -> &FixedTimestepPacer {
        &self.pacer
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &PacingConfig {
        &self.config
    }

    /// Returns the tick rate.
    #[must_use]
    pub fn tick_rate(&self) -> TickRate {
        self.rate
    }

    /// Returns how many frames have been paced since construction or the
    /// last reset.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_index
    }

    /// Starts over as if freshly constructed, e.g. after the display mode
    /// or swap chain changed.
    pub fn reset(&mut self) {
        self.classifier.reset();
        self.estimator.reset();
        self.pacer.reset();
        self.previous = None;
        self.refresh_period = self.estimator.refresh_period(self.rate, 0.0);
        self.frame_index = 0;
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;
    use crate::pacer::Callbacks;
    use crate::sample::FrameStatistics;
    use crate::time::HostTime;
    use crate::trace::TraceSink;
    use crate::vsync::VsyncState;

    // 1 MHz clock at 100 Hz refresh: 10_000 ticks per refresh.
    const RATE: TickRate = TickRate::new(1_000_000);
    const PERIOD: u64 = 10_000;

    fn synced(i: u32) -> FrameSample {
        let t = HostTime(100_000 + u64::from(i) * PERIOD);
        FrameSample::with_stats(
            t,
            FrameStatistics {
                sync_time: t,
                present_count: i + 1,
                present_refresh_count: i + 1,
                sync_refresh_count: i + 1,
            },
        )
    }

    fn tearing(i: u32, t: u64) -> FrameSample {
        FrameSample::with_stats(
            HostTime(t),
            FrameStatistics {
                sync_time: HostTime(100_000 + u64::from(i) * PERIOD),
                present_count: 1,
                present_refresh_count: i + 1,
                sync_refresh_count: i + 1,
            },
        )
    }

    #[derive(Default)]
    struct Counts {
        fixed: u32,
        variable: u32,
        render: u32,
    }

    impl FrameCallbacks for Counts {
        fn fixed_update(&mut self, _dt: f64) {
            self.fixed += 1;
        }

        fn variable_update(&mut self, _dt: f64) {
            self.variable += 1;
        }

        fn render(&mut self, _dt: f64, _interpolation: f64) {
            self.render += 1;
        }
    }

    #[test]
    fn vsynced_frames_pace_one_step_each() {
        let mut pacing = FramePacing::new(PacingConfig::new(100.0), RATE);
        let mut counts = Counts::default();
        for i in 0..50 {
            let report = pacing.frame(synced(i), 100.0, &mut counts, &mut Tracer::none());
            assert!(report.verdict.is_vsynced());
            assert_eq!(report.delta, Duration(PERIOD));
        }
        assert_eq!(counts.render, 50);
        assert_eq!(counts.variable, 50);
        // Strict drain keeps one step banked.
        assert_eq!(counts.fixed, 49);
        assert_eq!(pacing.frame_count(), 50);
        assert!((pacing.delta_secs() - 0.01).abs() < 1e-12);
    }

    #[test]
    fn tearing_drops_out_of_vsync() {
        let mut pacing = FramePacing::new(PacingConfig::new(60.0), RATE);
        let mut counts = Counts::default();
        pacing.frame(synced(0), 100.0, &mut counts, &mut Tracer::none());
        let mut t = 100_000;
        let mut left_at = None;
        for i in 1..20 {
            t += 7_300;
            let report = pacing.frame(tearing(i, t), 100.0, &mut counts, &mut Tracer::none());
            if left_at.is_none() && !report.verdict.is_vsynced() {
                left_at = Some(i);
            }
        }
        assert_eq!(left_at, Some(4));
        assert_eq!(pacing.verdict().state, VsyncState::NotVsynced);
    }

    #[test]
    fn first_frame_is_not_classified() {
        let mut pacing = FramePacing::new(PacingConfig::new(60.0), RATE);
        let report = pacing.frame(
            tearing(0, 123_456),
            100.0,
            &mut Counts::default(),
            &mut Tracer::none(),
        );
        assert_eq!(report.verdict, VsyncVerdict::ASSUMED_VSYNCED);
        assert_eq!(report.frame_index, 0);
    }

    #[test]
    fn unknown_refresh_rate_uses_fallback() {
        let mut pacing = FramePacing::new(PacingConfig::new(60.0), RATE);
        pacing.frame(synced(0), 0.0, &mut Counts::default(), &mut Tracer::none());
        assert_eq!(pacing.refresh_period(), Duration(16_666));
    }

    #[test]
    fn reset_starts_over() {
        let mut pacing = FramePacing::new(PacingConfig::new(60.0), RATE);
        for i in 0..10 {
            pacing.frame(synced(i), 100.0, &mut Counts::default(), &mut Tracer::none());
        }
        pacing.reset();
        assert_eq!(pacing.frame_count(), 0);
        assert_eq!(pacing.pacer().accumulator(), Duration::ZERO);
        assert_eq!(pacing.estimator().state().previous_frame_time, None);
        assert_eq!(pacing.verdict(), VsyncVerdict::ASSUMED_VSYNCED);
    }

    #[test]
    fn closures_receive_fixed_step() {
        let mut steps = Vec::new();
        let mut pacing = FramePacing::new(PacingConfig::new(50.0), RATE);
        let mut cb = Callbacks::new(|dt| steps.push(dt), |_| {}, |_, _| {});
        for i in 0..4 {
            pacing.frame(synced(i), 100.0, &mut cb, &mut Tracer::none());
        }
        drop(cb);
        assert_eq!(steps, [0.02]);
    }

    #[derive(Default)]
    struct EventLog {
        samples: u32,
        transitions: Vec<(u64, VsyncState)>,
        deltas: Vec<Duration>,
        paces: u32,
    }

    impl TraceSink for EventLog {
        fn on_frame_sample(&mut self, _e: &FrameSampleEvent) {
            self.samples += 1;
        }

        fn on_vsync_transition(&mut self, e: &VsyncTransitionEvent) {
            self.transitions.push((e.frame_index, e.state));
        }

        fn on_delta_time(&mut self, e: &DeltaTimeEvent) {
            self.deltas.push(e.delta);
        }

        fn on_pace(&mut self, _e: &PaceEvent) {
            self.paces += 1;
        }
    }

    #[cfg(feature = "trace")]
    #[test]
    fn events_follow_the_cycle() {
        let mut log = EventLog::default();
        let mut pacing = FramePacing::new(PacingConfig::new(60.0), RATE);
        {
            let mut tracer = Tracer::new(&mut log);
            pacing.frame(synced(0), 100.0, &mut Counts::default(), &mut tracer);
            let mut t = 100_000;
            for i in 1..6 {
                t += 7_300;
                pacing.frame(tearing(i, t), 100.0, &mut Counts::default(), &mut tracer);
            }
        }
        assert_eq!(log.samples, 6);
        assert_eq!(log.paces, 6);
        assert_eq!(log.deltas.len(), 6);
        assert_eq!(log.deltas[0], Duration(PERIOD));
        assert_eq!(log.transitions, [(4, VsyncState::NotVsynced)]);
    }

    // Workspace builds unify `trace` on through framepace_debug, so this only
    // runs with `cargo test -p framepace_core`.
    #[cfg(not(feature = "trace"))]
    #[test]
    fn events_are_compiled_out() {
        let mut log = EventLog::default();
        let mut pacing = FramePacing::new(PacingConfig::new(60.0), RATE);
        pacing.frame(
            synced(0),
            100.0,
            &mut Counts::default(),
            &mut Tracer::new(&mut log),
        );
        assert_eq!(log.samples, 0);
        assert_eq!(log.paces, 0);
        assert!(log.deltas.is_empty() && log.transitions.is_empty());
    }
}
