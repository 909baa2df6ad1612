// Copyright 2026 the Framepace Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-frame delta-time estimation.
//!
//! The [`DeltaTimeEstimator`] turns present timestamps into one authoritative
//! delta per frame. It has two regimes, selected by the
//! [`VsyncVerdict`](crate::vsync::VsyncVerdict) for the frame:
//!
//! - **Vsynced.** Every present lands on a refresh boundary, so the true
//!   delta is a whole number of refresh periods. The measured delta is
//!   snapped to the nearest multiple (never zero). The rounding residual is
//!   carried into the next frame's snap and halved each frame, so a long
//!   frame followed by a short one still sums correctly without biasing
//!   later frames.
//! - **Not vsynced.** Deltas are smoothed with an exponential moving average
//!   (`1/N` weight per frame). The difference between what was reported and
//!   what really elapsed is fed back into the smoother's input so that the
//!   sum of reported deltas converges to real elapsed time.
//!
//! The smoother runs in both regimes so it is already warm when presentation
//! falls out of vsync.
//!
//! All state is integer ticks; only the refresh rate is a float.

use crate::sample::FrameSample;
use crate::time::{Duration, HostTime, TickRate};
use crate::vsync::VsyncVerdict;

/// Tuning for the [`DeltaTimeEstimator`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EstimatorConfig {
    /// EMA window `N`: each frame contributes `1/N` of the smoothed delta.
    /// Values below 1 are treated as 1.
    pub smoothing: u32,
    /// Refresh rate assumed while the display reports an unknown (zero or
    /// invalid) rate.
    pub fallback_refresh_hz: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            smoothing: 4,
            fallback_refresh_hz: 60.0,
        }
    }
}

/// The estimator's persistent state.
///
/// Signed fields are tick counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TimingState {
    /// Timestamp of the previous frame, `None` before the first frame.
    pub previous_frame_time: Option<HostTime>,
    /// Exponentially smoothed delta used while not vsynced.
    pub smoothed_non_vsync_delta: i64,
    /// Decaying residual from snapping to refresh multiples.
    pub snap_error: i64,
    /// Reported minus real elapsed time accumulated while not vsynced. Fed
    /// back into the smoother.
    pub non_vsync_error: i64,
    /// Reported minus real elapsed time since the last reset. Diagnostic
    /// only.
    pub drift: i64,
}

/// Details of one estimator step, for diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DeltaEstimate {
    /// Measured ticks since the previous frame (one refresh period on the
    /// first frame).
    pub raw_ticks: i64,
    /// The reported delta.
    pub delta: Duration,
    /// Whole refresh periods the frame was snapped to, if vsynced.
    pub refresh_multiple: Option<u64>,
    /// Refresh period used for this frame.
    pub refresh_period: Duration,
}

/// Produces a corrected delta time per presented frame.
#[derive(Clone, Debug)]
pub struct DeltaTimeEstimator {
    config: EstimatorConfig,
    state: TimingState,
    last: DeltaEstimate,
}

impl DeltaTimeEstimator {
    /// Creates an estimator with empty state.
    #[must_use]
    pub fn new(config: EstimatorConfig) -> Self {
        Self {
            config,
            state: TimingState::default(),
            last: DeltaEstimate::default(),
        }
    }

    /// Returns the refresh period for `refresh_hz`, falling back to
    /// [`EstimatorConfig::fallback_refresh_hz`] when the rate is unknown.
    #[must_use]
    pub fn refresh_period(&self, rate: TickRate, refresh_hz: f64) -> Duration {
        rate.period_for_hz(refresh_hz)
            .or_else(|| rate.period_for_hz(self.config.fallback_refresh_hz))
            .unwrap_or(Duration(rate.ticks_per_second() / 60).max(Duration(1)))
    }

    /// Consumes one frame and returns its delta.
    ///
    /// Frames must be fed in presentation order, after the vsync classifier
    /// has produced `verdict` for the same frame. `refresh_period` should
    /// come from [`refresh_period`](Self::refresh_period); a zero period
    /// disables snapping.
    pub fn update(
        &mut self,
        sample: &FrameSample,
        verdict: VsyncVerdict,
        refresh_period: Duration,
    ) -> Duration {
        let is_vsynced = verdict.is_vsynced();
        let timestamp = sample.frame_timestamp(is_vsynced);
        let period = to_signed(refresh_period.ticks());
        let st = &mut self.state;

        let raw = match st.previous_frame_time {
            Some(prev) => timestamp.signed_ticks_since(prev),
            // Nothing to measure against yet: report one refresh.
            None => period,
        };

        let mut delta = raw;
        let mut refresh_multiple = None;

        if is_vsynced && period > 0 {
            let vsyncs = div_round(raw.saturating_add(st.snap_error), period).max(1);
            let snapped = vsyncs.saturating_mul(period);
            st.snap_error = st.snap_error / 2 + raw.saturating_sub(snapped);
            st.non_vsync_error = 0;
            delta = snapped;
            refresh_multiple = Some(vsyncs.unsigned_abs());
        }

        let n = i64::from(self.config.smoothing.max(1));
        st.smoothed_non_vsync_delta = st.smoothed_non_vsync_delta.saturating_mul(n - 1) / n
            + delta.saturating_sub(st.non_vsync_error) / n;

        if !is_vsynced {
            st.non_vsync_error = st.non_vsync_error.saturating_sub(raw);
            delta = st.smoothed_non_vsync_delta.max(0);
            st.non_vsync_error = st.non_vsync_error.saturating_add(delta);
        }

        st.drift = st.drift.saturating_add(delta.saturating_sub(raw));
        st.previous_frame_time = Some(timestamp);

        let delta = Duration(delta.unsigned_abs());
        self.last = DeltaEstimate {
            raw_ticks: raw,
            delta,
            refresh_multiple,
            refresh_period,
        };
        delta
    }

    /// Returns the delta reported for the most recent frame.
    #[must_use]
    pub fn delta(&self) -> Duration {
        self.last.delta
    }

    /// Returns the details of the most recent step.
    #[must_use]
    pub fn last_estimate(&self) -> DeltaEstimate {
        self.last
    }

    /// Returns the persistent state.
    #[must_use]
    pub fn state(&self) -> &TimingState {
        &self.state
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Discards all state, e.g. after a display mode change.
    pub fn reset(&mut self) {
        self.state = TimingState::default();
        self.last = DeltaEstimate::default();
    }
}

impl Default for DeltaTimeEstimator {
    fn default() -> Self {
        Self::new(EstimatorConfig::default())
    }
}

fn to_signed(ticks: u64) -> i64 {
    i64::try_from(ticks).unwrap_or(i64::MAX)
}

/// Integer division rounding half away from zero. `den` must be positive.
fn div_round(num: i64, den: i64) -> i64 {
    let half = den / 2;
    if num >= 0 {
        num.saturating_add(half) / den
    } else {
        -(num.saturating_neg().saturating_add(half) / den)
    }
}
