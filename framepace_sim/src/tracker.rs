// Copyright 2026 the Framepace Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pacing-quality metrics and grading.
//!
//! [`PacingTracker`] compares what the pacing engine reported for each frame
//! against the true frame time from the clock source and grades the result.

use framepace_core::frame_loop::FrameReport;
use framepace_core::time::{Duration, TickRate};
use framepace_core::vsync::VsyncState;

/// Letter grade for pacing quality.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum PacingGrade {
    /// Reported deltas match real time and are steady.
    A,
    /// Small errors or some judder.
    B,
    /// Noticeable judder.
    C,
    /// Poor pacing.
    D,
}

impl PacingGrade {
    /// Returns a short label for HUD rendering.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }
}

/// Aggregated report returned by [`PacingTracker::observe`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PacingReport {
    /// Current grade.
    pub grade: PacingGrade,
    /// Total frames observed.
    pub frames: u64,
    /// Frames paced while the verdict was vsynced.
    pub vsynced_frames: u64,
    /// Number of verdict state changes.
    pub transitions: u64,
    /// Frames the pacer treated as hitches.
    pub hitches: u64,
    /// Fixed updates issued.
    pub fixed_steps: u64,
    /// Sum of reported minus sum of real frame times, in ms.
    pub drift_ms: f64,
    /// Mean of `|reported - real|` per frame, in ms.
    pub mean_abs_error_ms: f64,
    /// Mean change of reported delta from one frame to the next, in ms.
    pub mean_jitter_ms: f64,
}

/// Rolling pacing tracker with fixed-size reported-delta history.
#[derive(Debug)]
pub struct PacingTracker<const N: usize> {
    rate: TickRate,
    deltas_ms: [f64; N],
    cursor: usize,
    frames: u64,
    vsynced_frames: u64,
    transitions: u64,
    hitches: u64,
    fixed_steps: u64,
    drift_ticks: i128,
    abs_error_ms: f64,
    jitter_ms: f64,
    prev_delta_ms: Option<f64>,
    prev_state: Option<VsyncState>,
}

impl<const N: usize> PacingTracker<N> {
    /// Creates a tracker with `seed_delta_ms` prefilled in the ring buffer.
    #[must_use]
    pub const fn new(rate: TickRate, seed_delta_ms: f64) -> Self {
        Self {
            rate,
            deltas_ms: [seed_delta_ms; N],
            cursor: 0,
            frames: 0,
            vsynced_frames: 0,
            transitions: 0,
            hitches: 0,
            fixed_steps: 0,
            drift_ticks: 0,
            abs_error_ms: 0.0,
            jitter_ms: 0.0,
            prev_delta_ms: None,
            prev_state: None,
        }
    }

    /// Observes one paced frame together with its true duration and returns
    /// an updated report.
    pub fn observe(&mut self, frame: &FrameReport, real_delta: Duration) -> PacingReport {
        let delta_ms = self.to_ms(frame.delta);
        let real_ms = self.to_ms(real_delta);

        self.frames = self.frames.saturating_add(1);
        if N > 0 {
            self.deltas_ms[self.cursor % N] = delta_ms;
            self.cursor = (self.cursor + 1) % N;
        }

        if frame.verdict.is_vsynced() {
            self.vsynced_frames += 1;
        }
        if self.prev_state.is_some_and(|s| s != frame.verdict.state) {
            self.transitions += 1;
        }
        self.prev_state = Some(frame.verdict.state);

        if frame.outcome.hitch {
            self.hitches += 1;
        }
        self.fixed_steps += u64::from(frame.outcome.fixed_steps);

        self.drift_ticks += i128::from(frame.delta.ticks()) - i128::from(real_delta.ticks());
        self.abs_error_ms += (delta_ms - real_ms).abs();
        if let Some(prev) = self.prev_delta_ms {
            self.jitter_ms += (delta_ms - prev).abs();
        }
        self.prev_delta_ms = Some(delta_ms);

        self.report()
    }

    /// Returns the report for everything observed so far.
    #[must_use]
    pub fn report(&self) -> PacingReport {
        let frames = self.frames.max(1) as f64;
        let mean_abs_error_ms = self.abs_error_ms / frames;
        let mean_jitter_ms = self.jitter_ms / frames;
        PacingReport {
            grade: grade_for(mean_abs_error_ms, mean_jitter_ms),
            frames: self.frames,
            vsynced_frames: self.vsynced_frames,
            transitions: self.transitions,
            hitches: self.hitches,
            fixed_steps: self.fixed_steps,
            drift_ms: self.drift_ticks as f64 * 1000.0 / self.rate.ticks_per_second() as f64,
            mean_abs_error_ms,
            mean_jitter_ms,
        }
    }

    /// Returns ring-buffer reported deltas oldest→newest.
    #[must_use]
    pub fn frame_deltas(&self) -> [f64; N] {
        core::array::from_fn(|i| self.deltas_ms[(self.cursor + i) % N])
    }

    /// Returns an ASCII sparkline over `frame_deltas()`.
    ///
    /// An empty or inverted `min_ms..max_ms` range renders as blanks.
    #[must_use]
    pub fn sparkline_ascii(&self, min_ms: f64, max_ms: f64) -> String {
        const LEVELS: &[u8] = b" .:-=+*#%@";
        if min_ms.is_nan() || max_ms.is_nan() || min_ms >= max_ms {
            return " ".repeat(N);
        }
        self.frame_deltas()
            .iter()
            .map(|&v| {
                let t = (v.clamp(min_ms, max_ms) - min_ms) / (max_ms - min_ms);
                #[expect(
                    clippy::cast_possible_truncation,
                    reason = "index is clamped to ASCII level count"
                )]
                let level = (t * (LEVELS.len() as f64 - 1.0) + 0.5) as usize;
                char::from(LEVELS[level.min(LEVELS.len() - 1)])
            })
            .collect()
    }

    fn to_ms(&self, d: Duration) -> f64 {
        d.as_secs_f64(self.rate) * 1000.0
    }
}

fn grade_for(mean_abs_error_ms: f64, mean_jitter_ms: f64) -> PacingGrade {
    if mean_abs_error_ms < 0.25 && mean_jitter_ms < 0.25 {
        PacingGrade::A
    } else if mean_abs_error_ms < 1.0 && mean_jitter_ms < 1.0 {
        PacingGrade::B
    } else if mean_abs_error_ms < 4.0 && mean_jitter_ms < 4.0 {
        PacingGrade::C
    } else {
        PacingGrade::D
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framepace_core::pacer::PaceOutcome;
    use framepace_core::vsync::VsyncVerdict;

    const RATE: TickRate = TickRate::new(1_000_000);

    fn report(delta: u64, state: VsyncState, hitch: bool) -> FrameReport {
        FrameReport {
            frame_index: 0,
            verdict: VsyncVerdict { state, counter: 0 },
            delta: Duration(delta),
            outcome: PaceOutcome {
                delta: Duration(delta),
                fixed_steps: 1,
                hitch,
                accumulator: Duration::ZERO,
                interpolation: 0.0,
            },
        }
    }

    #[test]
    fn exact_steady_frames_grade_a() {
        let mut t = PacingTracker::<8>::new(RATE, 16.667);
        let mut last = None;
        for _ in 0..100 {
            last = Some(t.observe(&report(16_667, VsyncState::Vsynced, false), Duration(16_667)));
        }
        let r = last.unwrap();
        assert_eq!(r.grade, PacingGrade::A);
        assert_eq!(r.frames, 100);
        assert_eq!(r.vsynced_frames, 100);
        assert_eq!(r.fixed_steps, 100);
        assert_eq!(r.transitions, 0);
        assert!(r.drift_ms.abs() < 1e-9, "drift {}", r.drift_ms);
    }

    #[test]
    fn drift_and_transitions_accumulate() {
        let mut t = PacingTracker::<4>::new(RATE, 16.667);
        t.observe(&report(17_000, VsyncState::Vsynced, false), Duration(16_000));
        t.observe(&report(17_000, VsyncState::NotVsynced, false), Duration(16_000));
        let r = t.observe(&report(400_000, VsyncState::Vsynced, true), Duration(400_000));
        assert_eq!(r.transitions, 2);
        assert_eq!(r.hitches, 1);
        assert!((r.drift_ms - 2.0).abs() < 1e-9, "drift {}", r.drift_ms);
        assert_eq!(r.grade, PacingGrade::D);
    }

    #[test]
    fn alternating_deltas_lower_the_grade() {
        let mut t = PacingTracker::<4>::new(RATE, 16.667);
        let mut r = None;
        for i in 0..100 {
            let d = if i % 2 == 0 { 15_000 } else { 18_000 };
            r = Some(t.observe(&report(d, VsyncState::NotVsynced, false), Duration(d)));
        }
        let r = r.unwrap();
        assert!(r.mean_abs_error_ms < 1e-9, "error {}", r.mean_abs_error_ms);
        assert_eq!(r.grade, PacingGrade::C);
    }

    #[test]
    fn ring_buffer_is_oldest_first() {
        let mut t = PacingTracker::<3>::new(RATE, 0.0);
        for d in [1_000, 2_000, 3_000, 4_000] {
            t.observe(&report(d, VsyncState::Vsynced, false), Duration(d));
        }
        assert_eq!(t.frame_deltas(), [2.0, 3.0, 4.0]);
        assert_eq!(t.sparkline_ascii(1.0, 4.0), "-*@");
    }

    #[test]
    fn degenerate_sparkline_range_is_blank() {
        let mut t = PacingTracker::<3>::new(RATE, 16.667);
        t.observe(&report(16_667, VsyncState::Vsynced, false), Duration(16_667));
        assert_eq!(t.sparkline_ascii(16.0, 16.0), "   ");
        assert_eq!(t.sparkline_ascii(40.0, 5.0), "   ");
        assert_eq!(t.sparkline_ascii(f64::NAN, 5.0), "   ");
    }
}
