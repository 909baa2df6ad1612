// Copyright 2026 the Framepace Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated display clock and pacing-quality grading for framepace.
//!
//! - [`display::SimulatedDisplay`] produces the [`FrameSample`]s a swap chain
//!   would, for a configurable set of [`PathologyToggles`].
//! - [`tracker::PacingTracker`] compares reported deltas with true frame
//!   times and grades the result.
//! - [`drive`] runs a [`FramePacing`] against a display for a number of
//!   frames.
//!
//! [`FrameSample`]: framepace_core::sample::FrameSample

pub mod display;
pub mod tracker;

use framepace_core::frame_loop::FramePacing;
use framepace_core::pacer::FrameCallbacks;
use framepace_core::trace::Tracer;

use crate::display::SimulatedDisplay;
use crate::tracker::{PacingReport, PacingTracker};

/// Runtime pathology toggles for stress tests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PathologyToggles {
    /// Measured present times are occasionally delayed by scheduling noise.
    pub timer_jitter: bool,
    /// Presents do not wait for vertical blank.
    pub tearing: bool,
    /// A long stall is injected periodically.
    pub stalls: bool,
    /// The driver never reports frame statistics.
    pub missing_stats: bool,
    /// The refresh rate switches periodically between the base rate and
    /// twice that.
    pub vary_refresh: bool,
}

/// Runs `frames` pacing cycles of `pacing` against `display`, feeding each
/// result to `tracker`, and returns the final report.
pub fn drive<const N: usize>(
    display: &mut SimulatedDisplay,
    pacing: &mut FramePacing,
    tracker: &mut PacingTracker<N>,
    callbacks: &mut impl FrameCallbacks,
    tracer: &mut Tracer<'_>,
    frames: u64,
) -> PacingReport {
    for _ in 0..frames {
        let sample = display.next_frame();
        let report = pacing.frame(sample, display.refresh_hz(), callbacks, tracer);
        tracker.observe(&report, display.last_true_delta());
    }
    tracker.report()
}
