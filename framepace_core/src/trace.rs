// Copyright 2026 the Framepace Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the pacing cycle.
//!
//! This module provides a [`TraceSink`] trait with one method per stage of
//! the pacing cycle. All method bodies default to no-ops, so implementing
//! only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! The events carry enough of the estimator's internal state (snap error,
//! non-vsync error, accumulated drift) to chart how far reported time wanders
//! from measured time, which is otherwise only visible as judder on screen.
//!
//! # Crate features
//!
//! - `trace` — enables the `Tracer` method bodies (one branch per call).

use crate::estimator::{DeltaEstimate, TimingState};
use crate::pacer::PaceOutcome;
use crate::sample::FrameSample;
use crate::time::{Duration, HostTime};
use crate::vsync::{SyncObservation, VsyncState, VsyncVerdict};

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted once per frame after the vsync classifier has run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameSampleEvent {
    /// Monotonic frame counter.
    pub frame_index: u64,
    /// Measured present time.
    pub present_time: HostTime,
    /// Driver sync time, if the driver has reported.
    pub sync_time: Option<HostTime>,
    /// Driver present counter (zero when not reported).
    pub present_count: u32,
    /// Per-frame votes, if the classifier had driver data to look at.
    pub observation: Option<SyncObservation>,
    /// Verdict after this frame.
    pub verdict: VsyncVerdict,
}

impl FrameSampleEvent {
    /// Builds the event from a sample and the classifier's output.
    #[must_use]
    pub fn new(
        frame_index: u64,
        sample: &FrameSample,
        observation: Option<SyncObservation>,
        verdict: VsyncVerdict,
    ) -> Self {
        Self {
            frame_index,
            present_time: sample.present_time,
            sync_time: sample
                .stats
                .is_available()
                .then_some(sample.stats.sync_time),
            present_count: sample.stats.present_count,
            observation,
            verdict,
        }
    }
}

/// Emitted when the classifier's verdict changes state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VsyncTransitionEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Present time of the frame that caused the transition.
    pub timestamp: HostTime,
    /// The state that was entered.
    pub state: VsyncState,
}

/// Emitted after the estimator has produced a frame's delta.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeltaTimeEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Timestamp the delta was measured at.
    pub timestamp: HostTime,
    /// Whether the estimator treated the frame as vsynced.
    pub vsynced: bool,
    /// Measured delta in ticks, possibly negative.
    pub raw_ticks: i64,
    /// Reported delta.
    pub delta: Duration,
    /// Refresh period used for snapping.
    pub refresh_period: Duration,
    /// Number of refreshes the delta was snapped to.
    pub refresh_multiple: Option<u64>,
    /// Snap error residual after this frame.
    pub snap_error: i64,
    /// Non-vsync error after this frame.
    pub non_vsync_error: i64,
    /// Smoothed non-vsync delta after this frame.
    pub smoothed_non_vsync_delta: i64,
    /// Accumulated reported minus measured time.
    pub drift: i64,
}

impl DeltaTimeEvent {
    /// Builds the event from the estimator's last step and its state.
    #[must_use]
    pub fn new(
        frame_index: u64,
        timestamp: HostTime,
        vsynced: bool,
        estimate: &DeltaEstimate,
        state: &TimingState,
    ) -> Self {
        Self {
            frame_index,
            timestamp,
            vsynced,
            raw_ticks: estimate.raw_ticks,
            delta: estimate.delta,
            refresh_period: estimate.refresh_period,
            refresh_multiple: estimate.refresh_multiple,
            snap_error: state.snap_error,
            non_vsync_error: state.non_vsync_error,
            smoothed_non_vsync_delta: state.smoothed_non_vsync_delta,
            drift: state.drift,
        }
    }
}

/// Emitted after the pacer has issued a frame's callbacks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PaceEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Timestamp of the frame being paced.
    pub timestamp: HostTime,
    /// Delta consumed by the pacer.
    pub delta: Duration,
    /// Fixed updates issued.
    pub fixed_steps: u32,
    /// Whether the frame was treated as a hitch.
    pub hitch: bool,
    /// Banked time after draining.
    pub accumulator: Duration,
    /// Interpolation fraction passed to render.
    pub interpolation: f64,
}

impl PaceEvent {
    /// Builds the event from a pacer outcome.
    #[must_use]
    pub fn new(frame_index: u64, timestamp: HostTime, outcome: &PaceOutcome) -> Self {
        Self {
            frame_index,
            timestamp,
            delta: outcome.delta,
            fixed_steps: outcome.fixed_steps,
            hitch: outcome.hitch,
            accumulator: outcome.accumulator,
            interpolation: outcome.interpolation,
        }
    }
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the pacing cycle.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called once per frame after classification.
    fn on_frame_sample(&mut self, e: &FrameSampleEvent) {
        _ = e;
    }

    /// Called when the vsync verdict changes state.
    fn on_vsync_transition(&mut self, e: &VsyncTransitionEvent) {
        _ = e;
    }

    /// Called after the delta for a frame is known.
    fn on_delta_time(&mut self, e: &DeltaTimeEvent) {
        _ = e;
    }

    /// Called after the pacer has run a frame's callbacks.
    fn on_pace(&mut self, e: &PaceEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`FrameSampleEvent`].
    #[inline]
    pub fn frame_sample(&mut self, e: &FrameSampleEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_frame_sample(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`VsyncTransitionEvent`].
    #[inline]
    pub fn vsync_transition(&mut self, e: &VsyncTransitionEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_vsync_transition(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`DeltaTimeEvent`].
    #[inline]
    pub fn delta_time(&mut self, e: &DeltaTimeEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_delta_time(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PaceEvent`].
    #[inline]
    pub fn pace(&mut self, e: &PaceEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_pace(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
