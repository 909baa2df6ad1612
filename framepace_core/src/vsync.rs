// Copyright 2026 the Framepace Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Debounced detection of whether presentation is actually vsynced.
//!
//! Requesting vsync does not guarantee it: compositors, driver overrides and
//! variable-refresh displays can all present off the sync grid. The
//! [`VsyncClassifier`] looks at the driver's frame statistics every frame and
//! decides, with hysteresis, whether presents line up with vertical sync.
//!
//! Each frame contributes one vote:
//!
//! - **synced** when the measured present time is within
//!   [`VsyncConfig::sync_epsilon_secs`] of the driver's sync time;
//! - **not synced** otherwise.
//!
//! A stuck driver present counter is a hard signal of tearing and wipes any
//! progress towards re-entering the synced state.
//!
//! The two thresholds are deliberately asymmetric. Wrongly leaving the
//! synced state only costs one frame of smoothing, while wrongly entering it
//! makes the estimator snap to refresh multiples that are not real, so the
//! bar for entering is higher.

use crate::sample::FrameSample;
use crate::time::TickRate;

/// Tuning for the [`VsyncClassifier`].
///
/// The defaults were tuned empirically against fixed-refresh displays. They
/// are not guaranteed to be optimal, in particular with variable refresh
/// rate displays; the only promise is eventual convergence under steady
/// conditions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VsyncConfig {
    /// Maximum distance between present time and driver sync time for a
    /// frame to count as synced, in seconds.
    pub sync_epsilon_secs: f64,
    /// Net unsynced votes needed to leave [`VsyncState::Vsynced`].
    pub desync_threshold: u32,
    /// Net synced votes needed to re-enter [`VsyncState::Vsynced`].
    pub resync_threshold: u32,
}

impl VsyncConfig {
    /// Thresholds for driver-assisted detection (100µs, 4 out, 8 back in).
    #[must_use]
    pub const fn driver_assisted() -> Self {
        Self {
            sync_epsilon_secs: 1e-4,
            desync_threshold: 4,
            resync_threshold: 8,
        }
    }
}

impl Default for VsyncConfig {
    fn default() -> Self {
        Self::driver_assisted()
    }
}

/// Whether presentation is currently believed to be vsynced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VsyncState {
    /// Presents line up with vertical sync.
    Vsynced,
    /// Presents are tearing or otherwise off the sync grid.
    NotVsynced,
}

/// The classifier's current verdict.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VsyncVerdict {
    /// Debounced state.
    pub state: VsyncState,
    /// Net votes towards leaving the current state.
    pub counter: u32,
}

impl VsyncVerdict {
    /// The start-up verdict: assume vsynced until shown otherwise.
    pub const ASSUMED_VSYNCED: Self = Self {
        state: VsyncState::Vsynced,
        counter: 0,
    };

    /// Returns `true` if presentation is believed to be vsynced.
    #[inline]
    #[must_use]
    pub const fn is_vsynced(self) -> bool {
        matches!(self.state, VsyncState::Vsynced)
    }
}

impl Default for VsyncVerdict {
    fn default() -> Self {
        Self::ASSUMED_VSYNCED
    }
}

/// What the classifier saw on the most recent frame with driver data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SyncObservation {
    /// The present was within epsilon of the driver sync time.
    pub was_frame_synced: bool,
    /// The driver present counter did not advance.
    pub definitely_not_vsynced: bool,
    /// The verdict changed state on this frame.
    pub transitioned: bool,
}

/// Hysteresis state machine turning per-frame sync votes into a stable
/// verdict.
#[derive(Clone, Debug)]
pub struct VsyncClassifier {
    config: VsyncConfig,
    verdict: VsyncVerdict,
    last_observation: Option<SyncObservation>,
}

impl VsyncClassifier {
    /// Creates a classifier that starts out assuming vsync.
    #[must_use]
    pub fn new(config: VsyncConfig) -> Self {
        Self {
            config,
            verdict: VsyncVerdict::ASSUMED_VSYNCED,
            last_observation: None,
        }
    }

    /// Folds one frame into the verdict and returns it.
    ///
    /// `prev` is the sample of the previously presented frame. Until both
    /// samples carry a driver sync time the verdict is left untouched.
    pub fn classify(
        &mut self,
        sample: &FrameSample,
        prev: &FrameSample,
        rate: TickRate,
    ) -> VsyncVerdict {
        if !sample.stats.is_available() || !prev.stats.is_available() {
            self.last_observation = None;
            return self.verdict;
        }

        let was_frame_synced = sample.is_aligned_to_sync(rate, self.config.sync_epsilon_secs);
        let definitely_not_vsynced = prev.stats.present_count == sample.stats.present_count;

        let before = self.verdict.state;
        self.vote(was_frame_synced, definitely_not_vsynced);

        self.last_observation = Some(SyncObservation {
            was_frame_synced,
            definitely_not_vsynced,
            transitioned: before != self.verdict.state,
        });
        self.verdict
    }

    fn vote(&mut self, was_frame_synced: bool, definitely_not_vsynced: bool) {
        let v = &mut self.verdict;
        match v.state {
            VsyncState::Vsynced => {
                v.counter = if was_frame_synced {
                    v.counter.saturating_sub(1)
                } else {
                    v.counter + 1
                };
                if v.counter >= self.config.desync_threshold {
                    v.counter = 0;
                    v.state = VsyncState::NotVsynced;
                }
            }
            VsyncState::NotVsynced => {
                v.counter = if was_frame_synced {
                    v.counter + 1
                } else {
                    v.counter.saturating_sub(1)
                };
                if definitely_not_vsynced {
                    v.counter = 0;
                }
                if v.counter >= self.config.resync_threshold {
                    v.counter = 0;
                    v.state = VsyncState::Vsynced;
                }
            }
        }
    }

    /// Returns the current verdict.
    #[must_use]
    pub fn verdict(&self) -> VsyncVerdict {
        self.verdict
    }

    /// Returns the observation made on the last classified frame, or `None`
    /// if that frame had no driver data.
    #[must_use]
    pub fn last_observation(&self) -> Option<SyncObservation> {
        self.last_observation
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &VsyncConfig {
        &self.config
    }

    /// Forgets all history and goes back to assuming vsync.
    pub fn reset(&mut self) {
        self.verdict = VsyncVerdict::ASSUMED_VSYNCED;
        self.last_observation = None;
    }
}

impl Default for VsyncClassifier {
    fn default() -> Self {
        Self::new(VsyncConfig::default())
    }
}
