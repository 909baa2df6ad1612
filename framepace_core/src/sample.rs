// Copyright 2026 the Framepace Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-frame observations delivered by the clock source.
//!
//! The graphics backend produces one [`FrameSample`] each time a frame is
//! presented. It carries the measured present time and, when the display
//! driver reports them, the driver's frame statistics. Before the first
//! frames have gone through the swap chain most drivers report all-zero
//! statistics; that case means "not available yet", never an error.

use crate::time::{HostTime, TickRate};

/// Frame statistics as reported by the display driver.
///
/// Mirrors what DXGI-style `GetFrameStatistics` calls return. All fields
/// are zero until the driver has real information.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FrameStatistics {
    /// Host time of the vertical sync the last present was aligned to.
    pub sync_time: HostTime,
    /// Driver present counter. Does not advance when a present tears.
    pub present_count: u32,
    /// Refresh counter at the time of the last present.
    pub present_refresh_count: u32,
    /// Refresh counter at `sync_time`.
    pub sync_refresh_count: u32,
}

impl FrameStatistics {
    /// Returns `true` once the driver has reported a sync time.
    #[inline]
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.sync_time.0 != 0
    }
}

/// One observation per presented frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FrameSample {
    /// Host time measured right after the present call returned.
    pub present_time: HostTime,
    /// Driver-reported statistics for this frame.
    pub stats: FrameStatistics,
}

impl FrameSample {
    /// Creates a sample without driver statistics.
    #[inline]
    #[must_use]
    pub const fn measured(present_time: HostTime) -> Self {
        Self {
            present_time,
            stats: FrameStatistics {
                sync_time: HostTime(0),
                present_count: 0,
                present_refresh_count: 0,
                sync_refresh_count: 0,
            },
        }
    }

    /// Creates a sample with driver statistics.
    #[inline]
    #[must_use]
    pub const fn with_stats(present_time: HostTime, stats: FrameStatistics) -> Self {
        Self {
            present_time,
            stats,
        }
    }

    /// Returns the driver's sync time for this frame.
    #[inline]
    #[must_use]
    pub const fn sync_time(&self) -> HostTime {
        self.stats.sync_time
    }

    /// Returns whether the present instant lies within `epsilon_secs` of the
    /// driver's reported sync instant.
    #[must_use]
    pub fn is_aligned_to_sync(&self, rate: TickRate, epsilon_secs: f64) -> bool {
        let offset = self.present_time.signed_ticks_since(self.stats.sync_time);
        (offset.unsigned_abs() as f64) < epsilon_secs * rate.ticks_per_second() as f64
    }

    /// Returns the timestamp the estimator should measure this frame by.
    ///
    /// While presentation is vsynced the driver's sync time is exact and
    /// free of scheduling noise, so it is preferred. Otherwise, or when the
    /// driver has not reported yet, the measured present time is used.
    #[inline]
    #[must_use]
    pub const fn frame_timestamp(&self, is_vsynced: bool) -> HostTime {
        if is_vsynced && self.stats.is_available() {
            self.stats.sync_time
        } else {
            self.present_time
        }
    }

    /// Signed distance from the driver sync time to the measured present
    /// time, if the driver has reported.
    #[must_use]
    pub const fn sync_offset_ticks(&self) -> Option<i64> {
        if self.stats.is_available() {
            Some(self.present_time.signed_ticks_since(self.stats.sync_time))
        } else {
            None
        }
    }
}
