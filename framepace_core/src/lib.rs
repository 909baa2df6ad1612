// Copyright 2026 the Framepace Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame timing and pacing for real-time render loops.
//!
//! `framepace_core` turns the raw timestamps of presented frames into a
//! stable per-frame delta and drives a fixed-timestep simulation from it.
//! It is `no_std` compatible and allocation free; all state lives in plain
//! structs owned by the host.
//!
//! # Architecture
//!
//! One pacing cycle runs per presented frame:
//!
//! ```text
//!   Clock source (present time + driver statistics)
//!       │
//!       ▼
//!   FrameSample ──► VsyncClassifier ──► VsyncVerdict
//!                                           │
//!                 ┌─────────────────────────┘
//!                 ▼
//!   DeltaTimeEstimator ──► delta ──► FixedTimestepPacer
//!                                           │
//!                 ┌─────────────────────────┘
//!                 ▼
//!   fixed_update × N ──► variable_update ──► render(dt, interpolation)
//! ```
//!
//! **[`time`]** — Tick-based [`HostTime`](time::HostTime) and
//! [`Duration`](time::Duration) plus [`TickRate`](time::TickRate) for
//! conversion to seconds at the callback boundary.
//!
//! **[`sample`]** — The per-frame [`FrameSample`](sample::FrameSample) and
//! driver [`FrameStatistics`](sample::FrameStatistics).
//!
//! **[`vsync`]** — Hysteresis classifier deciding whether presents actually
//! land on vertical sync.
//!
//! **[`estimator`]** — Delta-time estimator that snaps to refresh multiples
//! while vsynced and smooths with error feedback otherwise.
//!
//! **[`pacer`]** — Accumulator-based fixed-timestep pacer with a hitch guard.
//!
//! **[`frame_loop`]** — [`FramePacing`](frame_loop::FramePacing), the three
//! components wired together in order.
//!
//! **[`trace`]** — [`TraceSink`](trace::TraceSink) trait and event types for
//! pacing instrumentation, with zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Example
//!
//! ```
//! use framepace_core::frame_loop::{FramePacing, PacingConfig};
//! use framepace_core::pacer::Callbacks;
//! use framepace_core::sample::FrameSample;
//! use framepace_core::time::{HostTime, TickRate};
//! use framepace_core::trace::Tracer;
//!
//! let rate = TickRate::NANOS;
//! let mut pacing = FramePacing::new(PacingConfig::new(120.0), rate);
//! let mut steps = 0;
//! let mut callbacks = Callbacks::new(|_dt| steps += 1, |_dt| {}, |_dt, _alpha| {});
//!
//! for i in 1..=60_u64 {
//!     let present = HostTime(i * 16_666_667);
//!     pacing.frame(FrameSample::measured(present), 60.0, &mut callbacks, &mut Tracer::none());
//! }
//! drop(callbacks);
//! assert!(steps > 100);
//! ```
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

#[cfg(test)]
extern crate alloc;
#[cfg(test)]
extern crate std;

pub mod estimator;
pub mod frame_loop;
pub mod pacer;
pub mod sample;
pub mod time;
pub mod trace;
pub mod vsync;
