// Copyright 2026 the Framepace Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! Besides instant events for samples, vsync transitions and pacing, the
//! estimator's state is emitted as counter tracks (`"ph": "C"`) so that the
//! reported delta, the error terms and the accumulated drift can be read as
//! graphs over time.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use framepace_core::time::TickRate;

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// Timestamps are converted to microseconds using the provided [`TickRate`].
pub fn export(bytes: &[u8], rate: TickRate, writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::FrameSample(e) => {
                let ts = ticks_to_us(e.present_time.ticks(), rate);
                events.push(json!({
                    "ph": "i",
                    "name": "FrameSample",
                    "cat": "Vsync",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "frame_index": e.frame_index,
                        "present_count": e.present_count,
                        "has_stats": e.sync_time.is_some(),
                        "synced": e.observation.map(|o| o.was_frame_synced),
                        "stuck": e.observation.map(|o| o.definitely_not_vsynced),
                        "state": format!("{:?}", e.verdict.state),
                    }
                }));
                events.push(json!({
                    "ph": "C",
                    "name": "vsync_counter",
                    "ts": ts,
                    "pid": 0,
                    "args": { "counter": e.verdict.counter }
                }));
            }
            RecordedEvent::VsyncTransition(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": format!("{:?}", e.state),
                    "cat": "Vsync",
                    "ts": ticks_to_us(e.timestamp.ticks(), rate),
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "frame_index": e.frame_index,
                    }
                }));
            }
            RecordedEvent::DeltaTime(e) => {
                let ts = ticks_to_us(e.timestamp.ticks(), rate);
                events.push(json!({
                    "ph": "C",
                    "name": "delta_us",
                    "ts": ts,
                    "pid": 0,
                    "args": {
                        "raw": signed_us(e.raw_ticks, rate),
                        "reported": ticks_to_us(e.delta.ticks(), rate),
                    }
                }));
                events.push(json!({
                    "ph": "C",
                    "name": "estimator_error_us",
                    "ts": ts,
                    "pid": 0,
                    "args": {
                        "snap_error": signed_us(e.snap_error, rate),
                        "non_vsync_error": signed_us(e.non_vsync_error, rate),
                    }
                }));
                events.push(json!({
                    "ph": "C",
                    "name": "drift_us",
                    "ts": ts,
                    "pid": 0,
                    "args": { "drift": signed_us(e.drift, rate) }
                }));
            }
            RecordedEvent::Pace(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": if e.hitch { "Hitch" } else { "Pace" },
                    "cat": "Pacer",
                    "ts": ticks_to_us(e.timestamp.ticks(), rate),
                    "pid": 0,
                    "tid": 1,
                    "s": "t",
                    "args": {
                        "frame_index": e.frame_index,
                        "fixed_steps": e.fixed_steps,
                        "delta_us": ticks_to_us(e.delta.ticks(), rate),
                        "accumulator_us": ticks_to_us(e.accumulator.ticks(), rate),
                        "interpolation": e.interpolation,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn ticks_to_us(ticks: u64, rate: TickRate) -> f64 {
    rate.ticks_to_nanos(ticks) as f64 / 1000.0
}

fn signed_us(ticks: i64, rate: TickRate) -> f64 {
    ticks as f64 * 1e6 / rate.ticks_per_second() as f64
}
