// Copyright 2026 the Framepace Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Tick values
//! are converted to microseconds using a [`TickRate`].

use std::io::Write;

use framepace_core::time::{HostTime, TickRate};
use framepace_core::trace::{
    DeltaTimeEvent, FrameSampleEvent, PaceEvent, TraceSink, VsyncTransitionEvent,
};
use framepace_core::vsync::VsyncState;

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    rate: TickRate,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("rate", &self.rate)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr(rate: TickRate) -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
            rate,
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>, rate: TickRate) -> Self {
        Self { writer, rate }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W, rate: TickRate) -> Self {
        Self { writer, rate }
    }

    /// Consumes the sink and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn ticks_to_us(&self, ticks: u64) -> f64 {
        self.rate.ticks_to_nanos(ticks) as f64 / 1000.0
    }

    fn signed_us(&self, ticks: i64) -> f64 {
        ticks as f64 * 1e6 / self.rate.ticks_per_second() as f64
    }

    fn host_us(&self, t: HostTime) -> f64 {
        self.ticks_to_us(t.ticks())
    }
}

fn state_name(state: VsyncState) -> &'static str {
    match state {
        VsyncState::Vsynced => "vsynced",
        VsyncState::NotVsynced => "not-vsynced",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_frame_sample(&mut self, e: &FrameSampleEvent) {
        let votes = match e.observation {
            Some(o) => {
                let synced = if o.was_frame_synced { "synced" } else { "off-sync" };
                let stuck = if o.definitely_not_vsynced { " stuck" } else { "" };
                format!("{synced}{stuck}")
            }
            None => "no-stats".to_owned(),
        };
        let _ = writeln!(
            self.writer,
            "[sample] frame={} present={:.1}µs count={} vote={votes} state={} counter={}",
            e.frame_index,
            self.host_us(e.present_time),
            e.present_count,
            state_name(e.verdict.state),
            e.verdict.counter,
        );
    }

    fn on_vsync_transition(&mut self, e: &VsyncTransitionEvent) {
        let _ = writeln!(
            self.writer,
            "[vsync] frame={} -> {} at {:.1}µs",
            e.frame_index,
            state_name(e.state),
            self.host_us(e.timestamp),
        );
    }

    fn on_delta_time(&mut self, e: &DeltaTimeEvent) {
        let snapped = match e.refresh_multiple {
            Some(n) => format!("x{n}"),
            None => "smoothed".to_owned(),
        };
        let _ = writeln!(
            self.writer,
            "[delta] frame={} raw={:.1}µs delta={:.1}µs ({snapped}) snap_err={:.1}µs \
             err={:.1}µs drift={:.1}µs",
            e.frame_index,
            self.signed_us(e.raw_ticks),
            self.ticks_to_us(e.delta.ticks()),
            self.signed_us(e.snap_error),
            self.signed_us(e.non_vsync_error),
            self.signed_us(e.drift),
        );
    }

    fn on_pace(&mut self, e: &PaceEvent) {
        let hitch = if e.hitch { " HITCH" } else { "" };
        let _ = writeln!(
            self.writer,
            "[pace] frame={} steps={} acc={:.1}µs alpha={:.3}{hitch}",
            e.frame_index,
            e.fixed_steps,
            self.ticks_to_us(e.accumulator.ticks()),
            e.interpolation,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framepace_core::time::Duration;

    #[test]
    fn pretty_print_transition() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new(), TickRate::NANOS);
        sink.on_vsync_transition(&VsyncTransitionEvent {
            frame_index: 4,
            timestamp: HostTime(1_000_000),
            state: VsyncState::NotVsynced,
        });
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert!(output.contains("[vsync]"), "got: {output}");
        assert!(output.contains("frame=4 -> not-vsynced"), "got: {output}");
        assert!(output.contains("1000.0µs"), "got: {output}");
    }

    #[test]
    fn pretty_print_hitch() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new(), TickRate::MICROS);
        sink.on_pace(&PaceEvent {
            frame_index: 9,
            timestamp: HostTime(0),
            delta: Duration(16_666),
            fixed_steps: 1,
            hitch: true,
            accumulator: Duration(16_666),
            interpolation: 1.0,
        });
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert!(output.contains("steps=1"), "got: {output}");
        assert!(output.contains("acc=16666.0µs"), "got: {output}");
        assert!(output.ends_with("HITCH\n"), "got: {output}");
    }

    #[test]
    fn negative_ticks_print_signed() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new(), TickRate::MICROS);
        sink.on_delta_time(&DeltaTimeEvent {
            frame_index: 2,
            timestamp: HostTime(0),
            vsynced: false,
            raw_ticks: -50,
            delta: Duration::ZERO,
            refresh_period: Duration(16_666),
            refresh_multiple: None,
            snap_error: 0,
            non_vsync_error: 25,
            smoothed_non_vsync_delta: 0,
            drift: 50,
        });
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert!(output.contains("raw=-50.0µs"), "got: {output}");
        assert!(output.contains("(smoothed)"), "got: {output}");
    }
}
