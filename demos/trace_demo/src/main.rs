// Copyright 2026 the Framepace Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated frame loop that exercises the tracing and diagnostics pipeline.
//!
//! Drives a [`FramePacing`] against a [`SimulatedDisplay`] through a few
//! phases (steady vsync, tearing, jitter with stalls), recording events to
//! both a [`PrettyPrintSink`] and a [`RecorderSink`], then exports a Chrome
//! trace JSON file.

use std::fs::File;
use std::io::BufWriter;

use framepace_core::frame_loop::{FramePacing, PacingConfig};
use framepace_core::pacer::Callbacks;
use framepace_core::time::TickRate;
use framepace_core::trace::{
    DeltaTimeEvent, FrameSampleEvent, PaceEvent, TraceSink, Tracer, VsyncTransitionEvent,
};

use framepace_debug::pretty::PrettyPrintSink;
use framepace_debug::recorder::RecorderSink;

use framepace_sim::PathologyToggles;
use framepace_sim::display::SimulatedDisplay;
use framepace_sim::tracker::PacingTracker;

/// QPC-style 10 MHz tick rate.
const RATE: TickRate = TickRate::new(10_000_000);
const REFRESH_HZ: f64 = 60.0;
const UPDATE_HZ: f64 = 120.0;
const PHASE_FRAMES: u64 = 120;

/// Forwards every event to both sinks.
struct Tee {
    pretty: PrettyPrintSink,
    recorder: RecorderSink,
}

impl TraceSink for Tee {
    fn on_frame_sample(&mut self, e: &FrameSampleEvent) {
        self.pretty.on_frame_sample(e);
        self.recorder.on_frame_sample(e);
    }

    fn on_vsync_transition(&mut self, e: &VsyncTransitionEvent) {
        self.pretty.on_vsync_transition(e);
        self.recorder.on_vsync_transition(e);
    }

    fn on_delta_time(&mut self, e: &DeltaTimeEvent) {
        self.pretty.on_delta_time(e);
        self.recorder.on_delta_time(e);
    }

    fn on_pace(&mut self, e: &PaceEvent) {
        self.pretty.on_pace(e);
        self.recorder.on_pace(e);
    }
}

fn main() {
    // -- sinks -------------------------------------------------------------
    let mut sink = Tee {
        pretty: PrettyPrintSink::new(Box::new(std::io::stdout()), RATE),
        recorder: RecorderSink::new(),
    };

    // -- pacing ------------------------------------------------------------
    let mut display = SimulatedDisplay::new(REFRESH_HZ, RATE, 0x5eed);
    let mut pacing = FramePacing::new(PacingConfig::new(UPDATE_HZ), RATE);

    let mut updates = 0_u64;
    let mut renders = 0_u64;
    let mut callbacks = Callbacks::new(|_dt| updates += 1, |_dt| {}, |_dt, _alpha| renders += 1);

    let phases = [
        ("steady", PathologyToggles::default()),
        (
            "tearing",
            PathologyToggles {
                tearing: true,
                ..PathologyToggles::default()
            },
        ),
        (
            "jitter+stalls",
            PathologyToggles {
                timer_jitter: true,
                stalls: true,
                ..PathologyToggles::default()
            },
        ),
    ];

    // -- simulated loop ----------------------------------------------------
    let mut summaries = Vec::new();
    for (name, toggles) in phases {
        display.set_toggles(toggles);
        let mut tracker = PacingTracker::<48>::new(RATE, 1000.0 / REFRESH_HZ);
        let mut tracer = Tracer::new(&mut sink);
        let report = framepace_sim::drive(
            &mut display,
            &mut pacing,
            &mut tracker,
            &mut callbacks,
            &mut tracer,
            PHASE_FRAMES,
        );
        summaries.push((name, report, tracker.sparkline_ascii(5.0, 40.0)));
    }

    for (name, report, sparkline) in &summaries {
        println!(
            "{name:>14}: grade={} vsynced={}/{} hitches={} drift={:.3}ms |{sparkline}|",
            report.grade.as_str(),
            report.vsynced_frames,
            report.frames,
            report.hitches,
            report.drift_ms,
        );
    }
    println!("{updates} fixed updates, {renders} renders");

    // -- export Chrome trace -----------------------------------------------
    let path = "trace.json";
    let file = File::create(path).expect("failed to create trace.json");
    let mut writer = BufWriter::new(file);
    framepace_debug::chrome::export(sink.recorder.as_bytes(), RATE, &mut writer)
        .expect("failed to write Chrome trace");

    println!("Wrote {path} ({} frames)", pacing.frame_count());
}
