// Copyright 2026 the Framepace Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records, each starting with a
//! one-byte tag. [`decode`] reads them back as an iterator of
//! [`RecordedEvent`]; it stops at the first truncated record or unknown tag.

use framepace_core::time::{Duration, HostTime};
use framepace_core::trace::{
    DeltaTimeEvent, FrameSampleEvent, PaceEvent, TraceSink, VsyncTransitionEvent,
};
use framepace_core::vsync::{SyncObservation, VsyncState, VsyncVerdict};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_FRAME_SAMPLE: u8 = 1;
const TAG_VSYNC_TRANSITION: u8 = 2;
const TAG_DELTA_TIME: u8 = 3;
const TAG_PACE: u8 = 4;

// Observation flag bits. Zero means no observation.
const OBS_PRESENT: u8 = 1 << 0;
const OBS_SYNCED: u8 = 1 << 1;
const OBS_STUCK: u8 = 1 << 2;
const OBS_TRANSITIONED: u8 = 1 << 3;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_f64(&mut self, v: f64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_option_u64(&mut self, v: Option<u64>) {
        match v {
            Some(val) => {
                self.write_u8(1);
                self.write_u64(val);
            }
            None => {
                self.write_u8(0);
                self.write_u64(0);
            }
        }
    }

    fn write_observation(&mut self, o: Option<SyncObservation>) {
        let flags = o.map_or(0, |o| {
            let mut f = OBS_PRESENT;
            if o.was_frame_synced {
                f |= OBS_SYNCED;
            }
            if o.definitely_not_vsynced {
                f |= OBS_STUCK;
            }
            if o.transitioned {
                f |= OBS_TRANSITIONED;
            }
            f
        });
        self.write_u8(flags);
    }

    fn write_state(&mut self, s: VsyncState) {
        self.write_u8(match s {
            VsyncState::Vsynced => 0,
            VsyncState::NotVsynced => 1,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_frame_sample(&mut self, e: &FrameSampleEvent) {
        self.write_u8(TAG_FRAME_SAMPLE);
        self.write_u64(e.frame_index);
        self.write_u64(e.present_time.ticks());
        self.write_option_u64(e.sync_time.map(HostTime::ticks));
        self.write_u32(e.present_count);
        self.write_observation(e.observation);
        self.write_state(e.verdict.state);
        self.write_u32(e.verdict.counter);
    }

    fn on_vsync_transition(&mut self, e: &VsyncTransitionEvent) {
        self.write_u8(TAG_VSYNC_TRANSITION);
        self.write_u64(e.frame_index);
        self.write_u64(e.timestamp.ticks());
        self.write_state(e.state);
    }

    fn on_delta_time(&mut self, e: &DeltaTimeEvent) {
        self.write_u8(TAG_DELTA_TIME);
        self.write_u64(e.frame_index);
        self.write_u64(e.timestamp.ticks());
        self.write_u8(u8::from(e.vsynced));
        self.write_i64(e.raw_ticks);
        self.write_u64(e.delta.ticks());
        self.write_u64(e.refresh_period.ticks());
        self.write_option_u64(e.refresh_multiple);
        self.write_i64(e.snap_error);
        self.write_i64(e.non_vsync_error);
        self.write_i64(e.smoothed_non_vsync_delta);
        self.write_i64(e.drift);
    }

    fn on_pace(&mut self, e: &PaceEvent) {
        self.write_u8(TAG_PACE);
        self.write_u64(e.frame_index);
        self.write_u64(e.timestamp.ticks());
        self.write_u64(e.delta.ticks());
        self.write_u32(e.fixed_steps);
        self.write_u8(u8::from(e.hitch));
        self.write_u64(e.accumulator.ticks());
        self.write_f64(e.interpolation);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedEvent {
    /// A [`FrameSampleEvent`].
    FrameSample(FrameSampleEvent),
    /// A [`VsyncTransitionEvent`].
    VsyncTransition(VsyncTransitionEvent),
    /// A [`DeltaTimeEvent`].
    DeltaTime(DeltaTimeEvent),
    /// A [`PaceEvent`].
    Pace(PaceEvent),
}

impl RecordedEvent {
    /// Returns the frame the event belongs to.
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        match self {
            Self::FrameSample(e) => e.frame_index,
            Self::VsyncTransition(e) => e.frame_index,
            Self::DeltaTime(e) => e.frame_index,
            Self::Pace(e) => e.frame_index,
        }
    }
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let end = self.pos.checked_add(N)?;
        let bytes = self.data.get(self.pos..end)?.try_into().ok()?;
        self.pos = end;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[b]| b)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_i64(&mut self) -> Option<i64> {
        self.take().map(i64::from_le_bytes)
    }

    fn read_f64(&mut self) -> Option<f64> {
        self.take().map(f64::from_le_bytes)
    }

    fn read_option_u64(&mut self) -> Option<Option<u64>> {
        let present = self.read_u8()?;
        let val = self.read_u64()?;
        Some(if present != 0 { Some(val) } else { None })
    }

    fn read_observation(&mut self) -> Option<Option<SyncObservation>> {
        let flags = self.read_u8()?;
        Some((flags & OBS_PRESENT != 0).then_some(SyncObservation {
            was_frame_synced: flags & OBS_SYNCED != 0,
            definitely_not_vsynced: flags & OBS_STUCK != 0,
            transitioned: flags & OBS_TRANSITIONED != 0,
        }))
    }

    fn read_state(&mut self) -> Option<VsyncState> {
        Some(match self.read_u8()? {
            0 => VsyncState::Vsynced,
            _ => VsyncState::NotVsynced,
        })
    }

    fn decode_frame_sample(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FrameSample(FrameSampleEvent {
            frame_index: self.read_u64()?,
            present_time: HostTime(self.read_u64()?),
            sync_time: self.read_option_u64()?.map(HostTime),
            present_count: self.read_u32()?,
            observation: self.read_observation()?,
            verdict: VsyncVerdict {
                state: self.read_state()?,
                counter: self.read_u32()?,
            },
        }))
    }

    fn decode_vsync_transition(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::VsyncTransition(VsyncTransitionEvent {
            frame_index: self.read_u64()?,
            timestamp: HostTime(self.read_u64()?),
            state: self.read_state()?,
        }))
    }

    fn decode_delta_time(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::DeltaTime(DeltaTimeEvent {
            frame_index: self.read_u64()?,
            timestamp: HostTime(self.read_u64()?),
            vsynced: self.read_u8()? != 0,
            raw_ticks: self.read_i64()?,
            delta: Duration(self.read_u64()?),
            refresh_period: Duration(self.read_u64()?),
            refresh_multiple: self.read_option_u64()?,
            snap_error: self.read_i64()?,
            non_vsync_error: self.read_i64()?,
            smoothed_non_vsync_delta: self.read_i64()?,
            drift: self.read_i64()?,
        }))
    }

    fn decode_pace(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Pace(PaceEvent {
            frame_index: self.read_u64()?,
            timestamp: HostTime(self.read_u64()?),
            delta: Duration(self.read_u64()?),
            fixed_steps: self.read_u32()?,
            hitch: self.read_u8()? != 0,
            accumulator: Duration(self.read_u64()?),
            interpolation: self.read_f64()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_FRAME_SAMPLE => self.decode_frame_sample(),
            TAG_VSYNC_TRANSITION => self.decode_vsync_transition(),
            TAG_DELTA_TIME => self.decode_delta_time(),
            TAG_PACE => self.decode_pace(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event() -> FrameSampleEvent {
        FrameSampleEvent {
            frame_index: 7,
            present_time: HostTime(1_016_900),
            sync_time: Some(HostTime(1_016_667)),
            present_count: 8,
            observation: Some(SyncObservation {
                was_frame_synced: false,
                definitely_not_vsynced: true,
                transitioned: true,
            }),
            verdict: VsyncVerdict {
                state: VsyncState::NotVsynced,
                counter: 0,
            },
        }
    }

    fn delta_event() -> DeltaTimeEvent {
        DeltaTimeEvent {
            frame_index: 7,
            timestamp: HostTime(1_016_900),
            vsynced: false,
            raw_ticks: -12,
            delta: Duration(16_500),
            refresh_period: Duration(16_667),
            refresh_multiple: None,
            snap_error: 0,
            non_vsync_error: -340,
            smoothed_non_vsync_delta: 16_500,
            drift: -340,
        }
    }

    fn pace_event() -> PaceEvent {
        PaceEvent {
            frame_index: 7,
            timestamp: HostTime(1_016_900),
            delta: Duration(16_500),
            fixed_steps: 2,
            hitch: false,
            accumulator: Duration(4_000),
            interpolation: 0.48,
        }
    }

    #[test]
    fn frame_sample_keeps_observation_flags() {
        let mut rec = RecorderSink::new();
        rec.on_frame_sample(&sample_event());
        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events, [RecordedEvent::FrameSample(sample_event())]);
    }

    #[test]
    fn frame_sample_without_stats() {
        let mut rec = RecorderSink::new();
        let orig = FrameSampleEvent {
            sync_time: None,
            observation: None,
            present_count: 0,
            ..sample_event()
        };
        rec.on_frame_sample(&orig);
        match decode(rec.as_bytes()).next() {
            Some(RecordedEvent::FrameSample(e)) => {
                assert_eq!(e.sync_time, None);
                assert_eq!(e.observation, None);
            }
            other => panic!("expected FrameSample, got {other:?}"),
        }
    }

    #[test]
    fn signed_and_float_fields_survive() {
        let mut rec = RecorderSink::new();
        rec.on_delta_time(&delta_event());
        rec.on_pace(&pace_event());
        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(
            events,
            [
                RecordedEvent::DeltaTime(delta_event()),
                RecordedEvent::Pace(pace_event()),
            ]
        );
    }

    #[test]
    fn mixed_stream_in_order() {
        let mut rec = RecorderSink::new();
        rec.on_frame_sample(&sample_event());
        rec.on_vsync_transition(&VsyncTransitionEvent {
            frame_index: 7,
            timestamp: HostTime(1_016_900),
            state: VsyncState::NotVsynced,
        });
        rec.on_delta_time(&delta_event());
        rec.on_pace(&pace_event());
        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], RecordedEvent::FrameSample(_)));
        assert!(matches!(events[1], RecordedEvent::VsyncTransition(_)));
        assert!(matches!(events[2], RecordedEvent::DeltaTime(_)));
        assert!(matches!(events[3], RecordedEvent::Pace(_)));
        assert!(events.iter().all(|e| e.frame_index() == 7));
    }

    #[test]
    fn truncated_record_stops_decoding() {
        let mut rec = RecorderSink::new();
        rec.on_pace(&pace_event());
        rec.on_pace(&pace_event());
        let bytes = rec.into_bytes();
        let cut = &bytes[..bytes.len() - 3];
        assert_eq!(decode(cut).count(), 1);
    }

    #[test]
    fn unknown_tag_stops_decoding() {
        let mut rec = RecorderSink::new();
        rec.on_pace(&pace_event());
        let mut bytes = rec.into_bytes();
        bytes.push(0xff);
        bytes.extend_from_slice(&[0; 16]);
        assert_eq!(decode(&bytes).count(), 1);
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        let events: Vec<_> = decode(&[]).collect();
        assert!(events.is_empty());
    }
}
