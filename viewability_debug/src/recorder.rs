// Copyright 2026 the Viewability Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].
//!
//! Counts are stored as `u64`; rejection reasons as a one-byte code followed
//! by the measured ratio, which is zero for every reason but
//! [`Rejection::BelowThreshold`].

use viewability_core::registry::TrackingId;
use viewability_core::time::{Duration, HostTime};
use viewability_core::trace::{
    ConfigAppliedEvent, ItemEvent, ItemEventKind, PassBeginEvent, PassSummary, TraceSink,
    VisibilitySampleEvent,
};
use viewability_core::visibility::{Rejection, Visibility};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_PASS_BEGIN: u8 = 1;
const TAG_ITEM: u8 = 2;
const TAG_PASS_END: u8 = 3;
const TAG_CONFIG_APPLIED: u8 = 4;
const TAG_VISIBILITY_SAMPLE: u8 = 5;

const KIND_STARTED: u8 = 0;
const KIND_RESET: u8 = 1;
const KIND_RECONFIGURED: u8 = 2;
const KIND_COMPLETED: u8 = 3;
const KIND_DROPPED: u8 = 4;

/// Rejection code meaning "no rejection" (visible).
const REJECTION_NONE: u8 = 0;

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

    /// Discards everything recorded so far.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_f64(&mut self, v: f64) {
        self.write_u64(v.to_bits());
    }

    fn write_count(&mut self, n: usize) {
        self.write_u64(u64::try_from(n).unwrap_or(u64::MAX));
    }

    fn write_rejection(&mut self, r: Option<Rejection>) {
        let (code, ratio) = match r {
            None => (REJECTION_NONE, 0.0),
            Some(Rejection::Detached) => (1, 0.0),
            Some(Rejection::Hidden) => (2, 0.0),
            Some(Rejection::Transparent) => (3, 0.0),
            Some(Rejection::ScreenNotTopmost) => (4, 0.0),
            Some(Rejection::Clipped) => (5, 0.0),
            Some(Rejection::ZeroArea) => (6, 0.0),
            Some(Rejection::ContainerUnavailable) => (7, 0.0),
            Some(Rejection::BelowThreshold { ratio }) => (8, ratio),
        };
        self.write_u8(code);
        self.write_f64(ratio);
    }
}

impl TraceSink for RecorderSink {
    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        self.write_u8(TAG_PASS_BEGIN);
        self.write_u64(e.pass_index);
        self.write_u64(e.now.ticks());
        self.write_count(e.tracked);
    }

    fn on_item(&mut self, e: &ItemEvent) {
        self.write_u8(TAG_ITEM);
        self.write_u64(e.pass_index);
        self.write_u64(e.id.get());
        self.write_u64(e.now.ticks());
        let (kind, rejection) = match e.kind {
            ItemEventKind::Started => (KIND_STARTED, None),
            ItemEventKind::Reset(r) => (KIND_RESET, Some(r)),
            ItemEventKind::Reconfigured => (KIND_RECONFIGURED, None),
            ItemEventKind::Completed => (KIND_COMPLETED, None),
            ItemEventKind::Dropped => (KIND_DROPPED, None),
        };
        self.write_u8(kind);
        self.write_rejection(rejection);
    }

    fn on_pass_end(&mut self, s: &PassSummary) {
        self.write_u8(TAG_PASS_END);
        self.write_u64(s.pass_index);
        self.write_u64(s.now.ticks());
        for n in [
            s.evaluated,
            s.visible,
            s.frozen,
            s.occluded,
            s.started,
            s.reset,
            s.completed,
            s.dropped,
        ] {
            self.write_count(n);
        }
    }

    fn on_config_applied(&mut self, e: &ConfigAppliedEvent) {
        self.write_u8(TAG_CONFIG_APPLIED);
        self.write_u64(e.now.ticks());
        self.write_u64(e.detection_interval.ticks());
        self.write_u64(e.duration_threshold.ticks());
        self.write_count(e.reset_items);
    }

    fn on_visibility_sample(&mut self, e: &VisibilitySampleEvent) {
        self.write_u8(TAG_VISIBILITY_SAMPLE);
        self.write_u64(e.pass_index);
        self.write_u64(e.id.get());
        match e.visibility {
            Visibility::Visible { ratio } => {
                self.write_u8(REJECTION_NONE);
                self.write_f64(ratio);
            }
            Visibility::NotVisible(r) => self.write_rejection(Some(r)),
        }
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`PassBeginEvent`].
    PassBegin(PassBeginEvent),
    /// An [`ItemEvent`].
    Item(ItemEvent),
    /// A [`PassSummary`].
    PassEnd(PassSummary),
    /// A [`ConfigAppliedEvent`].
    ConfigApplied(ConfigAppliedEvent),
    /// A [`VisibilitySampleEvent`].
    VisibilitySample(VisibilitySampleEvent),
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
    fn read_u8(&mut self) -> Option<u8> {
        let v = *self.data.get(self.pos)?;
        self.pos += 1;
        Some(v)
    }

    fn read_u64(&mut self) -> Option<u64> {
        let bytes = self.data.get(self.pos..self.pos + 8)?;
        let v = u64::from_le_bytes(bytes.try_into().ok()?);
        self.pos += 8;
        Some(v)
    }

    fn read_f64(&mut self) -> Option<f64> {
        self.read_u64().map(f64::from_bits)
    }

    fn read_count(&mut self) -> Option<usize> {
        self.read_u64()
            .map(|v| usize::try_from(v).unwrap_or(usize::MAX))
    }

    fn read_rejection(&mut self) -> Option<(Option<Rejection>, f64)> {
        let code = self.read_u8()?;
        let ratio = self.read_f64()?;
        let rejection = match code {
            REJECTION_NONE => None,
            1 => Some(Rejection::Detached),
            2 => Some(Rejection::Hidden),
            3 => Some(Rejection::Transparent),
            4 => Some(Rejection::ScreenNotTopmost),
            5 => Some(Rejection::Clipped),
            6 => Some(Rejection::ZeroArea),
            7 => Some(Rejection::ContainerUnavailable),
            8 => Some(Rejection::BelowThreshold { ratio }),
            _ => return None,
        };
        Some((rejection, ratio))
    }

    fn decode_pass_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PassBegin(PassBeginEvent {
            pass_index: self.read_u64()?,
            now: HostTime(self.read_u64()?),
            tracked: self.read_count()?,
        }))
    }

    fn decode_item(&mut self) -> Option<RecordedEvent> {
        let pass_index = self.read_u64()?;
        let id = TrackingId::from_raw(self.read_u64()?);
        let now = HostTime(self.read_u64()?);
        let kind = self.read_u8()?;
        let (rejection, _) = self.read_rejection()?;
        let kind = match (kind, rejection) {
            (KIND_STARTED, _) => ItemEventKind::Started,
            (KIND_RESET, Some(r)) => ItemEventKind::Reset(r),
            (KIND_RECONFIGURED, _) => ItemEventKind::Reconfigured,
            (KIND_COMPLETED, _) => ItemEventKind::Completed,
            (KIND_DROPPED, _) => ItemEventKind::Dropped,
            _ => return None,
        };
        Some(RecordedEvent::Item(ItemEvent {
            pass_index,
            id,
            now,
            kind,
        }))
    }

    fn decode_pass_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PassEnd(PassSummary {
            pass_index: self.read_u64()?,
            now: HostTime(self.read_u64()?),
            evaluated: self.read_count()?,
            visible: self.read_count()?,
            frozen: self.read_count()?,
            occluded: self.read_count()?,
            started: self.read_count()?,
            reset: self.read_count()?,
            completed: self.read_count()?,
            dropped: self.read_count()?,
        }))
    }

    fn decode_config_applied(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::ConfigApplied(ConfigAppliedEvent {
            now: HostTime(self.read_u64()?),
            detection_interval: Duration(self.read_u64()?),
            duration_threshold: Duration(self.read_u64()?),
            reset_items: self.read_count()?,
        }))
    }

    fn decode_visibility_sample(&mut self) -> Option<RecordedEvent> {
        let pass_index = self.read_u64()?;
        let id = TrackingId::from_raw(self.read_u64()?);
        let visibility = match self.read_rejection()? {
            (None, ratio) => Visibility::Visible { ratio },
            (Some(r), _) => Visibility::NotVisible(r),
        };
        Some(RecordedEvent::VisibilitySample(VisibilitySampleEvent {
            pass_index,
            id,
            visibility,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_PASS_BEGIN => self.decode_pass_begin(),
            TAG_ITEM => self.decode_item(),
            TAG_PASS_END => self.decode_pass_end(),
            TAG_CONFIG_APPLIED => self.decode_config_applied(),
            TAG_VISIBILITY_SAMPLE => self.decode_visibility_sample(),
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

    fn item(kind: ItemEventKind) -> ItemEvent {
        ItemEvent {
            pass_index: 4,
            id: TrackingId::from_raw(11),
            now: HostTime(1_000),
            kind,
        }
    }

    #[test]
    fn reset_reason_survives_recording() {
        let mut rec = RecorderSink::new();
        rec.on_item(&item(ItemEventKind::Reset(Rejection::BelowThreshold {
            ratio: 0.25,
        })));

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 1);
        match &events[0] {
            RecordedEvent::Item(e) => {
                assert_eq!(e.pass_index, 4);
                assert_eq!(e.id, TrackingId::from_raw(11));
                assert_eq!(
                    e.kind,
                    ItemEventKind::Reset(Rejection::BelowThreshold { ratio: 0.25 })
                );
            }
            other => panic!("expected Item, got {other:?}"),
        }
    }

    #[test]
    fn pass_summary_counts_survive_recording() {
        let mut rec = RecorderSink::new();
        let orig = PassSummary {
            pass_index: 2,
            now: HostTime(500),
            evaluated: 5,
            visible: 3,
            frozen: 1,
            occluded: 0,
            started: 2,
            reset: 1,
            completed: 1,
            dropped: 1,
        };
        rec.on_pass_end(&orig);

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        match events.as_slice() {
            [RecordedEvent::PassEnd(s)] => assert_eq!(*s, orig),
            other => panic!("expected one PassEnd, got {other:?}"),
        }
    }

    #[test]
    fn mixed_stream_keeps_order() {
        let mut rec = RecorderSink::new();
        rec.on_pass_begin(&PassBeginEvent {
            pass_index: 0,
            now: HostTime(0),
            tracked: 1,
        });
        rec.on_visibility_sample(&VisibilitySampleEvent {
            pass_index: 0,
            id: TrackingId::from_raw(0),
            visibility: Visibility::Visible { ratio: 0.75 },
        });
        rec.on_item(&item(ItemEventKind::Started));
        rec.on_pass_end(&PassSummary::default());
        rec.on_config_applied(&ConfigAppliedEvent {
            now: HostTime(10),
            detection_interval: Duration(250),
            duration_threshold: Duration(1_000),
            reset_items: 1,
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 5);
        assert!(matches!(events[0], RecordedEvent::PassBegin(_)), "{events:?}");
        assert!(
            matches!(
                events[1],
                RecordedEvent::VisibilitySample(VisibilitySampleEvent {
                    visibility: Visibility::Visible { ratio },
                    ..
                }) if ratio == 0.75
            ),
            "{events:?}"
        );
        assert!(matches!(events[2], RecordedEvent::Item(_)), "{events:?}");
        assert!(matches!(events[3], RecordedEvent::PassEnd(_)), "{events:?}");
        assert!(matches!(events[4], RecordedEvent::ConfigApplied(_)), "{events:?}");
    }

    #[test]
    fn truncated_buffer_stops_cleanly() {
        let mut rec = RecorderSink::new();
        rec.on_item(&item(ItemEventKind::Completed));
        rec.on_item(&item(ItemEventKind::Dropped));
        let bytes = rec.into_bytes();
        let cut = &bytes[..bytes.len() - 3];
        let events: Vec<_> = decode(cut).collect();
        assert_eq!(events.len(), 1, "only the complete record decodes");
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        let events: Vec<_> = decode(&[]).collect();
        assert!(events.is_empty(), "nothing recorded");
    }
}
