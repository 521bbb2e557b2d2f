// Copyright 2026 the Viewability Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for poll passes.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! tracker calls as a pass runs. All method bodies default to no-ops, so
//! implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`): gates [`VisibilitySampleEvent`], one
//!   event per evaluated item per pass, and the matching `TraceSink` method.

use crate::registry::TrackingId;
use crate::time::{Duration, HostTime};
use crate::visibility::Rejection;
#[cfg(feature = "trace-rich")]
use crate::visibility::Visibility;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// What happened to one tracked item.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ItemEventKind {
    /// A visibility run began.
    Started,
    /// A visibility run was interrupted for the given reason.
    Reset(Rejection),
    /// A visibility run was dropped because the configuration changed.
    Reconfigured,
    /// The impression fired.
    Completed,
    /// The element became unreachable and its entry was removed.
    Dropped,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a poll pass starts.
#[derive(Clone, Copy, Debug)]
pub struct PassBeginEvent {
    /// Monotonic pass counter.
    pub pass_index: u64,
    /// Host time of the pass.
    pub now: HostTime,
    /// Number of registered items at the start of the pass.
    pub tracked: usize,
}

/// Emitted when an item changes state.
#[derive(Clone, Copy, Debug)]
pub struct ItemEvent {
    /// Pass during which the change happened; the most recent pass for
    /// changes made by reconfiguration.
    pub pass_index: u64,
    /// Which registration changed.
    pub id: TrackingId,
    /// Host time of the change.
    pub now: HostTime,
    /// What happened.
    pub kind: ItemEventKind,
}

/// Emitted when a new configuration is installed.
#[derive(Clone, Copy, Debug)]
pub struct ConfigAppliedEvent {
    /// Host time of the change.
    pub now: HostTime,
    /// New poll period in ticks.
    pub detection_interval: Duration,
    /// New visibility duration threshold in ticks.
    pub duration_threshold: Duration,
    /// Number of in-flight runs that were dropped.
    pub reset_items: usize,
}

/// Per-item evaluation result (requires `trace-rich` feature).
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct VisibilitySampleEvent {
    /// Pass counter.
    pub pass_index: u64,
    /// Which registration was evaluated.
    pub id: TrackingId,
    /// The evaluator's verdict.
    pub visibility: Visibility,
}

/// Per-pass counts, returned from every pass and emitted at its end.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Pass counter.
    pub pass_index: u64,
    /// Host time of the pass.
    pub now: HostTime,
    /// Items whose geometry was evaluated.
    pub evaluated: usize,
    /// Evaluated items that were qualifying-visible.
    pub visible: usize,
    /// Items skipped because they already completed.
    pub frozen: usize,
    /// Items reset by an occluded screen without geometry evaluation.
    pub occluded: usize,
    /// Visibility runs that began.
    pub started: usize,
    /// Visibility runs that were interrupted.
    pub reset: usize,
    /// Impressions that fired.
    pub completed: usize,
    /// Entries removed because their element became unreachable.
    pub dropped: usize,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the tracker.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a poll pass starts.
    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        _ = e;
    }

    /// Called when a tracked item changes state.
    fn on_item(&mut self, e: &ItemEvent) {
        _ = e;
    }

    /// Called with the counts of a finished pass.
    fn on_pass_end(&mut self, s: &PassSummary) {
        _ = s;
    }

    /// Called when a configuration is installed.
    fn on_config_applied(&mut self, e: &ConfigAppliedEvent) {
        _ = e;
    }

    /// Called with each item's evaluation result (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_visibility_sample(&mut self, e: &VisibilitySampleEvent) {
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

    /// Emits a [`PassBeginEvent`].
    #[inline]
    pub fn pass_begin(&mut self, e: &PassBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_pass_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`ItemEvent`].
    #[inline]
    pub fn item(&mut self, e: &ItemEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_item(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PassSummary`].
    #[inline]
    pub fn pass_end(&mut self, s: &PassSummary) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_pass_end(s);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = s;
        }
    }

    /// Emits a [`ConfigAppliedEvent`].
    #[inline]
    pub fn config_applied(&mut self, e: &ConfigAppliedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_config_applied(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`VisibilitySampleEvent`] (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn visibility_sample(&mut self, e: &VisibilitySampleEvent) {
        if let Some(s) = &mut self.sink {
            s.on_visibility_sample(e);
        }
    }
}

impl Default for Tracer<'_> {
    fn default() -> Self {
        Self::none()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_item() -> ItemEvent {
        ItemEvent {
            pass_index: 3,
            id: TrackingId(9),
            now: HostTime(750),
            kind: ItemEventKind::Reset(Rejection::Clipped),
        }
    }

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_pass_begin(&PassBeginEvent {
            pass_index: 0,
            now: HostTime(0),
            tracked: 0,
        });
        sink.on_item(&sample_item());
        sink.on_pass_end(&PassSummary::default());
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.item(&sample_item());
        tracer.pass_end(&PassSummary::default());
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct RecordingSink {
            kinds: Vec<ItemEventKind>,
        }
        impl TraceSink for RecordingSink {
            fn on_item(&mut self, e: &ItemEvent) {
                self.kinds.push(e.kind);
            }
        }

        let mut sink = RecordingSink { kinds: Vec::new() };
        let mut tracer = Tracer::new(&mut sink);
        tracer.item(&sample_item());
        // Access sink after tracer is dropped.
        drop(tracer);
        assert_eq!(sink.kinds, &[ItemEventKind::Reset(Rejection::Clipped)]);
    }
}
