// Copyright 2026 the Viewability Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Timestamps
//! are converted to milliseconds using a [`Timebase`].

use std::io::Write;

use viewability_core::time::{Duration, HostTime, Timebase};
use viewability_core::trace::{
    ConfigAppliedEvent, ItemEvent, ItemEventKind, PassBeginEvent, PassSummary, TraceSink,
    VisibilitySampleEvent,
};
use viewability_core::visibility::{Rejection, Visibility};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    timebase: Timebase,
    samples: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("timebase", &self.timebase)
            .field("samples", &self.samples)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr(timebase: Timebase) -> Self {
        Self::with_writer(Box::new(std::io::stderr()), timebase)
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>, timebase: Timebase) -> Self {
        Self::with_writer(writer, timebase)
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W, timebase: Timebase) -> Self {
        Self {
            writer,
            timebase,
            samples: false,
        }
    }

    /// Also prints one line per evaluated item per pass. Off by default,
    /// since it is loud with many tracked elements.
    #[must_use]
    pub fn with_samples(mut self, samples: bool) -> Self {
        self.samples = samples;
        self
    }

    /// Consumes the sink and returns the destination.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn ms(&self, t: HostTime) -> f64 {
        self.timebase.ticks_to_nanos(t.ticks()) as f64 / 1e6
    }

    fn span_ms(&self, d: Duration) -> f64 {
        d.to_nanos(self.timebase) as f64 / 1e6
    }
}

fn rejection_name(r: Rejection) -> &'static str {
    match r {
        Rejection::Detached => "detached",
        Rejection::Hidden => "hidden",
        Rejection::Transparent => "transparent",
        Rejection::ScreenNotTopmost => "screen-not-topmost",
        Rejection::Clipped => "clipped",
        Rejection::ZeroArea => "zero-area",
        Rejection::ContainerUnavailable => "container-unavailable",
        Rejection::BelowThreshold { .. } => "below-threshold",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[pass:begin] pass={} at {:.3}ms tracked={}",
            e.pass_index,
            self.ms(e.now),
            e.tracked,
        );
    }

    fn on_item(&mut self, e: &ItemEvent) {
        let what = match e.kind {
            ItemEventKind::Started => "started".to_owned(),
            ItemEventKind::Reset(Rejection::BelowThreshold { ratio }) => {
                format!("reset (below-threshold ratio={ratio:.3})")
            }
            ItemEventKind::Reset(r) => format!("reset ({})", rejection_name(r)),
            ItemEventKind::Reconfigured => "reset (reconfigured)".to_owned(),
            ItemEventKind::Completed => "IMPRESSION".to_owned(),
            ItemEventKind::Dropped => "dropped".to_owned(),
        };
        let _ = writeln!(
            self.writer,
            "[item] pass={} id={} {what} at {:.3}ms",
            e.pass_index,
            e.id.get(),
            self.ms(e.now),
        );
    }

    fn on_pass_end(&mut self, s: &PassSummary) {
        let _ = writeln!(
            self.writer,
            "[pass:end] pass={} evaluated={} visible={} frozen={} occluded={} \
             started={} reset={} completed={} dropped={}",
            s.pass_index,
            s.evaluated,
            s.visible,
            s.frozen,
            s.occluded,
            s.started,
            s.reset,
            s.completed,
            s.dropped,
        );
    }

    fn on_config_applied(&mut self, e: &ConfigAppliedEvent) {
        let _ = writeln!(
            self.writer,
            "[config] at {:.3}ms interval={:.3}ms duration={:.3}ms reset={}",
            self.ms(e.now),
            self.span_ms(e.detection_interval),
            self.span_ms(e.duration_threshold),
            e.reset_items,
        );
    }

    fn on_visibility_sample(&mut self, e: &VisibilitySampleEvent) {
        if !self.samples {
            return;
        }
        let verdict = match e.visibility {
            Visibility::Visible { ratio } => format!("visible ratio={ratio:.3}"),
            Visibility::NotVisible(r) => format!(
                "rejected {} ratio={:.3}",
                rejection_name(r),
                e.visibility.ratio()
            ),
        };
        let _ = writeln!(
            self.writer,
            "[sample] pass={} id={} {verdict}",
            e.pass_index,
            e.id.get(),
        );
    }
}
