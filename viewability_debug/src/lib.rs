// Copyright 2026 the Viewability Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and Chrome trace export for viewability
//! diagnostics.
//!
//! This crate provides [`TraceSink`](viewability_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-event output.
//! - [`recorder::RecorderSink`]: compact binary recording with
//!   [`recorder::decode`] for playback.
//! - [`chrome::export`]: writes Chrome Trace Event Format JSON from recorded
//!   bytes.

pub mod chrome;
pub mod pretty;
pub mod recorder;

#[cfg(test)]
mod tests {
    use kurbo::Rect;
    use viewability_core::config::ViewabilityConfig;
    use viewability_core::element::WindowInfo;
    use viewability_core::time::{HostTime, Timebase};
    use viewability_core::trace::{
        ConfigAppliedEvent, ItemEvent, ItemEventKind, PassBeginEvent, PassSummary, TraceSink,
        Tracer, VisibilitySampleEvent,
    };
    use viewability_core::tracker::ViewabilityTracker;
    use viewability_core::view::ViewTree;

    use crate::pretty::PrettyPrintSink;
    use crate::recorder::{RecordedEvent, RecorderSink, decode};

    /// Forwards every event to two sinks.
    struct Tee<'a>(&'a mut dyn TraceSink, &'a mut dyn TraceSink);

    impl TraceSink for Tee<'_> {
        fn on_pass_begin(&mut self, e: &PassBeginEvent) {
            self.0.on_pass_begin(e);
            self.1.on_pass_begin(e);
        }
        fn on_item(&mut self, e: &ItemEvent) {
            self.0.on_item(e);
            self.1.on_item(e);
        }
        fn on_pass_end(&mut self, s: &PassSummary) {
            self.0.on_pass_end(s);
            self.1.on_pass_end(s);
        }
        fn on_config_applied(&mut self, e: &ConfigAppliedEvent) {
            self.0.on_config_applied(e);
            self.1.on_config_applied(e);
        }
        fn on_visibility_sample(&mut self, e: &VisibilitySampleEvent) {
            self.0.on_visibility_sample(e);
            self.1.on_visibility_sample(e);
        }
    }

    #[test]
    fn tracker_session_records_and_prints() {
        let screen = Rect::new(0.0, 0.0, 400.0, 800.0);
        let mut tree = ViewTree::new();
        let root = tree.create_view(screen);
        tree.attach_window(
            root,
            WindowInfo {
                frame: screen,
                screen_bounds: screen,
            },
        );
        let cell = tree.create_view(Rect::new(0.0, 0.0, 100.0, 100.0));
        tree.add_child(root, cell);

        let config = ViewabilityConfig::new()
            .with_duration_threshold(0.5)
            .with_detection_interval(0.25);
        let mut tracker = ViewabilityTracker::new(config, Timebase::NANOS, HostTime(0));
        tracker.start_tracking(cell, || {});

        let mut rec = RecorderSink::new();
        let mut pretty = PrettyPrintSink::with_writer(Vec::<u8>::new(), Timebase::NANOS);
        for ms in [0_u64, 250, 500] {
            let now = HostTime(ms * 1_000_000);
            let mut tee = Tee(&mut rec, &mut pretty);
            tracker.advance(&tree, now, &mut Tracer::new(&mut tee));
        }

        let kinds: Vec<_> = decode(rec.as_bytes())
            .filter_map(|e| match e {
                RecordedEvent::Item(item) => Some(item.kind),
                _ => None,
            })
            .collect();
        assert_eq!(kinds, [ItemEventKind::Started, ItemEventKind::Completed]);

        let printed = String::from_utf8(pretty.into_inner()).unwrap();
        assert_eq!(printed.matches("[pass:end]").count(), 3, "got: {printed}");
        assert!(printed.contains("IMPRESSION at 500.000ms"), "got: {printed}");
    }
}
