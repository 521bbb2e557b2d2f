// Copyright 2026 the Viewability Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! Each registration gets its own thread lane (`tid` = tracking id + 1), so a
//! registration's runs read left to right; lane 0 carries passes and
//! configuration changes. Pass summaries become counter tracks.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use viewability_core::time::Timebase;
use viewability_core::trace::ItemEventKind;
use viewability_core::visibility::Visibility;

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// Timestamps are converted to microseconds using the provided [`Timebase`].
/// Visibility samples carry no timestamp of their own and are placed at the
/// start of the pass that produced them.
pub fn export(bytes: &[u8], timebase: Timebase, writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    let mut pass_ts = 0.0;

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::PassBegin(e) => {
                pass_ts = ticks_to_us(e.now.ticks(), timebase);
                events.push(json!({
                    "ph": "i",
                    "name": "Pass",
                    "cat": "Scheduler",
                    "ts": pass_ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "pass_index": e.pass_index,
                        "tracked": e.tracked,
                    }
                }));
            }
            RecordedEvent::Item(e) => {
                let (name, reason) = match e.kind {
                    ItemEventKind::Started => ("Started", None),
                    ItemEventKind::Reset(r) => ("Reset", Some(format!("{r:?}"))),
                    ItemEventKind::Reconfigured => ("Reset", Some("Reconfigured".to_owned())),
                    ItemEventKind::Completed => ("Impression", None),
                    ItemEventKind::Dropped => ("Dropped", None),
                };
                events.push(json!({
                    "ph": "i",
                    "name": name,
                    "cat": "Item",
                    "ts": ticks_to_us(e.now.ticks(), timebase),
                    "pid": 0,
                    "tid": lane(e.id.get()),
                    "s": "t",
                    "args": {
                        "pass_index": e.pass_index,
                        "id": e.id.get(),
                        "reason": reason,
                    }
                }));
            }
            RecordedEvent::PassEnd(s) => {
                events.push(json!({
                    "ph": "C",
                    "name": "Items",
                    "cat": "Summary",
                    "ts": ticks_to_us(s.now.ticks(), timebase),
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "evaluated": s.evaluated,
                        "visible": s.visible,
                        "frozen": s.frozen,
                    }
                }));
                events.push(json!({
                    "ph": "C",
                    "name": "Transitions",
                    "cat": "Summary",
                    "ts": ticks_to_us(s.now.ticks(), timebase),
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "started": s.started,
                        "reset": s.reset,
                        "completed": s.completed,
                        "dropped": s.dropped,
                    }
                }));
            }
            RecordedEvent::ConfigApplied(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "ConfigApplied",
                    "cat": "Config",
                    "ts": ticks_to_us(e.now.ticks(), timebase),
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "interval_us": ticks_to_us(e.detection_interval.ticks(), timebase),
                        "duration_us": ticks_to_us(e.duration_threshold.ticks(), timebase),
                        "reset_items": e.reset_items,
                    }
                }));
            }
            RecordedEvent::VisibilitySample(e) => {
                let verdict = match e.visibility {
                    Visibility::Visible { .. } => "Visible".to_owned(),
                    Visibility::NotVisible(r) => format!("{r:?}"),
                };
                events.push(json!({
                    "ph": "i",
                    "name": "Sample",
                    "cat": "Rich",
                    "ts": pass_ts,
                    "pid": 0,
                    "tid": lane(e.id.get()),
                    "s": "t",
                    "args": {
                        "pass_index": e.pass_index,
                        "ratio": e.visibility.ratio(),
                        "verdict": verdict,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn lane(id: u64) -> u64 {
    id.saturating_add(1)
}

fn ticks_to_us(ticks: u64, timebase: Timebase) -> f64 {
    timebase.ticks_to_nanos(ticks) as f64 / 1000.0
}
