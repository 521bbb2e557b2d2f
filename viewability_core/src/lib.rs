// Copyright 2026 the Viewability Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Viewability and impression tracking for rendered element trees.
//!
//! `viewability_core` decides whether tracked elements have stayed
//! *qualifying-visible* (shown, opaque enough, on the foreground screen, and
//! with enough of their area unclipped) for a continuous duration, and fires a
//! one-time callback the moment they have. It is `no_std` compatible (with
//! `alloc`) and never sees a concrete UI type: elements are reached through the
//! [`ElementHost`](element::ElementHost) capability trait.
//!
//! # Architecture
//!
//! ```text
//!   Host tick source (interval timer, run loop, display link)
//!       │
//!       ▼
//!   ViewabilityTracker::advance() ──► PollScheduler::take_due()
//!       │                                   │ due
//!       │        ┌──────────────────────────┘
//!       ▼        ▼
//!   Registry ──► visibility::evaluate(ElementHost) ──► Visibility
//!                                                          │
//!                 ┌────────────────────────────────────────┘
//!                 ▼
//!   TrackedItem::observe() ──► Transition ──► on_qualify() (once)
//! ```
//!
//! **[`config`]**: Thresholds and knobs with clamping setters.
//!
//! **[`element`]**: The [`ElementHost`](element::ElementHost) trait hosts
//! implement over their own tree.
//!
//! **[`visibility`]**: The per-poll evaluator: hierarchy walk, per-ancestor
//! clipping, opacity, container and screen restriction, area ratio.
//!
//! **[`impression`]**: Per-item state machine:
//! `NotVisible → Accumulating → Completed`.
//!
//! **[`registry`]**: One entry per element, keyed by a never-reused
//! [`TrackingId`](registry::TrackingId).
//!
//! **[`scheduler`]**: Host-driven repeating poll timer.
//!
//! **[`tracker`]**: The facade tying the above together, with transactional
//! reconfiguration.
//!
//! **[`view`]**: A struct-of-arrays view tree with generational handles that
//! implements `ElementHost`, for tests and hosts without a native tree.
//!
//! **[`time`]**: Monotonic host ticks and timebase conversion.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! pass instrumentation, with zero-overhead [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-item
//!   visibility sample events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod config;
pub mod element;
pub mod impression;
pub mod registry;
pub mod scheduler;
pub mod time;
pub mod trace;
pub mod tracker;
pub mod view;
pub mod visibility;
