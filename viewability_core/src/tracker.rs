// Copyright 2026 the Viewability Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The tracker facade: registration, reconfiguration and poll passes.
//!
//! [`ViewabilityTracker`] owns the registry, the configuration and the poll
//! scheduler. It never owns elements; each pass reads them through an
//! [`ElementHost`] borrowed for the duration of the call.
//!
//! # Driving the tracker
//!
//! ```rust,ignore
//! // From the host's periodic tick (setInterval, a run-loop timer, ...):
//! if let Some(summary) = tracker.advance(&view_tree, now(), &mut Tracer::none()) {
//!     // A pass ran.
//! }
//! // Or sleep until `tracker.next_deadline()`.
//! ```
//!
//! Callbacks run synchronously inside the pass while the tracker is
//! borrowed; they must not call back into it.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::Hash;

use crate::config::ViewabilityConfig;
use crate::element::ElementHost;
use crate::impression::{ImpressionState, Transition};
use crate::registry::{Registry, TrackingId};
use crate::scheduler::PollScheduler;
use crate::time::{Duration, HostTime, Timebase};
#[cfg(feature = "trace-rich")]
use crate::trace::VisibilitySampleEvent;
use crate::trace::{
    ConfigAppliedEvent, ItemEvent, ItemEventKind, PassBeginEvent, PassSummary, Tracer,
};
use crate::visibility::{Rejection, Visibility, evaluate_unscreened};

/// Tracks registered elements and fires each one's callback once it has been
/// qualifying-visible for long enough.
#[derive(Debug)]
pub struct ViewabilityTracker<E> {
    config: ViewabilityConfig<E>,
    timebase: Timebase,
    duration_threshold: Duration,
    registry: Registry<E>,
    scheduler: PollScheduler,
    pass_index: u64,
}

impl<E: Copy + Eq + Hash + Debug> ViewabilityTracker<E> {
    /// Creates a tracker and starts its scheduler; the first pass is due at
    /// `now`.
    #[must_use]
    pub fn new(config: ViewabilityConfig<E>, timebase: Timebase, now: HostTime) -> Self {
        let interval = Duration::from_secs_f64(config.detection_interval(), timebase);
        let mut scheduler = PollScheduler::new(interval);
        scheduler.start(now);
        Self {
            duration_threshold: Duration::from_secs_f64(config.duration_threshold(), timebase),
            config,
            timebase,
            registry: Registry::new(),
            scheduler,
            pass_index: 0,
        }
    }

    // -- Registration --

    /// Starts tracking `element`.
    ///
    /// Idempotent per element: if it is already tracked, the existing
    /// registration keeps its callback and progress and its id is returned.
    ///
    /// Callers that recycle elements for different content (list cells) must
    /// call [`stop_tracking`](Self::stop_tracking) before reuse, or the next
    /// impression is attributed to the old content.
    pub fn start_tracking(
        &mut self,
        element: E,
        on_qualify: impl FnOnce() + 'static,
    ) -> TrackingId {
        self.registry.insert(element, Box::new(on_qualify)).0
    }

    /// Stops tracking `element`. Returns `false` if it was not tracked.
    pub fn stop_tracking(&mut self, element: E) -> bool {
        self.registry.remove_element(element).is_some()
    }

    /// Returns `true` if `element` is registered.
    #[must_use]
    pub fn is_tracking(&self, element: E) -> bool {
        self.registry.id_of(element).is_some()
    }

    /// Returns the registration id for `element`.
    #[must_use]
    pub fn tracking_id(&self, element: E) -> Option<TrackingId> {
        self.registry.id_of(element)
    }

    /// Returns the impression state of `element`, if registered.
    #[must_use]
    pub fn state(&self, element: E) -> Option<ImpressionState> {
        let id = self.registry.id_of(element)?;
        self.registry.get(id).map(|item| item.state())
    }

    /// Number of registered elements, completed ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    // -- Configuration --

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &ViewabilityConfig<E> {
        &self.config
    }

    /// The tick timebase used to convert configured seconds.
    #[must_use]
    pub fn timebase(&self) -> Timebase {
        self.timebase
    }

    /// Installs a new configuration as one step: cancel the scheduler, swap
    /// the configuration, restart the scheduler one new period after `now`,
    /// and drop every in-flight visibility run.
    ///
    /// Completed items stay completed. Returns the number of runs dropped.
    pub fn apply_config(
        &mut self,
        config: ViewabilityConfig<E>,
        now: HostTime,
        tracer: &mut Tracer<'_>,
    ) -> usize {
        self.scheduler.cancel();
        self.config = config;
        self.duration_threshold =
            Duration::from_secs_f64(self.config.duration_threshold(), self.timebase);
        let interval = Duration::from_secs_f64(self.config.detection_interval(), self.timebase);
        self.scheduler.restart(interval, now);

        let pass_index = self.pass_index;
        let mut reset_items = 0;
        for (id, item) in self.registry.iter_mut() {
            if item.reset() {
                reset_items += 1;
                tracer.item(&ItemEvent {
                    pass_index,
                    id,
                    now,
                    kind: ItemEventKind::Reconfigured,
                });
            }
        }

        tracer.config_applied(&ConfigAppliedEvent {
            now,
            detection_interval: interval,
            duration_threshold: self.duration_threshold,
            reset_items,
        });
        reset_items
    }

    /// Edits a copy of the active configuration and installs it with
    /// [`apply_config`](Self::apply_config).
    pub fn update_config(
        &mut self,
        now: HostTime,
        tracer: &mut Tracer<'_>,
        edit: impl FnOnce(&mut ViewabilityConfig<E>),
    ) -> usize {
        let mut config = self.config;
        edit(&mut config);
        self.apply_config(config, now, tracer)
    }

    // -- Scheduling --

    /// Runs a pass if one is due at `now`.
    pub fn advance<H>(
        &mut self,
        host: &H,
        now: HostTime,
        tracer: &mut Tracer<'_>,
    ) -> Option<PassSummary>
    where
        H: ElementHost<Element = E>,
    {
        self.scheduler
            .take_due(now)
            .then(|| self.run_pass(host, now, tracer))
    }

    /// The deadline of the next pass, or `None` after
    /// [`shutdown`](Self::shutdown).
    #[must_use]
    pub fn next_deadline(&self) -> Option<HostTime> {
        self.scheduler.next_due()
    }

    /// Returns `true` until [`shutdown`](Self::shutdown).
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Stops scheduling passes. [`advance`](Self::advance) becomes a no-op;
    /// [`apply_config`](Self::apply_config) starts it again.
    pub fn shutdown(&mut self) {
        self.scheduler.cancel();
    }

    // -- Passes --

    /// Runs one synchronous pass over every registered element, regardless of
    /// the scheduler.
    ///
    /// Per item: unreachable elements are removed, completed items are
    /// skipped, items on a screen that is not topmost are reset without
    /// geometry evaluation, and everything else is evaluated and fed to its
    /// state machine.
    pub fn run_pass<H>(&mut self, host: &H, now: HostTime, tracer: &mut Tracer<'_>) -> PassSummary
    where
        H: ElementHost<Element = E>,
    {
        let pass_index = self.pass_index;
        self.pass_index += 1;
        tracer.pass_begin(&PassBeginEvent {
            pass_index,
            now,
            tracked: self.registry.len(),
        });

        let mut summary = PassSummary {
            pass_index,
            now,
            ..PassSummary::default()
        };
        let mut screens = ScreenMemo::default();
        let config = &self.config;
        let threshold = self.duration_threshold;

        self.registry.retain(|id, item| {
            let element = item.element();
            let event = |kind| ItemEvent {
                pass_index,
                id,
                now,
                kind,
            };

            if !host.is_alive(element) {
                summary.dropped += 1;
                tracer.item(&event(ItemEventKind::Dropped));
                return false;
            }
            if item.state().is_completed() {
                summary.frozen += 1;
                return true;
            }

            if let Some(screen) = host.screen(element)
                && !screens.is_topmost(host, screen)
            {
                if item.reset() {
                    summary.occluded += 1;
                    summary.reset += 1;
                    tracer.item(&event(ItemEventKind::Reset(Rejection::ScreenNotTopmost)));
                }
                return true;
            }

            let visibility = evaluate_unscreened(host, element, config);
            summary.evaluated += 1;
            if visibility.is_visible() {
                summary.visible += 1;
            }
            #[cfg(feature = "trace-rich")]
            tracer.visibility_sample(&VisibilitySampleEvent {
                pass_index,
                id,
                visibility,
            });

            match (item.observe(visibility.is_visible(), now, threshold), visibility) {
                (Transition::Started, _) => {
                    summary.started += 1;
                    tracer.item(&event(ItemEventKind::Started));
                }
                (Transition::Reset, Visibility::NotVisible(rejection)) => {
                    summary.reset += 1;
                    tracer.item(&event(ItemEventKind::Reset(rejection)));
                }
                (Transition::Completed, _) => {
                    summary.completed += 1;
                    tracer.item(&event(ItemEventKind::Completed));
                }
                _ => {}
            }
            true
        });

        tracer.pass_end(&summary);
        summary
    }
}

/// Topmost answers for the screens seen in one pass.
///
/// Screens only need `Eq`, and a pass sees a handful at most, so a linear
/// list does.
struct ScreenMemo<S> {
    seen: Vec<(S, bool)>,
}

impl<S> Default for ScreenMemo<S> {
    fn default() -> Self {
        Self { seen: Vec::new() }
    }
}

impl<S: Copy + Eq> ScreenMemo<S> {
    fn is_topmost<H: ElementHost<Screen = S>>(&mut self, host: &H, screen: S) -> bool {
        if let Some(&(_, topmost)) = self.seen.iter().find(|(s, _)| *s == screen) {
            return topmost;
        }
        let topmost = host.is_screen_topmost(screen);
        self.seen.push((screen, topmost));
        topmost
    }
}
