// Copyright 2026 the Viewability Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-item duration accumulation and one-shot completion.
//!
//! ```text
//!            visible                 visible, elapsed ≥ threshold
//! NotVisible ───────► Accumulating ─────────────────────────────► Completed
//!     ▲                    │
//!     └────────────────────┘
//!         not visible
//! ```
//!
//! Visibility must be continuous: any poll that reports not-visible while
//! accumulating drops the start time, and the next onset starts from zero.
//! `Completed` is terminal.

use alloc::boxed::Box;
use core::fmt;

use crate::time::{Duration, HostTime};

/// Callback invoked once when an element earns its impression.
pub type OnQualify = Box<dyn FnOnce()>;

/// Where an item is in its impression lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImpressionState {
    /// Not currently visible; no time accrued.
    NotVisible,
    /// Continuously visible since `since`.
    Accumulating {
        /// Onset of the current visibility run.
        since: HostTime,
    },
    /// The callback has fired. Frozen.
    Completed,
}

impl ImpressionState {
    /// Returns `true` for [`ImpressionState::Completed`].
    #[must_use]
    pub const fn is_completed(self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// What one observation did to an item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Transition {
    /// Nothing changed.
    None,
    /// A visibility run began.
    Started,
    /// A visibility run was interrupted.
    Reset,
    /// The threshold was reached and the callback ran.
    Completed,
}

/// The tracker's record of one registered element.
pub struct TrackedItem<E> {
    element: E,
    on_qualify: Option<OnQualify>,
    state: ImpressionState,
}

impl<E: fmt::Debug> fmt::Debug for TrackedItem<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackedItem")
            .field("element", &self.element)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<E: Copy> TrackedItem<E> {
    /// Creates a fresh item in [`ImpressionState::NotVisible`].
    #[must_use]
    pub fn new(element: E, on_qualify: OnQualify) -> Self {
        Self {
            element,
            on_qualify: Some(on_qualify),
            state: ImpressionState::NotVisible,
        }
    }

    /// The tracked element handle.
    #[must_use]
    pub fn element(&self) -> E {
        self.element
    }

    /// The current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ImpressionState {
        self.state
    }

    /// Feeds one poll result into the state machine.
    ///
    /// On the onset poll the start time is recorded and the threshold checked
    /// at once, so a zero threshold completes on the first visible poll.
    pub fn observe(&mut self, visible: bool, now: HostTime, threshold: Duration) -> Transition {
        match (self.state, visible) {
            (ImpressionState::Completed, _) | (ImpressionState::NotVisible, false) => {
                Transition::None
            }
            (ImpressionState::Accumulating { .. }, false) => {
                self.state = ImpressionState::NotVisible;
                Transition::Reset
            }
            (ImpressionState::NotVisible, true) => {
                self.state = ImpressionState::Accumulating { since: now };
                if threshold.is_zero() {
                    self.complete();
                    Transition::Completed
                } else {
                    Transition::Started
                }
            }
            (ImpressionState::Accumulating { since }, true) => {
                if now.saturating_duration_since(since) >= threshold {
                    self.complete();
                    Transition::Completed
                } else {
                    Transition::None
                }
            }
        }
    }

    /// Drops an in-flight visibility run. Returns `true` if one was dropped.
    pub fn reset(&mut self) -> bool {
        if matches!(self.state, ImpressionState::Accumulating { .. }) {
            self.state = ImpressionState::NotVisible;
            true
        } else {
            false
        }
    }

    fn complete(&mut self) {
        self.state = ImpressionState::Completed;
        if let Some(callback) = self.on_qualify.take() {
            callback();
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use core::cell::Cell;

    use super::*;

    const SECOND: Duration = Duration(1_000_000_000);

    fn counting(element: u32) -> (TrackedItem<u32>, Rc<Cell<u32>>) {
        let fired = Rc::new(Cell::new(0));
        let counter = fired.clone();
        let item = TrackedItem::new(element, Box::new(move || counter.set(counter.get() + 1)));
        (item, fired)
    }

    fn at(millis: u64) -> HostTime {
        HostTime(millis * 1_000_000)
    }

    #[test]
    fn fires_once_after_continuous_visibility() {
        let (mut item, fired) = counting(1);
        assert_eq!(item.observe(true, at(0), SECOND), Transition::Started);
        assert_eq!(item.observe(true, at(500), SECOND), Transition::None);
        assert_eq!(fired.get(), 0, "not yet");
        assert_eq!(item.observe(true, at(1000), SECOND), Transition::Completed);
        assert_eq!(fired.get(), 1, "fired at the threshold");
        assert_eq!(item.state(), ImpressionState::Completed);

        assert_eq!(item.observe(true, at(2000), SECOND), Transition::None);
        assert_eq!(item.observe(false, at(3000), SECOND), Transition::None);
        assert_eq!(fired.get(), 1, "completed items stay frozen");
    }

    #[test]
    fn gap_restarts_the_clock() {
        let (mut item, fired) = counting(1);
        item.observe(true, at(0), SECOND);
        item.observe(true, at(900), SECOND);
        assert_eq!(item.observe(false, at(950), SECOND), Transition::Reset);
        assert_eq!(item.state(), ImpressionState::NotVisible);

        assert_eq!(item.observe(true, at(1000), SECOND), Transition::Started);
        assert_eq!(item.observe(true, at(1900), SECOND), Transition::None);
        assert_eq!(fired.get(), 0, "no credit carried across the gap");
        assert_eq!(item.observe(true, at(2000), SECOND), Transition::Completed);
    }

    #[test]
    fn zero_threshold_completes_on_onset() {
        let (mut item, fired) = counting(1);
        assert_eq!(item.observe(true, at(5), Duration::ZERO), Transition::Completed);
        assert_eq!(fired.get(), 1, "fires immediately");
    }

    #[test]
    fn reset_only_affects_accumulating_items() {
        let (mut item, _) = counting(1);
        assert!(!item.reset(), "nothing to reset yet");
        item.observe(true, at(0), SECOND);
        assert!(item.reset(), "run dropped");
        assert_eq!(item.state(), ImpressionState::NotVisible);

        item.observe(true, at(0), Duration::ZERO);
        assert!(!item.reset(), "completed items are untouched");
        assert!(item.state().is_completed(), "still completed");
    }

    #[test]
    fn backwards_clock_does_not_complete() {
        let (mut item, fired) = counting(1);
        item.observe(true, at(1000), SECOND);
        assert_eq!(item.observe(true, at(10), SECOND), Transition::None);
        assert_eq!(fired.get(), 0, "negative elapsed reads as zero");
    }
}
