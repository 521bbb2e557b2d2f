// Copyright 2026 the Viewability Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host-driven repeating poll timer.
//!
//! [`PollScheduler`] owns no thread and no platform timer. The host calls
//! [`take_due`](PollScheduler::take_due) from its own tick source (an
//! interval timer, a display link, an event-loop wakeup) and runs one pass
//! whenever it returns `true`. Because the host drives it synchronously,
//! passes can never overlap.
//!
//! Deadlines stay on the grid `start + k * interval`. A host that wakes late
//! gets one pass, not a burst: any periods that elapsed in between are
//! skipped.

use crate::time::{Duration, HostTime};

/// Repeating timer with an explicit, cancellable deadline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollScheduler {
    interval: Duration,
    next_due: Option<HostTime>,
}

impl PollScheduler {
    /// Creates a stopped scheduler with the given period.
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_due: None,
        }
    }

    /// The poll period.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns `true` while a deadline is armed.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    /// The next deadline, or `None` when stopped.
    ///
    /// A host with a one-shot timer can sleep until this instant.
    #[must_use]
    pub const fn next_due(&self) -> Option<HostTime> {
        self.next_due
    }

    /// Arms the scheduler with the first pass due immediately.
    pub fn start(&mut self, now: HostTime) {
        self.next_due = Some(now);
    }

    /// Changes the period and arms the first pass one full period after `now`.
    pub fn restart(&mut self, interval: Duration, now: HostTime) {
        self.interval = interval;
        self.next_due = Some(now.saturating_add(interval));
    }

    /// Disarms the scheduler. [`take_due`](Self::take_due) returns `false`
    /// until it is started again.
    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    /// Returns `true` if a pass is due at `now`, advancing the deadline past
    /// `now` when it does.
    pub fn take_due(&mut self, now: HostTime) -> bool {
        let Some(due) = self.next_due else {
            return false;
        };
        if now < due {
            return false;
        }
        self.next_due = Some(self.following(due, now));
        true
    }

    /// First grid point after `now`, starting from `due`.
    fn following(&self, due: HostTime, now: HostTime) -> HostTime {
        let period = self.interval.ticks();
        if period == 0 {
            return now;
        }
        let missed = now.saturating_duration_since(due).ticks() / period;
        let step = Duration(missed.saturating_add(1).saturating_mul(period));
        due.saturating_add(step)
    }
}
