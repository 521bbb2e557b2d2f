// Copyright 2026 the Viewability Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `setInterval` tick source.
//!
//! [`IntervalLoop`] calls back on a fixed period using the browser's
//! `setInterval` API. Each callback receives the current `performance.now()`
//! reading as microsecond [`HostTime`] ticks, ready to hand to
//! [`ViewabilityTracker::advance`]. The tracker keeps its own deadline, so a
//! late or early timer only shifts which pass does the work.
//!
//! [`HostTime`]: viewability_core::time::HostTime
//! [`ViewabilityTracker::advance`]: viewability_core::tracker::ViewabilityTracker::advance

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::{Cell, RefCell};

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use viewability_core::time::HostTime;

// Direct global bindings instead of `web_sys::Window` methods, so no
// Window object has to be fetched on every tick.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = performance, js_name = "now")]
    pub(crate) fn performance_now() -> f64;

    #[wasm_bindgen(js_name = "setInterval")]
    fn set_interval(callback: &JsValue, timeout_ms: i32) -> i32;

    #[wasm_bindgen(js_name = "clearInterval")]
    fn clear_interval(id: i32);
}

/// A `setInterval` loop that calls back with the current [`HostTime`].
///
/// Create with [`IntervalLoop::new`], then call [`start`](Self::start). The
/// interval keeps firing until [`stop`](Self::stop) is called or the
/// `IntervalLoop` is dropped; no callback outlives its owner.
///
/// [`HostTime`]: viewability_core::time::HostTime
pub struct IntervalLoop {
    inner: Rc<IntervalInner>,
}

type IntervalClosure = Closure<dyn FnMut()>;

struct IntervalInner {
    /// The JS closure registered with `setInterval`. Built on first start and
    /// reused across restarts.
    closure: RefCell<Option<IntervalClosure>>,

    callback: RefCell<Box<dyn FnMut(HostTime)>>,

    running: Cell<bool>,

    /// The handle returned by `setInterval`, used by [`clear_interval`].
    interval_id: Cell<i32>,

    /// Period of the live interval, in milliseconds.
    interval_ms: Cell<i32>,

    /// Number of callbacks delivered so far.
    ticks: Cell<u64>,
}

impl IntervalLoop {
    /// Creates a new `IntervalLoop` that is **not yet running**.
    ///
    /// `callback` receives the current [`now`](crate::now) on each interval
    /// once [`start`](Self::start) is called.
    pub fn new(callback: impl FnMut(HostTime) + 'static) -> Self {
        Self {
            inner: Rc::new(IntervalInner {
                closure: RefCell::new(None),
                callback: RefCell::new(Box::new(callback)),
                running: Cell::new(false),
                interval_id: Cell::new(0),
                interval_ms: Cell::new(0),
                ticks: Cell::new(0),
            }),
        }
    }

    /// Starts firing every `interval_ms` milliseconds.
    ///
    /// If already running, this is a no-op; use [`restart`](Self::restart) to
    /// change the period. Negative periods are treated as zero.
    pub fn start(&self, interval_ms: i32) {
        if self.inner.running.get() {
            return;
        }
        self.inner.running.set(true);

        if self.inner.closure.borrow().is_none() {
            let inner = Rc::clone(&self.inner);
            let closure = Closure::wrap(Box::new(move || {
                if !inner.running.get() {
                    return;
                }
                inner.ticks.set(inner.ticks.get() + 1);
                inner.callback.borrow_mut()(crate::now());
            }) as Box<dyn FnMut()>);
            *self.inner.closure.borrow_mut() = Some(closure);
        }

        let interval_ms = interval_ms.max(0);
        if let Some(ref closure) = *self.inner.closure.borrow() {
            let id = set_interval(closure.as_ref().unchecked_ref(), interval_ms);
            self.inner.interval_id.set(id);
        }
        self.inner.interval_ms.set(interval_ms);
    }

    /// Stops the loop and clears the pending interval.
    ///
    /// Can be started again with [`start`](Self::start).
    pub fn stop(&self) {
        if !self.inner.running.get() {
            return;
        }
        self.inner.running.set(false);
        clear_interval(self.inner.interval_id.get());
    }

    /// Stops any live interval and starts a new one with the given period.
    ///
    /// Hosts call this after changing the tracker's detection interval.
    pub fn restart(&self, interval_ms: i32) {
        self.stop();
        self.start(interval_ms);
    }

    /// Returns `true` if the loop is currently running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.running.get()
    }
}

impl Drop for IntervalLoop {
    fn drop(&mut self) {
        self.stop();
        // The closure holds an `Rc` to `inner`; dropping it breaks the cycle.
        self.inner.closure.borrow_mut().take();
    }
}

impl core::fmt::Debug for IntervalLoop {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IntervalLoop")
            .field("running", &self.inner.running.get())
            .field("interval_ms", &self.inner.interval_ms.get())
            .field("ticks", &self.inner.ticks.get())
            .finish_non_exhaustive()
    }
}
