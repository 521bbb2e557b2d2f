// Copyright 2026 the Viewability Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Element capability contract.
//!
//! The tracker never sees a concrete UI type. Hosts implement [`ElementHost`]
//! over whatever tree they own (a native view hierarchy, a DOM, a layer store,
//! or the bundled [`ViewTree`](crate::view::ViewTree)) and hand the tracker
//! copyable, non-owning element handles.
//!
//! # Handle contract
//!
//! - Handles are compared by value; two handles are the same element iff they
//!   are equal. A host that recycles storage slots must make a recycled slot
//!   produce a *different* handle (e.g. by bumping a generation counter), so
//!   stale registrations can never alias new content.
//! - Liveness is queried through [`is_alive`](ElementHost::is_alive). The
//!   tracker calls every other method only on handles that were reported
//!   alive earlier in the same pass.
//! - Calls happen on the thread that owns the host; a pass reads one
//!   consistent snapshot and never mutates the host.

use core::fmt::Debug;
use core::hash::Hash;

use kurbo::Rect;

/// The attached root of an element: where its window sits on the screen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WindowInfo {
    /// The window's frame in screen coordinates. Root-element coordinates are
    /// translated by this frame's origin to reach screen space.
    pub frame: Rect,
    /// Full bounds of the screen displaying the window.
    pub screen_bounds: Rect,
}

/// Geometry, ancestry and opacity queries the visibility evaluator needs.
pub trait ElementHost {
    /// Non-owning handle identifying one element.
    type Element: Copy + Eq + Hash + Debug;
    /// Identifies a logical screen (a page, a navigation destination, a tab).
    type Screen: Copy + Eq + Debug;

    /// Returns whether the handle still refers to a live element.
    fn is_alive(&self, element: Self::Element) -> bool;

    /// Returns the element's bounding rectangle in its own coordinate space.
    fn bounds(&self, element: Self::Element) -> Rect;

    /// Returns the element's parent, or `None` at a root.
    fn parent(&self, element: Self::Element) -> Option<Self::Element>;

    /// Converts `rect` from `element`'s coordinate space into `ancestor`'s.
    ///
    /// `ancestor` is always `element` itself or one of its ancestors.
    fn convert_to_ancestor(
        &self,
        element: Self::Element,
        rect: Rect,
        ancestor: Self::Element,
    ) -> Rect;

    /// Returns whether the element is flagged hidden.
    fn is_hidden(&self, element: Self::Element) -> bool;

    /// Returns the element's own opacity in `[0, 1]`.
    fn opacity(&self, element: Self::Element) -> f64;

    /// Returns whether the element clips its descendants to its bounds.
    fn clips_to_bounds(&self, element: Self::Element) -> bool;

    /// Returns the window the element is attached to, or `None` if it is
    /// detached from any window.
    fn window(&self, element: Self::Element) -> Option<WindowInfo>;

    /// Returns the logical screen containing the element, if the host
    /// models screens.
    fn screen(&self, element: Self::Element) -> Option<Self::Screen>;

    /// Returns whether `screen` is currently visible and topmost (not covered,
    /// not navigated away from, not backgrounded).
    fn is_screen_topmost(&self, screen: Self::Screen) -> bool;

    /// Returns the root of `element`'s hierarchy.
    fn root(&self, element: Self::Element) -> Self::Element {
        let mut current = element;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }
}
