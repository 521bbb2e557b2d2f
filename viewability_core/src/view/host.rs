// Copyright 2026 the Viewability Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! [`ElementHost`] implementation for [`ViewTree`].
//!
//! Every query tolerates stale handles: a dead view reads as not alive,
//! zero-sized, parentless, hidden and detached.

use kurbo::{Affine, Rect};

use super::id::{INVALID, ScreenId, ViewId};
use super::tree::ViewTree;
use crate::element::{ElementHost, WindowInfo};

impl ViewTree {
    /// Returns the slot index of a live handle.
    fn live(&self, id: ViewId) -> Option<u32> {
        self.is_alive(id).then_some(id.idx)
    }
}

impl ElementHost for ViewTree {
    type Element = ViewId;
    type Screen = ScreenId;

    fn is_alive(&self, element: ViewId) -> bool {
        Self::is_alive(self, element)
    }

    fn bounds(&self, element: ViewId) -> Rect {
        self.live(element)
            .map_or(Rect::ZERO, |idx| self.bounds_at(idx))
    }

    fn parent(&self, element: ViewId) -> Option<ViewId> {
        let idx = self.live(element)?;
        let p = self.parent[idx as usize];
        (p != INVALID).then(|| self.handle(p))
    }

    fn convert_to_ancestor(&self, element: ViewId, rect: Rect, ancestor: ViewId) -> Rect {
        let Some(mut idx) = self.live(element) else {
            return rect;
        };
        let mut to_ancestor = Affine::IDENTITY;
        while idx != ancestor.idx {
            let p = self.parent[idx as usize];
            if p == INVALID {
                // `ancestor` is not on the chain; stop at the root.
                break;
            }
            to_ancestor = self.local_to_parent(idx) * to_ancestor;
            idx = p;
        }
        to_ancestor.transform_rect_bbox(rect)
    }

    fn is_hidden(&self, element: ViewId) -> bool {
        self.live(element)
            .is_none_or(|idx| self.flags[idx as usize].hidden)
    }

    fn opacity(&self, element: ViewId) -> f64 {
        self.live(element)
            .map_or(0.0, |idx| self.opacity[idx as usize])
    }

    fn clips_to_bounds(&self, element: ViewId) -> bool {
        self.live(element)
            .is_some_and(|idx| self.flags[idx as usize].clips_to_bounds)
    }

    fn window(&self, element: ViewId) -> Option<WindowInfo> {
        let idx = self.live(element)?;
        self.window[self.root_index(idx) as usize]
    }

    fn screen(&self, element: ViewId) -> Option<ScreenId> {
        let idx = self.live(element)?;
        self.screen_at(idx)
    }

    fn is_screen_topmost(&self, screen: ScreenId) -> bool {
        self.screen_topmost
            .get(screen.0 as usize)
            .copied()
            .unwrap_or(false)
    }
}
