// Copyright 2026 the Viewability Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays view storage with allocation, topology, and property management.

use alloc::vec::Vec;

use kurbo::{Affine, Point, Rect};

use super::id::{INVALID, ScreenId, ViewId};
use super::traverse::{Ancestors, Children};
use crate::element::WindowInfo;

/// Per-view boolean flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ViewFlags {
    /// Whether the view (and so its subtree) is hidden.
    pub hidden: bool,
    /// Whether the view crops its descendants to its bounds.
    pub clips_to_bounds: bool,
}

/// Struct-of-arrays storage for a view hierarchy.
///
/// Views are addressed by [`ViewId`] handles. Destroyed views are recycled via
/// a free list, and generation counters make old handles read as dead.
///
/// The mutation and getter API panics on stale handles, since that is a bug
/// in the code driving the tree. The [`ElementHost`](crate::element::ElementHost)
/// implementation never panics; it reports stale handles as not alive.
#[derive(Clone, Debug)]
pub struct ViewTree {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Geometry --
    pub(crate) frame: Vec<Rect>,
    pub(crate) bounds_origin: Vec<Point>,
    pub(crate) transform: Vec<Affine>,

    // -- Appearance --
    pub(crate) opacity: Vec<f64>,
    pub(crate) flags: Vec<ViewFlags>,

    // -- Attachment --
    pub(crate) window: Vec<Option<WindowInfo>>,
    pub(crate) screen: Vec<Option<ScreenId>>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Screens --
    pub(crate) screen_topmost: Vec<bool>,
}

impl Default for ViewTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            frame: Vec::new(),
            bounds_origin: Vec::new(),
            transform: Vec::new(),
            opacity: Vec::new(),
            flags: Vec::new(),
            window: Vec::new(),
            screen: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            screen_topmost: Vec::new(),
        }
    }

    // -- Allocation API --

    /// Creates a new detached view with the given frame and returns its handle.
    ///
    /// The view starts fully opaque, shown, not clipping, with no scroll
    /// offset, no transform, no window, and no screen.
    pub fn create_view(&mut self, frame: Rect) -> ViewId {
        let idx = if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot. The generation was bumped on destroy.
            let i = idx as usize;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.frame[i] = frame;
            self.bounds_origin[i] = Point::ORIGIN;
            self.transform[i] = Affine::IDENTITY;
            self.opacity[i] = 1.0;
            self.flags[i] = ViewFlags::default();
            self.window[i] = None;
            self.screen[i] = None;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.frame.push(frame);
            self.bounds_origin.push(Point::ORIGIN);
            self.transform.push(Affine::IDENTITY);
            self.opacity.push(1.0);
            self.flags.push(ViewFlags::default());
            self.window.push(None);
            self.screen.push(None);
            self.generation.push(0);
            idx
        };
        self.handle(idx)
    }

    /// Destroys a view, freeing its slot for reuse.
    ///
    /// Every outstanding handle to the view becomes dead, including handles a
    /// tracker still holds.
    ///
    /// # Panics
    ///
    /// Panics if the view has children (remove them first) or if the handle
    /// is stale.
    pub fn destroy_view(&mut self, id: ViewId) {
        self.validate(id);
        let idx = id.idx;
        assert!(
            self.first_child[idx as usize] == INVALID,
            "cannot destroy view with children"
        );

        if self.parent[idx as usize] != INVALID {
            self.unlink_from_parent(idx);
        }

        // Bump generation so old handles immediately fail validation.
        self.generation[idx as usize] += 1;
        self.free_list.push(idx);
    }

    /// Returns whether the given handle refers to a live view.
    #[must_use]
    pub fn is_alive(&self, id: ViewId) -> bool {
        id.idx < self.len && self.generation[id.idx as usize] == id.generation
    }

    // -- Topology API --

    /// Adds `child` as the last child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, if `child` already has a parent, if
    /// `child` is a window, or if `child` is `parent` or one of its ancestors.
    pub fn add_child(&mut self, parent: ViewId, child: ViewId) {
        self.validate(parent);
        self.validate(child);
        let p = parent.idx;
        let c = child.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );
        assert!(
            self.window[c as usize].is_none(),
            "a window cannot be added as a child"
        );
        let mut up = p;
        while up != INVALID {
            assert!(up != c, "cannot add an ancestor as a child");
            up = self.parent[up as usize];
        }

        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = INVALID;
        self.next_sibling[c as usize] = INVALID;

        if self.first_child[p as usize] == INVALID {
            self.first_child[p as usize] = c;
        } else {
            let mut last = self.first_child[p as usize];
            while self.next_sibling[last as usize] != INVALID {
                last = self.next_sibling[last as usize];
            }
            self.next_sibling[last as usize] = c;
            self.prev_sibling[c as usize] = last;
        }
    }

    /// Removes `child` from its current parent, detaching its subtree.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the view has no parent.
    pub fn remove_from_parent(&mut self, child: ViewId) {
        self.validate(child);
        assert!(
            self.parent[child.idx as usize] != INVALID,
            "view has no parent"
        );
        self.unlink_from_parent(child.idx);
    }

    /// Returns the parent of a view, if any.
    #[must_use]
    pub fn parent(&self, id: ViewId) -> Option<ViewId> {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        (p != INVALID).then(|| self.handle(p))
    }

    /// Returns an iterator over the direct children of a view.
    #[must_use]
    pub fn children(&self, id: ViewId) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    /// Returns an iterator from a view up to its root, starting with the view.
    #[must_use]
    pub fn ancestors(&self, id: ViewId) -> Ancestors<'_> {
        self.validate(id);
        Ancestors::new(self, id.idx)
    }

    // -- Geometry API --

    /// Returns the frame of a view in its parent's coordinate space.
    #[must_use]
    pub fn frame(&self, id: ViewId) -> Rect {
        self.validate(id);
        self.frame[id.idx as usize]
    }

    /// Sets the frame of a view in its parent's coordinate space.
    pub fn set_frame(&mut self, id: ViewId, frame: Rect) {
        self.validate(id);
        self.frame[id.idx as usize] = frame;
    }

    /// Returns the origin of the view's own coordinate space.
    #[must_use]
    pub fn bounds_origin(&self, id: ViewId) -> Point {
        self.validate(id);
        self.bounds_origin[id.idx as usize]
    }

    /// Sets the origin of the view's own coordinate space. For a scrolling
    /// view this is the content offset.
    pub fn set_bounds_origin(&mut self, id: ViewId, origin: Point) {
        self.validate(id);
        self.bounds_origin[id.idx as usize] = origin;
    }

    /// Returns the view's bounds in its own coordinate space.
    #[must_use]
    pub fn bounds(&self, id: ViewId) -> Rect {
        self.validate(id);
        self.bounds_at(id.idx)
    }

    /// Returns the extra transform applied in the parent's coordinate space.
    #[must_use]
    pub fn transform(&self, id: ViewId) -> Affine {
        self.validate(id);
        self.transform[id.idx as usize]
    }

    /// Sets the extra transform applied in the parent's coordinate space,
    /// after the frame placement.
    pub fn set_transform(&mut self, id: ViewId, transform: Affine) {
        self.validate(id);
        self.transform[id.idx as usize] = transform;
    }

    // -- Appearance API --

    /// Returns the opacity of a view.
    #[must_use]
    pub fn opacity(&self, id: ViewId) -> f64 {
        self.validate(id);
        self.opacity[id.idx as usize]
    }

    /// Sets the opacity of a view.
    pub fn set_opacity(&mut self, id: ViewId, opacity: f64) {
        self.validate(id);
        self.opacity[id.idx as usize] = opacity;
    }

    /// Returns the flags of a view.
    #[must_use]
    pub fn flags(&self, id: ViewId) -> ViewFlags {
        self.validate(id);
        self.flags[id.idx as usize]
    }

    /// Sets the flags of a view.
    pub fn set_flags(&mut self, id: ViewId, flags: ViewFlags) {
        self.validate(id);
        self.flags[id.idx as usize] = flags;
    }

    // -- Window API --

    /// Makes a root view a window placed on a screen.
    ///
    /// The view's own coordinate space becomes window space, and the window
    /// frame's origin maps it into screen space.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the view has a parent.
    pub fn attach_window(&mut self, root: ViewId, info: WindowInfo) {
        self.validate(root);
        assert!(
            self.parent[root.idx as usize] == INVALID,
            "only a root view can be a window"
        );
        self.window[root.idx as usize] = Some(info);
    }

    /// Removes the window from a root view, detaching its whole subtree.
    pub fn detach_window(&mut self, root: ViewId) {
        self.validate(root);
        self.window[root.idx as usize] = None;
    }

    /// Returns the window the view is attached to, if any.
    #[must_use]
    pub fn window_of(&self, id: ViewId) -> Option<WindowInfo> {
        self.validate(id);
        self.window[self.root_index(id.idx) as usize]
    }

    // -- Screen API --

    /// Creates a logical screen, initially topmost.
    pub fn create_screen(&mut self) -> ScreenId {
        let Ok(idx) = u32::try_from(self.screen_topmost.len()) else {
            panic!("too many screens");
        };
        self.screen_topmost.push(true);
        ScreenId(idx)
    }

    /// Marks `screen` as topmost (visible, foreground) or not.
    ///
    /// # Panics
    ///
    /// Panics if the screen was not created by this tree.
    pub fn set_screen_topmost(&mut self, screen: ScreenId, topmost: bool) {
        self.validate_screen(screen);
        self.screen_topmost[screen.0 as usize] = topmost;
    }

    /// Returns whether `screen` is topmost.
    ///
    /// # Panics
    ///
    /// Panics if the screen was not created by this tree.
    #[must_use]
    pub fn is_screen_topmost(&self, screen: ScreenId) -> bool {
        self.validate_screen(screen);
        self.screen_topmost[screen.0 as usize]
    }

    /// Assigns the subtree rooted at `id` to a logical screen, or clears the
    /// assignment so the view inherits its ancestor's screen.
    pub fn set_screen(&mut self, id: ViewId, screen: Option<ScreenId>) {
        self.validate(id);
        if let Some(screen) = screen {
            self.validate_screen(screen);
        }
        self.screen[id.idx as usize] = screen;
    }

    /// Returns the screen of the nearest ancestor (or the view itself) with a
    /// screen assignment.
    #[must_use]
    pub fn screen_of(&self, id: ViewId) -> Option<ScreenId> {
        self.validate(id);
        self.screen_at(id.idx)
    }

    // -- Internal helpers --

    pub(crate) fn handle(&self, idx: u32) -> ViewId {
        ViewId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    pub(crate) fn bounds_at(&self, idx: u32) -> Rect {
        let i = idx as usize;
        Rect::from_origin_size(self.bounds_origin[i], self.frame[i].size())
    }

    /// Maps the view's own space into its parent's space.
    pub(crate) fn local_to_parent(&self, idx: u32) -> Affine {
        let i = idx as usize;
        let placement = self.frame[i].origin() - self.bounds_origin[i];
        self.transform[i] * Affine::translate(placement)
    }

    pub(crate) fn root_index(&self, mut idx: u32) -> u32 {
        while self.parent[idx as usize] != INVALID {
            idx = self.parent[idx as usize];
        }
        idx
    }

    pub(crate) fn screen_at(&self, mut idx: u32) -> Option<ScreenId> {
        loop {
            if let Some(screen) = self.screen[idx as usize] {
                return Some(screen);
            }
            idx = self.parent[idx as usize];
            if idx == INVALID {
                return None;
            }
        }
    }

    /// Panics if the handle is stale.
    fn validate(&self, id: ViewId) {
        assert!(
            self.is_alive(id),
            "stale ViewId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    fn validate_screen(&self, screen: ScreenId) {
        assert!(
            (screen.0 as usize) < self.screen_topmost.len(),
            "unknown {screen:?}"
        );
    }

    /// Removes `idx` from its parent's child list.
    fn unlink_from_parent(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            self.first_child[p as usize] = next;
        }

        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[idx as usize] = INVALID;
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;
    }
}
