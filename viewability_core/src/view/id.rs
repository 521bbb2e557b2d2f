// Copyright 2026 the Viewability Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! View and screen identity types.

use core::fmt;

/// Sentinel value indicating "no view" in index fields.
pub(crate) const INVALID: u32 = u32::MAX;

/// A handle to a view in a [`ViewTree`](super::ViewTree).
///
/// Contains both a slot index and a generation counter so that a handle
/// outlives its view harmlessly: once the view is destroyed, the handle is
/// reported dead even if the slot is reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewId {
    /// Slot index into the tree's arrays.
    pub(crate) idx: u32,
    /// Generation counter; must match the tree's generation for this slot.
    pub(crate) generation: u32,
}

impl ViewId {
    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ViewId({}@gen{})", self.idx, self.generation)
    }
}

/// A logical screen: one page of content that is either topmost or not.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScreenId(pub(crate) u32);

impl fmt::Debug for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScreenId({})", self.0)
    }
}
