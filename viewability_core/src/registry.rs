// Copyright 2026 the Viewability Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Identity-keyed storage for tracked items.
//!
//! Each registration gets a fresh [`TrackingId`]; ids are never reused, so a
//! stale id can't address a later registration of the same element. A second
//! index from element handle to id keeps deduplication O(1).

use core::fmt;
use core::hash::Hash;

use hashbrown::HashMap;

use crate::impression::{OnQualify, TrackedItem};

/// Opaque identity of one registration.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TrackingId(pub(crate) u64);

impl TrackingId {
    /// Rebuilds an id from its raw value, e.g. when replaying a recorded trace.
    ///
    /// The result only addresses a registration if it came from
    /// [`get`](Self::get) on the same tracker.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw id value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for TrackingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TrackingId({})", self.0)
    }
}

/// At most one [`TrackedItem`] per distinct element.
pub struct Registry<E> {
    items: HashMap<TrackingId, TrackedItem<E>>,
    by_element: HashMap<E, TrackingId>,
    next_id: u64,
}

impl<E: fmt::Debug> fmt::Debug for Registry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("items", &self.items)
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}

impl<E> Default for Registry<E> {
    fn default() -> Self {
        Self {
            items: HashMap::new(),
            by_element: HashMap::new(),
            next_id: 0,
        }
    }
}

impl<E: Copy + Eq + Hash> Registry<E> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `element` unless it is already present.
    ///
    /// Returns the element's id and whether a new entry was created. An
    /// existing entry keeps its callback and progress; `on_qualify` is dropped.
    pub fn insert(&mut self, element: E, on_qualify: OnQualify) -> (TrackingId, bool) {
        if let Some(&id) = self.by_element.get(&element) {
            return (id, false);
        }
        let id = TrackingId(self.next_id);
        self.next_id += 1;
        self.items.insert(id, TrackedItem::new(element, on_qualify));
        self.by_element.insert(element, id);
        (id, true)
    }

    /// Removes the entry for `element`, returning it if present.
    pub fn remove_element(&mut self, element: E) -> Option<(TrackingId, TrackedItem<E>)> {
        let id = self.by_element.remove(&element)?;
        self.items.remove(&id).map(|item| (id, item))
    }

    /// Removes the entry with the given id, returning it if present.
    pub fn remove(&mut self, id: TrackingId) -> Option<TrackedItem<E>> {
        let item = self.items.remove(&id)?;
        self.by_element.remove(&item.element());
        Some(item)
    }

    /// Returns the entry with the given id.
    #[must_use]
    pub fn get(&self, id: TrackingId) -> Option<&TrackedItem<E>> {
        self.items.get(&id)
    }

    /// Returns the id registered for `element`.
    #[must_use]
    pub fn id_of(&self, element: E) -> Option<TrackingId> {
        self.by_element.get(&element).copied()
    }

    /// Iterates over all entries in arbitrary order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (TrackingId, &mut TrackedItem<E>)> {
        self.items.iter_mut().map(|(&id, item)| (id, item))
    }

    /// Keeps only the entries for which `keep` returns `true`.
    pub fn retain(&mut self, mut keep: impl FnMut(TrackingId, &mut TrackedItem<E>) -> bool) {
        let by_element = &mut self.by_element;
        self.items.retain(|&id, item| {
            let kept = keep(id, item);
            if !kept {
                by_element.remove(&item.element());
            }
            kept
        });
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::rc::Rc;
    use core::cell::Cell;

    use super::*;
    use crate::time::{Duration, HostTime};

    fn noop() -> OnQualify {
        Box::new(|| {})
    }

    #[test]
    fn first_registration_wins() {
        let mut reg = Registry::new();
        let first = Rc::new(Cell::new(false));
        let second = Rc::new(Cell::new(false));
        let (f, s) = (first.clone(), second.clone());

        let (id, fresh) = reg.insert(7_u32, Box::new(move || f.set(true)));
        assert!(fresh, "first insert creates an entry");
        let (again, fresh) = reg.insert(7, Box::new(move || s.set(true)));
        assert!(!fresh, "second insert is a no-op");
        assert_eq!(id, again);
        assert_eq!(reg.len(), 1);

        for (_, item) in reg.iter_mut() {
            item.observe(true, HostTime(0), Duration::ZERO);
        }
        assert!(first.get(), "original callback kept");
        assert!(!second.get(), "replacement callback dropped");
    }

    #[test]
    fn ids_are_never_reused() {
        let mut reg = Registry::new();
        let (a, _) = reg.insert(1_u32, noop());
        assert!(reg.remove_element(1).is_some(), "entry existed");
        let (b, _) = reg.insert(1, noop());
        assert_ne!(a, b, "re-registration gets a fresh id");
        assert!(reg.get(a).is_none(), "old id addresses nothing");
    }

    #[test]
    fn remove_by_id_clears_the_index() {
        let mut reg = Registry::new();
        let (id, _) = reg.insert(3_u32, noop());
        assert_eq!(reg.id_of(3), Some(id));
        assert!(reg.remove(id).is_some(), "entry existed");
        assert_eq!(reg.id_of(3), None);
        assert!(reg.is_empty(), "registry drained");
    }

    #[test]
    fn retain_keeps_both_maps_in_step() {
        let mut reg = Registry::new();
        for e in 0_u32..6 {
            reg.insert(e, noop());
        }
        reg.retain(|_, item| item.element() % 2 == 0);
        assert_eq!(reg.len(), 3);
        assert_eq!(reg.id_of(1), None);
        assert!(reg.id_of(4).is_some(), "even elements survive");
    }

    #[test]
    fn missing_entries_are_no_ops() {
        let mut reg: Registry<u32> = Registry::new();
        assert!(reg.remove_element(9).is_none(), "nothing to remove");
        assert!(reg.remove(TrackingId(42)).is_none(), "nothing to remove");
    }
}
