// Copyright 2026 the Viewability Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reference element host.
//!
//! [`ViewTree`] is a small retained view hierarchy that implements
//! [`ElementHost`](crate::element::ElementHost). It exists for hosts without a
//! native tree of their own, for headless simulation, and for tests. Each view
//! has:
//!
//! - An identity ([`ViewId`]): a generational handle that becomes stale when
//!   the view is destroyed, so a recycled slot never aliases an old
//!   registration.
//! - Topology: parent, first-child, and sibling links forming an ordered tree.
//! - Geometry: a `frame` in the parent's coordinate space, a `bounds_origin`
//!   (the scroll offset of its content), and an extra `transform` applied in
//!   the parent's space.
//! - Appearance: [`ViewFlags`] (hidden, clips to bounds) and opacity.
//!
//! Root views become windows via [`ViewTree::attach_window`]. Logical screens
//! ([`ScreenId`]) are assigned to subtrees with [`ViewTree::set_screen`] and
//! toggled topmost with [`ViewTree::set_screen_topmost`].

mod host;
mod id;
mod traverse;
mod tree;

pub use id::{ScreenId, ViewId};
pub use traverse::{Ancestors, Children};
pub use tree::{ViewFlags, ViewTree};
