// Copyright 2026 the Viewability Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-element visibility evaluation.
//!
//! [`evaluate`] decides whether one element is *qualifying-visible* within a
//! single poll, reading the host through [`ElementHost`] only:
//!
//! 1. **Fast rejects**: Not alive or no attached window ([`Detached`]),
//!    flagged hidden ([`Hidden`]), opacity below the alpha threshold
//!    ([`Transparent`]).
//! 2. **Screen**: The element's logical screen must be topmost
//!    ([`ScreenNotTopmost`]).
//! 3. **Ancestor walk**: The element's bounds are carried up the chain one
//!    parent at a time. Each ancestor must be shown and opaque enough; a
//!    clipping ancestor intersects the carried rectangle with its own bounds
//!    at that point in the chain, so an intermediate scroll region crops
//!    exactly where it sits ([`Clipped`] once nothing remains).
//! 4. **Screen space**: The root rectangle is offset by the window origin,
//!    then restricted to the configured container (shrunk by its insets) and
//!    to the inset-adjusted screen bounds.
//! 5. **Area ratio**: Visible area over the element's unclipped area in the
//!    same space (its own area when no ancestor scales), qualifying within
//!    [`AREA_RATIO_TOLERANCE`] below the threshold. Zero-area elements never
//!    qualify ([`ZeroArea`]).
//!
//! No step faults: every degenerate case resolves to
//! [`Visibility::NotVisible`].
//!
//! [`Detached`]: Rejection::Detached
//! [`Hidden`]: Rejection::Hidden
//! [`Transparent`]: Rejection::Transparent
//! [`ScreenNotTopmost`]: Rejection::ScreenNotTopmost
//! [`Clipped`]: Rejection::Clipped
//! [`ZeroArea`]: Rejection::ZeroArea

use kurbo::{Insets, Rect};

use crate::config::ViewabilityConfig;
use crate::element::{ElementHost, WindowInfo};

/// Slack below the area ratio threshold that still qualifies.
///
/// Absorbs rounding accumulated across repeated coordinate conversions.
pub const AREA_RATIO_TOLERANCE: f64 = 0.01;

/// Why an element did not qualify.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Rejection {
    /// The element is gone or not attached to a window.
    Detached,
    /// The element or an ancestor is flagged hidden.
    Hidden,
    /// The element or an ancestor is below the alpha threshold.
    Transparent,
    /// The element's logical screen is covered, navigated away from, or
    /// backgrounded.
    ScreenNotTopmost,
    /// Clipping, container restriction or screen bounds left nothing visible.
    Clipped,
    /// The element has no area of its own.
    ZeroArea,
    /// A container is configured but is not alive or not attached.
    ContainerUnavailable,
    /// Some of the element is visible, but not enough.
    BelowThreshold {
        /// The visible fraction that was measured.
        ratio: f64,
    },
}

/// Result of evaluating one element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Visibility {
    /// The element qualifies.
    Visible {
        /// The visible fraction of the element's own area.
        ratio: f64,
    },
    /// The element does not qualify.
    NotVisible(Rejection),
}

impl Visibility {
    /// Returns `true` if the element qualifies.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        matches!(self, Self::Visible { .. })
    }

    /// Returns the measured visible fraction, or zero when evaluation stopped
    /// before the area was measured.
    #[must_use]
    pub const fn ratio(&self) -> f64 {
        match self {
            Self::Visible { ratio } | Self::NotVisible(Rejection::BelowThreshold { ratio }) => {
                *ratio
            }
            Self::NotVisible(_) => 0.0,
        }
    }
}

/// Returns whether `element` is qualifying-visible under `config`.
#[must_use]
pub fn is_qualifying_visible<H: ElementHost>(
    host: &H,
    element: H::Element,
    config: &ViewabilityConfig<H::Element>,
) -> bool {
    evaluate(host, element, config).is_visible()
}

/// Evaluates `element` under `config`, reporting why it failed if it did.
#[must_use]
pub fn evaluate<H: ElementHost>(
    host: &H,
    element: H::Element,
    config: &ViewabilityConfig<H::Element>,
) -> Visibility {
    let window = match check_element(host, element, config) {
        Ok(window) => window,
        Err(rejection) => return Visibility::NotVisible(rejection),
    };
    if let Some(screen) = host.screen(element)
        && !host.is_screen_topmost(screen)
    {
        return Visibility::NotVisible(Rejection::ScreenNotTopmost);
    }
    evaluate_geometry(host, element, window, config)
}

/// Runs the element checks and the geometric part of [`evaluate`], skipping
/// the screen check.
///
/// The tracker resolves screens once per pass and calls this directly.
pub(crate) fn evaluate_unscreened<H: ElementHost>(
    host: &H,
    element: H::Element,
    config: &ViewabilityConfig<H::Element>,
) -> Visibility {
    match check_element(host, element, config) {
        Ok(window) => evaluate_geometry(host, element, window, config),
        Err(rejection) => Visibility::NotVisible(rejection),
    }
}

fn check_element<H: ElementHost>(
    host: &H,
    element: H::Element,
    config: &ViewabilityConfig<H::Element>,
) -> Result<WindowInfo, Rejection> {
    if !host.is_alive(element) {
        return Err(Rejection::Detached);
    }
    let window = host.window(element).ok_or(Rejection::Detached)?;
    if host.is_hidden(element) {
        return Err(Rejection::Hidden);
    }
    if below_alpha(host.opacity(element), config.alpha_threshold()) {
        return Err(Rejection::Transparent);
    }
    Ok(window)
}

fn evaluate_geometry<H: ElementHost>(
    host: &H,
    element: H::Element,
    window: WindowInfo,
    config: &ViewabilityConfig<H::Element>,
) -> Visibility {
    match visible_ratio(host, element, window, config) {
        Ok(ratio) if ratio >= config.area_ratio_threshold() - AREA_RATIO_TOLERANCE => {
            Visibility::Visible { ratio }
        }
        Ok(ratio) => Visibility::NotVisible(Rejection::BelowThreshold { ratio }),
        Err(rejection) => Visibility::NotVisible(rejection),
    }
}

fn visible_ratio<H: ElementHost>(
    host: &H,
    element: H::Element,
    window: WindowInfo,
    config: &ViewabilityConfig<H::Element>,
) -> Result<f64, Rejection> {
    let own = host.bounds(element).abs();
    if own.area().is_nan() || own.area() <= 0.0 {
        return Err(Rejection::ZeroArea);
    }

    let (full, clipped) = clip_through_ancestors(host, element, own, config.alpha_threshold())?;
    let offset = window.frame.origin().to_vec2();
    let mut visible = clipped + offset;

    if let Some(&container) = config.container() {
        let region = container_region(host, container, config.container_insets())
            .ok_or(Rejection::ContainerUnavailable)?;
        visible = visible.intersect(region);
    }

    let screen = shrink(window.screen_bounds.abs(), config.screen_insets());
    visible = visible.intersect(screen);
    if visible.is_zero_area() {
        return Err(Rejection::Clipped);
    }

    // Measured against the unclipped element in the same space, so ancestor
    // scaling cancels out. Without transforms this is the element's own area.
    let full_area = full.area();
    if full_area.is_nan() || full_area <= 0.0 {
        return Err(Rejection::ZeroArea);
    }
    Ok(visible.area() / full_area)
}

/// Carries `rect` from `element`'s space up to its root, applying each
/// ancestor's visibility checks and clip on the way.
///
/// Returns the unclipped and the clipped rectangle in root space.
fn clip_through_ancestors<H: ElementHost>(
    host: &H,
    element: H::Element,
    rect: Rect,
    alpha_threshold: f64,
) -> Result<(Rect, Rect), Rejection> {
    let mut full = rect;
    let mut clipped = rect;
    let mut current = element;
    while let Some(parent) = host.parent(current) {
        if host.is_hidden(parent) {
            return Err(Rejection::Hidden);
        }
        if below_alpha(host.opacity(parent), alpha_threshold) {
            return Err(Rejection::Transparent);
        }

        full = host.convert_to_ancestor(current, full, parent);
        clipped = host.convert_to_ancestor(current, clipped, parent);
        if host.clips_to_bounds(parent) {
            clipped = clipped.intersect(host.bounds(parent).abs());
        }
        if clipped.is_zero_area() {
            return Err(Rejection::Clipped);
        }

        current = parent;
    }
    Ok((full, clipped))
}

/// Returns the container's inset bounds in screen space.
fn container_region<H: ElementHost>(
    host: &H,
    container: H::Element,
    insets: Insets,
) -> Option<Rect> {
    if !host.is_alive(container) {
        return None;
    }
    let window = host.window(container)?;
    let local = shrink(host.bounds(container).abs(), insets);
    let root = host.root(container);
    let in_root = host.convert_to_ancestor(container, local, root);
    Some(in_root + window.frame.origin().to_vec2())
}

/// NaN opacity counts as transparent.
fn below_alpha(opacity: f64, alpha_threshold: f64) -> bool {
    opacity.is_nan() || opacity < alpha_threshold
}

/// Moves each edge of `rect` inward by the matching inset. Insets larger than
/// the rectangle collapse it to zero size.
fn shrink(rect: Rect, insets: Insets) -> Rect {
    let x0 = rect.x0 + insets.x0;
    let y0 = rect.y0 + insets.y0;
    Rect::new(
        x0,
        y0,
        (rect.x1 - insets.x1).max(x0),
        (rect.y1 - insets.y1).max(y0),
    )
}

#[cfg(test)]
mod tests {
    use kurbo::{Affine, Point};

    use super::*;
    use crate::view::{ViewFlags, ViewId, ViewTree};

    const SCREEN: Rect = Rect::new(0.0, 0.0, 400.0, 800.0);

    /// A window-rooted tree with one topmost screen.
    fn scene() -> (ViewTree, ViewId) {
        let mut tree = ViewTree::new();
        let root = tree.create_view(SCREEN);
        tree.attach_window(
            root,
            WindowInfo {
                frame: SCREEN,
                screen_bounds: SCREEN,
            },
        );
        let screen = tree.create_screen();
        tree.set_screen(root, Some(screen));
        (tree, root)
    }

    fn child(tree: &mut ViewTree, parent: ViewId, frame: Rect) -> ViewId {
        let id = tree.create_view(frame);
        tree.add_child(parent, id);
        id
    }

    fn config() -> ViewabilityConfig<ViewId> {
        ViewabilityConfig::new()
    }

    #[test]
    fn unobstructed_opaque_element_is_fully_visible() {
        let (mut tree, root) = scene();
        let v = child(&mut tree, root, Rect::new(10.0, 10.0, 110.0, 110.0));
        assert_eq!(evaluate(&tree, v, &config()), Visibility::Visible { ratio: 1.0 });
        assert!(is_qualifying_visible(&tree, v, &config()), "should qualify");
    }

    #[test]
    fn detached_and_destroyed_elements_are_rejected() {
        let (mut tree, _root) = scene();
        let loose = tree.create_view(Rect::new(0.0, 0.0, 50.0, 50.0));
        assert_eq!(
            evaluate(&tree, loose, &config()),
            Visibility::NotVisible(Rejection::Detached)
        );
        tree.destroy_view(loose);
        assert_eq!(
            evaluate(&tree, loose, &config()),
            Visibility::NotVisible(Rejection::Detached)
        );
    }

    #[test]
    fn hidden_element_or_ancestor_is_rejected() {
        let (mut tree, root) = scene();
        let group = child(&mut tree, root, Rect::new(0.0, 0.0, 200.0, 200.0));
        let v = child(&mut tree, group, Rect::new(0.0, 0.0, 50.0, 50.0));

        tree.set_flags(
            group,
            ViewFlags {
                hidden: true,
                ..ViewFlags::default()
            },
        );
        assert_eq!(
            evaluate(&tree, v, &config()),
            Visibility::NotVisible(Rejection::Hidden)
        );

        tree.set_flags(group, ViewFlags::default());
        tree.set_flags(
            v,
            ViewFlags {
                hidden: true,
                ..ViewFlags::default()
            },
        );
        assert_eq!(
            evaluate(&tree, v, &config()),
            Visibility::NotVisible(Rejection::Hidden)
        );
    }

    #[test]
    fn opacity_is_checked_per_view_not_multiplied() {
        let (mut tree, root) = scene();
        let group = child(&mut tree, root, Rect::new(0.0, 0.0, 200.0, 200.0));
        let v = child(&mut tree, group, Rect::new(0.0, 0.0, 50.0, 50.0));

        // 0.6 * 0.6 = 0.36 would fail a product test; each view alone passes.
        tree.set_opacity(group, 0.6);
        tree.set_opacity(v, 0.6);
        assert!(is_qualifying_visible(&tree, v, &config()), "each view is above 0.5");

        tree.set_opacity(group, 0.4);
        assert_eq!(
            evaluate(&tree, v, &config()),
            Visibility::NotVisible(Rejection::Transparent)
        );

        tree.set_opacity(group, 1.0);
        tree.set_opacity(v, 0.49);
        assert_eq!(
            evaluate(&tree, v, &config()),
            Visibility::NotVisible(Rejection::Transparent)
        );
    }

    #[test]
    fn nan_opacity_is_transparent() {
        let (mut tree, root) = scene();
        let group = child(&mut tree, root, Rect::new(0.0, 0.0, 200.0, 200.0));
        let v = child(&mut tree, group, Rect::new(0.0, 0.0, 50.0, 50.0));

        tree.set_opacity(v, f64::NAN);
        assert_eq!(
            evaluate(&tree, v, &config()),
            Visibility::NotVisible(Rejection::Transparent)
        );

        tree.set_opacity(v, 1.0);
        tree.set_opacity(group, f64::NAN);
        assert_eq!(
            evaluate(&tree, v, &config()),
            Visibility::NotVisible(Rejection::Transparent)
        );

        // Even a zero alpha threshold does not admit NaN.
        let config = config().with_alpha_threshold(0.0);
        assert!(!is_qualifying_visible(&tree, v, &config), "NaN never qualifies");
    }

    #[test]
    fn intermediate_clip_crops_where_it_sits() {
        let (mut tree, root) = scene();
        // A 100pt tall clipping region scrolled by 60pt.
        let scroller = child(&mut tree, root, Rect::new(0.0, 100.0, 400.0, 200.0));
        tree.set_flags(
            scroller,
            ViewFlags {
                clips_to_bounds: true,
                ..ViewFlags::default()
            },
        );
        tree.set_bounds_origin(scroller, Point::new(0.0, 60.0));
        let cell = child(&mut tree, scroller, Rect::new(0.0, 0.0, 400.0, 100.0));

        // Content 0..100 scrolled by 60 shows 60..100 → 40% of the cell.
        let vis = evaluate(&tree, cell, &config());
        assert_eq!(vis, Visibility::NotVisible(Rejection::BelowThreshold { ratio: 0.4 }));

        tree.set_bounds_origin(scroller, Point::new(0.0, 40.0));
        assert_eq!(evaluate(&tree, cell, &config()), Visibility::Visible { ratio: 0.6 });

        tree.set_bounds_origin(scroller, Point::new(0.0, 150.0));
        assert_eq!(
            evaluate(&tree, cell, &config()),
            Visibility::NotVisible(Rejection::Clipped)
        );
    }

    #[test]
    fn non_clipping_parent_does_not_crop() {
        let (mut tree, root) = scene();
        let group = child(&mut tree, root, Rect::new(0.0, 0.0, 10.0, 10.0));
        let v = child(&mut tree, group, Rect::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(evaluate(&tree, v, &config()), Visibility::Visible { ratio: 1.0 });
    }

    #[test]
    fn off_screen_element_is_clipped_even_with_zero_threshold() {
        let (mut tree, root) = scene();
        let v = child(&mut tree, root, Rect::new(0.0, 900.0, 100.0, 1000.0));
        let config = config().with_area_ratio_threshold(0.0);
        assert_eq!(
            evaluate(&tree, v, &config),
            Visibility::NotVisible(Rejection::Clipped)
        );
    }

    #[test]
    fn window_origin_moves_into_screen_space() {
        let mut tree = ViewTree::new();
        let root = tree.create_view(Rect::new(0.0, 0.0, 400.0, 400.0));
        tree.attach_window(
            root,
            WindowInfo {
                // Window sits half below the bottom of the screen.
                frame: Rect::new(0.0, 600.0, 400.0, 1000.0),
                screen_bounds: SCREEN,
            },
        );
        let v = child(&mut tree, root, Rect::new(0.0, 100.0, 100.0, 300.0));
        // Screen y 700..900, screen ends at 800 → half visible.
        assert_eq!(evaluate(&tree, v, &config()), Visibility::Visible { ratio: 0.5 });
    }

    #[test]
    fn screen_insets_exclude_bars() {
        let (mut tree, root) = scene();
        let v = child(&mut tree, root, Rect::new(0.0, 0.0, 100.0, 100.0));
        let config = config().with_screen_insets(Insets::new(0.0, 80.0, 0.0, 0.0));
        assert_eq!(
            evaluate(&tree, v, &config),
            Visibility::NotVisible(Rejection::BelowThreshold { ratio: 0.2 })
        );
    }

    #[test]
    fn container_restricts_the_region() {
        let (mut tree, root) = scene();
        let content = child(&mut tree, root, Rect::new(0.0, 0.0, 400.0, 600.0));
        let v = child(&mut tree, root, Rect::new(0.0, 550.0, 100.0, 650.0));

        let config = config().with_container(content);
        assert_eq!(evaluate(&tree, v, &config), Visibility::Visible { ratio: 0.5 });

        let config = config.with_container_insets(Insets::new(0.0, 0.0, 0.0, 20.0));
        assert_eq!(
            evaluate(&tree, v, &config),
            Visibility::NotVisible(Rejection::BelowThreshold { ratio: 0.3 })
        );
    }

    #[test]
    fn unavailable_container_rejects() {
        let (mut tree, root) = scene();
        let v = child(&mut tree, root, Rect::new(0.0, 0.0, 100.0, 100.0));
        let gone = tree.create_view(SCREEN);
        tree.destroy_view(gone);
        let config = config().with_container(gone);
        assert_eq!(
            evaluate(&tree, v, &config),
            Visibility::NotVisible(Rejection::ContainerUnavailable)
        );
    }

    #[test]
    fn zero_area_element_never_qualifies() {
        let (mut tree, root) = scene();
        let v = child(&mut tree, root, Rect::new(10.0, 10.0, 10.0, 60.0));
        let config = config().with_area_ratio_threshold(0.0);
        assert_eq!(
            evaluate(&tree, v, &config),
            Visibility::NotVisible(Rejection::ZeroArea)
        );
    }

    #[test]
    fn ratio_tolerance_band() {
        let (mut tree, root) = scene();
        // Clip a 100×100 cell so that exactly `h` points of height remain.
        let clip = child(&mut tree, root, Rect::new(0.0, 0.0, 100.0, 49.1));
        tree.set_flags(
            clip,
            ViewFlags {
                clips_to_bounds: true,
                ..ViewFlags::default()
            },
        );
        let v = child(&mut tree, clip, Rect::new(0.0, 0.0, 100.0, 100.0));

        // threshold - 0.009 qualifies.
        let vis = evaluate(&tree, v, &config());
        assert!(vis.is_visible(), "0.491 is within tolerance: {vis:?}");

        // threshold - 0.02 does not.
        tree.set_frame(clip, Rect::new(0.0, 0.0, 100.0, 48.0));
        let vis = evaluate(&tree, v, &config());
        assert!(!vis.is_visible(), "0.48 is outside tolerance: {vis:?}");
        assert!((vis.ratio() - 0.48).abs() < 1e-9, "ratio should be reported: {vis:?}");
    }

    #[test]
    fn covered_screen_is_rejected() {
        let (mut tree, root) = scene();
        let v = child(&mut tree, root, Rect::new(0.0, 0.0, 100.0, 100.0));
        let screen = tree.screen_of(v).expect("root has a screen");
        tree.set_screen_topmost(screen, false);
        assert_eq!(
            evaluate(&tree, v, &config()),
            Visibility::NotVisible(Rejection::ScreenNotTopmost)
        );
    }

    #[test]
    fn scaled_ancestor_is_respected() {
        let (mut tree, root) = scene();
        let group = child(&mut tree, root, Rect::new(0.0, 0.0, 400.0, 800.0));
        tree.set_transform(group, Affine::scale(4.0));
        let v = child(&mut tree, group, Rect::new(0.0, 150.0, 100.0, 250.0));
        // Scaled to y 600..1000, screen ends at 800.
        assert_eq!(evaluate(&tree, v, &config()), Visibility::Visible { ratio: 0.5 });
    }
}
