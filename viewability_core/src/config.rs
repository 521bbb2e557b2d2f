// Copyright 2026 the Viewability Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracking thresholds and knobs.
//!
//! Every setter clamps its input into the valid domain instead of rejecting
//! it: ratio and alpha fields land in `[0, 1]`, duration and interval fields in
//! `[0, ∞)`, inset components are non-negative. NaN clamps to the lower bound.
//!
//! A configuration is a plain value. Installing one on a running tracker goes
//! through [`ViewabilityTracker::apply_config`], which restarts the poll
//! scheduler and resets in-flight accumulation in one step.
//!
//! [`ViewabilityTracker::apply_config`]: crate::tracker::ViewabilityTracker::apply_config

use kurbo::Insets;

/// Thresholds that decide when an element counts as viewed.
///
/// `E` is the host's element handle type, used for the optional container
/// restriction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewabilityConfig<E> {
    area_ratio_threshold: f64,
    duration_threshold: f64,
    detection_interval: f64,
    alpha_threshold: f64,
    container: Option<E>,
    container_insets: Insets,
    screen_insets: Insets,
}

impl<E> Default for ViewabilityConfig<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> ViewabilityConfig<E> {
    /// Default fraction of the element that must be visible.
    pub const DEFAULT_AREA_RATIO_THRESHOLD: f64 = 0.5;
    /// Default continuous visibility required, in seconds.
    pub const DEFAULT_DURATION_THRESHOLD: f64 = 1.0;
    /// Default poll period, in seconds.
    pub const DEFAULT_DETECTION_INTERVAL: f64 = 0.1;
    /// Default minimum opacity for the element and each ancestor.
    pub const DEFAULT_ALPHA_THRESHOLD: f64 = 0.5;

    /// Creates a configuration holding the defaults.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            area_ratio_threshold: Self::DEFAULT_AREA_RATIO_THRESHOLD,
            duration_threshold: Self::DEFAULT_DURATION_THRESHOLD,
            detection_interval: Self::DEFAULT_DETECTION_INTERVAL,
            alpha_threshold: Self::DEFAULT_ALPHA_THRESHOLD,
            container: None,
            container_insets: Insets::ZERO,
            screen_insets: Insets::ZERO,
        }
    }

    // -- Getters --

    /// Fraction of the element's own area that must remain visible, in `[0, 1]`.
    #[must_use]
    pub const fn area_ratio_threshold(&self) -> f64 {
        self.area_ratio_threshold
    }

    /// Continuous visibility required before an impression fires, in seconds.
    #[must_use]
    pub const fn duration_threshold(&self) -> f64 {
        self.duration_threshold
    }

    /// Poll period, in seconds. Smaller values are more precise and cost more.
    #[must_use]
    pub const fn detection_interval(&self) -> f64 {
        self.detection_interval
    }

    /// Minimum opacity for the element and every ancestor, in `[0, 1]`.
    #[must_use]
    pub const fn alpha_threshold(&self) -> f64 {
        self.alpha_threshold
    }

    /// Element whose bounds restrict the trackable region, if any.
    #[must_use]
    pub const fn container(&self) -> Option<&E> {
        self.container.as_ref()
    }

    /// Insets applied to the container's bounds.
    #[must_use]
    pub const fn container_insets(&self) -> Insets {
        self.container_insets
    }

    /// Insets applied to the screen bounds, e.g. to exclude the area behind
    /// opaque navigation bars.
    #[must_use]
    pub const fn screen_insets(&self) -> Insets {
        self.screen_insets
    }

    // -- Clamping setters --

    /// Sets the area ratio threshold, clamped to `[0, 1]`.
    pub fn set_area_ratio_threshold(&mut self, value: f64) {
        self.area_ratio_threshold = unit_interval(value);
    }

    /// Sets the duration threshold in seconds, clamped to `[0, ∞)`.
    pub fn set_duration_threshold(&mut self, value: f64) {
        self.duration_threshold = non_negative(value);
    }

    /// Sets the detection interval in seconds, clamped to `[0, ∞)`.
    ///
    /// A zero interval polls on every [`advance`] call.
    ///
    /// [`advance`]: crate::tracker::ViewabilityTracker::advance
    pub fn set_detection_interval(&mut self, value: f64) {
        self.detection_interval = non_negative(value);
    }

    /// Sets the alpha threshold, clamped to `[0, 1]`.
    pub fn set_alpha_threshold(&mut self, value: f64) {
        self.alpha_threshold = unit_interval(value);
    }

    /// Sets or clears the container element.
    pub fn set_container(&mut self, container: Option<E>) {
        self.container = container;
    }

    /// Sets the container insets; negative components clamp to zero.
    pub fn set_container_insets(&mut self, insets: Insets) {
        self.container_insets = non_negative_insets(insets);
    }

    /// Sets the screen insets; negative components clamp to zero.
    pub fn set_screen_insets(&mut self, insets: Insets) {
        self.screen_insets = non_negative_insets(insets);
    }

    // -- Builder forms --

    /// Builder form of [`set_area_ratio_threshold`](Self::set_area_ratio_threshold).
    #[must_use]
    pub fn with_area_ratio_threshold(mut self, value: f64) -> Self {
        self.set_area_ratio_threshold(value);
        self
    }

    /// Builder form of [`set_duration_threshold`](Self::set_duration_threshold).
    #[must_use]
    pub fn with_duration_threshold(mut self, value: f64) -> Self {
        self.set_duration_threshold(value);
        self
    }

    /// Builder form of [`set_detection_interval`](Self::set_detection_interval).
    #[must_use]
    pub fn with_detection_interval(mut self, value: f64) -> Self {
        self.set_detection_interval(value);
        self
    }

    /// Derives the detection interval from the duration threshold so that
    /// `detections` polls fit in one threshold window.
    ///
    /// Zero detections is treated as one.
    #[must_use]
    pub fn with_detections_per_duration(mut self, detections: u32) -> Self {
        let detections = f64::from(detections.max(1));
        self.set_detection_interval(self.duration_threshold / detections);
        self
    }

    /// Builder form of [`set_alpha_threshold`](Self::set_alpha_threshold).
    #[must_use]
    pub fn with_alpha_threshold(mut self, value: f64) -> Self {
        self.set_alpha_threshold(value);
        self
    }

    /// Builder form of [`set_container`](Self::set_container).
    #[must_use]
    pub fn with_container(mut self, container: E) -> Self {
        self.set_container(Some(container));
        self
    }

    /// Builder form of [`set_container_insets`](Self::set_container_insets).
    #[must_use]
    pub fn with_container_insets(mut self, insets: Insets) -> Self {
        self.set_container_insets(insets);
        self
    }

    /// Builder form of [`set_screen_insets`](Self::set_screen_insets).
    #[must_use]
    pub fn with_screen_insets(mut self, insets: Insets) -> Self {
        self.set_screen_insets(insets);
        self
    }
}

fn unit_interval(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.max(0.0) }
}

fn non_negative_insets(insets: Insets) -> Insets {
    Insets::new(
        non_negative(insets.x0),
        non_negative(insets.y0),
        non_negative(insets.x1),
        non_negative(insets.y1),
    )
}
