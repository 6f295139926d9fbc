//! Viewport-derived device classification.
//!
//! The whole choreography branches on a single coarse category derived from
//! the logical viewport width. Classification is pure; callers react to a
//! reported change by rebuilding their device-dependent state.

/// Default breakpoint in logical pixels. Widths below it are [`DeviceCategory::Mobile`].
pub const BREAKPOINT: f32 = 968.0;

/// Coarse viewport class that selects animation variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeviceCategory {
    Mobile,
    Desktop,
}

impl DeviceCategory {
    /// Classify a logical viewport width against [`BREAKPOINT`].
    pub fn classify(width: f32) -> Self {
        Self::classify_with(width, BREAKPOINT)
    }

    /// Classify against a custom breakpoint.
    pub fn classify_with(width: f32, breakpoint: f32) -> Self {
        if width < breakpoint {
            DeviceCategory::Mobile
        } else {
            DeviceCategory::Desktop
        }
    }

    /// Returns the new category only when it differs from `previous`.
    pub fn has_changed(width: f32, previous: DeviceCategory) -> Option<Self> {
        Self::has_changed_with(width, previous, BREAKPOINT)
    }

    /// [`has_changed`](Self::has_changed) against a custom breakpoint.
    pub fn has_changed_with(width: f32, previous: DeviceCategory, breakpoint: f32) -> Option<Self> {
        let current = Self::classify_with(width, breakpoint);
        (current != previous).then_some(current)
    }
}

impl std::fmt::Display for DeviceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceCategory::Mobile => write!(f, "mobile"),
            DeviceCategory::Desktop => write!(f, "desktop"),
        }
    }
}

/// Logical viewport size plus the display scale factor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    /// Width in logical pixels.
    pub width: f32,
    /// Height in logical pixels.
    pub height: f32,
    /// Physical pixels per logical pixel.
    pub scale_factor: f32,
}

impl Viewport {
    /// A viewport of `width` x `height` logical pixels at scale factor 1.
    ///
    /// # Example
    /// ```
    /// use diorama::{DeviceCategory, Viewport};
    ///
    /// let viewport = Viewport::new(1200.0, 800.0).with_scale_factor(2.0);
    /// assert_eq!(DeviceCategory::classify(viewport.width), DeviceCategory::Desktop);
    /// assert_eq!(viewport.pixel_ratio(1.5), 1.5);
    /// ```
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            scale_factor: 1.0,
        }
    }

    /// Set the physical pixels per logical pixel.
    pub fn with_scale_factor(mut self, scale_factor: f32) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    /// Build from a physical size and scale factor.
    pub fn from_physical(width: u32, height: u32, scale_factor: f64) -> Self {
        let scale = scale_factor.max(f64::EPSILON);
        Self {
            width: (width as f64 / scale) as f32,
            height: (height as f64 / scale) as f32,
            scale_factor: scale as f32,
        }
    }

    /// Aspect ratio, falling back to 1 for degenerate sizes.
    pub fn aspect(&self) -> f32 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }

    /// Scale factor clamped to `max`, as used for the render surface.
    pub fn pixel_ratio(&self, max: f32) -> f32 {
        self.scale_factor.min(max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_splits_at_breakpoint() {
        assert_eq!(DeviceCategory::classify(0.0), DeviceCategory::Mobile);
        assert_eq!(DeviceCategory::classify(500.0), DeviceCategory::Mobile);
        assert_eq!(DeviceCategory::classify(967.9), DeviceCategory::Mobile);
        assert_eq!(DeviceCategory::classify(968.0), DeviceCategory::Desktop);
        assert_eq!(DeviceCategory::classify(1200.0), DeviceCategory::Desktop);
    }

    #[test]
    fn classify_matches_threshold_for_a_sweep_of_widths() {
        for w in (0..3000).step_by(7) {
            let w = w as f32;
            let mobile = DeviceCategory::classify(w) == DeviceCategory::Mobile;
            assert_eq!(mobile, w < 968.0, "width {w}");
        }
    }

    #[test]
    fn has_changed_reports_only_transitions() {
        assert_eq!(
            DeviceCategory::has_changed(1200.0, DeviceCategory::Desktop),
            None
        );
        assert_eq!(
            DeviceCategory::has_changed(500.0, DeviceCategory::Desktop),
            Some(DeviceCategory::Mobile)
        );
        assert_eq!(
            DeviceCategory::has_changed(1000.0, DeviceCategory::Mobile),
            Some(DeviceCategory::Desktop)
        );
        assert_eq!(DeviceCategory::has_changed(10.0, DeviceCategory::Mobile), None);
    }

    #[test]
    fn viewport_from_physical_uses_logical_pixels() {
        let vp = Viewport::from_physical(2400, 1600, 2.0);
        assert_eq!(vp.width, 1200.0);
        assert_eq!(vp.height, 800.0);
        assert_eq!(vp.pixel_ratio(2.0), 2.0);
        assert_eq!(vp.with_scale_factor(3.0).pixel_ratio(2.0), 2.0);
    }
}
