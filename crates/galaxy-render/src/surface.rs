//! Window-size bookkeeping for the render surface.
//!
//! Tracks physical and logical window dimensions, and derives the render
//! resolution from the device pixel ratio clamped to a configured maximum so
//! high-density displays do not multiply fill cost without bound.

/// Minimum surface dimension (prevents zero-size panics).
pub const MIN_SURFACE_DIMENSION: u32 = 1;

/// Default upper bound on the device pixel ratio.
pub const DEFAULT_MAX_PIXEL_RATIO: f64 = 2.0;

/// Pixel dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhysicalSize {
    pub width: u32,
    pub height: u32,
}

impl PhysicalSize {
    /// Width over height.
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(MIN_SURFACE_DIMENSION) as f32
    }
}

/// Event produced when the surface dimensions or scale factor change.
#[derive(Clone, Copy, Debug)]
pub struct SurfaceResizeEvent {
    /// Window size in physical pixels.
    pub physical: PhysicalSize,
    /// Size the GPU surface should be configured with.
    pub render: PhysicalSize,
    pub logical_width: f64,
    pub logical_height: f64,
    /// Pixel ratio after clamping.
    pub pixel_ratio: f64,
}

/// Normalizes window size, scale factor, and pixel-ratio clamping.
///
/// Zero-size windows (common on Wayland before the first configure) are
/// clamped to 1x1.
pub struct SurfaceWrapper {
    physical_width: u32,
    physical_height: u32,
    logical_width: f64,
    logical_height: f64,
    /// Physical pixels per logical pixel, as reported by the OS.
    scale_factor: f64,
    max_pixel_ratio: f64,
    configured: bool,
}

impl SurfaceWrapper {
    /// Creates a wrapper from the initial window size and scale factor.
    pub fn new(
        physical_width: u32,
        physical_height: u32,
        scale_factor: f64,
        max_pixel_ratio: f64,
    ) -> Self {
        let has_valid_size = physical_width > 0 && physical_height > 0;
        let width = physical_width.max(MIN_SURFACE_DIMENSION);
        let height = physical_height.max(MIN_SURFACE_DIMENSION);
        let scale_factor = sanitize_ratio(scale_factor);
        let max_pixel_ratio = sanitize_ratio(max_pixel_ratio);

        if scale_factor > max_pixel_ratio {
            log::info!("Clamping pixel ratio {scale_factor} to {max_pixel_ratio}");
        }

        Self {
            physical_width: width,
            physical_height: height,
            logical_width: width as f64 / scale_factor,
            logical_height: height as f64 / scale_factor,
            scale_factor,
            max_pixel_ratio,
            configured: has_valid_size,
        }
    }

    /// Handle a window resize. Returns an event if the dimensions changed.
    pub fn handle_resize(
        &mut self,
        physical_width: u32,
        physical_height: u32,
    ) -> Option<SurfaceResizeEvent> {
        let width = physical_width.max(MIN_SURFACE_DIMENSION);
        let height = physical_height.max(MIN_SURFACE_DIMENSION);

        if width == self.physical_width && height == self.physical_height && self.configured {
            return None;
        }

        self.physical_width = width;
        self.physical_height = height;
        self.logical_width = width as f64 / self.scale_factor;
        self.logical_height = height as f64 / self.scale_factor;
        self.configured = true;

        Some(self.event())
    }

    /// Handle a scale factor change. Always returns an event, because the
    /// render size depends on the ratio even if the window size is unchanged.
    pub fn handle_scale_factor_changed(
        &mut self,
        new_scale_factor: f64,
        new_physical_width: u32,
        new_physical_height: u32,
    ) -> SurfaceResizeEvent {
        let new_scale_factor = sanitize_ratio(new_scale_factor);
        if new_scale_factor > self.max_pixel_ratio {
            log::info!(
                "Clamping pixel ratio {new_scale_factor} to {}",
                self.max_pixel_ratio
            );
        }
        self.scale_factor = new_scale_factor;
        self.physical_width = new_physical_width.max(MIN_SURFACE_DIMENSION);
        self.physical_height = new_physical_height.max(MIN_SURFACE_DIMENSION);
        self.logical_width = self.physical_width as f64 / self.scale_factor;
        self.logical_height = self.physical_height as f64 / self.scale_factor;
        self.configured = true;
        self.event()
    }

    /// Device pixel ratio after clamping to the maximum.
    pub fn pixel_ratio(&self) -> f64 {
        self.scale_factor.min(self.max_pixel_ratio)
    }

    /// Size to configure the GPU surface with: logical size times the clamped
    /// pixel ratio.
    pub fn render_size(&self) -> PhysicalSize {
        let ratio = self.pixel_ratio();
        let scale = |logical: f64, physical: u32| {
            ((logical * ratio).round() as u32).clamp(MIN_SURFACE_DIMENSION, physical)
        };
        PhysicalSize {
            width: scale(self.logical_width, self.physical_width),
            height: scale(self.logical_height, self.physical_height),
        }
    }

    pub fn physical_size(&self) -> PhysicalSize {
        PhysicalSize {
            width: self.physical_width,
            height: self.physical_height,
        }
    }

    pub fn logical_width(&self) -> f64 {
        self.logical_width
    }

    pub fn logical_height(&self) -> f64 {
        self.logical_height
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// Whether a real (non-placeholder) size has been seen.
    pub fn is_configured(&self) -> bool {
        self.configured
    }

    fn event(&self) -> SurfaceResizeEvent {
        SurfaceResizeEvent {
            physical: self.physical_size(),
            render: self.render_size(),
            logical_width: self.logical_width,
            logical_height: self.logical_height,
            pixel_ratio: self.pixel_ratio(),
        }
    }
}

fn sanitize_ratio(ratio: f64) -> f64 {
    if ratio.is_finite() && ratio > 0.0 {
        ratio
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_size_matches_window_at_low_density() {
        let wrapper = SurfaceWrapper::new(1920, 1080, 1.0, 2.0);
        assert_eq!(wrapper.pixel_ratio(), 1.0);
        assert_eq!(wrapper.render_size(), wrapper.physical_size());
    }

    #[test]
    fn test_pixel_ratio_clamped_to_max() {
        // 3x display, 1000x500 logical.
        let wrapper = SurfaceWrapper::new(3000, 1500, 3.0, 2.0);
        assert_eq!(wrapper.pixel_ratio(), 2.0);
        assert_eq!(
            wrapper.render_size(),
            PhysicalSize {
                width: 2000,
                height: 1000
            }
        );
        assert_eq!(wrapper.physical_size().width, 3000);
    }

    #[test]
    fn test_zero_size_surface_handled_gracefully() {
        let mut wrapper = SurfaceWrapper::new(0, 0, 1.0, 2.0);
        assert!(!wrapper.is_configured());
        assert_eq!(wrapper.render_size(), PhysicalSize { width: 1, height: 1 });

        // First real resize from the compositor.
        let event = wrapper.handle_resize(1920, 1080).unwrap();
        assert_eq!(event.physical.width, 1920);
        assert_eq!(event.render.height, 1080);
        assert!(wrapper.is_configured());
    }

    #[test]
    fn test_first_resize_to_placeholder_size_still_reports() {
        let mut wrapper = SurfaceWrapper::new(0, 0, 1.0, 2.0);
        assert!(wrapper.handle_resize(1, 1).is_some());
        assert!(wrapper.handle_resize(1, 1).is_none());
    }

    #[test]
    fn test_no_event_on_same_dimensions() {
        let mut wrapper = SurfaceWrapper::new(1920, 1080, 1.0, 2.0);
        assert!(wrapper.handle_resize(1920, 1080).is_none());
    }

    #[test]
    fn test_resize_event_carries_render_size() {
        let mut wrapper = SurfaceWrapper::new(1920, 1080, 2.0, 2.0);
        let event = wrapper.handle_resize(3840, 2160).unwrap();
        assert_eq!(event.physical.width, 3840);
        assert_eq!(event.render.width, 3840);
        assert!((event.logical_width - 1920.0).abs() < 0.1);
        assert_eq!(event.pixel_ratio, 2.0);
    }

    #[test]
    fn test_scale_factor_change_reclamps() {
        let mut wrapper = SurfaceWrapper::new(1920, 1080, 1.0, 2.0);
        let event = wrapper.handle_scale_factor_changed(4.0, 7680, 4320);
        assert_eq!(event.pixel_ratio, 2.0);
        assert_eq!(event.render, PhysicalSize { width: 3840, height: 2160 });
        assert_eq!(wrapper.scale_factor(), 4.0);
    }

    #[test]
    fn test_zero_dimensions_clamped_to_one() {
        let mut wrapper = SurfaceWrapper::new(800, 600, 1.0, 2.0);
        assert!(wrapper.handle_resize(0, 0).is_some());
        assert_eq!(wrapper.physical_size(), PhysicalSize { width: 1, height: 1 });
        assert_eq!(wrapper.render_size(), PhysicalSize { width: 1, height: 1 });
    }

    #[test]
    fn test_invalid_ratios_fall_back_to_one() {
        let wrapper = SurfaceWrapper::new(800, 600, f64::NAN, 0.0);
        assert_eq!(wrapper.scale_factor(), 1.0);
        assert_eq!(wrapper.pixel_ratio(), 1.0);
    }

    #[test]
    fn test_aspect_ratio() {
        let size = PhysicalSize {
            width: 1920,
            height: 1080,
        };
        assert!((size.aspect_ratio() - 16.0 / 9.0).abs() < 1e-6);
    }
}
