use crate::camera::PerspectiveCamera;
use crate::renderer::Renderer;

/// Highest pixel ratio the renderer is allowed to use
pub const MAX_PIXEL_RATIO: f64 = 2.0;

/// Viewport size in pixels
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sizes {
    pub width: f64,
    pub height: f64,
}

impl Sizes {
    /// A terminal cell shows two pixels stacked vertically
    pub fn from_terminal(cols: u16, rows: u16) -> Self {
        Sizes {
            width: cols.max(1) as f64,
            height: (rows.max(1) as f64) * 2.0,
        }
    }

    pub fn aspect(&self) -> f64 {
        self.width / self.height
    }
}

/// Pixel ratio clamped to what the renderer accepts
pub fn clamp_pixel_ratio(device_pixel_ratio: f64) -> f64 {
    device_pixel_ratio.min(MAX_PIXEL_RATIO)
}

/// Applies a new viewport size to the camera and renderer
pub fn handle_resize(
    sizes: &mut Sizes,
    width: f64,
    height: f64,
    device_pixel_ratio: f64,
    camera: &mut PerspectiveCamera,
    renderer: &mut Renderer,
) {
    // Update sizes
    sizes.width = width;
    sizes.height = height;

    // Update camera
    camera.aspect = sizes.width / sizes.height;
    camera.update_projection_matrix();

    // Update renderer
    renderer.set_size(sizes.width, sizes.height);
    renderer.set_pixel_ratio(clamp_pixel_ratio(device_pixel_ratio));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{FAR, FOV_DEGREES, NEAR};

    #[test]
    fn terminal_rows_hold_two_pixels() {
        let sizes = Sizes::from_terminal(80, 24);
        assert_eq!(sizes, Sizes { width: 80.0, height: 48.0 });
        assert_eq!(Sizes::from_terminal(0, 0), Sizes { width: 1.0, height: 2.0 });
    }

    #[test]
    fn resize_updates_aspect_and_pixel_ratio() {
        let mut sizes = Sizes::from_terminal(80, 24);
        let mut camera = PerspectiveCamera::new(FOV_DEGREES, sizes.aspect(), NEAR, FAR);
        let mut renderer = Renderer::new(sizes.width, sizes.height);

        handle_resize(&mut sizes, 120.0, 90.0, 3.0, &mut camera, &mut renderer);
        assert_eq!(sizes, Sizes { width: 120.0, height: 90.0 });
        assert_eq!(camera.aspect, 120.0 / 90.0);
        assert_eq!(renderer.pixel_ratio(), 2.0);
        assert_eq!(renderer.buffer_size(), (240, 180));
        assert_eq!(renderer.output_size(), (120, 90));

        handle_resize(&mut sizes, 50.0, 100.0, 1.5, &mut camera, &mut renderer);
        assert_eq!(camera.aspect, 0.5);
        assert_eq!(renderer.pixel_ratio(), 1.5);
        assert_eq!(renderer.buffer_size(), (75, 150));
    }

    #[test]
    fn pixel_ratio_is_capped_at_two() {
        assert_eq!(clamp_pixel_ratio(1.0), 1.0);
        assert_eq!(clamp_pixel_ratio(2.0), 2.0);
        assert_eq!(clamp_pixel_ratio(3.5), 2.0);
    }
}
