use crate::math::edge_function;
use crate::vertex::{ScreenVertex, Vertex};
use glam::{DVec2, DVec3, DVec4};

/// Color and depth targets in linear color
pub struct Framebuffer {
    width: usize,
    height: usize,
    color: Vec<DVec3>,
    depth: Vec<f64>,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Framebuffer {
            width,
            height,
            color: vec![DVec3::ZERO; width * height],
            depth: vec![f64::INFINITY; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Reallocates both targets if the size changed
    pub fn resize(&mut self, width: usize, height: usize) {
        if width != self.width || height != self.height {
            *self = Framebuffer::new(width, height);
        }
    }

    pub fn clear(&mut self, color: DVec3) {
        self.color.fill(color);
        self.depth.fill(f64::INFINITY);
    }

    pub fn pixel(&self, x: usize, y: usize) -> DVec3 {
        self.color[y * self.width + x]
    }

    #[cfg(test)]
    pub fn depth(&self, x: usize, y: usize) -> f64 {
        self.depth[y * self.width + x]
    }
}

/// Interpolated attributes handed to the fragment stage
#[derive(Clone, Copy, Debug)]
pub struct Fragment {
    pub position: DVec3,
    pub normal: DVec3,
    pub uv: DVec2,
}

/// How a shaded fragment is written
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlendMode {
    /// Overwrite the color
    Opaque,
    /// `src * a + dst * (1 - a)` with alpha clamped to [0, 1]
    Alpha,
}

/// Clips a triangle against the near and far planes of clip space.
///
/// Returns a convex polygon, empty when the triangle is entirely outside.
pub fn clip_triangle(triangle: [Vertex; 3]) -> Vec<Vertex> {
    let polygon = clip_polygon(triangle.to_vec(), |v| v.clip.z + v.clip.w);
    clip_polygon(polygon, |v| v.clip.w - v.clip.z)
}

/// Sutherland-Hodgman against one plane; `distance` is positive on the inside
fn clip_polygon(polygon: Vec<Vertex>, distance: impl Fn(&Vertex) -> f64) -> Vec<Vertex> {
    if polygon.iter().all(|v| distance(v) >= 0.0) {
        return polygon;
    }

    let mut output = Vec::with_capacity(polygon.len() + 1);
    for (i, current) in polygon.iter().enumerate() {
        let next = &polygon[(i + 1) % polygon.len()];
        let (d_current, d_next) = (distance(current), distance(next));

        if d_current >= 0.0 {
            output.push(*current);
        }
        if (d_current >= 0.0) != (d_next >= 0.0) {
            let t = d_current / (d_current - d_next);
            output.push(current.lerp(next, t));
        }
    }
    output
}

/// Draws a counter-clockwise triangle, skipping it if it faces away.
///
/// `shade` returns a linear RGBA color for each covered fragment that passes the depth test.
pub fn draw_triangle(
    v0: &ScreenVertex,
    v1: &ScreenVertex,
    v2: &ScreenVertex,
    framebuffer: &mut Framebuffer,
    blend: BlendMode,
    shade: &mut impl FnMut(&Fragment) -> DVec4,
) {
    let width = framebuffer.width;
    let height = framebuffer.height;
    if width == 0 || height == 0 {
        return;
    }

    // Precompute area of the triangle; back faces and degenerate ones have none
    let area = edge_function(v0.screen_position, v1.screen_position, v2.screen_position);
    if area <= 0.0 {
        return;
    }

    // Compute bounding box of the triangle
    let min_x = v0
        .screen_position
        .x
        .min(v1.screen_position.x)
        .min(v2.screen_position.x)
        .floor()
        .max(0.0) as usize;
    let max_x = v0
        .screen_position
        .x
        .max(v1.screen_position.x)
        .max(v2.screen_position.x)
        .ceil()
        .min(width as f64 - 1.0);
    let min_y = v0
        .screen_position
        .y
        .min(v1.screen_position.y)
        .min(v2.screen_position.y)
        .floor()
        .max(0.0) as usize;
    let max_y = v0
        .screen_position
        .y
        .max(v1.screen_position.y)
        .max(v2.screen_position.y)
        .ceil()
        .min(height as f64 - 1.0);
    if max_x < 0.0 || max_y < 0.0 {
        return;
    }
    let (max_x, max_y) = (max_x as usize, max_y as usize);

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let p = DVec2::new(x as f64 + 0.5, y as f64 + 0.5);

            let w0 = edge_function(v1.screen_position, v2.screen_position, p);
            let w1 = edge_function(v2.screen_position, v0.screen_position, p);
            let w2 = edge_function(v0.screen_position, v1.screen_position, p);
            if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                continue;
            }

            // Normalize barycentric coordinates
            let (w0, w1, w2) = (w0 / area, w1 / area, w2 / area);

            // Depth test
            let depth = v0.depth * w0 + v1.depth * w1 + v2.depth * w2;
            let offset = y * width + x;
            if depth >= framebuffer.depth[offset] {
                continue;
            }

            // Perspective-correct attributes
            let inv_w = v0.inv_w * w0 + v1.inv_w * w1 + v2.inv_w * w2;
            let w = 1.0 / inv_w;
            let fragment = Fragment {
                position: (v0.position * w0 + v1.position * w1 + v2.position * w2) * w,
                normal: ((v0.normal * w0 + v1.normal * w1 + v2.normal * w2) * w)
                    .normalize_or_zero(),
                uv: (v0.uv * w0 + v1.uv * w1 + v2.uv * w2) * w,
            };

            let color = shade(&fragment);
            framebuffer.depth[offset] = depth;
            framebuffer.color[offset] = match blend {
                BlendMode::Opaque => color.truncate(),
                BlendMode::Alpha => {
                    let alpha = color.w.clamp(0.0, 1.0);
                    color.truncate() * alpha + framebuffer.color[offset] * (1.0 - alpha)
                }
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex(x: f64, y: f64, z: f64, w: f64) -> Vertex {
        Vertex {
            clip: DVec4::new(x, y, z, w),
            position: DVec3::new(x, y, z),
            normal: DVec3::Z,
            uv: DVec2::ZERO,
        }
    }

    fn screen(x: f64, y: f64, depth: f64) -> ScreenVertex {
        ScreenVertex {
            screen_position: DVec2::new(x, y),
            depth,
            inv_w: 1.0,
            position: DVec3::ZERO,
            normal: DVec3::Z,
            uv: DVec2::ZERO,
        }
    }

    fn white(_: &Fragment) -> DVec4 {
        DVec4::ONE
    }

    #[test]
    fn triangles_inside_the_frustum_are_untouched() {
        let tri = [
            vertex(0.0, 0.0, 0.0, 1.0),
            vertex(1.0, 0.0, 0.0, 1.0),
            vertex(0.0, 1.0, 0.0, 1.0),
        ];
        assert_eq!(clip_triangle(tri), tri.to_vec());
    }

    #[test]
    fn triangles_behind_the_near_plane_vanish() {
        let tri = [
            vertex(0.0, 0.0, -2.0, 1.0),
            vertex(1.0, 0.0, -2.0, 1.0),
            vertex(0.0, 1.0, -2.0, 1.0),
        ];
        assert!(clip_triangle(tri).is_empty());
    }

    #[test]
    fn straddling_triangles_become_quads_on_the_near_plane() {
        let tri = [
            vertex(0.0, 0.0, -2.0, 1.0),
            vertex(1.0, 0.0, 0.0, 1.0),
            vertex(0.0, 1.0, 0.0, 1.0),
        ];
        let polygon = clip_triangle(tri);
        assert_eq!(polygon.len(), 4);
        for v in &polygon {
            assert!(v.clip.z + v.clip.w >= -1e-12);
        }
    }

    #[test]
    fn back_faces_are_culled() {
        let mut framebuffer = Framebuffer::new(8, 8);
        let (a, b, c) = (screen(0.0, 0.0, 0.0), screen(0.0, 8.0, 0.0), screen(8.0, 0.0, 0.0));
        draw_triangle(&a, &c, &b, &mut framebuffer, BlendMode::Opaque, &mut white);
        assert_eq!(framebuffer.pixel(1, 1), DVec3::ZERO);
        draw_triangle(&a, &b, &c, &mut framebuffer, BlendMode::Opaque, &mut white);
        assert_eq!(framebuffer.pixel(1, 1), DVec3::ONE);
        // Outside the hypotenuse
        assert_eq!(framebuffer.pixel(7, 7), DVec3::ZERO);
    }

    fn fill(
        framebuffer: &mut Framebuffer,
        tri: &[ScreenVertex; 3],
        blend: BlendMode,
        color: DVec4,
    ) {
        draw_triangle(&tri[0], &tri[1], &tri[2], framebuffer, blend, &mut |_: &Fragment| color);
    }

    #[test]
    fn nearer_fragments_win_the_depth_test() {
        let mut framebuffer = Framebuffer::new(4, 4);
        let near = [screen(0.0, 0.0, 0.1), screen(0.0, 8.0, 0.1), screen(8.0, 0.0, 0.1)];
        let far = [screen(0.0, 0.0, 0.5), screen(0.0, 8.0, 0.5), screen(8.0, 0.0, 0.5)];
        fill(&mut framebuffer, &near, BlendMode::Opaque, DVec4::ONE);
        fill(&mut framebuffer, &far, BlendMode::Opaque, DVec4::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(framebuffer.pixel(0, 0), DVec3::ONE);
        assert!((framebuffer.depth(0, 0) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn alpha_blending_clamps_alpha() {
        let mut framebuffer = Framebuffer::new(2, 2);
        framebuffer.clear(DVec3::ONE);
        let tri = [screen(0.0, 0.0, 0.0), screen(0.0, 8.0, 0.0), screen(8.0, 0.0, 0.0)];
        fill(&mut framebuffer, &tri, BlendMode::Alpha, DVec4::new(0.0, 0.0, 0.0, 0.25));
        assert_eq!(framebuffer.pixel(0, 0), DVec3::splat(0.75));

        framebuffer.clear(DVec3::ONE);
        fill(&mut framebuffer, &tri, BlendMode::Alpha, DVec4::new(0.0, 0.0, 0.0, -0.8));
        assert_eq!(framebuffer.pixel(0, 0), DVec3::ONE);
    }
}
