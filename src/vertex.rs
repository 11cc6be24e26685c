use glam::{DVec2, DVec3, DVec4};

/// Vertex after the vertex stage: clip position plus the attributes the fragment stage needs
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    /// Homogeneous clip-space position
    pub clip: DVec4,
    /// World-space position
    pub position: DVec3,
    /// World-space normal
    pub normal: DVec3,
    /// Texture coordinates
    pub uv: DVec2,
}

impl Vertex {
    /// Linear interpolation of every attribute, used when clipping edges
    pub fn lerp(&self, other: &Vertex, t: f64) -> Vertex {
        Vertex {
            clip: self.clip.lerp(other.clip, t),
            position: self.position.lerp(other.position, t),
            normal: self.normal.lerp(other.normal, t),
            uv: self.uv.lerp(other.uv, t),
        }
    }
}

/// Vertex after perspective divide and viewport mapping
#[derive(Clone, Copy, Debug)]
pub struct ScreenVertex {
    /// Pixel coordinates, y pointing down
    pub screen_position: DVec2,
    /// Normalized device depth in [-1, 1]
    pub depth: f64,
    /// Reciprocal of clip w, for perspective-correct interpolation
    pub inv_w: f64,
    /// Attributes pre-divided by clip w
    pub position: DVec3,
    pub normal: DVec3,
    pub uv: DVec2,
}

impl ScreenVertex {
    /// Projects a clipped vertex onto a `width` x `height` pixel grid
    pub fn project(v: &Vertex, width: f64, height: f64) -> ScreenVertex {
        let inv_w = 1.0 / v.clip.w;
        let ndc = v.clip.truncate() * inv_w;
        ScreenVertex {
            screen_position: DVec2::new(
                (ndc.x + 1.0) * 0.5 * width,
                (1.0 - ndc.y) * 0.5 * height,
            ),
            depth: ndc.z,
            inv_w,
            position: v.position * inv_w,
            normal: v.normal * inv_w,
            uv: v.uv * inv_w,
        }
    }
}
