use glam::{DMat4, DVec3};

pub const FOV_DEGREES: f64 = 75.0;
pub const NEAR: f64 = 0.1;
pub const FAR: f64 = 100.0;
pub const START_POSITION: DVec3 = DVec3::new(1.0, 1.0, 2.0);

/// Perspective camera. Right-handed, looks from `position` towards `target`.
pub struct PerspectiveCamera {
    /// Vertical field of view in degrees
    pub fov: f64,
    /// Aspect ratio (width / height)
    pub aspect: f64,
    pub near: f64,
    pub far: f64,
    pub position: DVec3,
    pub target: DVec3,
    projection_matrix: DMat4,
}

impl PerspectiveCamera {
    pub fn new(fov: f64, aspect: f64, near: f64, far: f64) -> Self {
        let mut camera = PerspectiveCamera {
            fov,
            aspect,
            near,
            far,
            position: DVec3::ZERO,
            target: DVec3::NEG_Z,
            projection_matrix: DMat4::IDENTITY,
        };
        camera.update_projection_matrix();
        camera
    }

    /// Recomputes the projection after `fov`, `aspect`, `near` or `far` changed
    pub fn update_projection_matrix(&mut self) {
        self.projection_matrix = DMat4::perspective_rh_gl(
            self.fov.to_radians(),
            self.aspect.max(1e-6),
            self.near,
            self.far,
        );
    }

    pub fn look_at(&mut self, target: DVec3) {
        self.target = target;
    }

    pub fn projection_matrix(&self) -> DMat4 {
        self.projection_matrix
    }

    pub fn view_matrix(&self) -> DMat4 {
        DMat4::look_at_rh(self.position, self.target, DVec3::Y)
    }

    pub fn view_projection(&self) -> DMat4 {
        self.projection_matrix * self.view_matrix()
    }

    /// Camera basis in world space: (right, up, forward)
    pub fn basis(&self) -> (DVec3, DVec3, DVec3) {
        let forward = (self.target - self.position).normalize_or_zero();
        let right = forward.cross(DVec3::Y).normalize_or_zero();
        let up = right.cross(forward);
        (right, up, forward)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec4;

    #[test]
    fn projection_follows_aspect() {
        let mut camera = PerspectiveCamera::new(FOV_DEGREES, 1.0, NEAR, FAR);
        let square = camera.projection_matrix();
        camera.aspect = 2.0;
        // Not applied until the projection is recomputed
        assert_eq!(camera.projection_matrix(), square);
        camera.update_projection_matrix();
        let wide = camera.projection_matrix();
        assert!((wide.x_axis.x * 2.0 - square.x_axis.x).abs() < 1e-12);
        assert_eq!(wide.y_axis.y, square.y_axis.y);
    }

    #[test]
    fn target_projects_to_screen_center() {
        let mut camera = PerspectiveCamera::new(FOV_DEGREES, 16.0 / 9.0, NEAR, FAR);
        camera.position = START_POSITION;
        camera.look_at(DVec3::ZERO);
        let clip = camera.view_projection() * DVec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-12 && ndc.y.abs() < 1e-12);
        assert!(ndc.z > -1.0 && ndc.z < 1.0);
    }

    #[test]
    fn basis_is_orthonormal() {
        let mut camera = PerspectiveCamera::new(FOV_DEGREES, 1.0, NEAR, FAR);
        camera.position = START_POSITION;
        camera.look_at(DVec3::ZERO);
        let (right, up, forward) = camera.basis();
        assert!(right.dot(up).abs() < 1e-12);
        assert!(right.dot(forward).abs() < 1e-12);
        assert!((up.length() - 1.0).abs() < 1e-12);
        assert!(up.y > 0.0);
    }
}
