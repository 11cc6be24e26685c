use glam::{DVec2, DVec3};
use std::f64::consts::{PI, TAU};

use crate::camera::PerspectiveCamera;

const EPS: f64 = 1e-6;

/// Which drag gesture is in progress
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragMode {
    Rotate,
    Pan,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Spherical {
    radius: f64,
    /// Polar angle from +Y
    phi: f64,
    /// Azimuth around +Y, measured from +Z
    theta: f64,
}

impl Spherical {
    fn from_vector(v: DVec3) -> Self {
        let radius = v.length();
        if radius == 0.0 {
            return Spherical::default();
        }
        Spherical {
            radius,
            phi: (v.y / radius).clamp(-1.0, 1.0).acos(),
            theta: v.x.atan2(v.z),
        }
    }

    fn to_vector(self) -> DVec3 {
        let sin_phi_radius = self.phi.sin() * self.radius;
        DVec3::new(
            sin_phi_radius * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_radius * self.theta.cos(),
        )
    }
}

/// Damped orbit controls: rotate, dolly and pan a camera around a target point.
///
/// Input only accumulates deltas. `update` applies a fraction of them each frame and
/// decays the rest, which gives the inertia.
pub struct OrbitControls {
    pub target: DVec3,
    pub enable_damping: bool,
    pub damping_factor: f64,
    pub rotate_speed: f64,
    pub zoom_speed: f64,
    pub pan_speed: f64,
    pub min_distance: f64,
    pub max_distance: f64,
    spherical_delta: Spherical,
    pan_offset: DVec3,
    scale: f64,
    drag: Option<(DragMode, DVec2)>,
}

impl Default for OrbitControls {
    fn default() -> Self {
        OrbitControls {
            target: DVec3::ZERO,
            enable_damping: false,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f64::INFINITY,
            spherical_delta: Spherical::default(),
            pan_offset: DVec3::ZERO,
            scale: 1.0,
            drag: None,
        }
    }
}

impl OrbitControls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a drag at pointer position `at` (pixels)
    pub fn begin_drag(&mut self, mode: DragMode, at: DVec2) {
        self.drag = Some((mode, at));
    }

    /// Continues the current drag. `viewport_height` is the client height in pixels.
    pub fn drag_to(&mut self, at: DVec2, viewport_height: f64, camera: &PerspectiveCamera) {
        let Some((mode, last)) = self.drag else {
            return;
        };
        let delta = at - last;
        let height = viewport_height.max(1.0);
        match mode {
            DragMode::Rotate => {
                let delta = delta * self.rotate_speed;
                self.rotate_left(TAU * delta.x / height);
                self.rotate_up(TAU * delta.y / height);
            }
            DragMode::Pan => self.pan(delta * self.pan_speed, height, camera),
        }
        self.drag = Some((mode, at));
    }

    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// One wheel notch. Negative `delta_y` scrolls up and moves closer.
    pub fn wheel(&mut self, delta_y: f64) {
        let zoom_scale = 0.95f64.powf(self.zoom_speed);
        if delta_y < 0.0 {
            self.scale *= zoom_scale;
        } else if delta_y > 0.0 {
            self.scale /= zoom_scale;
        }
    }

    pub fn rotate_left(&mut self, angle: f64) {
        self.spherical_delta.theta -= angle;
    }

    pub fn rotate_up(&mut self, angle: f64) {
        self.spherical_delta.phi -= angle;
    }

    /// Screen-space pan: `delta` in pixels, scaled so the target plane tracks the pointer
    fn pan(&mut self, delta: DVec2, viewport_height: f64, camera: &PerspectiveCamera) {
        let offset = camera.position - self.target;
        let target_distance = offset.length() * (camera.fov.to_radians() * 0.5).tan();
        let (right, up, _) = camera.basis();

        self.pan_offset -= right * (2.0 * delta.x * target_distance / viewport_height);
        self.pan_offset += up * (2.0 * delta.y * target_distance / viewport_height);
    }

    /// Advances one step and repositions the camera. Returns true if the camera moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let before = camera.position;
        let mut spherical = Spherical::from_vector(camera.position - self.target);

        let factor = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };
        spherical.theta += self.spherical_delta.theta * factor;
        spherical.phi += self.spherical_delta.phi * factor;
        spherical.phi = spherical.phi.clamp(EPS, PI - EPS);

        self.target += self.pan_offset * factor;

        spherical.radius =
            (spherical.radius * self.scale).clamp(self.min_distance, self.max_distance);

        camera.position = self.target + spherical.to_vector();
        camera.look_at(self.target);

        if self.enable_damping {
            let decay = 1.0 - self.damping_factor;
            self.spherical_delta.theta *= decay;
            self.spherical_delta.phi *= decay;
            self.pan_offset *= decay;
        } else {
            self.spherical_delta = Spherical::default();
            self.pan_offset = DVec3::ZERO;
        }
        self.scale = 1.0;

        before.distance_squared(camera.position) > EPS
    }
}
