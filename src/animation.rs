use glam::DVec3;
use std::f64::consts::PI;

use crate::scene::{Scene, SceneHandles};

/// Angular rate of the bounce in rad/s
pub const JUMP_FREQUENCY: f64 = 1.5 * PI;
/// Exponential decay rate of the bounce amplitude per second
pub const JUMP_DECAY: f64 = 0.01;
/// Peak bounce height at t = 0
pub const JUMP_AMPLITUDE: f64 = 3.0;

/// Height of the ball `t` seconds into the animation: `|sin(1.5πt) e^(-0.01t)| * 3`
pub fn jump_height(t: f64) -> f64 {
    (f64::sin(t * JUMP_FREQUENCY) * f64::exp(-JUMP_DECAY * t)).abs() * JUMP_AMPLITUDE
}

/// Everything the animation writes each frame
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionState {
    pub sphere_position: DVec3,
    pub shadow_position: DVec3,
    pub shadow_opacity: f64,
}

impl MotionState {
    /// Reads the animated fields out of the scene
    pub fn capture(scene: &Scene, handles: &SceneHandles) -> Self {
        let shadow = scene.mesh(handles.shadow);
        MotionState {
            sphere_position: scene.mesh(handles.sphere).position,
            shadow_position: shadow.position,
            shadow_opacity: shadow.material.basic().map_or(1.0, |m| m.opacity),
        }
    }

    /// State for the frame at `elapsed` seconds.
    ///
    /// The shadow opacity is taken from the sphere height *before* this frame's update,
    /// so it trails the ball by one frame.
    pub fn advance(&self, elapsed: f64) -> MotionState {
        let sphere = self.sphere_position;
        MotionState {
            shadow_opacity: (1.0 - sphere.y) * 0.5,
            shadow_position: DVec3::new(sphere.x, self.shadow_position.y, sphere.z),
            sphere_position: DVec3::new(sphere.x, jump_height(elapsed), sphere.z),
        }
    }

    /// Writes the state back into the scene
    pub fn apply(&self, scene: &mut Scene, handles: &SceneHandles) {
        scene.mesh_mut(handles.sphere).position = self.sphere_position;
        let shadow = scene.mesh_mut(handles.shadow);
        shadow.position = self.shadow_position;
        if let Some(material) = shadow.material.basic_mut() {
            material.opacity = self.shadow_opacity;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{build_scene, SceneTextures, GROUND_Y, SHADOW_OFFSET};
    use crate::texture::Texture;

    fn jump_envelope(t: f64) -> f64 {
        JUMP_AMPLITUDE * f64::exp(-JUMP_DECAY * t)
    }

    fn initial() -> MotionState {
        MotionState {
            sphere_position: DVec3::ZERO,
            shadow_position: DVec3::new(0.0, GROUND_Y + SHADOW_OFFSET, 0.0),
            shadow_opacity: 1.0,
        }
    }

    #[test]
    fn starts_on_the_ground() {
        assert_eq!(jump_height(0.0), 0.0);
    }

    #[test]
    fn stays_within_the_decaying_envelope() {
        for i in 0..20_000 {
            let t = i as f64 * 0.01;
            let h = jump_height(t);
            assert!(h >= 0.0, "negative at {t}");
            assert!(h <= jump_envelope(t) + 1e-12, "above envelope at {t}");
        }
    }

    #[test]
    fn peaks_a_quarter_period_in() {
        // 1.5π · 1/3 = π/2
        let h = jump_height(1.0 / 3.0);
        assert!((h - 3.0 * f64::exp(-0.01 / 3.0)).abs() < 1e-12);
        assert!((h - 2.990).abs() < 1e-3);
    }

    #[test]
    fn height_at_one_sixth_second() {
        let t = 0.1667;
        let expected = (1.5 * PI * t).sin() * (-0.01 * t).exp() * 3.0;
        assert!((jump_height(t) - expected).abs() < 1e-12);
        assert!((jump_height(t) - 2.1181).abs() < 1e-3);
    }

    #[test]
    fn bounces_every_two_thirds_of_a_second() {
        for k in 1..10 {
            assert!(jump_height(k as f64 * 2.0 / 3.0) < 1e-12);
        }
    }

    #[test]
    fn first_tick_uses_the_initial_height_for_opacity() {
        let next = initial().advance(0.0);
        assert_eq!(next.shadow_opacity, 0.5);
        assert_eq!(next.sphere_position.y, 0.0);
    }

    #[test]
    fn opacity_lags_height_by_one_tick() {
        let times = [0.0, 0.016, 0.033, 0.05, 0.1667, 0.2, 1.0 / 3.0, 0.5];
        let mut state = initial();
        let mut previous_height = 0.0;
        for &t in &times {
            state = state.advance(t);
            assert_eq!(state.shadow_opacity, (1.0 - previous_height) * 0.5);
            assert_eq!(state.sphere_position.y, jump_height(t));
            previous_height = jump_height(t);
        }
    }

    #[test]
    fn shadow_follows_horizontally_at_a_fixed_height() {
        let mut state = initial();
        state.sphere_position = DVec3::new(0.75, 1.0, -2.5);
        for i in 0..50 {
            state = state.advance(i as f64 / 60.0);
            assert_eq!(state.shadow_position.x, state.sphere_position.x);
            assert_eq!(state.shadow_position.z, state.sphere_position.z);
            assert!((state.shadow_position.y - -0.49).abs() < 1e-12);
        }
    }

    #[test]
    fn capture_and_apply_round_trip_through_the_scene() {
        let textures = SceneTextures {
            baked_shadow: Texture::placeholder(),
            ball: Texture::placeholder(),
            court: Texture::placeholder(),
        };
        let (mut scene, handles) = build_scene(&textures);
        let start = MotionState::capture(&scene, &handles);
        assert_eq!(start, initial());

        let next = start.advance(0.25);
        next.apply(&mut scene, &handles);
        assert_eq!(MotionState::capture(&scene, &handles), next);
        assert_eq!(scene.mesh(handles.sphere).position.y, jump_height(0.25));
    }
}
