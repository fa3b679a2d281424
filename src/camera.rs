//! Third-person follow camera
//!
//! Trails behind and above the player, easing towards an ideal pose each
//! frame and looking ahead along the player's heading.

use glam::{Mat4, Vec3};

/// Vertical field of view (degrees)
pub const FOV_Y_DEGREES: f32 = 75.0;
pub const NEAR: f32 = 0.1;
pub const FAR: f32 = 1000.0;
/// Fraction of the remaining distance covered per frame
pub const FOLLOW_LERP: f32 = 0.05;
/// Sideways offset so the player isn't dead centre
pub const SIDE_OFFSET: f32 = 0.7;

/// Where the camera sits and what it looks at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub eye: Vec3,
    pub target: Vec3,
}

impl CameraPose {
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, Vec3::Y)
    }

    pub fn projection(aspect: f32) -> Mat4 {
        Mat4::perspective_rh(FOV_Y_DEGREES.to_radians(), aspect.max(0.01), NEAR, FAR)
    }

    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        Self::projection(aspect) * self.view()
    }
}

/// Ideal camera position for a player at `pos` facing `forward`
pub fn ideal_eye(pos: Vec3, forward: Vec3, size: f32) -> Vec3 {
    let distance = 4.0 + size;
    let height = 2.5 + size * 0.4;
    pos - forward * distance + Vec3::new(SIDE_OFFSET, height, 0.0)
}

/// Point the camera aims at, ahead of the player
pub fn look_target(pos: Vec3, forward: Vec3, size: f32) -> Vec3 {
    pos + forward * (3.0 + size)
}

/// Smoothed chase camera. Only the previous eye position is remembered.
#[derive(Debug, Clone, Copy)]
pub struct FollowCamera {
    pub eye: Vec3,
}

impl Default for FollowCamera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 2.0, 10.0),
        }
    }
}

impl FollowCamera {
    /// Step one frame towards the ideal pose
    pub fn update(&mut self, pos: Vec3, forward: Vec3, size: f32) -> CameraPose {
        let ideal = ideal_eye(pos, forward, size);
        self.eye = self.eye.lerp(ideal, FOLLOW_LERP);
        CameraPose {
            eye: self.eye,
            target: look_target(pos, forward, size),
        }
    }

    /// Current pose without advancing the smoothing
    pub fn pose(&self, pos: Vec3, forward: Vec3, size: f32) -> CameraPose {
        CameraPose {
            eye: self.eye,
            target: look_target(pos, forward, size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ideal_eye_behind_and_above() {
        let eye = ideal_eye(Vec3::ZERO, Vec3::NEG_Z, 2.5);
        assert!((eye - Vec3::new(0.7, 3.5, 6.5)).length() < 1e-5);
    }

    #[test]
    fn test_follow_converges() {
        let mut camera = FollowCamera::default();
        let pos = Vec3::new(5.0, 0.0, -5.0);
        for _ in 0..500 {
            camera.update(pos, Vec3::NEG_Z, 2.5);
        }
        let ideal = ideal_eye(pos, Vec3::NEG_Z, 2.5);
        assert!(camera.eye.distance(ideal) < 1e-3);
    }

    #[test]
    fn test_single_step_is_five_percent() {
        let mut camera = FollowCamera::default();
        let start = camera.eye;
        let ideal = ideal_eye(Vec3::ZERO, Vec3::NEG_Z, 2.5);
        camera.update(Vec3::ZERO, Vec3::NEG_Z, 2.5);
        let expected = start + (ideal - start) * FOLLOW_LERP;
        assert!(camera.eye.distance(expected) < 1e-5);
    }

    #[test]
    fn test_target_scales_with_size() {
        let small = look_target(Vec3::ZERO, Vec3::NEG_Z, 1.0);
        let big = look_target(Vec3::ZERO, Vec3::NEG_Z, 5.0);
        assert_eq!(small, Vec3::new(0.0, 0.0, -4.0));
        assert_eq!(big, Vec3::new(0.0, 0.0, -8.0));
    }
}
