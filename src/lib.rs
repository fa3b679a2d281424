//! Fish Frenzy - A 3D eat-or-be-eaten fish game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (spawning, movement, collisions, game state)
//! - `camera`: Third-person follow camera
//! - `input`: Keyboard/joystick mapping to logical actions
//! - `scene`: Per-frame draw list handed to the renderer
//! - `assets`: Model loading and OBJ parsing
//! - `renderer`: WebGPU rendering pipeline
//! - `tuning`: Data-driven game balance

pub mod assets;
pub mod camera;
pub mod highscores;
pub mod input;
pub mod renderer;
pub mod scene;
pub mod settings;
pub mod sim;
pub mod storage;
pub mod tuning;

pub use highscores::HighScores;
pub use settings::{QualityPreset, Settings};
pub use tuning::Tuning;

use glam::Vec3;

/// Game configuration constants
pub mod consts {
    /// Simulation frames per second. Every per-frame constant assumes this rate.
    pub const FRAMES_PER_SECOND: u32 = 60;
    /// Fixed simulation timestep
    pub const FRAME_DT: f32 = 1.0 / FRAMES_PER_SECOND as f32;
    /// Maximum substeps per display frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;

    /// Player defaults
    pub const PLAYER_BASE_SIZE: f32 = 2.5;
    /// Forward distance per frame
    pub const PLAYER_SPEED: f32 = 0.05;
    /// Yaw/pitch increment per frame while a turn key is held (radians)
    pub const ROTATION_STEP: f32 = 0.02;
    /// Visual scale of the player model per unit of size
    pub const PLAYER_RENDER_SCALE: f32 = 0.2;

    /// Collision radius per unit of size (before type multiplier)
    pub const COLLISION_RADIUS_FACTOR: f32 = 0.2;
    pub const PLAYER_COLLISION_MULTIPLIER: f32 = 0.8;
    /// Broad-phase cutoff: BASE + PER_SIZE * player size
    pub const BROAD_PHASE_BASE: f32 = 10.0;
    pub const BROAD_PHASE_PER_SIZE: f32 = 2.0;

    /// Swimming area. Entities bounce off these.
    pub const BOUNDS_XZ: f32 = 30.0;
    pub const BOUNDS_MAX_Y: f32 = 10.0;
    /// Just above the ocean floor
    pub const BOUNDS_MIN_Y: f32 = -9.0;
    pub const OCEAN_FLOOR_Y: f32 = -10.0;

    /// Spawn cube (wider than the swimming area on purpose; bounds pull fish in)
    pub const SPAWN_HALF_XZ: f32 = 40.0;
    pub const SPAWN_HALF_Y: f32 = 10.0;
    pub const SPAWN_MIN_DISTANCE_INITIAL: f32 = 20.0;
    pub const SPAWN_MIN_DISTANCE: f32 = 10.0;

    /// Idle swimming oscillation amplitude (x axis; y uses half)
    pub const OSCILLATION_AMPLITUDE: f32 = 0.05;
    /// Swimming roll amplitude (radians)
    pub const SWIM_ROLL: f32 = 0.1;

    /// Bump response distances (player moves further than the entity)
    pub const REPULSION_PLAYER: f32 = 0.2;
    pub const REPULSION_ENTITY: f32 = 0.1;

    /// Invulnerability flicker period (ms per on/off half cycle)
    pub const FLICKER_PERIOD_MS: u32 = 100;
}

/// Convert whole seconds to simulation frames
#[inline]
pub fn seconds_to_frames(seconds: f32) -> u64 {
    (seconds * consts::FRAMES_PER_SECOND as f32).round().max(0.0) as u64
}

/// Convert a frame count to seconds
#[inline]
pub fn frames_to_seconds(frames: u64) -> f32 {
    frames as f32 / consts::FRAMES_PER_SECOND as f32
}

/// Clamp one axis to `[min, max]`.
///
/// Returns the clamped value and which side was crossed: `-1` below, `1` above,
/// `0` inside.
#[inline]
pub fn clamp_axis(value: f32, min: f32, max: f32) -> (f32, i8) {
    if value > max {
        (max, 1)
    } else if value < min {
        (min, -1)
    } else {
        (value, 0)
    }
}

/// HSL to linear-ish RGB (components 0..1)
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> Vec3 {
    let h = h.rem_euclid(1.0);
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    let channel = |mut t: f32| {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        }
    };
    Vec3::new(channel(h + 1.0 / 3.0), channel(h), channel(h - 1.0 / 3.0))
}

/// Hex color (0xRRGGBB) to RGB components
#[inline]
pub fn hex_to_rgb(hex: u32) -> Vec3 {
    Vec3::new(
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_axis() {
        assert_eq!(clamp_axis(31.0, -30.0, 30.0), (30.0, 1));
        assert_eq!(clamp_axis(-9.5, -9.0, 10.0), (-9.0, -1));
        assert_eq!(clamp_axis(0.0, -9.0, 10.0), (0.0, 0));
    }

    #[test]
    fn test_seconds_frames_roundtrip() {
        assert_eq!(seconds_to_frames(3.0), 180);
        assert_eq!(seconds_to_frames(2.0), 120);
        assert!((frames_to_seconds(90) - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_hsl_primaries() {
        let red = hsl_to_rgb(0.0, 1.0, 0.5);
        assert!((red - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-4);
        let green = hsl_to_rgb(1.0 / 3.0, 1.0, 0.5);
        assert!((green - Vec3::new(0.0, 1.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn test_hex_to_rgb() {
        let c = hex_to_rgb(0xff6347);
        assert!((c.x - 1.0).abs() < 1e-6);
        assert!((c.y - 99.0 / 255.0).abs() < 1e-6);
    }
}
