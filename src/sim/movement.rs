//! Per-frame movement for the player and the fish
//!
//! All speeds are per simulation frame.

use glam::{Quat, Vec3};

use super::state::{Entity, Player};
use super::tick::TickInput;
use crate::clamp_axis;
use crate::consts::*;

/// Apply held turn inputs to the player's orientation.
///
/// Yaw turns about the model's local Z axis, pitch about local X. When both
/// directions of an axis are held, right (and up) win.
pub fn steer_player(player: &mut Player, input: &TickInput) {
    let yaw = if input.turn_right {
        ROTATION_STEP
    } else if input.turn_left {
        -ROTATION_STEP
    } else {
        0.0
    };
    if yaw != 0.0 {
        player.orientation *= Quat::from_axis_angle(Vec3::Z, yaw);
    }

    let pitch = if input.pitch_up {
        ROTATION_STEP
    } else if input.pitch_down {
        -ROTATION_STEP
    } else {
        0.0
    };
    if pitch != 0.0 {
        player.orientation *= Quat::from_axis_angle(Vec3::X, pitch);
    }

    player.orientation = player.orientation.normalize();
}

/// Move the player forward along its facing
pub fn advance_player(player: &mut Player, sprint: bool, sprint_factor: f32) {
    let speed = if sprint {
        PLAYER_SPEED * sprint_factor
    } else {
        PLAYER_SPEED
    };
    player.pos += player.forward() * speed;
}

/// Idle swimming offset for the fish at `index`
#[inline]
pub fn oscillation(time_secs: f32, index: usize) -> Vec3 {
    let phase = time_secs + index as f32;
    Vec3::new(
        phase.sin() * OSCILLATION_AMPLITUDE,
        phase.cos() * OSCILLATION_AMPLITUDE * 0.5,
        0.0,
    )
}

/// Reflect off the swimming area walls.
///
/// Crossing a bound flips that direction component and clamps the position to
/// the bound. The floor also forces the fish to head upward.
pub fn apply_bounds(pos: &mut Vec3, dir: &mut Vec3) {
    let (x, side) = clamp_axis(pos.x, -BOUNDS_XZ, BOUNDS_XZ);
    if side != 0 {
        pos.x = x;
        dir.x = -dir.x;
    }

    let (y, side) = clamp_axis(pos.y, BOUNDS_MIN_Y, BOUNDS_MAX_Y);
    match side {
        1 => {
            pos.y = y;
            dir.y = -dir.y;
        }
        -1 => {
            pos.y = y;
            dir.y = dir.y.abs();
        }
        _ => {}
    }

    let (z, side) = clamp_axis(pos.z, -BOUNDS_XZ, BOUNDS_XZ);
    if side != 0 {
        pos.z = z;
        dir.z = -dir.z;
    }
}

/// Orientation that points the model's nose (local -Y) along `dir`, plus a
/// swimming roll about the travel axis
pub fn facing(dir: Vec3, roll: f32) -> Quat {
    let dir = dir.normalize_or(Vec3::NEG_Z);
    let nose_to_dir = Quat::from_rotation_arc(Vec3::NEG_Y, dir);
    Quat::from_axis_angle(dir, roll) * nose_to_dir
}

/// Advance every active fish one frame
pub fn advance_entities(entities: &mut [Entity], time_secs: f32) {
    for (i, entity) in entities.iter_mut().enumerate() {
        if !entity.is_active() {
            continue;
        }

        entity.pos += entity.dir * entity.speed + oscillation(time_secs, i);
        apply_bounds(&mut entity.pos, &mut entity.dir);

        let roll = (time_secs + i as f32).sin() * SWIM_ROLL;
        entity.orientation = facing(entity.dir, roll);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::EntityPhase;

    fn fish(pos: Vec3, dir: Vec3) -> Entity {
        Entity {
            id: 1,
            kind: 0,
            phase: EntityPhase::Active,
            pos,
            dir,
            speed: 0.05,
            exact_size: 1.1,
            orientation: Quat::IDENTITY,
            hue: 0.4,
            edible_at_spawn: true,
            in_contact: false,
        }
    }

    #[test]
    fn test_player_moves_forward() {
        let mut player = Player::default();
        advance_player(&mut player, false, 1.3);
        assert!((player.pos - Vec3::new(0.0, 0.0, -PLAYER_SPEED)).length() < 1e-5);

        let mut sprinter = Player::default();
        advance_player(&mut sprinter, true, 1.3);
        assert!((sprinter.pos.z + PLAYER_SPEED * 1.3).abs() < 1e-5);
    }

    #[test]
    fn test_yaw_turns_heading() {
        let mut player = Player::default();
        let input = TickInput {
            turn_right: true,
            ..Default::default()
        };
        for _ in 0..10 {
            steer_player(&mut player, &input);
        }
        let forward = player.forward();
        // Still level, but no longer straight down -Z
        assert!(forward.y.abs() < 1e-4);
        assert!(forward.x.abs() > 0.1);
        let angle = forward.angle_between(Vec3::NEG_Z);
        assert!((angle - 0.2).abs() < 1e-3);
    }

    #[test]
    fn test_pitch_changes_elevation() {
        let mut player = Player::default();
        let input = TickInput {
            pitch_up: true,
            ..Default::default()
        };
        steer_player(&mut player, &input);
        assert!(player.forward().y.abs() > 0.01);
    }

    #[test]
    fn test_no_input_keeps_orientation() {
        let mut player = Player::default();
        let before = player.orientation;
        steer_player(&mut player, &TickInput::default());
        assert!(before.abs_diff_eq(player.orientation, 1e-6));
    }

    #[test]
    fn test_bounds_reflect_and_clamp() {
        let mut pos = Vec3::new(31.0, 0.0, -35.0);
        let mut dir = Vec3::new(0.5, 0.0, -0.5);
        apply_bounds(&mut pos, &mut dir);
        assert_eq!(pos.x, BOUNDS_XZ);
        assert_eq!(pos.z, -BOUNDS_XZ);
        assert!(dir.x < 0.0 && dir.z > 0.0);
    }

    #[test]
    fn test_floor_forces_upward() {
        let mut pos = Vec3::new(0.0, -9.5, 0.0);
        let mut dir = Vec3::new(0.0, -0.7, 0.0);
        apply_bounds(&mut pos, &mut dir);
        assert_eq!(pos.y, BOUNDS_MIN_Y);
        assert!(dir.y > 0.0);

        let mut pos = Vec3::new(0.0, 10.5, 0.0);
        let mut dir = Vec3::new(0.0, 0.7, 0.0);
        apply_bounds(&mut pos, &mut dir);
        assert_eq!(pos.y, BOUNDS_MAX_Y);
        assert!(dir.y < 0.0);
    }

    #[test]
    fn test_entities_stay_in_bounds() {
        let mut entities = vec![fish(Vec3::new(29.99, 9.99, 0.0), Vec3::new(1.0, 1.0, 0.0).normalize())];
        for frame in 0..600 {
            advance_entities(&mut entities, frame as f32 / 60.0);
            let p = entities[0].pos;
            assert!(p.x.abs() <= BOUNDS_XZ && p.z.abs() <= BOUNDS_XZ);
            assert!(p.y >= BOUNDS_MIN_Y && p.y <= BOUNDS_MAX_Y);
        }
    }

    #[test]
    fn test_loading_entities_do_not_move() {
        let mut e = fish(Vec3::new(1.0, 2.0, 3.0), Vec3::X);
        e.phase = EntityPhase::Loading;
        let mut entities = vec![e];
        advance_entities(&mut entities, 1.0);
        assert_eq!(entities[0].pos, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_facing_points_nose_along_direction() {
        let dir = Vec3::new(1.0, 0.0, 0.0);
        let q = facing(dir, 0.0);
        assert!((q * Vec3::NEG_Y - dir).length() < 1e-5);
        // Roll keeps the nose on the travel axis
        let rolled = facing(dir, 0.1);
        assert!((rolled * Vec3::NEG_Y - dir).length() < 1e-5);
    }
}
