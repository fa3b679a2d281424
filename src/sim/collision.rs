//! Collision detection and scoring
//!
//! Distance-based checks between the player and every active fish. The size
//! ratio decides who eats whom; near-equal sizes just bump apart.

use super::state::{
    BURST_COLOR_CLOSE_CALL, BURST_COLOR_DEATH, BURST_COLOR_EAT, GameEvent, GamePhase, GameState,
};
use crate::consts::*;

/// What happens when the player touches a fish
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Player is bigger by more than the hysteresis band
    Eat,
    /// Fish is bigger by more than the hysteresis band
    Eaten,
    /// Sizes within the band of each other
    Bump,
}

/// Decide the outcome of a touch from relative size alone
#[inline]
pub fn classify(player_size: f32, entity_size: f32, hysteresis: f32) -> Outcome {
    if player_size > entity_size * hysteresis {
        Outcome::Eat
    } else if entity_size > player_size * hysteresis {
        Outcome::Eaten
    } else {
        Outcome::Bump
    }
}

/// True if two spheres overlap
#[inline]
pub fn spheres_touch(distance: f32, radius_a: f32, radius_b: f32) -> bool {
    distance < radius_a + radius_b
}

/// Points awarded for eating a fish of `entity_size`
pub fn meal_points(entity_size: f32, player_size: f32, close_call_ratio: f32) -> u64 {
    let bonus = if is_close_call(entity_size, player_size, close_call_ratio) {
        2.0
    } else {
        1.0
    };
    (entity_size * 10.0 * bonus).round().max(0.0) as u64
}

#[inline]
pub fn is_close_call(entity_size: f32, player_size: f32, close_call_ratio: f32) -> bool {
    entity_size > player_size * close_call_ratio
}

/// Size the player gains for eating a fish of `entity_size`
#[inline]
pub fn growth(entity_size: f32, player_size: f32) -> f32 {
    0.05 + (entity_size / player_size) * 0.05
}

/// True on frames the throttled collision pass should run
#[inline]
pub fn should_evaluate(counter: u64, interval: u32) -> bool {
    counter % interval.max(1) as u64 == 0
}

/// Whether the player is drawn during the invulnerability flicker
#[inline]
pub fn flicker_visible(frame: u64) -> bool {
    let elapsed_ms = frame * 1000 / FRAMES_PER_SECOND as u64;
    (elapsed_ms / FLICKER_PERIOD_MS as u64) % 2 == 0
}

/// Run the collision pass for one frame.
///
/// Throttled to every `collision_interval` frames and suppressed entirely
/// while the player is invulnerable. Eaten fish are marked during the pass
/// and compacted out once at the end.
pub fn resolve(state: &mut GameState) {
    if state.phase != GamePhase::Running {
        return;
    }

    state.collision_counter += 1;
    if !should_evaluate(state.collision_counter, state.tuning.collision_interval) {
        return;
    }

    if state.is_invulnerable() {
        state.player.visible = flicker_visible(state.frame);
        return;
    }
    state.player.visible = true;

    let hysteresis = state.tuning.hysteresis;
    let close_call_ratio = state.tuning.close_call_ratio;
    let max_check_distance = broad_phase_radius(state.player.size);

    let mut eaten_ids: Vec<u32> = Vec::new();
    let mut respawns = 0usize;

    for i in 0..state.entities.len() {
        let entity = &state.entities[i];
        if !entity.is_active() {
            continue;
        }

        let player_pos = state.player.pos;
        let distance = player_pos.distance(entity.pos);
        let touching = distance <= max_check_distance
            && spheres_touch(
                distance,
                state.player.collision_radius(),
                entity.collision_radius(),
            );
        if !touching {
            state.entities[i].in_contact = false;
            continue;
        }

        let player_size = state.player.size;
        let exact_size = entity.exact_size;
        let entity_pos = entity.pos;
        log::trace!(
            "Collision: player {:.2} vs fish #{} {:.2} at {:.2}",
            player_size,
            entity.id,
            exact_size,
            distance
        );

        match classify(player_size, exact_size, hysteresis) {
            Outcome::Eat => {
                eaten_ids.push(entity.id);

                let close_call = is_close_call(exact_size, player_size, close_call_ratio);
                let points = meal_points(exact_size, player_size, close_call_ratio);
                state.player.score += points;
                state.player.size += growth(exact_size, player_size);

                let color = if close_call {
                    BURST_COLOR_CLOSE_CALL
                } else {
                    BURST_COLOR_EAT
                };
                state.add_burst(entity_pos, color);
                state.events.push(GameEvent::Ate {
                    position: entity_pos,
                    points,
                    close_call,
                });

                let remaining = state.entities.len() - eaten_ids.len();
                if remaining < state.tuning.population_floor {
                    respawns += state.tuning.respawn_batch;
                }
            }
            Outcome::Eaten => {
                state.add_burst(player_pos, BURST_COLOR_DEATH);
                state.events.push(GameEvent::Eaten {
                    position: player_pos,
                });
                state.end();
                break;
            }
            Outcome::Bump => {
                // Coincident centres have no separating axis; back the player off
                let push = (player_pos - entity_pos).normalize_or(-state.player.forward());
                state.player.pos += push * REPULSION_PLAYER;
                let entity = &mut state.entities[i];
                entity.pos -= push * REPULSION_ENTITY;
                // One bump per contact, however long the overlap lasts
                if !entity.in_contact {
                    entity.in_contact = true;
                    state.events.push(GameEvent::Bumped);
                }
            }
        }
    }

    if !eaten_ids.is_empty() {
        state.entities.retain(|e| !eaten_ids.contains(&e.id));
    }

    if respawns > 0 && state.phase == GamePhase::Running {
        super::spawn::spawn(state, respawns);
    }
}

/// Broad-phase radius for a player of `size`
#[inline]
pub fn broad_phase_radius(size: f32) -> f32 {
    BROAD_PHASE_BASE + size * BROAD_PHASE_PER_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{Entity, EntityPhase};
    use glam::{Quat, Vec3};
    use proptest::prelude::*;

    /// A running session past its invulnerability window with one fish on top of the player
    fn session_with_fish(exact_size: f32, kind: usize) -> GameState {
        let mut state = GameState::new(42);
        state.start();
        state.entities.clear();
        state.frame = state.player.invulnerable_until;
        // Next resolve() call evaluates
        state.collision_counter = state.tuning.collision_interval as u64 - 1;
        let id = state.next_entity_id();
        state.entities.push(Entity {
            id,
            kind,
            phase: EntityPhase::Active,
            pos: state.player.pos,
            dir: Vec3::X,
            speed: 0.0,
            exact_size,
            orientation: Quat::IDENTITY,
            hue: 0.4,
            edible_at_spawn: true,
            in_contact: false,
        });
        state
    }

    #[test]
    fn test_classify_branches() {
        assert_eq!(classify(2.5, 1.0, 1.1), Outcome::Eat);
        assert_eq!(classify(2.5, 3.0, 1.1), Outcome::Eaten);
        assert_eq!(classify(2.5, 2.4, 1.1), Outcome::Bump);
        // Exactly on the band edge is still a bump
        assert_eq!(classify(1.1, 1.0, 1.1), Outcome::Bump);
    }

    #[test]
    fn test_eat_scenario() {
        let mut state = session_with_fish(1.0, 1);
        let eaten_id = state.entities[0].id;
        resolve(&mut state);
        assert!(state.entities.iter().all(|e| e.id != eaten_id));
        // 1.0 is not a close call at 2.5 (needs > 2.0): 1.0 * 10 * 1
        assert_eq!(state.player.score, 10);
        assert!((state.player.size - (2.5 + 0.07)).abs() < 1e-5);
        assert_eq!(state.bursts.len(), 1);
        // Population dropped under the floor: respawn batch queued
        assert_eq!(state.entities.len(), 3);
    }

    #[test]
    fn test_close_call_doubles_points() {
        assert_eq!(meal_points(2.2, 2.5, 0.8), 44);
        assert_eq!(meal_points(1.0, 2.5, 0.8), 10);
        assert_eq!(meal_points(1.26, 2.5, 0.8), 13);
    }

    #[test]
    fn test_eaten_scenario() {
        let mut state = session_with_fish(3.0, 4);
        resolve(&mut state);
        assert_eq!(state.phase, GamePhase::Ended);
        assert_eq!(state.player.score, 0);
        assert!(
            state
                .drain_events()
                .iter()
                .any(|e| matches!(e, GameEvent::Eaten { .. }))
        );
    }

    #[test]
    fn test_bump_scenario() {
        let mut state = session_with_fish(2.4, 2);
        let player_before = state.player.pos;
        let fish_before = state.entities[0].pos;
        resolve(&mut state);
        assert_eq!(state.phase, GamePhase::Running);
        assert_eq!(state.entities.len(), 1);
        assert_eq!(state.player.score, 0);
        let player_shift = state.player.pos.distance(player_before);
        let fish_shift = state.entities[0].pos.distance(fish_before);
        assert!((player_shift - REPULSION_PLAYER).abs() < 1e-5);
        assert!((fish_shift - REPULSION_ENTITY).abs() < 1e-5);
        assert!(state.player.pos.distance(state.entities[0].pos) > 0.0);
    }

    #[test]
    fn test_long_overlap_bumps_once() {
        let mut state = session_with_fish(2.4, 2);
        let interval = state.tuning.collision_interval as u64;
        let bumps = |state: &mut GameState| {
            state
                .drain_events()
                .iter()
                .filter(|e| **e == GameEvent::Bumped)
                .count()
        };

        for _ in 0..10 {
            state.entities[0].pos = state.player.pos + Vec3::new(0.0, 0.0, 0.05);
            state.collision_counter = interval - 1;
            resolve(&mut state);
        }
        assert_eq!(bumps(&mut state), 1);

        // Separate, then touch again: a fresh contact
        state.entities[0].pos = state.player.pos + Vec3::new(0.0, 0.0, 5.0);
        state.collision_counter = interval - 1;
        resolve(&mut state);
        assert!(!state.entities[0].in_contact);
        state.entities[0].pos = state.player.pos + Vec3::new(0.0, 0.0, 0.05);
        state.collision_counter = interval - 1;
        resolve(&mut state);
        assert_eq!(bumps(&mut state), 1);
    }

    #[test]
    fn test_invulnerability_blocks_outcomes() {
        let mut state = session_with_fish(3.0, 4);
        state.frame = 0;
        // Every frame of the 3 second window
        for frame in 0..state.player.invulnerable_until {
            state.frame = frame;
            resolve(&mut state);
            assert_eq!(state.phase, GamePhase::Running);
        }
        state.frame = state.player.invulnerable_until;
        // Throttle may skip one frame
        resolve(&mut state);
        resolve(&mut state);
        assert_eq!(state.phase, GamePhase::Ended);
    }

    #[test]
    fn test_throttle_skips_odd_frames() {
        let mut state = session_with_fish(1.0, 1);
        state.collision_counter = 0;
        // Counter becomes 1: skipped
        resolve(&mut state);
        assert_eq!(state.player.score, 0);
        // Counter becomes 2: evaluated
        resolve(&mut state);
        assert_eq!(state.player.score, 10);
    }

    #[test]
    fn test_far_fish_ignored() {
        let mut state = session_with_fish(1.0, 1);
        state.entities[0].pos = Vec3::new(0.0, 0.0, 50.0);
        resolve(&mut state);
        assert_eq!(state.entities.len(), 1);
        assert_eq!(state.player.score, 0);
    }

    #[test]
    fn test_loading_fish_not_collidable() {
        let mut state = session_with_fish(3.0, 4);
        state.entities[0].phase = EntityPhase::Loading;
        resolve(&mut state);
        assert_eq!(state.phase, GamePhase::Running);
    }

    #[test]
    fn test_flicker_period() {
        // 100ms = 6 frames at 60 Hz
        assert!(flicker_visible(0));
        assert!(flicker_visible(5));
        assert!(!flicker_visible(6));
        assert!(flicker_visible(12));
    }

    #[test]
    fn test_broad_phase_grows_with_size() {
        assert_eq!(broad_phase_radius(2.5), 15.0);
        assert_eq!(broad_phase_radius(5.0), 20.0);
    }

    proptest! {
        #[test]
        fn prop_exactly_one_outcome(p in 0.1f32..20.0, e in 0.1f32..20.0) {
            let outcome = classify(p, e, 1.1);
            let eat = p > e * 1.1;
            let eaten = e > p * 1.1;
            prop_assert!(!(eat && eaten));
            match outcome {
                Outcome::Eat => prop_assert!(eat),
                Outcome::Eaten => prop_assert!(eaten),
                Outcome::Bump => prop_assert!(!eat && !eaten),
            }
        }

        #[test]
        fn prop_score_and_size_never_decrease(seed in any::<u64>(), sizes in proptest::collection::vec(0.5f32..3.8, 1..20)) {
            let mut state = session_with_fish(sizes[0], 0);
            for (n, size) in sizes.iter().enumerate() {
                if state.phase != GamePhase::Running {
                    break;
                }
                let score = state.player.score;
                let player_size = state.player.size;
                state.entities[0].exact_size = *size;
                state.entities[0].pos = state.player.pos + Vec3::new(0.0, 0.0, (seed % 3) as f32 * 0.01);
                state.collision_counter = state.tuning.collision_interval as u64 - 1;
                resolve(&mut state);
                prop_assert!(state.player.score >= score, "score dropped at step {}", n);
                prop_assert!(state.player.size >= player_size);
                if state.entities.is_empty() || !state.entities[0].is_active() {
                    break;
                }
            }
        }
    }
}
