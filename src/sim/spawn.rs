//! Procedural fish spawning
//!
//! Batches are split into edible and dangerous slots biased by the player's
//! current size, then placed away from the player.

use glam::{Quat, Vec3};
use rand::Rng;
use rand::seq::IndexedRandom;

use super::catalog::{CATALOG, ModelKey, SizeCategory, index_of_category};
use super::state::{Entity, EntityPhase, GameEvent, GameState};
use crate::consts::*;

/// Rejection samples before forcing a candidate out to the minimum distance
pub const MAX_SPAWN_ATTEMPTS: u32 = 64;

/// Catalog indices the player can eat (player at least 95% of the edible reference)
pub fn edible_types(player_size: f32) -> Vec<usize> {
    CATALOG
        .iter()
        .enumerate()
        .filter(|(_, t)| player_size >= t.category.edible_reference() * 0.95)
        .map(|(i, _)| i)
        .collect()
}

/// Catalog indices that outsize the player by at least 10%
pub fn dangerous_types(player_size: f32) -> Vec<usize> {
    CATALOG
        .iter()
        .enumerate()
        .filter(|(_, t)| t.category.danger_reference() > player_size * 1.1)
        .map(|(i, _)| i)
        .collect()
}

/// Split a batch into (edible, dangerous) counts
pub fn split_batch(count: usize, edible_ratio: f32) -> (usize, usize) {
    let edible = ((count as f32 * edible_ratio).ceil() as usize).min(count);
    (edible, count - edible)
}

/// Draw an exact size uniformly from a category's range
pub fn sample_size(category: SizeCategory, rng: &mut impl Rng) -> f32 {
    let (min, max) = category.range();
    rng.random_range(min..max)
}

/// Pick a spawn position.
///
/// Samples the spawn cube until a point lies farther than `min_distance` from
/// `player`. With no player every sample is accepted.
pub fn sample_position(player: Option<Vec3>, min_distance: f32, rng: &mut impl Rng) -> Vec3 {
    let mut candidate = random_point(rng);
    let Some(player) = player else {
        return candidate;
    };

    for _ in 0..MAX_SPAWN_ATTEMPTS {
        if candidate.distance(player) > min_distance {
            return candidate;
        }
        candidate = random_point(rng);
    }

    // Out of attempts: push the last sample radially just past the minimum
    let away = (candidate - player).normalize_or(Vec3::X);
    player + away * (min_distance + 0.01)
}

fn random_point(rng: &mut impl Rng) -> Vec3 {
    Vec3::new(
        rng.random_range(-SPAWN_HALF_XZ..SPAWN_HALF_XZ),
        rng.random_range(-SPAWN_HALF_Y..SPAWN_HALF_Y),
        rng.random_range(-SPAWN_HALF_XZ..SPAWN_HALF_XZ),
    )
}

/// Spawn `count` fish into the session.
///
/// New fish start in [`EntityPhase::Loading`]; the host promotes them once
/// their model resolves.
pub fn spawn(state: &mut GameState, count: usize) {
    if count == 0 {
        return;
    }

    let initial = state.entities.is_empty();
    let ratio = if initial {
        state.tuning.initial_edible_ratio
    } else {
        state.tuning.edible_ratio
    };
    let (edible, dangerous) = split_batch(count, ratio);
    let player_size = state.player.size;

    let edible_pool = edible_types(player_size);
    let danger_pool = dangerous_types(player_size);
    let smallest = index_of_category(SizeCategory::Small).unwrap_or(0);
    let largest = index_of_category(SizeCategory::ExtraLarge).unwrap_or(CATALOG.len() - 1);

    let mut kinds = Vec::with_capacity(count);
    for _ in 0..edible {
        kinds.push(*edible_pool.choose(&mut state.rng).unwrap_or(&smallest));
    }
    for _ in 0..dangerous {
        kinds.push(*danger_pool.choose(&mut state.rng).unwrap_or(&largest));
    }

    // Minimum distance is fixed per batch, like the edible split
    let min_distance = if initial {
        SPAWN_MIN_DISTANCE_INITIAL
    } else {
        SPAWN_MIN_DISTANCE
    };
    let player_pos = Some(state.player.pos);

    for kind in kinds {
        let entity = create_entity(state, kind, player_pos, min_distance, player_size);
        state.events.push(GameEvent::ModelRequested(ModelKey::Species(kind)));
        state.entities.push(entity);
    }

    log::debug!(
        "Spawned {} fish ({} edible, {} dangerous), population {}",
        count,
        edible,
        dangerous,
        state.entities.len()
    );
}

fn create_entity(
    state: &mut GameState,
    kind: usize,
    player_pos: Option<Vec3>,
    min_distance: f32,
    player_size: f32,
) -> Entity {
    let id = state.next_entity_id();
    let rng = &mut state.rng;
    let fish = &CATALOG[kind];

    let exact_size = sample_size(fish.category, rng);
    let pos = sample_position(player_pos, min_distance, rng);
    let dir = Vec3::new(
        rng.random::<f32>() - 0.5,
        rng.random::<f32>() - 0.5,
        rng.random::<f32>() - 0.5,
    )
    .normalize_or(Vec3::X);
    let speed = fish.speed * rng.random_range(0.7..1.3);
    let heading = rng.random_range(0.0..std::f32::consts::TAU);

    let edible_at_spawn = exact_size < player_size;
    let hue = if edible_at_spawn {
        // Green to blue
        rng.random_range(0.3..0.6)
    } else {
        // Red to yellow
        rng.random_range(0.0..0.15)
    };

    Entity {
        id,
        kind,
        phase: EntityPhase::Loading,
        pos,
        dir,
        speed,
        exact_size,
        orientation: Quat::from_rotation_y(heading)
            * Quat::from_rotation_x(std::f32::consts::FRAC_PI_2),
        hue,
        edible_at_spawn,
        in_contact: false,
    }
}
