//! Fixed timestep simulation tick
//!
//! Core game loop that advances the session by one frame.

use super::collision;
use super::movement;
use super::spawn;
use super::state::{GamePhase, GameState};
use crate::frames_to_seconds;

/// Logical inputs held during a frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    pub turn_left: bool,
    pub turn_right: bool,
    pub pitch_up: bool,
    pub pitch_down: bool,
    pub sprint: bool,
}

/// Advance the game state by one frame
pub fn tick(state: &mut GameState, input: &TickInput) {
    // Effects finish playing after the round ends
    state.bursts.retain_mut(|b| b.step());

    if state.phase != GamePhase::Running {
        return;
    }

    state.frame += 1;
    let time_secs = frames_to_seconds(state.frame);

    movement::steer_player(&mut state.player, input);
    movement::advance_player(&mut state.player, input.sprint, state.tuning.sprint_factor);
    movement::advance_entities(&mut state.entities, time_secs);

    collision::resolve(state);
    if state.phase != GamePhase::Running {
        return;
    }

    // Keep the population topped up regardless of what got eaten
    if state.frame % state.tuning.periodic_spawn_frames() == 0 {
        let batch = state.tuning.respawn_batch;
        spawn::spawn(state, batch);
    }
}
