//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod catalog;
pub mod collision;
pub mod movement;
pub mod spawn;
pub mod state;
pub mod tick;

pub use catalog::{CATALOG, EntityType, ModelKey, SizeCategory};
pub use collision::{Outcome, classify, resolve};
pub use spawn::spawn;
pub use state::{
    Burst, Entity, EntityPhase, GameEvent, GamePhase, GameState, LoadStatus, ModelStatus, Player,
};
pub use tick::{TickInput, tick};
