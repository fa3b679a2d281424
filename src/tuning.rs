//! Data-driven game balance
//!
//! Empirical constants that shape the feel of a round. Defaults match the
//! shipped game; a JSON override can be supplied by the host.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{seconds_to_frames, storage};

/// Errors raised while loading a tuning override
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("tuning JSON is malformed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("tuning value `{field}` is out of range: {value}")]
    OutOfRange { field: &'static str, value: f32 },
}

/// Balance parameters for a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Collisions are evaluated on every Nth running frame
    pub collision_interval: u32,
    /// Size ratio that must be exceeded to eat (or be eaten)
    pub hysteresis: f32,
    /// Eaten fish bigger than this fraction of the player score double
    pub close_call_ratio: f32,
    /// Immunity window after start (seconds)
    pub invulnerability_secs: f32,
    /// Top-up spawn cadence while running (seconds)
    pub periodic_spawn_secs: f32,
    /// Eating below this population triggers a respawn batch
    pub population_floor: usize,
    /// Fish spawned per top-up (periodic or after eating)
    pub respawn_batch: usize,
    /// Fish spawned when a round starts
    pub initial_batch: usize,
    /// Forward speed multiplier while sprinting
    pub sprint_factor: f32,
    /// Edible share of the first batch
    pub initial_edible_ratio: f32,
    /// Edible share of every later batch
    pub edible_ratio: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            collision_interval: 2,
            hysteresis: 1.1,
            close_call_ratio: 0.8,
            invulnerability_secs: 3.0,
            periodic_spawn_secs: 2.0,
            population_floor: 30,
            respawn_batch: 3,
            initial_batch: 30,
            sprint_factor: 1.3,
            initial_edible_ratio: 0.9,
            edible_ratio: 0.7,
        }
    }
}

impl Tuning {
    const STORAGE_KEY: &'static str = "fish_frenzy_tuning";

    /// Parse and validate a JSON override. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject values that would break the simulation rules
    pub fn validate(&self) -> Result<(), TuningError> {
        if self.collision_interval == 0 {
            return Err(TuningError::OutOfRange {
                field: "collision_interval",
                value: 0.0,
            });
        }
        if self.hysteresis < 1.0 {
            return Err(TuningError::OutOfRange {
                field: "hysteresis",
                value: self.hysteresis,
            });
        }
        for (field, value) in [
            ("initial_edible_ratio", self.initial_edible_ratio),
            ("edible_ratio", self.edible_ratio),
            ("close_call_ratio", self.close_call_ratio),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(TuningError::OutOfRange { field, value });
            }
        }
        if self.invulnerability_secs < 0.0 {
            return Err(TuningError::OutOfRange {
                field: "invulnerability_secs",
                value: self.invulnerability_secs,
            });
        }
        if self.periodic_spawn_secs <= 0.0 {
            return Err(TuningError::OutOfRange {
                field: "periodic_spawn_secs",
                value: self.periodic_spawn_secs,
            });
        }
        if self.sprint_factor < 1.0 {
            return Err(TuningError::OutOfRange {
                field: "sprint_factor",
                value: self.sprint_factor,
            });
        }
        Ok(())
    }

    /// Invulnerability window in frames
    pub fn invulnerability_frames(&self) -> u64 {
        seconds_to_frames(self.invulnerability_secs)
    }

    /// Periodic spawn cadence in frames (never zero)
    pub fn periodic_spawn_frames(&self) -> u64 {
        seconds_to_frames(self.periodic_spawn_secs).max(1)
    }

    /// Tuning override from LocalStorage, validated, else defaults
    pub fn load() -> Self {
        let Some(json) = storage::read(Self::STORAGE_KEY) else {
            return Self::default();
        };
        match Self::from_json(&json) {
            Ok(tuning) => {
                log::info!("Loaded tuning override");
                tuning
            }
            Err(e) => {
                log::warn!("Ignoring tuning override: {}", e);
                Self::default()
            }
        }
    }
}
