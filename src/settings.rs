//! Player preferences
//!
//! Persisted in LocalStorage, separately from the high scores.

use serde::{Deserialize, Serialize};

use crate::storage;

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Particles per eat/death burst
    pub fn burst_particles(&self) -> usize {
        match self {
            QualityPreset::Low => 150,
            QualityPreset::Medium => 600,
            QualityPreset::High => 2000,
        }
    }

    /// Coral clusters scattered over the floor
    pub fn coral_count(&self) -> usize {
        match self {
            QualityPreset::Low => 10,
            QualityPreset::Medium => 20,
            QualityPreset::High => 30,
        }
    }

    /// Exponential fog density
    pub fn fog_density(&self) -> f32 {
        match self {
            QualityPreset::Low => 0.03,
            QualityPreset::Medium | QualityPreset::High => 0.02,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub quality: QualityPreset,

    /// Eat/death particle bursts
    pub particles: bool,

    /// Show FPS counter
    pub show_fps: bool,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Mute when window loses focus
    pub mute_on_blur: bool,

    // === Accessibility ===
    /// Reduced motion (no invulnerability flicker)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            particles: true,
            show_fps: false,
            master_volume: 0.8,
            sfx_volume: 1.0,
            mute_on_blur: true,
            reduced_motion: false,
        }
    }
}

impl Settings {
    pub fn from_preset(preset: QualityPreset) -> Self {
        Self {
            quality: preset,
            ..Self::default()
        }
    }

    /// Particle cap handed to the simulation
    pub fn burst_particle_cap(&self) -> usize {
        if self.particles {
            self.quality.burst_particles()
        } else {
            0
        }
    }

    /// Whether the player should be drawn this frame. The flicker is
    /// suppressed under reduced motion.
    pub fn player_drawn(&self, sim_visible: bool) -> bool {
        sim_visible || self.reduced_motion
    }

    /// Combined effect volume
    pub fn effective_sfx_volume(&self) -> f32 {
        (self.master_volume * self.sfx_volume).clamp(0.0, 1.0)
    }

    const STORAGE_KEY: &'static str = "fish_frenzy_settings";

    /// Stored settings, or defaults when none (or unreadable)
    pub fn load() -> Self {
        storage::load_json(Self::STORAGE_KEY).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_parsing() {
        assert_eq!(QualityPreset::from_str("HIGH"), Some(QualityPreset::High));
        assert_eq!(QualityPreset::from_str("med"), Some(QualityPreset::Medium));
        assert_eq!(QualityPreset::from_str("ultra"), None);
    }

    #[test]
    fn test_particles_off_means_no_bursts() {
        let mut settings = Settings::from_preset(QualityPreset::High);
        assert_eq!(settings.burst_particle_cap(), 2000);
        settings.particles = false;
        assert_eq!(settings.burst_particle_cap(), 0);
    }

    #[test]
    fn test_reduced_motion_hides_flicker() {
        let mut settings = Settings::default();
        assert!(!settings.player_drawn(false));
        settings.reduced_motion = true;
        assert!(settings.player_drawn(false));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"quality":"Low"}"#).unwrap();
        assert_eq!(settings.quality, QualityPreset::Low);
        assert!(settings.particles);
        assert_eq!(settings.master_volume, 0.8);
    }
}
