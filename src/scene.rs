//! Per-frame draw list
//!
//! Turns the session state into a flat list of mesh instances and particles.
//! The renderer knows nothing about fish; it draws whatever lands here.

use glam::{Mat4, Quat, Vec3, Vec4};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::camera::CameraPose;
use crate::consts::OCEAN_FLOOR_Y;
use crate::settings::Settings;
use crate::sim::{GamePhase, GameState, ModelKey};
use crate::{hex_to_rgb, hsl_to_rgb};

/// Water and fog colour
pub const OCEAN_COLOR: u32 = 0x0077be;
pub const FLOOR_COLOR: u32 = 0x006994;
pub const PLAYER_COLOR: u32 = 0x2cc8de;
/// Side length of the square floor
pub const FLOOR_SIZE: f32 = 100.0;
/// Coral sits just above the floor
pub const CORAL_Y: f32 = -9.8;
pub const CORAL_SPREAD: f32 = 40.0;
/// Drifting specks in the water
pub const SNOW_COUNT: usize = 1000;
pub const SNOW_EXTENT: f32 = 50.0;
/// Yaw added to the snow field each frame
pub const SNOW_SPIN: f32 = 0.0001;
const SNOW_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 0.6];
const SNOW_SIZE: f32 = 0.05;
const BURST_SIZE: f32 = 0.1;

/// Which mesh an instance uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshId {
    Model(ModelKey),
    Floor,
    CoralBase,
    CoralBranch,
}

/// One lit, opaque mesh instance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawInstance {
    pub mesh: MeshId,
    pub transform: Mat4,
    pub color: Vec4,
}

/// One unlit, alpha-blended point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub pos: Vec3,
    pub size: f32,
    pub color: Vec4,
}

/// Everything the renderer needs for one frame
#[derive(Debug, Clone)]
pub struct SceneFrame {
    pub camera: CameraPose,
    pub clear_color: Vec3,
    pub fog_color: Vec3,
    pub fog_density: f32,
    pub instances: Vec<DrawInstance>,
    pub particles: Vec<Particle>,
}

impl SceneFrame {
    pub fn instance_count(&self, mesh: MeshId) -> usize {
        self.instances.iter().filter(|i| i.mesh == mesh).count()
    }
}

/// Static decoration: the floor and coral clusters
#[derive(Debug, Clone)]
pub struct Reef {
    pub pieces: Vec<DrawInstance>,
}

impl Reef {
    /// Scatter `coral_count` clusters. Each is a tapered base with 2-4 cone
    /// branches leaning outward.
    pub fn generate(coral_count: usize, seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut pieces = Vec::with_capacity(1 + coral_count * 5);

        pieces.push(DrawInstance {
            mesh: MeshId::Floor,
            transform: Mat4::from_scale_rotation_translation(
                Vec3::new(FLOOR_SIZE, 1.0, FLOOR_SIZE),
                Quat::IDENTITY,
                Vec3::new(0.0, OCEAN_FLOOR_Y, 0.0),
            ),
            color: hex_to_rgb(FLOOR_COLOR).extend(1.0),
        });

        for _ in 0..coral_count {
            let origin = Vec3::new(
                rng.random_range(-CORAL_SPREAD..CORAL_SPREAD),
                CORAL_Y,
                rng.random_range(-CORAL_SPREAD..CORAL_SPREAD),
            );
            let yaw = rng.random_range(0.0..std::f32::consts::TAU);
            let scale = rng.random_range(1.0..3.0);
            let cluster = Mat4::from_scale_rotation_translation(
                Vec3::splat(scale),
                Quat::from_rotation_y(yaw),
                origin,
            );

            let base_color = hsl_to_rgb(rng.random_range(0.5..0.7), 0.8, 0.5);
            pieces.push(DrawInstance {
                mesh: MeshId::CoralBase,
                transform: cluster * Mat4::from_translation(Vec3::new(0.0, 0.75, 0.0)),
                color: base_color.extend(1.0),
            });

            let branches = rng.random_range(2..5);
            for j in 0..branches {
                let angle = j as f32 / branches as f32 * std::f32::consts::TAU;
                let offset = Vec3::new(angle.cos() * 0.3, 1.5, angle.sin() * 0.3);
                let tilt = Quat::from_euler(
                    glam::EulerRot::XYZ,
                    rng.random_range(-0.25..0.25),
                    0.0,
                    rng.random_range(-0.25..0.25),
                );
                let branch_color = hsl_to_rgb(rng.random_range(0.5..0.7), 0.9, 0.6);
                pieces.push(DrawInstance {
                    mesh: MeshId::CoralBranch,
                    transform: cluster * Mat4::from_rotation_translation(tilt, offset),
                    color: branch_color.extend(1.0),
                });
            }
        }

        Self { pieces }
    }
}

/// Slowly turning cloud of specks
#[derive(Debug, Clone)]
pub struct MarineSnow {
    points: Vec<Vec3>,
    pub angle: f32,
}

impl MarineSnow {
    pub fn generate(count: usize, seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let half = SNOW_EXTENT;
        let points = (0..count)
            .map(|_| {
                Vec3::new(
                    rng.random_range(-half..half),
                    rng.random_range(-half..half),
                    rng.random_range(-half..half),
                )
            })
            .collect();
        Self { points, angle: 0.0 }
    }

    pub fn step(&mut self) {
        self.angle = (self.angle + SNOW_SPIN) % std::f32::consts::TAU;
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    fn particles(&self) -> impl Iterator<Item = Particle> + '_ {
        let spin = Quat::from_rotation_y(self.angle);
        self.points.iter().map(move |p| Particle {
            pos: spin * *p,
            size: SNOW_SIZE,
            color: Vec4::from_array(SNOW_COLOR),
        })
    }
}

/// Tint for a fish: green/blue if it was edible when spawned, red/yellow if not
pub fn entity_color(hue: f32, edible: bool) -> Vec4 {
    let saturation = if edible { 0.7 } else { 0.8 };
    hsl_to_rgb(hue, saturation, 0.5).extend(1.0)
}

/// Collect the draw list for the current frame
pub fn build_frame(
    state: &GameState,
    camera: CameraPose,
    settings: &Settings,
    reef: &Reef,
    snow: &MarineSnow,
) -> SceneFrame {
    let ocean = hex_to_rgb(OCEAN_COLOR);
    let mut instances = Vec::with_capacity(reef.pieces.len() + state.entities.len() + 1);
    instances.extend_from_slice(&reef.pieces);

    let show_player =
        state.phase != GamePhase::NotStarted && settings.player_drawn(state.player.visible);
    if show_player {
        let player = &state.player;
        instances.push(DrawInstance {
            mesh: MeshId::Model(ModelKey::Player),
            transform: Mat4::from_scale_rotation_translation(
                Vec3::splat(player.render_scale()),
                player.orientation,
                player.pos,
            ),
            color: hex_to_rgb(PLAYER_COLOR).extend(1.0),
        });
    }

    for entity in state.entities.iter().filter(|e| e.is_active()) {
        instances.push(DrawInstance {
            mesh: MeshId::Model(entity.model()),
            transform: Mat4::from_scale_rotation_translation(
                Vec3::splat(entity.render_scale()),
                entity.orientation,
                entity.pos,
            ),
            color: entity_color(entity.hue, entity.edible_at_spawn),
        });
    }

    let burst_count: usize = state.bursts.iter().map(|b| b.particles.len()).sum();
    let mut particles = Vec::with_capacity(snow.len() + burst_count);
    particles.extend(snow.particles());
    for burst in &state.bursts {
        let color = hex_to_rgb(burst.color).extend(burst.opacity());
        particles.extend(burst.particles.iter().map(|p| Particle {
            pos: p.pos,
            size: BURST_SIZE,
            color,
        }));
    }

    SceneFrame {
        camera,
        clear_color: ocean,
        fog_color: ocean,
        fog_density: settings.quality.fog_density(),
        instances,
        particles,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::FollowCamera;
    use crate::sim::{LoadStatus, TickInput, tick};

    fn frame_for(state: &GameState, settings: &Settings) -> SceneFrame {
        let camera = FollowCamera::default();
        let pose = camera.pose(state.player.pos, state.player.forward(), state.player.size);
        let reef = Reef::generate(settings.quality.coral_count(), 1);
        let snow = MarineSnow::generate(10, 1);
        build_frame(state, pose, settings, &reef, &snow)
    }

    #[test]
    fn test_reef_layout() {
        let reef = Reef::generate(30, 42);
        let floors = reef.pieces.iter().filter(|p| p.mesh == MeshId::Floor).count();
        let bases = reef
            .pieces
            .iter()
            .filter(|p| p.mesh == MeshId::CoralBase)
            .count();
        let branches = reef
            .pieces
            .iter()
            .filter(|p| p.mesh == MeshId::CoralBranch)
            .count();
        assert_eq!(floors, 1);
        assert_eq!(bases, 30);
        assert!((60..=120).contains(&branches));

        for piece in reef.pieces.iter().filter(|p| p.mesh == MeshId::CoralBase) {
            let pos = piece.transform.w_axis.truncate();
            assert!(pos.x.abs() <= CORAL_SPREAD + 3.0 && pos.z.abs() <= CORAL_SPREAD + 3.0);
            assert!(pos.y > OCEAN_FLOOR_Y);
        }
    }

    #[test]
    fn test_reef_is_seeded() {
        let a = Reef::generate(5, 9);
        let b = Reef::generate(5, 9);
        assert_eq!(a.pieces, b.pieces);
    }

    #[test]
    fn test_loading_fish_are_not_drawn() {
        let mut state = GameState::new(4);
        state.start();
        let settings = Settings::default();
        let frame = frame_for(&state, &settings);
        assert_eq!(frame.instance_count(MeshId::Model(ModelKey::Player)), 1);
        let fish: usize = (0..5)
            .map(|i| frame.instance_count(MeshId::Model(ModelKey::Species(i))))
            .sum();
        assert_eq!(fish, 0);

        state.sync_models(&|_: ModelKey| LoadStatus::Ready);
        let frame = frame_for(&state, &settings);
        let fish: usize = (0..5)
            .map(|i| frame.instance_count(MeshId::Model(ModelKey::Species(i))))
            .sum();
        assert_eq!(fish, 30);
    }

    #[test]
    fn test_flicker_respects_reduced_motion() {
        let mut state = GameState::new(4);
        state.start();
        state.player.visible = false;
        let mut settings = Settings::default();
        let frame = frame_for(&state, &settings);
        assert_eq!(frame.instance_count(MeshId::Model(ModelKey::Player)), 0);

        settings.reduced_motion = true;
        let frame = frame_for(&state, &settings);
        assert_eq!(frame.instance_count(MeshId::Model(ModelKey::Player)), 1);
    }

    #[test]
    fn test_burst_particles_fade() {
        let mut state = GameState::new(4);
        state.start();
        state.burst_particle_cap = 50;
        state.add_burst(Vec3::ZERO, 0x32cd32);
        let frame = frame_for(&state, &Settings::default());
        assert_eq!(frame.particles.len(), 10 + 50);
        let first = frame.particles[10].color.w;

        for _ in 0..30 {
            tick(&mut state, &TickInput::default());
        }
        let frame = frame_for(&state, &Settings::default());
        let later = frame.particles[10].color.w;
        assert!(later < first);
    }

    #[test]
    fn test_entity_palettes() {
        let edible = entity_color(0.45, true);
        let danger = entity_color(0.05, false);
        assert!(edible.y > edible.x);
        assert!(danger.x > danger.z);
    }

    #[test]
    fn test_snow_spins() {
        let mut snow = MarineSnow::generate(3, 2);
        let before: Vec<_> = snow.particles().collect();
        snow.step();
        let after: Vec<_> = snow.particles().collect();
        assert_eq!(snow.len(), 3);
        assert_ne!(before[0].pos, after[0].pos);
    }
}
