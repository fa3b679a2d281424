//! Game state and core simulation types
//!
//! Everything a running round needs lives in [`GameState`].

use glam::{Quat, Vec3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::catalog::{ModelKey, entity_type};
use crate::consts::*;
use crate::tuning::Tuning;

/// Lifecycle of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Waiting for the player to press start
    NotStarted,
    /// Active gameplay
    Running,
    /// The player was eaten
    Ended,
}

/// Whether an entity's model has resolved yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityPhase {
    /// Model still loading: invisible, immobile, not collidable
    Loading,
    Active,
}

/// Load status of a model as reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    Pending,
    Ready,
    Failed,
}

/// Anything that can answer "is this model ready yet?"
pub trait ModelStatus {
    fn status(&self, key: ModelKey) -> LoadStatus;
}

impl<F: Fn(ModelKey) -> LoadStatus> ModelStatus for F {
    fn status(&self, key: ModelKey) -> LoadStatus {
        self(key)
    }
}

/// A non-player fish
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: u32,
    /// Index into the catalog
    pub kind: usize,
    pub phase: EntityPhase,
    pub pos: Vec3,
    /// Unit travel direction
    pub dir: Vec3,
    /// Units per frame
    pub speed: f32,
    /// Sampled from the catalog category range at spawn
    pub exact_size: f32,
    pub orientation: Quat,
    /// HSL hue chosen at spawn (edible vs dangerous palette)
    pub hue: f32,
    /// True if the fish was smaller than the player when it spawned
    pub edible_at_spawn: bool,
    /// Overlapping the player as of the last collision pass
    pub in_contact: bool,
}

impl Entity {
    pub fn model(&self) -> ModelKey {
        ModelKey::Species(self.kind)
    }

    pub fn is_active(&self) -> bool {
        self.phase == EntityPhase::Active
    }

    /// Collision radius for the narrow phase
    pub fn collision_radius(&self) -> f32 {
        self.exact_size * COLLISION_RADIUS_FACTOR * entity_type(self.kind).collision_multiplier
    }

    /// Uniform render scale
    pub fn render_scale(&self) -> f32 {
        entity_type(self.kind).scale * self.exact_size
    }
}

/// The player's fish
#[derive(Debug, Clone)]
pub struct Player {
    pub size: f32,
    pub score: u64,
    pub orientation: Quat,
    pub pos: Vec3,
    /// Collisions are ignored before this frame
    pub invulnerable_until: u64,
    /// Flickers while invulnerable
    pub visible: bool,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            size: PLAYER_BASE_SIZE,
            score: 0,
            // Model nose points down local -Y; a quarter turn about X faces it to -Z
            orientation: Quat::from_rotation_x(std::f32::consts::FRAC_PI_2),
            pos: Vec3::ZERO,
            invulnerable_until: 0,
            visible: true,
        }
    }
}

impl Player {
    /// Unit facing direction
    pub fn forward(&self) -> Vec3 {
        (self.orientation * Vec3::NEG_Y).normalize_or(Vec3::NEG_Z)
    }

    pub fn collision_radius(&self) -> f32 {
        self.size * COLLISION_RADIUS_FACTOR * PLAYER_COLLISION_MULTIPLIER
    }

    pub fn render_scale(&self) -> f32 {
        self.size * PLAYER_RENDER_SCALE
    }
}

/// A single burst particle
#[derive(Debug, Clone, Copy)]
pub struct BurstParticle {
    pub pos: Vec3,
    pub vel: Vec3,
}

/// A particle burst (eating/death effect). Visual only.
#[derive(Debug, Clone)]
pub struct Burst {
    pub color: u32,
    pub frame: u32,
    pub particles: Vec<BurstParticle>,
}

/// Frames a burst stays on screen
pub const BURST_FRAMES: u32 = 60;
/// Per-frame downward pull on burst particles
pub const BURST_GRAVITY: f32 = 0.001;
/// Maximum per-axis initial burst particle speed
pub const BURST_SPREAD: f32 = 0.1;
/// Burst particle count before quality caps apply
pub const BURST_PARTICLES: usize = 2000;

pub const BURST_COLOR_EAT: u32 = 0x32cd32;
pub const BURST_COLOR_CLOSE_CALL: u32 = 0x800080;
pub const BURST_COLOR_DEATH: u32 = 0xff6347;

impl Burst {
    pub fn new(origin: Vec3, color: u32, count: usize, rng: &mut Pcg32) -> Self {
        let particles = (0..count)
            .map(|_| BurstParticle {
                pos: origin,
                vel: Vec3::new(
                    rng.random_range(-BURST_SPREAD..BURST_SPREAD),
                    rng.random_range(-BURST_SPREAD..BURST_SPREAD),
                    rng.random_range(-BURST_SPREAD..BURST_SPREAD),
                ),
            })
            .collect();
        Self {
            color,
            frame: 0,
            particles,
        }
    }

    /// Advance one frame. Returns false once the burst has faded out.
    pub fn step(&mut self) -> bool {
        self.frame += 1;
        for p in &mut self.particles {
            p.pos += p.vel;
            p.vel.y -= BURST_GRAVITY;
        }
        self.frame < BURST_FRAMES
    }

    /// Fades linearly from 0.8 to 0 over the burst lifetime
    pub fn opacity(&self) -> f32 {
        0.8 * (1.0 - self.frame as f32 / BURST_FRAMES as f32).max(0.0)
    }
}

/// Things that happened during a tick, drained by the host
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Started,
    /// The player ate a fish
    Ate {
        position: Vec3,
        points: u64,
        close_call: bool,
    },
    /// Near-equal sizes bumped apart
    Bumped,
    /// A larger fish ate the player
    Eaten { position: Vec3 },
    /// The host should make sure this model is loading
    ModelRequested(ModelKey),
    /// A fish was dropped because its model failed to load
    SpawnAbandoned(ModelKey),
}

/// Complete session state
#[derive(Debug, Clone)]
pub struct GameState {
    pub seed: u64,
    pub rng: Pcg32,
    pub tuning: Tuning,
    pub phase: GamePhase,
    /// Frames simulated since start
    pub frame: u64,
    /// Running frames seen by the collision throttle
    pub collision_counter: u64,
    pub player: Player,
    /// Active set, ordered by id
    pub entities: Vec<Entity>,
    /// Cap on particles per burst (quality setting)
    pub burst_particle_cap: usize,
    pub bursts: Vec<Burst>,
    pub events: Vec<GameEvent>,
    next_id: u32,
}

impl GameState {
    /// Create a session waiting for start
    pub fn new(seed: u64) -> Self {
        Self::with_tuning(seed, Tuning::default())
    }

    pub fn with_tuning(seed: u64, tuning: Tuning) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            tuning,
            phase: GamePhase::NotStarted,
            frame: 0,
            collision_counter: 0,
            player: Player::default(),
            entities: Vec::new(),
            burst_particle_cap: BURST_PARTICLES,
            bursts: Vec::new(),
            events: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// `NotStarted -> Running`: reset the player, clear the sea, spawn the first batch
    pub fn start(&mut self) {
        if self.phase != GamePhase::NotStarted {
            log::warn!("start() ignored in phase {:?}", self.phase);
            return;
        }
        self.player = Player::default();
        self.entities.clear();
        self.bursts.clear();
        self.frame = 0;
        self.collision_counter = 0;
        self.player.invulnerable_until = self.tuning.invulnerability_frames();
        self.phase = GamePhase::Running;
        self.events.push(GameEvent::Started);
        self.events.push(GameEvent::ModelRequested(ModelKey::Player));

        let batch = self.tuning.initial_batch;
        super::spawn::spawn(self, batch);
        log::info!("Round started (seed {}, {} fish)", self.seed, batch);
    }

    /// `Running -> Ended`
    pub fn end(&mut self) {
        if self.phase == GamePhase::Running {
            self.phase = GamePhase::Ended;
            self.player.visible = true;
            log::info!(
                "Round ended: score {}, size {:.2}",
                self.player.score,
                self.player.size
            );
        }
    }

    /// `Ended -> NotStarted` with a fresh seed
    pub fn reset(&mut self, seed: u64) {
        let tuning = self.tuning.clone();
        let cap = self.burst_particle_cap;
        *self = Self::with_tuning(seed, tuning);
        self.burst_particle_cap = cap;
    }

    /// True while collisions are suppressed
    pub fn is_invulnerable(&self) -> bool {
        self.frame < self.player.invulnerable_until
    }

    /// Spawn a visual burst
    pub fn add_burst(&mut self, origin: Vec3, color: u32) {
        let count = self.burst_particle_cap.min(BURST_PARTICLES);
        if count == 0 {
            return;
        }
        let burst = Burst::new(origin, color, count, &mut self.rng);
        self.bursts.push(burst);
    }

    /// Promote or drop `Loading` entities according to model status
    pub fn sync_models(&mut self, models: &impl ModelStatus) {
        let mut abandoned = Vec::new();
        self.entities.retain_mut(|e| {
            if e.phase != EntityPhase::Loading {
                return true;
            }
            match models.status(e.model()) {
                LoadStatus::Ready => {
                    e.phase = EntityPhase::Active;
                    true
                }
                LoadStatus::Pending => true,
                LoadStatus::Failed => {
                    abandoned.push(e.model());
                    false
                }
            }
        });
        for key in abandoned {
            log::debug!("Dropped spawn, model failed: {}", key.path());
            self.events.push(GameEvent::SpawnAbandoned(key));
        }
    }

    /// Take queued events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Number of fish that have finished loading
    pub fn active_count(&self) -> usize {
        self.entities.iter().filter(|e| e.is_active()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_resets_and_spawns() {
        let mut state = GameState::new(7);
        assert_eq!(state.phase, GamePhase::NotStarted);
        state.player.size = 5.0;
        state.start();
        assert_eq!(state.phase, GamePhase::Running);
        assert_eq!(state.player.size, PLAYER_BASE_SIZE);
        assert_eq!(state.entities.len(), 30);
        assert!(state.entities.iter().all(|e| e.phase == EntityPhase::Loading));
        assert_eq!(state.player.invulnerable_until, 180);
    }

    #[test]
    fn test_start_only_from_not_started() {
        let mut state = GameState::new(7);
        state.start();
        state.end();
        state.start();
        assert_eq!(state.phase, GamePhase::Ended);
        state.reset(8);
        assert_eq!(state.phase, GamePhase::NotStarted);
        assert!(state.entities.is_empty());
        state.start();
        assert_eq!(state.phase, GamePhase::Running);
    }

    #[test]
    fn test_sync_models_promotes_and_drops() {
        let mut state = GameState::new(3);
        state.start();
        let failed_kind = state.entities[0].kind;
        state.sync_models(&|key: ModelKey| match key {
            ModelKey::Species(k) if k == failed_kind => LoadStatus::Failed,
            _ => LoadStatus::Ready,
        });
        assert!(state.entities.iter().all(|e| e.kind != failed_kind));
        assert!(state.entities.iter().all(|e| e.is_active()));
        assert!(
            state
                .drain_events()
                .contains(&GameEvent::SpawnAbandoned(ModelKey::Species(failed_kind)))
        );
    }

    #[test]
    fn test_pending_models_stay_loading() {
        let mut state = GameState::new(3);
        state.start();
        let count = state.entities.len();
        state.sync_models(&|_: ModelKey| LoadStatus::Pending);
        assert_eq!(state.entities.len(), count);
        assert_eq!(state.active_count(), 0);
    }

    #[test]
    fn test_burst_fades_out() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut burst = Burst::new(Vec3::ZERO, BURST_COLOR_EAT, 10, &mut rng);
        let mut frames = 0;
        while burst.step() {
            frames += 1;
        }
        assert_eq!(frames, BURST_FRAMES - 1);
        assert!(burst.opacity().abs() < 1e-6);
    }

    #[test]
    fn test_same_seed_same_rng_stream() {
        let mut a = GameState::new(31);
        a.start();
        let mut b = a.clone();
        let mut fresh = GameState::new(31);
        fresh.start();
        let draws = |s: &mut GameState| (0..8).map(|_| s.rng.random::<u32>()).collect::<Vec<_>>();
        let expected = draws(&mut a);
        assert_eq!(draws(&mut b), expected);
        assert_eq!(draws(&mut fresh), expected);
    }

    #[test]
    fn test_player_faces_negative_z() {
        let player = Player::default();
        assert!((player.forward() - Vec3::NEG_Z).length() < 1e-5);
    }
}
