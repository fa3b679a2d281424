//! Static creature catalog
//!
//! Every non-player fish is instantiated from one of these templates.

/// Coarse size class of a creature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizeCategory {
    Small,
    MediumSmall,
    Medium,
    Large,
    ExtraLarge,
}

impl SizeCategory {
    /// Range exact sizes are drawn from (min inclusive, max exclusive)
    pub fn range(&self) -> (f32, f32) {
        match self {
            SizeCategory::Small => (0.5, 0.8),
            SizeCategory::MediumSmall => (1.0, 1.3),
            SizeCategory::Medium => (1.5, 1.8),
            SizeCategory::Large => (2.0, 2.5),
            SizeCategory::ExtraLarge => (2.8, 3.8),
        }
    }

    /// True if `size` lies within the declared range
    pub fn contains(&self, size: f32) -> bool {
        let (min, max) = self.range();
        size >= min && size < max
    }

    /// Upper representative size, used when choosing edible fish
    pub fn edible_reference(&self) -> f32 {
        match self {
            SizeCategory::Small => 1.0,
            SizeCategory::MediumSmall => 1.5,
            SizeCategory::Medium => 2.0,
            SizeCategory::Large => 2.8,
            SizeCategory::ExtraLarge => 4.0,
        }
    }

    /// Lower representative size, used when choosing dangerous fish
    pub fn danger_reference(&self) -> f32 {
        match self {
            SizeCategory::Small => 0.5,
            SizeCategory::MediumSmall => 1.0,
            SizeCategory::Medium => 1.5,
            SizeCategory::Large => 2.0,
            SizeCategory::ExtraLarge => 2.8,
        }
    }
}

/// Which model a draw call needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKey {
    Player,
    Species(usize),
}

impl ModelKey {
    /// Path the host fetches the model from
    pub fn path(&self) -> &'static str {
        match *self {
            ModelKey::Player => PLAYER_MODEL_PATH,
            ModelKey::Species(index) => CATALOG
                .get(index)
                .map(|t| t.model_path)
                .unwrap_or(PLAYER_MODEL_PATH),
        }
    }
}

/// Immutable template for a creature
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityType {
    pub name: &'static str,
    pub model_path: &'static str,
    /// Render scale per unit of exact size
    pub scale: f32,
    /// Base speed (units per frame)
    pub speed: f32,
    pub category: SizeCategory,
    /// Collision radius multiplier
    pub collision_multiplier: f32,
}

pub const PLAYER_MODEL_PATH: &str = "/gameModels/13007_Blue-Green_Reef_Chromis_v2_l3.obj";

pub static CATALOG: [EntityType; 5] = [
    EntityType {
        name: "Squid",
        model_path: "/gameModels/11097_squid_v1.obj",
        scale: 0.02,
        speed: 0.05,
        category: SizeCategory::MediumSmall,
        collision_multiplier: 0.8,
    },
    EntityType {
        name: "Black Moor Goldfish",
        model_path: "/gameModels/12990_Black_Moor_Goldfish_v1_l2.obj",
        scale: 0.015,
        speed: 0.025,
        category: SizeCategory::Small,
        collision_multiplier: 0.9,
    },
    EntityType {
        name: "Hammerhead Shark",
        model_path: "/gameModels/19412_Hammerhead_Shark_v2.obj",
        scale: 0.04,
        speed: 0.035,
        category: SizeCategory::Large,
        collision_multiplier: 1.2,
    },
    EntityType {
        name: "Rainbow Trout",
        model_path: "/gameModels/21859_Rainbow_Trout_v1.obj",
        scale: 0.025,
        speed: 0.01,
        category: SizeCategory::Medium,
        collision_multiplier: 1.0,
    },
    EntityType {
        name: "Goblin Shark",
        model_path: "/gameModels/21861_Goblin_Shark_v1.obj",
        scale: 0.05,
        speed: 0.02,
        category: SizeCategory::ExtraLarge,
        collision_multiplier: 1.3,
    },
];

/// Look up a catalog entry by index
#[inline]
pub fn entity_type(index: usize) -> &'static EntityType {
    &CATALOG[index.min(CATALOG.len() - 1)]
}

/// Index of the first catalog entry in a category
pub fn index_of_category(category: SizeCategory) -> Option<usize> {
    CATALOG.iter().position(|t| t.category == category)
}
