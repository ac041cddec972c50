//! Cell taxonomy, recipe table and generation parameters.
//!
//! The numeric `CellKind` codes are written into every dataset line and are
//! read back by downstream environments, so they are a fixed contract: new
//! kinds may only ever be appended before `Empty` with a version bump of the
//! dataset format.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// -- Cell taxonomy -------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum CellKind {
    Agent = 0,
    Wall = 1,
    Workshop1 = 2,
    Workshop2 = 3,
    Workshop3 = 4,
    Furnace = 5,
    Water = 6,
    Stone = 7,
    Iron = 8,
    Tin = 9,
    Copper = 10,
    Wood = 11,
    Grass = 12,
    Gold = 13,
    Gem = 14,
    BronzeBar = 15,
    Stick = 16,
    Plank = 17,
    Rope = 18,
    Nails = 19,
    BronzeHammer = 20,
    BronzePick = 21,
    Bridge = 22,
    IronPick = 23,
    GoldBar = 24,
    GemRing = 25,
    Empty = 26,
}

impl CellKind {
    pub const ALL: [CellKind; 27] = [
        CellKind::Agent,
        CellKind::Wall,
        CellKind::Workshop1,
        CellKind::Workshop2,
        CellKind::Workshop3,
        CellKind::Furnace,
        CellKind::Water,
        CellKind::Stone,
        CellKind::Iron,
        CellKind::Tin,
        CellKind::Copper,
        CellKind::Wood,
        CellKind::Grass,
        CellKind::Gold,
        CellKind::Gem,
        CellKind::BronzeBar,
        CellKind::Stick,
        CellKind::Plank,
        CellKind::Rope,
        CellKind::Nails,
        CellKind::BronzeHammer,
        CellKind::BronzePick,
        CellKind::Bridge,
        CellKind::IronPick,
        CellKind::GoldBar,
        CellKind::GemRing,
        CellKind::Empty,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<CellKind> {
        Self::ALL.get(code as usize).copied()
    }

    pub fn is_workshop(self) -> bool {
        WORKSHOPS.contains(&self)
    }

    pub fn name(self) -> &'static str {
        match self {
            CellKind::Agent => "Agent",
            CellKind::Wall => "Wall",
            CellKind::Workshop1 => "Workshop1",
            CellKind::Workshop2 => "Workshop2",
            CellKind::Workshop3 => "Workshop3",
            CellKind::Furnace => "Furnace",
            CellKind::Water => "Water",
            CellKind::Stone => "Stone",
            CellKind::Iron => "Iron",
            CellKind::Tin => "Tin",
            CellKind::Copper => "Copper",
            CellKind::Wood => "Wood",
            CellKind::Grass => "Grass",
            CellKind::Gold => "Gold",
            CellKind::Gem => "Gem",
            CellKind::BronzeBar => "BronzeBar",
            CellKind::Stick => "Stick",
            CellKind::Plank => "Plank",
            CellKind::Rope => "Rope",
            CellKind::Nails => "Nails",
            CellKind::BronzeHammer => "BronzeHammer",
            CellKind::BronzePick => "BronzePick",
            CellKind::Bridge => "Bridge",
            CellKind::IronPick => "IronPick",
            CellKind::GoldBar => "GoldBar",
            CellKind::GemRing => "GemRing",
            CellKind::Empty => "Empty",
        }
    }

    /// Map symbol for the ASCII preview. Crafted items never appear on a
    /// generated map and fall back to `?`.
    pub fn symbol(self) -> char {
        match self {
            CellKind::Agent => '@',
            CellKind::Wall => '#',
            CellKind::Workshop1 => '1',
            CellKind::Workshop2 => '2',
            CellKind::Workshop3 => '3',
            CellKind::Furnace => 'F',
            CellKind::Water => '~',
            CellKind::Stone => 'o',
            CellKind::Iron => 'i',
            CellKind::Tin => 'T',
            CellKind::Copper => 'c',
            CellKind::Wood => 'w',
            CellKind::Grass => 'g',
            CellKind::Gold => '.',
            CellKind::Gem => '*',
            CellKind::Empty => ' ',
            _ => '?',
        }
    }
}

impl std::fmt::Display for CellKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Crafting stations, in placement order.
pub const WORKSHOPS: [CellKind; 4] = [
    CellKind::Workshop1,
    CellKind::Workshop2,
    CellKind::Workshop3,
    CellKind::Furnace,
];

/// Kinds drawn for distractor resources.
pub const PRIMITIVES: [CellKind; 2] = [CellKind::Grass, CellKind::Wood];

// -- Recipes -------------------------------------------------------

/// Goal items with a recipe, in the order goal weights refer to them.
pub const GOALS: [CellKind; 3] = [
    CellKind::BronzePick,
    CellKind::IronPick,
    CellKind::GemRing,
];

const BRONZE_PICK_RECIPE: [(CellKind, u32); 3] = [
    (CellKind::Copper, 1),
    (CellKind::Tin, 1),
    (CellKind::Wood, 1),
];

const IRON_PICK_RECIPE: [(CellKind, u32); 4] = [
    (CellKind::Iron, 1),
    (CellKind::Wood, 2),
    (CellKind::Copper, 1),
    (CellKind::Tin, 1),
];

const GEM_RING_RECIPE: [(CellKind, u32); 4] = [
    (CellKind::Iron, 1),
    (CellKind::Wood, 2),
    (CellKind::Copper, 1),
    (CellKind::Tin, 1),
];

/// Ingredients that must be on the map for `goal`, or `None` when the item
/// is not a goal.
pub fn recipe(goal: CellKind) -> Option<&'static [(CellKind, u32)]> {
    match goal {
        CellKind::BronzePick => Some(&BRONZE_PICK_RECIPE),
        CellKind::IronPick => Some(&IRON_PICK_RECIPE),
        CellKind::GemRing => Some(&GEM_RING_RECIPE),
        _ => None,
    }
}

/// Remote resource a goal needs, walled in on all four sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Treasure {
    pub item: CellKind,
    pub guard: CellKind,
}

pub fn treasure(goal: CellKind) -> Option<Treasure> {
    match goal {
        // Island
        CellKind::GoldBar => Some(Treasure {
            item: CellKind::Gold,
            guard: CellKind::Water,
        }),
        // Cave
        CellKind::GemRing => Some(Treasure {
            item: CellKind::Gem,
            guard: CellKind::Stone,
        }),
        _ => None,
    }
}

// -- Goal distributions --------------------------------------------

/// Categorical weights over [`GOALS`]. Weights need not sum to one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GoalWeights(pub [f64; 3]);

impl GoalWeights {
    pub fn validate(&self) -> Result<()> {
        if self.0.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(Error::Config(format!(
                "goal weights must be finite and non-negative, got {:?}",
                self.0
            )));
        }
        if self.0.iter().sum::<f64>() <= 0.0 {
            return Err(Error::Config(format!(
                "goal weights have no mass, got {:?}",
                self.0
            )));
        }
        Ok(())
    }
}

fn default_train() -> GoalWeights {
    GoalWeights([0.2, 0.3, 0.5])
}
fn default_test() -> GoalWeights {
    GoalWeights([0.0, 0.0, 1.0])
}
fn default_train_hard() -> GoalWeights {
    GoalWeights([0.3, 0.7, 0.0])
}
fn default_test_hard() -> GoalWeights {
    GoalWeights([0.0, 1.0, 0.0])
}

/// Train/test goal distributions for both modes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalDistributions {
    #[serde(default = "default_train")]
    pub train: GoalWeights,
    #[serde(default = "default_test")]
    pub test: GoalWeights,
    #[serde(default = "default_train_hard")]
    pub train_hard: GoalWeights,
    #[serde(default = "default_test_hard")]
    pub test_hard: GoalWeights,
}

impl Default for GoalDistributions {
    fn default() -> Self {
        Self {
            train: default_train(),
            test: default_test(),
            train_hard: default_train_hard(),
            test_hard: default_test_hard(),
        }
    }
}

impl GoalDistributions {
    /// `(train, test)` pair for the given mode.
    pub fn for_mode(&self, hard: bool) -> (GoalWeights, GoalWeights) {
        if hard {
            (self.train_hard, self.test_hard)
        } else {
            (self.train, self.test)
        }
    }
}

// -- Engine I/O ----------------------------------------------------

/// Smallest grid with at least one interior cell.
pub const MIN_MAP_SIZE: usize = 3;

/// Everything a single scenario build needs besides its seed and goal
/// weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioParams {
    pub map_size: usize,
    #[serde(default)]
    pub hard: bool,
    #[serde(default)]
    pub num_primitive: u32,
    #[serde(default)]
    pub num_grass: u32,
}

impl ScenarioParams {
    pub fn validate(&self) -> Result<()> {
        if self.map_size < MIN_MAP_SIZE {
            return Err(Error::Config(format!(
                "map size {} is below the minimum of {}",
                self.map_size, MIN_MAP_SIZE
            )));
        }
        if self.map_size.checked_mul(self.map_size).is_none() {
            return Err(Error::Config(format!(
                "map size {} overflows the cell count",
                self.map_size
            )));
        }
        Ok(())
    }
}

fn default_num_train() -> u64 {
    10_000
}
fn default_num_test() -> u64 {
    1_000
}
fn default_map_size() -> usize {
    10
}
fn default_workers() -> usize {
    32
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchParams {
    #[serde(default = "default_num_train")]
    pub num_train: u64,
    #[serde(default = "default_num_test")]
    pub num_test: u64,
    #[serde(default = "default_map_size")]
    pub map_size: usize,
    #[serde(default)]
    pub hard: bool,
    #[serde(default)]
    pub num_primitive: u32,
    #[serde(default)]
    pub num_grass: u32,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default)]
    pub distributions: GoalDistributions,
}

impl Default for BatchParams {
    fn default() -> Self {
        Self {
            num_train: default_num_train(),
            num_test: default_num_test(),
            map_size: default_map_size(),
            hard: false,
            num_primitive: 0,
            num_grass: 0,
            workers: default_workers(),
            distributions: GoalDistributions::default(),
        }
    }
}

impl BatchParams {
    pub fn scenario_params(&self) -> ScenarioParams {
        ScenarioParams {
            map_size: self.map_size,
            hard: self.hard,
            num_primitive: self.num_primitive,
            num_grass: self.num_grass,
        }
    }

    /// Train seeds `[0, num_train)`.
    pub fn train_seeds(&self) -> std::ops::Range<u64> {
        0..self.num_train
    }

    /// Test seeds follow the train seeds. Saturates at `u64::MAX`;
    /// `validate` rejects counts that would need it.
    pub fn test_seeds(&self) -> std::ops::Range<u64> {
        self.num_train..self.num_train.saturating_add(self.num_test)
    }

    pub fn validate(&self) -> Result<()> {
        self.scenario_params().validate()?;
        if self.workers == 0 {
            return Err(Error::Config("worker count must be at least 1".into()));
        }
        if self.num_train.checked_add(self.num_test).is_none() {
            return Err(Error::Config(format!(
                "{} train + {} test scenarios overflow the seed range",
                self.num_train, self.num_test
            )));
        }
        let (train, test) = self.distributions.for_mode(self.hard);
        train.validate()?;
        test.validate()?;
        Ok(())
    }
}

// -- Tests ---------------------------------------------------------
