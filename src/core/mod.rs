//! Core engine types: ids, card kinds, errors, RNG, configuration.
//!
//! Everything here is a leaf: no module in `core` depends on the board,
//! the registries or the command layer.

pub mod ids;
pub mod kind;
pub mod error;
pub mod rng;
pub mod config;

pub use ids::{CardId, IdAllocator, StackId};
pub use kind::{CardKind, DefId};
pub use error::{BoardError, ErrorClass, Result};
pub use rng::{deck_draw_seed, BoardRng, RngSource, Weighted, WeightedPool};
pub use config::{
    BoardConfig, ChargeMode, DeckCard, DeckConfig, DeckEntry, DrawConfig, EconomyRules, FoodDef,
    KindPair, LayoutHints, LootDrop, ModifierRule, PerkDef, PerkEffects, Point, ProgressionRules,
    ResourceDef, StackingRules, StaminaReset, TaskRules, WorldRules, XpRewards, ZombieDef,
    ZombieSpawnRule,
};
