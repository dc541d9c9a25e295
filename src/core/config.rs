//! Board configuration snapshot.
//!
//! A read-only view of everything the board engine looks up at command time:
//! stacking rules, modifier charge rules, deck pools, resource/food/zombie
//! definitions, day-tick rules, economy and progression numbers, and layout
//! hints. Every section defaults, so a partial document is a valid config.
//!
//! ```
//! use cardboard::core::BoardConfig;
//!
//! let config = BoardConfig::from_json_str(r#"{
//!     "decks": {
//!         "starter": {
//!             "draws": { "count": 3 },
//!             "pool": [ { "type": "blank", "weight": 1 } ]
//!         }
//!     }
//! }"#).unwrap();
//!
//! assert_eq!(config.deck("starter").unwrap().draws.count, 3);
//! assert_eq!(config.economy.max_stamina, 5);
//! ```

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::error::{BoardError, Result};
use super::kind::{CardKind, DefId};

/// A 2D point on the board.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Unordered pair of card kinds used by the stacking allow/deny lists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindPair(pub CardKind, pub CardKind);

impl KindPair {
    /// True if `{a, b}` equals this pair, in either order.
    #[must_use]
    pub fn matches(&self, a: CardKind, b: CardKind) -> bool {
        (self.0 == a && self.1 == b) || (self.0 == b && self.1 == a)
    }
}

/// Rules checked before a merge commits.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackingRules {
    /// Maximum modifier cards on one task stack. `None` for unlimited.
    pub max_modifiers_per_task: Option<usize>,
    /// Modifier definition ids that may appear more than once on a stack.
    pub allow_duplicate_types: Vec<DefId>,
    /// Modifier definition ids that may exist only once on the whole board.
    pub unique_modifiers: Vec<DefId>,
    /// Kind pairs that may never be merged.
    pub disallowed_pairs: Vec<KindPair>,
    /// If non-empty, merges need at least one kind pair from this list.
    pub allowed_pairs: Vec<KindPair>,
}

/// How a modifier's charges behave.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeMode {
    #[default]
    Infinite,
    Finite,
}

/// Trigger name for single-use-on-completion modifiers.
pub const CONSUME_ON_TASK_COMPLETE: &str = "task_complete";

/// Modifier treated as single-use when it has no configured rule.
pub const NEXT_ACTION_MODIFIER: &str = "mod.next_action";

/// Charge and consumption rule for one modifier definition.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModifierRule {
    pub charge_mode: ChargeMode,
    pub max_charges: u32,
    pub consume_on: Vec<String>,
    /// Loot produced when the modifier is salvaged.
    pub salvage: Vec<LootDrop>,
}

impl ModifierRule {
    /// A finite, one-charge rule consumed on task completion.
    #[must_use]
    pub fn single_use() -> Self {
        Self {
            charge_mode: ChargeMode::Finite,
            max_charges: 1,
            consume_on: vec![CONSUME_ON_TASK_COMPLETE.to_string()],
            salvage: Vec::new(),
        }
    }

    /// Rule for a modifier absent from configuration: only `next_action`
    /// is single-use.
    #[must_use]
    pub fn fallback(def_id: &DefId) -> Self {
        if def_id.as_str() == NEXT_ACTION_MODIFIER {
            Self::single_use()
        } else {
            Self::default()
        }
    }

    /// True if completing a task consumes this modifier.
    #[must_use]
    pub fn is_single_use_on_completion(&self) -> bool {
        self.charge_mode == ChargeMode::Finite
            && self.max_charges == 1
            && self.consume_on.iter().any(|t| t == CONSUME_ON_TASK_COMPLETE)
    }
}

fn one() -> i64 {
    1
}

/// A weighted loot outcome.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LootDrop {
    pub loot: String,
    #[serde(default = "one")]
    pub amount: i64,
    #[serde(default = "one")]
    pub weight: i64,
}

impl LootDrop {
    pub fn new(loot: impl Into<String>, amount: i64, weight: i64) -> Self {
        Self {
            loot: loot.into(),
            amount,
            weight,
        }
    }
}

/// What a deck pool entry turns into.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeckCard {
    Blank,
    Villager { villager_id: String },
    Modifier { modifier_id: String },
    Loot { loot_id: String },
    Resource { resource_id: String },
    Food { food_id: String },
}

impl DeckCard {
    /// Concrete card definition id for this entry.
    #[must_use]
    pub fn def_id(&self) -> DefId {
        match self {
            DeckCard::Blank => DefId::of(CardKind::Task, "blank"),
            DeckCard::Villager { villager_id } => DefId::of(CardKind::Villager, villager_id),
            DeckCard::Modifier { modifier_id } => DefId::of(CardKind::Modifier, modifier_id),
            DeckCard::Loot { loot_id } => DefId::of(CardKind::Loot, loot_id),
            DeckCard::Resource { resource_id } => DefId::of(CardKind::Resource, resource_id),
            DeckCard::Food { food_id } => DefId::of(CardKind::Food, food_id),
        }
    }
}

/// One weighted entry of a deck pool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckEntry {
    #[serde(flatten)]
    pub card: DeckCard,
    #[serde(default = "one")]
    pub weight: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawConfig {
    pub count: i64,
}

/// A deck pack definition.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckConfig {
    /// Coin cost to spawn a pack of this deck.
    pub cost: i64,
    pub draws: DrawConfig,
    pub pool: Vec<DeckEntry>,
    /// Spawn circle radius override.
    pub radius: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceDef {
    /// Gather cycles before the resource is depleted.
    pub charges: i64,
    /// Stamina per gather. Falls back to `economy.gather_cost`.
    pub stamina_cost: Option<i64>,
    /// Loot id produced by each gather.
    pub product: String,
    pub product_amount: i64,
    /// Probability of an extra drop from `bonus`.
    pub bonus_chance: f64,
    pub bonus: Vec<LootDrop>,
}

impl Default for ResourceDef {
    fn default() -> Self {
        Self {
            charges: 3,
            stamina_cost: None,
            product: String::new(),
            product_amount: 1,
            bonus_chance: 0.0,
            bonus: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoodDef {
    /// Stamina restored per serving.
    pub stamina: i64,
    /// Servings in a fresh food card.
    pub servings: i64,
}

impl Default for FoodDef {
    fn default() -> Self {
        Self {
            stamina: 1,
            servings: 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZombieDef {
    /// Base stamina cost to clear.
    pub clear_cost: i64,
    /// Floor after perk discounts.
    pub min_cost: i64,
    pub rewards: Vec<LootDrop>,
}

impl Default for ZombieDef {
    fn default() -> Self {
        Self {
            clear_cost: 2,
            min_cost: 1,
            rewards: Vec::new(),
        }
    }
}

/// Stamina behavior at the end of a day.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaminaReset {
    None,
    #[default]
    Full,
    /// Restore half of max, capped at max.
    Partial,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZombieSpawnRule {
    pub definition: DefId,
    /// Rule-specific daily cap.
    pub cap: Option<u32>,
    /// Per-task probability gate.
    pub spawn_chance: Option<f64>,
}

impl Default for ZombieSpawnRule {
    fn default() -> Self {
        Self {
            definition: DefId::of(CardKind::Zombie, "default_zombie"),
            cap: None,
            spawn_chance: None,
        }
    }
}

/// End-of-day tick rules.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldRules {
    pub zombie_grace_hours: i64,
    pub zombies_per_task: u32,
    pub daily_zombie_cap: u32,
    pub zombie_rule: ZombieSpawnRule,
    pub zombie_origin: Point,
    pub zombie_spacing: f64,
    pub stamina_reset: StaminaReset,
}

impl Default for WorldRules {
    fn default() -> Self {
        Self {
            zombie_grace_hours: 0,
            zombies_per_task: 1,
            daily_zombie_cap: 10,
            zombie_rule: ZombieSpawnRule::default(),
            zombie_origin: Point::new(0.0, 600.0),
            zombie_spacing: 120.0,
            stamina_reset: StaminaReset::Full,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyRules {
    /// Coin charged when an existing task is spawned onto the board.
    pub task_spawn_cost: i64,
    /// Loot kind used as coin.
    pub coin: String,
    pub max_stamina: i64,
    pub gather_cost: i64,
}

impl Default for EconomyRules {
    fn default() -> Self {
        Self {
            task_spawn_cost: 1,
            coin: "coin".to_string(),
            max_stamina: 5,
            gather_cost: 1,
        }
    }
}

/// Numeric effects a perk layers onto stamina and reward math.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerkEffects {
    pub max_stamina_bonus: i64,
    pub zombie_clear_discount: i64,
    pub gather_discount: i64,
}

impl std::ops::Add for PerkEffects {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            max_stamina_bonus: self.max_stamina_bonus + rhs.max_stamina_bonus,
            zombie_clear_discount: self.zombie_clear_discount + rhs.zombie_clear_discount,
            gather_discount: self.gather_discount + rhs.gather_discount,
        }
    }
}

impl PerkEffects {
    /// Sum of the effects of `perks`, looked up in `pool`. Unknown ids add nothing.
    #[must_use]
    pub fn total(perks: &[String], pool: &[PerkDef]) -> Self {
        perks
            .iter()
            .filter_map(|id| pool.iter().find(|p| &p.id == id))
            .fold(Self::default(), |acc, p| acc + p.effects)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerkDef {
    pub id: String,
    #[serde(default = "one")]
    pub weight: i64,
    #[serde(default)]
    pub effects: PerkEffects,
}

/// XP granted per action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct XpRewards {
    pub gather: i64,
    pub task_complete: i64,
    pub zombie_clear: i64,
    /// Extra task-completion XP by task priority name.
    pub priority_bonus: FxHashMap<String, i64>,
}

impl Default for XpRewards {
    fn default() -> Self {
        Self {
            gather: 1,
            task_complete: 5,
            zombie_clear: 3,
            priority_bonus: FxHashMap::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionRules {
    /// Level -> total XP needed to reach it.
    pub thresholds: BTreeMap<u32, i64>,
    pub max_level: u32,
    pub perk_pool: Vec<PerkDef>,
    pub choices_per_level: usize,
    pub xp: XpRewards,
}

impl Default for ProgressionRules {
    fn default() -> Self {
        Self {
            thresholds: BTreeMap::from([(2, 10), (3, 25), (4, 50), (5, 100)]),
            max_level: 5,
            perk_pool: Vec::new(),
            choices_per_level: 1,
            xp: XpRewards::default(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskRules {
    /// Reject completion of stacks without a villager.
    pub require_villager_to_complete: bool,
}

/// Cosmetic spawn-layout hints.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutHints {
    pub respawn_offset: f64,
    pub pack_radius: f64,
    pub product_offset: f64,
    pub seed_origin: Point,
    pub seed_spacing: f64,
    pub default_seed: Vec<DefId>,
}

impl Default for LayoutHints {
    fn default() -> Self {
        Self {
            respawn_offset: 24.0,
            pack_radius: 140.0,
            product_offset: 40.0,
            seed_origin: Point::new(0.0, 0.0),
            seed_spacing: 160.0,
            default_seed: vec![
                DefId::of(CardKind::Villager, "basic"),
                DefId::of(CardKind::Deck, "starter"),
            ],
        }
    }
}

/// Complete board configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub stacking: StackingRules,
    /// Keyed by modifier definition id (`"mod.deadline_pin"`).
    pub modifiers: FxHashMap<String, ModifierRule>,
    pub decks: FxHashMap<String, DeckConfig>,
    pub resources: FxHashMap<String, ResourceDef>,
    pub foods: FxHashMap<String, FoodDef>,
    pub zombies: FxHashMap<String, ZombieDef>,
    pub world: WorldRules,
    pub economy: EconomyRules,
    pub progression: ProgressionRules,
    pub tasks: TaskRules,
    pub layout: LayoutHints,
    /// Seed deck draws from `(deck, pack stack, Z)` instead of the clock.
    pub deterministic_deck_draws: bool,
}

impl BoardConfig {
    /// Create a configuration with all defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| BoardError::config(e.to_string()))
    }

    #[must_use]
    pub fn with_deck(mut self, id: impl Into<String>, deck: DeckConfig) -> Self {
        self.decks.insert(id.into(), deck);
        self
    }

    #[must_use]
    pub fn with_resource(mut self, id: impl Into<String>, resource: ResourceDef) -> Self {
        self.resources.insert(id.into(), resource);
        self
    }

    #[must_use]
    pub fn with_food(mut self, id: impl Into<String>, food: FoodDef) -> Self {
        self.foods.insert(id.into(), food);
        self
    }

    #[must_use]
    pub fn with_zombie(mut self, id: impl Into<String>, zombie: ZombieDef) -> Self {
        self.zombies.insert(id.into(), zombie);
        self
    }

    #[must_use]
    pub fn with_modifier(mut self, def_id: impl Into<String>, rule: ModifierRule) -> Self {
        self.modifiers.insert(def_id.into(), rule);
        self
    }

    #[must_use]
    pub fn with_deterministic_draws(mut self) -> Self {
        self.deterministic_deck_draws = true;
        self
    }

    /// Get a deck by id.
    pub fn deck(&self, id: &str) -> Result<&DeckConfig> {
        self.decks
            .get(id)
            .ok_or_else(|| BoardError::config(format!("unknown deck '{id}'")))
    }

    pub fn resource(&self, id: &str) -> Result<&ResourceDef> {
        self.resources
            .get(id)
            .ok_or_else(|| BoardError::config(format!("unknown resource '{id}'")))
    }

    pub fn food(&self, id: &str) -> Result<&FoodDef> {
        self.foods
            .get(id)
            .ok_or_else(|| BoardError::config(format!("unknown food '{id}'")))
    }

    pub fn zombie(&self, id: &str) -> Result<&ZombieDef> {
        self.zombies
            .get(id)
            .ok_or_else(|| BoardError::config(format!("unknown zombie '{id}'")))
    }

    /// Charge rule for a modifier, falling back to the built-in default.
    #[must_use]
    pub fn modifier_rule(&self, def_id: &DefId) -> ModifierRule {
        self.modifiers
            .get(def_id.as_str())
            .cloned()
            .unwrap_or_else(|| ModifierRule::fallback(def_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BoardConfig::new();
        assert_eq!(config.economy.max_stamina, 5);
        assert_eq!(config.world.stamina_reset, StaminaReset::Full);
        assert!(!config.deterministic_deck_draws);
        assert!(!config.tasks.require_villager_to_complete);
    }

    #[test]
    fn test_parse_deck_pool() {
        let config = BoardConfig::from_json_str(
            r#"{
                "decks": {
                    "starter": {
                        "cost": 2,
                        "draws": { "count": 4 },
                        "pool": [
                            { "type": "blank", "weight": 3 },
                            { "type": "villager", "villager_id": "basic" },
                            { "type": "modifier", "modifier_id": "deadline_pin", "weight": 2 }
                        ]
                    }
                }
            }"#,
        )
        .unwrap();

        let deck = config.deck("starter").unwrap();
        assert_eq!(deck.cost, 2);
        assert_eq!(deck.pool.len(), 3);
        assert_eq!(deck.pool[1].weight, 1);
        assert_eq!(deck.pool[0].card.def_id().as_str(), "task.blank");
        assert_eq!(deck.pool[2].card.def_id().as_str(), "mod.deadline_pin");
    }

    #[test]
    fn test_deck_entry_requires_sub_id() {
        let err = BoardConfig::from_json_str(
            r#"{ "decks": { "d": { "pool": [ { "type": "loot" } ] } } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, BoardError::Config(_)));
    }

    #[test]
    fn test_unknown_lookups_are_config_errors() {
        let config = BoardConfig::new();
        assert!(matches!(config.deck("x"), Err(BoardError::Config(_))));
        assert!(matches!(config.resource("x"), Err(BoardError::Config(_))));
        assert!(matches!(config.food("x"), Err(BoardError::Config(_))));
        assert!(matches!(config.zombie("x"), Err(BoardError::Config(_))));
    }

    #[test]
    fn test_modifier_fallback() {
        let config = BoardConfig::new()
            .with_modifier("mod.focus", ModifierRule::single_use());

        assert!(config.modifier_rule(&"mod.focus".into()).is_single_use_on_completion());
        assert!(config.modifier_rule(&"mod.next_action".into()).is_single_use_on_completion());
        assert!(!config.modifier_rule(&"mod.deadline_pin".into()).is_single_use_on_completion());
    }

    #[test]
    fn test_kind_pair_is_unordered() {
        let pair = KindPair(CardKind::Zombie, CardKind::Food);
        assert!(pair.matches(CardKind::Food, CardKind::Zombie));
        assert!(pair.matches(CardKind::Zombie, CardKind::Food));
        assert!(!pair.matches(CardKind::Zombie, CardKind::Zombie));
    }

    #[test]
    fn test_perk_effects_add() {
        let a = PerkEffects { max_stamina_bonus: 1, ..Default::default() };
        let b = PerkEffects { zombie_clear_discount: 2, max_stamina_bonus: 1, ..Default::default() };
        let sum = a + b;
        assert_eq!(sum.max_stamina_bonus, 2);
        assert_eq!(sum.zombie_clear_discount, 2);
    }

    #[test]
    fn test_parse_stacking_pairs() {
        let config = BoardConfig::from_json_str(
            r#"{ "stacking": { "max_modifiers_per_task": 2,
                               "disallowed_pairs": [["zombie", "food"]] } }"#,
        )
        .unwrap();

        assert_eq!(config.stacking.max_modifiers_per_task, Some(2));
        assert!(config.stacking.disallowed_pairs[0].matches(CardKind::Food, CardKind::Zombie));
    }
}
