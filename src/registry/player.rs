//! Player registry: loot wallet, villager stamina and progress, counters.
//!
//! Villagers are keyed by a string id; the command layer uses the villager
//! card id. A villager with no recorded stamina is at full stamina.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::progression::{apply_xp, LevelUp, VillagerProgress};
use crate::core::config::{ProgressionRules, StaminaReset};
use crate::core::error::{BoardError, Result};

/// Snapshot of a player's holdings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub loot: BTreeMap<String, i64>,
    pub stamina: BTreeMap<String, i64>,
    pub villagers: BTreeMap<String, VillagerProgress>,
    pub counters: BTreeMap<String, i64>,
    pub deck_opens: BTreeMap<String, i64>,
}

impl Wallet {
    #[must_use]
    pub fn loot(&self, kind: &str) -> i64 {
        self.loot.get(kind).copied().unwrap_or(0)
    }

    /// Current stamina, treating an absent record as `max`.
    #[must_use]
    pub fn stamina_of(&self, villager: &str, max: i64) -> i64 {
        self.stamina.get(villager).copied().unwrap_or(max).min(max)
    }

    #[must_use]
    pub fn counter(&self, name: &str) -> i64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    /// Total of every loot kind.
    #[must_use]
    pub fn loot_total(&self) -> i64 {
        self.loot.values().sum()
    }
}

/// Wallet and villager ledger consumed by the board engine.
pub trait PlayerRegistry: Send + Sync {
    fn wallet(&self) -> Wallet;

    /// Add loot, returning the new balance.
    fn add_loot(&self, kind: &str, amount: i64) -> i64;

    /// Spend loot. Fails with `InsufficientFunds` and leaves the wallet
    /// unchanged if the balance is too low.
    fn spend_loot(&self, kind: &str, amount: i64) -> Result<i64>;

    fn stamina(&self, villager: &str, max: i64) -> i64;

    /// Spend stamina, returning what is left.
    fn spend_stamina(&self, villager: &str, amount: i64, max: i64) -> Result<i64>;

    /// Restore stamina, capped at `max`.
    fn restore_stamina(&self, villager: &str, amount: i64, max: i64) -> i64;

    fn reset_stamina(&self, villager: &str, max: i64, mode: StaminaReset);

    fn progress(&self, villager: &str) -> VillagerProgress;

    fn award_xp(&self, villager: &str, amount: i64, rules: &ProgressionRules) -> LevelUp;

    fn increment_metric(&self, name: &str, by: i64) -> i64;

    fn increment_deck_opens(&self, deck_id: &str) -> i64;
}

/// In-memory player registry.
#[derive(Debug, Default)]
pub struct MemoryPlayerRegistry {
    wallet: RwLock<Wallet>,
}

impl MemoryPlayerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_loot(self, kind: &str, amount: i64) -> Self {
        self.add_loot(kind, amount);
        self
    }
}

impl PlayerRegistry for MemoryPlayerRegistry {
    fn wallet(&self) -> Wallet {
        self.wallet.read().clone()
    }

    fn add_loot(&self, kind: &str, amount: i64) -> i64 {
        let mut wallet = self.wallet.write();
        let balance = wallet.loot.entry(kind.to_string()).or_insert(0);
        *balance += amount;
        *balance
    }

    fn spend_loot(&self, kind: &str, amount: i64) -> Result<i64> {
        let mut wallet = self.wallet.write();
        let available = wallet.loot(kind);
        if amount <= 0 {
            return Ok(available);
        }
        if available < amount {
            return Err(BoardError::InsufficientFunds {
                what: kind.to_string(),
                needed: amount,
                available,
            });
        }
        wallet.loot.insert(kind.to_string(), available - amount);
        Ok(available - amount)
    }

    fn stamina(&self, villager: &str, max: i64) -> i64 {
        self.wallet.read().stamina_of(villager, max)
    }

    fn spend_stamina(&self, villager: &str, amount: i64, max: i64) -> Result<i64> {
        let mut wallet = self.wallet.write();
        let current = wallet.stamina_of(villager, max);
        if amount <= 0 {
            return Ok(current);
        }
        if current < amount {
            return Err(BoardError::InsufficientFunds {
                what: "stamina".to_string(),
                needed: amount,
                available: current,
            });
        }
        wallet.stamina.insert(villager.to_string(), current - amount);
        Ok(current - amount)
    }

    fn restore_stamina(&self, villager: &str, amount: i64, max: i64) -> i64 {
        let mut wallet = self.wallet.write();
        let restored = (wallet.stamina_of(villager, max) + amount.max(0)).min(max);
        wallet.stamina.insert(villager.to_string(), restored);
        restored
    }

    fn reset_stamina(&self, villager: &str, max: i64, mode: StaminaReset) {
        let mut wallet = self.wallet.write();
        let current = wallet.stamina_of(villager, max);
        let next = match mode {
            StaminaReset::None => return,
            StaminaReset::Full => max,
            StaminaReset::Partial => (current + max / 2).min(max),
        };
        wallet.stamina.insert(villager.to_string(), next);
    }

    fn progress(&self, villager: &str) -> VillagerProgress {
        self.wallet
            .read()
            .villagers
            .get(villager)
            .cloned()
            .unwrap_or_default()
    }

    fn award_xp(&self, villager: &str, amount: i64, rules: &ProgressionRules) -> LevelUp {
        let mut wallet = self.wallet.write();
        let progress = wallet.villagers.entry(villager.to_string()).or_default();
        apply_xp(progress, amount, rules)
    }

    fn increment_metric(&self, name: &str, by: i64) -> i64 {
        let mut wallet = self.wallet.write();
        let counter = wallet.counters.entry(name.to_string()).or_insert(0);
        *counter += by;
        *counter
    }

    fn increment_deck_opens(&self, deck_id: &str) -> i64 {
        let mut wallet = self.wallet.write();
        let opens = wallet.deck_opens.entry(deck_id.to_string()).or_insert(0);
        *opens += 1;
        *opens
    }
}
