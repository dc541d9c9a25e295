//! Villager progression: XP, levels and perks.
//!
//! Levels come from cumulative XP via the configured thresholds. Each level
//! gained grants `choices_per_level` perks from the pool, highest weight
//! first, skipping perks already owned. Perk effects layer onto stamina and
//! cost math.

use serde::{Deserialize, Serialize};

use crate::core::config::{PerkDef, PerkEffects, ProgressionRules, ZombieDef};

/// Progress of one villager.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VillagerProgress {
    pub xp: i64,
    pub level: u32,
    pub perks: Vec<String>,
}

impl Default for VillagerProgress {
    fn default() -> Self {
        Self {
            xp: 0,
            level: 1,
            perks: Vec::new(),
        }
    }
}

/// Outcome of an XP award.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelUp {
    pub xp: i64,
    pub level: u32,
    pub levels_gained: u32,
    pub new_perks: Vec<String>,
}

impl LevelUp {
    #[must_use]
    pub fn leveled(&self) -> bool {
        self.levels_gained > 0
    }
}

/// Level reached with `xp` total XP.
#[must_use]
pub fn level_for_xp(xp: i64, rules: &ProgressionRules) -> u32 {
    let reached = rules
        .thresholds
        .iter()
        .filter(|(_, &needed)| xp >= needed)
        .map(|(&level, _)| level)
        .max()
        .unwrap_or(1);
    reached.max(1).min(rules.max_level.max(1))
}

/// Up to `count` perk ids from `pool` the villager does not own yet.
#[must_use]
pub fn pick_perks(pool: &[PerkDef], owned: &[String], count: usize) -> Vec<String> {
    let mut candidates: Vec<&PerkDef> = pool.iter().filter(|p| p.weight > 0).collect();
    candidates.sort_by(|a, b| b.weight.cmp(&a.weight));
    candidates
        .into_iter()
        .filter(|p| !owned.contains(&p.id))
        .take(count)
        .map(|p| p.id.clone())
        .collect()
}

/// Add XP, level up and grant perks.
pub fn apply_xp(progress: &mut VillagerProgress, amount: i64, rules: &ProgressionRules) -> LevelUp {
    progress.xp += amount.max(0);
    let level = level_for_xp(progress.xp, rules);
    let levels_gained = level.saturating_sub(progress.level);

    let mut new_perks = Vec::new();
    for _ in 0..levels_gained {
        let picks = pick_perks(&rules.perk_pool, &progress.perks, rules.choices_per_level);
        progress.perks.extend(picks.iter().cloned());
        new_perks.extend(picks);
    }
    progress.level = progress.level.max(level);

    LevelUp {
        xp: progress.xp,
        level: progress.level,
        levels_gained,
        new_perks,
    }
}

/// Combined effects of a villager's perks.
#[must_use]
pub fn perk_effects(progress: &VillagerProgress, rules: &ProgressionRules) -> PerkEffects {
    PerkEffects::total(&progress.perks, &rules.perk_pool)
}

/// Max stamina after perk bonuses.
#[must_use]
pub fn max_stamina(base: i64, effects: &PerkEffects) -> i64 {
    (base + effects.max_stamina_bonus).max(0)
}

/// Stamina to clear a zombie: never below the definition's floor.
#[must_use]
pub fn zombie_clear_cost(def: &ZombieDef, effects: &PerkEffects) -> i64 {
    (def.clear_cost - effects.zombie_clear_discount).max(def.min_cost)
}

#[must_use]
pub fn gather_cost(base: i64, effects: &PerkEffects) -> i64 {
    (base - effects.gather_discount).max(0)
}

/// Task-completion XP including the priority bonus.
#[must_use]
pub fn task_completion_xp(rules: &ProgressionRules, priority: &str) -> i64 {
    rules.xp.task_complete + rules.xp.priority_bonus.get(priority).copied().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perk(id: &str, weight: i64, bonus: i64) -> PerkDef {
        PerkDef {
            id: id.to_string(),
            weight,
            effects: PerkEffects {
                max_stamina_bonus: bonus,
                ..Default::default()
            },
        }
    }

    fn rules() -> ProgressionRules {
        ProgressionRules {
            perk_pool: vec![perk("sturdy", 1, 1), perk("hardy", 5, 2), perk("swift", 3, 0)],
            ..Default::default()
        }
    }

    #[test]
    fn test_level_for_xp() {
        let rules = rules();
        assert_eq!(level_for_xp(0, &rules), 1);
        assert_eq!(level_for_xp(9, &rules), 1);
        assert_eq!(level_for_xp(10, &rules), 2);
        assert_eq!(level_for_xp(60, &rules), 4);
        assert_eq!(level_for_xp(10_000, &rules), 5);
    }

    #[test]
    fn test_pick_perks_by_weight() {
        let rules = rules();
        assert_eq!(pick_perks(&rules.perk_pool, &[], 2), vec!["hardy", "swift"]);
        assert_eq!(pick_perks(&rules.perk_pool, &["hardy".to_string()], 1), vec!["swift"]);
    }

    #[test]
    fn test_apply_xp_multiple_levels() {
        let rules = rules();
        let mut progress = VillagerProgress::default();

        let up = apply_xp(&mut progress, 30, &rules);
        assert_eq!(up.level, 3);
        assert_eq!(up.levels_gained, 2);
        assert_eq!(up.new_perks, vec!["hardy", "swift"]);

        let up = apply_xp(&mut progress, 1, &rules);
        assert!(!up.leveled());
        assert_eq!(progress.xp, 31);
    }

    #[test]
    fn test_perk_math() {
        let rules = rules();
        let progress = VillagerProgress {
            perks: vec!["hardy".into(), "sturdy".into(), "ghost".into()],
            ..Default::default()
        };
        let effects = perk_effects(&progress, &rules);
        assert_eq!(max_stamina(5, &effects), 8);

        let def = ZombieDef { clear_cost: 3, min_cost: 1, rewards: Vec::new() };
        let discount = PerkEffects { zombie_clear_discount: 5, ..Default::default() };
        assert_eq!(zombie_clear_cost(&def, &discount), 1);
        assert_eq!(zombie_clear_cost(&def, &PerkEffects::default()), 3);
    }

    #[test]
    fn test_priority_bonus() {
        let mut rules = rules();
        rules.xp.priority_bonus.insert("urgent".into(), 4);
        assert_eq!(task_completion_xp(&rules, "urgent"), 9);
        assert_eq!(task_completion_xp(&rules, "low"), 5);
    }
}
