//! Merge validation.
//!
//! Before two stacks merge, the incoming cards are checked against the
//! configured [`StackingRules`], in order:
//!
//! 1. modifier cap per task stack,
//! 2. duplicate modifier types on one stack,
//! 3. board-wide unique modifiers,
//! 4. disallowed kind pairs,
//! 5. the allow-list, when one is configured.
//!
//! A modifier joining a villager is always acceptable when either side
//! carries a task: modifiers must stay attachable to a worked task.
//!
//! The validator is pure; it sees definition ids and board-wide counts only.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::board::BoardState;
use crate::core::config::StackingRules;
use crate::core::error::BoardError;
use crate::core::ids::StackId;
use crate::core::kind::{CardKind, DefId};

/// Why a merge was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StackingViolation {
    #[error("task stack already holds {max} modifiers")]
    TooManyModifiers { max: usize },

    #[error("stack already holds modifier {0}")]
    DuplicateModifier(DefId),

    #[error("modifier {0} is unique and already on the board")]
    UniqueModifierTaken(DefId),

    #[error("{0} cards cannot stack with {1} cards")]
    DisallowedPair(CardKind, CardKind),

    #[error("no allowed pairing between these stacks")]
    NotAllowed,
}

impl From<StackingViolation> for BoardError {
    fn from(v: StackingViolation) -> Self {
        BoardError::RuleViolation(v.to_string())
    }
}

/// Everything the validator looks at for one proposed merge.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergeCandidate {
    /// Target stack definition ids, bottom to top.
    pub target: Vec<DefId>,
    /// Incoming definition ids, bottom to top.
    pub source: Vec<DefId>,
    /// Board-wide count per definition id, including both stacks.
    pub board_counts: FxHashMap<DefId, usize>,
}

impl MergeCandidate {
    #[must_use]
    pub fn new(target: Vec<DefId>, source: Vec<DefId>) -> Self {
        Self {
            target,
            source,
            board_counts: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn with_board_count(mut self, def_id: impl Into<DefId>, count: usize) -> Self {
        self.board_counts.insert(def_id.into(), count);
        self
    }

    /// Describe a merge of `source` onto `target` on a live board.
    #[must_use]
    pub fn from_board(board: &BoardState, target: StackId, source: StackId) -> Self {
        let target = board.def_ids_in(target);
        let source = board.def_ids_in(source);
        let mut board_counts = FxHashMap::default();
        for card in board.cards() {
            *board_counts.entry(card.def_id.clone()).or_insert(0) += 1;
        }
        Self {
            target,
            source,
            board_counts,
        }
    }

    fn kinds(ids: &[DefId]) -> BTreeSet<CardKind> {
        ids.iter().filter_map(DefId::kind).collect()
    }
}

/// Both sides hold a modifier and a villager respectively, with a task present.
fn modifier_villager_carve_out(
    a: CardKind,
    b: CardKind,
    target: &BTreeSet<CardKind>,
    source: &BTreeSet<CardKind>,
) -> bool {
    let pair = (a == CardKind::Modifier && b == CardKind::Villager)
        || (a == CardKind::Villager && b == CardKind::Modifier);
    pair && (target.contains(&CardKind::Task) || source.contains(&CardKind::Task))
}

/// Validate a proposed merge.
pub fn validate_merge(rules: &StackingRules, candidate: &MergeCandidate) -> Result<(), StackingViolation> {
    let target_kinds = MergeCandidate::kinds(&candidate.target);
    let source_kinds = MergeCandidate::kinds(&candidate.source);
    let has_task = target_kinds.contains(&CardKind::Task) || source_kinds.contains(&CardKind::Task);

    // 1-3: incoming modifiers, one at a time
    let mut modifier_count = candidate.target.iter().filter(|d| d.is(CardKind::Modifier)).count();
    let mut present: Vec<&DefId> = candidate.target.iter().collect();

    for incoming in candidate.source.iter() {
        if !incoming.is(CardKind::Modifier) {
            present.push(incoming);
            continue;
        }

        if has_task {
            if let Some(max) = rules.max_modifiers_per_task {
                if modifier_count >= max {
                    return Err(StackingViolation::TooManyModifiers { max });
                }
            }
        }

        if present.contains(&incoming) && !rules.allow_duplicate_types.contains(incoming) {
            return Err(StackingViolation::DuplicateModifier(incoming.clone()));
        }

        if rules.unique_modifiers.contains(incoming) {
            let on_board = candidate.board_counts.get(incoming).copied().unwrap_or(0);
            let incoming_copies = candidate.source.iter().filter(|d| *d == incoming).count();
            if on_board > incoming_copies {
                return Err(StackingViolation::UniqueModifierTaken(incoming.clone()));
            }
        }

        modifier_count += 1;
        present.push(incoming);
    }

    // 4: deny-list
    for &a in &target_kinds {
        for &b in &source_kinds {
            let denied = rules.disallowed_pairs.iter().any(|p| p.matches(a, b));
            if denied && !modifier_villager_carve_out(a, b, &target_kinds, &source_kinds) {
                return Err(StackingViolation::DisallowedPair(a, b));
            }
        }
    }

    // 5: allow-list
    if !rules.allowed_pairs.is_empty() {
        let allowed = target_kinds.iter().any(|&a| {
            source_kinds.iter().any(|&b| {
                rules.allowed_pairs.iter().any(|p| p.matches(a, b))
                    || modifier_villager_carve_out(a, b, &target_kinds, &source_kinds)
            })
        });
        if !allowed {
            return Err(StackingViolation::NotAllowed);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::KindPair;

    fn ids(list: &[&str]) -> Vec<DefId> {
        list.iter().map(|s| DefId::from(*s)).collect()
    }

    #[test]
    fn test_default_rules_accept_everything() {
        let candidate = MergeCandidate::new(ids(&["task.blank"]), ids(&["villager.basic", "mod.pin"]));
        assert!(validate_merge(&StackingRules::default(), &candidate).is_ok());
    }

    #[test]
    fn test_modifier_cap() {
        let rules = StackingRules {
            max_modifiers_per_task: Some(2),
            ..Default::default()
        };

        let ok = MergeCandidate::new(ids(&["mod.a", "task.blank"]), ids(&["mod.b"]));
        assert!(validate_merge(&rules, &ok).is_ok());

        let full = MergeCandidate::new(ids(&["mod.a", "mod.b", "task.blank"]), ids(&["mod.c"]));
        assert_eq!(
            validate_merge(&rules, &full),
            Err(StackingViolation::TooManyModifiers { max: 2 })
        );

        let two_incoming = MergeCandidate::new(ids(&["mod.a", "task.blank"]), ids(&["mod.b", "mod.c"]));
        assert!(validate_merge(&rules, &two_incoming).is_err());

        // no task on either side: the cap does not apply
        let loose = MergeCandidate::new(ids(&["mod.a", "mod.b"]), ids(&["mod.c"]));
        assert!(validate_merge(&rules, &loose).is_ok());
    }

    #[test]
    fn test_duplicates() {
        let mut rules = StackingRules::default();
        let candidate = MergeCandidate::new(ids(&["mod.pin", "task.blank"]), ids(&["mod.pin"]));

        assert_eq!(
            validate_merge(&rules, &candidate),
            Err(StackingViolation::DuplicateModifier("mod.pin".into()))
        );

        rules.allow_duplicate_types.push("mod.pin".into());
        assert!(validate_merge(&rules, &candidate).is_ok());
    }

    #[test]
    fn test_unique_modifier() {
        let rules = StackingRules {
            unique_modifiers: vec!["mod.crown".into()],
            ..Default::default()
        };

        let alone = MergeCandidate::new(ids(&["task.blank"]), ids(&["mod.crown"])).with_board_count("mod.crown", 1);
        assert!(validate_merge(&rules, &alone).is_ok());

        let elsewhere =
            MergeCandidate::new(ids(&["task.blank"]), ids(&["mod.crown"])).with_board_count("mod.crown", 2);
        assert_eq!(
            validate_merge(&rules, &elsewhere),
            Err(StackingViolation::UniqueModifierTaken("mod.crown".into()))
        );
    }

    #[test]
    fn test_disallowed_pair_and_carve_out() {
        let rules = StackingRules {
            disallowed_pairs: vec![
                KindPair(CardKind::Zombie, CardKind::Food),
                KindPair(CardKind::Modifier, CardKind::Villager),
            ],
            ..Default::default()
        };

        let zombie_food = MergeCandidate::new(ids(&["zombie.z"]), ids(&["food.berry"]));
        assert_eq!(
            validate_merge(&rules, &zombie_food),
            Err(StackingViolation::DisallowedPair(CardKind::Zombie, CardKind::Food))
        );

        let bare = MergeCandidate::new(ids(&["villager.basic"]), ids(&["mod.pin"]));
        assert!(validate_merge(&rules, &bare).is_err());

        let worked = MergeCandidate::new(ids(&["villager.basic", "task.blank"]), ids(&["mod.pin"]));
        assert!(validate_merge(&rules, &worked).is_ok());
    }

    #[test]
    fn test_allow_list() {
        let rules = StackingRules {
            allowed_pairs: vec![KindPair(CardKind::Task, CardKind::Villager)],
            ..Default::default()
        };

        let ok = MergeCandidate::new(ids(&["task.blank"]), ids(&["villager.basic"]));
        assert!(validate_merge(&rules, &ok).is_ok());

        let no = MergeCandidate::new(ids(&["food.berry"]), ids(&["loot.coin"]));
        assert_eq!(validate_merge(&rules, &no), Err(StackingViolation::NotAllowed));
    }

    #[test]
    fn test_violation_maps_to_rule_error() {
        let err: BoardError = StackingViolation::NotAllowed.into();
        assert!(matches!(err, BoardError::RuleViolation(_)));
    }
}
