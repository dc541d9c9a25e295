//! Lookups shared by the handler families.

use crate::board::{BoardState, Stack};
use crate::cards::{Card, CardData, DataValue, KEY_AMOUNT, KEY_CHARGES};
use crate::core::config::{BoardConfig, PerkEffects, Point};
use crate::core::error::{BoardError, Result};
use crate::core::ids::{CardId, StackId};
use crate::core::kind::{CardKind, DefId};
use crate::registry::progression::{max_stamina, perk_effects};
use crate::registry::PlayerRegistry;

pub(crate) fn require_stack(board: &BoardState, id: StackId) -> Result<&Stack> {
    board.get_stack(id).ok_or_else(|| BoardError::not_found("stack", id))
}

/// Face card of a stack, which must be of `kind`.
pub(crate) fn face_card_of(board: &BoardState, id: StackId, kind: CardKind) -> Result<&Card> {
    require_stack(board, id)?;
    board
        .top_card(id)
        .filter(|card| card.is(kind))
        .ok_or_else(|| BoardError::rule(format!("{id} is not a {kind} stack")))
}

/// Topmost villager card in a stack.
pub(crate) fn villager_in(board: &BoardState, id: StackId) -> Result<CardId> {
    require_stack(board, id)?;
    board
        .find_in(id, CardKind::Villager)
        .map(|card| card.id)
        .ok_or_else(|| BoardError::rule(format!("{id} has no villager")))
}

/// Ledger key for the villager stack a stamina or XP entry belongs to.
pub(crate) fn villager_key(stack: StackId) -> String {
    stack.raw().to_string()
}

/// Sub-id of a card definition, e.g. `"berry"` for `"food.berry"`.
pub(crate) fn sub_id_of(card: &Card) -> Result<String> {
    card.def_id
        .sub_id()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| BoardError::config(format!("card definition '{}' has no sub-id", card.def_id)))
}

/// A villager's perk effects and effective max stamina.
pub(crate) fn villager_stats(players: &dyn PlayerRegistry, config: &BoardConfig, key: &str) -> (PerkEffects, i64) {
    let effects = perk_effects(&players.progress(key), &config.progression);
    let max = max_stamina(config.economy.max_stamina, &effects);
    (effects, max)
}

/// Data a freshly created card starts with.
pub(crate) fn initial_data(config: &BoardConfig, def_id: &DefId) -> CardData {
    let mut data = CardData::default();
    let Some(sub_id) = def_id.sub_id() else {
        return data;
    };
    match def_id.kind() {
        Some(CardKind::Resource) => {
            if let Some(def) = config.resources.get(sub_id) {
                data.insert(KEY_CHARGES.to_string(), DataValue::Int(def.charges));
            }
        }
        Some(CardKind::Food) => {
            if let Some(def) = config.foods.get(sub_id) {
                data.insert(KEY_AMOUNT.to_string(), DataValue::Int(def.servings));
            }
        }
        _ => {}
    }
    data
}

/// Move the non-target participant onto the target's position.
///
/// `positions` are the participants' positions captured before the handler
/// ran, since the target may have been consumed. A target naming neither
/// participant moves nothing. Returns the moved stack.
pub(crate) fn move_onto_target(
    board: &mut BoardState,
    target: Option<StackId>,
    participants: [(StackId, Point); 2],
) -> Option<StackId> {
    let target = target?;
    let [(a, a_pos), (b, b_pos)] = participants;
    let (mover, dest) = if target == a {
        (b, a_pos)
    } else if target == b {
        (a, b_pos)
    } else {
        return None;
    };
    board.move_stack(mover, dest.x, dest.y).then_some(mover)
}

pub(crate) fn position_of(board: &BoardState, id: StackId) -> Result<Point> {
    let stack = require_stack(board, id)?;
    Ok(Point::new(stack.x, stack.y))
}
