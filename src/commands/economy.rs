//! Resource, food, zombie and loot commands.
//!
//! Stamina and XP are booked against the named villager stack id, which
//! must hold a villager card. An optional `targetStackId` naming one
//! participant moves the other participant onto its position after the
//! action; a target naming neither participant is ignored.

use tracing::{debug, info};

use super::support::{
    face_card_of, move_onto_target, position_of, require_stack, sub_id_of, villager_in, villager_key,
    villager_stats,
};
use super::{CommandContext, Patch};
use crate::board::BoardState;
use crate::cards::{CardData, DataValue, KEY_AMOUNT, KEY_CHARGES};
use crate::core::config::{LootDrop, Point};
use crate::core::error::{BoardError, Result};
use crate::core::ids::StackId;
use crate::core::kind::{CardKind, DefId};
use crate::core::rng::{BoardRng, RngSource, WeightedPool};
use crate::registry::progression::{gather_cost, zombie_clear_cost};

fn rng_for(seed: Option<u64>) -> BoardRng {
    RngSource::resolve(seed, None).into_rng()
}

fn loot_pool(drops: &[LootDrop]) -> WeightedPool<&LootDrop> {
    WeightedPool::new(drops.iter().map(|d| (d, d.weight)))
}

/// Spawn a loot card holding `amount` of `loot`.
fn spawn_loot(board: &mut BoardState, loot: &str, amount: i64, at: Point) -> StackId {
    let mut data = CardData::default();
    data.insert(KEY_AMOUNT.to_string(), DataValue::Int(amount));
    board.spawn_card(DefId::of(CardKind::Loot, loot), data, at.x, at.y).0
}

fn distinct(first: StackId, second: StackId, field: &str) -> Result<()> {
    if first == second {
        return Err(BoardError::bad_argument(field, "must differ from villagerStackId"));
    }
    Ok(())
}

/// One gather cycle: spend stamina, produce loot, use up a charge.
pub(crate) fn gather(
    board: &mut BoardState,
    villager_stack: StackId,
    resource_stack: StackId,
    target: Option<StackId>,
    seed: Option<u64>,
    ctx: &CommandContext<'_>,
) -> Result<Patch> {
    let config = ctx.config;
    distinct(villager_stack, resource_stack, "resourceStackId")?;
    villager_in(board, villager_stack)?;
    let resource_card = face_card_of(board, resource_stack, CardKind::Resource)?;
    let resource_card_id = resource_card.id;
    let resource_id = sub_id_of(resource_card)?;
    let def = config.resource(&resource_id)?;
    if def.product.is_empty() {
        return Err(BoardError::config(format!("resource '{resource_id}' has no product")));
    }
    let charges = resource_card.charges(def.charges);
    let positions = [
        (villager_stack, position_of(board, villager_stack)?),
        (resource_stack, position_of(board, resource_stack)?),
    ];

    let key = villager_key(villager_stack);
    let (effects, max) = villager_stats(ctx.players, config, &key);
    let cost = gather_cost(def.stamina_cost.unwrap_or(config.economy.gather_cost), &effects);
    let stamina_left = ctx.players.spend_stamina(&key, cost, max)?;

    let resource_pos = positions[1].1;
    let offset = config.layout.product_offset;
    let drop_at = Point::new(resource_pos.x + offset, resource_pos.y + offset);
    let mut patch = Patch::new().created(spawn_loot(board, &def.product, def.product_amount, drop_at));

    let mut rng = rng_for(seed);
    if rng.gen_bool(def.bonus_chance) {
        if let Some(bonus) = loot_pool(&def.bonus).draw(&mut rng) {
            let bonus_at = Point::new(drop_at.x + offset, drop_at.y);
            patch = patch
                .created(spawn_loot(board, &bonus.loot, bonus.amount, bonus_at))
                .with_info("bonus", bonus.loot.clone());
        }
    }

    let remaining = charges - 1;
    if remaining <= 0 {
        board.remove_card(resource_card_id);
        if board.get_stack(resource_stack).is_none() {
            patch = patch.removed(resource_stack);
        } else {
            patch = patch.updated(resource_stack);
        }
        debug!(resource = %resource_id, "resource depleted");
    } else {
        if let Some(card) = board.get_card_mut(resource_card_id) {
            card.set(KEY_CHARGES, remaining);
        }
        patch = patch.updated(resource_stack);
    }

    let xp = config.progression.xp.gather;
    ctx.players.award_xp(&key, xp, &config.progression);
    ctx.players.increment_metric("resources_gathered", 1);

    if let Some(moved) = move_onto_target(board, target, positions) {
        patch = patch.updated(moved);
    }
    Ok(patch
        .with_info("staminaSpent", cost)
        .with_info("stamina", stamina_left)
        .with_info("charges", remaining.max(0)))
}

/// Eat one serving of food.
pub(crate) fn consume(
    board: &mut BoardState,
    villager_stack: StackId,
    food_stack: StackId,
    target: Option<StackId>,
    ctx: &CommandContext<'_>,
) -> Result<Patch> {
    let config = ctx.config;
    distinct(villager_stack, food_stack, "foodStackId")?;
    villager_in(board, villager_stack)?;
    let food_card = face_card_of(board, food_stack, CardKind::Food)?;
    let food_card_id = food_card.id;
    let food_id = sub_id_of(food_card)?;
    let def = config.food(&food_id)?;
    let servings = food_card.get_int(KEY_AMOUNT, def.servings);
    let positions = [
        (villager_stack, position_of(board, villager_stack)?),
        (food_stack, position_of(board, food_stack)?),
    ];

    let key = villager_key(villager_stack);
    let (_, max) = villager_stats(ctx.players, config, &key);
    let stamina = ctx.players.restore_stamina(&key, def.stamina, max);

    let mut patch = Patch::new();
    let left = servings - 1;
    if left <= 0 {
        board.remove_card(food_card_id);
        patch = if board.get_stack(food_stack).is_none() {
            patch.removed(food_stack)
        } else {
            patch.updated(food_stack)
        };
    } else {
        if let Some(card) = board.get_card_mut(food_card_id) {
            card.set(KEY_AMOUNT, left);
        }
        patch = patch.updated(food_stack);
    }
    ctx.players.increment_metric("food_consumed", 1);

    if let Some(moved) = move_onto_target(board, target, positions) {
        patch = patch.updated(moved);
    }
    Ok(patch.with_info("stamina", stamina).with_info("servings", left.max(0)))
}

/// Clear a zombie for a stamina cost and a reward roll.
pub(crate) fn clear_zombie(
    board: &mut BoardState,
    villager_stack: StackId,
    zombie_stack: StackId,
    target: Option<StackId>,
    seed: Option<u64>,
    ctx: &CommandContext<'_>,
) -> Result<Patch> {
    let config = ctx.config;
    distinct(villager_stack, zombie_stack, "zombieStackId")?;
    villager_in(board, villager_stack)?;
    let zombie_card = face_card_of(board, zombie_stack, CardKind::Zombie)?;
    let zombie_card_id = zombie_card.id;
    let zombie_id = sub_id_of(zombie_card)?;
    let def = config.zombies.get(&zombie_id).cloned().unwrap_or_default();
    let positions = [
        (villager_stack, position_of(board, villager_stack)?),
        (zombie_stack, position_of(board, zombie_stack)?),
    ];

    let key = villager_key(villager_stack);
    let (effects, max) = villager_stats(ctx.players, config, &key);
    let cost = zombie_clear_cost(&def, &effects);
    let stamina_left = ctx.players.spend_stamina(&key, cost, max)?;

    board.remove_card(zombie_card_id);
    let mut patch = if board.get_stack(zombie_stack).is_none() {
        Patch::new().removed(zombie_stack)
    } else {
        Patch::new().updated(zombie_stack)
    };

    let mut rng = rng_for(seed);
    if let Some(reward) = loot_pool(&def.rewards).draw(&mut rng) {
        let at = positions[1].1;
        patch = patch
            .created(spawn_loot(board, &reward.loot, reward.amount, at))
            .with_info("reward", reward.loot.clone());
    }

    ctx.players.award_xp(&key, config.progression.xp.zombie_clear, &config.progression);
    ctx.players.increment_metric("zombies_cleared", 1);

    if let Some(moved) = move_onto_target(board, target, positions) {
        patch = patch.updated(moved);
    }
    Ok(patch.with_info("staminaSpent", cost).with_info("stamina", stamina_left))
}

/// Move every loot card of a stack into the wallet.
pub(crate) fn collect_loot(board: &mut BoardState, stack: StackId, ctx: &CommandContext<'_>) -> Result<Patch> {
    require_stack(board, stack)?;
    let mut haul: Vec<(String, i64)> = Vec::new();
    for card in board.cards_in(stack) {
        if !card.is(CardKind::Loot) {
            return Err(BoardError::rule(format!("{stack} holds a non-loot card {}", card.def_id)));
        }
        haul.push((sub_id_of(card)?, card.amount()));
    }

    let mut collected = serde_json::Map::new();
    for (loot, amount) in &haul {
        let balance = ctx.players.add_loot(loot, *amount);
        collected.insert(loot.clone(), balance.into());
    }
    board.remove_stack(stack);
    info!(%stack, kinds = haul.len(), "collected loot");

    Ok(Patch::new().removed(stack).with_info("balances", collected))
}

/// Break the face modifier of a stack down into loot.
pub(crate) fn salvage(board: &mut BoardState, stack: StackId, seed: Option<u64>, ctx: &CommandContext<'_>) -> Result<Patch> {
    let card = face_card_of(board, stack, CardKind::Modifier)?;
    let card_id = card.id;
    let rule = ctx.config.modifier_rule(&card.def_id);
    let pool = loot_pool(&rule.salvage);
    if pool.is_empty() {
        return Err(BoardError::config(format!("modifier '{}' has no salvage table", card.def_id)));
    }

    let mut rng = rng_for(seed);
    let drop = pool
        .draw(&mut rng)
        .map(|d| (*d).clone())
        .ok_or_else(|| BoardError::config("salvage draw came up empty"))?;
    let balance = ctx.players.add_loot(&drop.loot, drop.amount);

    board.remove_card(card_id);
    let patch = if board.get_stack(stack).is_none() {
        Patch::new().removed(stack)
    } else {
        Patch::new().updated(stack)
    };
    ctx.players.increment_metric("modifiers_salvaged", 1);

    Ok(patch
        .with_info("loot", drop.loot)
        .with_info("amount", drop.amount)
        .with_info("balance", balance))
}
