//! Task lifecycle commands.
//!
//! Keeps task cards on the board and the task registry's `live` flag in
//! step: a task is live while a card linked to it is on the board.

use tracing::{info, warn};

use super::support::{require_stack, villager_in, villager_key};
use super::{CommandContext, Patch};
use crate::board::BoardState;
use crate::cards::{Card, CardData, DataValue, KEY_TASK_ID, KEY_TITLE};
use crate::core::config::{BoardConfig, Point, NEXT_ACTION_MODIFIER};
use crate::core::error::{BoardError, Result};
use crate::core::ids::{CardId, StackId};
use crate::core::kind::{CardKind, DefId};
use crate::registry::progression::task_completion_xp;
use crate::registry::{Priority, Task, TaskPatch};

/// Modifier placed on tasks with a due date.
pub const DEADLINE_PIN_MODIFIER: &str = "mod.deadline_pin";
/// Modifier placed on recurring tasks.
pub const RECURRING_MODIFIER: &str = "mod.recurring";

/// Modifier cards a task brings onto the board, without duplicates.
#[must_use]
pub fn task_modifiers(task: &Task) -> Vec<DefId> {
    let mut mods: Vec<DefId> = Vec::new();
    let derived = [
        (task.due.is_some(), DEADLINE_PIN_MODIFIER),
        (task.next_action, NEXT_ACTION_MODIFIER),
        (task.recurrence.is_some(), RECURRING_MODIFIER),
    ];
    let flagged = derived.iter().filter(|(on, _)| *on).map(|(_, id)| DefId::from(*id));

    for def_id in flagged.chain(task.modifiers.iter().cloned()) {
        if def_id.is(CardKind::Modifier) && !mods.contains(&def_id) {
            mods.push(def_id);
        }
    }
    mods
}

fn task_card_data(task: &Task) -> CardData {
    let mut data = CardData::default();
    data.insert(KEY_TASK_ID.to_string(), DataValue::from(task.id.as_str()));
    data.insert(KEY_TITLE.to_string(), DataValue::from(task.title.as_str()));
    data
}

pub(crate) fn create_blank(board: &mut BoardState, at: Point, title: Option<&str>) -> Result<Patch> {
    let mut data = CardData::default();
    if let Some(title) = title {
        data.insert(KEY_TITLE.to_string(), title.into());
    }
    let (stack, _) = board.spawn_card(DefId::of(CardKind::Task, "blank"), data, at.x, at.y);
    Ok(Patch::new().created(stack))
}

/// Put an existing task on the board for a coin fee.
pub(crate) fn spawn_existing(
    board: &mut BoardState,
    task_id: &str,
    at: Point,
    ctx: &CommandContext<'_>,
) -> Result<Patch> {
    let task = ctx.tasks.get(task_id)?;
    if task.done {
        return Err(BoardError::rule(format!("task {task_id} is already completed")));
    }
    if task.live || board.find_task_card(task_id).is_some() {
        return Err(BoardError::rule(format!("task {task_id} is already on the board")));
    }

    let coin = &ctx.config.economy.coin;
    let cost = ctx.config.economy.task_spawn_cost.max(0);
    if cost > 0 {
        ctx.players.spend_loot(coin, cost)?;
    }
    if let Err(err) = ctx.tasks.set_live(task_id, true) {
        if cost > 0 {
            ctx.players.add_loot(coin, cost);
            warn!(task_id, cost, error = %err, "marking task live failed, coin refunded");
        }
        return Err(err);
    }

    let mut cards: Vec<CardId> = task_modifiers(&task)
        .into_iter()
        .map(|def_id| board.create_card(def_id, CardData::default()))
        .collect();
    cards.push(board.create_card(DefId::of(CardKind::Task, "instance"), task_card_data(&task)));
    let stack = board.place_stack(at.x, at.y, cards.into_iter().collect());

    Ok(Patch::new().created(stack).with_info("coinSpent", cost))
}

/// Link the task card of a stack to a registry task.
pub(crate) fn set_task_id(board: &mut BoardState, stack: StackId, task_id: &str, ctx: &CommandContext<'_>) -> Result<Patch> {
    require_stack(board, stack)?;
    let card = board
        .find_in(stack, CardKind::Task)
        .ok_or_else(|| BoardError::rule(format!("{stack} has no task card")))?;
    let card_id = card.id;
    let previous = card.task_id().map(str::to_string);
    if previous.as_deref() == Some(task_id) {
        return Ok(Patch::new().with_info("changed", false));
    }

    let task = ctx.tasks.get(task_id)?;
    if task.done {
        return Err(BoardError::rule(format!("task {task_id} is already completed")));
    }
    if let Some((_, other)) = board.find_task_card(task_id) {
        if other != card_id {
            return Err(BoardError::rule(format!("task {task_id} is already linked to {other}")));
        }
    }

    ctx.tasks.set_live(task_id, true)?;
    if let Some(previous) = &previous {
        if let Err(err) = ctx.tasks.set_live(previous, false) {
            warn!(task_id = %previous, error = %err, "could not clear live flag of unlinked task");
        }
    }

    if let Some(card) = board.get_card_mut(card_id) {
        card.def_id = DefId::of(CardKind::Task, "instance");
        card.set(KEY_TASK_ID, task.id.as_str());
        card.set(KEY_TITLE, task.title.as_str());
    }
    Ok(Patch::new().updated(stack).with_info("changed", true))
}

/// Record the stack's villager as the assignee of its linked task, keyed by
/// the stack id.
pub(crate) fn assign_villager(board: &mut BoardState, stack: StackId, ctx: &CommandContext<'_>) -> Result<Patch> {
    require_stack(board, stack)?;
    let task_id = board
        .find_in(stack, CardKind::Task)
        .and_then(Card::task_id)
        .map(str::to_string)
        .ok_or_else(|| BoardError::rule(format!("{stack} has no linked task")))?;
    villager_in(board, stack)?;
    let villager = villager_key(stack);

    ctx.tasks.update(
        &task_id,
        &TaskPatch::default().with_assigned_villager(Some(villager.clone())),
    )?;
    Ok(Patch::new().updated(stack).with_info("villager", villager))
}

fn consumed_on_completion(card: &Card, config: &BoardConfig) -> bool {
    card.is(CardKind::Task)
        || (card.is(CardKind::Modifier) && config.modifier_rule(&card.def_id).is_single_use_on_completion())
}

/// Mark a registry task done and not live, undoing the first step if the
/// second fails.
fn close_task(task: &Task, ctx: &CommandContext<'_>) -> Result<()> {
    ctx.tasks
        .update(&task.id, &TaskPatch::done(true).with_worked_today(true))?;
    if let Err(err) = ctx.tasks.set_live(&task.id, false) {
        let undo = TaskPatch::done(task.done).with_worked_today(task.worked_today);
        if let Err(undo_err) = ctx.tasks.update(&task.id, &undo) {
            warn!(task_id = %task.id, error = %undo_err, "could not reopen task after failed completion");
        }
        warn!(task_id = %task.id, error = %err, "clearing live flag failed, completion undone");
        return Err(err);
    }
    Ok(())
}

/// Complete the task on a stack.
///
/// The task card and single-use modifiers are consumed; every other card is
/// respawned as its own stack. A participating villager earns XP.
pub(crate) fn complete_stack(board: &mut BoardState, stack: StackId, ctx: &CommandContext<'_>) -> Result<Patch> {
    let config = ctx.config;
    let s = require_stack(board, stack)?;
    let (x, y) = (s.x, s.y);
    let task_card = board
        .find_in(stack, CardKind::Task)
        .ok_or_else(|| BoardError::rule(format!("{stack} has no task card")))?;
    let linked = task_card.task_id().map(str::to_string);
    let has_villager = board.find_in(stack, CardKind::Villager).is_some();

    if config.tasks.require_villager_to_complete && !has_villager {
        return Err(BoardError::rule(format!("{stack} needs a villager to complete its task")));
    }

    let task = linked.as_deref().map(|id| ctx.tasks.get(id)).transpose()?;
    if let Some(task) = &task {
        close_task(task, ctx)?;
    }

    let mut consumed: Vec<CardId> = Vec::new();
    let mut survivors: Vec<CardId> = Vec::new();
    for card in board.cards_in(stack) {
        if consumed_on_completion(card, config) {
            consumed.push(card.id);
        } else {
            survivors.push(card.id);
        }
    }

    for card in &consumed {
        board.remove_card(*card);
    }
    // detach the survivors, then give each its own stack
    board.retain_cards(stack, |_| false);
    let offset = config.layout.respawn_offset;
    let mut patch = Patch::new().removed(stack);
    for (i, card) in survivors.into_iter().enumerate() {
        let step = offset * i as f64;
        patch = patch.created(board.place_stack(x + step, y + step, std::iter::once(card).collect()));
    }

    if has_villager {
        let priority = task.as_ref().map_or(Priority::Normal, |t| t.priority);
        let xp = task_completion_xp(&config.progression, priority.as_str());
        let key = villager_key(stack);
        let level_up = ctx.players.award_xp(&key, xp, &config.progression);
        if level_up.leveled() {
            info!(villager = %key, level = level_up.level, perks = ?level_up.new_perks, "villager leveled up");
        }
        patch = patch
            .with_info("xp", xp)
            .with_info("level", level_up.level);
    }
    ctx.players.increment_metric("tasks_completed", 1);

    Ok(patch
        .with_info("consumed", consumed.len())
        .with_info("taskId", linked.unwrap_or_default()))
}

/// Complete a task by registry id, on or off the board.
pub(crate) fn complete_by_task_id(board: &mut BoardState, task_id: &str, ctx: &CommandContext<'_>) -> Result<Patch> {
    if let Some((stack, _)) = board.find_task_card(task_id) {
        return Ok(complete_stack(board, stack, ctx)?.with_info("onBoard", true));
    }

    let task = ctx.tasks.get(task_id)?;
    if task.done {
        return Err(BoardError::rule(format!("task {task_id} is already completed")));
    }
    close_task(&task, ctx)?;
    ctx.players.increment_metric("tasks_completed", 1);
    Ok(Patch::new()
        .with_info("onBoard", false)
        .with_info("taskId", task_id))
}
