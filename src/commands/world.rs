//! End-of-day tick.
//!
//! In order: clear every task's worked-today flag, reopen completed recurring
//! tasks, spawn zombies for overdue pending tasks, reset villager stamina.

use chrono::NaiveDate;
use tracing::info;

use super::support::villager_key;
use super::{CommandContext, Patch};
use crate::board::BoardState;
use crate::cards::{CardData, DataValue, KEY_TASK_ID};
use crate::core::config::StaminaReset;
use crate::core::error::{BoardError, Result};
use crate::core::kind::CardKind;
use crate::core::rng::RngSource;
use crate::registry::progression::{max_stamina, perk_effects};
use crate::registry::{Task, TaskFilter, TaskPatch};

/// Due date plus grace is strictly before the tick date (both at midnight).
///
/// Compared in hours so any `grace_hours` is accepted without overflow.
#[must_use]
pub fn is_overdue(due: NaiveDate, grace_hours: i64, tick: NaiveDate) -> bool {
    let elapsed_hours = tick.signed_duration_since(due).num_days() * 24;
    grace_hours < elapsed_hours
}

pub(crate) fn end_day(
    board: &mut BoardState,
    date: Option<NaiveDate>,
    seed: Option<u64>,
    ctx: &CommandContext<'_>,
) -> Result<Patch> {
    let config = ctx.config;
    let world = &config.world;
    let tick = date.unwrap_or(ctx.today);

    let zombie_def = world.zombie_rule.definition.clone();
    if !zombie_def.is(CardKind::Zombie) {
        return Err(BoardError::config(format!("zombie rule spawns non-zombie '{zombie_def}'")));
    }

    for task in ctx.tasks.list(&TaskFilter::all()).iter().filter(|t| t.worked_today) {
        ctx.tasks.update(&task.id, &TaskPatch::default().with_worked_today(false))?;
    }

    let mut reopened = Vec::new();
    for task in ctx.tasks.list(&TaskFilter::done()) {
        let Some(recurrence) = task.recurrence else {
            continue;
        };
        let next_due = recurrence.next_on_or_after(task.due.unwrap_or(tick), tick);
        ctx.tasks.update(&task.id, &TaskPatch::done(false).with_due(Some(next_due)))?;
        reopened.push(task.id);
    }

    let overdue: Vec<Task> = ctx
        .tasks
        .list(&TaskFilter::pending())
        .into_iter()
        .filter(|t| t.due.map_or(false, |due| is_overdue(due, world.zombie_grace_hours, tick)))
        .collect();

    let cap = world
        .zombie_rule
        .cap
        .map_or(world.daily_zombie_cap, |c| c.min(world.daily_zombie_cap));
    let mut rng = RngSource::resolve(seed, None).into_rng();
    let mut spawned: u32 = 0;
    let mut patch = Patch::new();

    'tasks: for task in &overdue {
        if let Some(chance) = world.zombie_rule.spawn_chance {
            if !rng.gen_bool(chance) {
                continue;
            }
        }
        for _ in 0..world.zombies_per_task {
            if spawned >= cap {
                break 'tasks;
            }
            let x = world.zombie_origin.x + world.zombie_spacing * f64::from(spawned);
            let mut data = CardData::default();
            data.insert(KEY_TASK_ID.to_string(), DataValue::from(task.id.as_str()));
            let (stack, _) = board.spawn_card(zombie_def.clone(), data, x, world.zombie_origin.y);
            patch = patch.created(stack);
            spawned += 1;
        }
    }

    if world.stamina_reset != StaminaReset::None {
        let villagers: Vec<_> = board
            .stacks_with_kind(CardKind::Villager)
            .into_iter()
            .map(villager_key)
            .collect();
        for key in &villagers {
            let effects = perk_effects(&ctx.players.progress(key), &config.progression);
            let max = max_stamina(config.economy.max_stamina, &effects);
            ctx.players.reset_stamina(key, max, world.stamina_reset);
        }
    }

    ctx.players.increment_metric("days_ended", 1);
    info!(%tick, reopened = reopened.len(), overdue = overdue.len(), zombies = spawned, "day ended");

    Ok(patch
        .with_info("date", tick.to_string())
        .with_info("reopened", reopened)
        .with_info("zombies", spawned))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_overdue_with_grace() {
        let tick = date(2024, 5, 10);

        assert!(is_overdue(date(2024, 5, 9), 0, tick));
        assert!(!is_overdue(date(2024, 5, 10), 0, tick));
        assert!(!is_overdue(date(2024, 5, 9), 24, tick));
        assert!(is_overdue(date(2024, 5, 9), 23, tick));
    }

    #[test]
    fn test_overdue_with_extreme_grace() {
        let tick = date(2024, 5, 10);

        assert!(!is_overdue(date(2024, 5, 9), i64::MAX, tick));
        assert!(!is_overdue(date(2024, 5, 9), i64::MAX / 2, tick));
        assert!(is_overdue(date(2024, 5, 10), i64::MIN, tick));
        assert!(is_overdue(date(2024, 5, 11), -48, tick));
        assert!(!is_overdue(date(2024, 5, 11), -24, tick));
    }
}
