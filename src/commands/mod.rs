//! Board commands.
//!
//! A command arrives as a wire name plus a loose [`Args`] bag. [`Command::parse`]
//! validates every argument once and yields a typed [`Command`]; [`execute`]
//! runs it against a board with the registries in a [`CommandContext`].
//!
//! Handlers validate before they mutate. When a handler touches two
//! collaborators (wallet, then task registry) and the second step fails, the
//! first is compensated before the error is returned.
//!
//! ```
//! use cardboard::board::BoardState;
//! use cardboard::commands::{dispatch, Args, CommandContext};
//! use cardboard::core::BoardConfig;
//! use cardboard::registry::{MemoryPlayerRegistry, MemoryTaskRegistry};
//!
//! let (tasks, players, config) = (MemoryTaskRegistry::new(), MemoryPlayerRegistry::new(), BoardConfig::new());
//! let ctx = CommandContext::new(&tasks, &players, &config);
//! let mut board = BoardState::new();
//!
//! let patch = dispatch(&mut board, "task.create_blank", &Args::new().with("x", 0.0).with("y", 0.0), &ctx).unwrap();
//! assert_eq!(patch.created.len(), 1);
//! ```

pub mod args;
pub mod patch;

mod deck;
mod economy;
mod spawn;
mod stack_ops;
mod support;
mod task;
mod world;

pub use args::Args;
pub use patch::Patch;
pub use task::{task_modifiers, DEADLINE_PIN_MODIFIER, RECURRING_MODIFIER};
pub use world::is_overdue;

use chrono::NaiveDate;
use tracing::debug;

use crate::board::BoardState;
use crate::cards::{data_from_json, CardData};
use crate::core::config::{BoardConfig, Point};
use crate::core::error::{BoardError, Result};
use crate::core::ids::StackId;
use crate::core::kind::DefId;
use crate::registry::{PlayerRegistry, TaskRegistry};

/// Collaborators a command runs against.
#[derive(Clone, Copy)]
pub struct CommandContext<'a> {
    pub tasks: &'a dyn TaskRegistry,
    pub players: &'a dyn PlayerRegistry,
    pub config: &'a BoardConfig,
    /// Date used when a command needs "today".
    pub today: NaiveDate,
}

impl<'a> CommandContext<'a> {
    /// Context dated with the local date.
    pub fn new(tasks: &'a dyn TaskRegistry, players: &'a dyn PlayerRegistry, config: &'a BoardConfig) -> Self {
        Self {
            tasks,
            players,
            config,
            today: chrono::Local::now().date_naive(),
        }
    }

    #[must_use]
    pub fn on(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }
}

/// One board command with validated arguments.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Move { stack: StackId, x: f64, y: f64 },
    BringToFront { stack: StackId },
    Merge { target: StackId, source: StackId },
    Split { stack: StackId, index: usize, at: Option<Point> },
    Unstack { stack: StackId },
    PopBottom { stack: StackId, at: Option<Point> },
    SpawnCard { def_id: DefId, x: f64, y: f64, data: CardData },
    SpawnPack { deck_id: String, x: f64, y: f64 },
    SeedDefault,
    OpenPack { stack: StackId, seed: Option<u64>, radius: Option<f64> },
    CreateBlankTask { x: f64, y: f64, title: Option<String> },
    SpawnExistingTask { task_id: String, x: f64, y: f64 },
    SetTaskId { stack: StackId, task_id: String },
    AssignVillager { stack: StackId },
    CompleteStack { stack: StackId },
    CompleteByTaskId { task_id: String },
    Gather { villager: StackId, resource: StackId, target: Option<StackId>, seed: Option<u64> },
    Consume { villager: StackId, food: StackId, target: Option<StackId> },
    ClearZombie { villager: StackId, zombie: StackId, target: Option<StackId>, seed: Option<u64> },
    CollectLoot { stack: StackId },
    Salvage { stack: StackId, seed: Option<u64> },
    EndDay { date: Option<NaiveDate>, seed: Option<u64> },
}

/// Every accepted wire name.
pub const COMMAND_NAMES: &[&str] = &[
    "move",
    "bringToFront",
    "merge",
    "split",
    "unstack",
    "popBottom",
    "card.spawn",
    "deck.spawn_pack",
    "board.seed_default",
    "deck.open_pack",
    "task.create_blank",
    "task.spawn_existing",
    "task.set_task_id",
    "task.assign_villager",
    "task.complete_stack",
    "task.complete_by_task_id",
    "resource.gather",
    "food.consume",
    "zombie.clear",
    "loot.collect",
    "modifier.salvage",
    "world.end_day",
];

fn opt_point(args: &Args) -> Result<Option<Point>> {
    match (args.opt_f64("x")?, args.opt_f64("y")?) {
        (Some(x), Some(y)) => Ok(Some(Point::new(x, y))),
        (None, None) => Ok(None),
        (Some(_), None) => Err(BoardError::bad_argument("y", "required together with x")),
        (None, Some(_)) => Err(BoardError::bad_argument("x", "required together with y")),
    }
}

impl Command {
    /// Validate `args` for the command called `name`.
    pub fn parse(name: &str, args: &Args) -> Result<Self> {
        let command = match name {
            "move" => Command::Move {
                stack: args.stack_id("stackId")?,
                x: args.f64("x")?,
                y: args.f64("y")?,
            },
            "bringToFront" => Command::BringToFront { stack: args.stack_id("stackId")? },
            "merge" => Command::Merge {
                target: args.stack_id("targetId")?,
                source: args.stack_id("sourceId")?,
            },
            "split" => Command::Split {
                stack: args.stack_id("stackId")?,
                index: args.usize("index")?,
                at: opt_point(args)?,
            },
            "unstack" => Command::Unstack { stack: args.stack_id("stackId")? },
            "popBottom" => Command::PopBottom {
                stack: args.stack_id("stackId")?,
                at: opt_point(args)?,
            },
            "card.spawn" => {
                let def_id = DefId::new(args.str("defId")?);
                if def_id.kind().is_none() || def_id.sub_id().map_or(true, str::is_empty) {
                    return Err(BoardError::bad_argument("defId", format!("unknown card definition '{def_id}'")));
                }
                Command::SpawnCard {
                    def_id,
                    x: args.f64("x")?,
                    y: args.f64("y")?,
                    data: args.opt_object("data")?.map(data_from_json).unwrap_or_default(),
                }
            }
            "deck.spawn_pack" => Command::SpawnPack {
                deck_id: args.str("deckId")?.to_string(),
                x: args.f64("x")?,
                y: args.f64("y")?,
            },
            "board.seed_default" => Command::SeedDefault,
            "deck.open_pack" => Command::OpenPack {
                stack: args.stack_id("stackId")?,
                seed: args.opt_u64("seed")?,
                radius: args.opt_f64("radius")?,
            },
            "task.create_blank" => Command::CreateBlankTask {
                x: args.f64("x")?,
                y: args.f64("y")?,
                title: args.opt_str("title")?.map(str::to_string),
            },
            "task.spawn_existing" => Command::SpawnExistingTask {
                task_id: args.str("taskId")?.to_string(),
                x: args.f64("x")?,
                y: args.f64("y")?,
            },
            "task.set_task_id" => Command::SetTaskId {
                stack: args.stack_id("stackId")?,
                task_id: args.str("taskId")?.to_string(),
            },
            "task.assign_villager" => Command::AssignVillager { stack: args.stack_id("stackId")? },
            "task.complete_stack" => Command::CompleteStack { stack: args.stack_id("stackId")? },
            "task.complete_by_task_id" => Command::CompleteByTaskId {
                task_id: args.str("taskId")?.to_string(),
            },
            "resource.gather" => Command::Gather {
                villager: args.stack_id("villagerStackId")?,
                resource: args.stack_id("resourceStackId")?,
                target: args.opt_stack_id("targetStackId")?,
                seed: args.opt_u64("seed")?,
            },
            "food.consume" => Command::Consume {
                villager: args.stack_id("villagerStackId")?,
                food: args.stack_id("foodStackId")?,
                target: args.opt_stack_id("targetStackId")?,
            },
            "zombie.clear" => Command::ClearZombie {
                villager: args.stack_id("villagerStackId")?,
                zombie: args.stack_id("zombieStackId")?,
                target: args.opt_stack_id("targetStackId")?,
                seed: args.opt_u64("seed")?,
            },
            "loot.collect" => Command::CollectLoot { stack: args.stack_id("stackId")? },
            "modifier.salvage" => Command::Salvage {
                stack: args.stack_id("stackId")?,
                seed: args.opt_u64("seed")?,
            },
            "world.end_day" => Command::EndDay {
                date: args.opt_date("date")?,
                seed: args.opt_u64("seed")?,
            },
            other => return Err(BoardError::UnknownCommand(other.to_string())),
        };
        Ok(command)
    }

    /// Wire name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Command::Move { .. } => "move",
            Command::BringToFront { .. } => "bringToFront",
            Command::Merge { .. } => "merge",
            Command::Split { .. } => "split",
            Command::Unstack { .. } => "unstack",
            Command::PopBottom { .. } => "popBottom",
            Command::SpawnCard { .. } => "card.spawn",
            Command::SpawnPack { .. } => "deck.spawn_pack",
            Command::SeedDefault => "board.seed_default",
            Command::OpenPack { .. } => "deck.open_pack",
            Command::CreateBlankTask { .. } => "task.create_blank",
            Command::SpawnExistingTask { .. } => "task.spawn_existing",
            Command::SetTaskId { .. } => "task.set_task_id",
            Command::AssignVillager { .. } => "task.assign_villager",
            Command::CompleteStack { .. } => "task.complete_stack",
            Command::CompleteByTaskId { .. } => "task.complete_by_task_id",
            Command::Gather { .. } => "resource.gather",
            Command::Consume { .. } => "food.consume",
            Command::ClearZombie { .. } => "zombie.clear",
            Command::CollectLoot { .. } => "loot.collect",
            Command::Salvage { .. } => "modifier.salvage",
            Command::EndDay { .. } => "world.end_day",
        }
    }
}

/// Run a parsed command.
pub fn execute(board: &mut BoardState, command: &Command, ctx: &CommandContext<'_>) -> Result<Patch> {
    debug!(command = command.name(), "executing board command");
    let config = ctx.config;

    match command {
        Command::Move { stack, x, y } => stack_ops::move_stack(board, *stack, *x, *y),
        Command::BringToFront { stack } => stack_ops::bring_to_front(board, *stack),
        Command::Merge { target, source } => stack_ops::merge(board, *target, *source, config),
        Command::Split { stack, index, at } => stack_ops::split(board, *stack, *index, *at, config),
        Command::Unstack { stack } => stack_ops::unstack(board, *stack, config),
        Command::PopBottom { stack, at } => stack_ops::pop_bottom(board, *stack, *at, config),
        Command::SpawnCard { def_id, x, y, data } => spawn::spawn_card(board, def_id, Point::new(*x, *y), data, config),
        Command::SpawnPack { deck_id, x, y } => spawn::spawn_pack(board, deck_id, Point::new(*x, *y), ctx),
        Command::SeedDefault => spawn::seed_default(board, config),
        Command::OpenPack { stack, seed, radius } => deck::open_pack(board, *stack, *seed, *radius, ctx),
        Command::CreateBlankTask { x, y, title } => {
            task::create_blank(board, Point::new(*x, *y), title.as_deref())
        }
        Command::SpawnExistingTask { task_id, x, y } => {
            task::spawn_existing(board, task_id, Point::new(*x, *y), ctx)
        }
        Command::SetTaskId { stack, task_id } => task::set_task_id(board, *stack, task_id, ctx),
        Command::AssignVillager { stack } => task::assign_villager(board, *stack, ctx),
        Command::CompleteStack { stack } => task::complete_stack(board, *stack, ctx),
        Command::CompleteByTaskId { task_id } => task::complete_by_task_id(board, task_id, ctx),
        Command::Gather { villager, resource, target, seed } => {
            economy::gather(board, *villager, *resource, *target, *seed, ctx)
        }
        Command::Consume { villager, food, target } => economy::consume(board, *villager, *food, *target, ctx),
        Command::ClearZombie { villager, zombie, target, seed } => {
            economy::clear_zombie(board, *villager, *zombie, *target, *seed, ctx)
        }
        Command::CollectLoot { stack } => economy::collect_loot(board, *stack, ctx),
        Command::Salvage { stack, seed } => economy::salvage(board, *stack, *seed, ctx),
        Command::EndDay { date, seed } => world::end_day(board, *date, *seed, ctx),
    }
}

/// Parse and run a named command.
pub fn dispatch(board: &mut BoardState, name: &str, args: &Args, ctx: &CommandContext<'_>) -> Result<Patch> {
    let command = Command::parse(name, args)?;
    execute(board, &command, ctx)
}
