//! Collaborator registries the board engine reads and updates.
//!
//! Tasks and the player's wallet live outside the board. The engine reaches
//! them through the [`TaskRegistry`] and [`PlayerRegistry`] traits; the
//! in-memory implementations back tests and single-process use.

pub mod tasks;
pub mod player;
pub mod progression;

pub use player::{MemoryPlayerRegistry, PlayerRegistry, Wallet};
pub use progression::{LevelUp, VillagerProgress};
pub use tasks::{
    MemoryTaskRegistry, Priority, Recurrence, RecurrenceKind, StatusFilter, Task, TaskFilter,
    TaskPatch, TaskRegistry,
};
