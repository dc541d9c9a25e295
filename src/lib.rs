//! # cardboard
//!
//! Board state engine for a gamified task tracker. Tasks, villagers,
//! modifiers, resources, food, zombies, loot and deck packs are cards; cards
//! are grouped into stacks on a 2D board, and named commands move, merge,
//! split and consume them.
//!
//! ## Design Principles
//!
//! 1. **Closed card kinds**: a card's kind comes from its definition-id
//!    prefix through one lookup table. The wire form of the id never changes.
//!
//! 2. **Typed commands**: the loose argument bag is validated once, at the
//!    dispatch boundary, into a [`Command`] variant.
//!
//! 3. **Copy-on-write transactions**: a command runs on a clone of the board
//!    and is only saved when it succeeds. Persistent maps (`im`) keep the
//!    clone O(1).
//!
//! 4. **External ledgers**: tasks and the player's wallet live behind the
//!    [`TaskRegistry`] and [`PlayerRegistry`] traits.
//!
//! ## Modules
//!
//! - `core`: ids, card kinds, errors, RNG, configuration
//! - `cards`: card instances and their data bags
//! - `board`: stacks, the board aggregate, the cached store
//! - `rules`: merge validation
//! - `registry`: task and player registries, villager progression
//! - `commands`: command parsing, dispatch and handlers

pub mod core;
pub mod cards;
pub mod board;
pub mod rules;
pub mod registry;
pub mod commands;

// Re-export commonly used types
pub use crate::core::{
    BoardConfig, BoardError, BoardRng, CardId, CardKind, DefId, ErrorClass, Point, Result,
    StackId, WeightedPool,
};

pub use crate::cards::{Card, CardData, DataValue};

pub use crate::board::{
    BoardBackend, BoardSnapshot, BoardState, BoardStore, FileBackend, MemoryBackend,
    SnapshotFormat, Stack,
};

pub use crate::rules::{validate_merge, MergeCandidate, StackingViolation};

pub use crate::registry::{
    MemoryPlayerRegistry, MemoryTaskRegistry, PlayerRegistry, Task, TaskFilter, TaskPatch,
    TaskRegistry, Wallet,
};

pub use crate::commands::{dispatch, execute, Args, Command, CommandContext, Patch, COMMAND_NAMES};
