//! Board model: stacks, the board aggregate, and cached persistence.

pub mod stack;
pub mod state;
pub mod store;

pub use stack::{CardList, Stack};
pub use state::{BoardSnapshot, BoardState};
pub use store::{BoardBackend, BoardStore, FileBackend, MemoryBackend, SnapshotFormat};
