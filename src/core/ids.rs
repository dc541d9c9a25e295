//! Card and stack identification.
//!
//! Every card and every stack on a board has an opaque numeric id. Both kinds
//! are drawn from a single monotonic counter per board, so a card id and a
//! stack id never collide either.
//!
//! ## Usage
//!
//! ```
//! use cardboard::core::{IdAllocator, CardId, StackId};
//!
//! let mut ids = IdAllocator::default();
//! let card: CardId = ids.next_card();
//! let stack: StackId = ids.next_stack();
//!
//! assert_eq!(card.raw(), 1);
//! assert_eq!(stack.raw(), 2);
//! ```

use serde::{Deserialize, Serialize};

/// Identifier of a card instance on a board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub u64);

impl CardId {
    /// Create a card ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Card({})", self.0)
    }
}

/// Identifier of a stack on a board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StackId(pub u64);

impl StackId {
    /// Create a stack ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for StackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Stack({})", self.0)
    }
}

impl From<u64> for CardId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<u64> for StackId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Monotonic id source for one board.
///
/// Not persisted: a loaded board resumes after the largest id it contains.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdAllocator {
    next: u64,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdAllocator {
    /// Resume allocation after `max_seen`.
    #[must_use]
    pub fn resume_after(max_seen: u64) -> Self {
        Self { next: max_seen + 1 }
    }

    /// Allocate a card id.
    pub fn next_card(&mut self) -> CardId {
        CardId(self.bump())
    }

    /// Allocate a stack id.
    pub fn next_stack(&mut self) -> StackId {
        StackId(self.bump())
    }

    /// Peek at the next raw value without allocating.
    #[must_use]
    pub fn peek(&self) -> u64 {
        self.next
    }

    fn bump(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }
}
