//! Stacks and their structural operations.
//!
//! A stack is an ordered list of card ids at a board position. Index 0 is the
//! bottom; the last index is the top (face) card.
//!
//! Every operation here is a pure edit of the card list. Invalid input is a
//! soft failure (`None` or an unchanged result), never a panic.
//!
//! ```
//! use cardboard::board::Stack;
//! use cardboard::core::{CardId, StackId};
//!
//! let mut stack = Stack::new(StackId(1), 0.0, 0.0, 1);
//! stack.push(CardId(10));
//! stack.push(CardId(11));
//! stack.push(CardId(12));
//!
//! let upper = stack.split_from(1).unwrap();
//! assert_eq!(stack.cards(), &[CardId(10)]);
//! assert_eq!(upper.as_slice(), &[CardId(11), CardId(12)]);
//! ```

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::ids::{CardId, StackId};

/// Card list of a stack, bottom to top.
pub type CardList = SmallVec<[CardId; 4]>;

/// An ordered group of cards at one board position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stack {
    pub id: StackId,
    cards: CardList,
    pub x: f64,
    pub y: f64,
    /// Paint order; larger is drawn later.
    pub z: u64,
}

impl Stack {
    /// Create an empty stack.
    #[must_use]
    pub fn new(id: StackId, x: f64, y: f64, z: u64) -> Self {
        Self {
            id,
            cards: CardList::new(),
            x,
            y,
            z,
        }
    }

    /// Create a stack holding `cards`.
    #[must_use]
    pub fn with_cards(id: StackId, x: f64, y: f64, z: u64, cards: CardList) -> Self {
        Self { id, cards, x, y, z }
    }

    /// Cards, bottom to top.
    #[must_use]
    pub fn cards(&self) -> &[CardId] {
        &self.cards
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Face card.
    #[must_use]
    pub fn top(&self) -> Option<CardId> {
        self.cards.last().copied()
    }

    #[must_use]
    pub fn bottom(&self) -> Option<CardId> {
        self.cards.first().copied()
    }

    #[must_use]
    pub fn contains(&self, card: CardId) -> bool {
        self.cards.contains(&card)
    }

    #[must_use]
    pub fn position(&self, card: CardId) -> Option<usize> {
        self.cards.iter().position(|&c| c == card)
    }

    /// Put a card on top.
    pub fn push(&mut self, card: CardId) {
        self.cards.push(card);
    }

    /// Split at `index`: keep `[0, index)`, return `[index, len)`.
    ///
    /// Returns `None` (nothing split) unless `0 < index < len`.
    pub fn split_from(&mut self, index: usize) -> Option<CardList> {
        if index == 0 || index >= self.cards.len() {
            return None;
        }
        Some(self.cards.drain(index..).collect())
    }

    /// Append `source`'s cards (bottom to top) onto this stack's top.
    /// `source` is left empty.
    pub fn merge_from(&mut self, source: &mut CardList) {
        self.cards.extend(source.drain(..));
    }

    /// One single-card group per card, in order.
    ///
    /// A stack of one (or zero) cards comes back unchanged as a single group.
    #[must_use]
    pub fn unstack_into_singles(&self) -> Vec<CardList> {
        if self.cards.len() <= 1 {
            return vec![self.cards.clone()];
        }
        self.cards.iter().map(|&c| smallvec::smallvec![c]).collect()
    }

    /// Remove and return the top card.
    pub fn take_top(&mut self) -> Option<CardId> {
        self.cards.pop()
    }

    /// Remove and return the bottom card.
    pub fn take_bottom(&mut self) -> Option<CardId> {
        if self.cards.is_empty() {
            return None;
        }
        Some(self.cards.remove(0))
    }

    /// Remove and return `[start, end)`. `None` for an empty or invalid range.
    pub fn take_range(&mut self, start: usize, end: usize) -> Option<CardList> {
        if start >= end || end > self.cards.len() {
            return None;
        }
        Some(self.cards.drain(start..end).collect())
    }

    /// Remove one card wherever it is. Returns true if it was present.
    pub fn remove_card(&mut self, card: CardId) -> bool {
        match self.position(card) {
            Some(idx) => {
                self.cards.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Move the card at `index` to the top. No-op for an invalid index.
    pub fn move_to_top(&mut self, index: usize) {
        if index < self.cards.len() {
            let card = self.cards.remove(index);
            self.cards.push(card);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack_of(ids: &[u64]) -> Stack {
        let cards = ids.iter().map(|&i| CardId(i)).collect();
        Stack::with_cards(StackId(1), 0.0, 0.0, 1, cards)
    }

    #[test]
    fn test_split_bounds() {
        let mut stack = stack_of(&[1, 2, 3]);

        assert!(stack.split_from(0).is_none());
        assert!(stack.split_from(3).is_none());
        assert!(stack.split_from(9).is_none());
        assert_eq!(stack.len(), 3);

        let upper = stack.split_from(2).unwrap();
        assert_eq!(upper.as_slice(), &[CardId(3)]);
        assert_eq!(stack.cards(), &[CardId(1), CardId(2)]);
    }

    #[test]
    fn test_merge_from() {
        let mut target = stack_of(&[1, 2]);
        let mut source: CardList = smallvec::smallvec![CardId(3), CardId(4)];

        target.merge_from(&mut source);

        assert_eq!(target.cards(), &[CardId(1), CardId(2), CardId(3), CardId(4)]);
        assert!(source.is_empty());

        let mut empty = CardList::new();
        target.merge_from(&mut empty);
        assert_eq!(target.len(), 4);
    }

    #[test]
    fn test_unstack_single_is_unchanged() {
        let stack = stack_of(&[7]);
        let expected: CardList = smallvec::smallvec![CardId(7)];
        assert_eq!(stack.unstack_into_singles(), vec![expected]);

        let multi = stack_of(&[1, 2, 3]);
        let groups = multi.unstack_into_singles();
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[2].as_slice(), &[CardId(3)]);
    }

    #[test]
    fn test_take_top_and_bottom() {
        let mut stack = stack_of(&[1, 2, 3]);

        assert_eq!(stack.take_top(), Some(CardId(3)));
        assert_eq!(stack.take_bottom(), Some(CardId(1)));
        assert_eq!(stack.take_top(), Some(CardId(2)));
        assert_eq!(stack.take_top(), None);
        assert_eq!(stack.take_bottom(), None);
    }

    #[test]
    fn test_take_range() {
        let mut stack = stack_of(&[1, 2, 3, 4]);

        assert!(stack.take_range(2, 2).is_none());
        assert!(stack.take_range(3, 1).is_none());
        assert!(stack.take_range(0, 5).is_none());

        let mid = stack.take_range(1, 3).unwrap();
        assert_eq!(mid.as_slice(), &[CardId(2), CardId(3)]);
        assert_eq!(stack.cards(), &[CardId(1), CardId(4)]);
    }

    #[test]
    fn test_remove_and_move_to_top() {
        let mut stack = stack_of(&[1, 2, 3]);

        stack.move_to_top(0);
        assert_eq!(stack.cards(), &[CardId(2), CardId(3), CardId(1)]);
        assert_eq!(stack.top(), Some(CardId(1)));

        stack.move_to_top(10);
        assert_eq!(stack.len(), 3);

        assert!(stack.remove_card(CardId(3)));
        assert!(!stack.remove_card(CardId(3)));
        assert_eq!(stack.cards(), &[CardId(2), CardId(1)]);
    }
}
