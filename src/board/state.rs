//! Board state: the aggregate root for one board.
//!
//! ## BoardState
//!
//! Owns every card and stack on a board:
//! - card registry (card id -> card)
//! - stacks (stack id -> ordered card list + position + Z)
//! - the Z counter, which doubles as an optimistic version number
//! - a cosmetic pan offset
//!
//! Cards and stacks are only created through the factory methods here, which
//! assign fresh ids. Removal is explicit and idempotent.
//!
//! Uses `im` persistent maps so that cloning a board for a command
//! transaction is O(1).
//!
//! ## Persisted form
//!
//! Only stacks, cards, the Z counter and the pan offset are serialized. The
//! id allocator is rebuilt on load from the largest id present.

use std::collections::BTreeSet;

use im::HashMap as ImHashMap;
use serde::{Deserialize, Serialize};

use super::stack::{CardList, Stack};
use crate::cards::{Card, CardData};
use crate::core::config::Point;
use crate::core::ids::{CardId, IdAllocator, StackId};
use crate::core::kind::{CardKind, DefId};

/// Full board state.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(from = "BoardSnapshot", into = "BoardSnapshot")]
pub struct BoardState {
    stacks: ImHashMap<StackId, Stack>,
    cards: ImHashMap<CardId, Card>,
    z_counter: u64,
    pan: Point,
    ids: IdAllocator,
}

/// Serialized shape of a board.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BoardSnapshot {
    #[serde(default)]
    pub stacks: ImHashMap<StackId, Stack>,
    #[serde(default)]
    pub cards: ImHashMap<CardId, Card>,
    #[serde(default, rename = "zCounter")]
    pub z_counter: u64,
    #[serde(default)]
    pub pan: Point,
}

impl From<BoardSnapshot> for BoardState {
    fn from(snapshot: BoardSnapshot) -> Self {
        let max_stack = snapshot.stacks.keys().map(|s| s.raw()).max().unwrap_or(0);
        let max_card = snapshot.cards.keys().map(|c| c.raw()).max().unwrap_or(0);

        Self {
            ids: IdAllocator::resume_after(max_stack.max(max_card)),
            stacks: snapshot.stacks,
            cards: snapshot.cards,
            z_counter: snapshot.z_counter,
            pan: snapshot.pan,
        }
    }
}

impl From<BoardState> for BoardSnapshot {
    fn from(state: BoardState) -> Self {
        Self {
            stacks: state.stacks,
            cards: state.cards,
            z_counter: state.z_counter,
            pan: state.pan,
        }
    }
}

impl PartialEq for BoardState {
    /// Boards compare by persisted content; the allocator is derived.
    fn eq(&self, other: &Self) -> bool {
        self.stacks == other.stacks
            && self.cards == other.cards
            && self.z_counter == other.z_counter
            && self.pan == other.pan
    }
}

impl BoardState {
    /// Create an empty board.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // === Accessors ===

    /// Current Z counter (also the board version).
    #[must_use]
    pub fn z_counter(&self) -> u64 {
        self.z_counter
    }

    #[must_use]
    pub fn pan(&self) -> Point {
        self.pan
    }

    pub fn set_pan(&mut self, x: f64, y: f64) {
        self.pan = Point::new(x, y);
    }

    #[must_use]
    pub fn stack_count(&self) -> usize {
        self.stacks.len()
    }

    #[must_use]
    pub fn card_count(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    pub fn stacks(&self) -> impl Iterator<Item = &Stack> {
        self.stacks.values()
    }

    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.cards.values()
    }

    /// Stack ids sorted ascending, for stable iteration.
    #[must_use]
    pub fn stack_ids(&self) -> Vec<StackId> {
        let mut ids: Vec<_> = self.stacks.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    #[must_use]
    pub fn get_card(&self, id: CardId) -> Option<&Card> {
        self.cards.get(&id)
    }

    pub fn get_card_mut(&mut self, id: CardId) -> Option<&mut Card> {
        self.cards.get_mut(&id)
    }

    #[must_use]
    pub fn get_stack(&self, id: StackId) -> Option<&Stack> {
        self.stacks.get(&id)
    }

    // === Factories ===

    /// Assign the next Z value.
    fn next_z(&mut self) -> u64 {
        self.z_counter += 1;
        self.z_counter
    }

    /// Register a new card, not yet in any stack.
    pub fn create_card(&mut self, def_id: DefId, data: CardData) -> CardId {
        let id = self.ids.next_card();
        self.cards.insert(id, Card { id, def_id, data });
        id
    }

    /// Create a stack from detached cards.
    ///
    /// Unknown ids, cards already in a stack and repeats are dropped. Returns
    /// `None`, creating nothing, when no card is left. The new stack is
    /// painted in front of everything else.
    pub fn create_stack(&mut self, x: f64, y: f64, cards: impl IntoIterator<Item = CardId>) -> Option<StackId> {
        let mut kept = CardList::new();
        for card in cards {
            if self.cards.contains_key(&card) && !kept.contains(&card) && self.stack_of(card).is_none() {
                kept.push(card);
            }
        }
        (!kept.is_empty()).then(|| self.place_stack(x, y, kept))
    }

    /// Stack cards the caller has just created or detached. No checks.
    pub(crate) fn place_stack(&mut self, x: f64, y: f64, cards: CardList) -> StackId {
        let id = self.ids.next_stack();
        let z = self.next_z();
        self.stacks.insert(id, Stack::with_cards(id, x, y, z, cards));
        id
    }

    /// Create one card in its own stack.
    pub fn spawn_card(&mut self, def_id: DefId, data: CardData, x: f64, y: f64) -> (StackId, CardId) {
        let card = self.create_card(def_id, data);
        let stack = self.place_stack(x, y, smallvec::smallvec![card]);
        (stack, card)
    }

    // === Removal (idempotent) ===

    /// Remove a card from the registry and from whatever stack holds it.
    /// A stack left empty is removed too.
    pub fn remove_card(&mut self, id: CardId) {
        self.cards.remove(&id);
        if let Some(stack_id) = self.stack_of(id) {
            let now_empty = self.stacks.get_mut(&stack_id).map_or(false, |stack| {
                stack.remove_card(id);
                stack.is_empty()
            });
            if now_empty {
                self.stacks.remove(&stack_id);
            }
        }
    }

    /// Remove a stack and all of its cards.
    pub fn remove_stack(&mut self, id: StackId) {
        if let Some(stack) = self.stacks.remove(&id) {
            for card in stack.cards() {
                self.cards.remove(card);
            }
        }
    }

    // === Composite operations ===

    /// Move a stack. Returns false if it does not exist.
    pub fn move_stack(&mut self, id: StackId, x: f64, y: f64) -> bool {
        match self.stacks.get_mut(&id) {
            Some(stack) => {
                stack.x = x;
                stack.y = y;
                true
            }
            None => false,
        }
    }

    /// Paint a stack in front of everything else.
    pub fn bring_to_front(&mut self, id: StackId) -> bool {
        if !self.stacks.contains_key(&id) {
            return false;
        }
        let z = self.next_z();
        if let Some(stack) = self.stacks.get_mut(&id) {
            stack.z = z;
        }
        true
    }

    /// Split `[index, len)` off into a new stack at `at`.
    pub fn split_stack(&mut self, id: StackId, index: usize, at: Point) -> Option<StackId> {
        let upper = self.stacks.get_mut(&id)?.split_from(index)?;
        Some(self.place_stack(at.x, at.y, upper))
    }

    /// Merge `source` onto `target`'s top.
    ///
    /// The source stack is removed and the target brought to front. A task
    /// card, if present, is kept as the face card. Merging a stack into
    /// itself, or with a missing stack, does nothing.
    pub fn merge_stacks(&mut self, target: StackId, source: StackId) -> bool {
        if target == source || !self.stacks.contains_key(&target) {
            return false;
        }
        let Some(source_stack) = self.stacks.remove(&source) else {
            return false;
        };

        let mut moving: CardList = source_stack.cards().iter().copied().collect();
        if let Some(stack) = self.stacks.get_mut(&target) {
            stack.merge_from(&mut moving);
        }
        self.ensure_task_face_card(target);
        self.bring_to_front(target);
        true
    }

    /// Split a stack into single-card stacks.
    ///
    /// The bottom card keeps the original stack; the others get new stacks
    /// offset by `spacing` each. Returns every resulting stack id in card
    /// order. A one-card stack is returned unchanged.
    pub fn unstack(&mut self, id: StackId, spacing: f64) -> Vec<StackId> {
        let Some(stack) = self.stacks.get(&id) else {
            return Vec::new();
        };
        let (x, y) = (stack.x, stack.y);
        let groups = stack.unstack_into_singles();
        if groups.len() <= 1 {
            return vec![id];
        }

        let mut result = vec![id];
        if let Some(stack) = self.stacks.get_mut(&id) {
            // keep only the bottom card here
            stack.take_range(1, stack.len());
        }
        for (i, group) in groups.into_iter().enumerate().skip(1) {
            let offset = spacing * i as f64;
            result.push(self.place_stack(x + offset, y + offset, group));
        }
        result
    }

    /// Take the bottom card into a new stack at `at`.
    ///
    /// Does nothing for a one-card stack.
    pub fn pop_bottom(&mut self, id: StackId, at: Point) -> Option<StackId> {
        let stack = self.stacks.get_mut(&id)?;
        if stack.len() < 2 {
            return None;
        }
        let card = stack.take_bottom()?;
        Some(self.place_stack(at.x, at.y, smallvec::smallvec![card]))
    }

    /// Move a task card to the top if the stack holds one below the top.
    pub fn ensure_task_face_card(&mut self, id: StackId) {
        let Some(stack) = self.stacks.get(&id) else {
            return;
        };
        let task_index = stack
            .cards()
            .iter()
            .rposition(|c| self.cards.get(c).map_or(false, |card| card.is(CardKind::Task)));

        if let Some(idx) = task_index {
            if idx + 1 != stack.len() {
                if let Some(stack) = self.stacks.get_mut(&id) {
                    stack.move_to_top(idx);
                }
            }
        }
    }

    /// Replace a stack's card list. Used by handlers that consume cards.
    pub(crate) fn retain_cards(&mut self, id: StackId, keep: impl Fn(CardId) -> bool) {
        let now_empty = self.stacks.get_mut(&id).map_or(false, |stack| {
            let kept: CardList = stack.cards().iter().copied().filter(|&c| keep(c)).collect();
            *stack = Stack::with_cards(stack.id, stack.x, stack.y, stack.z, kept);
            stack.is_empty()
        });
        if now_empty {
            self.stacks.remove(&id);
        }
    }

    // === Queries ===

    /// Stack holding a card.
    #[must_use]
    pub fn stack_of(&self, card: CardId) -> Option<StackId> {
        self.stacks
            .values()
            .find(|s| s.contains(card))
            .map(|s| s.id)
    }

    /// Cards of a stack, bottom to top.
    pub fn cards_in(&self, id: StackId) -> impl Iterator<Item = &Card> {
        self.stacks
            .get(&id)
            .into_iter()
            .flat_map(|s| s.cards().iter())
            .filter_map(|c| self.cards.get(c))
    }

    /// Face card of a stack.
    #[must_use]
    pub fn top_card(&self, id: StackId) -> Option<&Card> {
        self.stacks.get(&id)?.top().and_then(|c| self.cards.get(&c))
    }

    /// Kinds present in a stack.
    #[must_use]
    pub fn kinds_in(&self, id: StackId) -> BTreeSet<CardKind> {
        self.cards_in(id).filter_map(Card::kind).collect()
    }

    /// Definition ids in a stack, bottom to top.
    #[must_use]
    pub fn def_ids_in(&self, id: StackId) -> Vec<DefId> {
        self.cards_in(id).map(|c| c.def_id.clone()).collect()
    }

    /// First card of `kind` in a stack, from the top.
    #[must_use]
    pub fn find_in(&self, id: StackId, kind: CardKind) -> Option<&Card> {
        let stack = self.stacks.get(&id)?;
        stack
            .cards()
            .iter()
            .rev()
            .filter_map(|c| self.cards.get(c))
            .find(|c| c.is(kind))
    }

    /// How many cards on the board have this definition id.
    #[must_use]
    pub fn count_def_id(&self, def_id: &DefId) -> usize {
        self.cards.values().filter(|c| &c.def_id == def_id).count()
    }

    /// Stacks containing at least one card of `kind`, ascending by id.
    #[must_use]
    pub fn stacks_with_kind(&self, kind: CardKind) -> Vec<StackId> {
        let mut ids: Vec<_> = self
            .stacks
            .values()
            .filter(|s| {
                s.cards()
                    .iter()
                    .any(|c| self.cards.get(c).map_or(false, |card| card.is(kind)))
            })
            .map(|s| s.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Task card linked to `task_id`, with its stack.
    #[must_use]
    pub fn find_task_card(&self, task_id: &str) -> Option<(StackId, CardId)> {
        let card = self
            .cards
            .values()
            .find(|c| c.is(CardKind::Task) && c.task_id() == Some(task_id))?;
        Some((self.stack_of(card.id)?, card.id))
    }

    /// Verify the stack/card invariants.
    ///
    /// Every stacked card exists exactly once, no card sits in two stacks and
    /// no stack is empty.
    pub fn check_invariants(&self) -> Result<(), String> {
        let mut seen = BTreeSet::new();
        for stack in self.stacks.values() {
            if stack.is_empty() {
                return Err(format!("{} is empty", stack.id));
            }
            for &card in stack.cards() {
                if !self.cards.contains_key(&card) {
                    return Err(format!("{} references missing {}", stack.id, card));
                }
                if !seen.insert(card) {
                    return Err(format!("{card} appears in more than one stack"));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn(board: &mut BoardState, def: &str) -> (StackId, CardId) {
        board.spawn_card(def.into(), CardData::default(), 0.0, 0.0)
    }

    #[test]
    fn test_spawn_assigns_fresh_ids_and_z() {
        let mut board = BoardState::new();

        let (s1, c1) = spawn(&mut board, "villager.basic");
        let (s2, c2) = spawn(&mut board, "task.blank");

        assert_ne!(s1, s2);
        assert_ne!(c1, c2);
        assert_eq!(board.z_counter(), 2);
        assert!(board.get_stack(s2).unwrap().z > board.get_stack(s1).unwrap().z);
        assert!(board.check_invariants().is_ok());
    }

    #[test]
    fn test_merge_keeps_task_on_top() {
        let mut board = BoardState::new();
        let (task_stack, task) = spawn(&mut board, "task.blank");
        let (villager_stack, villager) = spawn(&mut board, "villager.basic");

        assert!(board.merge_stacks(task_stack, villager_stack));

        let stack = board.get_stack(task_stack).unwrap();
        assert_eq!(stack.cards(), &[villager, task]);
        assert!(board.get_stack(villager_stack).is_none());
        assert_eq!(stack.z, board.z_counter());
        assert!(board.check_invariants().is_ok());
    }

    #[test]
    fn test_merge_into_self_is_noop() {
        let mut board = BoardState::new();
        let (s, _) = spawn(&mut board, "task.blank");
        let z = board.z_counter();

        assert!(!board.merge_stacks(s, s));
        assert!(!board.merge_stacks(s, StackId(999)));
        assert_eq!(board.z_counter(), z);
        assert_eq!(board.stack_count(), 1);
    }

    #[test]
    fn test_removal_is_idempotent() {
        let mut board = BoardState::new();
        let (s, c) = spawn(&mut board, "loot.coin");

        board.remove_card(c);
        assert!(board.get_stack(s).is_none());
        board.remove_card(c);
        board.remove_stack(s);
        board.remove_stack(StackId(1234));
        assert!(board.is_empty());
        assert_eq!(board.card_count(), 0);
    }

    #[test]
    fn test_split_and_unstack() {
        let mut board = BoardState::new();
        let a = board.create_card("villager.a".into(), CardData::default());
        let b = board.create_card("villager.b".into(), CardData::default());
        let c = board.create_card("villager.c".into(), CardData::default());
        let s = board.create_stack(10.0, 10.0, [a, b, c]).unwrap();

        assert!(board.split_stack(s, 0, Point::new(0.0, 0.0)).is_none());
        let upper = board.split_stack(s, 2, Point::new(50.0, 50.0)).unwrap();
        assert_eq!(board.get_stack(upper).unwrap().cards(), &[c]);

        let singles = board.unstack(s, 20.0);
        assert_eq!(singles.len(), 2);
        assert_eq!(board.get_stack(singles[0]).unwrap().cards(), &[a]);
        assert_eq!(board.get_stack(singles[1]).unwrap().cards(), &[b]);
        assert_eq!(board.get_stack(singles[1]).unwrap().x, 30.0);

        assert_eq!(board.unstack(upper, 20.0), vec![upper]);
        assert!(board.check_invariants().is_ok());
    }

    #[test]
    fn test_create_stack_skips_unusable_cards() {
        let mut board = BoardState::new();
        let (held, taken) = spawn(&mut board, "villager.basic");
        let free = board.create_card("food.berry".into(), CardData::default());

        assert_eq!(board.create_stack(0.0, 0.0, Vec::<CardId>::new()), None);
        assert_eq!(board.create_stack(0.0, 0.0, [CardId(999)]), None);
        assert_eq!(board.create_stack(0.0, 0.0, [taken]), None);
        assert_eq!(board.stack_count(), 1);

        let s = board.create_stack(0.0, 0.0, [taken, free, free, CardId(999)]).unwrap();
        assert_eq!(board.get_stack(s).unwrap().cards(), &[free]);
        assert_eq!(board.get_stack(held).unwrap().cards(), &[taken]);
        assert!(board.check_invariants().is_ok());
    }

    #[test]
    fn test_pop_bottom() {
        let mut board = BoardState::new();
        let a = board.create_card("food.berry".into(), CardData::default());
        let b = board.create_card("food.berry".into(), CardData::default());
        let s = board.create_stack(0.0, 0.0, [a, b]).unwrap();

        let popped = board.pop_bottom(s, Point::new(5.0, 5.0)).unwrap();
        assert_eq!(board.get_stack(popped).unwrap().cards(), &[a]);
        assert_eq!(board.get_stack(s).unwrap().cards(), &[b]);
        assert!(board.pop_bottom(s, Point::new(0.0, 0.0)).is_none());
    }

    #[test]
    fn test_queries() {
        let mut board = BoardState::new();
        let task = board.create_card(
            "task.instance".into(),
            [("taskId".to_string(), "t-9".into())].into_iter().collect(),
        );
        let pin = board.create_card("mod.deadline_pin".into(), CardData::default());
        let s = board.create_stack(0.0, 0.0, [pin, task]).unwrap();

        assert_eq!(board.find_task_card("t-9"), Some((s, task)));
        assert_eq!(board.find_task_card("t-0"), None);
        assert!(board.kinds_in(s).contains(&CardKind::Modifier));
        assert_eq!(board.count_def_id(&"mod.deadline_pin".into()), 1);
        assert_eq!(board.stacks_with_kind(CardKind::Task), vec![s]);
        assert_eq!(board.top_card(s).map(|c| c.id), Some(task));
        assert_eq!(board.find_in(s, CardKind::Modifier).map(|c| c.id), Some(pin));
    }

    #[test]
    fn test_json_round_trip_resumes_ids() {
        let mut board = BoardState::new();
        spawn(&mut board, "task.blank");
        let (_, last_card) = spawn(&mut board, "villager.basic");
        board.set_pan(3.0, -4.0);

        let json = serde_json::to_string(&board).unwrap();
        let mut loaded: BoardState = serde_json::from_str(&json).unwrap();

        assert_eq!(loaded, board);
        assert_eq!(loaded.pan(), Point::new(3.0, -4.0));

        let (fresh_stack, fresh_card) = spawn(&mut loaded, "loot.coin");
        assert!(fresh_card.raw() > last_card.raw());
        assert!(board.get_stack(fresh_stack).is_none());
    }
}
