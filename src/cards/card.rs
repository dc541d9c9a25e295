//! Card instances on a board.
//!
//! A card has no reference to the stack holding it; containment is tracked
//! by the board's stacks alone.

use serde::{Deserialize, Serialize};

use super::data::{CardData, DataValue, KEY_AMOUNT, KEY_CHARGES, KEY_TASK_ID, KEY_TITLE};
use crate::core::ids::CardId;
use crate::core::kind::{CardKind, DefId};

/// A card instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Card {
    /// Unique id on its board.
    pub id: CardId,

    /// Definition id, e.g. `"task.instance"`.
    #[serde(rename = "defId")]
    pub def_id: DefId,

    /// Free-form instance data.
    #[serde(default)]
    pub data: CardData,
}

impl Card {
    /// Create a card with an empty data bag.
    #[must_use]
    pub fn new(id: CardId, def_id: DefId) -> Self {
        Self {
            id,
            def_id,
            data: CardData::default(),
        }
    }

    /// Builder-style data insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<DataValue>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Card kind, if the definition prefix is known.
    #[must_use]
    pub fn kind(&self) -> Option<CardKind> {
        self.def_id.kind()
    }

    #[must_use]
    pub fn is(&self, kind: CardKind) -> bool {
        self.def_id.is(kind)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&DataValue> {
        self.data.get(key)
    }

    /// Integer value with a default.
    #[must_use]
    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        self.get(key).and_then(DataValue::as_int).unwrap_or(default)
    }

    #[must_use]
    pub fn get_text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(DataValue::as_text)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<DataValue>) {
        self.data.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<DataValue> {
        self.data.remove(key)
    }

    /// Linked task id on task cards.
    #[must_use]
    pub fn task_id(&self) -> Option<&str> {
        self.get_text(KEY_TASK_ID)
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.get_text(KEY_TITLE)
    }

    /// Remaining charges, or `default` when never set.
    #[must_use]
    pub fn charges(&self, default: i64) -> i64 {
        self.get_int(KEY_CHARGES, default)
    }

    /// Stack amount, defaulting to one.
    #[must_use]
    pub fn amount(&self) -> i64 {
        self.get_int(KEY_AMOUNT, 1)
    }
}
