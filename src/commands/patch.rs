//! Change summary returned by every command.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::core::ids::StackId;

/// Stacks a command created, updated or removed, plus command-specific info.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Patch {
    pub created: Vec<StackId>,
    pub updated: Vec<StackId>,
    pub removed: Vec<StackId>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub info: Map<String, Value>,
}

impl Patch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn created(mut self, id: StackId) -> Self {
        self.created.push(id);
        self
    }

    #[must_use]
    pub fn created_all(mut self, ids: impl IntoIterator<Item = StackId>) -> Self {
        self.created.extend(ids);
        self
    }

    #[must_use]
    pub fn updated(mut self, id: StackId) -> Self {
        if !self.updated.contains(&id) {
            self.updated.push(id);
        }
        self
    }

    #[must_use]
    pub fn removed(mut self, id: StackId) -> Self {
        self.removed.push(id);
        self
    }

    #[must_use]
    pub fn with_info(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.info.insert(key.to_string(), value.into());
        self
    }

    /// Nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}
