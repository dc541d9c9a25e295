//! Card kinds and definition ids.
//!
//! A definition id is a dotted string such as `"task.instance"` or
//! `"mod.deadline_pin"`. The prefix before the first dot selects the card's
//! [`CardKind`]; the wire form of the id is never changed.

use serde::{Deserialize, Serialize};

/// Closed set of card kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardKind {
    Task,
    Villager,
    Modifier,
    Zombie,
    Resource,
    Food,
    Loot,
    Deck,
    Building,
}

/// Definition-id prefix to kind lookup.
const PREFIXES: &[(&str, CardKind)] = &[
    ("task", CardKind::Task),
    ("villager", CardKind::Villager),
    ("mod", CardKind::Modifier),
    ("modifier", CardKind::Modifier),
    ("zombie", CardKind::Zombie),
    ("resource", CardKind::Resource),
    ("food", CardKind::Food),
    ("loot", CardKind::Loot),
    ("deck", CardKind::Deck),
    ("building", CardKind::Building),
];

impl CardKind {
    /// All kinds, in declaration order.
    pub const ALL: [CardKind; 9] = [
        CardKind::Task,
        CardKind::Villager,
        CardKind::Modifier,
        CardKind::Zombie,
        CardKind::Resource,
        CardKind::Food,
        CardKind::Loot,
        CardKind::Deck,
        CardKind::Building,
    ];

    /// Kind for a definition-id prefix.
    #[must_use]
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        PREFIXES
            .iter()
            .find(|(p, _)| *p == prefix)
            .map(|&(_, kind)| kind)
    }

    /// Name used by stacking rules (`"modifier"`, not `"mod"`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            CardKind::Task => "task",
            CardKind::Villager => "villager",
            CardKind::Modifier => "modifier",
            CardKind::Zombie => "zombie",
            CardKind::Resource => "resource",
            CardKind::Food => "food",
            CardKind::Loot => "loot",
            CardKind::Deck => "deck",
            CardKind::Building => "building",
        }
    }

    /// Prefix used when building definition ids for this kind.
    #[must_use]
    pub const fn def_prefix(self) -> &'static str {
        match self {
            CardKind::Modifier => "mod",
            other => other.as_str(),
        }
    }
}

impl std::fmt::Display for CardKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CardKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_prefix(s).ok_or_else(|| format!("unknown card kind '{s}'"))
    }
}

/// Dotted card definition id.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DefId(pub String);

impl DefId {
    /// Wrap a definition id string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Build `"<prefix>.<sub_id>"` for a kind.
    #[must_use]
    pub fn of(kind: CardKind, sub_id: &str) -> Self {
        Self(format!("{}.{}", kind.def_prefix(), sub_id))
    }

    /// The raw string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Prefix before the first dot (the whole id if there is no dot).
    #[must_use]
    pub fn prefix(&self) -> &str {
        self.0.split_once('.').map_or(self.0.as_str(), |(p, _)| p)
    }

    /// Part after the first dot, if any.
    #[must_use]
    pub fn sub_id(&self) -> Option<&str> {
        self.0.split_once('.').map(|(_, rest)| rest)
    }

    /// Kind derived from the prefix.
    #[must_use]
    pub fn kind(&self) -> Option<CardKind> {
        CardKind::from_prefix(self.prefix())
    }

    /// True if the prefix maps to `kind`.
    #[must_use]
    pub fn is(&self, kind: CardKind) -> bool {
        self.kind() == Some(kind)
    }
}

impl From<&str> for DefId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for DefId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for DefId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_def_id() {
        assert_eq!(DefId::from("task.instance").kind(), Some(CardKind::Task));
        assert_eq!(DefId::from("mod.deadline_pin").kind(), Some(CardKind::Modifier));
        assert_eq!(DefId::from("zombie.default_zombie").kind(), Some(CardKind::Zombie));
        assert_eq!(DefId::from("weird.thing").kind(), None);
        assert_eq!(DefId::from("villager").kind(), Some(CardKind::Villager));
    }

    #[test]
    fn test_sub_id() {
        let id = DefId::from("resource.berry.bush");
        assert_eq!(id.prefix(), "resource");
        assert_eq!(id.sub_id(), Some("berry.bush"));
        assert_eq!(DefId::from("deck").sub_id(), None);
    }

    #[test]
    fn test_of_uses_wire_prefix() {
        assert_eq!(DefId::of(CardKind::Modifier, "recurring").as_str(), "mod.recurring");
        assert_eq!(DefId::of(CardKind::Loot, "coin").as_str(), "loot.coin");
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(CardKind::Modifier.as_str(), "modifier");
        assert_eq!("mod".parse::<CardKind>(), Ok(CardKind::Modifier));
        assert!("nope".parse::<CardKind>().is_err());
    }

    #[test]
    fn test_kind_serde() {
        let json = serde_json::to_string(&CardKind::Villager).unwrap();
        assert_eq!(json, "\"villager\"");
    }
}
