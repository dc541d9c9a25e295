//! Free-form instance data carried by each card.
//!
//! A task card carries its `title` and linked `taskId`, a resource card its
//! remaining `charges`, a food card its `amount`. The engine only interprets
//! the keys it owns (see the constants below); everything else round-trips.
//!
//! ## DataValue Types
//!
//! - `Int`: counters (charges, amounts)
//! - `Float`: fractional values
//! - `Bool`: flags
//! - `Text`: strings (titles, linked ids)
//! - `TextList`: string lists (tags)

use rustc_hash::FxHashMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Linked task id on task cards.
pub const KEY_TASK_ID: &str = "taskId";
/// Display title on task cards.
pub const KEY_TITLE: &str = "title";
/// Remaining gather cycles on resource cards.
pub const KEY_CHARGES: &str = "charges";
/// Stack amount on food and loot cards.
pub const KEY_AMOUNT: &str = "amount";

/// A single value in a card's data bag.
///
/// Human-readable formats (JSON) see a bare value, so the bag reads as plain
/// JSON on the wire. Binary formats (bincode) get a tagged enum, since they
/// cannot guess a variant from the input.
#[derive(Clone, Debug, PartialEq)]
pub enum DataValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    TextList(Vec<String>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PlainValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    TextList(Vec<String>),
}

#[derive(Deserialize)]
enum TaggedValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    TextList(Vec<String>),
}

impl Serialize for DataValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            return match self {
                DataValue::Bool(v) => serializer.serialize_bool(*v),
                DataValue::Int(v) => serializer.serialize_i64(*v),
                DataValue::Float(v) => serializer.serialize_f64(*v),
                DataValue::Text(v) => serializer.serialize_str(v),
                DataValue::TextList(v) => v.serialize(serializer),
            };
        }
        match self {
            DataValue::Bool(v) => serializer.serialize_newtype_variant("TaggedValue", 0, "Bool", v),
            DataValue::Int(v) => serializer.serialize_newtype_variant("TaggedValue", 1, "Int", v),
            DataValue::Float(v) => serializer.serialize_newtype_variant("TaggedValue", 2, "Float", v),
            DataValue::Text(v) => serializer.serialize_newtype_variant("TaggedValue", 3, "Text", v),
            DataValue::TextList(v) => serializer.serialize_newtype_variant("TaggedValue", 4, "TextList", v),
        }
    }
}

impl<'de> Deserialize<'de> for DataValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            return Ok(match PlainValue::deserialize(deserializer)? {
                PlainValue::Bool(v) => DataValue::Bool(v),
                PlainValue::Int(v) => DataValue::Int(v),
                PlainValue::Float(v) => DataValue::Float(v),
                PlainValue::Text(v) => DataValue::Text(v),
                PlainValue::TextList(v) => DataValue::TextList(v),
            });
        }
        Ok(match TaggedValue::deserialize(deserializer)? {
            TaggedValue::Bool(v) => DataValue::Bool(v),
            TaggedValue::Int(v) => DataValue::Int(v),
            TaggedValue::Float(v) => DataValue::Float(v),
            TaggedValue::Text(v) => DataValue::Text(v),
            TaggedValue::TextList(v) => DataValue::TextList(v),
        })
    }
}

impl DataValue {
    /// Get as integer. Floats with no fractional part also qualify.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            DataValue::Int(v) => Some(*v),
            DataValue::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DataValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            DataValue::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text_list(&self) -> Option<&[String]> {
        match self {
            DataValue::TextList(v) => Some(v),
            _ => None,
        }
    }
}

impl From<i64> for DataValue {
    fn from(v: i64) -> Self {
        DataValue::Int(v)
    }
}

impl From<i32> for DataValue {
    fn from(v: i32) -> Self {
        DataValue::Int(i64::from(v))
    }
}

impl From<f64> for DataValue {
    fn from(v: f64) -> Self {
        DataValue::Float(v)
    }
}

impl From<bool> for DataValue {
    fn from(v: bool) -> Self {
        DataValue::Bool(v)
    }
}

impl From<String> for DataValue {
    fn from(v: String) -> Self {
        DataValue::Text(v)
    }
}

impl From<&str> for DataValue {
    fn from(v: &str) -> Self {
        DataValue::Text(v.to_string())
    }
}

impl From<Vec<String>> for DataValue {
    fn from(v: Vec<String>) -> Self {
        DataValue::TextList(v)
    }
}

/// The data bag.
pub type CardData = FxHashMap<String, DataValue>;

/// Convert a JSON object into a data bag, skipping values with no
/// `DataValue` form (nulls, nested objects).
#[must_use]
pub fn data_from_json(map: &serde_json::Map<String, serde_json::Value>) -> CardData {
    map.iter()
        .filter_map(|(k, v)| {
            serde_json::from_value::<DataValue>(v.clone())
                .ok()
                .map(|dv| (k.clone(), dv))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_value_accessors() {
        assert_eq!(DataValue::Int(5).as_int(), Some(5));
        assert_eq!(DataValue::Float(3.0).as_int(), Some(3));
        assert_eq!(DataValue::Float(3.5).as_int(), None);
        assert_eq!(DataValue::Bool(true).as_bool(), Some(true));
        assert_eq!(DataValue::from("hi").as_text(), Some("hi"));
        assert_eq!(DataValue::Int(1).as_text(), None);
    }

    #[test]
    fn test_untagged_wire_form() {
        let mut data = CardData::default();
        data.insert(KEY_TITLE.into(), "Write report".into());
        data.insert(KEY_CHARGES.into(), 3i64.into());

        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["title"], "Write report");
        assert_eq!(json["charges"], 3);

        let back: CardData = serde_json::from_value(json).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn test_binary_round_trip() {
        let mut data = CardData::default();
        data.insert(KEY_TITLE.into(), "Write report".into());
        data.insert(KEY_AMOUNT.into(), 2i64.into());
        data.insert("ratio".into(), 0.5.into());
        data.insert("tags".into(), vec!["a".to_string()].into());

        let bytes = bincode::serialize(&data).unwrap();
        let back: CardData = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn test_data_from_json_skips_unsupported() {
        let json = serde_json::json!({ "title": "x", "nested": { "a": 1 }, "n": null, "amount": 2 });
        let data = data_from_json(json.as_object().unwrap());

        assert_eq!(data.len(), 2);
        assert_eq!(data.get(KEY_AMOUNT).and_then(DataValue::as_int), Some(2));
    }
}
