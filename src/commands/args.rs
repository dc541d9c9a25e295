//! Loosely typed command arguments.
//!
//! Commands arrive as a name plus a JSON object. [`Args`] wraps the object
//! and exposes typed getters; anything missing or mis-typed is a
//! `BadArgument` error naming the field. `null` counts as absent.

use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::core::error::{BoardError, Result};
use crate::core::ids::StackId;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Args(Map<String, Value>);

impl Args {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a JSON value, which must be an object (or null for no args).
    pub fn from_json(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::default()),
            other => Err(BoardError::bad_argument("args", format!("expected an object, got {other}"))),
        }
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    fn raw(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    fn missing(key: &str) -> BoardError {
        BoardError::bad_argument(key, "missing")
    }

    /// A stack id: a non-negative integer, or a numeric string.
    pub fn opt_stack_id(&self, key: &str) -> Result<Option<StackId>> {
        let Some(value) = self.raw(key) else {
            return Ok(None);
        };
        let id = match value {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        };
        id.map(|raw| Some(StackId(raw)))
            .ok_or_else(|| BoardError::bad_argument(key, "expected a stack id"))
    }

    pub fn stack_id(&self, key: &str) -> Result<StackId> {
        self.opt_stack_id(key)?.ok_or_else(|| Self::missing(key))
    }

    pub fn opt_f64(&self, key: &str) -> Result<Option<f64>> {
        match self.raw(key) {
            None => Ok(None),
            Some(Value::Number(n)) => n
                .as_f64()
                .filter(|v| v.is_finite())
                .map(Some)
                .ok_or_else(|| BoardError::bad_argument(key, "expected a finite number")),
            Some(_) => Err(BoardError::bad_argument(key, "expected a number")),
        }
    }

    pub fn f64(&self, key: &str) -> Result<f64> {
        self.opt_f64(key)?.ok_or_else(|| Self::missing(key))
    }

    pub fn opt_u64(&self, key: &str) -> Result<Option<u64>> {
        match self.raw(key) {
            None => Ok(None),
            Some(Value::Number(n)) => n
                .as_u64()
                .map(Some)
                .ok_or_else(|| BoardError::bad_argument(key, "expected a non-negative integer")),
            Some(_) => Err(BoardError::bad_argument(key, "expected an integer")),
        }
    }

    pub fn usize(&self, key: &str) -> Result<usize> {
        let raw = self.opt_u64(key)?.ok_or_else(|| Self::missing(key))?;
        usize::try_from(raw).map_err(|_| BoardError::bad_argument(key, "out of range"))
    }

    /// A string; blank strings count as absent.
    pub fn opt_str(&self, key: &str) -> Result<Option<&str>> {
        match self.raw(key) {
            None => Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(BoardError::bad_argument(key, "expected a string")),
        }
    }

    pub fn str(&self, key: &str) -> Result<&str> {
        self.opt_str(key)?.ok_or_else(|| Self::missing(key))
    }

    pub fn opt_object(&self, key: &str) -> Result<Option<&Map<String, Value>>> {
        match self.raw(key) {
            None => Ok(None),
            Some(Value::Object(map)) => Ok(Some(map)),
            Some(_) => Err(BoardError::bad_argument(key, "expected an object")),
        }
    }

    /// An ISO `YYYY-MM-DD` date.
    pub fn opt_date(&self, key: &str) -> Result<Option<NaiveDate>> {
        self.opt_str(key)?
            .map(|s| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .map_err(|e| BoardError::bad_argument(key, format!("expected YYYY-MM-DD: {e}")))
            })
            .transpose()
    }
}

impl From<Map<String, Value>> for Args {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stack_id_forms() {
        let args = Args::from_json(json!({ "a": 5, "b": "7", "c": -1, "d": "x", "e": null })).unwrap();

        assert_eq!(args.stack_id("a").unwrap(), StackId(5));
        assert_eq!(args.stack_id("b").unwrap(), StackId(7));
        assert!(matches!(args.stack_id("c"), Err(BoardError::BadArgument { .. })));
        assert!(args.stack_id("d").is_err());
        assert_eq!(args.opt_stack_id("e").unwrap(), None);
        assert!(args.stack_id("missing").is_err());
    }

    #[test]
    fn test_numbers_and_strings() {
        let args = Args::new()
            .with("x", 1.5)
            .with("n", 3)
            .with("title", "  ")
            .with("name", "deck");

        assert_eq!(args.f64("x").unwrap(), 1.5);
        assert_eq!(args.f64("n").unwrap(), 3.0);
        assert_eq!(args.usize("n").unwrap(), 3);
        assert!(args.usize("x").is_err());
        assert_eq!(args.opt_str("title").unwrap(), None);
        assert_eq!(args.str("name").unwrap(), "deck");
        assert!(args.str("x").is_err());
    }

    #[test]
    fn test_dates() {
        let args = Args::new().with("date", "2024-03-01").with("bad", "03/01/2024");
        assert_eq!(args.opt_date("date").unwrap(), NaiveDate::from_ymd_opt(2024, 3, 1));
        assert!(args.opt_date("bad").is_err());
        assert_eq!(args.opt_date("none").unwrap(), None);
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(Args::from_json(json!([1, 2])).is_err());
        assert_eq!(Args::from_json(Value::Null).unwrap(), Args::new());
    }
}
