//! Error types for board commands.

use thiserror::Error;

/// Broad error class, for callers that map errors to responses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    /// Missing or mis-typed input. Nothing was mutated.
    BadArgument,
    /// A referenced stack, card, task or deck does not exist.
    NotFound,
    /// Validator rejection, insufficient funds, wrong card kind.
    RuleViolation,
    /// The active configuration lacks an entry the command needs.
    Configuration,
    /// Persistence or serialization failure.
    Internal,
}

#[derive(Error, Debug)]
pub enum BoardError {
    #[error("bad argument '{field}': {reason}")]
    BadArgument { field: String, reason: String },

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("{what} not found: {id}")]
    NotFound { what: &'static str, id: String },

    #[error("rule violation: {0}")]
    RuleViolation(String),

    #[error("insufficient {what}: need {needed}, have {available}")]
    InsufficientFunds {
        what: String,
        needed: i64,
        available: i64,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl BoardError {
    pub fn bad_argument(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::BadArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn not_found(what: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            what,
            id: id.to_string(),
        }
    }

    pub fn rule(msg: impl Into<String>) -> Self {
        Self::RuleViolation(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Taxonomy class of this error.
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            BoardError::BadArgument { .. } | BoardError::UnknownCommand(_) => ErrorClass::BadArgument,
            BoardError::NotFound { .. } => ErrorClass::NotFound,
            BoardError::RuleViolation(_) | BoardError::InsufficientFunds { .. } => {
                ErrorClass::RuleViolation
            }
            BoardError::Config(_) => ErrorClass::Configuration,
            BoardError::Io(_) | BoardError::Serialization(_) => ErrorClass::Internal,
        }
    }
}

impl From<serde_json::Error> for BoardError {
    fn from(err: serde_json::Error) -> Self {
        BoardError::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for BoardError {
    fn from(err: bincode::Error) -> Self {
        BoardError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BoardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classes() {
        assert_eq!(BoardError::bad_argument("x", "missing").class(), ErrorClass::BadArgument);
        assert_eq!(BoardError::UnknownCommand("nope".into()).class(), ErrorClass::BadArgument);
        assert_eq!(BoardError::not_found("stack", 3).class(), ErrorClass::NotFound);
        assert_eq!(BoardError::rule("no").class(), ErrorClass::RuleViolation);
        assert_eq!(
            BoardError::InsufficientFunds { what: "coin".into(), needed: 2, available: 1 }.class(),
            ErrorClass::RuleViolation
        );
        assert_eq!(BoardError::config("deck").class(), ErrorClass::Configuration);
    }

    #[test]
    fn test_messages() {
        let err = BoardError::bad_argument("stackId", "expected an integer");
        assert_eq!(err.to_string(), "bad argument 'stackId': expected an integer");

        let err = BoardError::not_found("task", "t-1");
        assert_eq!(err.to_string(), "task not found: t-1");
    }
}
