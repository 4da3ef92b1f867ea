//! Validation outcomes and error payloads.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single validation error as surfaced to a binding layer.
///
/// Payloads are opaque to the engine: they are stored, ordered and returned
/// but never inspected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorPayload {
    /// Plain message text.
    Message(String),
    /// Message with a machine-readable code.
    Coded { code: String, message: String },
}

impl ErrorPayload {
    /// Creates a plain message payload.
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    /// Creates a payload carrying an error code.
    pub fn coded(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Coded {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Returns the human-readable message.
    pub fn text(&self) -> &str {
        match self {
            Self::Message(message) => message,
            Self::Coded { message, .. } => message,
        }
    }

    /// Returns the error code, if any.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Message(_) => None,
            Self::Coded { code, .. } => Some(code),
        }
    }
}

impl fmt::Display for ErrorPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message(message) => write!(f, "{}", message),
            Self::Coded { code, message } => write!(f, "[{}] {}", code, message),
        }
    }
}

impl From<&str> for ErrorPayload {
    fn from(message: &str) -> Self {
        Self::Message(message.to_string())
    }
}

impl From<String> for ErrorPayload {
    fn from(message: String) -> Self {
        Self::Message(message)
    }
}

/// Result of running one rule against one value.
///
/// A valid outcome never carries errors. Use [`ValidationOutcome::VALID`]
/// rather than constructing a fresh valid value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationOutcome {
    errors: Vec<ErrorPayload>,
}

impl ValidationOutcome {
    /// The canonical passing outcome.
    pub const VALID: ValidationOutcome = ValidationOutcome { errors: Vec::new() };

    /// Creates a failing outcome with a single error.
    pub fn error(error: impl Into<ErrorPayload>) -> Self {
        Self {
            errors: vec![error.into()],
        }
    }

    /// Builds an outcome from any number of errors; valid iff there are none.
    pub fn from_errors<I, E>(errors: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<ErrorPayload>,
    {
        Self {
            errors: errors.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns `error` as a failure unless `ok` holds.
    pub fn check(ok: bool, error: impl Into<ErrorPayload>) -> Self {
        if ok { Self::VALID } else { Self::error(error) }
    }

    /// Whether the check passed.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Whether the check failed.
    pub fn is_invalid(&self) -> bool {
        !self.is_valid()
    }

    /// Errors in the order the rule reported them.
    pub fn errors(&self) -> &[ErrorPayload] {
        &self.errors
    }

    /// Consumes the outcome, returning its errors.
    pub fn into_errors(self) -> Vec<ErrorPayload> {
        self.errors
    }

    /// Combines two outcomes, keeping `self`'s errors first.
    pub fn merge(mut self, other: ValidationOutcome) -> Self {
        self.errors.extend(other.errors);
        self
    }
}
