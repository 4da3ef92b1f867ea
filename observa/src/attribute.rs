//! Declarative constraints and the oracle that interprets them.
//!
//! A [`Constraint`] is metadata attached to a property in its
//! [`Schema`](crate::schema::Schema). The engine never evaluates constraints
//! itself; it hands them to an [`AttributeOracle`] together with the current
//! value and stores whatever messages come back. [`BuiltinOracle`] covers the
//! common length, range, pattern and email checks.

use std::any::Any;
use std::fmt;

use regex::Regex;

use crate::outcome::ErrorPayload;

/// Kind of check a [`Constraint`] describes.
#[derive(Debug, Clone)]
pub enum ConstraintKind {
    Required,
    MinLength(usize),
    MaxLength(usize),
    Range { min: f64, max: f64 },
    /// `regex` is anchored to the whole text; `source` is the pattern as declared.
    Pattern { regex: Regex, source: String },
    Email,
}

/// A declarative check with an optional custom message.
///
/// A custom message may contain `{0}`, which is replaced by the property
/// name.
#[derive(Debug, Clone)]
pub struct Constraint {
    kind: ConstraintKind,
    message: Option<String>,
}

impl Constraint {
    fn of(kind: ConstraintKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }

    pub fn required() -> Self {
        Self::of(ConstraintKind::Required)
    }

    pub fn min_length(min: usize) -> Self {
        Self::of(ConstraintKind::MinLength(min))
    }

    pub fn max_length(max: usize) -> Self {
        Self::of(ConstraintKind::MaxLength(max))
    }

    pub fn range(min: f64, max: f64) -> Self {
        Self::of(ConstraintKind::Range { min, max })
    }

    /// Requires the whole text to match `pattern`.
    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{})$", pattern))?;
        Ok(Self::of(ConstraintKind::Pattern {
            regex,
            source: pattern.to_string(),
        }))
    }

    pub fn email() -> Self {
        Self::of(ConstraintKind::Email)
    }

    /// Replaces the default message.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn kind(&self) -> &ConstraintKind {
        &self.kind
    }

    fn default_message(&self, property: &str) -> String {
        match &self.kind {
            ConstraintKind::Required => format!("The {} field is required.", property),
            ConstraintKind::MinLength(min) => format!(
                "The field {} must be a string with a minimum length of {}.",
                property, min
            ),
            ConstraintKind::MaxLength(max) => format!(
                "The field {} must be a string with a maximum length of {}.",
                property, max
            ),
            ConstraintKind::Range { min, max } => {
                format!("The field {} must be between {} and {}.", property, min, max)
            }
            ConstraintKind::Pattern { source, .. } => format!(
                "The field {} must match the regular expression '{}'.",
                property, source
            ),
            ConstraintKind::Email => {
                format!("The {} field is not a valid e-mail address.", property)
            }
        }
    }

    fn failure(&self, property: &str) -> ErrorPayload {
        match &self.message {
            Some(message) => ErrorPayload::Message(message.replace("{0}", property)),
            None => ErrorPayload::Message(self.default_message(property)),
        }
    }
}

/// External collaborator that evaluates declarative constraints.
pub trait AttributeOracle {
    /// Checks one property value; an empty result means it passed.
    fn check(
        &self,
        object: &dyn Any,
        property: &str,
        value: &dyn Any,
        constraints: &[Constraint],
    ) -> Vec<ErrorPayload>;

    /// Checks object-level metadata during an all-properties sweep.
    fn check_object(&self, _object: &dyn Any) -> Vec<ErrorPayload> {
        Vec::new()
    }
}

/// Scalar view of a property value.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Scalar<'a> {
    Text(Option<&'a str>),
    /// A `None` held by an optional non-text value.
    Absent,
    Number(f64),
    Bool(bool),
}

impl fmt::Display for Scalar<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Text(_) => write!(f, "text"),
            Scalar::Absent => write!(f, "absent value"),
            Scalar::Number(_) => write!(f, "number"),
            Scalar::Bool(_) => write!(f, "bool"),
        }
    }
}

fn scalar(value: &dyn Any) -> Option<Scalar<'_>> {
    if let Some(s) = value.downcast_ref::<String>() {
        return Some(Scalar::Text(Some(s.as_str())));
    }
    if let Some(s) = value.downcast_ref::<&'static str>() {
        return Some(Scalar::Text(Some(*s)));
    }
    if let Some(s) = value.downcast_ref::<Option<String>>() {
        return Some(Scalar::Text(s.as_deref()));
    }
    if let Some(b) = value.downcast_ref::<bool>() {
        return Some(Scalar::Bool(*b));
    }
    if let Some(b) = value.downcast_ref::<Option<bool>>() {
        return Some(b.map_or(Scalar::Absent, Scalar::Bool));
    }

    macro_rules! number {
        ($($ty:ty),*) => {
            $(
                if let Some(n) = value.downcast_ref::<$ty>() {
                    return Some(Scalar::Number(*n as f64));
                }
                if let Some(n) = value.downcast_ref::<Option<$ty>>() {
                    return Some(n.map_or(Scalar::Absent, |n| Scalar::Number(n as f64)));
                }
            )*
        };
    }
    number!(i8, i16, i32, i64, u8, u16, u32, u64, usize, isize, f32, f64);

    None
}

/// Oracle interpreting the built-in [`ConstraintKind`]s.
///
/// Absent values (`None`, of any supported type) pass everything except
/// `Required`, and empty text
/// passes everything except `Required` and `MinLength`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinOracle;

impl BuiltinOracle {
    /// Evaluates one constraint. `None` means the value type does not
    /// support it.
    fn passes(constraint: &Constraint, value: Scalar<'_>) -> Option<bool> {
        let passed = match (&constraint.kind, value) {
            (ConstraintKind::Required, Scalar::Text(text)) => {
                text.is_some_and(|t| !t.trim().is_empty())
            }
            (ConstraintKind::Required, Scalar::Absent) => false,
            (ConstraintKind::Required, _) => true,
            (_, Scalar::Absent) => true,

            (ConstraintKind::MinLength(min), Scalar::Text(text)) => {
                text.is_none_or(|t| t.chars().count() >= *min)
            }
            (ConstraintKind::MaxLength(max), Scalar::Text(text)) => {
                text.is_none_or(|t| t.chars().count() <= *max)
            }

            (ConstraintKind::Range { min, max }, Scalar::Number(n)) => n >= *min && n <= *max,
            (ConstraintKind::Range { min, max }, Scalar::Text(text)) => match text {
                None | Some("") => true,
                Some(t) => t
                    .trim()
                    .parse::<f64>()
                    .is_ok_and(|n| n >= *min && n <= *max),
            },

            (ConstraintKind::Pattern { regex, .. }, Scalar::Text(text)) => match text {
                None | Some("") => true,
                Some(t) => regex.is_match(t),
            },

            (ConstraintKind::Email, Scalar::Text(text)) => match text {
                None | Some("") => true,
                Some(t) => email_address::EmailAddress::is_valid(t),
            },

            _ => return None,
        };
        Some(passed)
    }
}

impl AttributeOracle for BuiltinOracle {
    fn check(
        &self,
        _object: &dyn Any,
        property: &str,
        value: &dyn Any,
        constraints: &[Constraint],
    ) -> Vec<ErrorPayload> {
        if constraints.is_empty() {
            return Vec::new();
        }

        let Some(value) = scalar(value) else {
            log::warn!(
                "Constraints on '{}' skipped: unsupported value type",
                property
            );
            return Vec::new();
        };

        let mut failures = Vec::new();
        for constraint in constraints {
            match Self::passes(constraint, value) {
                Some(true) => {}
                Some(false) => failures.push(constraint.failure(property)),
                None => log::warn!(
                    "Constraint {:?} skipped on '{}': not applicable to {}",
                    constraint.kind,
                    property,
                    value
                ),
            }
        }
        failures
    }
}
