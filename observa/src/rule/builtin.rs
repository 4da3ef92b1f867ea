//! Built-in rules for common checks.

use std::fmt::Display;

use regex::Regex;

use super::ValidationRule;
use crate::culture::Culture;
use crate::outcome::{ErrorPayload, ValidationOutcome};

/// Requires non-blank text.
#[derive(Debug, Clone)]
pub struct Required {
    message: ErrorPayload,
}

impl Required {
    pub fn new(message: impl Into<ErrorPayload>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl ValidationRule<String> for Required {
    fn validate_with(&self, value: &String, _culture: &Culture) -> ValidationOutcome {
        ValidationOutcome::check(!value.trim().is_empty(), self.message.clone())
    }

    fn name(&self) -> &str {
        "required"
    }
}

/// Requires at least `min` characters.
#[derive(Debug, Clone)]
pub struct MinLength {
    min: usize,
    message: ErrorPayload,
}

impl MinLength {
    pub fn new(min: usize, message: impl Into<ErrorPayload>) -> Self {
        Self {
            min,
            message: message.into(),
        }
    }
}

impl ValidationRule<String> for MinLength {
    fn validate_with(&self, value: &String, _culture: &Culture) -> ValidationOutcome {
        ValidationOutcome::check(value.chars().count() >= self.min, self.message.clone())
    }

    fn name(&self) -> &str {
        "min_length"
    }
}

/// Allows at most `max` characters.
#[derive(Debug, Clone)]
pub struct MaxLength {
    max: usize,
    message: ErrorPayload,
}

impl MaxLength {
    pub fn new(max: usize, message: impl Into<ErrorPayload>) -> Self {
        Self {
            max,
            message: message.into(),
        }
    }
}

impl ValidationRule<String> for MaxLength {
    fn validate_with(&self, value: &String, _culture: &Culture) -> ValidationOutcome {
        ValidationOutcome::check(value.chars().count() <= self.max, self.message.clone())
    }

    fn name(&self) -> &str {
        "max_length"
    }
}

/// Requires the text to match a regular expression.
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
    message: ErrorPayload,
}

impl Pattern {
    pub fn new(regex: Regex, message: impl Into<ErrorPayload>) -> Self {
        Self {
            regex,
            message: message.into(),
        }
    }

    /// Compiles `pattern` and builds the rule.
    pub fn parse(pattern: &str, message: impl Into<ErrorPayload>) -> Result<Self, regex::Error> {
        Ok(Self::new(Regex::new(pattern)?, message))
    }
}

impl ValidationRule<String> for Pattern {
    fn validate_with(&self, value: &String, _culture: &Culture) -> ValidationOutcome {
        ValidationOutcome::check(self.regex.is_match(value), self.message.clone())
    }

    fn name(&self) -> &str {
        "pattern"
    }
}

/// Requires a valid email address. Empty text passes; combine with
/// [`Required`] to reject it.
#[derive(Debug, Clone)]
pub struct Email {
    message: ErrorPayload,
}

impl Email {
    pub fn new(message: impl Into<ErrorPayload>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl ValidationRule<String> for Email {
    fn validate_with(&self, value: &String, _culture: &Culture) -> ValidationOutcome {
        let ok = value.is_empty() || email_address::EmailAddress::is_valid(value);
        ValidationOutcome::check(ok, self.message.clone())
    }

    fn name(&self) -> &str {
        "email"
    }
}

/// Requires a value within `min..=max`.
#[derive(Debug, Clone)]
pub struct Range<N> {
    min: N,
    max: N,
    message: Option<ErrorPayload>,
}

impl<N: PartialOrd + Display> Range<N> {
    pub fn new(min: N, max: N) -> Self {
        Self {
            min,
            max,
            message: None,
        }
    }

    /// Replaces the default "must be between" message.
    pub fn message(mut self, message: impl Into<ErrorPayload>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl<N> ValidationRule<N> for Range<N>
where
    N: PartialOrd + Display + Send + Sync,
{
    fn validate_with(&self, value: &N, _culture: &Culture) -> ValidationOutcome {
        if *value >= self.min && *value <= self.max {
            return ValidationOutcome::VALID;
        }
        let message = self.message.clone().unwrap_or_else(|| {
            format!("Value must be between {} and {}.", self.min, self.max).into()
        });
        ValidationOutcome::error(message)
    }

    fn name(&self) -> &str {
        "range"
    }
}

/// Requires text that parses as a number in the validating culture.
///
/// Group separators are accepted; empty text passes.
#[derive(Debug, Clone)]
pub struct Numeric {
    message: ErrorPayload,
}

impl Numeric {
    pub fn new(message: impl Into<ErrorPayload>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Parses `text` using the separators of `culture`. Infinities and NaN
    /// are not numbers.
    pub fn parse(text: &str, culture: &Culture) -> Option<f64> {
        let group = culture.group_separator();
        let decimal = culture.decimal_separator();
        let normalized: String = text
            .trim()
            .chars()
            .filter(|c| *c != group)
            .map(|c| if c == decimal { '.' } else { c })
            .collect();
        normalized.parse::<f64>().ok().filter(|n| n.is_finite())
    }
}

impl ValidationRule<String> for Numeric {
    fn validate_with(&self, value: &String, culture: &Culture) -> ValidationOutcome {
        let ok = value.trim().is_empty() || Self::parse(value, culture).is_some();
        ValidationOutcome::check(ok, self.message.clone())
    }

    fn name(&self) -> &str {
        "numeric"
    }
}

/// A boolean check with a fixed message.
pub struct Predicate<T> {
    check: Box<dyn Fn(&T) -> bool + Send + Sync>,
    message: ErrorPayload,
}

impl<T> Predicate<T> {
    pub fn new<F>(check: F, message: impl Into<ErrorPayload>) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            check: Box::new(check),
            message: message.into(),
        }
    }
}

impl<T> ValidationRule<T> for Predicate<T> {
    fn validate_with(&self, value: &T, _culture: &Culture) -> ValidationOutcome {
        ValidationOutcome::check((self.check)(value), self.message.clone())
    }

    fn name(&self) -> &str {
        "predicate"
    }
}
