//! Locale context threaded through validation calls.
//!
//! The default culture is process-wide. It is resolved once from the locale
//! environment variables and may be replaced with [`set_default_culture`].
//! Rules never read it implicitly: the dispatcher passes the effective
//! culture into every call.

use std::fmt;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

/// Languages that write decimals with a comma.
const COMMA_DECIMAL_LANGUAGES: &[&str] = &[
    "bg", "cs", "da", "de", "el", "es", "fi", "fr", "hr", "hu", "id", "it", "lt", "lv", "nb",
    "nl", "nn", "no", "pl", "pt", "ro", "ru", "sk", "sl", "sr", "sv", "tr", "uk", "vi",
];

static DEFAULT_CULTURE: RwLock<Option<Culture>> = RwLock::new(None);

/// A locale identified by a BCP-47 style tag such as `en-US`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Culture {
    tag: String,
}

impl Culture {
    /// Creates a culture from a tag. Underscores are normalised to dashes.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().trim().replace('_', "-"),
        }
    }

    /// The culture-neutral locale.
    pub fn invariant() -> Self {
        Self { tag: String::new() }
    }

    /// Resolves the culture from `LC_ALL`, `LC_MESSAGES` or `LANG`.
    pub fn from_env() -> Self {
        ["LC_ALL", "LC_MESSAGES", "LANG"]
            .iter()
            .filter_map(|key| std::env::var(key).ok())
            .find(|value| !value.is_empty())
            .map(|value| Self::from_posix(&value))
            .unwrap_or_else(Self::invariant)
    }

    /// Parses a POSIX locale string such as `de_DE.UTF-8@euro`.
    pub fn from_posix(locale: &str) -> Self {
        let base = locale
            .split(['.', '@'])
            .next()
            .unwrap_or_default();
        match base {
            "" | "C" | "POSIX" => Self::invariant(),
            tag => Self::new(tag),
        }
    }

    /// The normalised tag, e.g. `de-DE`. Empty for the invariant culture.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Whether this is the culture-neutral locale.
    pub fn is_invariant(&self) -> bool {
        self.tag.is_empty()
    }

    /// The lowercase language subtag, e.g. `de` for `de-AT`.
    pub fn language(&self) -> String {
        self.tag
            .split('-')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase()
    }

    /// Character separating the integer and fractional parts of a number.
    pub fn decimal_separator(&self) -> char {
        if COMMA_DECIMAL_LANGUAGES.contains(&self.language().as_str()) {
            ','
        } else {
            '.'
        }
    }

    /// Character grouping thousands, the complement of the decimal separator.
    pub fn group_separator(&self) -> char {
        if self.decimal_separator() == ',' {
            '.'
        } else {
            ','
        }
    }
}

impl Default for Culture {
    fn default() -> Self {
        default_culture()
    }
}

impl fmt::Display for Culture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_invariant() {
            write!(f, "invariant")
        } else {
            write!(f, "{}", self.tag)
        }
    }
}

/// Returns the process-wide default culture.
pub fn default_culture() -> Culture {
    if let Ok(guard) = DEFAULT_CULTURE.read()
        && let Some(culture) = guard.as_ref()
    {
        return culture.clone();
    }

    let resolved = Culture::from_env();
    let mut guard = DEFAULT_CULTURE
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.get_or_insert(resolved).clone()
}

/// Replaces the process-wide default culture.
pub fn set_default_culture(culture: Culture) {
    log::debug!("Default culture set to {}", culture);
    let mut guard = DEFAULT_CULTURE
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = Some(culture);
}
