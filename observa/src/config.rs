//! Per-model validation configuration.

use serde::{Deserialize, Serialize};

use crate::culture::{Culture, default_culture};

/// Controls how an [`Observable`](crate::Observable) validates.
///
/// # Example
///
/// ```
/// use observa::{Culture, ValidationConfig};
///
/// let config = ValidationConfig::new()
///     .culture(Culture::new("de-DE"))
///     .validate_on_construct();
/// assert!(config.revalidate_on_change);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Culture passed to rules. `None` uses the process default.
    pub culture: Option<Culture>,

    /// Re-run internal validation whenever property-changed fires.
    pub revalidate_on_change: bool,

    /// Run a full internal validation pass when the model is wrapped.
    pub validate_on_construct: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            culture: None,
            revalidate_on_change: true,
            validate_on_construct: false,
        }
    }
}

impl ValidationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin the culture passed to rules.
    pub fn culture(mut self, culture: Culture) -> Self {
        self.culture = Some(culture);
        self
    }

    /// Only validate when asked to explicitly.
    pub fn manual(mut self) -> Self {
        self.revalidate_on_change = false;
        self
    }

    /// Validate every property as soon as the model is wrapped.
    pub fn validate_on_construct(mut self) -> Self {
        self.validate_on_construct = true;
        self
    }

    /// The culture rules will receive.
    pub fn effective_culture(&self) -> Culture {
        self.culture.clone().unwrap_or_else(default_culture)
    }
}
