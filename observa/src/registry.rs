//! Per-model mapping from property names to validation rules.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::culture::Culture;
use crate::outcome::ValidationOutcome;
use crate::rule::{AnyRule, FnRule, ValidationRule};

/// Registry key meaning "every property".
pub const WILDCARD: &str = "";

/// Maps a property name to the set of rules bound to it.
///
/// Rules form a set keyed by instance identity: registering the same
/// `Arc` twice under one name keeps a single entry. Insertion order is
/// preserved for reporting. There is no removal; a registry only grows
/// for the lifetime of its model.
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    rules: HashMap<String, Vec<AnyRule>>,
}

/// Maps `None` and `""` to the wildcard key.
pub fn normalize(property: Option<&str>) -> &str {
    property.unwrap_or(WILDCARD)
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an erased rule under `property`. Returns `false` if that rule
    /// instance was already registered there.
    pub fn register_any(&mut self, property: Option<&str>, rule: AnyRule) -> bool {
        let key = normalize(property);
        let set = self.rules.entry(key.to_string()).or_default();
        if set.iter().any(|existing| existing.same_rule(&rule)) {
            log::trace!("Rule '{}' already registered for '{}'", rule.name(), key);
            return false;
        }
        log::debug!("Registered rule '{}' for '{}'", rule.name(), key);
        set.push(rule);
        true
    }

    /// Adds a shared rule under `property`.
    pub fn register<T, R>(&mut self, property: Option<&str>, rule: Arc<R>) -> bool
    where
        T: Any,
        R: ValidationRule<T> + 'static,
    {
        self.register_any(property, AnyRule::new::<T, R>(rule))
    }

    /// Adds each rule in enumeration order.
    pub fn register_all<I>(&mut self, property: Option<&str>, rules: I) -> usize
    where
        I: IntoIterator<Item = AnyRule>,
    {
        rules
            .into_iter()
            .filter(|rule| self.register_any(property, rule.clone()))
            .count()
    }

    /// Wraps a one-argument delegate and registers it.
    pub fn register_fn<T, F>(&mut self, property: Option<&str>, f: F) -> bool
    where
        T: Any,
        F: Fn(&T) -> ValidationOutcome + Send + Sync + 'static,
    {
        self.register::<T, _>(property, Arc::new(FnRule::from_fn(f)))
    }

    /// Wraps a culture-aware delegate and registers it.
    pub fn register_fn_with_culture<T, F>(&mut self, property: Option<&str>, f: F) -> bool
    where
        T: Any,
        F: Fn(&T, &Culture) -> ValidationOutcome + Send + Sync + 'static,
    {
        self.register::<T, _>(property, Arc::new(FnRule::new(f)))
    }

    /// Rules registered under exactly `property`.
    pub fn rules_for(&self, property: &str) -> &[AnyRule] {
        self.rules.get(property).map(Vec::as_slice).unwrap_or_default()
    }

    /// Number of rules registered under exactly `property`.
    pub fn rule_count(&self, property: &str) -> usize {
        self.rules_for(property).len()
    }

    /// Keys that have at least one rule.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
