//! Validation rules.
//!
//! A rule is a pure function from a typed value and a [`Culture`] to a
//! [`ValidationOutcome`]. Rules are stored type-erased as [`AnyRule`] so a
//! single registry can hold rules for properties of different types; the
//! erased entry downcasts at the call boundary.
//!
//! # Example
//!
//! ```
//! use observa::rule::{FnRule, ValidationRule};
//! use observa::ValidationOutcome;
//!
//! let rule = FnRule::from_fn(|v: &String| {
//!     ValidationOutcome::check(v.starts_with('@'), "Input must start with '@'.")
//! });
//! assert!(rule.validate(&"@hello".to_string()).is_valid());
//! ```

mod builtin;

pub use builtin::{Email, MaxLength, MinLength, Numeric, Pattern, Predicate, Range, Required};

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use crate::culture::{Culture, default_culture};
use crate::error::{Result, ValidationError};
use crate::outcome::ValidationOutcome;

/// A named, culture-aware check over values of type `T`.
///
/// Implementations must be pure: the same value and culture always produce
/// the same outcome.
pub trait ValidationRule<T>: Send + Sync {
    /// Validates `value` under an explicit culture.
    fn validate_with(&self, value: &T, culture: &Culture) -> ValidationOutcome;

    /// The culture used by [`validate`](Self::validate).
    fn culture(&self) -> Culture {
        default_culture()
    }

    /// Validates `value` under the rule's own culture.
    fn validate(&self, value: &T) -> ValidationOutcome {
        self.validate_with(value, &self.culture())
    }

    /// Name used in log output.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

type Delegate<T> = Box<dyn Fn(&T, &Culture) -> ValidationOutcome + Send + Sync>;

/// A rule backed by an ad-hoc closure.
pub struct FnRule<T> {
    delegate: Delegate<T>,
    culture: Option<Culture>,
}

impl<T> FnRule<T> {
    /// Wraps a delegate that takes the value and the culture.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&T, &Culture) -> ValidationOutcome + Send + Sync + 'static,
    {
        Self {
            delegate: Box::new(f),
            culture: None,
        }
    }

    /// Wraps a delegate that ignores the culture.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&T) -> ValidationOutcome + Send + Sync + 'static,
    {
        Self::new(move |value, _| f(value))
    }

    /// Wraps an optional delegate, failing when it is absent.
    pub fn try_from_option<F>(property: &str, f: Option<F>) -> Result<Self>
    where
        F: Fn(&T, &Culture) -> ValidationOutcome + Send + Sync + 'static,
    {
        f.map(Self::new)
            .ok_or_else(|| ValidationError::missing_delegate(property))
    }

    /// Pins the culture used by [`ValidationRule::validate`].
    pub fn with_culture(mut self, culture: Culture) -> Self {
        self.culture = Some(culture);
        self
    }
}

impl<T> ValidationRule<T> for FnRule<T> {
    fn validate_with(&self, value: &T, culture: &Culture) -> ValidationOutcome {
        (self.delegate)(value, culture)
    }

    fn culture(&self) -> Culture {
        self.culture.clone().unwrap_or_else(default_culture)
    }

    fn name(&self) -> &str {
        "delegate"
    }
}

impl<T> fmt::Debug for FnRule<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnRule")
            .field("culture", &self.culture)
            .finish_non_exhaustive()
    }
}

/// Object-safe view of a typed rule.
trait ErasedRule: Send + Sync {
    fn validate_any(
        &self,
        property: &str,
        value: &dyn Any,
        culture: &Culture,
    ) -> Result<ValidationOutcome>;

    fn name(&self) -> &str;
}

struct Typed<T: 'static> {
    rule: Arc<dyn ValidationRule<T>>,
}

impl<T: Any> ErasedRule for Typed<T> {
    fn validate_any(
        &self,
        property: &str,
        value: &dyn Any,
        culture: &Culture,
    ) -> Result<ValidationOutcome> {
        let value = value.downcast_ref::<T>().ok_or_else(|| {
            ValidationError::type_mismatch(property, std::any::type_name::<T>(), "another type")
        })?;
        Ok(self.rule.validate_with(value, culture))
    }

    fn name(&self) -> &str {
        self.rule.name()
    }
}

/// A type-erased rule as held by the registry.
///
/// Two `AnyRule`s are the same rule when they wrap the same allocation.
#[derive(Clone)]
pub struct AnyRule {
    inner: Arc<dyn ErasedRule>,
    identity: usize,
    value_type: TypeId,
    value_type_name: &'static str,
}

impl AnyRule {
    /// Erases a shared rule, keeping its allocation as identity.
    pub fn new<T, R>(rule: Arc<R>) -> Self
    where
        T: Any,
        R: ValidationRule<T> + 'static,
    {
        let identity = Arc::as_ptr(&rule) as *const () as usize;
        let rule: Arc<dyn ValidationRule<T>> = rule;
        Self {
            inner: Arc::new(Typed { rule }),
            identity,
            value_type: TypeId::of::<T>(),
            value_type_name: std::any::type_name::<T>(),
        }
    }

    /// Runs the rule against an erased value.
    ///
    /// Fails with [`ValidationError::TypeMismatch`] if `value` is not the
    /// rule's value type.
    pub fn validate_any(
        &self,
        property: &str,
        value: &dyn Any,
        culture: &Culture,
    ) -> Result<ValidationOutcome> {
        self.inner.validate_any(property, value, culture)
    }

    /// Name of the wrapped rule.
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// `TypeId` of the values this rule accepts.
    pub fn value_type(&self) -> TypeId {
        self.value_type
    }

    pub fn value_type_name(&self) -> &'static str {
        self.value_type_name
    }

    /// Whether both entries wrap the same rule instance.
    pub fn same_rule(&self, other: &AnyRule) -> bool {
        self.identity == other.identity
    }
}

impl fmt::Debug for AnyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyRule")
            .field("name", &self.name())
            .field("value_type", &self.value_type_name)
            .finish()
    }
}
