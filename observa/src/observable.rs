//! The observable model base and its validation dispatcher.
//!
//! [`Observable`] wraps a [`Model`] and owns everything validation needs:
//! the property schema, the rule registry, the error store and the two
//! notification streams. Setting a property through it fires
//! property-changed and then re-validates that property into the internal
//! error namespace. Explicit calls to [`Observable::validate`] write to the
//! user namespace instead.
//!
//! # Example
//!
//! ```
//! use observa::{Model, Observable, Rules, Schema, ValidationOutcome};
//!
//! #[derive(Default)]
//! struct Form {
//!     user_input: String,
//! }
//!
//! impl Model for Form {
//!     fn schema() -> observa::Result<Schema<Self>> {
//!         Schema::builder()
//!             .property("UserInput", |f: &Form| &f.user_input)
//!             .build()
//!     }
//!
//!     fn register_rules(rules: &mut Rules<'_, Self>) -> observa::Result<()> {
//!         rules.register_fn("UserInput", |v: &String| {
//!             ValidationOutcome::check(v.starts_with('@'), "Input must start with '@'.")
//!         })?;
//!         Ok(())
//!     }
//! }
//!
//! let mut form = Observable::new(Form::default()).unwrap();
//! form.set("UserInput", |f| &mut f.user_input, "hello".to_string()).unwrap();
//! assert!(form.has_errors());
//! form.set("UserInput", |f| &mut f.user_input, "@hello".to_string()).unwrap();
//! assert!(!form.has_errors());
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use crate::attribute::{AttributeOracle, BuiltinOracle};
use crate::config::ValidationConfig;
use crate::culture::Culture;
use crate::error::{Result, ValidationError};
use crate::notify::{Notifier, PropertyChanged};
use crate::outcome::{ErrorPayload, ValidationOutcome};
use crate::registry::{RuleRegistry, WILDCARD, normalize};
use crate::rule::{AnyRule, FnRule, ValidationRule};
use crate::schema::Schema;
use crate::store::{ErrorNamespace, ErrorStore};

/// A type whose properties can be validated by name.
pub trait Model: Sized + 'static {
    /// Declares the model's properties. Called once per [`Observable`].
    fn schema() -> Result<Schema<Self>>;

    /// Registers the rules every instance starts with.
    fn register_rules(_rules: &mut Rules<'_, Self>) -> Result<()> {
        Ok(())
    }

    /// Configuration used by [`Observable::new`].
    fn config() -> ValidationConfig {
        ValidationConfig::default()
    }
}

/// Registration access to a model's rule registry.
///
/// Every registration is checked against the schema: the property must be
/// declared and the rule's value type must match it. Rules registered under
/// the wildcard (`""`) validate the whole model and so must be typed over
/// the model itself.
pub struct Rules<'a, O> {
    schema: &'a Schema<O>,
    registry: &'a mut RuleRegistry,
}

impl<O: 'static> Rules<'_, O> {
    fn check(&self, property: &str, value_type: TypeId, value_type_name: &'static str) -> Result<()> {
        let (expected, expected_name) = if property == WILDCARD {
            (TypeId::of::<O>(), std::any::type_name::<O>())
        } else {
            let declared = self.schema.require(property)?;
            (declared.value_type(), declared.value_type_name())
        };

        if expected == value_type {
            Ok(())
        } else {
            Err(ValidationError::type_mismatch(
                property,
                expected_name,
                value_type_name,
            ))
        }
    }

    /// Registers a shared rule. Returns `false` if that instance was
    /// already registered for `property`.
    pub fn register<T, R>(&mut self, property: &str, rule: Arc<R>) -> Result<bool>
    where
        T: Any,
        R: ValidationRule<T> + 'static,
    {
        self.register_any(property, AnyRule::new::<T, R>(rule))
    }

    /// Registers an already erased rule.
    pub fn register_any(&mut self, property: &str, rule: AnyRule) -> Result<bool> {
        self.check(property, rule.value_type(), rule.value_type_name())?;
        Ok(self.registry.register_any(Some(property), rule))
    }

    /// Registers each rule in order. Nothing is registered if any rule
    /// does not fit the property.
    pub fn register_all<I>(&mut self, property: &str, rules: I) -> Result<usize>
    where
        I: IntoIterator<Item = AnyRule>,
    {
        let rules: Vec<AnyRule> = rules.into_iter().collect();
        for rule in &rules {
            self.check(property, rule.value_type(), rule.value_type_name())?;
        }
        Ok(self.registry.register_all(Some(property), rules))
    }

    /// Registers a delegate that ignores the culture.
    pub fn register_fn<T, F>(&mut self, property: &str, f: F) -> Result<bool>
    where
        T: Any,
        F: Fn(&T) -> ValidationOutcome + Send + Sync + 'static,
    {
        self.register::<T, _>(property, Arc::new(FnRule::from_fn(f)))
    }

    /// Registers a delegate that receives the validating culture.
    pub fn register_fn_with_culture<T, F>(&mut self, property: &str, f: F) -> Result<bool>
    where
        T: Any,
        F: Fn(&T, &Culture) -> ValidationOutcome + Send + Sync + 'static,
    {
        self.register::<T, _>(property, Arc::new(FnRule::new(f)))
    }

    /// Registers a rule over the whole model, run by all-properties sweeps.
    pub fn register_object_rule<R>(&mut self, rule: Arc<R>) -> Result<bool>
    where
        R: ValidationRule<O> + 'static,
    {
        self.register::<O, R>(WILDCARD, rule)
    }

    /// Registers a delegate over the whole model.
    pub fn register_object_fn<F>(&mut self, f: F) -> Result<bool>
    where
        F: Fn(&O) -> ValidationOutcome + Send + Sync + 'static,
    {
        self.register_fn::<O, F>(WILDCARD, f)
    }
}

/// Failures collected for one property in one pass.
struct Evaluation {
    attribute: Vec<ErrorPayload>,
    rules: Vec<ErrorPayload>,
}

/// A model with automatic per-property validation and error tracking.
pub struct Observable<O: Model> {
    model: O,
    schema: Schema<O>,
    registry: RuleRegistry,
    errors: ErrorStore,
    notifier: Notifier,
    oracle: Box<dyn AttributeOracle>,
    config: ValidationConfig,
}

impl<O: Model> Observable<O> {
    /// Wraps `model` using [`Model::config`].
    pub fn new(model: O) -> Result<Self> {
        Self::with_config(model, O::config())
    }

    /// Wraps `model` with an explicit configuration.
    pub fn with_config(model: O, config: ValidationConfig) -> Result<Self> {
        Self::with_oracle(model, config, BuiltinOracle)
    }

    /// Wraps `model`, delegating constraint checks to `oracle`.
    pub fn with_oracle(
        model: O,
        config: ValidationConfig,
        oracle: impl AttributeOracle + 'static,
    ) -> Result<Self> {
        let schema = O::schema()?;
        let mut registry = RuleRegistry::new();
        O::register_rules(&mut Rules {
            schema: &schema,
            registry: &mut registry,
        })?;

        let notifier = Notifier::new();
        let errors = ErrorStore::new(notifier.errors_changed.clone());

        log::debug!(
            "Observable<{}> created with {} properties",
            std::any::type_name::<O>(),
            schema.len()
        );

        let mut observable = Self {
            model,
            schema,
            registry,
            errors,
            notifier,
            oracle: Box::new(oracle),
            config,
        };

        if observable.config.validate_on_construct {
            observable.sweep(ErrorNamespace::Internal)?;
        }

        Ok(observable)
    }

    /// The wrapped model.
    pub fn model(&self) -> &O {
        &self.model
    }

    /// Unwraps the model, dropping its errors and rules.
    pub fn into_inner(self) -> O {
        self.model
    }

    /// The property table built at construction.
    pub fn schema(&self) -> &Schema<O> {
        &self.schema
    }

    /// Rules registered for this instance.
    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Raw access to both error namespaces.
    pub fn error_store(&self) -> &ErrorStore {
        &self.errors
    }

    /// The configuration this instance was built with.
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// The culture passed to rules.
    pub fn culture(&self) -> Culture {
        self.config.effective_culture()
    }

    /// Subscription access to property-changed and errors-changed.
    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Registration access to this instance's rules.
    pub fn rules(&mut self) -> Rules<'_, O> {
        Rules {
            schema: &self.schema,
            registry: &mut self.registry,
        }
    }

    /// See [`Rules::register`].
    pub fn register<T, R>(&mut self, property: &str, rule: Arc<R>) -> Result<bool>
    where
        T: Any,
        R: ValidationRule<T> + 'static,
    {
        self.rules().register::<T, R>(property, rule)
    }

    /// See [`Rules::register_all`].
    pub fn register_all<I>(&mut self, property: &str, rules: I) -> Result<usize>
    where
        I: IntoIterator<Item = AnyRule>,
    {
        self.rules().register_all(property, rules)
    }

    /// See [`Rules::register_fn`].
    pub fn register_fn<T, F>(&mut self, property: &str, f: F) -> Result<bool>
    where
        T: Any,
        F: Fn(&T) -> ValidationOutcome + Send + Sync + 'static,
    {
        self.rules().register_fn(property, f)
    }

    /// See [`Rules::register_fn_with_culture`].
    pub fn register_fn_with_culture<T, F>(&mut self, property: &str, f: F) -> Result<bool>
    where
        T: Any,
        F: Fn(&T, &Culture) -> ValidationOutcome + Send + Sync + 'static,
    {
        self.rules().register_fn_with_culture(property, f)
    }

    /// See [`Rules::register_object_rule`].
    pub fn register_object_rule<R>(&mut self, rule: Arc<R>) -> Result<bool>
    where
        R: ValidationRule<O> + 'static,
    {
        self.rules().register_object_rule(rule)
    }

    // =========================================================================
    // Change notification
    // =========================================================================

    /// Assigns `value` to the field selected by `field` and raises
    /// property-changed for `property` if the value actually changed.
    ///
    /// Returns whether the value changed.
    pub fn set<T, F>(&mut self, property: &str, field: F, value: T) -> Result<bool>
    where
        T: PartialEq + Any,
        F: FnOnce(&mut O) -> &mut T,
    {
        self.expect_type::<T>(property)?;

        let slot = field(&mut self.model);
        if *slot == value {
            return Ok(false);
        }
        *slot = value;

        self.raise_property_changed(Some(property))?;
        Ok(true)
    }

    /// Mutates the model freely, then raises property-changed for
    /// `property`, or for every property when it is `None`.
    pub fn update<F>(&mut self, property: Option<&str>, f: F) -> Result<()>
    where
        F: FnOnce(&mut O),
    {
        self.expect_known(property)?;
        f(&mut self.model);
        self.raise_property_changed(property)
    }

    /// Publishes property-changed once, then re-runs internal validation.
    ///
    /// For a single property only its internal errors are replaced. For
    /// the wildcard every internal error is dropped and all properties are
    /// validated again. User errors are left alone either way.
    pub fn raise_property_changed(&mut self, property: Option<&str>) -> Result<()> {
        self.expect_known(property)?;
        let key = normalize(property);

        self.notifier.property_changed.publish(&PropertyChanged {
            property: (key != WILDCARD).then(|| key.to_string()),
        });

        if !self.config.revalidate_on_change {
            return Ok(());
        }

        if key == WILDCARD {
            self.errors.clear_all(true);
            self.sweep(ErrorNamespace::Internal)?;
        } else {
            self.errors.clear(key, true);
            self.validate_one(key, ErrorNamespace::Internal)?;
        }
        Ok(())
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Validates `property`, or every property when it is `None` or empty,
    /// storing failures as user errors.
    ///
    /// Existing errors of the target are cleared first, in both namespaces.
    /// Returns `true` when everything validated passed.
    pub fn validate(&mut self, property: Option<&str>) -> Result<bool> {
        self.expect_known(property)?;

        match normalize(property) {
            WILDCARD => {
                self.errors.clear_all(false);
                self.sweep(ErrorNamespace::User)
            }
            name => {
                self.errors.clear(name, false);
                self.validate_one(name, ErrorNamespace::User)
            }
        }
    }

    /// Validates an explicit value with a one-off delegate, bypassing the
    /// registry and the constraints. Failures are stored as user errors.
    pub fn validate_value<T, F>(&mut self, property: &str, value: &T, delegate: F) -> Result<bool>
    where
        T: Any,
        F: FnOnce(&T, &Culture) -> ValidationOutcome,
    {
        self.expect_type::<T>(property)?;

        self.errors.clear(property, false);
        let outcome = delegate(value, &self.culture());
        let valid = outcome.is_valid();
        log::debug!("Delegate validation of '{}': valid = {}", property, valid);
        self.errors
            .add_errors(property, outcome.into_errors(), ErrorNamespace::User, false);
        Ok(valid)
    }

    /// Runs every property and the model-level rules, folding validity.
    fn sweep(&mut self, namespace: ErrorNamespace) -> Result<bool> {
        log::debug!(
            "Validating all properties of {} ({:?})",
            std::any::type_name::<O>(),
            namespace
        );

        let names: Vec<String> = self.schema.names().map(str::to_string).collect();
        let mut valid = true;
        for name in &names {
            valid &= self.validate_one(name, namespace)?;
        }
        valid &= self.validate_one(WILDCARD, namespace)?;
        Ok(valid)
    }

    fn validate_one(&mut self, property: &str, namespace: ErrorNamespace) -> Result<bool> {
        let evaluation = self.evaluate(property, &self.culture())?;
        let valid = evaluation.attribute.is_empty() && evaluation.rules.is_empty();

        self.errors
            .add_errors(property, evaluation.attribute, namespace, false);
        self.errors
            .add_errors(property, evaluation.rules, namespace, false);
        Ok(valid)
    }

    /// Runs the attribute and registry phases for one key without touching
    /// the store.
    fn evaluate(&self, property: &str, culture: &Culture) -> Result<Evaluation> {
        let model: &dyn Any = &self.model;
        let value = if property == WILDCARD {
            model
        } else {
            self.schema.require(property)?.value(&self.model)
        };

        let attribute = match property {
            _ if !self.schema.is_attributed(property) => Vec::new(),
            WILDCARD => self.oracle.check_object(model),
            _ => self.oracle.check(
                model,
                property,
                value,
                self.schema.constraints(property),
            ),
        };

        let mut rules = Vec::new();
        for rule in self.registry.rules_for(property) {
            let outcome = rule.validate_any(property, value, culture)?;
            if outcome.is_invalid() {
                log::trace!("Rule '{}' failed for '{}'", rule.name(), property);
                rules.extend(outcome.into_errors());
            }
        }

        Ok(Evaluation { attribute, rules })
    }

    fn expect_known(&self, property: Option<&str>) -> Result<()> {
        match normalize(property) {
            WILDCARD => Ok(()),
            name => self.schema.require(name).map(|_| ()),
        }
    }

    fn expect_type<T: Any>(&self, property: &str) -> Result<()> {
        let declared = self.schema.require(property)?;
        if declared.value_type() == TypeId::of::<T>() {
            Ok(())
        } else {
            Err(ValidationError::type_mismatch(
                property,
                declared.value_type_name(),
                std::any::type_name::<T>(),
            ))
        }
    }

    // =========================================================================
    // Errors
    // =========================================================================

    /// Surfaces errors for `property` in the user namespace, most recent
    /// first. The empty name files them against the whole model.
    pub fn add_errors<I, E>(&mut self, property: &str, errors: I) -> Result<()>
    where
        I: IntoIterator<Item = E>,
        E: Into<ErrorPayload>,
    {
        self.add_user_errors(property, errors, false)
    }

    /// Surfaces warnings for `property`, listed after its errors.
    pub fn add_warnings<I, E>(&mut self, property: &str, warnings: I) -> Result<()>
    where
        I: IntoIterator<Item = E>,
        E: Into<ErrorPayload>,
    {
        self.add_user_errors(property, warnings, true)
    }

    fn add_user_errors<I, E>(&mut self, property: &str, errors: I, warning: bool) -> Result<()>
    where
        I: IntoIterator<Item = E>,
        E: Into<ErrorPayload>,
    {
        self.expect_known(Some(property))?;
        let errors = errors.into_iter().map(Into::into).collect();
        self.errors
            .add_errors(property, errors, ErrorNamespace::User, warning);
        Ok(())
    }

    /// Removes all errors of `property`, or of every property when it is
    /// `None`, in both namespaces.
    pub fn clear_errors(&mut self, property: Option<&str>) -> Result<bool> {
        self.expect_known(property)?;
        Ok(match normalize(property) {
            WILDCARD => self.errors.clear_all(false),
            name => self.errors.clear(name, false),
        })
    }

    /// Whether any property carries an error.
    pub fn has_errors(&self) -> bool {
        self.errors.has_errors()
    }

    /// Errors of `property`, or of every property when it is `None` or empty.
    pub fn errors(&self, property: Option<&str>) -> Vec<ErrorPayload> {
        self.errors.errors(property)
    }

    /// Whether `property` carries an error in either namespace.
    pub fn property_has_errors(&self, property: &str) -> bool {
        self.errors.property_has_errors(property)
    }

    /// Fails while the model carries errors. Callers acting on the model's
    /// data, such as a save, should bail out on `Err`.
    pub fn ensure_valid(&self) -> Result<()> {
        if self.has_errors() {
            return Err(ValidationError::Invalid {
                count: self.errors.error_count(),
            });
        }
        Ok(())
    }
}

impl<O: Model + fmt::Debug> fmt::Debug for Observable<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("model", &self.model)
            .field("errors", &self.errors)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
