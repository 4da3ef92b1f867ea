//! Observable models with automatic per-property validation.
//!
//! A model declares its properties once as a [`Schema`]. Wrapped in an
//! [`Observable`], every property change fires a property-changed
//! notification and re-validates that property against three sources:
//! constraint descriptors interpreted by an [`AttributeOracle`], rule
//! objects, and ad-hoc delegates. Failures land in an [`ErrorStore`] that
//! a binding layer can query and subscribe to.

pub mod attribute;
pub mod config;
pub mod culture;
pub mod error;
pub mod notify;
pub mod outcome;
pub mod registry;
pub mod rule;
pub mod schema;
pub mod store;

mod observable;

pub use attribute::{AttributeOracle, BuiltinOracle, Constraint};
pub use config::ValidationConfig;
pub use culture::{Culture, default_culture, set_default_culture};
pub use error::{Result, ValidationError};
pub use notify::{Channel, ErrorsChanged, Notifier, PropertyChanged, SubscriptionId};
pub use observable::{Model, Observable, Rules};
pub use outcome::{ErrorPayload, ValidationOutcome};
pub use registry::{RuleRegistry, WILDCARD};
pub use rule::{AnyRule, FnRule, ValidationRule};
pub use schema::Schema;
pub use store::{ErrorNamespace, ErrorStore};

pub mod prelude {
    pub use crate::attribute::{AttributeOracle, Constraint};
    pub use crate::config::ValidationConfig;
    pub use crate::culture::Culture;
    pub use crate::error::ValidationError;
    pub use crate::observable::{Model, Observable, Rules};
    pub use crate::outcome::{ErrorPayload, ValidationOutcome};
    pub use crate::rule::{FnRule, ValidationRule};
    pub use crate::schema::Schema;
}
