//! Statically declared property metadata.
//!
//! A model describes its properties once, as a table of name, typed accessor
//! and optional constraint descriptors. The table is built when an
//! [`Observable`](crate::Observable) is constructed and never changes
//! afterwards, so validation by name is a map lookup.
//!
//! # Example
//!
//! ```
//! use observa::schema::Schema;
//! use observa::attribute::Constraint;
//!
//! struct Account {
//!     name: String,
//!     code: String,
//! }
//!
//! let schema = Schema::<Account>::builder()
//!     .property("Name", |a: &Account| &a.name)
//!     .constrained("Code", |a: &Account| &a.code, [Constraint::max_length(3)])
//!     .build()
//!     .unwrap();
//!
//! assert!(schema.contains("Code"));
//! assert_eq!(schema.constraints("Code").len(), 1);
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use crate::attribute::Constraint;
use crate::error::{Result, ValidationError};
use crate::registry::WILDCARD;

/// Reads a property from a model as an erased value.
trait Accessor<O>: Send + Sync {
    fn get<'a>(&self, model: &'a O) -> &'a dyn Any;
}

struct FieldAccessor<F, T> {
    get: F,
    _value: PhantomData<fn() -> T>,
}

impl<O, T, F> Accessor<O> for FieldAccessor<F, T>
where
    T: Any,
    F: Fn(&O) -> &T + Send + Sync,
{
    fn get<'a>(&self, model: &'a O) -> &'a dyn Any {
        (self.get)(model)
    }
}

/// One declared property.
pub struct Property<O> {
    name: String,
    accessor: Box<dyn Accessor<O>>,
    value_type: TypeId,
    value_type_name: &'static str,
    constraints: Vec<Constraint>,
}

impl<O> Property<O> {
    /// The declared property name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `TypeId` of the property value.
    pub fn value_type(&self) -> TypeId {
        self.value_type
    }

    /// Type name of the property value, for error messages.
    pub fn value_type_name(&self) -> &'static str {
        self.value_type_name
    }

    /// Constraint descriptors attached to the property.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Reads this property from `model`.
    pub fn value<'a>(&self, model: &'a O) -> &'a dyn Any {
        self.accessor.get(model)
    }
}

impl<O> fmt::Debug for Property<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("value_type", &self.value_type_name)
            .field("constraints", &self.constraints)
            .finish()
    }
}

/// The property table of a model type.
pub struct Schema<O> {
    properties: Vec<Property<O>>,
    index: HashMap<String, usize>,
    attributed: Vec<String>,
}

impl<O> fmt::Debug for Schema<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.properties).finish()
    }
}

impl<O> Schema<O> {
    /// Starts an empty property table.
    pub fn builder() -> SchemaBuilder<O> {
        SchemaBuilder {
            properties: Vec::new(),
        }
    }

    /// Property names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(Property::name)
    }

    /// Number of declared properties.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Whether `name` is a declared property.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Looks up a declared property.
    pub fn property(&self, name: &str) -> Option<&Property<O>> {
        self.index.get(name).map(|&i| &self.properties[i])
    }

    /// Looks up `name`, failing for undeclared properties.
    pub fn require(&self, name: &str) -> Result<&Property<O>> {
        self.property(name)
            .ok_or_else(|| ValidationError::unknown_property(name))
    }

    /// Names carrying constraints, preceded by the wildcard entry.
    pub fn attributed(&self) -> &[String] {
        &self.attributed
    }

    /// Whether `name` carries constraints. Always true for the wildcard.
    pub fn is_attributed(&self, name: &str) -> bool {
        self.attributed.iter().any(|n| n == name)
    }

    /// Constraints on `name`; empty for unknown names.
    pub fn constraints(&self, name: &str) -> &[Constraint] {
        self.property(name)
            .map(Property::constraints)
            .unwrap_or_default()
    }

    /// Reads property `name` from `model`.
    pub fn value<'a>(&self, model: &'a O, name: &str) -> Option<&'a dyn Any> {
        self.property(name).map(|p| p.value(model))
    }

    /// Declared value type of `name`.
    pub fn type_of(&self, name: &str) -> Option<TypeId> {
        self.property(name).map(Property::value_type)
    }
}

/// Collects property declarations for a [`Schema`].
pub struct SchemaBuilder<O> {
    properties: Vec<Property<O>>,
}

impl<O> SchemaBuilder<O> {
    /// Declares a property without constraints.
    pub fn property<T, F>(self, name: impl Into<String>, get: F) -> Self
    where
        T: Any,
        F: Fn(&O) -> &T + Send + Sync + 'static,
        O: 'static,
    {
        self.constrained(name, get, [])
    }

    /// Declares a property carrying constraint descriptors.
    pub fn constrained<T, F, I>(mut self, name: impl Into<String>, get: F, constraints: I) -> Self
    where
        T: Any,
        F: Fn(&O) -> &T + Send + Sync + 'static,
        I: IntoIterator<Item = Constraint>,
        O: 'static,
    {
        self.properties.push(Property {
            name: name.into(),
            accessor: Box::new(FieldAccessor {
                get,
                _value: PhantomData,
            }),
            value_type: TypeId::of::<T>(),
            value_type_name: std::any::type_name::<T>(),
            constraints: constraints.into_iter().collect(),
        });
        self
    }

    /// Finishes the table. Names must be unique and non-empty.
    pub fn build(self) -> Result<Schema<O>> {
        let mut index = HashMap::with_capacity(self.properties.len());
        let mut attributed = vec![WILDCARD.to_string()];

        for (i, property) in self.properties.iter().enumerate() {
            if property.name.is_empty() {
                return Err(ValidationError::InvalidSchema(
                    "property names must not be empty".to_string(),
                ));
            }
            if index.insert(property.name.clone(), i).is_some() {
                return Err(ValidationError::InvalidSchema(format!(
                    "property '{}' is declared twice",
                    property.name
                )));
            }
            if !property.constraints.is_empty() {
                attributed.push(property.name.clone());
            }
        }

        Ok(Schema {
            properties: self.properties,
            index,
            attributed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Sample {
        name: String,
        age: u32,
    }

    fn sample() -> Sample {
        Sample {
            name: "Ada".to_string(),
            age: 36,
        }
    }

    #[test]
    fn test_lookup_and_values() {
        let schema = Schema::<Sample>::builder()
            .property("Name", |s: &Sample| &s.name)
            .constrained("Age", |s: &Sample| &s.age, [Constraint::range(0.0, 150.0)])
            .build()
            .unwrap();

        let model = sample();
        assert_eq!(schema.names().collect::<Vec<_>>(), vec!["Name", "Age"]);
        assert_eq!(
            schema.value(&model, "Name").and_then(|v| v.downcast_ref::<String>()),
            Some(&"Ada".to_string())
        );
        assert_eq!(
            schema.value(&model, "Age").and_then(|v| v.downcast_ref::<u32>()),
            Some(&36)
        );
        assert_eq!(schema.type_of("Age"), Some(TypeId::of::<u32>()));
        assert!(schema.value(&model, "Missing").is_none());
    }

    #[test]
    fn test_attributed_includes_wildcard() {
        let schema = Schema::<Sample>::builder()
            .property("Name", |s: &Sample| &s.name)
            .constrained("Age", |s: &Sample| &s.age, [Constraint::required()])
            .build()
            .unwrap();

        assert_eq!(schema.attributed(), [WILDCARD.to_string(), "Age".to_string()]);
        assert!(schema.is_attributed("Age"));
        assert!(!schema.is_attributed("Name"));
        assert!(schema.constraints("Name").is_empty());
    }

    #[test]
    fn test_duplicate_and_empty_names_rejected() {
        let duplicate = Schema::<Sample>::builder()
            .property("Name", |s: &Sample| &s.name)
            .property("Name", |s: &Sample| &s.name)
            .build();
        assert!(matches!(duplicate, Err(ValidationError::InvalidSchema(_))));

        let empty = Schema::<Sample>::builder()
            .property("", |s: &Sample| &s.name)
            .build();
        assert!(matches!(empty, Err(ValidationError::InvalidSchema(_))));
    }

    #[test]
    fn test_require_unknown() {
        let schema = Schema::<Sample>::builder().build().unwrap();
        assert!(schema.is_empty());
        assert_eq!(
            schema.require("Nope").unwrap_err(),
            ValidationError::unknown_property("Nope")
        );
    }
}
