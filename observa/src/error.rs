//! Error types for contract violations.
//!
//! Failed validation is data, not an error: it lives in a
//! [`ValidationOutcome`](crate::ValidationOutcome) and in the
//! [`ErrorStore`](crate::ErrorStore). The variants below are reserved for
//! misuse of the API, such as naming a property the model does not declare.

/// Error returned when a caller breaks the validation contract.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The property name is not part of the model's schema.
    #[error("Property '{property}' is not declared on this model")]
    UnknownProperty { property: String },

    /// A rule or value was used with a property of a different type.
    #[error("Property '{property}' type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        property: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// A delegate rule was requested without a delegate.
    #[error("Validation delegate for '{property}' is missing")]
    MissingDelegate { property: String },

    /// The schema declared by the model is malformed.
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// The model still carries validation errors.
    #[error("Model has {count} validation error(s)")]
    Invalid { count: usize },
}

impl ValidationError {
    /// Creates an unknown property error.
    pub fn unknown_property(property: impl Into<String>) -> Self {
        Self::UnknownProperty {
            property: property.into(),
        }
    }

    /// Creates a type mismatch error.
    pub fn type_mismatch(
        property: impl Into<String>,
        expected: &'static str,
        actual: &'static str,
    ) -> Self {
        Self::TypeMismatch {
            property: property.into(),
            expected,
            actual,
        }
    }

    /// Creates a missing delegate error.
    pub fn missing_delegate(property: impl Into<String>) -> Self {
        Self::MissingDelegate {
            property: property.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = ValidationError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_property() {
        let err = ValidationError::unknown_property("UserInput");
        assert_eq!(
            err.to_string(),
            "Property 'UserInput' is not declared on this model"
        );

        let err = ValidationError::type_mismatch("Age", "u32", "alloc::string::String");
        assert!(err.to_string().contains("expected u32"));
    }
}
