//! Error types for feed materialization and schema loading.
//!
//! [`MaterializeError`] never escapes a parse: every instance is reported to
//! the diagnostics sink at the granularity where it happened (entry, property,
//! link or mapping) and processing continues.

use thiserror::Error;

/// Maximum length for value display in error messages.
const MAX_VALUE_DISPLAY_LEN: usize = 100;

/// Per-entry, per-property, per-link and per-mapping failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MaterializeError {
    /// The entity type cannot be instantiated.
    #[error("cannot construct entity of type '{type_name}': {reason}")]
    Construction {
        /// The type tag that was requested.
        type_name: String,
        /// Why construction was refused.
        reason: String,
    },

    /// The schema has no such property or association.
    #[error("type '{type_name}' has no property '{property}'")]
    PropertyLookup {
        /// The entity or complex type that was searched.
        type_name: String,
        /// The property name as it appeared in the input.
        property: String,
    },

    /// A value is incompatible with the target property.
    #[error("cannot assign {value} to '{property}': expected {expected}")]
    Assignment {
        /// The target property (or property path).
        property: String,
        /// The expected type or shape.
        expected: String,
        /// The offending value, truncated for display.
        value: String,
    },

    /// Nested content is malformed or untyped.
    #[error(transparent)]
    Structure(#[from] StructureError),
}

impl MaterializeError {
    /// Creates an assignment error, truncating the value to 100 characters.
    #[must_use]
    pub fn assignment(
        property: impl Into<String>,
        expected: impl Into<String>,
        value: impl std::fmt::Display,
    ) -> Self {
        let value_str = value.to_string();
        let truncated = if value_str.chars().count() > MAX_VALUE_DISPLAY_LEN {
            let cut: String = value_str.chars().take(MAX_VALUE_DISPLAY_LEN).collect();
            format!("'{}...'", cut)
        } else {
            format!("'{}'", value_str)
        };
        Self::Assignment {
            property: property.into(),
            expected: expected.into(),
            value: truncated,
        }
    }

    /// Creates a property lookup error.
    #[must_use]
    pub fn property_lookup(type_name: impl Into<String>, property: impl Into<String>) -> Self {
        Self::PropertyLookup {
            type_name: type_name.into(),
            property: property.into(),
        }
    }
}

/// Problems with the shape of nested content.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructureError {
    /// A type tag does not name any registered entity type.
    #[error("unknown entity type '{0}'")]
    UnknownType(String),

    /// Neither the content nor the schema names a type.
    #[error("no entity type declared for {0}")]
    MissingType(String),

    /// The inline payload does not match the association's multiplicity.
    #[error("association '{association}' expects {expected} but inline content is {actual}")]
    PayloadMismatch {
        /// The navigation property name.
        association: String,
        /// "a feed" or "an entry".
        expected: &'static str,
        /// "a feed" or "an entry".
        actual: &'static str,
    },

    /// Nested associations went deeper than the configured limit.
    #[error("nested content exceeds maximum depth of {max_depth}")]
    DepthExceeded {
        /// The configured limit.
        max_depth: usize,
    },

    /// A to-one association materialized no entity.
    #[error("association '{0}' produced no entity")]
    Empty(String),
}

/// Errors raised while loading schemas, feeds or configuration files.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The path that was read.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// YAML parsing failed.
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing failed.
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The document parsed but is inconsistent.
    #[error("invalid document: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assignment_truncates_long_values() {
        let long = "x".repeat(150);
        let err = MaterializeError::assignment("Name", "Edm.Int32", &long);
        let msg = err.to_string();
        assert!(msg.contains("..."));
        assert!(msg.len() < 200);
    }

    #[test]
    fn test_structure_error_is_transparent() {
        let err: MaterializeError = StructureError::UnknownType("NS.Ghost".to_string()).into();
        assert_eq!(err.to_string(), "unknown entity type 'NS.Ghost'");
    }
}
