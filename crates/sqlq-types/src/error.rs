//! Type error definitions.

use thiserror::Error;

/// Errors raised while resolving parameter types or reading values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum TypeError {
    /// A declared parameter type name has no matching transport type.
    #[error("unknown parameter type '{name}'")]
    UnknownType {
        /// The type name as written in the query definition.
        name: String,
    },

    /// A type option was declared for a type that does not take it.
    #[error("type '{sql_type}' does not take a {option} option")]
    UnsupportedOption {
        /// The declared type's canonical name.
        sql_type: &'static str,
        /// The offending option.
        option: &'static str,
    },

    /// A value did not have the expected shape.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Expected type description.
        expected: &'static str,
        /// Actual value description.
        actual: String,
    },

    /// A column was not present in the row.
    #[error("column '{0}' not found")]
    ColumnNotFound(String),
}
