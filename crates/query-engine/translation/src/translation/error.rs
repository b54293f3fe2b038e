//! Errors for translation.

use thiserror::Error;

/// A type for translation errors.
///
/// None of these are recovered from internally. Text already appended to a statement under
/// construction is not rolled back, so a failing clause invalidates the whole statement.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("{0} is not supported.")]
    UnsupportedConstruct(String),
    #[error("Invalid {0}.")]
    InvalidConstruct(String),
    #[error("Property '{path}' could not be resolved on '{root}'.")]
    UnresolvedProperty { path: String, root: String },
    #[error("Parameter '{0}' is not bound by the enclosing lambda.")]
    ParameterNotFound(String),
    #[error("Entity '{0}' not found.")]
    EntityNotFound(String),
    #[error("Type mismatch: {0}.")]
    TypeMismatch(String),
    #[error("Generated SQL has imbalanced parentheses: {0}")]
    ImbalancedOutput(String),
    #[error("Invalid table '{0}'.")]
    InvalidTable(String),
    #[error("Schema '{schema}' is not registered for table '{table}'.")]
    InvalidSchema { table: String, schema: String },
}
