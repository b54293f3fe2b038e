//! Errors that can be thrown when processing configuration.

use std::path::PathBuf;

use thiserror::Error;

/// The errors that can be thrown when reading a configuration directory.
#[derive(Debug, Error)]
pub enum ParseConfigurationError {
    #[error("parse error on {file_path}:{line}:{column}: {message}")]
    ParseError {
        file_path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("I/O error: {0}")]
    IoErrorButStringified(String),
}

/// The errors that can be thrown when validating a parsed configuration.
#[derive(Debug, Error)]
pub enum MakeRuntimeConfigurationError {
    #[error("unsupported configuration version {found}, expected {expected}")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("invalid metadata: {0}")]
    InvalidMetadata(MultiError),
}

/// Every problem found in the metadata, reported together.
#[derive(Debug)]
pub struct MultiError(pub Vec<MetadataError>);

impl std::fmt::Display for MultiError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for (index, error) in self.0.iter().enumerate() {
            if index > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

/// A single problem with the entity or table declarations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    #[error("table '{table}' has an empty table name")]
    EmptyTableName { table: String },
    #[error("table '{table}' is not registered in any schema")]
    NoSchemas { table: String },
    #[error("'{name}' is not a valid {kind} name")]
    InvalidIdentifier { kind: &'static str, name: String },
    #[error("table '{table}' refers to unknown entity '{entity}'")]
    UnknownEntity { table: String, entity: String },
    #[error("entity '{entity}' declares no fields")]
    EmptyEntity { entity: String },
    #[error("entity '{entity}' maps more than one field to column '{column}'")]
    DuplicateColumn { entity: String, column: String },
}

/// The errors that can be thrown when writing a configuration directory.
#[derive(Debug, Error)]
pub enum WriteParsedConfigurationError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
