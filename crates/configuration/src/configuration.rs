//! Configuration for the query builder.

use std::collections::BTreeMap;

use query_engine_metadata::metadata;

use crate::error::{MakeRuntimeConfigurationError, MetadataError, MultiError};
use crate::version1::{ParsedConfiguration, CURRENT_VERSION};

/// The 'Configuration' type collects all the information necessary to build queries at runtime.
///
/// Values of this type are produced from a 'ParsedConfiguration' using
/// 'make_runtime_configuration', which checks the table registry and the entity declarations
/// once, at startup, so that statement building only has to deal with lookup misses.
#[derive(Debug, Clone)]
pub struct Configuration {
    pub metadata: metadata::Metadata,
}

/// Validate a parsed configuration and turn it into a runtime configuration.
pub fn make_runtime_configuration(
    parsed_config: ParsedConfiguration,
) -> Result<Configuration, MakeRuntimeConfigurationError> {
    if parsed_config.version != CURRENT_VERSION {
        return Err(MakeRuntimeConfigurationError::UnsupportedVersion {
            found: parsed_config.version,
            expected: CURRENT_VERSION,
        });
    }

    let errors = validate_metadata(&parsed_config.metadata);
    if !errors.is_empty() {
        return Err(MakeRuntimeConfigurationError::InvalidMetadata(MultiError(
            errors,
        )));
    }

    Ok(Configuration {
        metadata: parsed_config.metadata,
    })
}

/// Collect every problem with the metadata.
fn validate_metadata(metadata: &metadata::Metadata) -> Vec<MetadataError> {
    let mut errors = Vec::new();

    for (table, info) in &metadata.tables.0 {
        if info.table_name.is_empty() {
            errors.push(MetadataError::EmptyTableName {
                table: table.clone(),
            });
        } else if !is_identifier(&info.table_name) {
            errors.push(MetadataError::InvalidIdentifier {
                kind: "table",
                name: info.table_name.clone(),
            });
        }

        if info.schemas.is_empty() {
            errors.push(MetadataError::NoSchemas {
                table: table.clone(),
            });
        }
        for schema in &info.schemas {
            if !is_identifier(schema) {
                errors.push(MetadataError::InvalidIdentifier {
                    kind: "schema",
                    name: schema.clone(),
                });
            }
        }

        if let Some(entity) = &info.entity {
            if !metadata.entities.0.contains_key(entity) {
                errors.push(MetadataError::UnknownEntity {
                    table: table.clone(),
                    entity: entity.clone(),
                });
            }
        }
    }

    for (entity, info) in &metadata.entities.0 {
        if info.fields.is_empty() {
            errors.push(MetadataError::EmptyEntity {
                entity: entity.clone(),
            });
        }

        let mut columns = BTreeMap::new();
        for (field_name, field) in &info.fields {
            let column = field.column_name(field_name);
            // nested fields map to dotted columns, each segment must be a plain identifier
            if !column.split('.').all(is_identifier) {
                errors.push(MetadataError::InvalidIdentifier {
                    kind: "column",
                    name: column.clone(),
                });
            }
            if columns.insert(column.clone(), field_name).is_some() {
                errors.push(MetadataError::DuplicateColumn {
                    entity: entity.clone(),
                    column,
                });
            }
        }
    }

    errors
}

/// Names are inlined into statements unquoted.
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
