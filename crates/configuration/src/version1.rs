//! The version 1 configuration file format.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::fs;

use query_engine_metadata::metadata;

use crate::error::{ParseConfigurationError, WriteParsedConfigurationError};

pub const CURRENT_VERSION: u32 = 1;
pub const CONFIGURATION_FILENAME: &str = "configuration.json";
pub const CONFIGURATION_JSONSCHEMA_FILENAME: &str = "schema.json";

/// The configuration as it is stored on disk: the declared entities and the table registry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct ParsedConfiguration {
    /// Which version of the configuration format are we using
    pub version: u32,
    #[serde(default)]
    pub metadata: metadata::Metadata,
}

impl ParsedConfiguration {
    pub fn empty() -> Self {
        ParsedConfiguration {
            version: CURRENT_VERSION,
            metadata: metadata::Metadata::empty(),
        }
    }

    /// The configuration written by `initialize`: `FooTable` and `GooTable`, and the
    /// `FooTableEntity` rows of `FooTable` are read as.
    pub fn initial() -> Self {
        let foo_table_entity = metadata::EntityInfo {
            fields: BTreeMap::from([
                (
                    "value".to_string(),
                    metadata::FieldInfo::new(metadata::ScalarType::Text),
                ),
                (
                    "createdDate".to_string(),
                    metadata::FieldInfo::new(metadata::ScalarType::Timestamp),
                ),
                (
                    "id".to_string(),
                    metadata::FieldInfo {
                        nullable: metadata::Nullable::NonNullable,
                        ..metadata::FieldInfo::new(metadata::ScalarType::Integer)
                    },
                ),
            ]),
            description: Some("A row of footable".to_string()),
        };

        ParsedConfiguration {
            version: CURRENT_VERSION,
            metadata: metadata::Metadata {
                entities: metadata::EntitiesInfo(BTreeMap::from([(
                    "FooTableEntity".to_string(),
                    foo_table_entity,
                )])),
                tables: metadata::TablesInfo(BTreeMap::from([
                    (
                        "FooTable".to_string(),
                        metadata::TableInfo {
                            table_name: "footable".to_string(),
                            schemas: BTreeSet::from(["schema1".to_string(), "schema2".to_string()]),
                            entity: Some("FooTableEntity".to_string()),
                            description: None,
                        },
                    ),
                    (
                        "GooTable".to_string(),
                        metadata::TableInfo {
                            table_name: "gootable".to_string(),
                            schemas: BTreeSet::from(["schema3".to_string()]),
                            entity: None,
                            description: None,
                        },
                    ),
                ])),
            },
        }
    }
}

/// Read `configuration.json` from the configuration directory.
pub async fn parse_configuration(
    configuration_dir: impl AsRef<Path>,
) -> Result<ParsedConfiguration, ParseConfigurationError> {
    let configuration_file = configuration_dir.as_ref().join(CONFIGURATION_FILENAME);

    let configuration_file_contents =
        fs::read_to_string(&configuration_file)
            .await
            .map_err(|err| {
                ParseConfigurationError::IoErrorButStringified(format!(
                    "{}: {}",
                    &configuration_file.display(),
                    err
                ))
            })?;

    let parsed_config: ParsedConfiguration = serde_json::from_str(&configuration_file_contents)
        .map_err(|error| ParseConfigurationError::ParseError {
            file_path: configuration_file.clone(),
            line: error.line(),
            column: error.column(),
            message: error.to_string(),
        })?;

    tracing::info!(
        file = %configuration_file.display(),
        entities = parsed_config.metadata.entities.0.len(),
        tables = parsed_config.metadata.tables.0.len(),
        "loaded configuration"
    );
    Ok(parsed_config)
}

/// Write the configuration and its JSON schema to `out_dir`, creating it if needed.
pub async fn write_parsed_configuration(
    parsed_config: ParsedConfiguration,
    out_dir: impl AsRef<Path>,
) -> Result<(), WriteParsedConfigurationError> {
    let configuration_file = out_dir.as_ref().to_owned().join(CONFIGURATION_FILENAME);
    fs::create_dir_all(out_dir.as_ref()).await?;

    // create the configuration file
    fs::write(
        configuration_file,
        serde_json::to_string_pretty(&parsed_config)
            .map_err(|e| WriteParsedConfigurationError::IoError(e.into()))?
            + "\n",
    )
    .await?;

    // create the jsonschema file
    let configuration_jsonschema_file_path = out_dir
        .as_ref()
        .to_owned()
        .join(CONFIGURATION_JSONSCHEMA_FILENAME);

    let output = schemars::schema_for!(ParsedConfiguration);
    fs::write(
        &configuration_jsonschema_file_path,
        serde_json::to_string_pretty(&output)
            .map_err(|e| WriteParsedConfigurationError::IoError(e.into()))?
            + "\n",
    )
    .await?;

    Ok(())
}
