//! Metadata information regarding the declared entities and the warehouse tables.

use std::collections::{BTreeMap, BTreeSet};

use enum_iterator::Sequence;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The scalar types an entity field may be declared with.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Sequence, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    Boolean,
    Smallint,
    Integer,
    Bigint,
    Real,
    #[serde(rename = "double precision")]
    DoublePrecision,
    Numeric,
    Text,
    Date,
    Timestamp,
}

impl ScalarType {
    /// Integer types. These are the only types allowed on the left of an `IN` list.
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            ScalarType::Smallint | ScalarType::Integer | ScalarType::Bigint
        )
    }

    /// Types which support arithmetic.
    pub fn is_numeric(self) -> bool {
        self.is_integer()
            || matches!(
                self,
                ScalarType::Real | ScalarType::DoublePrecision | ScalarType::Numeric
            )
    }

    /// Types which support the pattern matching operators.
    pub fn is_text(self) -> bool {
        matches!(self, ScalarType::Text)
    }

    /// Whether a value of type `other` can be compared with a value of this type.
    /// Numeric types compare with each other; everything else only with itself.
    pub fn is_comparable_with(self, other: ScalarType) -> bool {
        self == other || (self.is_numeric() && other.is_numeric())
    }
}

impl std::fmt::Display for ScalarType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ScalarType::DoublePrecision => write!(f, "double precision"),
            _ => write!(f, "{}", format!("{self:?}").to_lowercase()),
        }
    }
}

/// Mapping from an entity name to its declared fields.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct EntitiesInfo(pub BTreeMap<String, EntityInfo>);

/// An entity is the typed shape a query parameter is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct EntityInfo {
    /// Declared fields. Nested fields are declared with their dotted path, e.g. `address.city`.
    pub fields: BTreeMap<String, FieldInfo>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Can this field contain null values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub enum Nullable {
    #[default]
    Nullable,
    NonNullable,
}

/// Information about a declared entity field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldInfo {
    pub r#type: ScalarType,
    /// The warehouse column backing this field. Defaults to the lowercased field name.
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_name: Option<String>,
    #[serde(default)]
    pub nullable: Nullable,
}

impl FieldInfo {
    pub fn new(r#type: ScalarType) -> Self {
        FieldInfo {
            r#type,
            column_name: None,
            nullable: Nullable::default(),
        }
    }

    /// The column name emitted for the field called `field_name`.
    pub fn column_name(&self, field_name: &str) -> String {
        match &self.column_name {
            Some(column_name) => column_name.clone(),
            None => field_name.to_lowercase(),
        }
    }
}

/// Mapping from a logical table id to its information.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct TablesInfo(pub BTreeMap<String, TableInfo>);

/// Information about a warehouse table: its physical name and the schemas it may be read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TableInfo {
    pub table_name: String,
    pub schemas: BTreeSet<String>,
    /// The entity whose fields describe the rows of this table.
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_type_display_matches_serialized_name() {
        for scalar_type in enum_iterator::all::<ScalarType>() {
            let serialized = serde_json::to_value(scalar_type).unwrap();
            assert_eq!(
                serialized,
                serde_json::Value::String(scalar_type.to_string()),
                "{scalar_type:?} displays differently from its serialized name"
            );
        }
    }

    #[test]
    fn test_numeric_types_are_mutually_comparable() {
        let numeric = enum_iterator::all::<ScalarType>()
            .filter(|scalar_type| scalar_type.is_numeric())
            .collect::<Vec<_>>();

        assert_eq!(numeric.len(), 6);
        for left in &numeric {
            for right in &numeric {
                assert!(left.is_comparable_with(*right));
            }
        }
        assert!(!ScalarType::Text.is_comparable_with(ScalarType::Integer));
        assert!(!ScalarType::Timestamp.is_comparable_with(ScalarType::Date));
    }

    #[test]
    fn test_column_name_defaults_to_lowercase_field_name() {
        let field = FieldInfo::new(ScalarType::Timestamp);
        assert_eq!(field.column_name("createdDate"), "createddate");

        let renamed = FieldInfo {
            column_name: Some("created_at".to_string()),
            ..field
        };
        assert_eq!(renamed.column_name("createdDate"), "created_at");
    }
}
