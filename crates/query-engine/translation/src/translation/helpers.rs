//! Helpers for looking up metadata while translating.

use std::collections::BTreeMap;

use query_engine_metadata::metadata;
use query_engine_sql::sql;

use super::error::Error;

/// Whether column references are prefixed with the parameter name, e.g. `fte.value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AliasMode {
    #[default]
    Unqualified,
    Qualified,
}

/// Static information from the metadata.
#[derive(Debug, Clone, Copy)]
pub struct Env<'a> {
    metadata: &'a metadata::Metadata,
}

/// The entities bound to the parameters of the lambda being translated.
#[derive(Debug, Clone)]
pub struct Scope<'a> {
    bindings: BTreeMap<sql::ast::ParameterName, BoundEntity<'a>>,
}

#[derive(Debug, Clone)]
struct BoundEntity<'a> {
    name: &'a str,
    info: &'a metadata::EntityInfo,
}

/// A property access resolved against the declared fields of its entity.
#[derive(Debug, Clone)]
pub struct ResolvedField<'a> {
    pub parameter: &'a sql::ast::ParameterName,
    pub column_name: String,
    pub info: &'a metadata::FieldInfo,
}

impl<'a> Env<'a> {
    pub fn new(metadata: &'a metadata::Metadata) -> Env<'a> {
        Env { metadata }
    }

    /// Lookup an entity's declared fields in the metadata.
    pub fn lookup_entity(
        &self,
        entity: &sql::ast::EntityName,
    ) -> Result<(&'a str, &'a metadata::EntityInfo), Error> {
        self.metadata
            .entities
            .0
            .get_key_value(&entity.0)
            .map(|(name, info)| (name.as_str(), info))
            .ok_or_else(|| Error::EntityNotFound(entity.0.clone()))
    }

    /// Lookup a table's information in the registry.
    pub fn lookup_table(&self, table_id: &str) -> Result<&'a metadata::TableInfo, Error> {
        self.metadata
            .tables
            .0
            .get(table_id)
            .ok_or_else(|| Error::InvalidTable(table_id.to_string()))
    }

    /// Resolve a logical table id in a schema to `schema.physical_name`.
    pub fn resolve_qualified_name(&self, table_id: &str, schema: &str) -> Result<String, Error> {
        let table = self.lookup_table(table_id)?;
        if table.schemas.contains(schema) {
            Ok(format!("{schema}.{}", table.table_name))
        } else {
            Err(Error::InvalidSchema {
                table: table_id.to_string(),
                schema: schema.to_string(),
            })
        }
    }

    /// Bind each parameter to its entity. A parameter name may only be bound once.
    pub fn bind(&self, parameters: &[sql::ast::Parameter]) -> Result<Scope<'a>, Error> {
        let mut bindings = BTreeMap::new();
        for parameter in parameters {
            let (name, info) = self.lookup_entity(&parameter.entity)?;
            if bindings
                .insert(parameter.name.clone(), BoundEntity { name, info })
                .is_some()
            {
                return Err(Error::InvalidConstruct(format!(
                    "lambda binding parameter '{}' twice",
                    parameter.name.0
                )));
            }
        }
        Ok(Scope { bindings })
    }
}

impl Scope<'_> {
    /// Resolve a property access against the entity bound to its parameter.
    pub fn lookup_field<'s>(
        &'s self,
        access: &'s sql::ast::PropertyAccess,
    ) -> Result<ResolvedField<'s>, Error> {
        let entity = self
            .bindings
            .get(&access.parameter)
            .ok_or_else(|| Error::ParameterNotFound(access.parameter.0.clone()))?;
        let path = access.dotted_path();
        let info = entity
            .info
            .fields
            .get(&path)
            .ok_or_else(|| Error::UnresolvedProperty {
                path: path.clone(),
                root: entity.name.to_string(),
            })?;
        Ok(ResolvedField {
            parameter: &access.parameter,
            column_name: info.column_name(&path),
            info,
        })
    }
}

impl ResolvedField<'_> {
    /// The column reference for this field in the given alias mode.
    pub fn to_column_reference(&self, alias_mode: AliasMode) -> String {
        match alias_mode {
            AliasMode::Unqualified => self.column_name.clone(),
            AliasMode::Qualified => format!("{}.{}", self.parameter.0, self.column_name),
        }
    }
}
