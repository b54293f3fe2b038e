use std::collections::BTreeSet;

use query_engine_metadata::metadata;

/// The `FooTableEntity` entity and the `FooTable`/`GooTable` registry entries.
pub fn foo_table_metadata() -> metadata::Metadata {
    let mut entity = metadata::EntityInfo {
        description: Some("A row of footable".to_string()),
        ..metadata::EntityInfo::default()
    };
    for (name, scalar_type) in [
        ("value", metadata::ScalarType::Text),
        ("createdDate", metadata::ScalarType::Timestamp),
        ("id", metadata::ScalarType::Integer),
    ] {
        entity
            .fields
            .insert(name.to_string(), metadata::FieldInfo::new(scalar_type));
    }

    let mut metadata = metadata::Metadata::empty();
    metadata
        .entities
        .0
        .insert("FooTableEntity".to_string(), entity);
    metadata.tables.0.insert(
        "FooTable".to_string(),
        table("footable", &["schema1", "schema2"], Some("FooTableEntity")),
    );
    metadata
        .tables
        .0
        .insert("GooTable".to_string(), table("gootable", &["schema3"], None));
    metadata
}

fn table(table_name: &str, schemas: &[&str], entity: Option<&str>) -> metadata::TableInfo {
    metadata::TableInfo {
        table_name: table_name.to_string(),
        schemas: schemas
            .iter()
            .map(ToString::to_string)
            .collect::<BTreeSet<_>>(),
        entity: entity.map(ToString::to_string),
        description: None,
    }
}
