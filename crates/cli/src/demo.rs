//! The demonstration query: the most recent `YOLO` rows of a handful of ids, grouped by value.

use query_engine_metadata::metadata::{self, ScalarType};
use query_engine_sql::sql::helpers::*;
use query_engine_translation::translation::error::Error;
use query_engine_translation::translation::helpers::{AliasMode, Env};
use query_engine_translation::translation::query::QueryBuilder;
use query_engine_translation::translation::values::CapturedValues;

const RANDOM_IDS: [i64; 4] = [1, 5, 66, 84];

pub fn build_statement(metadata: &metadata::Metadata, now: &str) -> Result<String, Error> {
    let captured = CapturedValues::new(serde_json::json!({
        "randomIds": RANDOM_IDS,
        "now": now,
    }));
    let fte = parameter("fte", "FooTableEntity");

    let selection = projection(
        fte.clone(),
        [
            ("value", field("fte", "value").into()),
            ("count", count_star().into()),
            ("maxDate", max(field("fte", "createdDate")).into()),
        ],
    );
    let filter = conjunction([
        member_of(captured.resolve("randomIds", None)?, field("fte", "id")),
        lte(
            field("fte", "createdDate"),
            captured.resolve("now", Some(ScalarType::Timestamp))?,
        ),
        starts_with(field("fte", "value"), "YOLO"),
    ])
    .map(|body| lambda(fte.clone(), body));

    let mut builder = QueryBuilder::new(Env::new(metadata));
    builder
        .select_projection(&selection, AliasMode::Unqualified, false)?
        .from_table("FooTable", "schema1", None)?;
    if let Some(filter) = &filter {
        builder.start_where(filter, AliasMode::Unqualified)?;
    }
    builder.start_group_by(&fte, &["value"], AliasMode::Unqualified)?;
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_configuration_builds_the_demo() {
        let metadata = warehouse_sql_configuration::ParsedConfiguration::initial().metadata;
        insta::assert_snapshot!(
            build_statement(&metadata, "2024-01-01 00:00:00").unwrap(),
            @"SELECT value AS value, COUNT(*) AS count, MAX(createddate) AS maxdate FROM schema1.footable WHERE ((id IN (1,5,66,84) AND (createddate <= '2024-01-01 00:00:00'::TIMESTAMP)) AND value ILIKE 'YOLO%') GROUP BY value"
        );
    }

    #[test]
    fn malformed_timestamps_are_rejected() {
        let metadata = warehouse_sql_configuration::ParsedConfiguration::initial().metadata;
        assert!(matches!(
            build_statement(&metadata, "yesterday"),
            Err(Error::TypeMismatch(_))
        ));
    }

    #[test]
    fn demo_needs_the_foo_table_entity() {
        assert_eq!(
            build_statement(&metadata::Metadata::empty(), "2024-01-01 00:00:00"),
            Err(Error::EntityNotFound("FooTableEntity".to_string()))
        );
    }
}
