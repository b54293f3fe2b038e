mod common;

use query_engine_metadata::metadata::ScalarType;
use query_engine_sql::sql;
use query_engine_sql::sql::helpers::*;
use query_engine_translation::translation::error::Error;
use query_engine_translation::translation::helpers::{AliasMode, Env};
use query_engine_translation::translation::query::{
    translate_condition, Conjunction, JoinKind, QueryBuilder,
};
use query_engine_translation::translation::values::CapturedValues;
use serde_json::json;

fn entity() -> sql::ast::Parameter {
    parameter("fte", "FooTableEntity")
}

/// `id IN randomIds AND createdDate <= now AND value starts with "YOLO"`, with the
/// right hand sides folded from captured values.
fn filter(captured: &CapturedValues) -> Result<sql::ast::Lambda, Error> {
    let body = conjunction([
        member_of(captured.resolve("randomIds", None)?, field("fte", "id")),
        lte(
            field("fte", "createdDate"),
            captured.resolve("now", Some(ScalarType::Timestamp))?,
        ),
        starts_with(field("fte", "value"), "YOLO"),
    ])
    .ok_or_else(|| Error::InvalidConstruct("empty filter".to_string()))?;
    Ok(lambda(entity(), body))
}

fn captured() -> CapturedValues {
    CapturedValues::new(json!({
        "randomIds": [1, 5, 66, 84],
        "now": "2024-01-01 00:00:00",
    }))
}

#[test]
fn grouped_aggregates_over_a_filtered_table() -> Result<(), Error> {
    let metadata = common::foo_table_metadata();
    let projection = projection(
        entity(),
        [
            ("value", field("fte", "value").into()),
            ("count", count_star().into()),
            ("maxDate", max(field("fte", "createdDate")).into()),
        ],
    );

    let mut builder = QueryBuilder::new(Env::new(&metadata));
    builder
        .select_projection(&projection, AliasMode::Unqualified, false)?
        .from_table("FooTable", "schema1", None)?
        .start_where(&filter(&captured())?, AliasMode::Unqualified)?
        .start_group_by(&entity(), &["value"], AliasMode::Unqualified)?;
    let statement = builder.build()?;

    insta::assert_snapshot!(statement, @"SELECT value AS value, COUNT(*) AS count, MAX(createddate) AS maxdate FROM schema1.footable WHERE ((id IN (1,5,66,84) AND (createddate <= '2024-01-01 00:00:00'::TIMESTAMP)) AND value ILIKE 'YOLO%') GROUP BY value");

    let (_, after_where) = statement
        .split_once(" WHERE ")
        .expect("statement has a WHERE clause");
    let (where_clause, group_by) = after_where
        .split_once(" GROUP BY ")
        .expect("statement has a GROUP BY clause");
    similar_asserts::assert_eq!(
        where_clause.matches('(').count(),
        where_clause.matches(')').count()
    );
    similar_asserts::assert_eq!(group_by, "value");
    Ok(())
}

#[test]
fn windowed_aggregates_with_pagination() -> Result<(), Error> {
    let metadata = common::foo_table_metadata();
    let projection = projection(
        entity(),
        [
            ("value", field("fte", "value").into()),
            (
                "recent",
                count_if(
                    gt(
                        field("fte", "createdDate"),
                        captured().resolve("now", Some(ScalarType::Timestamp))?,
                    ),
                    None,
                )
                .partitioned_by(field("fte", "value"))
                .into(),
            ),
            (
                "firstQuartile",
                first_quartile(field("fte", "id"), field("fte", "value")).into(),
            ),
        ],
    );

    let mut builder = QueryBuilder::new(Env::new(&metadata));
    builder
        .select_projection(&projection, AliasMode::Qualified, true)?
        .from_table("FooTable", "schema2", Some("fte"))?
        .add_where(
            &lambda(entity(), not(eq(field("fte", "value"), null()))),
            Conjunction::And,
            AliasMode::Qualified,
        )?
        .order_by(
            &entity(),
            &["createdDate"],
            sql::ast::OrderByDirection::Desc,
            AliasMode::Qualified,
        )?
        .limit_offset(20, 3);

    insta::assert_snapshot!(builder.build()?, @"SELECT distinct fte.value AS value, COUNT(CASE WHEN (fte.createddate > '2024-01-01 00:00:00'::TIMESTAMP) THEN 1 END) OVER(PARTITION BY fte.value) AS recent, PERCENTILE_CONT(0.25) WITHIN GROUP(ORDER BY fte.id) OVER(PARTITION BY fte.value) AS firstquartile FROM schema2.footable fte WHERE NOT (fte.value IS NULL) ORDER BY fte.createddate DESC LIMIT 20 OFFSET 40");
    Ok(())
}

#[test]
fn join_against_a_subquery() -> Result<(), Error> {
    let metadata = common::foo_table_metadata();
    let env = Env::new(&metadata);

    let mut inner = QueryBuilder::new(env);
    inner
        .select_fields(&entity(), &["id"], AliasMode::Unqualified, true)?
        .from_table("FooTable", "schema2", None)?
        .start_where(
            &lambda(entity(), ends_with(field("fte", "value"), "X")),
            AliasMode::Unqualified,
        )?;
    let inner = inner.build()?;

    let on = join_lambda(
        entity(),
        parameter("other", "FooTableEntity"),
        nullable_equals(field("fte", "id"), field("other", "id")),
    );
    let mut outer = QueryBuilder::new(env);
    outer
        .select_fields(&entity(), &["value", "id"], AliasMode::Qualified, false)?
        .from_table("FooTable", "schema1", Some("fte"))?
        .join_subquery(JoinKind::Left, &inner, "other", &on)?;

    insta::assert_snapshot!(outer.build()?, @"SELECT fte.value, fte.id FROM schema1.footable fte LEFT JOIN (SELECT distinct id FROM schema2.footable WHERE value ILIKE '%X') other ON ((fte.id IS NULL AND other.id IS NULL) OR (fte.id = other.id))");
    Ok(())
}

#[test]
fn registry_lookups() {
    let metadata = common::foo_table_metadata();
    let env = Env::new(&metadata);

    assert_eq!(
        env.resolve_qualified_name("GooTable", "schema3"),
        Ok("schema3.gootable".to_string())
    );
    assert_eq!(
        env.resolve_qualified_name("GooTable", "schema1"),
        Err(Error::InvalidSchema {
            table: "GooTable".to_string(),
            schema: "schema1".to_string()
        })
    );
    assert_eq!(
        env.resolve_qualified_name("HooTable", "schema1"),
        Err(Error::InvalidTable("HooTable".to_string()))
    );
}

#[test]
fn negated_predicates() -> Result<(), Error> {
    let metadata = common::foo_table_metadata();
    let env = Env::new(&metadata);
    let condition = |body| lambda(entity(), body);

    assert_eq!(
        translate_condition(
            &env,
            &condition(not(starts_with(field("fte", "value"), "YOLO"))),
            AliasMode::Unqualified
        )?,
        "value NOT ILIKE 'YOLO%'"
    );
    assert_eq!(
        translate_condition(
            &env,
            &condition(not(is_in(vec![1, 5, 66, 84], field("fte", "id")))),
            AliasMode::Unqualified
        )?,
        "id NOT IN (1,5,66,84)"
    );
    assert_eq!(
        translate_condition(
            &env,
            &condition(not_eq(field("fte", "createdDate"), null())),
            AliasMode::Unqualified
        )?,
        "(createddate IS NOT NULL)"
    );
    Ok(())
}

#[test]
fn unresolved_properties_fail_before_output() {
    let metadata = common::foo_table_metadata();
    let mut builder = QueryBuilder::new(Env::new(&metadata));
    assert_eq!(
        builder
            .start_where(
                &lambda(entity(), eq(field("fte", "address.city"), constant("Paris"))),
                AliasMode::Unqualified
            )
            .unwrap_err(),
        Error::UnresolvedProperty {
            path: "address.city".to_string(),
            root: "FooTableEntity".to_string()
        }
    );
    assert_eq!(builder.build(), Ok(String::new()));
}
