//! Translate aggregate and window function invocations.
//!
//! Each invocation is translated to a standalone fragment which is handed straight back to
//! the caller, so a projection with several aggregates never has more than one fragment
//! in flight.

use query_engine_sql::sql;

use super::error::Error;
use super::expression::translate_expression;
use super::helpers::{AliasMode, Scope};
use super::typing::Type;

/// Translate an aggregate invocation to a fragment such as `MAX(createddate)` or
/// `COUNT(CASE WHEN (active = 1) THEN 1 END) OVER(PARTITION BY value)`.
pub fn translate(
    scope: &Scope,
    invocation: &sql::ast::AggregateInvocation,
    alias_mode: AliasMode,
) -> Result<String, Error> {
    let function = invocation.function;

    if invocation.case_result.is_some() && function != sql::ast::AggregateFunction::Count {
        return Err(Error::InvalidConstruct(format!(
            "{function:?} aggregate with a CASE result, only Count takes one"
        )));
    }

    let mut fragment = match (function.percentile(), &invocation.argument) {
        (Some(fraction), Some(argument)) => {
            if invocation.partition_by.is_empty() {
                return Err(Error::InvalidConstruct(format!(
                    "{function:?} aggregate without a partition"
                )));
            }
            if invocation.distinct {
                return Err(Error::InvalidConstruct(format!(
                    "distinct {function:?} aggregate"
                )));
            }
            let (argument, _) = translate_expression(scope, argument, alias_mode)?;
            format!(
                "{}({fraction}) WITHIN GROUP(ORDER BY {argument})",
                function.name()
            )
        }
        (_, None) => {
            if function != sql::ast::AggregateFunction::Count {
                return Err(Error::InvalidConstruct(format!(
                    "{function:?} aggregate without an argument"
                )));
            }
            if invocation.distinct {
                return Err(Error::InvalidConstruct(
                    "distinct Count without an argument".to_string(),
                ));
            }
            format!("{}(*)", function.name())
        }
        (None, Some(argument)) => {
            let distinct = if invocation.distinct { "distinct " } else { "" };
            let (argument, argument_type) = translate_expression(scope, argument, alias_mode)?;
            if argument_type == Type::BOOLEAN {
                let then_value = match &invocation.case_result {
                    Some(case_result) => translate_expression(scope, case_result, alias_mode)?.0,
                    None => "1".to_string(),
                };
                format!(
                    "{}({distinct}CASE WHEN {argument} THEN {then_value} END)",
                    function.name()
                )
            } else if invocation.case_result.is_some() {
                return Err(Error::InvalidConstruct(format!(
                    "CASE result for a Count over a {argument_type} argument"
                )));
            } else {
                format!("{}({distinct}{argument})", function.name())
            }
        }
    };

    if !invocation.partition_by.is_empty() {
        let partitions = invocation
            .partition_by
            .iter()
            .map(|partition| translate_expression(scope, partition, alias_mode).map(|(p, _)| p))
            .collect::<Result<Vec<_>, Error>>()?;
        fragment.push_str(" OVER(PARTITION BY ");
        fragment.push_str(&partitions.join(", "));
        fragment.push(')');
    }

    tracing::debug!(sql = %fragment, "translated aggregate");
    Ok(fragment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use query_engine_metadata::metadata;
    use query_engine_sql::sql::helpers::*;
    use similar_asserts::assert_eq;

    use crate::translation::helpers::Env;

    fn metadata() -> metadata::Metadata {
        let mut entity = metadata::EntityInfo::default();
        for (name, scalar_type) in [
            ("id", metadata::ScalarType::Integer),
            ("value", metadata::ScalarType::Text),
            ("score", metadata::ScalarType::Real),
            ("active", metadata::ScalarType::Boolean),
            ("createdDate", metadata::ScalarType::Timestamp),
        ] {
            entity
                .fields
                .insert(name.to_string(), metadata::FieldInfo::new(scalar_type));
        }
        let mut metadata = metadata::Metadata::empty();
        metadata.entities.0.insert("Row".to_string(), entity);
        metadata
    }

    fn translate_aggregate(invocation: &sql::ast::AggregateInvocation) -> Result<String, Error> {
        let metadata = metadata();
        let env = Env::new(&metadata);
        let scope = env.bind(&[parameter("r", "Row")])?;
        translate(&scope, invocation, AliasMode::Unqualified)
    }

    #[test]
    fn bare_count() {
        assert_eq!(translate_aggregate(&count_star()).unwrap(), "COUNT(*)");
        assert_eq!(
            translate_aggregate(&count_star().partitioned_by(field("r", "value"))).unwrap(),
            "COUNT(*) OVER(PARTITION BY value)"
        );
        assert!(matches!(
            translate_aggregate(&count_star().distinct()),
            Err(Error::InvalidConstruct(_))
        ));
    }

    #[test]
    fn plain_aggregates() {
        assert_eq!(
            translate_aggregate(&max(field("r", "createdDate"))).unwrap(),
            "MAX(createddate)"
        );
        assert_eq!(
            translate_aggregate(&count(field("r", "value")).distinct()).unwrap(),
            "COUNT(distinct value)"
        );
        assert_eq!(
            translate_aggregate(&sum(field("r", "score")).partitioned_by(field("r", "value")))
                .unwrap(),
            "SUM(score) OVER(PARTITION BY value)"
        );
    }

    #[test]
    fn conditional_count() {
        assert_eq!(
            translate_aggregate(&count_if(eq(field("r", "active"), constant(true)), None))
                .unwrap(),
            "COUNT(CASE WHEN (active = 1) THEN 1 END)"
        );
        assert_eq!(
            translate_aggregate(
                &count_if(field("r", "active"), Some(field("r", "id")))
                    .partitioned_by(field("r", "value"))
            )
            .unwrap(),
            "COUNT(CASE WHEN active THEN id END) OVER(PARTITION BY value)"
        );
    }

    #[test]
    fn case_results_belong_to_count() {
        let invocation = sql::ast::AggregateInvocation {
            case_result: Some(constant(2)),
            ..sum(field("r", "active"))
        };
        assert!(matches!(
            translate_aggregate(&invocation),
            Err(Error::InvalidConstruct(_))
        ));
        assert!(matches!(
            translate_aggregate(&count_if(field("r", "id"), Some(constant(2)))),
            Err(Error::InvalidConstruct(_))
        ));
    }

    #[test]
    fn quartiles() {
        assert_eq!(
            translate_aggregate(&first_quartile(field("r", "score"), field("r", "value")))
                .unwrap(),
            "PERCENTILE_CONT(0.25) WITHIN GROUP(ORDER BY score) OVER(PARTITION BY value)"
        );
        assert_eq!(
            translate_aggregate(&third_quartile(field("r", "score"), field("r", "value")))
                .unwrap(),
            "PERCENTILE_CONT(0.75) WITHIN GROUP(ORDER BY score) OVER(PARTITION BY value)"
        );
        assert!(matches!(
            translate_aggregate(&aggregate(
                sql::ast::AggregateFunction::Percentile25,
                field("r", "score")
            )),
            Err(Error::InvalidConstruct(_))
        ));
    }

    #[test]
    fn quartiles_cannot_be_distinct() {
        for quartile in [first_quartile, third_quartile] {
            assert!(matches!(
                translate_aggregate(&quartile(field("r", "score"), field("r", "value")).distinct()),
                Err(Error::InvalidConstruct(_))
            ));
        }
    }

    #[test]
    fn every_function_but_count_needs_an_argument() {
        for function in enum_iterator::all::<sql::ast::AggregateFunction>() {
            let invocation = sql::ast::AggregateInvocation {
                function,
                ..count_star().partitioned_by(field("r", "value"))
            };
            let result = translate_aggregate(&invocation);
            if function == sql::ast::AggregateFunction::Count {
                assert!(result.is_ok(), "{result:?}");
            } else {
                assert!(
                    matches!(result, Err(Error::InvalidConstruct(_))),
                    "{function:?}: {result:?}"
                );
            }
        }
    }

    #[test]
    fn arguments_are_type_checked() {
        assert_eq!(
            translate_aggregate(&max(field("r", "missing"))),
            Err(Error::UnresolvedProperty {
                path: "missing".to_string(),
                root: "Row".to_string()
            })
        );
    }
}
