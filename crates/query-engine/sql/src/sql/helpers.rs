//! Helpers for building sql::ast types in certain shapes and patterns.

use super::ast::*;

// Values //

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<chrono::NaiveDateTime> for Value {
    fn from(value: chrono::NaiveDateTime) -> Self {
        Value::Timestamp(value)
    }
}

impl From<Vec<i64>> for Value {
    fn from(value: Vec<i64>) -> Self {
        Value::IntList(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

// Names //

/// Create column aliases using this function so we build everything in one place.
pub fn make_column_alias(name: String) -> ColumnAlias {
    ColumnAlias { name }
}

/// Bind the parameter `name` to the entity `entity`.
pub fn parameter(name: &str, entity: &str) -> Parameter {
    Parameter {
        name: ParameterName(name.to_string()),
        entity: EntityName(entity.to_string()),
    }
}

/// A single-parameter lambda.
pub fn lambda(parameter: Parameter, body: Expression) -> Lambda {
    Lambda {
        parameters: vec![parameter],
        body,
    }
}

/// A two-parameter lambda, as used for JOIN conditions.
pub fn join_lambda(left: Parameter, right: Parameter, body: Expression) -> Lambda {
    Lambda {
        parameters: vec![left, right],
        body,
    }
}

// Scalars //

/// A field of `parameter`. `path` may be dotted for nested fields.
pub fn field(parameter: &str, path: &str) -> Expression {
    Expression::PropertyAccess(property_access(parameter, path))
}

pub fn property_access(parameter: &str, path: &str) -> PropertyAccess {
    PropertyAccess {
        parameter: ParameterName(parameter.to_string()),
        path: path
            .split('.')
            .map(|segment| FieldName(segment.to_string()))
            .collect(),
    }
}

pub fn constant(value: impl Into<Value>) -> Expression {
    Expression::Constant(value.into())
}

pub fn null() -> Expression {
    Expression::Constant(Value::Null)
}

pub fn binary(left: Expression, operator: BinaryOperator, right: Expression) -> Expression {
    Expression::Binary {
        left: Box::new(left),
        operator,
        right: Box::new(right),
    }
}

pub fn and(left: Expression, right: Expression) -> Expression {
    binary(left, BinaryOperator::And, right)
}

pub fn or(left: Expression, right: Expression) -> Expression {
    binary(left, BinaryOperator::Or, right)
}

pub fn eq(left: Expression, right: Expression) -> Expression {
    binary(left, BinaryOperator::Equals, right)
}

pub fn not_eq(left: Expression, right: Expression) -> Expression {
    binary(left, BinaryOperator::NotEquals, right)
}

pub fn lt(left: Expression, right: Expression) -> Expression {
    binary(left, BinaryOperator::LessThan, right)
}

pub fn lte(left: Expression, right: Expression) -> Expression {
    binary(left, BinaryOperator::LessThanOrEqualTo, right)
}

pub fn gt(left: Expression, right: Expression) -> Expression {
    binary(left, BinaryOperator::GreaterThan, right)
}

pub fn gte(left: Expression, right: Expression) -> Expression {
    binary(left, BinaryOperator::GreaterThanOrEqualTo, right)
}

pub fn not(operand: Expression) -> Expression {
    Expression::Unary {
        operator: UnaryOperator::Not,
        operand: Box::new(operand),
    }
}

pub fn cast(operand: Expression) -> Expression {
    Expression::Unary {
        operator: UnaryOperator::Cast,
        operand: Box::new(operand),
    }
}

/// Fold expressions into a left-nested chain of ANDs. `None` when there are none.
pub fn conjunction(expressions: impl IntoIterator<Item = Expression>) -> Option<Expression> {
    expressions.into_iter().reduce(and)
}

// Calls //

fn call(kind: CallKind, receiver: Expression, argument: Expression) -> Expression {
    Expression::Call(Call {
        kind,
        receiver: Box::new(receiver),
        arguments: vec![argument],
    })
}

/// `field ILIKE pattern`. The pattern carries its own wildcards, or is a positional parameter.
pub fn contains(field: Expression, pattern: Expression) -> Expression {
    call(CallKind::StringContains, field, pattern)
}

pub fn starts_with(field: Expression, prefix: &str) -> Expression {
    call(CallKind::StringStartsWith, field, constant(prefix))
}

pub fn ends_with(field: Expression, suffix: &str) -> Expression {
    call(CallKind::StringEndsWith, field, constant(suffix))
}

pub fn string_equals(field: Expression, value: &str) -> Expression {
    call(CallKind::StringEquals, field, constant(value))
}

/// `field IN (values...)`
pub fn is_in(values: Vec<i64>, field: Expression) -> Expression {
    member_of(constant(values), field)
}

/// `field IN (...)` where `values` is an already folded list constant.
pub fn member_of(values: Expression, field: Expression) -> Expression {
    call(CallKind::SetMembership, values, field)
}

/// Equality which also holds when both sides are NULL.
pub fn nullable_equals(left: Expression, right: Expression) -> Expression {
    call(CallKind::NullableEquals, left, right)
}

// Aggregates //

pub fn aggregate(function: AggregateFunction, argument: Expression) -> AggregateInvocation {
    AggregateInvocation {
        function,
        argument: Some(argument),
        partition_by: vec![],
        distinct: false,
        case_result: None,
    }
}

/// `COUNT(*)`
pub fn count_star() -> AggregateInvocation {
    AggregateInvocation {
        function: AggregateFunction::Count,
        argument: None,
        partition_by: vec![],
        distinct: false,
        case_result: None,
    }
}

pub fn count(argument: Expression) -> AggregateInvocation {
    aggregate(AggregateFunction::Count, argument)
}

/// Conditional count: `COUNT(CASE WHEN condition THEN then_value END)`, `then_value` defaulting to 1.
pub fn count_if(condition: Expression, then_value: Option<Expression>) -> AggregateInvocation {
    AggregateInvocation {
        case_result: then_value,
        ..aggregate(AggregateFunction::Count, condition)
    }
}

pub fn sum(argument: Expression) -> AggregateInvocation {
    aggregate(AggregateFunction::Sum, argument)
}

pub fn min(argument: Expression) -> AggregateInvocation {
    aggregate(AggregateFunction::Min, argument)
}

pub fn max(argument: Expression) -> AggregateInvocation {
    aggregate(AggregateFunction::Max, argument)
}

pub fn avg(argument: Expression) -> AggregateInvocation {
    aggregate(AggregateFunction::Avg, argument)
}

pub fn median(argument: Expression) -> AggregateInvocation {
    aggregate(AggregateFunction::Median, argument)
}

pub fn first_quartile(argument: Expression, partition: Expression) -> AggregateInvocation {
    aggregate(AggregateFunction::Percentile25, argument).partitioned_by(partition)
}

pub fn third_quartile(argument: Expression, partition: Expression) -> AggregateInvocation {
    aggregate(AggregateFunction::Percentile75, argument).partitioned_by(partition)
}

impl AggregateInvocation {
    /// Add a PARTITION BY expression, turning the aggregate into a window function.
    #[must_use]
    pub fn partitioned_by(mut self, partition: Expression) -> Self {
        self.partition_by.push(partition);
        self
    }

    #[must_use]
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }
}

// Projections //

/// Build a projection from `(column alias, value)` pairs, keeping their order.
pub fn projection(
    parameter: Parameter,
    bindings: impl IntoIterator<Item = (&'static str, ProjectionValue)>,
) -> Projection {
    Projection {
        parameter,
        bindings: bindings
            .into_iter()
            .map(|(alias, value)| (make_column_alias(alias.to_string()), value))
            .collect(),
    }
}

impl From<Expression> for ProjectionValue {
    fn from(expression: Expression) -> Self {
        ProjectionValue::Field(expression)
    }
}

impl From<AggregateInvocation> for ProjectionValue {
    fn from(aggregate: AggregateInvocation) -> Self {
        ProjectionValue::Aggregate(aggregate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotted_fields_are_split_into_segments() {
        let Expression::PropertyAccess(access) = field("fte", "address.city") else {
            panic!("expected a property access");
        };
        assert_eq!(access.path.len(), 2);
        assert_eq!(access.dotted_path(), "address.city");
        assert_eq!(access.parameter, ParameterName("fte".to_string()));
    }

    #[test]
    fn conjunction_nests_to_the_left() {
        let a = field("f", "a");
        let b = field("f", "b");
        let c = field("f", "c");
        assert_eq!(
            conjunction([a.clone(), b.clone(), c.clone()]),
            Some(and(and(a, b), c))
        );
        assert_eq!(conjunction(Vec::new()), None);
    }

    #[test]
    fn options_become_null_when_absent() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(3_i64)), Value::Int(3));
    }
}
