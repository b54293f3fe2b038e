//! Type definitions of the typed expression tree.
//!
//! Trees are built once by the caller, never mutated, and consumed by a single
//! translation pass. Values captured from the caller's scope are folded into
//! [`Expression::Constant`] nodes before the tree is built.

use enum_iterator::Sequence;
use indexmap::IndexMap;

/// The name a lambda gives to the entity it ranges over, e.g. `fte` in `fte => fte.value`.
/// Doubles as the table alias in qualified alias mode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParameterName(pub String);

/// The name of a declared entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityName(pub String);

/// The name of a declared entity field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldName(pub String);

/// aliases that we give to result columns
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnAlias {
    pub name: String,
}

/// A lambda parameter together with the entity it is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: ParameterName,
    pub entity: EntityName,
}

/// A predicate or selector: an expression body over one or more bound parameters.
/// JOIN conditions bind two parameters, everything else binds one.
#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    pub parameters: Vec<Parameter>,
    pub body: Expression,
}

/// A scalar or boolean expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A literal value
    Constant(Value),
    /// A field of a bound parameter
    PropertyAccess(PropertyAccess),
    /// A binary operation on two expressions
    Binary {
        left: Box<Expression>,
        operator: BinaryOperator,
        right: Box<Expression>,
    },
    /// A unary operation
    Unary {
        operator: UnaryOperator,
        operand: Box<Expression>,
    },
    /// A call to one of the supported methods
    Call(Call),
}

/// A (possibly dotted) field path rooted at a lambda parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyAccess {
    pub parameter: ParameterName,
    pub path: Vec<FieldName>,
}

impl PropertyAccess {
    /// The path joined with dots, as fields are declared in the metadata.
    pub fn dotted_path(&self) -> String {
        self.path
            .iter()
            .map(|FieldName(name)| name.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Sequence)]
pub enum BinaryOperator {
    And,
    Or,
    Equals,
    NotEquals,
    LessThan,
    LessThanOrEqualTo,
    GreaterThan,
    GreaterThanOrEqualTo,
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl BinaryOperator {
    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOperator::And | BinaryOperator::Or)
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOperator::Add
                | BinaryOperator::Subtract
                | BinaryOperator::Multiply
                | BinaryOperator::Divide
        )
    }

    pub fn is_equality(self) -> bool {
        matches!(self, BinaryOperator::Equals | BinaryOperator::NotEquals)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Not,
    /// A type conversion, e.g. a nullable field used where a non-nullable one is expected.
    /// It has no SQL representation.
    Cast,
}

/// A method call. What `receiver` and `arguments` hold depends on the kind:
///
/// * string calls: the receiver is a text field, one argument holds the pattern or value.
/// * `SetMembership`: the receiver is an integer list constant, one argument holds the field.
/// * `NullableEquals`: the receiver and the single argument are the two compared values.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub kind: CallKind,
    pub receiver: Box<Expression>,
    pub arguments: Vec<Expression>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Sequence)]
pub enum CallKind {
    StringContains,
    StringStartsWith,
    StringEndsWith,
    StringEquals,
    SetMembership,
    NullableEquals,
}

/// A literal value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Timestamp(chrono::NaiveDateTime),
    IntList(Vec<i64>),
}

/// A SELECT list: result column names mapped to field expressions or aggregates, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub parameter: Parameter,
    pub bindings: IndexMap<ColumnAlias, ProjectionValue>,
}

/// The value of a single projection binding.
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectionValue {
    Field(Expression),
    Aggregate(AggregateInvocation),
}

/// An aggregate or window function call. Only valid as a projection binding value.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateInvocation {
    pub function: AggregateFunction,
    /// `None` means `COUNT(*)`.
    pub argument: Option<Expression>,
    /// Renders as `OVER(PARTITION BY ...)` when non-empty.
    pub partition_by: Vec<Expression>,
    pub distinct: bool,
    /// The `THEN` value used when a boolean argument is wrapped in a `CASE`. COUNT only.
    pub case_result: Option<Expression>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Sequence)]
pub enum AggregateFunction {
    Count,
    Sum,
    Min,
    Max,
    Avg,
    Median,
    Percentile25,
    Percentile75,
}

impl AggregateFunction {
    /// The SQL function name.
    pub fn name(self) -> &'static str {
        match self {
            AggregateFunction::Count => "COUNT",
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Max => "MAX",
            AggregateFunction::Avg => "AVG",
            AggregateFunction::Median => "MEDIAN",
            AggregateFunction::Percentile25 | AggregateFunction::Percentile75 => {
                "PERCENTILE_CONT"
            }
        }
    }

    /// The fraction for quartile functions.
    pub fn percentile(self) -> Option<&'static str> {
        match self {
            AggregateFunction::Percentile25 => Some("0.25"),
            AggregateFunction::Percentile75 => Some("0.75"),
            _ => None,
        }
    }
}

/// A direction for a single ORDER BY clause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderByDirection {
    Asc,
    Desc,
}
