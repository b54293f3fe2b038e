//! Static type checking of expression trees.
//!
//! Runs over a whole tree before any text is produced for it, so an ill-typed tree never
//! yields a partial fragment.

use query_engine_metadata::metadata::ScalarType;
use query_engine_sql::sql;

use super::error::Error;
use super::helpers::Scope;

/// The static type of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    Scalar(ScalarType),
    /// The type of a NULL literal.
    Null,
    IntegerList,
}

impl Type {
    pub const BOOLEAN: Type = Type::Scalar(ScalarType::Boolean);

    fn scalar(self) -> Option<ScalarType> {
        match self {
            Type::Scalar(scalar_type) => Some(scalar_type),
            Type::Null | Type::IntegerList => None,
        }
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Type::Scalar(scalar_type) => write!(f, "{scalar_type}"),
            Type::Null => write!(f, "null"),
            Type::IntegerList => write!(f, "integer list"),
        }
    }
}

/// The type of a literal value.
pub fn type_of_value(value: &sql::ast::Value) -> Type {
    match value {
        sql::ast::Value::Null => Type::Null,
        sql::ast::Value::Bool(_) => Type::BOOLEAN,
        sql::ast::Value::Int(_) => Type::Scalar(ScalarType::Bigint),
        sql::ast::Value::Float(_) => Type::Scalar(ScalarType::DoublePrecision),
        sql::ast::Value::String(_) => Type::Scalar(ScalarType::Text),
        sql::ast::Value::Timestamp(_) => Type::Scalar(ScalarType::Timestamp),
        sql::ast::Value::IntList(_) => Type::IntegerList,
    }
}

/// Infer the type of an expression, checking operand compatibility on the way.
pub fn infer(scope: &Scope, expression: &sql::ast::Expression) -> Result<Type, Error> {
    match expression {
        sql::ast::Expression::Constant(value) => Ok(type_of_value(value)),
        sql::ast::Expression::PropertyAccess(access) => {
            let field = scope.lookup_field(access)?;
            Ok(Type::Scalar(field.info.r#type))
        }
        sql::ast::Expression::Binary {
            left,
            operator,
            right,
        } => infer_binary(*operator, infer(scope, left)?, infer(scope, right)?),
        sql::ast::Expression::Unary {
            operator: sql::ast::UnaryOperator::Not,
            operand,
        } => {
            expect_type(infer(scope, operand)?, Type::BOOLEAN, "NOT")?;
            Ok(Type::BOOLEAN)
        }
        sql::ast::Expression::Unary {
            operator: sql::ast::UnaryOperator::Cast,
            operand,
        } => infer(scope, operand),
        sql::ast::Expression::Call(call) => infer_call(scope, call),
    }
}

fn infer_binary(
    operator: sql::ast::BinaryOperator,
    left: Type,
    right: Type,
) -> Result<Type, Error> {
    if operator.is_logical() {
        expect_type(left, Type::BOOLEAN, &format!("{operator:?}"))?;
        expect_type(right, Type::BOOLEAN, &format!("{operator:?}"))?;
        Ok(Type::BOOLEAN)
    } else if operator.is_arithmetic() {
        match (left.scalar(), right.scalar()) {
            (Some(l), Some(r)) if l.is_numeric() && r.is_numeric() => Ok(Type::Scalar(
                if l == r {
                    l
                } else if l.is_integer() && r.is_integer() {
                    ScalarType::Bigint
                } else {
                    ScalarType::Numeric
                },
            )),
            _ => Err(Error::TypeMismatch(format!(
                "{operator:?} expects numeric operands, got {left} and {right}"
            ))),
        }
    } else {
        match (left, right) {
            (Type::Null, Type::Null | Type::Scalar(_)) | (Type::Scalar(_), Type::Null) => {
                if operator.is_equality() {
                    Ok(Type::BOOLEAN)
                } else {
                    Err(Error::TypeMismatch(format!(
                        "NULL can only be compared with Equals or NotEquals, not {operator:?}"
                    )))
                }
            }
            (Type::Scalar(l), Type::Scalar(r)) if l.is_comparable_with(r) => Ok(Type::BOOLEAN),
            _ => Err(Error::TypeMismatch(format!(
                "cannot compare {left} with {right} using {operator:?}"
            ))),
        }
    }
}

fn infer_call(scope: &Scope, call: &sql::ast::Call) -> Result<Type, Error> {
    let argument = single_argument(call)?;
    match call.kind {
        sql::ast::CallKind::StringContains
        | sql::ast::CallKind::StringStartsWith
        | sql::ast::CallKind::StringEndsWith
        | sql::ast::CallKind::StringEquals => {
            expect_text(infer(scope, &call.receiver)?, call.kind, "receiver")?;
            expect_text(infer(scope, argument)?, call.kind, "argument")?;
        }
        sql::ast::CallKind::SetMembership => {
            expect_type(
                infer(scope, &call.receiver)?,
                Type::IntegerList,
                "SetMembership values",
            )?;
            match infer(scope, argument)? {
                Type::Scalar(scalar_type) if scalar_type.is_integer() => {}
                other => {
                    return Err(Error::TypeMismatch(format!(
                        "SetMembership expects an integer field, got {other}"
                    )))
                }
            }
        }
        sql::ast::CallKind::NullableEquals => {
            let left = infer(scope, &call.receiver)?;
            let right = infer(scope, argument)?;
            match (left.scalar(), right.scalar()) {
                (Some(l), Some(r)) if l.is_comparable_with(r) => {}
                _ => {
                    return Err(Error::TypeMismatch(format!(
                        "NullableEquals cannot compare {left} with {right}"
                    )))
                }
            }
        }
    }
    Ok(Type::BOOLEAN)
}

/// Every supported call takes exactly one argument besides its receiver.
pub fn single_argument(call: &sql::ast::Call) -> Result<&sql::ast::Expression, Error> {
    match call.arguments.as_slice() {
        [argument] => Ok(argument),
        arguments => Err(Error::InvalidConstruct(format!(
            "{:?} call with {} arguments",
            call.kind,
            arguments.len()
        ))),
    }
}

fn expect_type(actual: Type, expected: Type, context: &str) -> Result<(), Error> {
    if actual == expected {
        Ok(())
    } else {
        Err(Error::TypeMismatch(format!(
            "{context} expects {expected}, got {actual}"
        )))
    }
}

fn expect_text(actual: Type, kind: sql::ast::CallKind, position: &str) -> Result<(), Error> {
    match actual.scalar() {
        Some(scalar_type) if scalar_type.is_text() => Ok(()),
        _ => Err(Error::TypeMismatch(format!(
            "{kind:?} {position} expects text, got {actual}"
        ))),
    }
}
