//! Translate expression trees into SQL fragments.

use query_engine_sql::sql;
use query_engine_sql::sql::string::SQL;

use super::error::Error;
use super::helpers::{AliasMode, Env, Scope};
use super::typing::{self, Type};
use super::values::TIMESTAMP_FORMAT;

/// Characters after which a string constant is emitted without its own quotes: the caller has
/// opened the literal already, e.g. `ILIKE '` or `ILIKE '%`.
const OPEN_LITERAL_SUFFIXES: [char; 2] = ['\'', '%'];

/// Translate the body of a lambda, binding its parameters first.
pub fn translate_lambda(
    env: &Env,
    lambda: &sql::ast::Lambda,
    alias_mode: AliasMode,
) -> Result<(String, Type), Error> {
    let scope = env.bind(&lambda.parameters)?;
    translate_expression(&scope, &lambda.body, alias_mode)
}

/// Type check and translate an expression. Returns the fragment and the expression's type.
pub fn translate_expression(
    scope: &Scope,
    expression: &sql::ast::Expression,
    alias_mode: AliasMode,
) -> Result<(String, Type), Error> {
    let expression_type = typing::infer(scope, expression)?;

    let mut translator = Translator::new(scope, alias_mode);
    translator.translate(expression)?;
    let fragment = translator.into_sql();

    if !fragment.has_balanced_parentheses() {
        return Err(Error::ImbalancedOutput(fragment.sql));
    }
    tracing::debug!(sql = %fragment, "translated expression");
    Ok((fragment.sql, expression_type))
}

/// A single traversal over one expression tree.
///
/// `negate` is set by a `Not` node and consumed by the next node translated: calls place
/// the `NOT` inside their own syntax, every other node is prefixed with it.
struct Translator<'a> {
    scope: &'a Scope<'a>,
    alias_mode: AliasMode,
    negate: bool,
    sql: SQL,
}

impl<'a> Translator<'a> {
    fn new(scope: &'a Scope<'a>, alias_mode: AliasMode) -> Self {
        Translator {
            scope,
            alias_mode,
            negate: false,
            sql: SQL::new(),
        }
    }

    fn into_sql(self) -> SQL {
        self.sql
    }

    fn take_negate(&mut self) -> bool {
        std::mem::take(&mut self.negate)
    }

    fn translate(&mut self, expression: &sql::ast::Expression) -> Result<(), Error> {
        match expression {
            sql::ast::Expression::Unary {
                operator: sql::ast::UnaryOperator::Not,
                operand,
            } => {
                self.negate = !self.negate;
                self.translate(operand)?;
                self.negate = false;
                Ok(())
            }
            sql::ast::Expression::Unary {
                operator: sql::ast::UnaryOperator::Cast,
                operand,
            } => self.translate(operand),
            sql::ast::Expression::Call(call) => self.translate_call(call),
            sql::ast::Expression::Constant(value) => {
                self.prefix_negation();
                self.translate_constant(value)
            }
            sql::ast::Expression::PropertyAccess(access) => {
                self.prefix_negation();
                self.translate_property(access)
            }
            sql::ast::Expression::Binary {
                left,
                operator,
                right,
            } => {
                self.prefix_negation();
                self.translate_binary(left, *operator, right)
            }
        }
    }

    fn prefix_negation(&mut self) {
        if self.take_negate() {
            self.sql.append_syntax("NOT ");
        }
    }

    fn translate_constant(&mut self, value: &sql::ast::Value) -> Result<(), Error> {
        match value {
            sql::ast::Value::Null => self.sql.append_syntax("NULL"),
            sql::ast::Value::Bool(b) => self.sql.append_syntax(if *b { "1" } else { "0" }),
            sql::ast::Value::Int(i) => self.sql.append_syntax(&i.to_string()),
            sql::ast::Value::Float(f) => self.sql.append_syntax(&format!("{f:.2}")),
            sql::ast::Value::String(s) => {
                if self.sql.ends_with_any(&OPEN_LITERAL_SUFFIXES)
                    || s == sql::string::POSITIONAL_PARAMETER
                {
                    self.sql.append_syntax(s);
                } else {
                    self.sql.append_syntax("'");
                    self.sql.append_syntax(s);
                    self.sql.append_syntax("'");
                }
            }
            sql::ast::Value::Timestamp(ts) => self
                .sql
                .append_syntax(&format!("'{}'::TIMESTAMP", ts.format(TIMESTAMP_FORMAT))),
            sql::ast::Value::IntList(_) => {
                return Err(Error::UnsupportedConstruct(
                    "An integer list outside of a set membership test".to_string(),
                ))
            }
        }
        Ok(())
    }

    fn translate_property(&mut self, access: &sql::ast::PropertyAccess) -> Result<(), Error> {
        let field = self.scope.lookup_field(access)?;
        self.sql.append_syntax(&field.to_column_reference(self.alias_mode));
        Ok(())
    }

    fn translate_binary(
        &mut self,
        left: &sql::ast::Expression,
        operator: sql::ast::BinaryOperator,
        right: &sql::ast::Expression,
    ) -> Result<(), Error> {
        self.sql.append_syntax("(");
        self.translate(left)?;
        self.sql.append_syntax(binary_operator_to_sql(operator));
        self.translate(right)?;
        self.sql.append_syntax(")");
        self.sql.apply_cleanup_rewrites();
        Ok(())
    }

    fn translate_call(&mut self, call: &sql::ast::Call) -> Result<(), Error> {
        let negate = self.take_negate();
        let argument = typing::single_argument(call)?;
        match call.kind {
            sql::ast::CallKind::StringContains => {
                self.translate(&call.receiver)?;
                self.append_not(negate);
                self.sql.append_syntax(" ILIKE ");
                self.translate(argument)?;
            }
            sql::ast::CallKind::StringStartsWith => {
                let prefix = string_constant(call.kind, argument)?;
                self.translate(&call.receiver)?;
                self.append_not(negate);
                self.sql.append_syntax(" ILIKE '");
                self.translate_constant(prefix)?;
                self.sql.append_syntax("%'");
            }
            sql::ast::CallKind::StringEndsWith => {
                let suffix = string_constant(call.kind, argument)?;
                self.translate(&call.receiver)?;
                self.append_not(negate);
                self.sql.append_syntax(" ILIKE '%");
                self.translate_constant(suffix)?;
                self.sql.append_syntax("'");
            }
            sql::ast::CallKind::StringEquals => {
                let value = string_constant(call.kind, argument)?;
                self.translate(&call.receiver)?;
                self.sql.append_syntax(if negate { " != '" } else { " = '" });
                self.translate_constant(value)?;
                self.sql.append_syntax("'");
            }
            sql::ast::CallKind::SetMembership => {
                let values = integer_list(&call.receiver)?;
                if values.is_empty() {
                    tracing::warn!("set membership over an empty list; nothing is emitted");
                } else {
                    self.translate(argument)?;
                    self.append_not(negate);
                    self.sql.append_syntax(" IN (");
                    self.sql.append_syntax(
                        &values
                            .iter()
                            .map(ToString::to_string)
                            .collect::<Vec<_>>()
                            .join(","),
                    );
                    self.sql.append_syntax(")");
                }
            }
            sql::ast::CallKind::NullableEquals => {
                if negate {
                    self.sql.append_syntax("NOT ");
                }
                self.sql.append_syntax("((");
                self.translate(&call.receiver)?;
                self.sql.append_syntax(" IS NULL AND ");
                self.translate(argument)?;
                self.sql.append_syntax(" IS NULL) OR (");
                self.translate(&call.receiver)?;
                self.sql.append_syntax(" = ");
                self.translate(argument)?;
                self.sql.append_syntax("))");
            }
        }
        Ok(())
    }

    fn append_not(&mut self, negate: bool) {
        if negate {
            self.sql.append_syntax(" NOT");
        }
    }
}

fn binary_operator_to_sql(operator: sql::ast::BinaryOperator) -> &'static str {
    match operator {
        sql::ast::BinaryOperator::And => " AND ",
        sql::ast::BinaryOperator::Or => " OR ",
        sql::ast::BinaryOperator::Equals => " = ",
        sql::ast::BinaryOperator::NotEquals => " <> ",
        sql::ast::BinaryOperator::LessThan => " < ",
        sql::ast::BinaryOperator::LessThanOrEqualTo => " <= ",
        sql::ast::BinaryOperator::GreaterThan => " > ",
        sql::ast::BinaryOperator::GreaterThanOrEqualTo => " >= ",
        sql::ast::BinaryOperator::Add => " + ",
        sql::ast::BinaryOperator::Subtract => " - ",
        sql::ast::BinaryOperator::Multiply => " * ",
        sql::ast::BinaryOperator::Divide => " / ",
    }
}

/// Strip the conversions which have no SQL representation.
fn strip_casts(expression: &sql::ast::Expression) -> &sql::ast::Expression {
    match expression {
        sql::ast::Expression::Unary {
            operator: sql::ast::UnaryOperator::Cast,
            operand,
        } => strip_casts(operand),
        _ => expression,
    }
}

fn string_constant(
    kind: sql::ast::CallKind,
    argument: &sql::ast::Expression,
) -> Result<&sql::ast::Value, Error> {
    match strip_casts(argument) {
        sql::ast::Expression::Constant(value @ sql::ast::Value::String(_)) => Ok(value),
        _ => Err(Error::InvalidConstruct(format!(
            "{kind:?} call whose argument is not a string constant"
        ))),
    }
}

fn integer_list(receiver: &sql::ast::Expression) -> Result<&[i64], Error> {
    match strip_casts(receiver) {
        sql::ast::Expression::Constant(sql::ast::Value::IntList(values)) => Ok(values),
        _ => Err(Error::InvalidConstruct(
            "SetMembership call over something other than an integer list".to_string(),
        )),
    }
}
