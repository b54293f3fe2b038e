//! Handle the folding of captured values into literals.
//!
//! Values from the caller's scope (loop variables, the current time, request filters) are
//! resolved here, before the expression tree is built, and enter the tree as constants.

use query_engine_metadata::metadata::ScalarType;
use query_engine_sql::sql;

use super::error::Error;

/// The fixed text format of timestamp literals.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A JSON document holding the values captured from the caller's scope.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedValues(pub serde_json::Value);

impl CapturedValues {
    pub fn new(scope: serde_json::Value) -> Self {
        CapturedValues(scope)
    }

    /// Walk the dotted `path` through nested objects and fold the value found into a constant.
    /// `scalar_type` tells how to read values JSON cannot distinguish, e.g. timestamps.
    pub fn resolve(
        &self,
        path: &str,
        scalar_type: Option<ScalarType>,
    ) -> Result<sql::ast::Expression, Error> {
        let value = path
            .split('.')
            .try_fold(&self.0, |current, segment| current.get(segment))
            .ok_or_else(|| Error::UnresolvedProperty {
                path: path.to_string(),
                root: "captured values".to_string(),
            })?;
        Ok(sql::ast::Expression::Constant(translate_json_value(
            value,
            scalar_type,
        )?))
    }
}

/// Convert a JSON value into a SQL value.
pub fn translate_json_value(
    value: &serde_json::Value,
    scalar_type: Option<ScalarType>,
) -> Result<sql::ast::Value, Error> {
    match value {
        serde_json::Value::Null => Ok(sql::ast::Value::Null),
        serde_json::Value::Bool(b) => Ok(sql::ast::Value::Bool(*b)),
        serde_json::Value::Number(num) => {
            let wants_float = scalar_type.is_some_and(|t| t.is_numeric() && !t.is_integer());
            match (num.as_i64(), num.as_f64()) {
                (Some(i), _) if !wants_float => Ok(sql::ast::Value::Int(i)),
                (_, Some(f)) => Ok(sql::ast::Value::Float(f)),
                _ => Err(Error::UnsupportedConstruct(format!("number {num}"))),
            }
        }
        serde_json::Value::String(s) => match scalar_type {
            Some(ScalarType::Timestamp) => {
                chrono::NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
                    .map(sql::ast::Value::Timestamp)
                    .map_err(|err| {
                        Error::TypeMismatch(format!("'{s}' is not a timestamp ({err})"))
                    })
            }
            _ => Ok(sql::ast::Value::String(s.clone())),
        },
        serde_json::Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_i64()
                    .ok_or_else(|| Error::UnsupportedConstruct(format!("array element {item}")))
            })
            .collect::<Result<Vec<_>, Error>>()
            .map(sql::ast::Value::IntList),
        serde_json::Value::Object(_) => {
            Err(Error::UnsupportedConstruct("object values".to_string()))
        }
    }
}
