//! Assemble full SELECT statements from translated fragments.

use query_engine_sql::sql;
use query_engine_sql::sql::string::SQL;

use super::aggregates;
use super::error::Error;
use super::expression::{self, translate_lambda};
use super::helpers::{AliasMode, Env};
use super::typing::Type;

/// How a condition is attached to an existing WHERE clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conjunction {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

/// Builds a single statement clause by clause.
///
/// Clauses are appended in call order. Starting a clause which was already started continues
/// it with a comma instead of repeating the keyword. A failing call may leave text from the
/// clause it was building behind, so the whole builder must be dropped on error.
#[derive(Debug)]
pub struct QueryBuilder<'a> {
    env: Env<'a>,
    sql: SQL,
    select_started: bool,
    where_started: bool,
    group_by_started: bool,
    order_by_started: bool,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(env: Env<'a>) -> QueryBuilder<'a> {
        QueryBuilder {
            env,
            sql: SQL::new(),
            select_started: false,
            where_started: false,
            group_by_started: false,
            order_by_started: false,
        }
    }

    /// `SELECT [distinct ]a, b`, listing fields of `parameter` without aliases.
    pub fn select_fields(
        &mut self,
        parameter: &sql::ast::Parameter,
        fields: &[&str],
        alias_mode: AliasMode,
        distinct: bool,
    ) -> Result<&mut Self, Error> {
        let columns = self.resolve_columns(parameter, fields, alias_mode)?;
        self.start_select(distinct);
        self.sql.append_syntax(&columns.join(", "));
        Ok(self)
    }

    /// `SELECT [distinct ]expr AS alias, ...` for a projection mixing fields and aggregates.
    /// Aliases are lowercased.
    pub fn select_projection(
        &mut self,
        projection: &sql::ast::Projection,
        alias_mode: AliasMode,
        distinct: bool,
    ) -> Result<&mut Self, Error> {
        if projection.bindings.is_empty() {
            return Err(Error::InvalidConstruct("projection without bindings".to_string()));
        }
        let scope = self
            .env
            .bind(std::slice::from_ref(&projection.parameter))?;

        let mut columns = Vec::with_capacity(projection.bindings.len());
        for (alias, value) in &projection.bindings {
            let fragment = match value {
                sql::ast::ProjectionValue::Field(expression) => {
                    expression::translate_expression(&scope, expression, alias_mode)?.0
                }
                sql::ast::ProjectionValue::Aggregate(invocation) => {
                    aggregates::translate(&scope, invocation, alias_mode)?
                }
            };
            columns.push(format!("{fragment} AS {}", alias.name.to_lowercase()));
        }

        self.start_select(distinct);
        self.sql.append_syntax(&columns.join(", "));
        Ok(self)
    }

    /// ` FROM schema.table[ alias]`, resolving the table through the registry.
    pub fn from_table(
        &mut self,
        table_id: &str,
        schema: &str,
        alias: Option<&str>,
    ) -> Result<&mut Self, Error> {
        let qualified_name = self.env.resolve_qualified_name(table_id, schema)?;
        self.sql.append_syntax(" FROM ");
        self.sql.append_syntax(&qualified_name);
        if let Some(alias) = alias {
            self.sql.append_syntax(" ");
            self.sql.append_syntax(alias);
        }
        Ok(self)
    }

    /// ` FROM (subquery) alias`
    pub fn from_subquery(&mut self, subquery: &str, alias: &str) -> Result<&mut Self, Error> {
        if alias.is_empty() {
            return Err(Error::InvalidConstruct("subquery without an alias".to_string()));
        }
        self.sql.append_syntax(" FROM (");
        self.sql.append_syntax(subquery);
        self.sql.append_syntax(") ");
        self.sql.append_syntax(alias);
        Ok(self)
    }

    /// ` WHERE condition`. Nothing is appended when the condition translates to nothing.
    /// Continues with AND when a WHERE clause was already started.
    pub fn start_where(
        &mut self,
        condition: &sql::ast::Lambda,
        alias_mode: AliasMode,
    ) -> Result<&mut Self, Error> {
        if self.where_started {
            return self.add_where(condition, Conjunction::And, alias_mode);
        }
        let condition = translate_condition(&self.env, condition, alias_mode)?;
        if !condition.is_empty() {
            self.sql.append_syntax(" WHERE ");
            self.sql.append_syntax(&condition);
            self.where_started = true;
        }
        Ok(self)
    }

    /// ` AND condition` or ` OR condition`. Starts the WHERE clause if there is none yet.
    pub fn add_where(
        &mut self,
        condition: &sql::ast::Lambda,
        conjunction: Conjunction,
        alias_mode: AliasMode,
    ) -> Result<&mut Self, Error> {
        if !self.where_started {
            return self.start_where(condition, alias_mode);
        }
        let condition = translate_condition(&self.env, condition, alias_mode)?;
        if !condition.is_empty() {
            self.sql.append_syntax(match conjunction {
                Conjunction::And => " AND ",
                Conjunction::Or => " OR ",
            });
            self.sql.append_syntax(&condition);
        }
        Ok(self)
    }

    /// ` GROUP BY a, b`
    pub fn start_group_by(
        &mut self,
        parameter: &sql::ast::Parameter,
        fields: &[&str],
        alias_mode: AliasMode,
    ) -> Result<&mut Self, Error> {
        let columns = self.resolve_columns(parameter, fields, alias_mode)?;
        if self.group_by_started {
            self.sql.append_syntax(", ");
        } else {
            self.sql.append_syntax(" GROUP BY ");
            self.group_by_started = true;
        }
        self.sql.append_syntax(&columns.join(", "));
        Ok(self)
    }

    /// Add columns to the GROUP BY clause, starting it if needed.
    pub fn add_group_by(
        &mut self,
        parameter: &sql::ast::Parameter,
        fields: &[&str],
        alias_mode: AliasMode,
    ) -> Result<&mut Self, Error> {
        self.start_group_by(parameter, fields, alias_mode)
    }

    /// ` INNER JOIN schema.table alias ON condition`. The condition binds both sides of the
    /// join and is always translated with qualified column references.
    pub fn join_table(
        &mut self,
        kind: JoinKind,
        table_id: &str,
        schema: &str,
        alias: &str,
        on: &sql::ast::Lambda,
    ) -> Result<&mut Self, Error> {
        let qualified_name = self.env.resolve_qualified_name(table_id, schema)?;
        let on = translate_condition(&self.env, on, AliasMode::Qualified)?;
        self.append_join(kind, &qualified_name, alias, &on);
        Ok(self)
    }

    /// ` LEFT JOIN (subquery) alias ON condition`
    pub fn join_subquery(
        &mut self,
        kind: JoinKind,
        subquery: &str,
        alias: &str,
        on: &sql::ast::Lambda,
    ) -> Result<&mut Self, Error> {
        if alias.is_empty() {
            return Err(Error::InvalidConstruct("subquery without an alias".to_string()));
        }
        let on = translate_condition(&self.env, on, AliasMode::Qualified)?;
        self.append_join(kind, &format!("({subquery})"), alias, &on);
        Ok(self)
    }

    /// ` ORDER BY a DESC, b DESC`. The direction applies to every listed field.
    pub fn order_by(
        &mut self,
        parameter: &sql::ast::Parameter,
        fields: &[&str],
        direction: sql::ast::OrderByDirection,
        alias_mode: AliasMode,
    ) -> Result<&mut Self, Error> {
        let direction = match direction {
            sql::ast::OrderByDirection::Asc => "ASC",
            sql::ast::OrderByDirection::Desc => "DESC",
        };
        let columns = self
            .resolve_columns(parameter, fields, alias_mode)?
            .into_iter()
            .map(|column| format!("{column} {direction}"))
            .collect::<Vec<_>>();
        if self.order_by_started {
            self.sql.append_syntax(", ");
        } else {
            self.sql.append_syntax(" ORDER BY ");
            self.order_by_started = true;
        }
        self.sql.append_syntax(&columns.join(", "));
        Ok(self)
    }

    /// ` LIMIT n OFFSET m` for the 1-based `page`.
    pub fn limit_offset(&mut self, page_size: u32, page: u32) -> &mut Self {
        self.sql.append_syntax(" ");
        self.sql.append_syntax(&limit_offset(page_size, page));
        self
    }

    /// The finished statement.
    pub fn build(&self) -> Result<String, Error> {
        let statement = self.sql.sql.trim();
        if !sql::string::has_balanced_parentheses(statement) {
            return Err(Error::ImbalancedOutput(statement.to_string()));
        }
        tracing::debug!(sql = statement, "built statement");
        Ok(statement.to_string())
    }

    fn start_select(&mut self, distinct: bool) {
        if self.select_started {
            self.sql.append_syntax(", ");
        } else {
            self.sql.append_syntax("SELECT ");
            if distinct {
                self.sql.append_syntax("distinct ");
            }
            self.select_started = true;
        }
    }

    fn append_join(&mut self, kind: JoinKind, source: &str, alias: &str, on: &str) {
        self.sql.append_syntax(match kind {
            JoinKind::Inner => " INNER JOIN ",
            JoinKind::Left => " LEFT JOIN ",
        });
        self.sql.append_syntax(source);
        self.sql.append_syntax(" ");
        self.sql.append_syntax(alias);
        self.sql.append_syntax(" ON ");
        self.sql.append_syntax(on);
    }

    /// Resolve dotted field paths of `parameter` to column references.
    fn resolve_columns(
        &self,
        parameter: &sql::ast::Parameter,
        fields: &[&str],
        alias_mode: AliasMode,
    ) -> Result<Vec<String>, Error> {
        if fields.is_empty() {
            return Err(Error::InvalidConstruct("empty field list".to_string()));
        }
        let scope = self.env.bind(std::slice::from_ref(parameter))?;
        fields
            .iter()
            .map(|path| {
                let access = sql::helpers::property_access(&parameter.name.0, path);
                scope
                    .lookup_field(&access)
                    .map(|field| field.to_column_reference(alias_mode))
            })
            .collect()
    }
}

/// Translate a predicate to a standalone, balanced fragment. The body must be boolean.
pub fn translate_condition(
    env: &Env,
    condition: &sql::ast::Lambda,
    alias_mode: AliasMode,
) -> Result<String, Error> {
    let (sql, condition_type) = translate_lambda(env, condition, alias_mode)?;
    if condition_type == Type::BOOLEAN {
        Ok(sql)
    } else {
        Err(Error::TypeMismatch(format!(
            "a condition must be boolean, got {condition_type}"
        )))
    }
}

/// Translate a selector to a standalone, balanced fragment.
pub fn translate_expression(
    env: &Env,
    selector: &sql::ast::Lambda,
    alias_mode: AliasMode,
) -> Result<String, Error> {
    translate_lambda(env, selector, alias_mode).map(|(sql, _)| sql)
}

/// `LIMIT page_size OFFSET (page - 1) * page_size`, with pages counted from 1.
pub fn limit_offset(page_size: u32, page: u32) -> String {
    let offset = if page > 1 {
        u64::from(page - 1) * u64::from(page_size)
    } else {
        0
    };
    format!("LIMIT {page_size} OFFSET {offset}")
}
