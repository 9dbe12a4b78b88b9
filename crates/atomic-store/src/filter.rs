// SPDX-FileCopyrightText: 2026 Atomic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Structured row filters rendered to parameterized SQL.
//!
//! Filters name payload columns; values are always bound as parameters and
//! column names must be plain identifiers, so no caller text is spliced into
//! the SQL string.

use rusqlite::types::Value as SqlValue;
use serde_json::Value;

use atomic_core::LtmError;

use crate::schema::{ID_COLUMN, TableSchema, is_identifier};

/// A predicate over the columns of a vector table.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    Ne(String, Value),
    Gt(String, Value),
    Gte(String, Value),
    Lt(String, Value),
    Lte(String, Value),
    /// SQL `LIKE` with `\` as the escape character.
    Like(String, String),
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq(column.into(), value.into())
    }

    pub fn ne(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Ne(column.into(), value.into())
    }

    pub fn gt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Gt(column.into(), value.into())
    }

    pub fn gte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Gte(column.into(), value.into())
    }

    pub fn lt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Lt(column.into(), value.into())
    }

    pub fn lte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Lte(column.into(), value.into())
    }

    /// Case-insensitive (ASCII) substring match; `%` and `_` in `needle` are literal.
    pub fn contains(column: impl Into<String>, needle: &str) -> Self {
        Filter::Like(column.into(), format!("%{}%", escape_like(needle)))
    }

    pub fn not(filter: Filter) -> Self {
        Filter::Not(Box::new(filter))
    }

    /// Conjunction that flattens nested `And`s.
    pub fn and(self, other: Filter) -> Self {
        match (self, other) {
            (Filter::And(mut a), Filter::And(b)) => {
                a.extend(b);
                Filter::And(a)
            }
            (Filter::And(mut a), f) => {
                a.push(f);
                Filter::And(a)
            }
            (f, Filter::And(mut b)) => {
                b.insert(0, f);
                Filter::And(b)
            }
            (a, b) => Filter::And(vec![a, b]),
        }
    }

    /// Combine optional clauses with AND. `None` when there are none.
    pub fn all(filters: impl IntoIterator<Item = Filter>) -> Option<Self> {
        filters.into_iter().reduce(Filter::and)
    }

    /// Every column the filter references.
    pub fn columns(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Filter::Eq(c, _)
            | Filter::Ne(c, _)
            | Filter::Gt(c, _)
            | Filter::Gte(c, _)
            | Filter::Lt(c, _)
            | Filter::Lte(c, _)
            | Filter::Like(c, _) => out.push(c),
            Filter::And(fs) | Filter::Or(fs) => fs.iter().for_each(|f| f.collect_columns(out)),
            Filter::Not(f) => f.collect_columns(out),
        }
    }

    /// Reject filters that reference columns the table does not have.
    pub fn validate(&self, schema: &TableSchema) -> Result<(), LtmError> {
        for column in self.columns() {
            if !is_identifier(column) {
                return Err(LtmError::InvalidIdentifier(column.to_string()));
            }
            if !schema.has_column(column) {
                return Err(LtmError::schema(
                    &schema.name,
                    format!("filter references unknown column `{column}`"),
                ));
            }
        }
        Ok(())
    }

    /// Render to a SQL boolean expression, appending bound values to `params`.
    ///
    /// Placeholders are numbered (`?N`) from the current length of `params`.
    pub fn to_sql(&self, params: &mut Vec<SqlValue>) -> Result<String, LtmError> {
        Ok(match self {
            Filter::Eq(c, Value::Null) => format!("{} IS NULL", column_expr(c)?),
            Filter::Ne(c, Value::Null) => format!("{} IS NOT NULL", column_expr(c)?),
            Filter::Eq(c, v) => compare(c, "=", v, params)?,
            Filter::Ne(c, v) => compare(c, "!=", v, params)?,
            Filter::Gt(c, v) => compare(c, ">", v, params)?,
            Filter::Gte(c, v) => compare(c, ">=", v, params)?,
            Filter::Lt(c, v) => compare(c, "<", v, params)?,
            Filter::Lte(c, v) => compare(c, "<=", v, params)?,
            Filter::Like(c, pattern) => {
                let column = column_expr(c)?;
                params.push(SqlValue::Text(pattern.clone()));
                format!("{column} LIKE ?{} ESCAPE '\\'", params.len())
            }
            Filter::And(fs) => join(fs, " AND ", "1", params)?,
            Filter::Or(fs) => join(fs, " OR ", "0", params)?,
            Filter::Not(f) => format!("NOT ({})", f.to_sql(params)?),
        })
    }
}

/// Escape `LIKE` metacharacters for use with `ESCAPE '\'`.
pub fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn column_expr(column: &str) -> Result<String, LtmError> {
    if !is_identifier(column) {
        return Err(LtmError::InvalidIdentifier(column.to_string()));
    }
    if column == ID_COLUMN {
        Ok(ID_COLUMN.to_string())
    } else {
        Ok(format!("json_extract(payload, '$.{column}')"))
    }
}

fn compare(
    column: &str,
    op: &str,
    value: &Value,
    params: &mut Vec<SqlValue>,
) -> Result<String, LtmError> {
    let column = column_expr(column)?;
    params.push(to_sql_value(value));
    Ok(format!("{column} {op} ?{}", params.len()))
}

fn join(
    filters: &[Filter],
    sep: &str,
    empty: &str,
    params: &mut Vec<SqlValue>,
) -> Result<String, LtmError> {
    if filters.is_empty() {
        return Ok(empty.to_string());
    }
    let parts = filters
        .iter()
        .map(|f| f.to_sql(params).map(|sql| format!("({sql})")))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(parts.join(sep))
}

/// `json_extract` yields SQL scalars, so JSON booleans compare as 0/1 and
/// composite values compare as their JSON text.
fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::VectorRow;

    fn render(filter: &Filter) -> (String, Vec<SqlValue>) {
        let mut params = Vec::new();
        let sql = filter.to_sql(&mut params).unwrap();
        (sql, params)
    }

    #[test]
    fn eq_renders_json_extract_with_bound_value() {
        let (sql, params) = render(&Filter::eq("userId", "u1"));
        assert_eq!(sql, "json_extract(payload, '$.userId') = ?1");
        assert_eq!(params, vec![SqlValue::Text("u1".into())]);
    }

    #[test]
    fn id_column_is_not_extracted() {
        let (sql, _) = render(&Filter::ne("id", "e1"));
        assert_eq!(sql, "id != ?1");
    }

    #[test]
    fn null_comparisons_use_is_null() {
        let (sql, params) = render(&Filter::eq("location", Value::Null));
        assert_eq!(sql, "json_extract(payload, '$.location') IS NULL");
        assert!(params.is_empty());
        let (sql, _) = render(&Filter::ne("location", Value::Null));
        assert!(sql.ends_with("IS NOT NULL"));
    }

    #[test]
    fn nested_filters_number_placeholders_in_order() {
        let filter = Filter::eq("userId", "u1")
            .and(Filter::Or(vec![
                Filter::contains("text", "lunch"),
                Filter::contains("text", "dinner"),
            ]))
            .and(Filter::gte("timestamp", "2026-01-01"));
        let (sql, params) = render(&filter);
        assert_eq!(
            sql,
            "(json_extract(payload, '$.userId') = ?1) AND \
             ((json_extract(payload, '$.text') LIKE ?2 ESCAPE '\\') OR \
             (json_extract(payload, '$.text') LIKE ?3 ESCAPE '\\')) AND \
             (json_extract(payload, '$.timestamp') >= ?4)"
        );
        assert_eq!(params.len(), 4);
        assert_eq!(params[1], SqlValue::Text("%lunch%".into()));
    }

    #[test]
    fn and_flattens() {
        let f = Filter::eq("a", 1).and(Filter::eq("b", 2)).and(Filter::eq("c", 3));
        assert!(matches!(f, Filter::And(ref v) if v.len() == 3));
        assert_eq!(f.columns(), vec!["a", "b", "c"]);
    }

    #[test]
    fn all_of_nothing_is_none() {
        assert!(Filter::all(Vec::new()).is_none());
        assert_eq!(
            Filter::all(vec![Filter::eq("a", 1)]),
            Some(Filter::eq("a", 1))
        );
    }

    #[test]
    fn empty_groups_render_as_constants() {
        assert_eq!(render(&Filter::And(vec![])).0, "1");
        assert_eq!(render(&Filter::Or(vec![])).0, "0");
        assert_eq!(render(&Filter::not(Filter::Or(vec![]))).0, "NOT (0)");
    }

    #[test]
    fn contains_escapes_like_metacharacters() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        let (_, params) = render(&Filter::contains("text", "100%"));
        assert_eq!(params, vec![SqlValue::Text("%100\\%%".into())]);
    }

    #[test]
    fn value_conversion() {
        let (_, params) = render(&Filter::eq("allDay", true));
        assert_eq!(params, vec![SqlValue::Integer(1)]);
        let (_, params) = render(&Filter::lt("score", 0.5));
        assert_eq!(params, vec![SqlValue::Real(0.5)]);
    }

    #[test]
    fn injection_in_column_name_is_rejected() {
        let mut params = Vec::new();
        let err = Filter::eq("userId') OR 1=1 --", "x")
            .to_sql(&mut params)
            .unwrap_err();
        assert!(matches!(err, LtmError::InvalidIdentifier(_)));
    }

    #[test]
    fn validate_checks_columns_against_schema() {
        let schema = TableSchema::infer(
            "events",
            &[VectorRow::new("r", vec![0.0]).with_field("userId", "u")],
        )
        .unwrap();
        Filter::eq("userId", "u1").validate(&schema).unwrap();
        Filter::eq("id", "e1").validate(&schema).unwrap();
        assert!(matches!(
            Filter::eq("colour", "red").validate(&schema),
            Err(LtmError::Schema { .. })
        ));
    }
}
