// SPDX-FileCopyrightText: 2026 Atomic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Table schemas: dimensionality and payload column types.
//!
//! A schema is inferred once from representative rows when a table is
//! created, persisted in the `vector_tables` catalog, and then used to
//! validate every write and filter against the table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

use atomic_core::LtmError;

use crate::row::VectorRow;

/// Tables the store itself owns. User tables may not take these names.
const RESERVED_TABLES: [&str; 2] = ["vector_tables", "refinery_schema_history"];

/// Columns stored outside the JSON payload.
pub const ID_COLUMN: &str = "id";
pub const VECTOR_COLUMN: &str = "vector";

/// Type of a payload column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Text,
    Number,
    Bool,
    /// Arrays, objects, or columns whose type could not be pinned down.
    Json,
}

impl ColumnType {
    /// Type of a JSON value, or `None` for null.
    pub fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(_) => Some(ColumnType::Text),
            Value::Number(_) => Some(ColumnType::Number),
            Value::Bool(_) => Some(ColumnType::Bool),
            Value::Array(_) | Value::Object(_) => Some(ColumnType::Json),
        }
    }

    /// Null is accepted by every column; `Json` accepts anything.
    pub fn accepts(self, value: &Value) -> bool {
        match ColumnType::of(value) {
            None => true,
            Some(actual) => self == ColumnType::Json || self == actual,
        }
    }
}

/// Schema of one vector table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub dimension: usize,
    pub columns: BTreeMap<String, ColumnType>,
}

impl TableSchema {
    /// Infer a schema from representative rows.
    ///
    /// The first row with a non-empty vector fixes the dimensionality; every
    /// other non-empty vector must agree. Column types come from the first
    /// non-null value seen; columns with conflicting types, or only ever
    /// null, widen to [`ColumnType::Json`].
    pub fn infer(name: &str, rows: &[VectorRow]) -> Result<Self, LtmError> {
        let canonical = canonical_table_name(name)?;
        let name = canonical.as_str();

        let dimension = rows
            .iter()
            .map(|r| r.vector.len())
            .find(|len| *len > 0)
            .ok_or_else(|| {
                LtmError::schema(
                    name,
                    "cannot infer schema: no representative row with a non-empty vector",
                )
            })?;

        let mut columns: BTreeMap<String, Option<ColumnType>> = BTreeMap::new();
        for row in rows {
            if !row.vector.is_empty() && row.vector.len() != dimension {
                return Err(LtmError::schema(
                    name,
                    format!(
                        "representative rows disagree on dimensionality ({} vs {dimension})",
                        row.vector.len()
                    ),
                ));
            }
            for (column, value) in &row.fields {
                validate_column_name(name, column)?;
                let seen = ColumnType::of(value);
                let slot = columns.entry(column.clone()).or_insert(seen);
                match (*slot, seen) {
                    (None, Some(t)) => *slot = Some(t),
                    (Some(a), Some(b)) if a != b => *slot = Some(ColumnType::Json),
                    _ => {}
                }
            }
        }

        Ok(Self {
            name: name.to_string(),
            dimension,
            columns: columns
                .into_iter()
                .map(|(k, v)| (k, v.unwrap_or(ColumnType::Json)))
                .collect(),
        })
    }

    /// Whether `column` can be referenced in a filter.
    pub fn has_column(&self, column: &str) -> bool {
        column == ID_COLUMN || self.columns.contains_key(column)
    }

    /// Check a row against the schema before it is written.
    pub fn validate(&self, row: &VectorRow) -> Result<(), LtmError> {
        if row.id.is_empty() {
            return Err(LtmError::schema(&self.name, "row id must not be empty"));
        }
        self.validate_vector(&row.vector)?;
        for (column, value) in &row.fields {
            let Some(expected) = self.columns.get(column) else {
                return Err(LtmError::schema(
                    &self.name,
                    format!("row `{}` has unknown column `{column}`", row.id),
                ));
            };
            if !expected.accepts(value) {
                return Err(LtmError::schema(
                    &self.name,
                    format!(
                        "row `{}` column `{column}` expects {expected}, got {}",
                        row.id,
                        ColumnType::of(value).map_or("null".to_string(), |t| t.to_string())
                    ),
                ));
            }
        }
        Ok(())
    }

    /// Check a vector (row or query) against the table dimensionality.
    pub fn validate_vector(&self, vector: &[f32]) -> Result<(), LtmError> {
        if vector.len() != self.dimension {
            return Err(LtmError::schema(
                &self.name,
                format!(
                    "vector length {}, expected {}",
                    vector.len(),
                    self.dimension
                ),
            ));
        }
        Ok(())
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Table names must be identifiers and must not shadow store-owned tables.
pub fn validate_table_name(name: &str) -> Result<(), LtmError> {
    let lowered = name.to_ascii_lowercase();
    if !is_identifier(name)
        || RESERVED_TABLES.contains(&lowered.as_str())
        || lowered.starts_with("sqlite_")
    {
        return Err(LtmError::InvalidIdentifier(name.to_string()));
    }
    Ok(())
}

/// The validated, lowercased form of a table name.
///
/// SQLite resolves table identifiers case-insensitively, so the catalog and
/// the schema cache key every table by this form.
pub fn canonical_table_name(name: &str) -> Result<String, LtmError> {
    validate_table_name(name)?;
    Ok(name.to_ascii_lowercase())
}

fn validate_column_name(table: &str, column: &str) -> Result<(), LtmError> {
    if !is_identifier(column) {
        return Err(LtmError::InvalidIdentifier(column.to_string()));
    }
    if column == ID_COLUMN || column == VECTOR_COLUMN {
        return Err(LtmError::schema(
            table,
            format!("`{column}` is reserved and cannot be a payload column"),
        ));
    }
    Ok(())
}
