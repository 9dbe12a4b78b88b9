// SPDX-FileCopyrightText: 2026 Atomic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The vector store connection: named tables of (id, vector, payload) rows.
//!
//! All statements are serialized through tokio-rusqlite's single background
//! thread. Each table is a plain SQLite table with the embedding stored as a
//! little-endian f32 BLOB and the payload as a JSON object; nearest-neighbour
//! search is an exact scan ranked by L2 distance.

use std::collections::HashMap;
use std::path::Path;

use rusqlite::OptionalExtension;
use tokio::sync::RwLock;
use tokio_rusqlite::Connection;
use tracing::{debug, info};

use atomic_config::model::StorageConfig;
use atomic_core::LtmError;

use crate::filter::Filter;
use crate::migrations::{apply_pragmas, run_migrations};
use crate::row::{SearchHit, VectorRow, blob_to_vec, l2_distance, vec_to_blob};
use crate::schema::{ColumnType, TableSchema, canonical_table_name};

/// Helper to convert tokio_rusqlite errors into LtmError::Storage.
fn storage_err(e: tokio_rusqlite::Error) -> LtmError {
    LtmError::Storage {
        source: Box::new(e),
    }
}

/// Handle to the SQLite-backed vector store.
///
/// Constructed explicitly with [`VectorStore::open`] and shared by `Arc`.
/// Table schemas are cached after the first lookup.
pub struct VectorStore {
    conn: Connection,
    path: String,
    schemas: RwLock<HashMap<String, TableSchema>>,
}

impl VectorStore {
    /// Open (or create) the store at `path` with WAL enabled.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, LtmError> {
        Self::open_with(path.as_ref(), true).await
    }

    /// Open the store described by the `[storage]` config section.
    pub async fn from_config(config: &StorageConfig) -> Result<Self, LtmError> {
        Self::open_with(Path::new(&config.database_path), config.wal_mode).await
    }

    /// Open a private in-memory store. Contents vanish when the handle drops.
    pub async fn open_in_memory() -> Result<Self, LtmError> {
        let path = ":memory:".to_string();
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| LtmError::Connection {
                path: path.clone(),
                source: Box::new(e),
            })?;
        Self::initialize(conn, path, false).await
    }

    async fn open_with(path: &Path, wal_mode: bool) -> Result<Self, LtmError> {
        let display = path.display().to_string();
        let conn = Connection::open(path)
            .await
            .map_err(|e| LtmError::Connection {
                path: display.clone(),
                source: Box::new(e),
            })?;
        Self::initialize(conn, display, wal_mode).await
    }

    async fn initialize(conn: Connection, path: String, wal_mode: bool) -> Result<Self, LtmError> {
        conn.call(move |conn| -> Result<(), LtmError> {
            apply_pragmas(conn, wal_mode)?;
            run_migrations(conn)
        })
        .await
        .map_err(|e| LtmError::Connection {
            path: path.clone(),
            source: Box::new(e),
        })?;

        info!(path = %path, wal_mode, "vector store opened");
        Ok(Self {
            conn,
            path,
            schemas: RwLock::new(HashMap::new()),
        })
    }

    /// Location the store was opened at (`:memory:` for in-memory stores).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Run a trivial query to confirm the connection is usable.
    pub async fn health_check(&self) -> Result<(), LtmError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(storage_err)
    }

    /// Checkpoint the WAL and release the connection.
    pub async fn close(self) -> Result<(), LtmError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(storage_err)?;
        debug!(path = %self.path, "WAL checkpoint complete, vector store closed");
        Ok(())
    }

    /// Open an existing table, or create it with a schema inferred from
    /// `representative`. Idempotent: an existing table keeps its schema.
    pub async fn get_or_create_table(
        &self,
        name: &str,
        representative: &[VectorRow],
    ) -> Result<TableSchema, LtmError> {
        let canonical = canonical_table_name(name)?;
        let name = canonical.as_str();
        if let Some(schema) = self.lookup_schema(name).await? {
            return Ok(schema);
        }

        let schema = TableSchema::infer(name, representative)?;
        let columns = serde_json::to_string(&schema.columns).map_err(|e| LtmError::Internal(
            format!("cannot encode column catalog: {e}"),
        ))?;
        let table = schema.name.clone();
        let dimension = schema.dimension as i64;

        // INSERT OR IGNORE keeps the first definition if another caller won the race.
        self.conn
            .call(move |conn| -> Result<(), rusqlite::Error> {
                let tx = conn.transaction()?;
                tx.execute_batch(&format!(
                    "CREATE TABLE IF NOT EXISTS \"{table}\" (
                        id TEXT PRIMARY KEY NOT NULL,
                        vector BLOB NOT NULL,
                        payload TEXT NOT NULL DEFAULT '{{}}'
                    );"
                ))?;
                tx.execute(
                    "INSERT OR IGNORE INTO vector_tables (name, dimension, columns) VALUES (?1, ?2, ?3)",
                    rusqlite::params![table, dimension, columns],
                )?;
                tx.commit()
            })
            .await
            .map_err(storage_err)?;

        // Re-read so a concurrent creator's schema wins consistently.
        let stored = self.lookup_schema(name).await?.ok_or_else(|| {
            LtmError::Internal(format!("table `{name}` missing from catalog after creation"))
        })?;
        info!(
            table = %stored.name,
            dimension = stored.dimension,
            columns = stored.columns.len(),
            "vector table created"
        );
        Ok(stored)
    }

    /// Delete-then-insert each item by id.
    ///
    /// Every item is validated before anything is written. The writes are
    /// not atomic across items: a failure part-way leaves earlier items
    /// written, and callers retry the whole batch.
    pub async fn upsert_items(
        &self,
        name: &str,
        items: &[VectorRow],
        representative: &[VectorRow],
    ) -> Result<(), LtmError> {
        let schema = self.get_or_create_table(name, representative).await?;
        for item in items {
            schema.validate(item)?;
        }

        for item in items {
            let table = schema.name.clone();
            let id = item.id.clone();
            let blob = vec_to_blob(&item.vector);
            let payload = serde_json::Value::Object(item.fields.clone()).to_string();
            self.conn
                .call(move |conn| -> Result<(), rusqlite::Error> {
                    conn.execute(
                        &format!("DELETE FROM \"{table}\" WHERE id = ?1"),
                        rusqlite::params![id],
                    )?;
                    conn.execute(
                        &format!("INSERT INTO \"{table}\" (id, vector, payload) VALUES (?1, ?2, ?3)"),
                        rusqlite::params![id, blob, payload],
                    )?;
                    Ok(())
                })
                .await
                .map_err(storage_err)?;
        }

        debug!(table = %name, count = items.len(), "upserted vector rows");
        Ok(())
    }

    /// Remove rows by id. Unknown ids and unknown tables are no-ops.
    pub async fn delete_items_by_ids(&self, name: &str, ids: &[String]) -> Result<(), LtmError> {
        let canonical = canonical_table_name(name)?;
        let name = canonical.as_str();
        if ids.is_empty() || self.lookup_schema(name).await?.is_none() {
            return Ok(());
        }

        let table = name.to_string();
        let ids = ids.to_vec();
        let removed = self
            .conn
            .call(move |conn| -> Result<usize, rusqlite::Error> {
                let tx = conn.transaction()?;
                let mut removed = 0;
                {
                    let mut stmt = tx.prepare(&format!("DELETE FROM \"{table}\" WHERE id = ?1"))?;
                    for id in &ids {
                        removed += stmt.execute(rusqlite::params![id])?;
                    }
                }
                tx.commit()?;
                Ok(removed)
            })
            .await
            .map_err(storage_err)?;

        debug!(table = %name, removed, "deleted vector rows");
        Ok(())
    }

    /// Exact nearest-neighbour search ordered by ascending L2 distance.
    ///
    /// The filter is applied in SQL before ranking, so the similarity order
    /// among rows that pass it is preserved. A `limit` of zero returns nothing.
    pub async fn search_table_by_vector(
        &self,
        name: &str,
        vector: &[f32],
        limit: usize,
        representative: &[VectorRow],
        filter: Option<&Filter>,
    ) -> Result<Vec<SearchHit>, LtmError> {
        let schema = self.get_or_create_table(name, representative).await?;
        schema.validate_vector(vector)?;
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut params = Vec::new();
        let where_clause = match filter {
            Some(filter) => {
                filter.validate(&schema)?;
                format!(" WHERE {}", filter.to_sql(&mut params)?)
            }
            None => String::new(),
        };
        let sql = format!(
            "SELECT id, vector, payload FROM \"{}\"{where_clause}",
            schema.name
        );

        let rows = self
            .conn
            .call(move |conn| -> Result<Vec<VectorRow>, rusqlite::Error> {
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(rusqlite::params_from_iter(params.iter()), row_to_vector_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(storage_err)?;

        let scanned = rows.len();
        let mut hits = Vec::with_capacity(scanned);
        for row in rows {
            if row.vector.len() != schema.dimension {
                return Err(LtmError::schema(
                    &schema.name,
                    format!(
                        "stored row `{}` has vector length {}, expected {}",
                        row.id,
                        row.vector.len(),
                        schema.dimension
                    ),
                ));
            }
            let distance = l2_distance(&row.vector, vector);
            hits.push(SearchHit { row, distance });
        }
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(limit);

        debug!(table = %name, scanned, returned = hits.len(), "vector search complete");
        Ok(hits)
    }

    /// Point lookup. `None` when the id is absent.
    pub async fn get_item_by_id(
        &self,
        name: &str,
        id: &str,
        representative: &[VectorRow],
    ) -> Result<Option<VectorRow>, LtmError> {
        let schema = self.get_or_create_table(name, representative).await?;
        let table = schema.name;
        let id = id.to_string();
        self.conn
            .call(move |conn| -> Result<Option<VectorRow>, rusqlite::Error> {
                conn.query_row(
                    &format!("SELECT id, vector, payload FROM \"{table}\" WHERE id = ?1"),
                    rusqlite::params![id],
                    row_to_vector_row,
                )
                .optional()
            })
            .await
            .map_err(storage_err)
    }

    /// Names of every table in the catalog, sorted.
    pub async fn table_names(&self) -> Result<Vec<String>, LtmError> {
        self.conn
            .call(|conn| -> Result<Vec<String>, rusqlite::Error> {
                let mut stmt = conn.prepare("SELECT name FROM vector_tables ORDER BY name")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(storage_err)
    }

    /// Schema of an existing table, without creating it.
    pub async fn table_schema(&self, name: &str) -> Result<Option<TableSchema>, LtmError> {
        let canonical = canonical_table_name(name)?;
        let name = canonical.as_str();
        self.lookup_schema(name).await
    }

    /// Number of rows in a table. Zero for tables that do not exist.
    pub async fn count_rows(&self, name: &str) -> Result<usize, LtmError> {
        let canonical = canonical_table_name(name)?;
        let name = canonical.as_str();
        if self.lookup_schema(name).await?.is_none() {
            return Ok(0);
        }
        let table = name.to_string();
        let count = self
            .conn
            .call(move |conn| -> Result<i64, rusqlite::Error> {
                conn.query_row(&format!("SELECT COUNT(*) FROM \"{table}\""), [], |row| {
                    row.get(0)
                })
            })
            .await
            .map_err(storage_err)?;
        Ok(count.max(0) as usize)
    }

    /// Cached schema, falling back to the catalog.
    async fn lookup_schema(&self, name: &str) -> Result<Option<TableSchema>, LtmError> {
        if let Some(schema) = self.schemas.read().await.get(name) {
            return Ok(Some(schema.clone()));
        }

        let table = name.to_string();
        let stored = self
            .conn
            .call(move |conn| -> Result<Option<(i64, String)>, rusqlite::Error> {
                conn.query_row(
                    "SELECT dimension, columns FROM vector_tables WHERE name = ?1",
                    rusqlite::params![table],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()
            })
            .await
            .map_err(storage_err)?;

        let Some((dimension, columns)) = stored else {
            return Ok(None);
        };
        let columns: std::collections::BTreeMap<String, ColumnType> =
            serde_json::from_str(&columns).map_err(|e| {
                LtmError::schema(name, format!("corrupt column catalog: {e}"))
            })?;
        let schema = TableSchema {
            name: name.to_string(),
            dimension: dimension.max(0) as usize,
            columns,
        };

        self.schemas
            .write()
            .await
            .insert(name.to_string(), schema.clone());
        Ok(Some(schema))
    }
}

/// Map a `(id, vector, payload)` result row into a [`VectorRow`].
fn row_to_vector_row(row: &rusqlite::Row<'_>) -> Result<VectorRow, rusqlite::Error> {
    let id: String = row.get(0)?;
    let blob: Vec<u8> = row.get(1)?;
    let payload: String = row.get(2)?;
    let fields = serde_json::from_str(&payload).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(VectorRow {
        id,
        vector: blob_to_vec(&blob),
        fields,
    })
}
