// SPDX-FileCopyrightText: 2026 Atomic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection setup and embedded database migrations using refinery.
//!
//! SQL migration files are compiled into the binary at build time via
//! `embed_migrations!`. Migrations run automatically when the store opens.

use atomic_core::LtmError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Apply connection PRAGMAs. WAL is skipped for in-memory databases.
pub fn apply_pragmas(conn: &rusqlite::Connection, wal_mode: bool) -> Result<(), LtmError> {
    let journal = if wal_mode {
        "PRAGMA journal_mode = WAL;"
    } else {
        "PRAGMA journal_mode = DELETE;"
    };
    conn.execute_batch(journal).map_err(boxed)?;
    conn.execute_batch(
        "PRAGMA synchronous = NORMAL;
         PRAGMA busy_timeout = 5000;
         PRAGMA foreign_keys = ON;",
    )
    .map_err(boxed)?;
    Ok(())
}

/// Run all pending migrations against the given connection.
///
/// Refinery tracks applied migrations in its own `refinery_schema_history` table.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), LtmError> {
    embedded::migrations::runner()
        .run(conn)
        .map_err(|e| LtmError::Storage {
            source: Box::new(e),
        })?;
    Ok(())
}

fn boxed(e: rusqlite::Error) -> LtmError {
    LtmError::Storage {
        source: Box::new(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_create_catalog_table() {
        let mut conn = rusqlite::Connection::open_in_memory().unwrap();
        apply_pragmas(&conn, false).unwrap();
        run_migrations(&mut conn).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'vector_tables'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn migrations_are_idempotent() {
        let mut conn = rusqlite::Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();
        run_migrations(&mut conn).unwrap();
    }
}
