// SPDX-FileCopyrightText: 2026 Atomic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the long-term memory layer.

use thiserror::Error;

/// The primary error type used across the store, embedding, and memory crates.
///
/// A missing row is never an error: point lookups return `None` and deletes of
/// unknown ids are no-ops.
#[derive(Debug, Error)]
pub enum LtmError {
    /// The vector store could not be opened (permissions, corrupted file, bad path).
    #[error("cannot open vector store at {path}: {source}")]
    Connection {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Row shape or vector dimensionality does not match the table schema.
    #[error("schema error on table `{table}`: {message}")]
    Schema { table: String, message: String },

    /// The embedding provider could not embed the given text.
    #[error("embedding failed: {0}")]
    EmbeddingFailure(String),

    /// Persisting already-embedded data failed.
    #[error("write to table `{table}` failed: {source}")]
    WriteFailure {
        table: String,
        source: Box<LtmError>,
    },

    /// Storage backend errors on an individual operation (query failure, I/O).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A table or column name is not a plain identifier.
    #[error("invalid identifier `{0}`")]
    InvalidIdentifier(String),

    /// Remote embedding provider errors (HTTP failure, bad response body).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration errors detected at wiring time.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LtmError {
    /// Shorthand for a schema error on `table`.
    pub fn schema(table: impl Into<String>, message: impl Into<String>) -> Self {
        LtmError::Schema {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Whether the error is one the caller should treat as fatal for the request.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            LtmError::Connection { .. } | LtmError::Schema { .. } | LtmError::WriteFailure { .. }
        )
    }
}
