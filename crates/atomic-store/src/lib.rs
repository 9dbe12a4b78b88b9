// SPDX-FileCopyrightText: 2026 Atomic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite vector store for the Atomic long-term memory layer.
//!
//! Provides the [`VectorStore`] connection (named tables of id, vector, and
//! JSON payload rows with exact L2 nearest-neighbour search), structured
//! [`Filter`] predicates, schema inference from representative rows, typed
//! records for the LTM tables, and [`RecordTable`] domain wrappers.

pub mod connection;
pub mod filter;
pub mod migrations;
pub mod records;
pub mod row;
pub mod schema;
pub mod table;

pub use connection::VectorStore;
pub use filter::Filter;
pub use records::{
    ColumnProfile, EventRecord, KnowledgeEntry, ResearchFinding, TableRecord,
    TrainingEventRecord, profile_for, representative_for,
};
pub use row::{SearchHit, VectorRow};
pub use schema::{ColumnType, TableSchema};
pub use table::{RecordTable, ScoredRecord};
