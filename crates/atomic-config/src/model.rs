// SPDX-FileCopyrightText: 2026 Atomic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the long-term memory layer.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

use atomic_core::LtmTable;

/// Top-level LTM configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LtmConfig {
    /// Vector store location and SQLite settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Embedding provider selection.
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Physical table names.
    #[serde(default)]
    pub tables: TablesConfig,

    /// Relevance retrieval defaults.
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Short-term to long-term consolidation settings.
    #[serde(default)]
    pub consolidation: ConsolidationConfig,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Vector store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file holding every LTM table.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    "ltm.db".to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// Which embedding backend produces vectors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingBackend {
    /// Deterministic local feature hashing. No network, no model files.
    #[default]
    Hashing,
    /// OpenAI-compatible `/embeddings` HTTP endpoint.
    Openai,
}

/// Embedding provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub backend: EmbeddingBackend,

    /// Vector length. Every LTM table is created with this dimensionality.
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    /// Model name sent to the HTTP backend.
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Base URL of the HTTP backend (without the `/embeddings` suffix).
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// API key for the HTTP backend. `None` requires `OPENAI_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Per-request timeout for the HTTP backend.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::default(),
            dimensions: default_dimensions(),
            model: default_embedding_model(),
            api_base: default_api_base(),
            api_key: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_dimensions() -> usize {
    1536
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Physical names of the LTM tables.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TablesConfig {
    #[serde(default = "default_events_table")]
    pub events: String,

    #[serde(default = "default_training_events_table")]
    pub training_events: String,

    #[serde(default = "default_knowledge_base_table")]
    pub knowledge_base: String,

    #[serde(default = "default_research_findings_table")]
    pub research_findings: String,
}

impl TablesConfig {
    /// Physical table name for a logical LTM table.
    pub fn name_for(&self, table: LtmTable) -> &str {
        match table {
            LtmTable::KnowledgeBase => &self.knowledge_base,
            LtmTable::ResearchFindings => &self.research_findings,
            LtmTable::Events => &self.events,
            LtmTable::TrainingEvents => &self.training_events,
        }
    }
}

impl Default for TablesConfig {
    fn default() -> Self {
        Self {
            events: default_events_table(),
            training_events: default_training_events_table(),
            knowledge_base: default_knowledge_base_table(),
            research_findings: default_research_findings_table(),
        }
    }
}

fn default_events_table() -> String {
    "events".to_string()
}

fn default_training_events_table() -> String {
    "training_events".to_string()
}

fn default_knowledge_base_table() -> String {
    "knowledge_base".to_string()
}

fn default_research_findings_table() -> String {
    "research_findings".to_string()
}

/// Relevance retrieval configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetrievalConfig {
    /// Results returned when the caller does not set `top_k`.
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,

    /// Candidate pool is `top_k * rerank_pool_multiplier` when recency boosting.
    #[serde(default = "default_rerank_pool_multiplier")]
    pub rerank_pool_multiplier: usize,

    /// Upper bound on the re-ranking candidate pool.
    #[serde(default = "default_max_rerank_pool")]
    pub max_rerank_pool: usize,

    /// Similarity weight used when the caller does not supply one.
    #[serde(default = "default_similarity_weight")]
    pub similarity_weight: f32,

    /// Recency weight used when the caller does not supply one.
    #[serde(default = "default_recency_weight")]
    pub recency_weight: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_top_k: default_top_k(),
            rerank_pool_multiplier: default_rerank_pool_multiplier(),
            max_rerank_pool: default_max_rerank_pool(),
            similarity_weight: default_similarity_weight(),
            recency_weight: default_recency_weight(),
        }
    }
}

fn default_top_k() -> usize {
    5
}

fn default_rerank_pool_multiplier() -> usize {
    3
}

fn default_max_rerank_pool() -> usize {
    100
}

fn default_similarity_weight() -> f32 {
    0.7
}

fn default_recency_weight() -> f32 {
    0.3
}

/// Consolidation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConsolidationConfig {
    /// Fragments shorter than this (after trimming) are not persisted.
    #[serde(default = "default_min_fragment_chars")]
    pub min_fragment_chars: usize,

    /// Persist the rolling conversation summary alongside goals and facts.
    #[serde(default = "default_include_summary")]
    pub include_summary: bool,
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self {
            min_fragment_chars: default_min_fragment_chars(),
            include_summary: default_include_summary(),
        }
    }
}

fn default_min_fragment_chars() -> usize {
    3
}

fn default_include_summary() -> bool {
    true
}

/// Log output configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
