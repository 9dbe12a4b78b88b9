// SPDX-FileCopyrightText: 2026 Atomic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Long-term memory for the Atomic scheduling agent.
//!
//! ## Architecture
//!
//! - **Embedding providers**: [`HashingEmbedder`] (local, deterministic) and
//!   [`OpenAiEmbedder`] (OpenAI-compatible `/embeddings` endpoint)
//! - **MemoryConsolidator**: short-term conversation state into the knowledge base
//! - **LtmRetriever**: filtered vector search with optional recency re-ranking
//! - **load_ltm_to_stm**: retrieval results back into conversation state
//! - **LongTermMemory**: the above wired together from configuration

pub mod consolidation;
pub mod embedding;
pub mod loader;
pub mod retrieval;

use std::sync::Arc;

use atomic_config::LtmConfig;
use atomic_core::{EmbeddingProvider, LtmError};
use atomic_store::VectorStore;

pub use consolidation::{ConsolidationReport, MemoryConsolidator};
pub use embedding::{HashingEmbedder, OpenAiEmbedder, embedder_from_config};
pub use loader::load_ltm_to_stm;
pub use retrieval::{DateRange, KeywordMatch, LtmRetriever, RecencyWeights, RetrievalOptions};

/// The store, embedder, consolidator, and retriever sharing one configuration.
pub struct LongTermMemory {
    pub store: Arc<VectorStore>,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub consolidator: MemoryConsolidator,
    pub retriever: LtmRetriever,
}

impl LongTermMemory {
    /// Open the configured store and build every component over it.
    pub async fn from_config(config: &LtmConfig) -> Result<Self, LtmError> {
        let store = Arc::new(VectorStore::from_config(&config.storage).await?);
        let embedder = embedder_from_config(&config.embedding)?;
        Self::with_parts(store, embedder, config)
    }

    /// Build components over an already opened store and embedder.
    pub fn with_parts(
        store: Arc<VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        config: &LtmConfig,
    ) -> Result<Self, LtmError> {
        let consolidator = MemoryConsolidator::new(
            store.clone(),
            embedder.clone(),
            config.tables.knowledge_base.clone(),
            config.consolidation.clone(),
        )?;
        let retriever = LtmRetriever::new(
            store.clone(),
            embedder.clone(),
            config.tables.clone(),
            config.retrieval.clone(),
        );
        Ok(Self {
            store,
            embedder,
            consolidator,
            retriever,
        })
    }

    /// Drop every component and checkpoint the store.
    ///
    /// Fails with [`LtmError::Internal`] if another handle to the store is
    /// still alive.
    pub async fn close(self) -> Result<(), LtmError> {
        let Self {
            store,
            consolidator,
            retriever,
            ..
        } = self;
        drop(consolidator);
        drop(retriever);
        let store = Arc::try_unwrap(store).map_err(|_| {
            LtmError::Internal("vector store still shared at close".to_string())
        })?;
        store.close().await
    }
}
