// SPDX-FileCopyrightText: 2026 Atomic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A file-backed vector store in a temp directory, paired with a mock
//! embedder and a matching configuration.

use std::sync::Arc;

use tempfile::TempDir;

use atomic_config::LtmConfig;
use atomic_core::{EmbeddingProvider, LtmError};
use atomic_store::VectorStore;

use crate::mock_embedder::MockEmbedder;

/// Everything an integration test needs to drive the memory layer.
///
/// The temp directory lives as long as the harness.
pub struct TestHarness {
    pub dir: TempDir,
    pub store: Arc<VectorStore>,
    pub embedder: Arc<MockEmbedder>,
    pub config: LtmConfig,
}

impl TestHarness {
    /// Harness with an unscripted embedder of `dimensions`.
    pub async fn new(dimensions: usize) -> Result<Self, LtmError> {
        Self::with_embedder(MockEmbedder::new(dimensions)).await
    }

    /// Harness around a prepared embedder.
    pub async fn with_embedder(embedder: MockEmbedder) -> Result<Self, LtmError> {
        let dir = tempfile::tempdir().map_err(|e| LtmError::Internal(e.to_string()))?;
        let db_path = dir.path().join("ltm.db");

        let mut config = LtmConfig::default();
        config.storage.database_path = db_path.to_string_lossy().into_owned();
        config.embedding.dimensions = embedder.dimensions();

        let store = Arc::new(VectorStore::from_config(&config.storage).await?);
        Ok(Self {
            dir,
            store,
            embedder: Arc::new(embedder),
            config,
        })
    }

    /// Reopen the same database file with a fresh connection.
    pub async fn reopen(&self) -> Result<VectorStore, LtmError> {
        VectorStore::from_config(&self.config.storage).await
    }
}
