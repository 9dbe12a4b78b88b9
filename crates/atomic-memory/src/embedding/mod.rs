// SPDX-FileCopyrightText: 2026 Atomic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding providers and backend selection.

pub mod hashing;
pub mod openai;

use std::sync::Arc;

use tracing::info;

use atomic_config::model::{EmbeddingBackend, EmbeddingConfig};
use atomic_core::{EmbeddingProvider, LtmError};

pub use hashing::HashingEmbedder;
pub use openai::OpenAiEmbedder;

/// Construct the embedding provider selected by `[embedding] backend`.
pub fn embedder_from_config(
    config: &EmbeddingConfig,
) -> Result<Arc<dyn EmbeddingProvider>, LtmError> {
    let embedder: Arc<dyn EmbeddingProvider> = match config.backend {
        EmbeddingBackend::Hashing => Arc::new(HashingEmbedder::new(config.dimensions)?),
        EmbeddingBackend::Openai => Arc::new(OpenAiEmbedder::from_config(config)?),
    };
    info!(
        provider = embedder.name(),
        dimensions = embedder.dimensions(),
        "embedding provider ready"
    );
    Ok(embedder)
}
