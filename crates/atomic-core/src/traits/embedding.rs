// SPDX-FileCopyrightText: 2026 Atomic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding provider trait for vector embedding generation.

use async_trait::async_trait;

use crate::error::LtmError;

/// Turns text into a fixed-length vector.
///
/// `LtmError::EmbeddingFailure` is the "could not embed" signal. Callers on the
/// read path turn it into an empty result; the write path skips the fragment.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync + 'static {
    /// Returns the human-readable name of this provider.
    fn name(&self) -> &str;

    /// Length of every vector this provider returns.
    fn dimensions(&self) -> usize;

    /// Generates one embedding for `text`.
    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>, LtmError>;
}
