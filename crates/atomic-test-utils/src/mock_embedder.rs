// SPDX-FileCopyrightText: 2026 Atomic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock embedding provider for deterministic testing.
//!
//! `MockEmbedder` returns scripted vectors for known texts, fails for texts
//! marked as failing, and derives a stable vector from the bytes of any
//! other text. Every request is captured for later assertions.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use atomic_core::{EmbeddingProvider, LtmError};

/// A scripted embedding provider.
pub struct MockEmbedder {
    dimensions: usize,
    vectors: HashMap<String, Vec<f32>>,
    failing: HashSet<String>,
    fail_all: bool,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockEmbedder {
    /// Create a mock producing `dimensions`-long vectors.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            vectors: HashMap::new(),
            failing: HashSet::new(),
            fail_all: false,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Return `vector` whenever `text` is embedded.
    pub fn with_vector(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.into(), vector);
        self
    }

    /// Fail with `EmbeddingFailure` whenever `text` is embedded.
    pub fn failing_on(mut self, text: impl Into<String>) -> Self {
        self.failing.insert(text.into());
        self
    }

    /// Fail every request.
    pub fn always_failing(mut self) -> Self {
        self.fail_all = true;
        self
    }

    /// Every text embedded so far, in request order.
    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    /// The vector an unscripted text maps to.
    pub fn derived_vector(&self, text: &str) -> Vec<f32> {
        let seed = text
            .bytes()
            .fold(17u64, |acc, b| acc.wrapping_mul(31).wrapping_add(u64::from(b)));
        (0..self.dimensions)
            .map(|i| {
                let mixed = seed.wrapping_mul(i as u64 * 2 + 1).rotate_left(i as u32 % 64);
                (mixed % 1000) as f32 / 1000.0
            })
            .collect()
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbedder {
    fn name(&self) -> &str {
        "mock-embedder"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>, LtmError> {
        self.calls.lock().await.push(text.to_string());
        if self.fail_all || self.failing.contains(text) {
            return Err(LtmError::EmbeddingFailure(format!(
                "mock embedder refused `{text}`"
            )));
        }
        Ok(self
            .vectors
            .get(text)
            .cloned()
            .unwrap_or_else(|| self.derived_vector(text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_vectors_failures_and_calls() {
        let embedder = MockEmbedder::new(2)
            .with_vector("standup", vec![0.1, 0.2])
            .failing_on("boom");

        assert_eq!(
            embedder.generate_embedding("standup").await.unwrap(),
            vec![0.1, 0.2]
        );
        assert!(matches!(
            embedder.generate_embedding("boom").await,
            Err(LtmError::EmbeddingFailure(_))
        ));
        let derived = embedder.generate_embedding("other").await.unwrap();
        assert_eq!(derived.len(), 2);
        assert_eq!(derived, embedder.derived_vector("other"));
        assert_eq!(embedder.calls().await, vec!["standup", "boom", "other"]);
    }

    #[tokio::test]
    async fn always_failing_rejects_everything() {
        let embedder = MockEmbedder::new(2)
            .with_vector("standup", vec![0.1, 0.2])
            .always_failing();
        assert!(embedder.generate_embedding("standup").await.is_err());
    }
}
