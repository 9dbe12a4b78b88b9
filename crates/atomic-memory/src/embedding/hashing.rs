// SPDX-FileCopyrightText: 2026 Atomic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic local embeddings via signed feature hashing.
//!
//! Each lowercase alphanumeric token is hashed with SHA-256; the digest picks
//! a bucket and a sign. Adjacent token pairs are hashed the same way at half
//! weight so word order contributes a little. The result is L2-normalized, so
//! texts sharing vocabulary land close together under L2 distance.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use atomic_core::{EmbeddingProvider, LtmError};

const BIGRAM_WEIGHT: f32 = 0.5;

/// Feature-hashing embedder. No network, no model files.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Result<Self, LtmError> {
        if dimensions == 0 {
            return Err(LtmError::Config(
                "hashing embedder needs at least one dimension".to_string(),
            ));
        }
        Ok(Self { dimensions })
    }

    /// Embed synchronously. Fails when `text` contains no tokens.
    pub fn embed(&self, text: &str) -> Result<Vec<f32>, LtmError> {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return Err(LtmError::EmbeddingFailure(
                "text contains no embeddable tokens".to_string(),
            ));
        }

        let mut vector = vec![0.0f32; self.dimensions];
        for token in &tokens {
            self.accumulate(&mut vector, token.as_bytes(), 1.0);
        }
        for pair in tokens.windows(2) {
            let bigram = format!("{} {}", pair[0], pair[1]);
            self.accumulate(&mut vector, bigram.as_bytes(), BIGRAM_WEIGHT);
        }
        Ok(l2_normalize(&vector))
    }

    fn accumulate(&self, vector: &mut [f32], feature: &[u8], weight: f32) {
        let digest = Sha256::digest(feature);
        let mut bucket_bytes = [0u8; 8];
        bucket_bytes.copy_from_slice(&digest[..8]);
        let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimensions as u64) as usize;
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    fn name(&self) -> &str {
        "hashing"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>, LtmError> {
        self.embed(text)
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// L2-normalize a vector.
pub(crate) fn l2_normalize(vec: &[f32]) -> Vec<f32> {
    let norm: f32 = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        vec.iter().map(|v| v / norm).collect()
    } else {
        vec.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atomic_store::row::l2_distance;

    #[test]
    fn l2_normalize_general_vector() {
        let n = l2_normalize(&[3.0, 4.0]);
        assert!((n[0] - 0.6).abs() < 0.001);
        assert!((n[1] - 0.8).abs() < 0.001);
    }

    #[test]
    fn l2_normalize_zero_vector() {
        assert_eq!(l2_normalize(&[0.0, 0.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn tokenize_lowercases_and_splits_on_punctuation() {
        assert_eq!(
            tokenize("Lunch w/ Dana @ 12:30!"),
            vec!["lunch", "w", "dana", "12", "30"]
        );
        assert!(tokenize("  ...  ").is_empty());
    }

    #[test]
    fn zero_dimensions_is_rejected() {
        assert!(matches!(HashingEmbedder::new(0), Err(LtmError::Config(_))));
    }

    #[tokio::test]
    async fn embeddings_are_deterministic_and_unit_length() {
        let embedder = HashingEmbedder::new(64).unwrap();
        let a = embedder.generate_embedding("Weekly planning meeting").await.unwrap();
        let b = embedder.generate_embedding("weekly  PLANNING meeting").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn blank_text_is_an_embedding_failure() {
        let embedder = HashingEmbedder::new(16).unwrap();
        let err = embedder.generate_embedding("").await.unwrap_err();
        assert!(matches!(err, LtmError::EmbeddingFailure(_)));
    }

    #[test]
    fn shared_vocabulary_is_closer() {
        let embedder = HashingEmbedder::new(256).unwrap();
        let query = embedder.embed("dentist appointment").unwrap();
        let related = embedder.embed("book a dentist appointment on friday").unwrap();
        let unrelated = embedder.embed("quarterly revenue forecast review").unwrap();
        assert!(l2_distance(&query, &related) < l2_distance(&query, &unrelated));
    }
}
