// SPDX-FileCopyrightText: 2026 Atomic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI-compatible `/embeddings` HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use atomic_config::model::EmbeddingConfig;
use atomic_core::{EmbeddingProvider, LtmError};

/// Environment variable consulted when the config carries no API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
    dimensions: usize,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Embedding provider backed by an OpenAI-compatible HTTP endpoint.
pub struct OpenAiEmbedder {
    http_client: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
    dimensions: usize,
}

impl OpenAiEmbedder {
    /// Build a client from the `[embedding]` config section.
    ///
    /// The API key comes from the config or, failing that, `OPENAI_API_KEY`.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self, LtmError> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                LtmError::Config(format!(
                    "openai embedding backend needs embedding.api_key or {API_KEY_ENV}"
                ))
            })?;
        Self::new(
            &config.api_base,
            api_key,
            config.model.clone(),
            config.dimensions,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn new(
        api_base: &str,
        api_key: String,
        model: String,
        dimensions: usize,
        timeout: Duration,
    ) -> Result<Self, LtmError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LtmError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            http_client,
            url: format!("{}/embeddings", api_base.trim_end_matches('/')),
            api_key,
            model,
            dimensions,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    fn name(&self) -> &str {
        "openai"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>, LtmError> {
        let body = EmbeddingRequest {
            model: &self.model,
            input: text,
            dimensions: self.dimensions,
        };

        let response = self
            .http_client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LtmError::Provider {
                message: format!("embedding request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(LtmError::Provider {
                message: format!("embedding API error {status}: {body_text}"),
                source: None,
            });
        }

        let parsed: EmbeddingResponse = response.json().await.map_err(|e| LtmError::Provider {
            message: format!("failed to parse embedding response: {e}"),
            source: Some(Box::new(e)),
        })?;

        let embedding = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| LtmError::EmbeddingFailure("response contained no embedding".into()))?;

        if embedding.len() != self.dimensions {
            return Err(LtmError::EmbeddingFailure(format!(
                "provider returned {} dimensions, expected {}",
                embedding.len(),
                self.dimensions
            )));
        }

        debug!(model = %self.model, dimensions = embedding.len(), "embedding generated");
        Ok(embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_embedder(base_url: &str, dimensions: usize) -> OpenAiEmbedder {
        OpenAiEmbedder::new(
            &format!("{base_url}/v1/"),
            "sk-test".to_string(),
            "text-embedding-3-small".to_string(),
            dimensions,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn posts_model_input_and_dimensions_with_bearer_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "text-embedding-3-small",
                "input": "lunch with Dana",
                "dimensions": 3
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "object": "list",
                "data": [{ "object": "embedding", "index": 0, "embedding": [0.1, 0.2, 0.3] }],
                "model": "text-embedding-3-small",
                "usage": { "prompt_tokens": 3, "total_tokens": 3 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let embedder = test_embedder(&server.uri(), 3);
        let vector = embedder.generate_embedding("lunch with Dana").await.unwrap();
        assert_eq!(vector, vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn http_error_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": { "message": "rate limited" }
            })))
            .mount(&server)
            .await;

        let err = test_embedder(&server.uri(), 3)
            .generate_embedding("anything")
            .await
            .unwrap_err();
        match err {
            LtmError::Provider { message, .. } => assert!(message.contains("429"), "{message}"),
            other => panic!("expected provider error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn wrong_dimensions_is_embedding_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "embedding": [0.1, 0.2] }]
            })))
            .mount(&server)
            .await;

        let err = test_embedder(&server.uri(), 3)
            .generate_embedding("anything")
            .await
            .unwrap_err();
        assert!(matches!(err, LtmError::EmbeddingFailure(_)));
    }

    #[tokio::test]
    async fn empty_data_is_embedding_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
            .mount(&server)
            .await;

        let err = test_embedder(&server.uri(), 3)
            .generate_embedding("anything")
            .await
            .unwrap_err();
        assert!(matches!(err, LtmError::EmbeddingFailure(_)));
    }

    #[test]
    fn from_config_uses_configured_key() {
        let config = EmbeddingConfig {
            api_key: Some("sk-config".to_string()),
            api_base: "http://localhost:1234/v1".to_string(),
            ..EmbeddingConfig::default()
        };
        let embedder = OpenAiEmbedder::from_config(&config).unwrap();
        assert_eq!(embedder.url, "http://localhost:1234/v1/embeddings");
        assert_eq!(embedder.api_key, "sk-config");
        assert_eq!(embedder.dimensions(), 1536);
    }
}
