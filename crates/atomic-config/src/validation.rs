// SPDX-FileCopyrightText: 2026 Atomic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks semantic constraints serde attributes cannot express: non-empty
//! paths, positive dimensions, identifier-shaped table names, sane weights.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::{EmbeddingBackend, LtmConfig};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every violation instead of failing on the first one.
pub fn validate_config(config: &LtmConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    if config.embedding.dimensions == 0 {
        fail("embedding.dimensions must be at least 1".to_string());
    }

    if config.embedding.backend == EmbeddingBackend::Openai {
        if config.embedding.model.trim().is_empty() {
            fail("embedding.model must not be empty for the openai backend".to_string());
        }
        if !config.embedding.api_base.starts_with("http://")
            && !config.embedding.api_base.starts_with("https://")
        {
            fail(format!(
                "embedding.api_base `{}` must be an http(s) URL",
                config.embedding.api_base
            ));
        }
        if config.embedding.request_timeout_secs == 0 {
            fail("embedding.request_timeout_secs must be at least 1".to_string());
        }
    }

    let tables = [
        ("tables.events", &config.tables.events),
        ("tables.training_events", &config.tables.training_events),
        ("tables.knowledge_base", &config.tables.knowledge_base),
        ("tables.research_findings", &config.tables.research_findings),
    ];
    let mut seen = HashSet::new();
    for (key, name) in tables {
        if !is_identifier(name) {
            fail(format!(
                "{key} `{name}` must start with a letter or underscore and contain only letters, digits, and underscores"
            ));
        }
        if !seen.insert(name.as_str()) {
            fail(format!("{key} `{name}` is already used by another table"));
        }
    }

    if config.retrieval.default_top_k == 0 {
        fail("retrieval.default_top_k must be at least 1".to_string());
    }
    if config.retrieval.rerank_pool_multiplier == 0 {
        fail("retrieval.rerank_pool_multiplier must be at least 1".to_string());
    }
    if config.retrieval.max_rerank_pool < config.retrieval.default_top_k {
        fail(format!(
            "retrieval.max_rerank_pool ({}) must be at least retrieval.default_top_k ({})",
            config.retrieval.max_rerank_pool, config.retrieval.default_top_k
        ));
    }
    for (key, weight) in [
        ("retrieval.similarity_weight", config.retrieval.similarity_weight),
        ("retrieval.recency_weight", config.retrieval.recency_weight),
    ] {
        if !weight.is_finite() || weight < 0.0 {
            fail(format!("{key} must be a non-negative number, got {weight}"));
        }
    }

    if !LOG_LEVELS.contains(&config.logging.level.to_ascii_lowercase().as_str()) {
        fail(format!(
            "logging.level `{}` must be one of {}",
            config.logging.level,
            LOG_LEVELS.join(", ")
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Same identifier rule the vector store enforces on table names.
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_message(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        let config = LtmConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = LtmConfig::default();
        config.storage.database_path = "  ".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "database_path"));
    }

    #[test]
    fn zero_dimensions_fails_validation() {
        let mut config = LtmConfig::default();
        config.embedding.dimensions = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "embedding.dimensions"));
    }

    #[test]
    fn openai_backend_requires_http_base() {
        let mut config = LtmConfig::default();
        config.embedding.backend = EmbeddingBackend::Openai;
        config.embedding.api_base = "api.openai.com".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "api_base"));
    }

    #[test]
    fn hashing_backend_ignores_api_base() {
        let mut config = LtmConfig::default();
        config.embedding.api_base = String::new();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn table_names_must_be_identifiers() {
        let mut config = LtmConfig::default();
        config.tables.events = "events; DROP TABLE x".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "tables.events"));
    }

    #[test]
    fn duplicate_table_names_fail_validation() {
        let mut config = LtmConfig::default();
        config.tables.research_findings = config.tables.knowledge_base.clone();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "already used"));
    }

    #[test]
    fn negative_weight_fails_validation() {
        let mut config = LtmConfig::default();
        config.retrieval.recency_weight = -0.1;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "recency_weight"));
    }

    #[test]
    fn pool_smaller_than_top_k_fails_validation() {
        let mut config = LtmConfig::default();
        config.retrieval.default_top_k = 10;
        config.retrieval.max_rerank_pool = 4;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "max_rerank_pool"));
    }

    #[test]
    fn all_errors_are_collected() {
        let mut config = LtmConfig::default();
        config.storage.database_path = String::new();
        config.embedding.dimensions = 0;
        config.logging.level = "loud".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn identifier_rule() {
        assert!(is_identifier("knowledge_base"));
        assert!(is_identifier("_private2"));
        assert!(!is_identifier("2fast"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("with-dash"));
    }
}
