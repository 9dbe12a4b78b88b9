// SPDX-FileCopyrightText: 2026 Atomic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Relevance retrieval with optional recency re-ranking.
//!
//! The retriever embeds the query once, runs a filtered nearest-neighbour
//! search against one LTM table, converts distances to similarities, and,
//! when asked, blends similarity with how recent each candidate is relative
//! to the rest of the candidate pool.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use tracing::{debug, error, warn};

use atomic_config::model::{RetrievalConfig, TablesConfig};
use atomic_core::{EmbeddingProvider, LtmError, LtmQueryResult, LtmTable};
use atomic_store::{ColumnProfile, Filter, SearchHit, VectorStore, profile_for, representative_for};

/// How multiple keywords combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeywordMatch {
    /// Every keyword must appear in the text column.
    #[default]
    All,
    /// At least one keyword must appear.
    Any,
}

/// Inclusive bounds on the timestamp column, compared as ISO-8601 strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// Blend weights for recency re-ranking. Normalized by their sum before use.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecencyWeights {
    pub similarity: f32,
    pub recency: f32,
}

impl RecencyWeights {
    /// Weights scaled to sum to one. Degenerate weights fall back to similarity only.
    pub fn normalized(self) -> Self {
        let (s, r) = (self.similarity.max(0.0), self.recency.max(0.0));
        let total = s + r;
        if !total.is_finite() || total <= f32::EPSILON {
            return Self {
                similarity: 1.0,
                recency: 0.0,
            };
        }
        Self {
            similarity: s / total,
            recency: r / total,
        }
    }
}

/// Per-call retrieval options. `Default` searches the knowledge base.
#[derive(Debug, Clone, Default)]
pub struct RetrievalOptions {
    pub table: LtmTable,
    /// Results to return; falls back to `retrieval.default_top_k`.
    pub top_k: Option<usize>,
    pub keywords: Vec<String>,
    pub keyword_match: KeywordMatch,
    pub date_range: Option<DateRange>,
    pub boost_recency: bool,
    /// Falls back to the configured weights.
    pub weights: Option<RecencyWeights>,
}

/// Answers "what do we already know that is relevant to this query".
pub struct LtmRetriever {
    store: Arc<VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    tables: TablesConfig,
    config: RetrievalConfig,
}

impl LtmRetriever {
    pub fn new(
        store: Arc<VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        tables: TablesConfig,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            tables,
            config,
        }
    }

    /// Ranked results for `query`, or an empty list on any failure.
    ///
    /// Embedding failures are logged at `warn`, store failures at `error`,
    /// and a search that simply matched nothing at `debug`.
    pub async fn retrieve_relevant_ltm(
        &self,
        query: &str,
        user_id: Option<&str>,
        options: &RetrievalOptions,
    ) -> Vec<LtmQueryResult> {
        match self.try_retrieve(query, user_id, options).await {
            Ok(results) => {
                if results.is_empty() {
                    debug!(table = %options.table, "search ran, found no matching memories");
                }
                results
            }
            Err(LtmError::EmbeddingFailure(reason)) => {
                warn!(
                    table = %options.table,
                    reason = %reason,
                    "query embedding failed, returning no memories"
                );
                Vec::new()
            }
            Err(e) => {
                error!(table = %options.table, error = %e, "memory retrieval failed");
                Vec::new()
            }
        }
    }

    /// The retrieval pipeline with failures surfaced.
    ///
    /// Any error from the embedding provider is reported as
    /// [`LtmError::EmbeddingFailure`].
    pub async fn try_retrieve(
        &self,
        query: &str,
        user_id: Option<&str>,
        options: &RetrievalOptions,
    ) -> Result<Vec<LtmQueryResult>, LtmError> {
        let top_k = options.top_k.unwrap_or(self.config.default_top_k);
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self
            .embedder
            .generate_embedding(query)
            .await
            .map_err(|e| match e {
                LtmError::EmbeddingFailure(_) => e,
                other => LtmError::EmbeddingFailure(other.to_string()),
            })?;

        let profile = profile_for(options.table);
        let table = self.tables.name_for(options.table);
        let representative = representative_for(options.table, self.embedder.dimensions())?;
        let filter = build_filter(&profile, user_id, options);
        let pool = if options.boost_recency {
            rerank_pool_size(top_k, &self.config)
        } else {
            top_k
        };

        let hits = self
            .store
            .search_table_by_vector(
                table,
                &query_embedding,
                pool,
                &representative,
                filter.as_ref(),
            )
            .await?;

        let results: Vec<LtmQueryResult> = hits
            .into_iter()
            .map(|hit| to_query_result(hit, &profile, table))
            .collect();

        if !options.boost_recency {
            return Ok(results);
        }

        let weights = options.weights.unwrap_or(RecencyWeights {
            similarity: self.config.similarity_weight,
            recency: self.config.recency_weight,
        });
        Ok(rerank_by_recency(results, weights, top_k))
    }
}

/// `top_k * multiplier`, capped at the configured maximum but never below `top_k`.
fn rerank_pool_size(top_k: usize, config: &RetrievalConfig) -> usize {
    top_k
        .saturating_mul(config.rerank_pool_multiplier.max(1))
        .min(config.max_rerank_pool.max(top_k))
}

/// User scoping, keywords over the text column, and date bounds, ANDed together.
pub fn build_filter(
    profile: &ColumnProfile,
    user_id: Option<&str>,
    options: &RetrievalOptions,
) -> Option<Filter> {
    let mut clauses = Vec::new();

    if let Some(user_id) = user_id {
        clauses.push(Filter::eq(profile.user, user_id));
    }

    let keywords: Vec<Filter> = options
        .keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .map(|k| Filter::contains(profile.text, k))
        .collect();
    if !keywords.is_empty() {
        match options.keyword_match {
            KeywordMatch::All => clauses.extend(keywords),
            KeywordMatch::Any => clauses.push(Filter::Or(keywords)),
        }
    }

    if let Some(range) = &options.date_range {
        if let Some(start) = &range.start {
            clauses.push(Filter::gte(profile.timestamp, start.as_str()));
        }
        if let Some(end) = &range.end {
            clauses.push(Filter::lte(profile.timestamp, end.as_str()));
        }
    }

    Filter::all(clauses)
}

/// `1 / (1 + distance)`: 1 for an exact match, approaching 0 with distance.
pub fn similarity_from_distance(distance: f32) -> f32 {
    1.0 / (1.0 + distance.max(0.0))
}

fn to_query_result(hit: SearchHit, profile: &ColumnProfile, table: &str) -> LtmQueryResult {
    let mut fields = hit.row.fields;
    let text = match fields.remove(profile.text) {
        Some(Value::String(s)) => s,
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };
    let timestamp = fields
        .get(profile.timestamp)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    LtmQueryResult {
        id: hit.row.id,
        text,
        score: similarity_from_distance(hit.distance),
        distance: hit.distance,
        timestamp,
        metadata: if fields.is_empty() { None } else { Some(fields) },
        table: table.to_string(),
    }
}

/// Blend similarity with pool-relative recency, re-sort, and keep `top_k`.
///
/// Recency is linear within the pool: the newest parseable timestamp scores
/// 1, the oldest 0, and a pool whose timestamps are all equal scores 1.
/// Missing or unparseable timestamps score 0. Ties keep similarity order.
pub fn rerank_by_recency(
    mut results: Vec<LtmQueryResult>,
    weights: RecencyWeights,
    top_k: usize,
) -> Vec<LtmQueryResult> {
    let weights = weights.normalized();
    let times: Vec<Option<i64>> = results
        .iter()
        .map(|r| r.timestamp.as_deref().and_then(parse_timestamp))
        .collect();
    let newest = times.iter().flatten().max().copied();
    let oldest = times.iter().flatten().min().copied();

    for (result, time) in results.iter_mut().zip(&times) {
        let recency = match (time, oldest, newest) {
            (Some(t), Some(lo), Some(hi)) if hi > lo => (t - lo) as f32 / (hi - lo) as f32,
            (Some(_), _, _) => 1.0,
            (None, _, _) => 0.0,
        };
        let similarity = result.score;
        result.score = weights.similarity * similarity + weights.recency * recency;
    }

    results.sort_by(|a, b| b.score.total_cmp(&a.score));
    results.truncate(top_k);
    results
}

/// Milliseconds since the epoch for RFC 3339, naive date-time, or bare date strings.
pub fn parse_timestamp(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}
