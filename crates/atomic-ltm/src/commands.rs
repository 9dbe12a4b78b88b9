// SPDX-FileCopyrightText: 2026 Atomic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `search`, `remember`, `forget`, and `config` command implementations.

use clap::Args;
use serde_json::{Map, Value};
use tracing::info;

use atomic_config::LtmConfig;
use atomic_core::{ConversationState, IntentAndEntities, LtmError, LtmQueryResult, LtmTable};
use atomic_memory::{
    ConsolidationReport, DateRange, KeywordMatch, LongTermMemory, RecencyWeights,
    RetrievalOptions,
};

/// Arguments for `atomic-ltm search`.
#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Free-text query to embed.
    pub query: String,

    /// Only return rows belonging to this user.
    #[arg(long)]
    pub user: Option<String>,

    /// Logical table: knowledge_base, research_findings, events, training_events.
    #[arg(long, default_value = "knowledge_base", value_parser = parse_table)]
    pub table: LtmTable,

    /// Number of results (defaults to `retrieval.default_top_k`).
    #[arg(long)]
    pub top_k: Option<usize>,

    /// Substring the text must contain. Repeatable.
    #[arg(long = "keyword")]
    pub keywords: Vec<String>,

    /// Match any keyword instead of all of them.
    #[arg(long)]
    pub any: bool,

    /// Earliest timestamp, inclusive (ISO-8601).
    #[arg(long)]
    pub since: Option<String>,

    /// Latest timestamp, inclusive (ISO-8601).
    #[arg(long)]
    pub until: Option<String>,

    /// Blend recency into the ranking.
    #[arg(long)]
    pub boost_recency: bool,

    /// Override `retrieval.similarity_weight`.
    #[arg(long, requires = "boost_recency")]
    pub similarity_weight: Option<f32>,

    /// Override `retrieval.recency_weight`.
    #[arg(long, requires = "boost_recency")]
    pub recency_weight: Option<f32>,

    /// Print results as JSON lines.
    #[arg(long)]
    pub json: bool,
}

impl SearchArgs {
    /// Retrieval options for these arguments, falling back to `config` for weights.
    pub fn to_options(&self, config: &LtmConfig) -> RetrievalOptions {
        let date_range = (self.since.is_some() || self.until.is_some()).then(|| DateRange {
            start: self.since.clone(),
            end: self.until.clone(),
        });
        let weights = (self.similarity_weight.is_some() || self.recency_weight.is_some()).then(
            || RecencyWeights {
                similarity: self
                    .similarity_weight
                    .unwrap_or(config.retrieval.similarity_weight),
                recency: self.recency_weight.unwrap_or(config.retrieval.recency_weight),
            },
        );

        RetrievalOptions {
            table: self.table,
            top_k: self.top_k,
            keywords: self.keywords.clone(),
            keyword_match: if self.any {
                KeywordMatch::Any
            } else {
                KeywordMatch::All
            },
            date_range,
            boost_recency: self.boost_recency,
            weights,
        }
    }
}

/// Arguments for `atomic-ltm remember`.
#[derive(Args, Debug, Clone)]
pub struct RememberArgs {
    /// Owner of the consolidated fragments.
    #[arg(long)]
    pub user: String,

    #[arg(long)]
    pub goal: Option<String>,

    /// Recognized intent name.
    #[arg(long)]
    pub intent: Option<String>,

    /// Intent entity as `key=value`; JSON values are parsed. Repeatable.
    #[arg(long = "entity", value_parser = parse_entity, requires = "intent")]
    pub entities: Vec<(String, Value)>,

    /// Durable fact. Repeatable.
    #[arg(long = "fact")]
    pub facts: Vec<String>,

    #[arg(long)]
    pub summary: Option<String>,
}

/// Conversation state assembled from command-line flags.
#[derive(Debug, Clone, Default)]
pub struct CliState {
    goal: Option<String>,
    intent: Option<IntentAndEntities>,
    facts: Vec<String>,
    summary: Option<String>,
}

impl From<RememberArgs> for CliState {
    fn from(args: RememberArgs) -> Self {
        let intent = args.intent.map(|intent| IntentAndEntities {
            intent,
            entities: args.entities.into_iter().collect::<Map<String, Value>>(),
        });
        Self {
            goal: args.goal,
            intent,
            facts: args.facts,
            summary: args.summary,
        }
    }
}

impl ConversationState for CliState {
    fn user_goal(&self) -> Option<String> {
        self.goal.clone()
    }

    fn intent_and_entities(&self) -> Option<IntentAndEntities> {
        self.intent.clone()
    }

    fn key_facts(&self) -> Vec<String> {
        self.facts.clone()
    }

    fn summary(&self) -> Option<String> {
        self.summary.clone()
    }
}

/// clap value parser for logical table names.
pub fn parse_table(raw: &str) -> Result<LtmTable, String> {
    raw.parse::<LtmTable>().map_err(|_| {
        format!(
            "unknown table `{raw}` (expected knowledge_base, research_findings, events, or training_events)"
        )
    })
}

/// clap value parser for `key=value` entity pairs.
pub fn parse_entity(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{raw}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty entity key in `{raw}`"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

pub async fn run_search(config: &LtmConfig, args: SearchArgs) -> Result<(), LtmError> {
    let memory = LongTermMemory::from_config(config).await?;
    let results = search(&memory, config, &args).await;

    for result in &results {
        if args.json {
            let line = serde_json::to_string(result)
                .map_err(|e| LtmError::Internal(format!("cannot encode result: {e}")))?;
            println!("{line}");
        } else {
            println!("{}", format_result(result));
        }
    }
    if results.is_empty() && !args.json {
        println!("no matching memories");
    }

    memory.close().await
}

/// Run the retrieval described by `args` against `memory`.
pub async fn search(
    memory: &LongTermMemory,
    config: &LtmConfig,
    args: &SearchArgs,
) -> Vec<LtmQueryResult> {
    let options = args.to_options(config);
    memory
        .retriever
        .retrieve_relevant_ltm(&args.query, args.user.as_deref(), &options)
        .await
}

/// One human-readable line per result.
pub fn format_result(result: &LtmQueryResult) -> String {
    let when = result.timestamp.as_deref().unwrap_or("-");
    format!(
        "{:.3}  {:<24}  {:<24}  {}",
        result.score, result.id, when, result.text
    )
}

pub async fn run_remember(config: &LtmConfig, args: RememberArgs) -> Result<(), LtmError> {
    let memory = LongTermMemory::from_config(config).await?;
    let user = args.user.clone();
    let report = remember(&memory, &user, CliState::from(args)).await?;

    for id in &report.persisted {
        println!("stored {id}");
    }
    println!(
        "{} stored, {} skipped (embedding), {} skipped (too short), {} duplicate",
        report.persisted.len(),
        report.skipped_embedding,
        report.skipped_blank,
        report.duplicates
    );

    memory.close().await
}

pub async fn remember(
    memory: &LongTermMemory,
    user: &str,
    state: CliState,
) -> Result<ConsolidationReport, LtmError> {
    memory.consolidator.process_stm_to_ltm(user, &state).await
}

pub async fn run_forget(
    config: &LtmConfig,
    table: LtmTable,
    ids: Vec<String>,
) -> Result<(), LtmError> {
    let memory = LongTermMemory::from_config(config).await?;
    let name = config.tables.name_for(table);

    let before = memory.store.count_rows(name).await?;
    memory.store.delete_items_by_ids(name, &ids).await?;
    let removed = before.saturating_sub(memory.store.count_rows(name).await?);

    info!(table = %name, requested = ids.len(), removed, "forget complete");
    println!("removed {removed} of {} requested row(s) from {name}", ids.len());

    memory.close().await
}

/// The effective configuration as TOML, with the API key masked.
pub fn render_config(config: &LtmConfig) -> Result<String, LtmError> {
    let mut shown = config.clone();
    if shown.embedding.api_key.is_some() {
        shown.embedding.api_key = Some("********".to_string());
    }
    toml::to_string_pretty(&shown)
        .map_err(|e| LtmError::Internal(format!("cannot render configuration: {e}")))
}
