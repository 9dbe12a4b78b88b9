// SPDX-FileCopyrightText: 2026 Atomic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `atomic-ltm doctor` command implementation.
//!
//! Runs diagnostic checks against the vector store and the configured
//! embedding provider.

use std::io::IsTerminal;
use std::time::{Duration, Instant};

use atomic_config::LtmConfig;
use atomic_core::{LtmError, LtmTable};
use atomic_memory::embedder_from_config;
use atomic_store::VectorStore;

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }
}

/// Run every check and print a report. Check failures are reported, not returned.
pub async fn run_doctor(config: &LtmConfig, plain: bool) -> Result<(), LtmError> {
    let use_color = !plain && std::io::stdout().is_terminal();
    let results = collect_checks(config).await;

    println!();
    println!("  atomic-ltm doctor");
    println!("  {}", "-".repeat(50));

    let mut issues = 0;
    for result in &results {
        if result.status != CheckStatus::Pass {
            issues += 1;
        }
        println!("{}", format_check(result, use_color));
    }

    println!();
    if issues > 0 {
        let issue_word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {issue_word} found.");
    } else {
        println!("  All checks passed.");
    }
    println!();

    Ok(())
}

pub async fn collect_checks(config: &LtmConfig) -> Vec<CheckResult> {
    let mut results = Vec::new();
    let (store_check, store) = check_store(config).await;
    results.push(store_check);
    if let Some(store) = store {
        results.push(check_tables(config, &store).await);
        if let Err(e) = store.close().await {
            tracing::warn!(error = %e, "store did not close cleanly after checks");
        }
    }
    results.push(check_embedder(config).await);
    results
}

fn format_check(result: &CheckResult, use_color: bool) -> String {
    let duration_ms = result.duration.as_millis();
    if use_color {
        use colored::Colorize;
        let (symbol, message) = match result.status {
            CheckStatus::Pass => ("✓".green().to_string(), result.message.normal()),
            CheckStatus::Warn => ("!".yellow().to_string(), result.message.yellow()),
            CheckStatus::Fail => ("✗".red().to_string(), result.message.red()),
        };
        format!(
            "    {symbol} {:<20} {message} ({duration_ms}ms)",
            result.name
        )
    } else {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        format!(
            "    {tag} {:<20} {} ({duration_ms}ms)",
            result.name, result.message
        )
    }
}

/// Open the store and run a trivial query.
async fn check_store(config: &LtmConfig) -> (CheckResult, Option<VectorStore>) {
    let start = Instant::now();
    let path = &config.storage.database_path;
    let existed = std::path::Path::new(path).exists();

    let store = match VectorStore::from_config(&config.storage).await {
        Ok(store) => store,
        Err(e) => {
            return (
                CheckResult::new("Vector store", CheckStatus::Fail, e.to_string(), start),
                None,
            );
        }
    };

    let check = match store.health_check().await {
        Ok(()) if existed => CheckResult::new("Vector store", CheckStatus::Pass, "connected", start),
        Ok(()) => CheckResult::new(
            "Vector store",
            CheckStatus::Warn,
            format!("created empty store at {path}"),
            start,
        ),
        Err(e) => CheckResult::new(
            "Vector store",
            CheckStatus::Fail,
            format!("query failed: {e}"),
            start,
        ),
    };
    (check, Some(store))
}

/// Row counts for the configured tables, flagging dimension mismatches.
async fn check_tables(config: &LtmConfig, store: &VectorStore) -> CheckResult {
    let start = Instant::now();
    let expected = config.embedding.dimensions;
    let mut summary = Vec::new();
    let mut mismatched = Vec::new();

    for table in [
        LtmTable::KnowledgeBase,
        LtmTable::ResearchFindings,
        LtmTable::Events,
        LtmTable::TrainingEvents,
    ] {
        let name = config.tables.name_for(table);
        match store.table_schema(name).await {
            Ok(Some(schema)) => {
                let rows = store.count_rows(name).await.unwrap_or_default();
                summary.push(format!("{name}={rows}"));
                if schema.dimension != expected {
                    mismatched.push(format!("{name} ({})", schema.dimension));
                }
            }
            Ok(None) => {}
            Err(e) => {
                return CheckResult::new("Tables", CheckStatus::Fail, e.to_string(), start);
            }
        }
    }

    if !mismatched.is_empty() {
        return CheckResult::new(
            "Tables",
            CheckStatus::Fail,
            format!(
                "dimension differs from embedding.dimensions={expected}: {}",
                mismatched.join(", ")
            ),
            start,
        );
    }
    if summary.is_empty() {
        return CheckResult::new("Tables", CheckStatus::Pass, "none created yet", start);
    }
    CheckResult::new("Tables", CheckStatus::Pass, summary.join(", "), start)
}

/// Build the embedder and embed a probe string.
async fn check_embedder(config: &LtmConfig) -> CheckResult {
    let start = Instant::now();
    let embedder = match embedder_from_config(&config.embedding) {
        Ok(embedder) => embedder,
        Err(e) => return CheckResult::new("Embeddings", CheckStatus::Fail, e.to_string(), start),
    };

    match embedder.generate_embedding("atomic-ltm doctor probe").await {
        Ok(vector) if vector.len() == embedder.dimensions() => CheckResult::new(
            "Embeddings",
            CheckStatus::Pass,
            format!("{} ({} dims)", embedder.name(), vector.len()),
            start,
        ),
        Ok(vector) => CheckResult::new(
            "Embeddings",
            CheckStatus::Fail,
            format!(
                "{} returned {} dims, expected {}",
                embedder.name(),
                vector.len(),
                embedder.dimensions()
            ),
            start,
        ),
        Err(e) => CheckResult::new("Embeddings", CheckStatus::Fail, e.to_string(), start),
    }
}
