// SPDX-FileCopyrightText: 2026 Atomic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Short-term to long-term memory consolidation.
//!
//! Pulls durable fragments (user goal, intent and entities, key facts, and
//! optionally the rolling summary) out of a conversation state, embeds each
//! one, and upserts them into the knowledge-base table. Fragment ids are
//! derived from the user, the fragment kind, and a hash of the normalized
//! text, so consolidating the same state twice overwrites instead of
//! duplicating.

use std::collections::HashSet;
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use atomic_config::model::ConsolidationConfig;
use atomic_core::{ConversationState, EmbeddingProvider, FragmentKind, IntentAndEntities, LtmError};
use atomic_store::{KnowledgeEntry, RecordTable, VectorStore};

/// Hex characters of the text digest kept in fragment ids.
const ID_HASH_LEN: usize = 16;

/// Outcome of one consolidation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsolidationReport {
    /// Ids written to the knowledge base, in extraction order.
    pub persisted: Vec<String>,
    /// Fragments dropped because the embedding provider failed.
    pub skipped_embedding: usize,
    /// Fragments dropped for being blank or too short.
    pub skipped_blank: usize,
    /// Fragments collapsed into an earlier identical fragment.
    pub duplicates: usize,
}

/// A candidate piece of short-term memory.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub kind: FragmentKind,
    pub text: String,
    pub intent: Option<IntentAndEntities>,
}

/// Moves durable conversation fragments into the knowledge-base table.
pub struct MemoryConsolidator {
    table: RecordTable<KnowledgeEntry>,
    embedder: Arc<dyn EmbeddingProvider>,
    config: ConsolidationConfig,
}

impl MemoryConsolidator {
    /// Creates a consolidator writing to `table_name` in `store`.
    pub fn new(
        store: Arc<VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        table_name: impl Into<String>,
        config: ConsolidationConfig,
    ) -> Result<Self, LtmError> {
        let table = RecordTable::new(store, table_name, embedder.dimensions())?;
        Ok(Self {
            table,
            embedder,
            config,
        })
    }

    pub fn table_name(&self) -> &str {
        self.table.name()
    }

    /// Persist the durable parts of `state` for `user_id`.
    ///
    /// A fragment whose embedding fails is logged and skipped; the pass
    /// still succeeds. A failed write fails the whole call with
    /// [`LtmError::WriteFailure`].
    pub async fn process_stm_to_ltm(
        &self,
        user_id: &str,
        state: &dyn ConversationState,
    ) -> Result<ConsolidationReport, LtmError> {
        let mut report = ConsolidationReport::default();
        let mut seen = HashSet::new();
        let timestamp = chrono::Utc::now()
            .format("%Y-%m-%dT%H:%M:%S%.3fZ")
            .to_string();
        let dimensions = self.embedder.dimensions();

        let mut entries = Vec::new();
        for fragment in extract_fragments(state, self.config.include_summary) {
            if fragment.text.trim().chars().count() < self.config.min_fragment_chars.max(1) {
                report.skipped_blank += 1;
                continue;
            }

            let id = fragment_id(user_id, fragment.kind, &fragment.text);
            if !seen.insert(id.clone()) {
                report.duplicates += 1;
                continue;
            }

            let vector = match self.embedder.generate_embedding(&fragment.text).await {
                Ok(vector) if vector.len() == dimensions => vector,
                Ok(vector) => {
                    warn!(
                        kind = %fragment.kind,
                        got = vector.len(),
                        expected = dimensions,
                        "embedding has wrong dimensionality, skipping fragment"
                    );
                    report.skipped_embedding += 1;
                    continue;
                }
                Err(e) => {
                    warn!(kind = %fragment.kind, error = %e, "embedding failed, skipping fragment");
                    report.skipped_embedding += 1;
                    continue;
                }
            };

            let (intent, entities) = match fragment.intent {
                Some(ie) => (Some(ie.intent), Some(ie.entities)),
                None => (None, None),
            };
            entries.push(KnowledgeEntry {
                id,
                user_id: user_id.to_string(),
                vector,
                text: fragment.text.trim().to_string(),
                kind: fragment.kind,
                timestamp: timestamp.clone(),
                intent,
                entities,
            });
        }

        if entries.is_empty() {
            debug!(user_id, "no fragments to consolidate");
            return Ok(report);
        }

        self.table
            .upsert(&entries)
            .await
            .map_err(|e| LtmError::WriteFailure {
                table: self.table.name().to_string(),
                source: Box::new(e),
            })?;

        report.persisted = entries.into_iter().map(|e| e.id).collect();
        info!(
            user_id,
            persisted = report.persisted.len(),
            skipped_embedding = report.skipped_embedding,
            skipped_blank = report.skipped_blank,
            duplicates = report.duplicates,
            "consolidated short-term memory"
        );
        Ok(report)
    }
}

/// Candidate fragments in extraction order: goal, intent, key facts, summary.
pub fn extract_fragments(state: &dyn ConversationState, include_summary: bool) -> Vec<Fragment> {
    let mut fragments = Vec::new();

    if let Some(goal) = state.user_goal() {
        fragments.push(Fragment {
            kind: FragmentKind::UserGoal,
            text: goal,
            intent: None,
        });
    }

    if let Some(ie) = state.intent_and_entities() {
        if !ie.intent.trim().is_empty() {
            fragments.push(Fragment {
                kind: FragmentKind::Intent,
                text: describe_intent(&ie),
                intent: Some(ie),
            });
        }
    }

    fragments.extend(state.key_facts().into_iter().map(|fact| Fragment {
        kind: FragmentKind::KeyFact,
        text: fact,
        intent: None,
    }));

    if include_summary {
        if let Some(summary) = state.summary() {
            fragments.push(Fragment {
                kind: FragmentKind::Summary,
                text: summary,
                intent: None,
            });
        }
    }

    fragments
}

/// `intent (key: value, ...)`, with string values unquoted.
fn describe_intent(ie: &IntentAndEntities) -> String {
    if ie.entities.is_empty() {
        return ie.intent.clone();
    }
    let entities = ie
        .entities
        .iter()
        .map(|(k, v)| match v.as_str() {
            Some(s) => format!("{k}: {s}"),
            None => format!("{k}: {v}"),
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("{} ({entities})", ie.intent)
}

/// `<user>:<kind>:<hash>` over whitespace-collapsed, lowercased text.
pub fn fragment_id(user_id: &str, kind: FragmentKind, text: &str) -> String {
    let normalized = text
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    let digest = hex::encode(Sha256::digest(normalized.as_bytes()));
    format!("{user_id}:{kind}:{}", &digest[..ID_HASH_LEN])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct State {
        goal: Option<String>,
        intent: Option<IntentAndEntities>,
        facts: Vec<String>,
        summary: Option<String>,
    }

    impl ConversationState for State {
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

    fn state() -> State {
        State {
            goal: Some("Schedule the team offsite".into()),
            intent: Some(IntentAndEntities {
                intent: "schedule_meeting".into(),
                entities: json!({ "city": "Oslo", "size": 12 })
                    .as_object()
                    .cloned()
                    .unwrap(),
            }),
            facts: vec!["Prefers mornings".into()],
            summary: Some("Planning an offsite".into()),
        }
    }

    #[test]
    fn fragments_come_out_in_order() {
        let kinds: Vec<FragmentKind> = extract_fragments(&state(), true)
            .into_iter()
            .map(|f| f.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                FragmentKind::UserGoal,
                FragmentKind::Intent,
                FragmentKind::KeyFact,
                FragmentKind::Summary
            ]
        );
        assert_eq!(extract_fragments(&state(), false).len(), 3);
    }

    #[test]
    fn intent_text_lists_entities() {
        let fragments = extract_fragments(&state(), false);
        assert_eq!(fragments[1].text, "schedule_meeting (city: Oslo, size: 12)");
    }

    #[test]
    fn blank_intent_is_not_a_fragment() {
        let mut s = state();
        s.intent = Some(IntentAndEntities::default());
        assert!(extract_fragments(&s, false)
            .iter()
            .all(|f| f.kind != FragmentKind::Intent));
    }

    #[test]
    fn fragment_ids_are_stable_and_normalized() {
        let a = fragment_id("u1", FragmentKind::KeyFact, "Prefers  Mornings");
        let b = fragment_id("u1", FragmentKind::KeyFact, " prefers mornings ");
        assert_eq!(a, b);
        assert!(a.starts_with("u1:key_fact:"));
        assert_eq!(a.len(), "u1:key_fact:".len() + ID_HASH_LEN);
        assert_ne!(a, fragment_id("u1", FragmentKind::Summary, "Prefers mornings"));
        assert_ne!(a, fragment_id("u2", FragmentKind::KeyFact, "Prefers mornings"));
    }
}
