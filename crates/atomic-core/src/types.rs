// SPDX-FileCopyrightText: 2026 Atomic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by retrieval, consolidation, and the state loader.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

/// The logical long-term memory tables a retrieval can target.
///
/// Physical table names come from configuration; this enum only names the role.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LtmTable {
    /// General knowledge base written by consolidation.
    #[default]
    KnowledgeBase,
    /// Research findings gathered by the agent.
    ResearchFindings,
    /// Calendar events.
    Events,
    /// Training events used to learn scheduling preferences.
    TrainingEvents,
}

/// What a consolidated knowledge-base fragment was extracted from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FragmentKind {
    UserGoal,
    Intent,
    KeyFact,
    Summary,
}

/// A recognized intent with its extracted entities.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntentAndEntities {
    pub intent: String,
    #[serde(default)]
    pub entities: Map<String, Value>,
}

/// One ranked hit returned by relevance retrieval.
///
/// `score` is "higher is better" within a single call. Without recency boosting
/// it is `1 / (1 + distance)`; with boosting it is the blended final score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LtmQueryResult {
    pub id: String,
    pub text: String,
    pub score: f32,
    /// Raw L2 distance reported by the vector store.
    pub distance: f32,
    pub timestamp: Option<String>,
    /// Every payload field except the text column.
    pub metadata: Option<Map<String, Value>>,
    /// Physical table the row came from.
    pub table: String,
}

impl LtmQueryResult {
    /// Returns the `kind` payload field, if the row carries one.
    pub fn kind(&self) -> Option<FragmentKind> {
        self.metadata
            .as_ref()
            .and_then(|m| m.get("kind"))
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
    }

    /// Returns the stored intent and entities, if the row carries an intent.
    pub fn intent_and_entities(&self) -> Option<IntentAndEntities> {
        let metadata = self.metadata.as_ref()?;
        let intent = metadata.get("intent").and_then(Value::as_str)?;
        if intent.is_empty() {
            return None;
        }
        let entities = metadata
            .get("entities")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        Some(IntentAndEntities {
            intent: intent.to_string(),
            entities,
        })
    }
}
