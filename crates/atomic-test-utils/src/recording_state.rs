// SPDX-FileCopyrightText: 2026 Atomic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory conversation state that records every mutation.

use serde_json::{Map, Value};

use atomic_core::{ConversationState, ConversationStateActions, IntentAndEntities, LtmQueryResult};

/// A conversation state usable as both the consolidation source and the
/// state-loader target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingState {
    pub user_goal: Option<String>,
    pub intent: Option<IntentAndEntities>,
    pub key_facts: Vec<String>,
    pub summary: Option<String>,
    pub ltm_context: Vec<LtmQueryResult>,
    /// Number of times each callback fired: goal, intent, context.
    pub update_counts: (usize, usize, usize),
}

impl RecordingState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_goal(mut self, goal: impl Into<String>) -> Self {
        self.user_goal = Some(goal.into());
        self
    }

    pub fn with_intent(mut self, intent: impl Into<String>, entities: Value) -> Self {
        self.intent = Some(IntentAndEntities {
            intent: intent.into(),
            entities: entities.as_object().cloned().unwrap_or_else(Map::new),
        });
        self
    }

    pub fn with_fact(mut self, fact: impl Into<String>) -> Self {
        self.key_facts.push(fact.into());
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }
}

impl ConversationState for RecordingState {
    fn user_goal(&self) -> Option<String> {
        self.user_goal.clone()
    }

    fn intent_and_entities(&self) -> Option<IntentAndEntities> {
        self.intent.clone()
    }

    fn key_facts(&self) -> Vec<String> {
        self.key_facts.clone()
    }

    fn summary(&self) -> Option<String> {
        self.summary.clone()
    }
}

impl ConversationStateActions for RecordingState {
    fn update_user_goal(&mut self, goal: Option<String>) {
        self.user_goal = goal;
        self.update_counts.0 += 1;
    }

    fn update_intent_and_entities(&mut self, intent: Option<IntentAndEntities>) {
        self.intent = intent;
        self.update_counts.1 += 1;
    }

    fn update_ltm_repo_context(&mut self, results: Vec<LtmQueryResult>) {
        self.ltm_context = results;
        self.update_counts.2 += 1;
    }
}
