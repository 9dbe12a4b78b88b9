// SPDX-FileCopyrightText: 2026 Atomic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Views onto the caller-owned short-term conversation state.
//!
//! The memory layer never constructs or owns conversation state. It reads
//! through [`ConversationState`] during consolidation and writes through
//! [`ConversationStateActions`] when loading long-term context.

use crate::types::{IntentAndEntities, LtmQueryResult};

/// Read access to the short-term memory consulted by consolidation.
pub trait ConversationState: Send + Sync {
    /// Summarized goal of the user in this conversation.
    fn user_goal(&self) -> Option<String>;

    /// Most recently recognized intent and its entities.
    fn intent_and_entities(&self) -> Option<IntentAndEntities>;

    /// Standalone facts worth remembering.
    fn key_facts(&self) -> Vec<String>;

    /// Rolling summary of the conversation so far.
    fn summary(&self) -> Option<String> {
        None
    }
}

/// Mutators injected by the caller so long-term context can be written back.
pub trait ConversationStateActions {
    fn update_user_goal(&mut self, goal: Option<String>);

    fn update_intent_and_entities(&mut self, intent: Option<IntentAndEntities>);

    fn update_ltm_repo_context(&mut self, results: Vec<LtmQueryResult>);
}
