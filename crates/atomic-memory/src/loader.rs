// SPDX-FileCopyrightText: 2026 Atomic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Writes retrieval results back into a caller-owned conversation state.

use tracing::debug;

use atomic_core::{ConversationStateActions, FragmentKind, LtmQueryResult};

/// Push retrieved memories into short-term state.
///
/// The highest-ranked `user_goal` result restores the user goal, the
/// highest-ranked result carrying an intent restores intent and entities,
/// and the full result list always becomes the LTM context. Callbacks for
/// which no result qualifies are not invoked.
pub fn load_ltm_to_stm(results: Vec<LtmQueryResult>, actions: &mut dyn ConversationStateActions) {
    let goal = results
        .iter()
        .find(|r| r.kind() == Some(FragmentKind::UserGoal))
        .map(|r| r.text.clone());
    let intent = results.iter().find_map(LtmQueryResult::intent_and_entities);

    debug!(
        results = results.len(),
        restored_goal = goal.is_some(),
        restored_intent = intent.is_some(),
        "loading long-term memory into conversation state"
    );

    if goal.is_some() {
        actions.update_user_goal(goal);
    }
    if intent.is_some() {
        actions.update_intent_and_entities(intent);
    }
    actions.update_ltm_repo_context(results);
}
