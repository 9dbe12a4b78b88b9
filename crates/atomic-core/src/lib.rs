// SPDX-FileCopyrightText: 2026 Atomic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Atomic long-term memory layer.
//!
//! This crate provides the error taxonomy, the traits at the seams of the
//! memory layer (embedding providers and conversation-state views), and the
//! result types shared by retrieval and the state loader.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::LtmError;
pub use traits::{ConversationState, ConversationStateActions, EmbeddingProvider};
pub use types::{FragmentKind, IntentAndEntities, LtmQueryResult, LtmTable};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map, Value};

    fn result_with(metadata: Value) -> LtmQueryResult {
        LtmQueryResult {
            id: "kb-1".into(),
            text: "Prefers morning meetings".into(),
            score: 0.8,
            distance: 0.25,
            timestamp: Some("2026-03-01T09:00:00Z".into()),
            metadata: metadata.as_object().cloned(),
            table: "knowledge_base".into(),
        }
    }

    #[test]
    fn ltm_error_fatality() {
        let connection = LtmError::Connection {
            path: "/nope".into(),
            source: Box::new(std::io::Error::other("denied")),
        };
        assert!(connection.is_fatal());
        assert!(LtmError::schema("events", "vector length 3, expected 2").is_fatal());
        assert!(!LtmError::EmbeddingFailure("null".into()).is_fatal());
        assert!(!LtmError::Storage {
            source: Box::new(std::io::Error::other("disk"))
        }
        .is_fatal());
    }

    #[test]
    fn schema_error_message_names_table() {
        let err = LtmError::schema("events", "unknown column `colour`");
        assert_eq!(
            err.to_string(),
            "schema error on table `events`: unknown column `colour`"
        );
    }

    #[test]
    fn ltm_table_round_trips_through_strings() {
        use std::str::FromStr;

        for table in [
            LtmTable::KnowledgeBase,
            LtmTable::ResearchFindings,
            LtmTable::Events,
            LtmTable::TrainingEvents,
        ] {
            let s = table.to_string();
            assert_eq!(LtmTable::from_str(&s).unwrap(), table);
        }
        assert_eq!(LtmTable::default(), LtmTable::KnowledgeBase);
        assert_eq!(LtmTable::ResearchFindings.to_string(), "research_findings");
    }

    #[test]
    fn kind_is_read_from_metadata() {
        let result = result_with(json!({ "kind": "user_goal" }));
        assert_eq!(result.kind(), Some(FragmentKind::UserGoal));

        let unknown = result_with(json!({ "kind": "something_else" }));
        assert_eq!(unknown.kind(), None);
    }

    #[test]
    fn intent_and_entities_from_metadata() {
        let result = result_with(json!({
            "intent": "schedule_meeting",
            "entities": { "attendee": "Dana" }
        }));
        let parsed = result.intent_and_entities().unwrap();
        assert_eq!(parsed.intent, "schedule_meeting");
        assert_eq!(parsed.entities.get("attendee"), Some(&json!("Dana")));

        let blank = result_with(json!({ "intent": "" }));
        assert!(blank.intent_and_entities().is_none());

        let none = LtmQueryResult {
            metadata: None,
            ..result_with(Value::Object(Map::new()))
        };
        assert!(none.intent_and_entities().is_none());
    }
}
