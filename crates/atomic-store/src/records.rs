// SPDX-FileCopyrightText: 2026 Atomic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed rows for the four LTM tables.
//!
//! Each record converts to and from an untyped [`VectorRow`] through serde,
//! so the payload column names are exactly the serialized field names.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use atomic_core::{FragmentKind, LtmError, LtmTable};

use crate::row::VectorRow;
use crate::schema::{ID_COLUMN, VECTOR_COLUMN};

/// Which payload columns play which role in retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnProfile {
    /// Free-text column searched by keywords and returned as the snippet.
    pub text: &'static str,
    /// ISO-8601 column used for date ranges and recency.
    pub timestamp: &'static str,
    /// Owning-user column.
    pub user: &'static str,
}

/// A typed row of one LTM table.
pub trait TableRecord: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Default physical table name.
    const DEFAULT_TABLE: &'static str;

    /// Column roles for retrieval over this table.
    const PROFILE: ColumnProfile;

    /// A fully populated row with a zero vector, used for schema inference.
    fn representative(dimensions: usize) -> Self;

    fn id(&self) -> &str;

    /// Representative rows in untyped form.
    fn representative_rows(dimensions: usize) -> Result<Vec<VectorRow>, LtmError> {
        Ok(vec![Self::representative(dimensions).to_row()?])
    }

    /// Split the serialized record into id, vector, and payload.
    fn to_row(&self) -> Result<VectorRow, LtmError> {
        let value = serde_json::to_value(self).map_err(|e| encode_err::<Self>(e))?;
        let Value::Object(mut fields) = value else {
            return Err(LtmError::schema(
                Self::DEFAULT_TABLE,
                "record did not serialize to an object",
            ));
        };
        let id = match fields.remove(ID_COLUMN) {
            Some(Value::String(id)) => id,
            _ => {
                return Err(LtmError::schema(
                    Self::DEFAULT_TABLE,
                    "record is missing a string `id`",
                ));
            }
        };
        let vector: Vec<f32> = fields
            .remove(VECTOR_COLUMN)
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| encode_err::<Self>(e))?
            .unwrap_or_default();
        Ok(VectorRow { id, vector, fields })
    }

    /// Rebuild a typed record from a stored row.
    fn from_row(row: VectorRow) -> Result<Self, LtmError> {
        let mut fields = row.fields;
        fields.insert(ID_COLUMN.to_string(), Value::String(row.id));
        fields.insert(
            VECTOR_COLUMN.to_string(),
            serde_json::to_value(row.vector).map_err(|e| encode_err::<Self>(e))?,
        );
        serde_json::from_value(Value::Object(fields)).map_err(|e| {
            LtmError::schema(
                Self::DEFAULT_TABLE,
                format!("stored row does not match record shape: {e}"),
            )
        })
    }
}

fn encode_err<R: TableRecord>(e: serde_json::Error) -> LtmError {
    LtmError::schema(R::DEFAULT_TABLE, format!("cannot encode record: {e}"))
}

/// A calendar event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    pub vector: Vec<f32>,
    pub start_date: String,
    pub end_date: String,
    pub raw_event_text: String,
    #[serde(rename = "calendarId", default)]
    pub calendar_id: Option<String>,
    #[serde(rename = "lastModified")]
    pub last_modified: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

impl TableRecord for EventRecord {
    const DEFAULT_TABLE: &'static str = "events";
    const PROFILE: ColumnProfile = ColumnProfile {
        text: "raw_event_text",
        timestamp: "lastModified",
        user: "userId",
    };

    fn representative(dimensions: usize) -> Self {
        Self {
            id: String::new(),
            user_id: String::new(),
            vector: vec![0.0; dimensions],
            start_date: String::new(),
            end_date: String::new(),
            raw_event_text: String::new(),
            calendar_id: Some(String::new()),
            last_modified: String::new(),
            title: Some(String::new()),
            location: Some(String::new()),
        }
    }

    fn id(&self) -> &str {
        &self.id
    }
}

/// An event used to learn scheduling preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingEventRecord {
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    pub vector: Vec<f32>,
    pub source_event_text: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

impl TableRecord for TrainingEventRecord {
    const DEFAULT_TABLE: &'static str = "training_events";
    const PROFILE: ColumnProfile = ColumnProfile {
        text: "source_event_text",
        timestamp: "createdAt",
        user: "userId",
    };

    fn representative(dimensions: usize) -> Self {
        Self {
            id: String::new(),
            user_id: String::new(),
            vector: vec![0.0; dimensions],
            source_event_text: String::new(),
            created_at: String::new(),
        }
    }

    fn id(&self) -> &str {
        &self.id
    }
}

/// A consolidated knowledge-base fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    pub vector: Vec<f32>,
    pub text: String,
    pub kind: FragmentKind,
    pub timestamp: String,
    #[serde(default)]
    pub intent: Option<String>,
    #[serde(default)]
    pub entities: Option<Map<String, Value>>,
}

impl TableRecord for KnowledgeEntry {
    const DEFAULT_TABLE: &'static str = "knowledge_base";
    const PROFILE: ColumnProfile = ColumnProfile {
        text: "text",
        timestamp: "timestamp",
        user: "userId",
    };

    fn representative(dimensions: usize) -> Self {
        Self {
            id: String::new(),
            user_id: String::new(),
            vector: vec![0.0; dimensions],
            text: String::new(),
            kind: FragmentKind::KeyFact,
            timestamp: String::new(),
            intent: Some(String::new()),
            entities: Some(Map::new()),
        }
    }

    fn id(&self) -> &str {
        &self.id
    }
}

/// A research finding gathered by the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchFinding {
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    pub vector: Vec<f32>,
    pub topic: String,
    pub summary: String,
    #[serde(default)]
    pub sources: Vec<String>,
    pub timestamp: String,
}

impl TableRecord for ResearchFinding {
    const DEFAULT_TABLE: &'static str = "research_findings";
    const PROFILE: ColumnProfile = ColumnProfile {
        text: "summary",
        timestamp: "timestamp",
        user: "userId",
    };

    fn representative(dimensions: usize) -> Self {
        Self {
            id: String::new(),
            user_id: String::new(),
            vector: vec![0.0; dimensions],
            topic: String::new(),
            summary: String::new(),
            sources: vec![String::new()],
            timestamp: String::new(),
        }
    }

    fn id(&self) -> &str {
        &self.id
    }
}

/// Column roles for a logical table.
pub fn profile_for(table: LtmTable) -> ColumnProfile {
    match table {
        LtmTable::KnowledgeBase => KnowledgeEntry::PROFILE,
        LtmTable::ResearchFindings => ResearchFinding::PROFILE,
        LtmTable::Events => EventRecord::PROFILE,
        LtmTable::TrainingEvents => TrainingEventRecord::PROFILE,
    }
}

/// Representative rows for a logical table.
pub fn representative_for(table: LtmTable, dimensions: usize) -> Result<Vec<VectorRow>, LtmError> {
    match table {
        LtmTable::KnowledgeBase => KnowledgeEntry::representative_rows(dimensions),
        LtmTable::ResearchFindings => ResearchFinding::representative_rows(dimensions),
        LtmTable::Events => EventRecord::representative_rows(dimensions),
        LtmTable::TrainingEvents => TrainingEventRecord::representative_rows(dimensions),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnType, TableSchema};
    use serde_json::json;

    fn standup() -> EventRecord {
        EventRecord {
            id: "e1".into(),
            user_id: "u1".into(),
            vector: vec![0.1, 0.2],
            start_date: "2026-03-02T09:00:00Z".into(),
            end_date: "2026-03-02T09:15:00Z".into(),
            raw_event_text: "Daily standup with the platform team".into(),
            calendar_id: None,
            last_modified: "2026-03-01T12:00:00Z".into(),
            title: Some("Standup".into()),
            location: None,
        }
    }

    #[test]
    fn event_row_uses_wire_column_names() {
        let row = standup().to_row().unwrap();
        assert_eq!(row.id, "e1");
        assert_eq!(row.vector, vec![0.1, 0.2]);
        assert_eq!(row.text("userId"), Some("u1"));
        assert_eq!(row.text("lastModified"), Some("2026-03-01T12:00:00Z"));
        assert_eq!(row.field("calendarId"), Some(&Value::Null));
        assert!(row.field("id").is_none());
        assert!(row.field("vector").is_none());
    }

    #[test]
    fn event_survives_row_conversion() {
        let event = standup();
        let back = EventRecord::from_row(event.to_row().unwrap()).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn from_row_fills_optional_columns() {
        let row = VectorRow::new("t1", vec![1.0])
            .with_field("userId", "u1")
            .with_field("source_event_text", "Gym at 7")
            .with_field("createdAt", "2026-01-01");
        let record = TrainingEventRecord::from_row(row).unwrap();
        assert_eq!(record.source_event_text, "Gym at 7");

        let partial = VectorRow::new("e9", vec![1.0]).with_field("userId", "u1");
        assert!(matches!(
            EventRecord::from_row(partial),
            Err(LtmError::Schema { .. })
        ));
    }

    #[test]
    fn representative_infers_every_column() {
        let rows = EventRecord::representative_rows(4).unwrap();
        let schema = TableSchema::infer("events", &rows).unwrap();
        assert_eq!(schema.dimension, 4);
        for column in [
            "userId",
            "start_date",
            "end_date",
            "raw_event_text",
            "calendarId",
            "lastModified",
            "title",
            "location",
        ] {
            assert_eq!(schema.columns.get(column), Some(&ColumnType::Text), "{column}");
        }

        let kb = TableSchema::infer("kb", &KnowledgeEntry::representative_rows(4).unwrap()).unwrap();
        assert_eq!(kb.columns["kind"], ColumnType::Text);
        assert_eq!(kb.columns["entities"], ColumnType::Json);

        let research =
            TableSchema::infer("rf", &ResearchFinding::representative_rows(4).unwrap()).unwrap();
        assert_eq!(research.columns["sources"], ColumnType::Json);
    }

    #[test]
    fn knowledge_entry_serializes_kind_in_snake_case() {
        let entry = KnowledgeEntry {
            id: "u1:user_goal:abc".into(),
            user_id: "u1".into(),
            vector: vec![0.0],
            text: "Plan the offsite".into(),
            kind: FragmentKind::UserGoal,
            timestamp: "2026-03-01T00:00:00Z".into(),
            intent: None,
            entities: Some(json!({ "city": "Oslo" }).as_object().cloned().unwrap()),
        };
        let row = entry.to_row().unwrap();
        assert_eq!(row.text("kind"), Some("user_goal"));
        assert_eq!(KnowledgeEntry::from_row(row).unwrap(), entry);
    }

    #[test]
    fn profiles_match_tables() {
        assert_eq!(profile_for(LtmTable::Events).text, "raw_event_text");
        assert_eq!(profile_for(LtmTable::TrainingEvents).timestamp, "createdAt");
        assert_eq!(profile_for(LtmTable::ResearchFindings).text, "summary");
        assert_eq!(profile_for(LtmTable::KnowledgeBase).user, "userId");
        assert_eq!(representative_for(LtmTable::KnowledgeBase, 3).unwrap()[0].vector.len(), 3);
    }
}
