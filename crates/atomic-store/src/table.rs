// SPDX-FileCopyrightText: 2026 Atomic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed wrappers that pin a vector table to one record shape.

use std::marker::PhantomData;
use std::sync::Arc;

use atomic_core::LtmError;

use crate::connection::VectorStore;
use crate::filter::Filter;
use crate::records::{EventRecord, TableRecord, TrainingEventRecord};
use crate::row::VectorRow;

/// A typed search result.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord<R> {
    pub record: R,
    pub distance: f32,
}

/// A vector table whose rows are `R`.
///
/// Fixes the physical table name and supplies the representative row used
/// to create the table on first use.
pub struct RecordTable<R: TableRecord> {
    store: Arc<VectorStore>,
    name: String,
    representative: Vec<VectorRow>,
    _record: PhantomData<fn() -> R>,
}

impl<R: TableRecord> RecordTable<R> {
    /// Wrap table `name`, creating it on first use with `dimensions`-long vectors.
    pub fn new(
        store: Arc<VectorStore>,
        name: impl Into<String>,
        dimensions: usize,
    ) -> Result<Self, LtmError> {
        Ok(Self {
            store,
            name: name.into(),
            representative: R::representative_rows(dimensions)?,
            _record: PhantomData,
        })
    }

    /// Wrap the record's default table name.
    pub fn with_default_name(store: Arc<VectorStore>, dimensions: usize) -> Result<Self, LtmError> {
        Self::new(store, R::DEFAULT_TABLE, dimensions)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn store(&self) -> &Arc<VectorStore> {
        &self.store
    }

    /// Delete-then-insert each record by id. Not atomic across records.
    pub async fn upsert(&self, records: &[R]) -> Result<(), LtmError> {
        let rows = records
            .iter()
            .map(TableRecord::to_row)
            .collect::<Result<Vec<_>, _>>()?;
        self.store
            .upsert_items(&self.name, &rows, &self.representative)
            .await
    }

    /// Remove records by id. Unknown ids are ignored.
    pub async fn delete_by_ids(&self, ids: &[String]) -> Result<(), LtmError> {
        self.store.delete_items_by_ids(&self.name, ids).await
    }

    /// Nearest records to `vector`, closest first.
    pub async fn search(
        &self,
        vector: &[f32],
        limit: usize,
        filter: Option<&Filter>,
    ) -> Result<Vec<ScoredRecord<R>>, LtmError> {
        let hits = self
            .store
            .search_table_by_vector(&self.name, vector, limit, &self.representative, filter)
            .await?;
        hits.into_iter()
            .map(|hit| {
                Ok(ScoredRecord {
                    record: R::from_row(hit.row)?,
                    distance: hit.distance,
                })
            })
            .collect()
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<R>, LtmError> {
        self.store
            .get_item_by_id(&self.name, id, &self.representative)
            .await?
            .map(R::from_row)
            .transpose()
    }
}

impl RecordTable<EventRecord> {
    /// The calendar events table.
    pub fn events(
        store: Arc<VectorStore>,
        name: impl Into<String>,
        dimensions: usize,
    ) -> Result<Self, LtmError> {
        Self::new(store, name, dimensions)
    }
}

impl RecordTable<TrainingEventRecord> {
    /// The training events table.
    pub fn training_events(
        store: Arc<VectorStore>,
        name: impl Into<String>,
        dimensions: usize,
    ) -> Result<Self, LtmError> {
        Self::new(store, name, dimensions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn training(id: &str, vector: Vec<f32>, text: &str) -> TrainingEventRecord {
        TrainingEventRecord {
            id: id.into(),
            user_id: "u1".into(),
            vector,
            source_event_text: text.into(),
            created_at: "2026-02-01T08:00:00Z".into(),
        }
    }

    #[tokio::test]
    async fn training_events_round_trip_and_search() {
        let store = Arc::new(VectorStore::open_in_memory().await.unwrap());
        let table = RecordTable::training_events(store, "training_events", 2).unwrap();
        assert_eq!(table.name(), "training_events");

        let gym = training("t1", vec![1.0, 0.0], "Gym before work");
        let dentist = training("t2", vec![0.0, 1.0], "Dentist appointment");
        table.upsert(&[gym.clone(), dentist.clone()]).await.unwrap();

        assert_eq!(table.get_by_id("t1").await.unwrap(), Some(gym.clone()));

        let hits = table.search(&[0.9, 0.1], 1, None).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].record, gym);

        table.delete_by_ids(&["t1".to_string()]).await.unwrap();
        assert_eq!(table.get_by_id("t1").await.unwrap(), None);
        assert_eq!(table.get_by_id("t2").await.unwrap(), Some(dentist));
    }

    #[tokio::test]
    async fn tables_share_one_store() {
        let store = Arc::new(VectorStore::open_in_memory().await.unwrap());
        let events = RecordTable::events(store.clone(), "events", 2).unwrap();
        let trainings = RecordTable::training_events(store.clone(), "training_events", 2).unwrap();

        trainings
            .upsert(&[training("t1", vec![1.0, 0.0], "Gym")])
            .await
            .unwrap();
        assert!(events.get_by_id("t1").await.unwrap().is_none());
        assert_eq!(
            store.table_names().await.unwrap(),
            vec!["events", "training_events"]
        );
    }
}
