// SPDX-FileCopyrightText: 2026 Atomic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the vector store and its domain wrappers.

use std::sync::Arc;

use atomic_core::LtmError;
use atomic_store::{EventRecord, Filter, RecordTable, TableRecord, VectorRow, VectorStore};
use proptest::prelude::*;

fn standup(title: &str) -> EventRecord {
    EventRecord {
        id: "e1".into(),
        user_id: "u1".into(),
        vector: vec![0.1, 0.2],
        start_date: "2024-01-01".into(),
        end_date: "2024-01-02".into(),
        raw_event_text: String::new(),
        calendar_id: None,
        last_modified: "2024-01-01".into(),
        title: Some(title.into()),
        location: None,
    }
}

async fn events_table() -> RecordTable<EventRecord> {
    let store = Arc::new(VectorStore::open_in_memory().await.unwrap());
    RecordTable::events(store, "events", 2).unwrap()
}

/// Upsert e1, then search by its vector scoped to u1.
#[tokio::test]
async fn search_events_finds_standup_for_user() {
    let events = events_table().await;
    events.upsert(&[standup("Standup")]).await.unwrap();

    let filter = Filter::eq("userId", "u1");
    let hits = events.search(&[0.1, 0.2], 1, Some(&filter)).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].record.id, "e1");
    assert_eq!(hits[0].record.title.as_deref(), Some("Standup"));
    assert_eq!(hits[0].distance, 0.0);

    let other_user = Filter::eq("userId", "u2");
    assert!(events
        .search(&[0.1, 0.2], 1, Some(&other_user))
        .await
        .unwrap()
        .is_empty());
}

/// Untyped rows may omit payload columns.
#[tokio::test]
async fn sparse_event_row_is_searchable() {
    let store = VectorStore::open_in_memory().await.unwrap();
    let representative = EventRecord::representative_rows(2).unwrap();
    let item = VectorRow::new("e1", vec![0.1, 0.2])
        .with_field("userId", "u1")
        .with_field("start_date", "2024-01-01")
        .with_field("end_date", "2024-01-02")
        .with_field("title", "Standup");
    store
        .upsert_items("events", std::slice::from_ref(&item), &representative)
        .await
        .unwrap();

    let filter = Filter::eq("userId", "u1");
    let hits = store
        .search_table_by_vector("events", &[0.1, 0.2], 1, &representative, Some(&filter))
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].row, item);
}

#[tokio::test]
async fn delete_events_then_get_returns_none() {
    let events = events_table().await;
    events.upsert(&[standup("Standup")]).await.unwrap();
    events.delete_by_ids(&["e1".to_string()]).await.unwrap();
    assert_eq!(events.get_by_id("e1").await.unwrap(), None);
}

#[tokio::test]
async fn sequential_upserts_last_write_wins() {
    let events = events_table().await;
    events.upsert(&[standup("Standup")]).await.unwrap();
    events.upsert(&[standup("Retro")]).await.unwrap();

    let fetched = events.get_by_id("e1").await.unwrap().unwrap();
    assert_eq!(fetched.title.as_deref(), Some("Retro"));
    assert_eq!(events.store().count_rows("events").await.unwrap(), 1);
}

#[tokio::test]
async fn wrong_dimension_event_is_rejected() {
    let events = events_table().await;
    let mut bad = standup("Standup");
    bad.vector = vec![0.1, 0.2, 0.3];
    let err = events.upsert(&[bad]).await.unwrap_err();
    assert!(matches!(err, LtmError::Schema { .. }));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn user_supplied_quotes_do_not_break_filters() {
    let events = events_table().await;
    let mut tricky = standup("Standup");
    tricky.user_id = "o'brien".into();
    events.upsert(&[tricky]).await.unwrap();

    let filter = Filter::eq("userId", "o'brien");
    let hits = events.search(&[0.1, 0.2], 5, Some(&filter)).await.unwrap();
    assert_eq!(hits.len(), 1);

    let injection = Filter::eq("userId", "x' OR '1'='1");
    let hits = events.search(&[0.1, 0.2], 5, Some(&injection)).await.unwrap();
    assert!(hits.is_empty());
}

fn arb_rows() -> impl Strategy<Value = Vec<(Vec<f32>, String)>> {
    prop::collection::vec(
        (prop::collection::vec(-10.0f32..10.0, 3), "[a-z ]{0,12}"),
        1..12,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Upserted rows come back unchanged, and deleting them (twice) leaves nothing.
    #[test]
    fn upsert_get_delete_properties(rows in arb_rows()) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            let store = VectorStore::open_in_memory().await.unwrap();
            let representative = vec![VectorRow::new("rep", vec![0.0; 3]).with_field("text", "")];
            let items: Vec<VectorRow> = rows
                .iter()
                .enumerate()
                .map(|(i, (vector, text))| {
                    VectorRow::new(format!("row-{i}"), vector.clone()).with_field("text", text.as_str())
                })
                .collect();
            store.upsert_items("props", &items, &representative).await.unwrap();

            for item in &items {
                let fetched = store.get_item_by_id("props", &item.id, &representative).await.unwrap();
                assert_eq!(fetched.as_ref(), Some(item));
            }

            let ids: Vec<String> = items.iter().map(|i| i.id.clone()).collect();
            store.delete_items_by_ids("props", &ids).await.unwrap();
            store.delete_items_by_ids("props", &ids).await.unwrap();
            for id in &ids {
                assert!(store.get_item_by_id("props", id, &representative).await.unwrap().is_none());
            }
        });
    }

    /// Querying with a stored vector returns that row at the minimum distance.
    #[test]
    fn self_match_has_minimum_distance(rows in arb_rows(), pick in any::<prop::sample::Index>()) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            let store = VectorStore::open_in_memory().await.unwrap();
            let representative = vec![VectorRow::new("rep", vec![0.0; 3])];
            let items: Vec<VectorRow> = rows
                .iter()
                .enumerate()
                .map(|(i, (vector, _))| VectorRow::new(format!("row-{i}"), vector.clone()))
                .collect();
            store.upsert_items("props", &items, &representative).await.unwrap();

            let target = &items[pick.index(items.len())];
            let hits = store
                .search_table_by_vector("props", &target.vector, 1, &representative, None)
                .await
                .unwrap();
            assert_eq!(hits.len(), 1);
            assert_eq!(hits[0].distance, 0.0);
            assert_eq!(hits[0].row.vector, target.vector);

            let all = store
                .search_table_by_vector("props", &target.vector, items.len(), &representative, None)
                .await
                .unwrap();
            assert!(all.iter().any(|h| h.row.id == target.id && h.distance == 0.0));
            assert!(all.windows(2).all(|w| w[0].distance <= w[1].distance));
        });
    }
}
