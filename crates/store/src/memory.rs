use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;

use common::PaymentId;

use crate::{NewPaymentRecord, PaymentRow, PaymentStore, RecordField, Result, StoreError};

#[derive(Default)]
struct State {
    rows: HashMap<PaymentId, PaymentRow>,
    meta: HashMap<PaymentId, HashMap<String, Value>>,
    next_id: u64,
    write_count: u64,
    fail_writes: bool,
}

/// In-memory payment store implementation for testing.
///
/// Provides the same interface as the PostgreSQL implementation, plus
/// inspection helpers (write counting, forced write failures) used by the
/// domain tests.
#[derive(Clone, Default)]
pub struct InMemoryPaymentStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryPaymentStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of payment records stored.
    pub async fn payment_count(&self) -> usize {
        self.state.read().await.rows.len()
    }

    /// Returns the total number of writes (inserts, field updates and
    /// metadata writes) the store has accepted.
    pub async fn write_count(&self) -> u64 {
        self.state.read().await.write_count
    }

    /// Configures the store to reject every subsequent write.
    pub async fn set_fail_writes(&self, fail: bool) {
        self.state.write().await.fail_writes = fail;
    }

    /// Clears all records and metadata.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.rows.clear();
        state.meta.clear();
    }
}

impl State {
    fn check_writable(&self) -> Result<()> {
        if self.fail_writes {
            Err(StoreError::Unavailable("writes disabled".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn insert(&self, record: NewPaymentRecord) -> Result<PaymentId> {
        let mut state = self.state.write().await;
        state.check_writable()?;

        state.next_id += 1;
        let id = PaymentId::new(state.next_id);
        let now = Utc::now();
        state.rows.insert(
            id,
            PaymentRow {
                id,
                title: record.title,
                status: record.status,
                created_at: record.created_at,
                modified_at: now,
                parent: record.parent,
            },
        );
        state.write_count += 1;
        Ok(id)
    }

    async fn load(&self, id: PaymentId) -> Result<Option<PaymentRow>> {
        Ok(self.state.read().await.rows.get(&id).cloned())
    }

    async fn update_field(&self, id: PaymentId, field: RecordField) -> Result<()> {
        let mut state = self.state.write().await;
        state.check_writable()?;

        let row = state
            .rows
            .get_mut(&id)
            .ok_or(StoreError::PaymentNotFound(id))?;

        match field {
            RecordField::Status(status) => row.status = status,
            RecordField::CreatedAt(created_at) => row.created_at = created_at,
            RecordField::Parent(parent) => row.parent = parent,
        }
        row.modified_at = Utc::now();
        state.write_count += 1;
        Ok(())
    }

    async fn read_meta(&self, id: PaymentId, key: &str) -> Result<Option<Value>> {
        Ok(self
            .state
            .read()
            .await
            .meta
            .get(&id)
            .and_then(|bag| bag.get(key))
            .cloned())
    }

    async fn write_meta(&self, id: PaymentId, key: &str, value: Value) -> Result<()> {
        let mut state = self.state.write().await;
        state.check_writable()?;

        if !state.rows.contains_key(&id) {
            return Err(StoreError::PaymentNotFound(id));
        }
        state
            .meta
            .entry(id)
            .or_default()
            .insert(key.to_string(), value);
        state.write_count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> NewPaymentRecord {
        NewPaymentRecord {
            title: "jane@example.com".to_string(),
            status: "pending".to_string(),
            created_at: Utc::now(),
            parent: None,
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let store = InMemoryPaymentStore::new();
        let a = store.insert(record()).await.unwrap();
        let b = store.insert(record()).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(store.payment_count().await, 2);
    }

    #[tokio::test]
    async fn test_load_returns_none_for_missing_record() {
        let store = InMemoryPaymentStore::new();
        assert!(store.load(PaymentId::new(99)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_field_replaces_status() {
        let store = InMemoryPaymentStore::new();
        let id = store.insert(record()).await.unwrap();
        store
            .update_field(id, RecordField::Status("published".to_string()))
            .await
            .unwrap();
        let row = store.load(id).await.unwrap().unwrap();
        assert_eq!(row.status, "published");
    }

    #[tokio::test]
    async fn test_update_field_on_missing_record_fails() {
        let store = InMemoryPaymentStore::new();
        let result = store
            .update_field(PaymentId::new(1), RecordField::Status("failed".to_string()))
            .await;
        assert!(matches!(result, Err(StoreError::PaymentNotFound(_))));
    }

    #[tokio::test]
    async fn test_meta_roundtrip() {
        let store = InMemoryPaymentStore::new();
        let id = store.insert(record()).await.unwrap();

        assert!(store.read_meta(id, "gateway").await.unwrap().is_none());
        store
            .write_meta(id, "gateway", json!("manual"))
            .await
            .unwrap();
        assert_eq!(
            store.read_meta(id, "gateway").await.unwrap(),
            Some(json!("manual"))
        );
    }

    #[tokio::test]
    async fn test_fail_writes_rejects_all_mutations() {
        let store = InMemoryPaymentStore::new();
        let id = store.insert(record()).await.unwrap();
        store.set_fail_writes(true).await;

        assert!(store.insert(record()).await.is_err());
        assert!(
            store
                .update_field(id, RecordField::Parent(None))
                .await
                .is_err()
        );
        assert!(store.write_meta(id, "total", json!(0)).await.is_err());

        store.set_fail_writes(false).await;
        assert!(store.write_meta(id, "total", json!(0)).await.is_ok());
    }

    #[tokio::test]
    async fn test_write_count_tracks_accepted_writes() {
        let store = InMemoryPaymentStore::new();
        let id = store.insert(record()).await.unwrap();
        assert_eq!(store.write_count().await, 1);
        store.write_meta(id, "tax", json!(100)).await.unwrap();
        assert_eq!(store.write_count().await, 2);
    }
}
