use async_trait::async_trait;
use serde_json::Value;

use common::PaymentId;

use crate::{NewPaymentRecord, PaymentRow, RecordField, Result};

/// Core trait for payment store implementations.
///
/// The store persists one fixed record per payment plus a keyed metadata
/// bag of JSON values. All implementations must be thread-safe
/// (Send + Sync). Serializing concurrent writers on the same payment id
/// is the store's responsibility, not the caller's.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Inserts a new payment record and returns its assigned id.
    async fn insert(&self, record: NewPaymentRecord) -> Result<PaymentId>;

    /// Loads a payment record by id.
    ///
    /// Returns None if no record exists.
    async fn load(&self, id: PaymentId) -> Result<Option<PaymentRow>>;

    /// Applies a single record-field update.
    ///
    /// Fails with `PaymentNotFound` if the record does not exist.
    async fn update_field(&self, id: PaymentId, field: RecordField) -> Result<()>;

    /// Reads one metadata value.
    ///
    /// Returns None when the key has never been written.
    async fn read_meta(&self, id: PaymentId, key: &str) -> Result<Option<Value>>;

    /// Writes one metadata value, replacing any previous value.
    async fn write_meta(&self, id: PaymentId, key: &str, value: Value) -> Result<()>;
}
