use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use common::PaymentId;

/// The fixed fields of a payment record, used for the initial insert.
///
/// Everything else about a payment lives in its metadata bag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPaymentRecord {
    /// Human-readable record title (customer name or email).
    pub title: String,

    /// Wire form of the payment status.
    pub status: String,

    /// When the payment was created.
    pub created_at: DateTime<Utc>,

    /// Parent payment, for renewals and follow-ups.
    pub parent: Option<PaymentId>,
}

/// A payment record as read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRow {
    /// Store-assigned identifier.
    pub id: PaymentId,

    /// Human-readable record title.
    pub title: String,

    /// Wire form of the payment status.
    pub status: String,

    /// When the payment was created.
    pub created_at: DateTime<Utc>,

    /// When the record was last written.
    pub modified_at: DateTime<Utc>,

    /// Parent payment, if any.
    pub parent: Option<PaymentId>,
}

/// A single record-field update, applied outside the metadata bag.
#[derive(Debug, Clone)]
pub enum RecordField {
    /// Replace the stored status string.
    Status(String),

    /// Replace the creation date.
    CreatedAt(DateTime<Utc>),

    /// Replace the parent payment reference.
    Parent(Option<PaymentId>),
}
