use thiserror::Error;

use common::PaymentId;

/// Errors that can occur when interacting with the payment store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The payment record was not found in the store.
    #[error("Payment not found: {0}")]
    PaymentNotFound(PaymentId),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backing store rejected the write.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
