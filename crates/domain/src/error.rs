//! Domain error types.

use store::StoreError;
use thiserror::Error;

use crate::collaborators::CollaboratorError;
use crate::payment::PaymentError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the payment store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A validation failure in the payment aggregate.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// A collaborator call failed.
    #[error("Collaborator error: {0}")]
    Collaborator(#[from] CollaboratorError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
