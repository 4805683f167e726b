//! Payment aggregate and related types.

mod aggregate;
mod cart;
mod fees;
mod hooks;
mod journal;
mod meta;
mod service;
mod status;
mod totals;
mod value_objects;

pub use aggregate::{HydrationData, Payment};
pub use cart::{AddLineArgs, CartLine, DownloadRef, RemoveLineArgs, ResolvedPrice};
pub use fees::{FeeEntry, FeeSelector};
pub use hooks::PaymentHooks;
pub use journal::{CartChange, ChangeAction, FeeChange, PaymentField, PendingChanges};
pub use meta::{PaymentSnapshot, UserInfo, keys, merge_snapshot};
pub use service::PaymentService;
pub use status::PaymentStatus;
pub use value_objects::{Address, DiscountCodes, PaymentMode};

use common::ProductId;
use thiserror::Error;

/// Validation failures raised by payment operations.
///
/// These never mutate the aggregate: when one is returned, the in-memory
/// state is exactly as it was before the call.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The referenced product does not resolve to a purchasable price.
    #[error("Product {0} cannot be purchased")]
    ProductNotFound(ProductId),

    /// No cart line matched the removal criteria.
    #[error("No cart line matches product {0}")]
    LineNotFound(ProductId),

    /// The cart index is out of range or names a different product.
    #[error("Invalid cart index {index}")]
    InvalidCartIndex { index: usize },
}
