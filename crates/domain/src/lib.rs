//! Domain layer for the payment core.
//!
//! This crate provides the mutable payment aggregate and everything it
//! owns in memory:
//! - the amount, fee and cart ledgers with their recalculation rules
//! - the mutation journal driving the batched save protocol
//! - the payment status state machine with guarded statistic
//!   reconciliation
//! - the collaborator traits (catalog, customers, sales, discounts,
//!   store statistics) with in-memory implementations for testing
//! - the `PaymentService` that orchestrates hydration and the
//!   save/flush cycle against a `PaymentStore`

pub mod collaborators;
pub mod error;
pub mod payment;
pub mod settings;

pub use collaborators::{
    Catalog, CollaboratorError, Collaborators, CustomerDirectory, DiscountRegistry,
    InMemoryCatalog, InMemoryCustomerDirectory, InMemoryDiscountRegistry, InMemorySalesLedger,
    InMemoryStoreStats, SalesLedger, StoreStats,
};
pub use common::{CustomerId, Money, PaymentId, PriceOptionId, ProductId};
pub use error::DomainError;
pub use payment::{
    AddLineArgs, Address, CartChange, CartLine, ChangeAction, DiscountCodes, DownloadRef,
    FeeEntry, FeeSelector, Payment, PaymentError, PaymentField, PaymentHooks, PaymentMode,
    PaymentService, PaymentStatus, PendingChanges, RemoveLineArgs, ResolvedPrice,
};
pub use settings::StoreSettings;
