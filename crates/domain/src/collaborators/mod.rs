//! Collaborator traits the payment service orchestrates against, with
//! in-memory implementations for testing.

mod catalog;
mod customers;
mod discounts;
mod sales;
mod stats;

use std::sync::Arc;

pub use catalog::{Catalog, InMemoryCatalog};
pub use customers::{CustomerDirectory, InMemoryCustomerDirectory};
pub use discounts::{DiscountRegistry, InMemoryDiscountRegistry};
pub use sales::{InMemorySalesLedger, SaleLog, SalesLedger};
pub use stats::{InMemoryStoreStats, StoreStats};

use thiserror::Error;

/// Failures surfaced by collaborators. Each wraps the collaborator's
/// own message.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Customer directory error: {0}")]
    Customers(String),

    #[error("Sales ledger error: {0}")]
    Sales(String),

    #[error("Discount registry error: {0}")]
    Discounts(String),

    #[error("Store stats error: {0}")]
    Stats(String),
}

/// The full collaborator set a [`PaymentService`](crate::payment::PaymentService)
/// needs.
#[derive(Clone)]
pub struct Collaborators {
    pub catalog: Arc<dyn Catalog>,
    pub customers: Arc<dyn CustomerDirectory>,
    pub sales: Arc<dyn SalesLedger>,
    pub discounts: Arc<dyn DiscountRegistry>,
    pub stats: Arc<dyn StoreStats>,
}

impl Collaborators {
    /// Wires up a fully in-memory set, the default for tests.
    pub fn in_memory() -> (
        Self,
        InMemoryCatalog,
        InMemoryCustomerDirectory,
        InMemorySalesLedger,
        InMemoryDiscountRegistry,
        InMemoryStoreStats,
    ) {
        let catalog = InMemoryCatalog::new();
        let customers = InMemoryCustomerDirectory::new();
        let sales = InMemorySalesLedger::new();
        let discounts = InMemoryDiscountRegistry::new();
        let stats = InMemoryStoreStats::new();
        let collaborators = Self {
            catalog: Arc::new(catalog.clone()),
            customers: Arc::new(customers.clone()),
            sales: Arc::new(sales.clone()),
            discounts: Arc::new(discounts.clone()),
            stats: Arc::new(stats.clone()),
        };
        (collaborators, catalog, customers, sales, discounts, stats)
    }
}
