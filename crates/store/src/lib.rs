//! Persistence adapter for payment records.
//!
//! A payment is stored as a small fixed record (status, dates, parent)
//! plus a bag of named metadata values. The [`PaymentStore`] trait is the
//! only surface the domain layer talks to; implementations exist for
//! in-memory testing and PostgreSQL.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod record;
pub mod store;

pub use common::PaymentId;
pub use error::{Result, StoreError};
pub use memory::InMemoryPaymentStore;
pub use postgres::PostgresPaymentStore;
pub use record::{NewPaymentRecord, PaymentRow, RecordField};
pub use store::PaymentStore;
