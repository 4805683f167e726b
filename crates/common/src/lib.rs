//! Shared types for the payment core.
//!
//! Newtype identifiers keep payment, customer, product and price-option
//! ids from being mixed up, and [`Money`] keeps every monetary amount in
//! integer minor units.

pub mod ids;
pub mod money;

pub use ids::{CustomerId, PaymentId, PriceOptionId, ProductId};
pub use money::Money;
