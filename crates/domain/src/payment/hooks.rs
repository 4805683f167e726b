//! Typed extension points around hydration and save.

use common::PaymentId;

use super::Payment;

/// Observers the service calls at fixed points. Implement whatever
/// subset matters; defaults do nothing.
///
/// `before_save` may still mutate the payment, so contributed fees or
/// late field tweaks land in the same save batch.
pub trait PaymentHooks: Send + Sync {
    fn before_hydrate(&self, _id: PaymentId) {}

    fn after_hydrate(&self, _payment: &mut Payment) {}

    fn before_save(&self, _payment: &mut Payment) {}
}
