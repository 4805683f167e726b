//! Pending-change journal.
//!
//! Mutations on a [`Payment`](super::Payment) do not hit the store
//! directly. Scalar setters mark a field dirty, cart and fee mutations
//! append actions, and a later save drains the journal in one batch.

use std::collections::BTreeSet;

use common::{Money, PriceOptionId, ProductId};

/// Scalar fields a payment can dirty between saves.
///
/// The journal only records WHICH field changed. The value written at
/// save time is whatever the aggregate holds then, so repeated writes
/// to the same field collapse into the last one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PaymentField {
    Status,
    Gateway,
    Mode,
    TransactionId,
    Ip,
    CustomerId,
    UserId,
    FirstName,
    LastName,
    Discounts,
    Address,
    Email,
    Key,
    CreatedAt,
    CompletedDate,
    UnlimitedDownloads,
    ParentPayment,
    Currency,
}

/// Direction of a cart or fee action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeAction {
    Add,
    Remove,
}

/// A recorded cart mutation, replayed against sales stats at save time.
#[derive(Debug, Clone, PartialEq)]
pub struct CartChange {
    pub action: ChangeAction,
    pub product_id: ProductId,
    pub quantity: u32,
    pub amount: Money,
    pub tax: Money,
    pub price_id: Option<PriceOptionId>,
}

/// A recorded fee mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct FeeChange {
    pub action: ChangeAction,
    pub label: String,
    pub amount: Money,
}

/// The journal itself. Field marks deduplicate; cart and fee actions
/// accumulate in order.
#[derive(Debug, Clone, Default)]
pub struct PendingChanges {
    fields: BTreeSet<PaymentField>,
    cart: Vec<CartChange>,
    fees: Vec<FeeChange>,
}

impl PendingChanges {
    /// Marks a scalar field dirty.
    pub fn mark(&mut self, field: PaymentField) {
        self.fields.insert(field);
    }

    /// Returns true when the field is dirty.
    pub fn contains(&self, field: PaymentField) -> bool {
        self.fields.contains(&field)
    }

    /// Appends a cart action.
    pub fn push_cart(&mut self, change: CartChange) {
        self.cart.push(change);
    }

    /// Appends a fee action.
    pub fn push_fee(&mut self, change: FeeChange) {
        self.fees.push(change);
    }

    /// Dirty scalar fields in stable order.
    pub fn fields(&self) -> impl Iterator<Item = PaymentField> + '_ {
        self.fields.iter().copied()
    }

    /// Recorded cart actions in insertion order.
    pub fn cart_changes(&self) -> &[CartChange] {
        &self.cart
    }

    /// Recorded fee actions in insertion order.
    pub fn fee_changes(&self) -> &[FeeChange] {
        &self.fees
    }

    /// True when nothing is waiting to be saved.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.cart.is_empty() && self.fees.is_empty()
    }

    /// Drops every recorded change. Called after a successful save.
    pub fn clear(&mut self) {
        self.fields.clear();
        self.cart.clear();
        self.fees.clear();
    }
}
