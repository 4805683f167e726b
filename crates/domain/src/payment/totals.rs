//! Amount ledger maintenance.
//!
//! The invariant `total = subtotal + tax + fees_total` is re-derived
//! after every component move. Decreases clamp at zero rather than
//! going negative.

use common::Money;

use super::Payment;

impl Payment {
    pub(crate) fn increase_subtotal(&mut self, amount: Money) {
        self.subtotal += amount;
        self.recalculate_total();
    }

    pub(crate) fn decrease_subtotal(&mut self, amount: Money) {
        self.subtotal = self.subtotal.saturating_sub(amount);
        self.recalculate_total();
    }

    /// Raises the tax component, typically alongside a cart addition.
    pub fn increase_tax(&mut self, amount: Money) {
        self.tax += amount;
        self.recalculate_total();
    }

    /// Lowers the tax component, clamping at zero.
    pub fn decrease_tax(&mut self, amount: Money) {
        self.tax = self.tax.saturating_sub(amount);
        self.recalculate_total();
    }

    pub(crate) fn increase_fees(&mut self, amount: Money) {
        self.fees_total += amount;
        self.recalculate_total();
    }

    pub(crate) fn decrease_fees(&mut self, amount: Money) {
        self.fees_total = self.fees_total.saturating_sub(amount);
        self.recalculate_total();
    }

    pub(crate) fn recalculate_total(&mut self) {
        self.total = self.subtotal + self.tax + self.fees_total;
    }
}
