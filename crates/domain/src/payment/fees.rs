//! Fee ledger.

use common::{Money, ProductId};
use serde::{Deserialize, Serialize};

use super::journal::{ChangeAction, FeeChange};
use super::Payment;

/// A flat charge or credit attached to the payment beside the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeEntry {
    pub label: String,
    pub amount: Money,
    /// Free-form category, e.g. `"fee"` or `"shipping"`.
    #[serde(rename = "type")]
    pub fee_type: String,
    /// Caller-supplied handle for later lookup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    /// When set the fee is excluded from tax treatment downstream.
    #[serde(default)]
    pub no_tax: bool,
    /// Product the fee belongs to, when it is item-scoped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
}

/// Which attribute a fee removal matches on. Anything else a caller
/// might dream up is not a valid removal key.
#[derive(Debug, Clone, PartialEq)]
pub enum FeeSelector {
    Index(usize),
    Label(String),
    Amount(Money),
    Type(String),
}

impl Payment {
    /// Appends a fee, journals it, and folds its amount into the
    /// totals.
    pub fn add_fee(&mut self, fee: FeeEntry) -> bool {
        self.pending_mut().push_fee(FeeChange {
            action: ChangeAction::Add,
            label: fee.label.clone(),
            amount: fee.amount,
        });
        self.increase_fees(fee.amount);
        self.fees.push(fee);
        true
    }

    /// Removes the fee at `index`. Returns false when out of range.
    pub fn remove_fee(&mut self, index: usize) -> bool {
        self.remove_fee_by(FeeSelector::Index(index), false)
    }

    /// Removes the first fee matching `selector`, or every match when
    /// `remove_all` is set. Remaining fees keep a contiguous index
    /// range. Returns true when at least one fee was removed.
    pub fn remove_fee_by(&mut self, selector: FeeSelector, remove_all: bool) -> bool {
        let matches: Vec<usize> = self
            .fees
            .iter()
            .enumerate()
            .filter(|(index, fee)| match &selector {
                FeeSelector::Index(wanted) => index == wanted,
                FeeSelector::Label(label) => &fee.label == label,
                FeeSelector::Amount(amount) => &fee.amount == amount,
                FeeSelector::Type(fee_type) => &fee.fee_type == fee_type,
            })
            .map(|(index, _)| index)
            .collect();

        if matches.is_empty() {
            return false;
        }
        let matches = if remove_all { &matches[..] } else { &matches[..1] };

        for (removed, &index) in matches.iter().enumerate() {
            let fee = self.fees.remove(index - removed);
            self.pending_mut().push_fee(FeeChange {
                action: ChangeAction::Remove,
                label: fee.label,
                amount: fee.amount,
            });
            self.decrease_fees(fee.amount);
        }
        true
    }

    /// Fees on the payment, optionally restricted to one type, paired
    /// with their current index.
    pub fn fees(&self, fee_type: Option<&str>) -> Vec<(usize, &FeeEntry)> {
        self.fees
            .iter()
            .enumerate()
            .filter(|(_, fee)| fee_type.is_none_or(|wanted| fee.fee_type == wanted))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use common::Money;

    use super::*;
    use crate::payment::journal::ChangeAction;
    use crate::settings::StoreSettings;

    fn fee(label: &str, cents: i64, fee_type: &str) -> FeeEntry {
        FeeEntry {
            label: label.to_string(),
            amount: Money::from_cents(cents),
            fee_type: fee_type.to_string(),
            external_id: None,
            no_tax: false,
            product_id: None,
        }
    }

    fn payment() -> Payment {
        Payment::new(&StoreSettings::default())
    }

    #[test]
    fn test_add_fee_updates_totals_and_journal() {
        let mut payment = payment();
        assert!(payment.add_fee(fee("Setup", 500, "fee")));
        assert_eq!(payment.fees_total(), Money::from_cents(500));
        assert_eq!(payment.total(), Money::from_cents(500));
        let changes = payment.pending().fee_changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].action, ChangeAction::Add);
        assert_eq!(changes[0].label, "Setup");
    }

    #[test]
    fn test_remove_fee_by_index_out_of_range() {
        let mut payment = payment();
        payment.add_fee(fee("Setup", 500, "fee"));
        assert!(!payment.remove_fee(3));
        assert!(payment.remove_fee(0));
        assert_eq!(payment.fees_total(), Money::zero());
    }

    #[test]
    fn test_remove_first_match_by_label() {
        let mut payment = payment();
        payment.add_fee(fee("Shipping", 700, "shipping"));
        payment.add_fee(fee("Shipping", 300, "shipping"));
        assert!(payment.remove_fee_by(FeeSelector::Label("Shipping".to_string()), false));
        assert_eq!(payment.fees(None).len(), 1);
        assert_eq!(payment.fees_total(), Money::from_cents(300));
    }

    #[test]
    fn test_remove_all_by_type_reindexes() {
        let mut payment = payment();
        payment.add_fee(fee("Base", 100, "fee"));
        payment.add_fee(fee("Ground", 700, "shipping"));
        payment.add_fee(fee("Handling", 200, "fee"));
        payment.add_fee(fee("Express", 900, "shipping"));
        assert!(payment.remove_fee_by(FeeSelector::Type("shipping".to_string()), true));

        let left = payment.fees(None);
        assert_eq!(left.len(), 2);
        assert_eq!(left[0].0, 0);
        assert_eq!(left[0].1.label, "Base");
        assert_eq!(left[1].0, 1);
        assert_eq!(left[1].1.label, "Handling");
        assert_eq!(payment.fees_total(), Money::from_cents(300));
    }

    #[test]
    fn test_fees_filter_by_type() {
        let mut payment = payment();
        payment.add_fee(fee("Base", 100, "fee"));
        payment.add_fee(fee("Ground", 700, "shipping"));
        let shipping = payment.fees(Some("shipping"));
        assert_eq!(shipping.len(), 1);
        assert_eq!(shipping[0].1.label, "Ground");
    }

    #[test]
    fn test_remove_no_match_returns_false() {
        let mut payment = payment();
        payment.add_fee(fee("Base", 100, "fee"));
        assert!(!payment.remove_fee_by(FeeSelector::Amount(Money::from_cents(999)), true));
        assert_eq!(payment.fees(None).len(), 1);
    }
}
