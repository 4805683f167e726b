//! Cart ledger.
//!
//! Cart lines and the parallel download list move together, and every
//! mutation lands in the journal so a later save can replay it against
//! sales statistics.

use std::collections::BTreeMap;

use common::{Money, PriceOptionId, ProductId};
use serde::{Deserialize, Serialize};

use super::journal::{CartChange, ChangeAction};
use super::{Payment, PaymentError};
use crate::settings::StoreSettings;

/// One purchased item with its full price breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub name: String,
    pub product_id: ProductId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_id: Option<PriceOptionId>,
    pub item_price: Money,
    pub quantity: u32,
    pub discount: Money,
    pub subtotal: Money,
    pub tax: Money,
    pub fees: Money,
    pub total: Money,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,
}

/// Compact download entry kept beside the cart, one per product line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadRef {
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_id: Option<PriceOptionId>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,
}

/// Caller-supplied knobs for adding a line.
#[derive(Debug, Clone, PartialEq)]
pub struct AddLineArgs {
    pub quantity: u32,
    pub price_id: Option<PriceOptionId>,
    /// Overrides catalog price resolution entirely when set.
    pub item_price: Option<Money>,
    pub discount: Money,
    pub tax: Money,
    pub fees: Money,
    pub options: BTreeMap<String, String>,
}

impl Default for AddLineArgs {
    fn default() -> Self {
        Self {
            quantity: 1,
            price_id: None,
            item_price: None,
            discount: Money::zero(),
            tax: Money::zero(),
            fees: Money::zero(),
            options: BTreeMap::new(),
        }
    }
}

/// Caller-supplied knobs for removing (part of) a line.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoveLineArgs {
    pub quantity: u32,
    pub price_id: Option<PriceOptionId>,
    /// Extra disambiguator when several lines share a product.
    pub item_price: Option<Money>,
    /// Targets one line directly instead of searching.
    pub cart_index: Option<usize>,
}

impl Default for RemoveLineArgs {
    fn default() -> Self {
        Self {
            quantity: 1,
            price_id: None,
            item_price: None,
            cart_index: None,
        }
    }
}

/// Catalog resolution output handed to the aggregate by the service.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPrice {
    pub product_id: ProductId,
    pub name: String,
    pub price_id: Option<PriceOptionId>,
    pub unit_price: Money,
}

impl Payment {
    /// Appends a cart line whose price was already resolved, updating
    /// the download list, the totals, and the journal.
    pub fn add_line_with_price(
        &mut self,
        resolved: ResolvedPrice,
        args: AddLineArgs,
        settings: &StoreSettings,
    ) {
        let quantity = if settings.item_quantities_enabled {
            args.quantity.max(1)
        } else {
            1
        };

        let amount = resolved.unit_price.multiply(quantity);
        let subtotal = if settings.prices_include_tax {
            amount.saturating_sub(args.tax)
        } else {
            amount
        };
        let mut total = subtotal + args.tax + args.fees;
        total = total.saturating_sub(args.discount);

        self.downloads.push(DownloadRef {
            product_id: resolved.product_id,
            quantity,
            price_id: resolved.price_id,
            options: args.options.clone(),
        });
        self.cart_details.push(CartLine {
            name: resolved.name,
            product_id: resolved.product_id,
            price_id: resolved.price_id,
            item_price: resolved.unit_price,
            quantity,
            discount: args.discount,
            subtotal,
            tax: args.tax,
            fees: args.fees,
            total,
            options: args.options,
        });
        self.pending.push_cart(CartChange {
            action: ChangeAction::Add,
            product_id: resolved.product_id,
            quantity,
            amount: total,
            tax: args.tax,
            price_id: resolved.price_id,
        });

        self.increase_subtotal(subtotal.saturating_sub(args.discount));
        self.increase_tax(args.tax);
        if args.fees.is_positive() {
            self.increase_fees(args.fees);
        }
    }

    /// Removes `args.quantity` units of a product from the cart.
    ///
    /// Partial removal keeps the line with a reduced quantity,
    /// proportional tax, and a zeroed discount. Removing the full
    /// quantity drops the line and lowers the aggregate by the unit
    /// price plus the full line tax.
    pub fn remove_line(
        &mut self,
        product_id: ProductId,
        args: RemoveLineArgs,
    ) -> Result<(), PaymentError> {
        let index = self.locate_line(product_id, &args)?;

        let (removed_qty, unit_price, price_id) = {
            let line = &self.cart_details[index];
            (args.quantity.min(line.quantity), line.item_price, line.price_id)
        };

        let (subtotal_delta, tax_delta) = if removed_qty < self.cart_details[index].quantity {
            let line = &mut self.cart_details[index];
            let tax_removed = line.tax.prorate(removed_qty, line.quantity);
            line.quantity -= removed_qty;
            line.tax = line.tax.saturating_sub(tax_removed);
            line.discount = Money::zero();
            line.subtotal = unit_price.multiply(line.quantity);
            line.total = line.subtotal + line.tax + line.fees;
            (unit_price.multiply(removed_qty), tax_removed)
        } else {
            let removed = self.cart_details.remove(index);
            (unit_price, removed.tax)
        };

        self.drop_download_units(product_id, args.price_id, removed_qty);
        self.pending.push_cart(CartChange {
            action: ChangeAction::Remove,
            product_id,
            quantity: removed_qty,
            amount: subtotal_delta + tax_delta,
            tax: tax_delta,
            price_id,
        });
        self.decrease_subtotal(subtotal_delta);
        self.decrease_tax(tax_delta);
        Ok(())
    }

    /// Finds the cart index targeted by a removal request.
    fn locate_line(
        &self,
        product_id: ProductId,
        args: &RemoveLineArgs,
    ) -> Result<usize, PaymentError> {
        if let Some(index) = args.cart_index {
            let line = self
                .cart_details
                .get(index)
                .ok_or(PaymentError::InvalidCartIndex { index })?;
            if line.product_id != product_id
                || args.price_id.is_some_and(|wanted| line.price_id != Some(wanted))
            {
                return Err(PaymentError::InvalidCartIndex { index });
            }
            return Ok(index);
        }

        let qualified = self.cart_details.iter().position(|line| {
            line.product_id == product_id
                && args.price_id.is_none_or(|wanted| line.price_id == Some(wanted))
                && args.item_price.is_none_or(|wanted| line.item_price == wanted)
        });
        if let Some(index) = qualified {
            return Ok(index);
        }

        self.cart_details
            .iter()
            .position(|line| line.product_id == product_id)
            .ok_or(PaymentError::LineNotFound(product_id))
    }

    fn drop_download_units(
        &mut self,
        product_id: ProductId,
        price_id: Option<PriceOptionId>,
        mut quantity: u32,
    ) {
        for entry in self.downloads.iter_mut() {
            if quantity == 0 {
                break;
            }
            if entry.product_id != product_id {
                continue;
            }
            if price_id.is_some_and(|wanted| entry.price_id != Some(wanted)) {
                continue;
            }
            let taken = quantity.min(entry.quantity);
            entry.quantity -= taken;
            quantity -= taken;
        }
        self.downloads.retain(|entry| entry.quantity > 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::journal::ChangeAction;

    fn settings() -> StoreSettings {
        StoreSettings {
            item_quantities_enabled: true,
            ..Default::default()
        }
    }

    fn resolved(product: u64, cents: i64) -> ResolvedPrice {
        ResolvedPrice {
            product_id: ProductId::new(product),
            name: format!("Product {product}"),
            price_id: None,
            unit_price: Money::from_cents(cents),
        }
    }

    fn payment() -> Payment {
        Payment::new(&StoreSettings::default())
    }

    #[test]
    fn test_add_line_builds_breakdown() {
        let mut payment = payment();
        payment.add_line_with_price(
            resolved(7, 2000),
            AddLineArgs {
                quantity: 2,
                tax: Money::from_cents(400),
                ..Default::default()
            },
            &settings(),
        );

        assert_eq!(payment.subtotal(), Money::from_cents(4000));
        assert_eq!(payment.tax(), Money::from_cents(400));
        assert_eq!(payment.total(), Money::from_cents(4400));

        let line = &payment.cart_details()[0];
        assert_eq!(line.quantity, 2);
        assert_eq!(line.subtotal, Money::from_cents(4000));
        assert_eq!(line.total, Money::from_cents(4400));
        assert_eq!(payment.downloads().len(), 1);
        assert_eq!(payment.downloads()[0].quantity, 2);

        let changes = payment.pending().cart_changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].action, ChangeAction::Add);
        assert_eq!(changes[0].amount, Money::from_cents(4400));
    }

    #[test]
    fn test_quantity_forced_to_one_when_disabled() {
        let mut payment = payment();
        payment.add_line_with_price(
            resolved(7, 2000),
            AddLineArgs {
                quantity: 5,
                ..Default::default()
            },
            &StoreSettings::default(),
        );
        assert_eq!(payment.cart_details()[0].quantity, 1);
        assert_eq!(payment.subtotal(), Money::from_cents(2000));
    }

    #[test]
    fn test_tax_inclusive_pricing_shrinks_subtotal() {
        let mut payment = payment();
        payment.add_line_with_price(
            resolved(7, 1100),
            AddLineArgs {
                tax: Money::from_cents(100),
                ..Default::default()
            },
            &StoreSettings {
                prices_include_tax: true,
                ..Default::default()
            },
        );
        let line = &payment.cart_details()[0];
        assert_eq!(line.subtotal, Money::from_cents(1000));
        assert_eq!(line.total, Money::from_cents(1100));
        assert_eq!(payment.total(), Money::from_cents(1100));
    }

    #[test]
    fn test_discount_clamps_line_total() {
        let mut payment = payment();
        payment.add_line_with_price(
            resolved(7, 500),
            AddLineArgs {
                discount: Money::from_cents(900),
                ..Default::default()
            },
            &StoreSettings::default(),
        );
        assert_eq!(payment.cart_details()[0].total, Money::zero());
    }

    #[test]
    fn test_partial_removal_prorates_tax_and_resets_discount() {
        let mut payment = payment();
        payment.add_line_with_price(
            resolved(7, 2000),
            AddLineArgs {
                quantity: 2,
                tax: Money::from_cents(400),
                discount: Money::from_cents(100),
                ..Default::default()
            },
            &settings(),
        );

        payment
            .remove_line(ProductId::new(7), RemoveLineArgs::default())
            .unwrap();

        let line = &payment.cart_details()[0];
        assert_eq!(line.quantity, 1);
        assert_eq!(line.tax, Money::from_cents(200));
        assert_eq!(line.discount, Money::zero());
        assert_eq!(line.subtotal, Money::from_cents(2000));
        assert_eq!(line.total, Money::from_cents(2200));
        assert_eq!(payment.downloads()[0].quantity, 1);

        assert_eq!(payment.subtotal(), Money::from_cents(1900));
        assert_eq!(payment.tax(), Money::from_cents(200));
    }

    #[test]
    fn test_odd_tax_proration_rounds_half_up() {
        let mut payment = payment();
        payment.add_line_with_price(
            resolved(7, 1000),
            AddLineArgs {
                quantity: 3,
                tax: Money::from_cents(100),
                ..Default::default()
            },
            &settings(),
        );
        payment
            .remove_line(ProductId::new(7), RemoveLineArgs::default())
            .unwrap();
        // 100 * 1/3 rounds to 33, leaving 67 on the line.
        assert_eq!(payment.cart_details()[0].tax, Money::from_cents(67));
        assert_eq!(payment.tax(), Money::from_cents(67));
    }

    #[test]
    fn test_full_removal_drops_unit_price_and_full_tax() {
        let mut payment = payment();
        payment.add_line_with_price(
            resolved(7, 2000),
            AddLineArgs {
                quantity: 2,
                tax: Money::from_cents(400),
                ..Default::default()
            },
            &settings(),
        );
        payment
            .remove_line(
                ProductId::new(7),
                RemoveLineArgs {
                    quantity: 2,
                    ..Default::default()
                },
            )
            .unwrap();

        assert!(payment.cart_details().is_empty());
        assert!(payment.downloads().is_empty());
        assert_eq!(payment.subtotal(), Money::from_cents(2000));
        assert_eq!(payment.tax(), Money::zero());
        assert_eq!(payment.total(), Money::from_cents(2000));
    }

    #[test]
    fn test_cart_index_must_match_line() {
        let mut payment = payment();
        payment.add_line_with_price(resolved(7, 2000), AddLineArgs::default(), &settings());
        payment.add_line_with_price(resolved(9, 1500), AddLineArgs::default(), &settings());

        let err = payment
            .remove_line(
                ProductId::new(9),
                RemoveLineArgs {
                    cart_index: Some(0),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, PaymentError::InvalidCartIndex { index: 0 }));

        let err = payment
            .remove_line(
                ProductId::new(9),
                RemoveLineArgs {
                    cart_index: Some(5),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, PaymentError::InvalidCartIndex { index: 5 }));

        payment
            .remove_line(
                ProductId::new(9),
                RemoveLineArgs {
                    cart_index: Some(1),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(payment.cart_details().len(), 1);
    }

    #[test]
    fn test_price_id_disambiguates_lines() {
        let mut payment = payment();
        let mut first = resolved(7, 1000);
        first.price_id = Some(PriceOptionId::new(1));
        let mut second = resolved(7, 3000);
        second.price_id = Some(PriceOptionId::new(2));
        payment.add_line_with_price(first, AddLineArgs::default(), &settings());
        payment.add_line_with_price(second, AddLineArgs::default(), &settings());

        payment
            .remove_line(
                ProductId::new(7),
                RemoveLineArgs {
                    price_id: Some(PriceOptionId::new(2)),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(payment.cart_details().len(), 1);
        assert_eq!(payment.cart_details()[0].price_id, Some(PriceOptionId::new(1)));
        assert_eq!(payment.subtotal(), Money::from_cents(1000));
    }

    #[test]
    fn test_remove_missing_product_fails_cleanly() {
        let mut payment = payment();
        payment.add_line_with_price(resolved(7, 2000), AddLineArgs::default(), &settings());
        let before_total = payment.total();

        let err = payment
            .remove_line(ProductId::new(42), RemoveLineArgs::default())
            .unwrap_err();
        assert!(matches!(err, PaymentError::LineNotFound(_)));
        assert_eq!(payment.total(), before_total);
        assert_eq!(payment.cart_details().len(), 1);
    }
}
