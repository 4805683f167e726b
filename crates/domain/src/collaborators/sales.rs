//! Per-product sales statistics and sale logs.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{Money, PaymentId, PriceOptionId, ProductId};

use super::CollaboratorError;

/// One recorded sale unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleLog {
    pub product_id: ProductId,
    pub price_id: Option<PriceOptionId>,
    pub payment_id: PaymentId,
    pub recorded_at: DateTime<Utc>,
}

/// Per-product sales counts, earnings, and the sale log.
#[async_trait]
pub trait SalesLedger: Send + Sync {
    /// Writes one sale log entry for a sold unit.
    async fn record_sale(
        &self,
        product_id: ProductId,
        price_id: Option<PriceOptionId>,
        payment_id: PaymentId,
        recorded_at: DateTime<Utc>,
    ) -> Result<(), CollaboratorError>;

    /// Backs out a counted line: sales down by `quantity`, earnings
    /// down by `amount`.
    async fn reverse_sale(
        &self,
        product_id: ProductId,
        quantity: u32,
        amount: Money,
    ) -> Result<(), CollaboratorError>;

    /// Drops every sale log written for the payment.
    async fn delete_sale_logs(&self, payment_id: PaymentId) -> Result<(), CollaboratorError>;

    async fn increase_sales(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), CollaboratorError>;

    async fn decrease_sales(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), CollaboratorError>;

    async fn increase_earnings(
        &self,
        product_id: ProductId,
        amount: Money,
    ) -> Result<(), CollaboratorError>;

    async fn decrease_earnings(
        &self,
        product_id: ProductId,
        amount: Money,
    ) -> Result<(), CollaboratorError>;
}

#[derive(Debug, Clone, Copy, Default)]
struct ProductSales {
    sales: u32,
    earnings: Money,
}

#[derive(Debug, Default)]
struct InMemorySalesState {
    products: HashMap<ProductId, ProductSales>,
    logs: Vec<SaleLog>,
    fail_on_write: bool,
}

/// In-memory sales ledger for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemorySalesLedger {
    state: Arc<RwLock<InMemorySalesState>>,
}

impl InMemorySalesLedger {
    /// Creates an empty in-memory ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the ledger to fail on the next mutating call.
    pub fn set_fail_on_write(&self, fail: bool) {
        self.state.write().unwrap().fail_on_write = fail;
    }

    /// Current sale count for a product.
    pub fn sales_of(&self, product_id: ProductId) -> u32 {
        self.state
            .read()
            .unwrap()
            .products
            .get(&product_id)
            .map(|entry| entry.sales)
            .unwrap_or_default()
    }

    /// Current earnings for a product.
    pub fn earnings_of(&self, product_id: ProductId) -> Money {
        self.state
            .read()
            .unwrap()
            .products
            .get(&product_id)
            .map(|entry| entry.earnings)
            .unwrap_or_else(Money::zero)
    }

    /// Sale logs written for a payment, in order.
    pub fn logs_for(&self, payment_id: PaymentId) -> Vec<SaleLog> {
        self.state
            .read()
            .unwrap()
            .logs
            .iter()
            .filter(|log| log.payment_id == payment_id)
            .cloned()
            .collect()
    }
}

impl InMemorySalesState {
    fn check_writable(&self) -> Result<(), CollaboratorError> {
        if self.fail_on_write {
            Err(CollaboratorError::Sales("Sales ledger unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SalesLedger for InMemorySalesLedger {
    async fn record_sale(
        &self,
        product_id: ProductId,
        price_id: Option<PriceOptionId>,
        payment_id: PaymentId,
        recorded_at: DateTime<Utc>,
    ) -> Result<(), CollaboratorError> {
        let mut state = self.state.write().unwrap();
        state.check_writable()?;
        state.logs.push(SaleLog {
            product_id,
            price_id,
            payment_id,
            recorded_at,
        });
        Ok(())
    }

    async fn reverse_sale(
        &self,
        product_id: ProductId,
        quantity: u32,
        amount: Money,
    ) -> Result<(), CollaboratorError> {
        let mut state = self.state.write().unwrap();
        state.check_writable()?;
        let entry = state.products.entry(product_id).or_default();
        entry.sales = entry.sales.saturating_sub(quantity);
        entry.earnings = entry.earnings.saturating_sub(amount);
        Ok(())
    }

    async fn delete_sale_logs(&self, payment_id: PaymentId) -> Result<(), CollaboratorError> {
        let mut state = self.state.write().unwrap();
        state.check_writable()?;
        state.logs.retain(|log| log.payment_id != payment_id);
        Ok(())
    }

    async fn increase_sales(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), CollaboratorError> {
        let mut state = self.state.write().unwrap();
        state.check_writable()?;
        state.products.entry(product_id).or_default().sales += quantity;
        Ok(())
    }

    async fn decrease_sales(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), CollaboratorError> {
        let mut state = self.state.write().unwrap();
        state.check_writable()?;
        let entry = state.products.entry(product_id).or_default();
        entry.sales = entry.sales.saturating_sub(quantity);
        Ok(())
    }

    async fn increase_earnings(
        &self,
        product_id: ProductId,
        amount: Money,
    ) -> Result<(), CollaboratorError> {
        let mut state = self.state.write().unwrap();
        state.check_writable()?;
        state.products.entry(product_id).or_default().earnings += amount;
        Ok(())
    }

    async fn decrease_earnings(
        &self,
        product_id: ProductId,
        amount: Money,
    ) -> Result<(), CollaboratorError> {
        let mut state = self.state.write().unwrap();
        state.check_writable()?;
        let entry = state.products.entry(product_id).or_default();
        entry.earnings = entry.earnings.saturating_sub(amount);
        Ok(())
    }
}
