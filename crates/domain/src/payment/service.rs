//! Payment service: hydration and the batched save protocol.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use common::{CustomerId, Money, PaymentId, ProductId};
use store::{NewPaymentRecord, PaymentStore, RecordField, StoreError};

use super::aggregate::{HydrationData, Payment};
use super::cart::{AddLineArgs, ResolvedPrice};
use super::hooks::PaymentHooks;
use super::journal::{ChangeAction, PaymentField};
use super::meta::{keys, merge_snapshot, PaymentSnapshot};
use super::status::PaymentStatus;
use super::PaymentError;
use crate::collaborators::Collaborators;
use crate::error::DomainError;
use crate::settings::StoreSettings;

/// Orchestrates payment aggregates against the store and the
/// collaborators. Aggregate mutations stay synchronous and in-memory;
/// everything here is about moving them to and from durable state.
pub struct PaymentService<S: PaymentStore> {
    store: S,
    collaborators: Collaborators,
    settings: StoreSettings,
    hooks: Option<Arc<dyn PaymentHooks>>,
}

impl<S: PaymentStore> PaymentService<S> {
    pub fn new(store: S, collaborators: Collaborators, settings: StoreSettings) -> Self {
        Self {
            store,
            collaborators,
            settings,
            hooks: None,
        }
    }

    /// Registers hook callbacks fired around hydration and save.
    pub fn with_hooks(mut self, hooks: Arc<dyn PaymentHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// A fresh payment configured from the store settings.
    pub fn new_payment(&self) -> Payment {
        Payment::new(&self.settings)
    }

    /// Adds a product to the cart, resolving its price through the
    /// catalog.
    ///
    /// Resolution order: explicit price override, then the requested
    /// price option, then the lowest price option of a variable-priced
    /// product, then the single product price. A product that cannot be
    /// purchased or priced fails without touching the payment.
    #[tracing::instrument(skip(self, payment, args), fields(product_id = %product_id))]
    pub async fn add_line(
        &self,
        payment: &mut Payment,
        product_id: ProductId,
        args: AddLineArgs,
    ) -> Result<(), DomainError> {
        let catalog = &self.collaborators.catalog;
        if !catalog.is_purchasable(product_id).await? {
            return Err(PaymentError::ProductNotFound(product_id).into());
        }

        let mut price_id = args.price_id;
        let unit_price = if let Some(price) = args.item_price {
            price
        } else if catalog.has_variable_pricing(product_id).await? {
            match price_id {
                Some(wanted) => catalog
                    .resolve_price(product_id, Some(wanted))
                    .await?
                    .ok_or(PaymentError::ProductNotFound(product_id))?,
                None => {
                    let (price, lowest) = catalog
                        .lowest_price_option(product_id)
                        .await?
                        .ok_or(PaymentError::ProductNotFound(product_id))?;
                    price_id = Some(lowest);
                    price
                }
            }
        } else {
            catalog
                .resolve_price(product_id, None)
                .await?
                .ok_or(PaymentError::ProductNotFound(product_id))?
        };

        let resolved = ResolvedPrice {
            product_id,
            name: catalog.product_title(product_id).await?,
            price_id,
            unit_price,
        };
        payment.add_line_with_price(resolved, args, &self.settings);
        Ok(())
    }

    /// Flushes every journaled change to the store in one batch.
    ///
    /// Returns `Ok(false)` when there was nothing to write. On error
    /// the journal is left intact, so a retried save picks up where
    /// this one failed. On success the aggregate is re-hydrated from
    /// what the store now holds.
    #[tracing::instrument(skip(self, payment), fields(payment_id = ?payment.id()))]
    pub async fn save(&self, payment: &mut Payment) -> Result<bool, DomainError> {
        if let Some(hooks) = &self.hooks {
            hooks.before_save(payment);
        }

        let id = match payment.id() {
            Some(id) => id,
            None => self.first_persist(payment).await?,
        };
        if payment.pending().is_empty() {
            return Ok(false);
        }

        let cart_changes = payment.pending().cart_changes().to_vec();
        let fee_changes = payment.pending().fee_changes().to_vec();
        let dirty: Vec<PaymentField> = payment.pending().fields().collect();

        // Per-product statistics only move while the payment is in a
        // counted status.
        let counted = payment.status().is_counted();
        let mut increase = Money::zero();
        let mut decrease = Money::zero();
        if counted {
            let sales = &self.collaborators.sales;
            for change in &cart_changes {
                match change.action {
                    ChangeAction::Add => {
                        for _ in 0..change.quantity {
                            sales
                                .record_sale(change.product_id, change.price_id, id, Utc::now())
                                .await?;
                        }
                        sales.increase_sales(change.product_id, change.quantity).await?;
                        sales.increase_earnings(change.product_id, change.amount).await?;
                        increase += change.amount;
                    }
                    ChangeAction::Remove => {
                        sales.decrease_sales(change.product_id, change.quantity).await?;
                        sales.decrease_earnings(change.product_id, change.amount).await?;
                        decrease += change.amount;
                    }
                }
            }
            for change in &fee_changes {
                match change.action {
                    ChangeAction::Add => increase += change.amount,
                    ChangeAction::Remove => decrease += change.amount,
                }
            }
        }

        if dirty.contains(&PaymentField::Status) {
            self.store
                .update_field(id, RecordField::Status(payment.status().as_wire().to_string()))
                .await?;
            match payment.status() {
                PaymentStatus::Refunded | PaymentStatus::Pending => {
                    self.reconcile_reversal(payment, id).await?;
                }
                PaymentStatus::Failed => self.process_failure(payment).await?,
                _ => {}
            }
        }

        for field in &dirty {
            match field {
                // Handled above.
                PaymentField::Status => {}
                PaymentField::CreatedAt => {
                    self.store
                        .update_field(id, RecordField::CreatedAt(payment.created_at()))
                        .await?;
                }
                PaymentField::ParentPayment => {
                    self.store
                        .update_field(id, RecordField::Parent(payment.parent()))
                        .await?;
                }
                PaymentField::Gateway => {
                    self.store
                        .write_meta(id, keys::GATEWAY, json!(payment.gateway()))
                        .await?;
                }
                PaymentField::Mode => {
                    self.store
                        .write_meta(id, keys::MODE, json!(payment.mode().as_wire()))
                        .await?;
                }
                PaymentField::TransactionId => {
                    self.store
                        .write_meta(id, keys::TRANSACTION_ID, json!(payment.transaction_id()))
                        .await?;
                }
                PaymentField::Ip => {
                    self.store
                        .write_meta(id, keys::USER_IP, json!(payment.ip()))
                        .await?;
                }
                PaymentField::CustomerId => {
                    self.store
                        .write_meta(
                            id,
                            keys::CUSTOMER_ID,
                            json!(payment.customer_id().map(|c| c.as_u64())),
                        )
                        .await?;
                }
                PaymentField::UserId => {
                    self.store
                        .write_meta(id, keys::USER_ID, json!(payment.user_id()))
                        .await?;
                }
                PaymentField::Email => {
                    self.store
                        .write_meta(id, keys::USER_EMAIL, json!(payment.email()))
                        .await?;
                }
                PaymentField::Key => {
                    self.store
                        .write_meta(id, keys::PURCHASE_KEY, json!(payment.key()))
                        .await?;
                }
                PaymentField::CompletedDate => {
                    self.store
                        .write_meta(
                            id,
                            keys::COMPLETED_DATE,
                            json!(payment.completed_at().map(|at| at.to_rfc3339())),
                        )
                        .await?;
                }
                PaymentField::UnlimitedDownloads => {
                    self.store
                        .write_meta(
                            id,
                            keys::UNLIMITED_DOWNLOADS,
                            json!(payment.unlimited_downloads()),
                        )
                        .await?;
                }
                // These only live inside the snapshot blob.
                PaymentField::FirstName
                | PaymentField::LastName
                | PaymentField::Discounts
                | PaymentField::Address
                | PaymentField::Currency => {}
            }
        }

        if payment.status() != &PaymentStatus::Pending {
            let net = increase.cents() - decrease.cents();
            if net != 0 {
                let delta = Money::from_cents(net.abs());
                let customers = &self.collaborators.customers;
                let stats = &self.collaborators.stats;
                if net > 0 {
                    if let Some(customer_id) = payment.customer_id() {
                        customers.increase_value(customer_id, delta).await?;
                    }
                    stats.increase_total_earnings(delta).await?;
                } else {
                    if let Some(customer_id) = payment.customer_id() {
                        customers.decrease_value(customer_id, delta).await?;
                    }
                    stats.decrease_total_earnings(delta).await?;
                }
            }
        }

        self.store
            .write_meta(id, keys::TOTAL, json!(payment.total()))
            .await?;
        self.store
            .write_meta(id, keys::TAX, json!(payment.tax()))
            .await?;

        let stored = self.store.read_meta(id, keys::SNAPSHOT).await?;
        let merged = merge_snapshot(stored.clone(), serde_json::to_value(payment.snapshot())?);
        if stored.as_ref() != Some(&merged) {
            self.store.write_meta(id, keys::SNAPSHOT, merged).await?;
        }

        let rehydrated = self.load(id).await?;
        payment.pending_mut().clear();
        *payment = rehydrated;

        metrics::counter!("payments_saved_total").increment(1);
        Ok(true)
    }

    /// Marks the payment refunded and saves immediately.
    #[tracing::instrument(skip(self, payment), fields(payment_id = ?payment.id()))]
    pub async fn refund(&self, payment: &mut Payment) -> Result<bool, DomainError> {
        payment.set_status(PaymentStatus::Refunded);
        let saved = self.save(payment).await?;
        metrics::counter!("payments_refunded_total").increment(1);
        Ok(saved)
    }

    /// Loads and hydrates a payment from the store.
    #[tracing::instrument(skip(self))]
    pub async fn load(&self, id: PaymentId) -> Result<Payment, DomainError> {
        if let Some(hooks) = &self.hooks {
            hooks.before_hydrate(id);
        }

        let row = self
            .store
            .load(id)
            .await?
            .ok_or(StoreError::PaymentNotFound(id))?;

        let snapshot = match self.store.read_meta(id, keys::SNAPSHOT).await? {
            Some(value) => serde_json::from_value::<PaymentSnapshot>(value)?,
            None => PaymentSnapshot::default(),
        };
        let data = HydrationData {
            row,
            snapshot,
            total: self.meta_money(id, keys::TOTAL).await?,
            tax: self.meta_money(id, keys::TAX).await?,
            gateway: self.meta_string(id, keys::GATEWAY).await?,
            mode: self.meta_string(id, keys::MODE).await?,
            transaction_id: self.meta_string(id, keys::TRANSACTION_ID).await?,
            ip: self.meta_string(id, keys::USER_IP).await?,
            customer_id: self.meta_u64(id, keys::CUSTOMER_ID).await?.map(CustomerId::new),
            user_id: self.meta_u64(id, keys::USER_ID).await?,
            email: self.meta_string(id, keys::USER_EMAIL).await?,
            key: self.meta_string(id, keys::PURCHASE_KEY).await?,
            completed_date: self.meta_datetime(id, keys::COMPLETED_DATE).await?,
            unlimited_downloads: self
                .store
                .read_meta(id, keys::UNLIMITED_DOWNLOADS)
                .await?
                .and_then(|value| value.as_bool())
                .unwrap_or(false),
        };

        let mut payment = Payment::hydrate(data, &self.settings);
        if payment.email().is_none() {
            if let Some(customer_id) = payment.customer_id() {
                if let Some(email) = self.collaborators.customers.email_of(customer_id).await? {
                    payment.backfill_email(email);
                }
            }
        }

        if let Some(hooks) = &self.hooks {
            hooks.after_hydrate(&mut payment);
        }
        Ok(payment)
    }

    /// Inserts the record for a never-persisted payment: derives the
    /// title, generates the purchase key, and resolves the customer.
    async fn first_persist(&self, payment: &mut Payment) -> Result<PaymentId, DomainError> {
        let title = record_title(payment);

        if payment.key().is_none() {
            let email = payment.email().unwrap_or_default();
            let seed = format!(
                "{}{}{}{}",
                email,
                Utc::now().timestamp(),
                self.settings.install_key,
                Uuid::new_v4()
            );
            payment.assign_key(hex::encode(Sha256::digest(seed.as_bytes())));
        }

        let record = NewPaymentRecord {
            title,
            status: payment.status().as_wire().to_string(),
            created_at: payment.created_at(),
            parent: payment.parent(),
        };
        let id = self.store.insert(record).await?;
        payment.assign_id(id);

        if let Some(email) = payment.email().map(str::to_string) {
            let customers = &self.collaborators.customers;
            let customer_id = customers.find_or_create(&email, payment.user_id()).await?;
            customers.attach_payment(customer_id, id).await?;
            payment.set_customer_id(customer_id);
        }
        Ok(id)
    }

    /// Backs a formerly counted payment out of the statistics. Runs
    /// when the payment moves to refunded or back to pending; a
    /// payment that never counted has nothing to reverse.
    async fn reconcile_reversal(
        &self,
        payment: &Payment,
        id: PaymentId,
    ) -> Result<(), DomainError> {
        let was_counted = payment
            .previous_status()
            .is_some_and(|status| status.is_counted());
        if !was_counted {
            return Ok(());
        }

        let sales = &self.collaborators.sales;
        for line in payment.cart_details() {
            sales
                .reverse_sale(line.product_id, line.quantity, line.total)
                .await?;
        }
        self.collaborators
            .stats
            .decrease_total_earnings(payment.total())
            .await?;
        if let Some(customer_id) = payment.customer_id() {
            let customers = &self.collaborators.customers;
            customers.decrease_value(customer_id, payment.total()).await?;
            customers.decrease_purchase_count(customer_id).await?;
        }
        sales.delete_sale_logs(id).await?;
        self.collaborators.stats.invalidate_period_cache().await?;
        Ok(())
    }

    /// Gives back discount code uses when a payment fails.
    async fn process_failure(&self, payment: &Payment) -> Result<(), DomainError> {
        for code in payment.discounts().codes() {
            self.collaborators.discounts.decrease_usage(code).await?;
        }
        Ok(())
    }

    async fn meta_string(&self, id: PaymentId, key: &str) -> Result<Option<String>, DomainError> {
        Ok(self
            .store
            .read_meta(id, key)
            .await?
            .and_then(|value| value.as_str().map(str::to_string)))
    }

    async fn meta_money(&self, id: PaymentId, key: &str) -> Result<Option<Money>, DomainError> {
        Ok(self
            .store
            .read_meta(id, key)
            .await?
            .and_then(|value| value.as_i64().map(Money::from_cents)))
    }

    async fn meta_u64(&self, id: PaymentId, key: &str) -> Result<Option<u64>, DomainError> {
        Ok(self.store.read_meta(id, key).await?.and_then(|value| value.as_u64()))
    }

    async fn meta_datetime(
        &self,
        id: PaymentId,
        key: &str,
    ) -> Result<Option<DateTime<Utc>>, DomainError> {
        Ok(self
            .store
            .read_meta(id, key)
            .await?
            .and_then(|value| value.as_str().map(str::to_string))
            .and_then(|raw| {
                DateTime::parse_from_rfc3339(&raw)
                    .ok()
                    .map(|at| at.with_timezone(&Utc))
            }))
    }
}

/// Record title: full name, then first name, then email.
fn record_title(payment: &Payment) -> String {
    let first = payment.first_name();
    let last = payment.last_name();
    if !first.is_empty() && !last.is_empty() {
        format!("{first} {last}")
    } else if !first.is_empty() {
        first.to_string()
    } else {
        payment.email().unwrap_or_default().to_string()
    }
}
