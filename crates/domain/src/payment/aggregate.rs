//! The mutable payment aggregate.
//!
//! In-memory mutations are cheap: setters update the struct and mark
//! the field in the journal. Nothing touches the store until
//! [`PaymentService::save`](super::PaymentService::save) drains the
//! journal.

use chrono::{DateTime, Utc};
use common::{CustomerId, Money, PaymentId};
use store::PaymentRow;

use super::cart::{CartLine, DownloadRef};
use super::fees::FeeEntry;
use super::journal::{PaymentField, PendingChanges};
use super::meta::PaymentSnapshot;
use super::status::PaymentStatus;
use super::value_objects::{Address, DiscountCodes, PaymentMode};
use crate::settings::StoreSettings;

/// Everything the store knows about one payment, gathered for
/// hydration.
#[derive(Debug, Clone)]
pub struct HydrationData {
    pub row: PaymentRow,
    pub snapshot: PaymentSnapshot,
    pub total: Option<Money>,
    pub tax: Option<Money>,
    pub gateway: Option<String>,
    pub mode: Option<String>,
    pub transaction_id: Option<String>,
    pub ip: Option<String>,
    pub customer_id: Option<CustomerId>,
    pub user_id: Option<u64>,
    pub email: Option<String>,
    pub key: Option<String>,
    pub completed_date: Option<DateTime<Utc>>,
    pub unlimited_downloads: bool,
}

#[derive(Debug, Clone)]
pub struct Payment {
    id: Option<PaymentId>,
    key: Option<String>,
    status: PaymentStatus,
    previous_status: Option<PaymentStatus>,
    pub(crate) subtotal: Money,
    pub(crate) tax: Money,
    pub(crate) fees_total: Money,
    pub(crate) total: Money,
    currency: String,
    pub(crate) cart_details: Vec<CartLine>,
    pub(crate) downloads: Vec<DownloadRef>,
    pub(crate) fees: Vec<FeeEntry>,
    customer_id: Option<CustomerId>,
    user_id: Option<u64>,
    email: Option<String>,
    first_name: String,
    last_name: String,
    address: Address,
    discounts: DiscountCodes,
    gateway: Option<String>,
    transaction_id: Option<String>,
    mode: PaymentMode,
    ip: Option<String>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    parent: Option<PaymentId>,
    unlimited_downloads: bool,
    pub(crate) pending: PendingChanges,
}

impl Payment {
    /// A fresh, never-persisted payment.
    pub fn new(settings: &StoreSettings) -> Self {
        let mode = if settings.test_mode {
            PaymentMode::Test
        } else {
            PaymentMode::Live
        };
        let mut payment = Self {
            id: None,
            key: None,
            status: PaymentStatus::Pending,
            previous_status: None,
            subtotal: Money::zero(),
            tax: Money::zero(),
            fees_total: Money::zero(),
            total: Money::zero(),
            currency: settings.currency.clone(),
            cart_details: Vec::new(),
            downloads: Vec::new(),
            fees: Vec::new(),
            customer_id: None,
            user_id: None,
            email: None,
            first_name: String::new(),
            last_name: String::new(),
            address: Address::default(),
            discounts: DiscountCodes::None,
            gateway: None,
            transaction_id: None,
            mode,
            ip: None,
            created_at: Utc::now(),
            completed_at: None,
            parent: None,
            unlimited_downloads: false,
            pending: PendingChanges::default(),
        };
        payment.pending.mark(PaymentField::Mode);
        payment
    }

    /// Rebuilds the aggregate from stored state.
    ///
    /// Older records miss some of the dedicated meta values, so each
    /// derived field walks an ordered fallback chain before settling
    /// on a default.
    pub fn hydrate(data: HydrationData, settings: &StoreSettings) -> Self {
        let HydrationData { row, snapshot, .. } = &data;
        let status = PaymentStatus::parse(&row.status);

        let total = data.total.or(snapshot.amount).unwrap_or_else(Money::zero);
        let tax = data.tax.or(snapshot.tax).unwrap_or_else(Money::zero);
        let subtotal = if snapshot.cart_details.is_empty() {
            if settings.use_taxes {
                total.saturating_sub(tax)
            } else {
                total
            }
        } else {
            snapshot
                .cart_details
                .iter()
                .fold(Money::zero(), |sum, line| sum + line.subtotal)
        };
        let fees_total = snapshot
            .fees
            .iter()
            .fold(Money::zero(), |sum, fee| sum + fee.amount);

        let email = data
            .email
            .clone()
            .or_else(|| snapshot.email.clone())
            .or_else(|| {
                (!snapshot.user_info.email.is_empty()).then(|| snapshot.user_info.email.clone())
            });
        let currency = if snapshot.currency.is_empty() {
            settings.currency.clone()
        } else {
            snapshot.currency.clone()
        };
        let completed_at = if status == PaymentStatus::Pending {
            None
        } else {
            data.completed_date
        };

        Self {
            id: Some(row.id),
            key: data.key.clone().or_else(|| snapshot.key.clone()),
            status,
            previous_status: None,
            subtotal,
            tax,
            fees_total,
            total,
            currency,
            cart_details: snapshot.cart_details.clone(),
            downloads: snapshot.downloads.clone(),
            fees: snapshot.fees.clone(),
            customer_id: data.customer_id,
            user_id: data.user_id.or(snapshot.user_info.id),
            email,
            first_name: snapshot.user_info.first_name.clone(),
            last_name: snapshot.user_info.last_name.clone(),
            address: snapshot.user_info.address.clone().unwrap_or_default(),
            discounts: DiscountCodes::parse(&snapshot.user_info.discount),
            gateway: data.gateway.clone(),
            transaction_id: data.transaction_id.clone(),
            mode: data
                .mode
                .as_deref()
                .map(PaymentMode::parse)
                .unwrap_or_default(),
            ip: data.ip.clone(),
            created_at: row.created_at,
            completed_at,
            parent: row.parent,
            unlimited_downloads: data.unlimited_downloads,
            pending: PendingChanges::default(),
        }
    }

    /// Moves the payment to a new status. No-op (returning false) when
    /// the normalized status equals the current one; otherwise the
    /// previous status is captured for save-time reconciliation.
    pub fn set_status(&mut self, status: impl Into<PaymentStatus>) -> bool {
        let status = status.into();
        if status == self.status {
            return false;
        }
        self.previous_status = Some(self.status.clone());
        match status {
            PaymentStatus::Published => {
                self.completed_at = Some(Utc::now());
                self.pending.mark(PaymentField::CompletedDate);
            }
            PaymentStatus::Pending => {
                self.completed_at = None;
                self.pending.mark(PaymentField::CompletedDate);
            }
            _ => {}
        }
        self.status = status;
        self.pending.mark(PaymentField::Status);
        true
    }

    pub fn set_gateway(&mut self, gateway: impl Into<String>) {
        self.gateway = Some(gateway.into());
        self.pending.mark(PaymentField::Gateway);
    }

    pub fn set_mode(&mut self, mode: PaymentMode) {
        self.mode = mode;
        self.pending.mark(PaymentField::Mode);
    }

    pub fn set_transaction_id(&mut self, transaction_id: impl Into<String>) {
        self.transaction_id = Some(transaction_id.into());
        self.pending.mark(PaymentField::TransactionId);
    }

    pub fn set_ip(&mut self, ip: impl Into<String>) {
        self.ip = Some(ip.into());
        self.pending.mark(PaymentField::Ip);
    }

    pub fn set_customer_id(&mut self, customer_id: CustomerId) {
        self.customer_id = Some(customer_id);
        self.pending.mark(PaymentField::CustomerId);
    }

    pub fn set_user_id(&mut self, user_id: u64) {
        self.user_id = Some(user_id);
        self.pending.mark(PaymentField::UserId);
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = Some(email.into());
        self.pending.mark(PaymentField::Email);
    }

    pub fn set_first_name(&mut self, first_name: impl Into<String>) {
        self.first_name = first_name.into();
        self.pending.mark(PaymentField::FirstName);
    }

    pub fn set_last_name(&mut self, last_name: impl Into<String>) {
        self.last_name = last_name.into();
        self.pending.mark(PaymentField::LastName);
    }

    pub fn set_discounts(&mut self, discounts: DiscountCodes) {
        self.discounts = discounts;
        self.pending.mark(PaymentField::Discounts);
    }

    pub fn set_address(&mut self, address: Address) {
        self.address = address;
        self.pending.mark(PaymentField::Address);
    }

    pub fn set_currency(&mut self, currency: impl Into<String>) {
        self.currency = currency.into();
        self.pending.mark(PaymentField::Currency);
    }

    pub fn set_created_at(&mut self, created_at: DateTime<Utc>) {
        self.created_at = created_at;
        self.pending.mark(PaymentField::CreatedAt);
    }

    pub fn set_parent(&mut self, parent: Option<PaymentId>) {
        self.parent = parent;
        self.pending.mark(PaymentField::ParentPayment);
    }

    pub fn set_unlimited_downloads(&mut self, unlimited: bool) {
        self.unlimited_downloads = unlimited;
        self.pending.mark(PaymentField::UnlimitedDownloads);
    }

    /// Stamps the store id after the first persist. Never reassigned.
    pub(crate) fn assign_id(&mut self, id: PaymentId) {
        if self.id.is_none() {
            self.id = Some(id);
        }
    }

    /// Stamps the purchase key generated at first persist.
    pub(crate) fn assign_key(&mut self, key: String) {
        if self.key.is_none() {
            self.key = Some(key);
            self.pending.mark(PaymentField::Key);
        }
    }

    /// Fills a missing email during hydration without dirtying the
    /// journal.
    pub(crate) fn backfill_email(&mut self, email: String) {
        if self.email.is_none() {
            self.email = Some(email);
        }
    }

    pub fn id(&self) -> Option<PaymentId> {
        self.id
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn status(&self) -> &PaymentStatus {
        &self.status
    }

    pub fn previous_status(&self) -> Option<&PaymentStatus> {
        self.previous_status.as_ref()
    }

    /// Human-facing status label, derived rather than stored.
    pub fn display_status(&self) -> String {
        self.status.label()
    }

    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    pub fn tax(&self) -> Money {
        self.tax
    }

    pub fn fees_total(&self) -> Money {
        self.fees_total
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn cart_details(&self) -> &[CartLine] {
        &self.cart_details
    }

    pub fn downloads(&self) -> &[DownloadRef] {
        &self.downloads
    }

    pub fn customer_id(&self) -> Option<CustomerId> {
        self.customer_id
    }

    pub fn user_id(&self) -> Option<u64> {
        self.user_id
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn discounts(&self) -> &DiscountCodes {
        &self.discounts
    }

    pub fn gateway(&self) -> Option<&str> {
        self.gateway.as_deref()
    }

    pub fn transaction_id(&self) -> Option<&str> {
        self.transaction_id.as_deref()
    }

    pub fn mode(&self) -> PaymentMode {
        self.mode
    }

    pub fn ip(&self) -> Option<&str> {
        self.ip.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn parent(&self) -> Option<PaymentId> {
        self.parent
    }

    pub fn unlimited_downloads(&self) -> bool {
        self.unlimited_downloads
    }

    pub fn pending(&self) -> &PendingChanges {
        &self.pending
    }

    pub(crate) fn pending_mut(&mut self) -> &mut PendingChanges {
        &mut self.pending
    }
}
