//! Customer directory trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{CustomerId, Money, PaymentId};

use super::CollaboratorError;

/// Customer records and their lifetime statistics.
#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    /// Finds the customer for an email, creating one when absent.
    async fn find_or_create(
        &self,
        email: &str,
        user_id: Option<u64>,
    ) -> Result<CustomerId, CollaboratorError>;

    /// Links a payment to the customer's history.
    async fn attach_payment(
        &self,
        customer_id: CustomerId,
        payment_id: PaymentId,
    ) -> Result<(), CollaboratorError>;

    /// Raises the customer's lifetime value.
    async fn increase_value(
        &self,
        customer_id: CustomerId,
        amount: Money,
    ) -> Result<(), CollaboratorError>;

    /// Lowers the customer's lifetime value.
    async fn decrease_value(
        &self,
        customer_id: CustomerId,
        amount: Money,
    ) -> Result<(), CollaboratorError>;

    /// Lowers the customer's completed purchase count by one.
    async fn decrease_purchase_count(
        &self,
        customer_id: CustomerId,
    ) -> Result<(), CollaboratorError>;

    /// Email on file for the customer, when one exists.
    async fn email_of(&self, customer_id: CustomerId) -> Result<Option<String>, CollaboratorError>;
}

#[derive(Debug, Clone, Default)]
struct CustomerEntry {
    email: String,
    user_id: Option<u64>,
    payments: Vec<PaymentId>,
    value: Money,
    purchase_count: u32,
}

#[derive(Debug, Default)]
struct InMemoryCustomerState {
    customers: HashMap<CustomerId, CustomerEntry>,
    by_email: HashMap<String, CustomerId>,
    next_id: u64,
    fail_on_write: bool,
}

/// In-memory customer directory for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCustomerDirectory {
    state: Arc<RwLock<InMemoryCustomerState>>,
}

impl InMemoryCustomerDirectory {
    /// Creates an empty in-memory directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the directory to fail on the next mutating call.
    pub fn set_fail_on_write(&self, fail: bool) {
        self.state.write().unwrap().fail_on_write = fail;
    }

    /// Lifetime value currently on record.
    pub fn value_of(&self, customer_id: CustomerId) -> Money {
        self.state
            .read()
            .unwrap()
            .customers
            .get(&customer_id)
            .map(|entry| entry.value)
            .unwrap_or_else(Money::zero)
    }

    /// Completed purchase count currently on record.
    pub fn purchase_count_of(&self, customer_id: CustomerId) -> u32 {
        self.state
            .read()
            .unwrap()
            .customers
            .get(&customer_id)
            .map(|entry| entry.purchase_count)
            .unwrap_or_default()
    }

    /// Site user account linked at creation time, when any.
    pub fn user_id_of(&self, customer_id: CustomerId) -> Option<u64> {
        self.state
            .read()
            .unwrap()
            .customers
            .get(&customer_id)
            .and_then(|entry| entry.user_id)
    }

    /// Payments attached to the customer.
    pub fn payments_of(&self, customer_id: CustomerId) -> Vec<PaymentId> {
        self.state
            .read()
            .unwrap()
            .customers
            .get(&customer_id)
            .map(|entry| entry.payments.clone())
            .unwrap_or_default()
    }

    /// Bumps the purchase count, simulating a completed purchase.
    pub fn record_purchase(&self, customer_id: CustomerId) {
        if let Some(entry) = self
            .state
            .write()
            .unwrap()
            .customers
            .get_mut(&customer_id)
        {
            entry.purchase_count += 1;
        }
    }
}

impl InMemoryCustomerState {
    fn check_writable(&self) -> Result<(), CollaboratorError> {
        if self.fail_on_write {
            Err(CollaboratorError::Customers(
                "Customer directory unavailable".to_string(),
            ))
        } else {
            Ok(())
        }
    }

    fn entry_mut(
        &mut self,
        customer_id: CustomerId,
    ) -> Result<&mut CustomerEntry, CollaboratorError> {
        self.customers.get_mut(&customer_id).ok_or_else(|| {
            CollaboratorError::Customers(format!("Unknown customer {customer_id}"))
        })
    }
}

#[async_trait]
impl CustomerDirectory for InMemoryCustomerDirectory {
    async fn find_or_create(
        &self,
        email: &str,
        user_id: Option<u64>,
    ) -> Result<CustomerId, CollaboratorError> {
        let mut state = self.state.write().unwrap();
        state.check_writable()?;

        if let Some(id) = state.by_email.get(email) {
            return Ok(*id);
        }
        state.next_id += 1;
        let id = CustomerId::new(state.next_id);
        state.customers.insert(
            id,
            CustomerEntry {
                email: email.to_string(),
                user_id,
                ..Default::default()
            },
        );
        state.by_email.insert(email.to_string(), id);
        Ok(id)
    }

    async fn attach_payment(
        &self,
        customer_id: CustomerId,
        payment_id: PaymentId,
    ) -> Result<(), CollaboratorError> {
        let mut state = self.state.write().unwrap();
        state.check_writable()?;
        let entry = state.entry_mut(customer_id)?;
        if !entry.payments.contains(&payment_id) {
            entry.payments.push(payment_id);
        }
        Ok(())
    }

    async fn increase_value(
        &self,
        customer_id: CustomerId,
        amount: Money,
    ) -> Result<(), CollaboratorError> {
        let mut state = self.state.write().unwrap();
        state.check_writable()?;
        let entry = state.entry_mut(customer_id)?;
        entry.value += amount;
        Ok(())
    }

    async fn decrease_value(
        &self,
        customer_id: CustomerId,
        amount: Money,
    ) -> Result<(), CollaboratorError> {
        let mut state = self.state.write().unwrap();
        state.check_writable()?;
        let entry = state.entry_mut(customer_id)?;
        entry.value = entry.value.saturating_sub(amount);
        Ok(())
    }

    async fn decrease_purchase_count(
        &self,
        customer_id: CustomerId,
    ) -> Result<(), CollaboratorError> {
        let mut state = self.state.write().unwrap();
        state.check_writable()?;
        let entry = state.entry_mut(customer_id)?;
        entry.purchase_count = entry.purchase_count.saturating_sub(1);
        Ok(())
    }

    async fn email_of(&self, customer_id: CustomerId) -> Result<Option<String>, CollaboratorError> {
        let state = self.state.read().unwrap();
        Ok(state
            .customers
            .get(&customer_id)
            .map(|entry| entry.email.clone()))
    }
}
