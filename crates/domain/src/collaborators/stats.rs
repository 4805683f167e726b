//! Store-wide earnings statistics.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::Money;

use super::CollaboratorError;

/// Store-wide earnings totals and their derived caches.
#[async_trait]
pub trait StoreStats: Send + Sync {
    async fn increase_total_earnings(&self, amount: Money) -> Result<(), CollaboratorError>;

    async fn decrease_total_earnings(&self, amount: Money) -> Result<(), CollaboratorError>;

    /// Drops cached per-period earnings so they rebuild on next read.
    async fn invalidate_period_cache(&self) -> Result<(), CollaboratorError>;
}

#[derive(Debug, Default)]
struct InMemoryStatsState {
    total_earnings: Money,
    invalidations: u32,
    fail_on_write: bool,
}

/// In-memory store stats for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStoreStats {
    state: Arc<RwLock<InMemoryStatsState>>,
}

impl InMemoryStoreStats {
    /// Creates zeroed in-memory stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the stats to fail on the next mutating call.
    pub fn set_fail_on_write(&self, fail: bool) {
        self.state.write().unwrap().fail_on_write = fail;
    }

    /// Current store-wide earnings.
    pub fn total_earnings(&self) -> Money {
        self.state.read().unwrap().total_earnings
    }

    /// How many times the period cache was invalidated.
    pub fn invalidation_count(&self) -> u32 {
        self.state.read().unwrap().invalidations
    }
}

impl InMemoryStatsState {
    fn check_writable(&self) -> Result<(), CollaboratorError> {
        if self.fail_on_write {
            Err(CollaboratorError::Stats("Store stats unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl StoreStats for InMemoryStoreStats {
    async fn increase_total_earnings(&self, amount: Money) -> Result<(), CollaboratorError> {
        let mut state = self.state.write().unwrap();
        state.check_writable()?;
        state.total_earnings += amount;
        Ok(())
    }

    async fn decrease_total_earnings(&self, amount: Money) -> Result<(), CollaboratorError> {
        let mut state = self.state.write().unwrap();
        state.check_writable()?;
        state.total_earnings = state.total_earnings.saturating_sub(amount);
        Ok(())
    }

    async fn invalidate_period_cache(&self) -> Result<(), CollaboratorError> {
        let mut state = self.state.write().unwrap();
        state.check_writable()?;
        state.invalidations += 1;
        Ok(())
    }
}
