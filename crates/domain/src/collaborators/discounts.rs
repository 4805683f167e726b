//! Discount code usage tracking.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use super::CollaboratorError;

/// Usage counters for discount codes.
#[async_trait]
pub trait DiscountRegistry: Send + Sync {
    /// Gives back one use of the code, as when a discounted payment
    /// fails. Unknown codes are ignored.
    async fn decrease_usage(&self, code: &str) -> Result<(), CollaboratorError>;
}

#[derive(Debug, Default)]
struct InMemoryDiscountState {
    usage: HashMap<String, u32>,
    fail_on_write: bool,
}

/// In-memory discount registry for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDiscountRegistry {
    state: Arc<RwLock<InMemoryDiscountState>>,
}

impl InMemoryDiscountRegistry {
    /// Creates an empty in-memory registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the registry to fail on the next mutating call.
    pub fn set_fail_on_write(&self, fail: bool) {
        self.state.write().unwrap().fail_on_write = fail;
    }

    /// Seeds a code with a use count.
    pub fn set_usage(&self, code: &str, count: u32) {
        self.state.write().unwrap().usage.insert(code.to_string(), count);
    }

    /// Current use count for a code.
    pub fn usage_of(&self, code: &str) -> u32 {
        self.state
            .read()
            .unwrap()
            .usage
            .get(code)
            .copied()
            .unwrap_or_default()
    }
}

#[async_trait]
impl DiscountRegistry for InMemoryDiscountRegistry {
    async fn decrease_usage(&self, code: &str) -> Result<(), CollaboratorError> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_write {
            return Err(CollaboratorError::Discounts(
                "Discount registry unavailable".to_string(),
            ));
        }
        if let Some(count) = state.usage.get_mut(code) {
            *count = count.saturating_sub(1);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_decrease_usage_clamps_at_zero() {
        let registry = InMemoryDiscountRegistry::new();
        registry.set_usage("SAVE10", 2);

        registry.decrease_usage("SAVE10").await.unwrap();
        assert_eq!(registry.usage_of("SAVE10"), 1);

        registry.decrease_usage("SAVE10").await.unwrap();
        registry.decrease_usage("SAVE10").await.unwrap();
        assert_eq!(registry.usage_of("SAVE10"), 0);
    }

    #[tokio::test]
    async fn test_unknown_code_is_ignored() {
        let registry = InMemoryDiscountRegistry::new();
        registry.decrease_usage("GHOST").await.unwrap();
        assert_eq!(registry.usage_of("GHOST"), 0);
    }
}
