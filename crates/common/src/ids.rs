use serde::{Deserialize, Serialize};

/// Unique identifier for a persisted payment record.
///
/// Assigned by the backing store on first persist; a payment that has
/// never been saved carries no id at all (`Option<PaymentId>` is `None`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentId(u64);

impl PaymentId {
    /// Creates a payment ID from a raw store value.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying numeric id.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for PaymentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for PaymentId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<PaymentId> for u64 {
    fn from(id: PaymentId) -> Self {
        id.0
    }
}

/// Unique identifier for a customer record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(u64);

impl CustomerId {
    /// Creates a customer ID from a raw store value.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying numeric id.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for CustomerId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Unique identifier for a catalog product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(u64);

impl ProductId {
    /// Creates a product ID.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying numeric id.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ProductId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Identifier of a priced variant of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceOptionId(u32);

impl PriceOptionId {
    /// Creates a price option ID.
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the underlying numeric id.
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for PriceOptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for PriceOptionId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}
