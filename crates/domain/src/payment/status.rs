//! Payment status state machine.

use serde::{Deserialize, Serialize};

/// The status of a payment.
///
/// `Published` is the canonical "paid" state; the aliases `complete`,
/// `completed` and the legacy `publish` all normalize to it when parsed.
/// Statuses outside the five well-known ones are carried verbatim as
/// `Custom` and treated uniformly: they trigger no reconciliation and
/// never count toward statistics.
///
/// There is no distinguished terminal state; transitions are
/// caller-driven through [`Payment::set_status`](super::Payment::set_status).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum PaymentStatus {
    /// Payment has been recorded but not completed.
    #[default]
    Pending,

    /// Payment completed; statistics have been counted.
    Published,

    /// Payment was refunded after completion.
    Refunded,

    /// Payment failed at the gateway.
    Failed,

    /// Access was revoked after completion.
    Revoked,

    /// Any other status, carried verbatim.
    Custom(String),
}

impl PaymentStatus {
    /// Parses a wire status string, normalizing completion aliases.
    pub fn parse(status: &str) -> Self {
        match status.trim().to_ascii_lowercase().as_str() {
            "pending" => PaymentStatus::Pending,
            "published" | "publish" | "complete" | "completed" => PaymentStatus::Published,
            "refunded" => PaymentStatus::Refunded,
            "failed" => PaymentStatus::Failed,
            "revoked" => PaymentStatus::Revoked,
            other => PaymentStatus::Custom(other.to_string()),
        }
    }

    /// Returns the canonical wire form of the status.
    pub fn as_wire(&self) -> &str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Published => "published",
            PaymentStatus::Refunded => "refunded",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Revoked => "revoked",
            PaymentStatus::Custom(s) => s,
        }
    }

    /// Returns the display label shown for this status.
    pub fn label(&self) -> String {
        match self {
            PaymentStatus::Pending => "Pending".to_string(),
            PaymentStatus::Published => "Complete".to_string(),
            PaymentStatus::Refunded => "Refunded".to_string(),
            PaymentStatus::Failed => "Failed".to_string(),
            PaymentStatus::Revoked => "Revoked".to_string(),
            PaymentStatus::Custom(s) => {
                let mut chars = s.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            }
        }
    }

    /// Returns true for statuses under which statistics have been
    /// counted, requiring a matching decrement if later reversed.
    pub fn is_counted(&self) -> bool {
        matches!(self, PaymentStatus::Published | PaymentStatus::Revoked)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_wire())
    }
}

impl From<&str> for PaymentStatus {
    fn from(s: &str) -> Self {
        PaymentStatus::parse(s)
    }
}

impl From<String> for PaymentStatus {
    fn from(s: String) -> Self {
        PaymentStatus::parse(&s)
    }
}

impl From<PaymentStatus> for String {
    fn from(status: PaymentStatus) -> Self {
        status.as_wire().to_string()
    }
}
