//! Value objects for the payment domain.

use serde::{Deserialize, Serialize};

/// Billing address attached to a payment. All parts optional.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// Discount codes applied to a payment.
///
/// Persisted as a single string: the sentinel `"none"` or a
/// comma-separated code list, which is what historical records carry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DiscountCodes {
    /// No discount was applied.
    #[default]
    None,

    /// One or more discount codes.
    Codes(Vec<String>),
}

impl DiscountCodes {
    /// Parses the persisted form: `"none"`, empty, or comma-separated.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("none") {
            return DiscountCodes::None;
        }
        let codes: Vec<String> = raw
            .split(',')
            .map(|code| code.trim().to_string())
            .filter(|code| !code.is_empty())
            .collect();
        if codes.is_empty() {
            DiscountCodes::None
        } else {
            DiscountCodes::Codes(codes)
        }
    }

    /// Returns the applied codes, empty for the sentinel.
    pub fn codes(&self) -> &[String] {
        match self {
            DiscountCodes::None => &[],
            DiscountCodes::Codes(codes) => codes,
        }
    }

    /// Returns true when no discount applies.
    pub fn is_none(&self) -> bool {
        matches!(self, DiscountCodes::None)
    }
}

impl std::fmt::Display for DiscountCodes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscountCodes::None => write!(f, "none"),
            DiscountCodes::Codes(codes) => write!(f, "{}", codes.join(",")),
        }
    }
}

impl From<String> for DiscountCodes {
    fn from(raw: String) -> Self {
        DiscountCodes::parse(&raw)
    }
}

impl From<DiscountCodes> for String {
    fn from(codes: DiscountCodes) -> Self {
        codes.to_string()
    }
}

/// Whether the payment was taken against the live or test gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMode {
    #[default]
    Live,
    Test,
}

impl PaymentMode {
    /// Returns the wire form.
    pub fn as_wire(&self) -> &'static str {
        match self {
            PaymentMode::Live => "live",
            PaymentMode::Test => "test",
        }
    }

    /// Parses the wire form; anything but `"test"` is live.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("test") {
            PaymentMode::Test
        } else {
            PaymentMode::Live
        }
    }
}
