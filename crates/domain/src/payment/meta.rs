//! Metadata snapshot and the meta key catalog.

use common::Money;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::cart::{CartLine, DownloadRef};
use super::fees::FeeEntry;
use super::value_objects::Address;
use super::Payment;

/// Meta keys a payment writes. String-keyed storage survives from the
/// records this model replaces, so the names are fixed.
pub mod keys {
    pub const SNAPSHOT: &str = "payment_meta";
    pub const TOTAL: &str = "payment_total";
    pub const TAX: &str = "payment_tax";
    pub const GATEWAY: &str = "payment_gateway";
    pub const MODE: &str = "payment_mode";
    pub const TRANSACTION_ID: &str = "payment_transaction_id";
    pub const USER_IP: &str = "payment_user_ip";
    pub const CUSTOMER_ID: &str = "payment_customer_id";
    pub const USER_ID: &str = "payment_user_id";
    pub const USER_EMAIL: &str = "payment_user_email";
    pub const PURCHASE_KEY: &str = "payment_purchase_key";
    pub const COMPLETED_DATE: &str = "completed_date";
    pub const UNLIMITED_DOWNLOADS: &str = "unlimited_downloads";
}

/// Buyer identity block embedded in the snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub discount: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
}

/// The structured blob stored under [`keys::SNAPSHOT`].
///
/// Old records may carry only `amount`/`tax` here, which hydration
/// falls back to when the dedicated meta values are missing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PaymentSnapshot {
    #[serde(default)]
    pub downloads: Vec<DownloadRef>,
    #[serde(default)]
    pub cart_details: Vec<CartLine>,
    #[serde(default)]
    pub fees: Vec<FeeEntry>,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub user_info: UserInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax: Option<Money>,
}

/// Merges a freshly built snapshot over the stored one, key by key.
/// Keys only the stored blob knows about survive the merge.
pub fn merge_snapshot(stored: Option<Value>, new: Value) -> Value {
    match (stored, new) {
        (Some(Value::Object(mut merged)), Value::Object(fresh)) => {
            for (key, value) in fresh {
                merged.insert(key, value);
            }
            Value::Object(merged)
        }
        (_, new) => new,
    }
}

impl Payment {
    /// Builds the snapshot from current aggregate state.
    pub fn snapshot(&self) -> PaymentSnapshot {
        PaymentSnapshot {
            downloads: self.downloads().to_vec(),
            cart_details: self.cart_details().to_vec(),
            fees: self.fees(None).into_iter().map(|(_, fee)| fee.clone()).collect(),
            currency: self.currency().to_string(),
            user_info: UserInfo {
                id: self.user_id(),
                email: self.email().unwrap_or_default().to_string(),
                first_name: self.first_name().to_string(),
                last_name: self.last_name().to_string(),
                discount: self.discounts().to_string(),
                address: Some(self.address().clone()),
            },
            key: self.key().map(str::to_string),
            email: self.email().map(str::to_string),
            date: Some(self.created_at().to_rfc3339()),
            amount: None,
            tax: None,
        }
    }
}
