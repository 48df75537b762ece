//! Records held by the shop ledger and their on-disk document shapes.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An item offered in the shop. The name doubles as its key and display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopItem {
    pub name: String,
    pub price: u64,
    pub description: String,
}

impl ShopItem {
    pub fn new(name: impl Into<String>, price: u64, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            price,
            description: description.into(),
        }
    }
}

/// Proof of a completed purchase.
///
/// `item_name` and `amount` are copied from the item when it is bought, so a
/// receipt keeps describing the sale after the item is deleted or re-added at
/// another price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub receipt_id: String,
    pub user_id: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    pub item_name: String,
    pub amount: u64,
}

impl Receipt {
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp).single()
    }
}

/// Item list document: `{ "items": [ ... ] }`.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ItemsFile {
    #[serde(default)]
    pub items: Vec<ShopItem>,
}

/// Receipts document: user id to that user's receipts, most recent first.
pub type ReceiptsFile = HashMap<String, Vec<Receipt>>;
