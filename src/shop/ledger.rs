//! The shop ledger: item catalog plus per-user purchase receipts.
//!
//! Both stores are loaded once when the ledger is constructed, held in memory,
//! and rewritten in full after every change. Write failures are logged and do
//! not fail the operation; the in-memory state stays authoritative until the
//! next successful save.
//!
//! Purchases debit the [`BalanceProvider`] first and record the receipt second.
//! The two are independent writes, so a failure in between leaves a charge
//! without a receipt.

use chrono::Utc;
use icu_collator::options::{CollatorOptions, Strength};
use icu_collator::{Collator, CollatorBorrowed};
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use super::economy::BalanceProvider;
use super::persist::{read_json_or_default, write_json};
use super::types::{ItemsFile, Receipt, ReceiptsFile, ShopItem};
use crate::config::ShopConfig;
use crate::logutil::escape_log;

/// Length of generated receipt identifiers.
pub const RECEIPT_ID_LEN: usize = 10;

/// Result of [`ShopLedger::delete_item`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Number of entries that carried the name
    Removed(usize),
    NotFound,
}

/// Result of [`ShopLedger::buy_item`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseOutcome {
    Purchased { receipt_id: String, price: u64 },
    NotFound,
    InsufficientFunds { price: u64, balance: u64 },
    /// The balance provider refused the debit; nothing was recorded.
    DebitFailed(String),
}

pub struct ShopLedger {
    items_path: PathBuf,
    receipts_path: PathBuf,
    items: Vec<ShopItem>,
    receipts: ReceiptsFile,
}

/// Root-locale collator at tertiary strength: accents and case only break
/// ties, lowercase before uppercase.
fn name_collator() -> Option<CollatorBorrowed<'static>> {
    let mut options = CollatorOptions::default();
    options.strength = Some(Strength::Tertiary);
    match Collator::try_new(Default::default(), options) {
        Ok(collator) => Some(collator),
        Err(e) => {
            log::warn!("shop: collation data unavailable, sorting by code point: {}", e);
            None
        }
    }
}

fn compare_names(collator: Option<&CollatorBorrowed<'_>>, a: &str, b: &str) -> Ordering {
    match collator {
        Some(c) => c.compare(a, b).then_with(|| a.cmp(b)),
        None => a.cmp(b),
    }
}

impl ShopLedger {
    /// Load both stores. Missing documents start empty.
    pub fn load(items_path: impl Into<PathBuf>, receipts_path: impl Into<PathBuf>) -> Self {
        let items_path = items_path.into();
        let receipts_path = receipts_path.into();
        let items: ItemsFile = read_json_or_default(&items_path);
        let receipts: ReceiptsFile = read_json_or_default(&receipts_path);
        log::info!(
            "shop: loaded {} items and receipts for {} users",
            items.items.len(),
            receipts.len()
        );
        Self {
            items_path,
            receipts_path,
            items: items.items,
            receipts,
        }
    }

    pub fn from_config(config: &ShopConfig) -> Self {
        Self::load(config.items_path(), config.receipts_path())
    }

    pub fn items_path(&self) -> &Path {
        &self.items_path
    }

    pub fn receipts_path(&self) -> &Path {
        &self.receipts_path
    }

    /// Rewrite the item document. Returns false (after logging) on failure.
    pub fn save_items(&self) -> bool {
        let doc = ItemsFile {
            items: self.items.clone(),
        };
        match write_json(&self.items_path, &doc) {
            Ok(()) => true,
            Err(e) => {
                log::error!("shop: failed to save items to {:?}: {}", self.items_path, e);
                false
            }
        }
    }

    /// Rewrite the receipts document. Returns false (after logging) on failure.
    pub fn save_receipts(&self) -> bool {
        match write_json(&self.receipts_path, &self.receipts) {
            Ok(()) => true,
            Err(e) => {
                log::error!(
                    "shop: failed to save receipts to {:?}: {}",
                    self.receipts_path,
                    e
                );
                false
            }
        }
    }

    /// All items, ordered by name.
    pub fn list_items(&self) -> Vec<ShopItem> {
        let collator = name_collator();
        let mut items = self.items.clone();
        items.sort_by(|a, b| compare_names(collator.as_ref(), &a.name, &b.name));
        items
    }

    /// First item whose name matches exactly.
    pub fn find_item(&self, name: &str) -> Option<&ShopItem> {
        self.items.iter().find(|item| item.name == name)
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn receipt_count(&self) -> usize {
        self.receipts.values().map(Vec::len).sum()
    }

    /// Add an item. Names are not checked for duplicates; callers validate input.
    pub fn add_item(&mut self, name: &str, price: u64, description: &str) {
        self.items.push(ShopItem::new(name, price, description));
        log::info!("shop: added item {} at {}", escape_log(name), price);
        self.save_items();
    }

    /// Remove every item named exactly `name`.
    pub fn delete_item(&mut self, name: &str) -> DeleteOutcome {
        let before = self.items.len();
        self.items.retain(|item| item.name != name);
        let removed = before - self.items.len();
        if removed == 0 {
            return DeleteOutcome::NotFound;
        }
        log::info!("shop: deleted {} item(s) named {}", removed, escape_log(name));
        self.save_items();
        DeleteOutcome::Removed(removed)
    }

    /// Buy the first item named `item_name` for `user_id`.
    pub fn buy_item<B>(&mut self, balances: &mut B, user_id: &str, item_name: &str) -> PurchaseOutcome
    where
        B: BalanceProvider + ?Sized,
    {
        let Some(item) = self.find_item(item_name).cloned() else {
            return PurchaseOutcome::NotFound;
        };

        let balance = balances.balance(user_id);
        if balance < item.price {
            return PurchaseOutcome::InsufficientFunds {
                price: item.price,
                balance,
            };
        }

        let memo = format!("Purchased {} from the shop", item.name);
        if let Err(e) = balances.debit(user_id, item.price, &memo) {
            log::warn!(
                "shop: debit of {} for {} refused: {}",
                item.price,
                escape_log(user_id),
                e
            );
            return PurchaseOutcome::DebitFailed(e.to_string());
        }

        let receipt = Receipt {
            receipt_id: self.generate_receipt_id(),
            user_id: user_id.to_string(),
            timestamp: Utc::now().timestamp_millis(),
            item_name: item.name.clone(),
            amount: item.price,
        };
        let receipt_id = receipt.receipt_id.clone();
        self.receipts
            .entry(user_id.to_string())
            .or_default()
            .insert(0, receipt);
        log::info!(
            "shop: {} bought {} for {} (receipt {})",
            escape_log(user_id),
            escape_log(&item.name),
            item.price,
            receipt_id
        );
        self.save_receipts();

        PurchaseOutcome::Purchased {
            receipt_id,
            price: item.price,
        }
    }

    /// A user's receipts, most recent first.
    pub fn user_receipts(&self, user_id: &str) -> Vec<Receipt> {
        self.receipts.get(user_id).cloned().unwrap_or_default()
    }

    /// Receipts across all users, newest first. With `user_filter` the
    /// user's list comes back exactly as [`Self::user_receipts`] returns it.
    pub fn all_receipts(&self, user_filter: Option<&str>) -> Vec<Receipt> {
        if let Some(user) = user_filter {
            return self.user_receipts(user);
        }
        let mut all: Vec<Receipt> = self.receipts.values().flatten().cloned().collect();
        all.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        all
    }

    fn generate_receipt_id(&self) -> String {
        let mut rng = rand::thread_rng();
        loop {
            let id: String = (&mut rng)
                .sample_iter(&Alphanumeric)
                .take(RECEIPT_ID_LEN)
                .map(char::from)
                .collect();
            let taken = self
                .receipts
                .values()
                .flatten()
                .any(|r| r.receipt_id == id);
            if !taken {
                return id;
            }
        }
    }
}
