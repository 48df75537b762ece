//! # Shop Module
//!
//! A virtual shop where users spend in-game currency on items. Each purchase
//! leaves an immutable [`Receipt`] in the buyer's history.
//!
//! ## Components
//!
//! - [`ledger`] - [`ShopLedger`], the only mutation path for items and receipts
//! - [`economy`] - [`BalanceProvider`] seam to the host currency ledger, plus [`WalletFile`]
//! - [`types`] - Records and their JSON document shapes
//! - [`persist`] - Locked whole-document JSON reads and writes
//!
//! ## Storage Layout
//!
//! ```text
//! data/
//! ├── shop.json            ← { "items": [ { name, price, description } ] }
//! ├── receipts.json        ← { "<userId>": [ { receiptId, userId, timestamp, itemName, amount } ] }
//! └── economy/wallets.json ← bundled balance provider
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::collections::HashMap;
//! use chatshop::shop::{PurchaseOutcome, ShopLedger};
//!
//! let mut ledger = ShopLedger::load("data/shop.json", "data/receipts.json");
//! ledger.add_item("Badge", 100, "Shiny");
//!
//! let mut balances: HashMap<String, u64> = HashMap::new();
//! balances.insert("alice".into(), 150);
//! if let PurchaseOutcome::Purchased { receipt_id, .. } = ledger.buy_item(&mut balances, "alice", "Badge") {
//!     println!("receipt {}", receipt_id);
//! }
//! ```

pub mod economy;
pub mod ledger;
pub mod persist;
pub mod types;

pub use economy::{BalanceProvider, EconomyError, WalletFile};
pub use ledger::{DeleteOutcome, PurchaseOutcome, ShopLedger, RECEIPT_ID_LEN};
pub use types::{ItemsFile, Receipt, ReceiptsFile, ShopItem};
