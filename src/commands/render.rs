//! Plain-text reply rendering for shop listings and receipts.

use crate::shop::{Receipt, ShopItem};

pub const HELP_TEXT: &str = "Shop commands:\n\
/shop - list items for sale\n\
/buyitem [item] - buy an item\n\
/receipts - show your receipts\n\
/shophelp - show this help\n\
Staff: /additem [name], [price], [description] - /deleteitem [name] - /receiptlogs [user]";

pub fn amount(value: u64, currency: &str) -> String {
    format!("{} {}", value, currency)
}

pub fn item_list(items: &[ShopItem], currency: &str) -> String {
    if items.is_empty() {
        return "The shop is empty.".to_string();
    }
    let mut out = String::from("Shop items:");
    for item in items {
        out.push_str(&format!(
            "\n{} ({}): {}",
            item.name,
            amount(item.price, currency),
            item.description
        ));
    }
    out
}

fn receipt_time(receipt: &Receipt) -> String {
    receipt
        .issued_at()
        .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| receipt.timestamp.to_string())
}

/// Receipts for one user; the user column is omitted.
pub fn own_receipts(receipts: &[Receipt], currency: &str) -> String {
    if receipts.is_empty() {
        return "You have no receipts.".to_string();
    }
    let mut out = String::from("Your receipts:");
    for r in receipts {
        out.push_str(&format!(
            "\n[{}] {} {} for {}",
            r.receipt_id,
            receipt_time(r),
            r.item_name,
            amount(r.amount, currency)
        ));
    }
    out
}

pub fn receipt_log(receipts: &[Receipt], filter: Option<&str>, currency: &str) -> String {
    if receipts.is_empty() {
        return match filter {
            Some(user) => format!("No receipts found for {}.", user),
            None => "No receipts found.".to_string(),
        };
    }
    let mut out = match filter {
        Some(user) => format!("Receipts for {}:", user),
        None => "All receipts:".to_string(),
    };
    for r in receipts {
        out.push_str(&format!(
            "\n[{}] {} {}: {} for {}",
            r.receipt_id,
            receipt_time(r),
            r.user_id,
            r.item_name,
            amount(r.amount, currency)
        ));
    }
    out
}
