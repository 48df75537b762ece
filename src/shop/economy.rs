//! Currency collaborator used by purchases.
//!
//! The shop never owns balances. It reads and debits them through
//! [`BalanceProvider`], which a host implements over its own currency ledger.
//! [`WalletFile`] is a small JSON-backed provider for hosts without one, and a
//! plain `HashMap<String, u64>` works as an in-memory provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::persist::{read_json_or_default, write_json};
use crate::logutil::escape_log;

/// Entries kept per wallet history; older ones are dropped first.
pub const HISTORY_LIMIT: usize = 50;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EconomyError {
    #[error("insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds { balance: u64, requested: u64 },

    #[error("amount must be greater than zero")]
    ZeroAmount,

    #[error("balance would overflow")]
    Overflow,
}

/// Balance operations the shop needs from the host economy.
pub trait BalanceProvider {
    /// Current balance; unknown users have whatever the provider starts them with.
    fn balance(&self, user_id: &str) -> u64;

    /// Remove `amount` from the user's balance, recording `memo` where supported.
    fn debit(&mut self, user_id: &str, amount: u64, memo: &str) -> Result<(), EconomyError>;

    /// Add `amount` to the user's balance and return the new balance.
    fn credit(&mut self, user_id: &str, amount: u64, memo: &str) -> Result<u64, EconomyError>;
}

impl BalanceProvider for HashMap<String, u64> {
    fn balance(&self, user_id: &str) -> u64 {
        self.get(user_id).copied().unwrap_or(0)
    }

    fn debit(&mut self, user_id: &str, amount: u64, _memo: &str) -> Result<(), EconomyError> {
        let balance = self.balance(user_id);
        let remaining = balance
            .checked_sub(amount)
            .ok_or(EconomyError::InsufficientFunds { balance, requested: amount })?;
        self.insert(user_id.to_string(), remaining);
        Ok(())
    }

    fn credit(&mut self, user_id: &str, amount: u64, _memo: &str) -> Result<u64, EconomyError> {
        let updated = self
            .balance(user_id)
            .checked_add(amount)
            .ok_or(EconomyError::Overflow)?;
        self.insert(user_id.to_string(), updated);
        Ok(updated)
    }
}

/// One balance change in a wallet's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletEntry {
    pub timestamp: DateTime<Utc>,
    /// Signed change applied to the balance
    pub delta: i64,
    pub memo: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Wallet {
    pub balance: u64,
    #[serde(default)]
    pub history: Vec<WalletEntry>,
}

/// On-disk schema: `{ "wallets": { "<userId>": { balance, history } } }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalletsFile {
    #[serde(default)]
    pub wallets: HashMap<String, Wallet>,
}

/// JSON-file balance provider. Every change rewrites the whole document.
pub struct WalletFile {
    path: PathBuf,
    starting_balance: u64,
    data: WalletsFile,
}

impl WalletFile {
    /// Load wallets from `path`; a missing file starts empty.
    pub fn open(path: impl Into<PathBuf>, starting_balance: u64) -> Self {
        let path = path.into();
        let data: WalletsFile = read_json_or_default(&path);
        log::debug!("economy: loaded {} wallets from {:?}", data.wallets.len(), path);
        Self {
            path,
            starting_balance,
            data,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Recent balance changes for a user, oldest first.
    pub fn history(&self, user_id: &str) -> &[WalletEntry] {
        self.data
            .wallets
            .get(user_id)
            .map(|w| w.history.as_slice())
            .unwrap_or(&[])
    }

    pub fn wallet_count(&self) -> usize {
        self.data.wallets.len()
    }

    fn wallet_mut(&mut self, user_id: &str) -> &mut Wallet {
        let starting = self.starting_balance;
        self.data
            .wallets
            .entry(user_id.to_string())
            .or_insert_with(|| Wallet {
                balance: starting,
                history: Vec::new(),
            })
    }

    fn apply(&mut self, user_id: &str, balance: u64, delta: i64, memo: &str) {
        let wallet = self.wallet_mut(user_id);
        wallet.balance = balance;
        wallet.history.push(WalletEntry {
            timestamp: Utc::now(),
            delta,
            memo: memo.to_string(),
        });
        if wallet.history.len() > HISTORY_LIMIT {
            let excess = wallet.history.len() - HISTORY_LIMIT;
            wallet.history.drain(..excess);
        }
        self.save();
    }

    fn save(&self) {
        if let Err(e) = write_json(&self.path, &self.data) {
            log::error!("economy: failed to persist wallets to {:?}: {}", self.path, e);
        }
    }
}

impl BalanceProvider for WalletFile {
    fn balance(&self, user_id: &str) -> u64 {
        self.data
            .wallets
            .get(user_id)
            .map(|w| w.balance)
            .unwrap_or(self.starting_balance)
    }

    fn debit(&mut self, user_id: &str, amount: u64, memo: &str) -> Result<(), EconomyError> {
        if amount == 0 {
            return Err(EconomyError::ZeroAmount);
        }
        let balance = self.balance(user_id);
        let remaining = balance
            .checked_sub(amount)
            .ok_or(EconomyError::InsufficientFunds { balance, requested: amount })?;
        let delta = i64::try_from(amount).map_err(|_| EconomyError::Overflow)?;
        self.apply(user_id, remaining, -delta, memo);
        log::info!(
            "economy: debited {} from {} ({})",
            amount,
            escape_log(user_id),
            escape_log(memo)
        );
        Ok(())
    }

    fn credit(&mut self, user_id: &str, amount: u64, memo: &str) -> Result<u64, EconomyError> {
        if amount == 0 {
            return Err(EconomyError::ZeroAmount);
        }
        let updated = self
            .balance(user_id)
            .checked_add(amount)
            .ok_or(EconomyError::Overflow)?;
        let delta = i64::try_from(amount).map_err(|_| EconomyError::Overflow)?;
        self.apply(user_id, updated, delta, memo);
        log::info!(
            "economy: credited {} to {} ({})",
            amount,
            escape_log(user_id),
            escape_log(memo)
        );
        Ok(updated)
    }
}
