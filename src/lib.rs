//! # Chatshop - Shop and File Bridge Commands for Chat Servers
//!
//! Chatshop provides two independent command groups for a chat/game server:
//!
//! - **Shop**: users spend in-game currency on items listed by staff; every
//!   purchase is kept as an immutable receipt.
//! - **Gist file bridge**: allow-listed developers upload a server file to a
//!   private gist, or overwrite a server file from a gist's raw URL.
//!
//! The host keeps ownership of users, rooms, permissions and currency. It passes
//! a [`commands::CommandContext`] with each line and supplies balances through
//! [`shop::BalanceProvider`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chatshop::commands::{CommandContext, CommandProcessor};
//! use chatshop::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let processor = CommandProcessor::from_config(config);
//!
//!     let ctx = CommandContext::new("alice", "lobby", 1);
//!     if let Some(reply) = processor.process(&ctx, "/shop").await {
//!         println!("{}", reply.text);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`commands`] - Command parsing, access gating and reply rendering
//! - [`shop`] - Shop ledger, receipts and the balance provider seam
//! - [`gist`] - Snippet API client for file upload and download
//! - [`config`] - TOML configuration
//! - [`validation`] - Input validation and user id normalization
//! - [`logutil`] - Single-line escaping for log output
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │ CommandProcessor │ ← host hands it chat lines
//! └──────────────────┘
//!      │         │
//! ┌─────────┐ ┌────────────┐
//! │  Shop   │ │ GistBridge │ ← remote snippet API
//! │ Ledger  │ └────────────┘
//! └─────────┘
//!      │
//! ┌─────────────────┐
//! │ BalanceProvider │ ← host currency ledger
//! └─────────────────┘
//! ```

pub mod commands;
pub mod config;
pub mod gist;
pub mod logutil;
pub mod shop;
pub mod validation;
