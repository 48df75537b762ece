//! # Configuration Management Module
//!
//! Centralized, TOML-backed configuration for the shop ledger, the gist file
//! bridge, the command surface and logging.
//!
//! ## Configuration Structure
//!
//! - [`ShopConfig`] - Data directory and store file names
//! - [`GistConfig`] - Snippet API endpoint, credential source and access allow-list
//! - [`CommandsConfig`] - Command prefix and currency naming used in replies
//! - [`LoggingConfig`] - Log level, optional log file and security log file
//!
//! Every section carries serde defaults, so a partial (or empty) file loads.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use chatshop::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     println!("Items file: {}", config.shop.items_path().display());
//!
//!     Config::create_default("config.toml").await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration File Format
//!
//! ```toml
//! [shop]
//! data_dir = "./data"
//! items_file = "shop.json"
//! receipts_file = "receipts.json"
//!
//! [gist]
//! token_env = "GITHUB_GIST_TOKEN"
//! dev_room = "development"
//! allowed_users = ["sysop"]
//! ```
//!
//! The snippet API credential is never stored in this file. It is read from the
//! environment variable named by `gist.token_env` at the time of each upload.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub shop: ShopConfig,
    #[serde(default)]
    pub gist: GistConfig,
    #[serde(default)]
    pub commands: CommandsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopConfig {
    pub data_dir: String,
    /// Item list document, relative to `data_dir`
    #[serde(default = "default_items_file")]
    pub items_file: String,
    /// Receipts document, relative to `data_dir`
    #[serde(default = "default_receipts_file")]
    pub receipts_file: String,
    /// Wallet document used by the bundled balance provider, relative to `data_dir`
    #[serde(default = "default_wallets_file")]
    pub wallets_file: String,
    /// Balance granted to a wallet the first time it is seen
    #[serde(default)]
    pub starting_balance: u64,
}

fn default_items_file() -> String {
    "shop.json".to_string()
}

fn default_receipts_file() -> String {
    "receipts.json".to_string()
}

fn default_wallets_file() -> String {
    "economy/wallets.json".to_string()
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
            items_file: default_items_file(),
            receipts_file: default_receipts_file(),
            wallets_file: default_wallets_file(),
            starting_balance: 0,
        }
    }
}

impl ShopConfig {
    pub fn items_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join(&self.items_file)
    }

    pub fn receipts_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join(&self.receipts_file)
    }

    pub fn wallets_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join(&self.wallets_file)
    }
}

/// Settings for the gist file bridge and its access gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GistConfig {
    /// Base URL of the snippet REST API (no trailing slash)
    pub api_base: String,
    /// Only raw URLs starting with this prefix may be downloaded
    pub raw_url_prefix: String,
    /// Name of the environment variable holding the API token
    pub token_env: String,
    /// Room in which the file commands are accepted
    pub dev_room: String,
    /// User ids permitted to run the file commands
    #[serde(default)]
    pub allowed_users: Vec<String>,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
    pub user_agent: String,
}

impl Default for GistConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            raw_url_prefix: "https://gist.githubusercontent.com/".to_string(),
            token_env: "GITHUB_GIST_TOKEN".to_string(),
            dev_room: "development".to_string(),
            allowed_users: Vec::new(),
            timeout_seconds: 15,
            user_agent: format!("chatshop/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandsConfig {
    /// Prefix for regular commands. `!` always requests a broadcast reply.
    pub prefix: String,
    /// Currency name used in replies (plural form)
    pub currency_name: String,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            prefix: "/".to_string(),
            currency_name: "bucks".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    /// Separate sink for refused file-command attempts (log target `security`)
    #[serde(default)]
    pub security_file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: Some("chatshop.log".to_string()),
            security_file: Some("chatshop-security.log".to_string()),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }
}
