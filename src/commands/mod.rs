//! Chat command surface for the shop and the gist file bridge.
//!
//! The host hands each chat line to [CommandProcessor::process] together with a
//! [CommandContext] describing who sent it and where. Lines that are not
//! commands yield `None`; commands yield a rendered [Reply].
//!
//! Commands start with the configured prefix (`/` by default). Starting a
//! command with `!` instead asks for the reply to be broadcast to the room,
//! which only `shop`, `receipts` and `shophelp` allow.
//!
//! The file commands (`getfile`, `writefile`, `forcewritefile`) are gated on
//! room, console access and a user allow-list. A caller failing any of those
//! checks gets the same reply as for a command that does not exist.

pub mod render;
pub mod roles;

use log::info;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::gist::GistBridge;
use crate::logutil::escape_log;
use crate::shop::{BalanceProvider, DeleteOutcome, PurchaseOutcome, ShopLedger, WalletFile};
use crate::validation::{parse_price, to_id, validate_description, validate_item_name};
use render::amount;
use roles::{LEVEL_CONSOLE, LEVEL_DRIVER, LEVEL_VOICE};

macro_rules! sec_log {
    ($($arg:tt)*) => { log::warn!(target: "security", $($arg)*); };
}

fn denied(ctx: &CommandContext, sigil: &str, cmd: &str) -> String {
    sec_log!(
        "{} denied for {} (level {})",
        cmd,
        escape_log(&ctx.user_id),
        ctx.level
    );
    format!("{}{} - Access denied.", sigil, cmd)
}

const BROADCASTABLE: &[&str] = &["shop", "receipts", "shophelp"];
const FILE_COMMANDS: &[&str] = &["getfile", "writefile", "forcewritefile"];
const SHOP_COMMANDS: &[&str] = &[
    "shop",
    "buyitem",
    "additem",
    "deleteitem",
    "receipts",
    "receiptlogs",
    "shophelp",
    "givebucks",
];

/// Who issued a command and from where, as reported by the host.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub user_id: String,
    pub room: String,
    pub level: u8,
    /// Issued from a console-capable connection
    pub console: bool,
}

impl CommandContext {
    pub fn new(user_id: impl Into<String>, room: impl Into<String>, level: u8) -> Self {
        Self {
            user_id: user_id.into(),
            room: room.into(),
            level,
            console: false,
        }
    }

    pub fn with_console(mut self) -> Self {
        self.console = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    /// Show to the whole room rather than only the caller
    pub broadcast: bool,
}

impl Reply {
    fn private(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            broadcast: false,
        }
    }
}

/// Routes commands to the shop ledger, the balance provider and the gist bridge.
///
/// The ledger and balances sit behind async mutexes; each command holds them
/// for its whole read-modify-persist sequence.
pub struct CommandProcessor<B: BalanceProvider + Send = WalletFile> {
    config: Config,
    ledger: Mutex<ShopLedger>,
    balances: Mutex<B>,
    gist: GistBridge,
}

impl CommandProcessor<WalletFile> {
    /// Load the ledger and the bundled wallet store from configured paths.
    pub fn from_config(config: Config) -> Self {
        let ledger = ShopLedger::from_config(&config.shop);
        let wallets = WalletFile::open(config.shop.wallets_path(), config.shop.starting_balance);
        Self::new(config, ledger, wallets)
    }
}

impl<B: BalanceProvider + Send> CommandProcessor<B> {
    pub fn new(config: Config, ledger: ShopLedger, balances: B) -> Self {
        let gist = GistBridge::new(config.gist.clone());
        Self {
            config,
            ledger: Mutex::new(ledger),
            balances: Mutex::new(balances),
            gist,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn balance_of(&self, user_id: &str) -> u64 {
        self.balances.lock().await.balance(&to_id(user_id))
    }

    /// Run `f` against the ledger while holding its lock.
    pub async fn with_ledger<R>(&self, f: impl FnOnce(&ShopLedger) -> R) -> R {
        let ledger = self.ledger.lock().await;
        f(&ledger)
    }

    /// Split a line into (broadcast, command, target). `None` for plain chat,
    /// including lines escaped by doubling the prefix.
    fn parse_line<'a>(&self, line: &'a str) -> Option<(bool, String, &'a str)> {
        let line = line.trim_start();
        let prefix = self.config.commands.prefix.as_str();
        let (broadcast, rest) = if let Some(rest) = line.strip_prefix('!') {
            (true, rest)
        } else if !prefix.is_empty() {
            let rest = line.strip_prefix(prefix)?;
            if rest.starts_with(prefix) {
                return None;
            }
            (false, rest)
        } else {
            return None;
        };
        if rest.is_empty() || rest.starts_with(char::is_whitespace) {
            return None;
        }
        let (cmd, target) = match rest.split_once(char::is_whitespace) {
            Some((cmd, target)) => (cmd, target.trim()),
            None => (rest, ""),
        };
        Some((broadcast, cmd.to_lowercase(), target))
    }

    fn dev_access(&self, ctx: &CommandContext) -> bool {
        let gist = &self.config.gist;
        let user = to_id(&ctx.user_id);
        !user.is_empty()
            && to_id(&ctx.room) == to_id(&gist.dev_room)
            && ctx.console
            && ctx.level >= LEVEL_CONSOLE
            && gist.allowed_users.iter().any(|u| to_id(u) == user)
    }

    /// Handle one chat line.
    pub async fn process(&self, ctx: &CommandContext, line: &str) -> Option<Reply> {
        let (broadcast, cmd, target) = self.parse_line(line)?;
        let sigil = if broadcast {
            "!"
        } else {
            self.config.commands.prefix.as_str()
        };
        let unrecognized = || Reply::private(format!("The command '{}{}' was unrecognized.", sigil, cmd));

        let is_file_command = FILE_COMMANDS.contains(&cmd.as_str());
        if is_file_command && !self.dev_access(ctx) {
            sec_log!(
                "file command {} refused for {} in room {}",
                cmd,
                escape_log(&ctx.user_id),
                escape_log(&ctx.room)
            );
            return Some(unrecognized());
        }
        if !is_file_command && !SHOP_COMMANDS.contains(&cmd.as_str()) {
            return Some(unrecognized());
        }

        if broadcast {
            if !BROADCASTABLE.contains(&cmd.as_str()) {
                return Some(Reply::private("This command can't be broadcast."));
            }
            if ctx.level < LEVEL_VOICE {
                return Some(Reply::private(
                    "You need to be voiced to broadcast this command's information.",
                ));
            }
        }

        let text = match cmd.as_str() {
            "shop" => self.list_items().await,
            "buyitem" => self.buy_item(ctx, target, sigil).await,
            "additem" => self.add_item(ctx, target, sigil).await,
            "deleteitem" => self.delete_item(ctx, target, sigil).await,
            "receipts" => self.own_receipts(ctx).await,
            "receiptlogs" => self.receipt_logs(ctx, target, sigil).await,
            "shophelp" => render::HELP_TEXT.to_string(),
            "givebucks" => self.give_bucks(ctx, target, sigil).await,
            "getfile" => self.get_file(ctx, target, sigil).await,
            "writefile" => self.write_file(ctx, target, sigil, false).await,
            "forcewritefile" => self.write_file(ctx, target, sigil, true).await,
            _ => return Some(unrecognized()),
        };
        Some(Reply { text, broadcast })
    }

    fn currency(&self) -> &str {
        &self.config.commands.currency_name
    }

    async fn list_items(&self) -> String {
        let items = self.ledger.lock().await.list_items();
        render::item_list(&items, self.currency())
    }

    async fn buy_item(&self, ctx: &CommandContext, target: &str, sigil: &str) -> String {
        if target.is_empty() {
            return format!("Usage: {}buyitem [item name]", sigil);
        }
        let user = to_id(&ctx.user_id);
        let mut ledger = self.ledger.lock().await;
        let mut balances = self.balances.lock().await;
        match ledger.buy_item(&mut *balances, &user, target) {
            PurchaseOutcome::Purchased { receipt_id, price } => format!(
                "You purchased {} for {}. Your receipt ID is {}.",
                target,
                amount(price, self.currency()),
                receipt_id
            ),
            PurchaseOutcome::NotFound => format!(
                "Item '{}' not found. Use {}shop to see what is for sale.",
                target, sigil
            ),
            PurchaseOutcome::InsufficientFunds { price, balance } => format!(
                "You need {} to buy {}, but you only have {}.",
                amount(price, self.currency()),
                target,
                amount(balance, self.currency())
            ),
            PurchaseOutcome::DebitFailed(reason) => {
                format!("Your purchase could not be completed: {}", reason)
            }
        }
    }

    async fn add_item(&self, ctx: &CommandContext, target: &str, sigil: &str) -> String {
        if ctx.level < LEVEL_DRIVER {
            return denied(ctx, sigil, "additem");
        }
        let usage = format!("Usage: {}additem [name], [price], [description]", sigil);
        let parts: Vec<&str> = target.split(',').collect();
        if parts.len() < 3 {
            return usage;
        }
        let checked = validate_item_name(parts[0]).and_then(|name| {
            let price = parse_price(parts[1])?;
            let description = validate_description(&parts[2..].join(","))?;
            Ok((name, price, description))
        });
        let (name, price, description) = match checked {
            Ok(fields) => fields,
            Err(e) => return format!("{}. {}", e, usage),
        };
        self.ledger.lock().await.add_item(&name, price, &description);
        info!("{} added shop item {}", to_id(&ctx.user_id), escape_log(&name));
        format!("Added {} to the shop for {}.", name, amount(price, self.currency()))
    }

    async fn delete_item(&self, ctx: &CommandContext, target: &str, sigil: &str) -> String {
        if ctx.level < LEVEL_DRIVER {
            return denied(ctx, sigil, "deleteitem");
        }
        if target.is_empty() {
            return format!("Usage: {}deleteitem [item name]", sigil);
        }
        match self.ledger.lock().await.delete_item(target) {
            DeleteOutcome::Removed(1) => format!("Removed {} from the shop.", target),
            DeleteOutcome::Removed(n) => format!("Removed {} items named {} from the shop.", n, target),
            DeleteOutcome::NotFound => format!("Item '{}' not found.", target),
        }
    }

    async fn own_receipts(&self, ctx: &CommandContext) -> String {
        let receipts = self.ledger.lock().await.user_receipts(&to_id(&ctx.user_id));
        render::own_receipts(&receipts, self.currency())
    }

    async fn receipt_logs(&self, ctx: &CommandContext, target: &str, sigil: &str) -> String {
        if ctx.level < LEVEL_DRIVER {
            return denied(ctx, sigil, "receiptlogs");
        }
        let filter = if target.is_empty() {
            None
        } else {
            Some(to_id(target))
        };
        let receipts = self.ledger.lock().await.all_receipts(filter.as_deref());
        render::receipt_log(&receipts, filter.as_deref(), self.currency())
    }

    async fn give_bucks(&self, ctx: &CommandContext, target: &str, sigil: &str) -> String {
        if ctx.level < LEVEL_CONSOLE {
            return denied(ctx, sigil, "givebucks");
        }
        let usage = format!("Usage: {}givebucks [user], [amount]", sigil);
        let Some((user, raw_amount)) = target.split_once(',') else {
            return usage;
        };
        let user = to_id(user);
        if user.is_empty() {
            return usage;
        }
        let value = match parse_price(raw_amount) {
            Ok(v) => v,
            Err(_) => return usage,
        };
        let memo = format!("Granted by {}", to_id(&ctx.user_id));
        match self.balances.lock().await.credit(&user, value, &memo) {
            Ok(balance) => format!(
                "Gave {} to {}. They now have {}.",
                amount(value, self.currency()),
                user,
                amount(balance, self.currency())
            ),
            Err(e) => format!("Could not give {}: {}", self.currency(), e),
        }
    }

    async fn get_file(&self, ctx: &CommandContext, target: &str, sigil: &str) -> String {
        if target.is_empty() {
            return format!("Usage: {}getfile [path]", sigil);
        }
        info!("{} requested upload of {}", to_id(&ctx.user_id), escape_log(target));
        match self.gist.upload(target).await {
            Ok(url) => format!("{} uploaded: {}", target, url),
            Err(e) => format!("Error: {}", e),
        }
    }

    async fn write_file(
        &self,
        ctx: &CommandContext,
        target: &str,
        sigil: &str,
        overwrite_if_missing: bool,
    ) -> String {
        let name = if overwrite_if_missing {
            "forcewritefile"
        } else {
            "writefile"
        };
        let usage = format!("Usage: {}{} [raw gist URL], [path]", sigil, name);
        let Some((url, path)) = target.split_once(',') else {
            return usage;
        };
        let (url, path) = (url.trim(), path.trim());
        if url.is_empty() || path.is_empty() {
            return usage;
        }
        info!(
            "{} requested {} of {} from {}",
            to_id(&ctx.user_id),
            name,
            escape_log(path),
            escape_log(url)
        );
        match self.gist.download(url, path, overwrite_if_missing).await {
            Ok(()) => format!("{} has been updated from {}.", path, url),
            Err(e) => format!("Error: {}", e),
        }
    }
}
