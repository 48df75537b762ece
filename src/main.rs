//! Binary entrypoint for the chatshop CLI.
//!
//! Commands:
//! - `init` - write a starter `config.toml` and create the data directory
//! - `console --user <id> [--room <room>] [--level <n>] [--console]` - read
//!   command lines from stdin and print replies, standing in for a chat host
//! - `status` - print item, receipt and wallet counts
//!
//! See the library crate docs for module-level details: `chatshop::`.
use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;
use tokio::io::{AsyncBufReadExt, BufReader};

use chatshop::commands::{roles, CommandContext, CommandProcessor};
use chatshop::config::Config;
use chatshop::gist::GistBridge;
use chatshop::shop::{ShopLedger, WalletFile};

#[derive(Parser)]
#[command(name = "chatshop")]
#[command(about = "Shop ledger and gist file bridge commands for chat servers")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a default configuration file
    Init,
    /// Run commands from stdin as a single user
    Console {
        /// User issuing the commands
        #[arg(short, long)]
        user: String,
        /// Room the commands are issued in
        #[arg(short, long, default_value = "lobby")]
        room: String,
        /// Access level (1 user, 2 voice, 5 driver, 10 console)
        #[arg(short, long, default_value_t = roles::LEVEL_USER)]
        level: u8,
        /// Mark the connection as console-capable
        #[arg(long)]
        console: bool,
    },
    /// Show shop statistics
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            init_logging(&None, cli.verbose);
            info!("Initializing new chatshop configuration");
            Config::create_default(&cli.config).await?;
            let cfg = Config::load(&cli.config).await?;
            tokio::fs::create_dir_all(&cfg.shop.data_dir).await?;
            info!("Configuration file created at {}", cli.config);
        }
        Commands::Console {
            user,
            room,
            level,
            console,
        } => {
            let config = Config::load(&cli.config).await?;
            init_logging(&Some(config.clone()), cli.verbose);
            info!("Starting chatshop v{} console for {}", env!("CARGO_PKG_VERSION"), user);

            let processor = CommandProcessor::from_config(config);
            let mut ctx = CommandContext::new(user, room, level);
            if console {
                ctx = ctx.with_console();
            }
            println!(
                "chatshop console: {} ({}) in {}. Type /shophelp, Ctrl-D to exit.",
                ctx.user_id,
                roles::role_name(ctx.level),
                ctx.room
            );

            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Some(line) = lines.next_line().await? {
                if line.trim().is_empty() {
                    continue;
                }
                match processor.process(&ctx, &line).await {
                    Some(reply) if reply.broadcast => println!("[{}] {}", ctx.room, reply.text),
                    Some(reply) => println!("{}", reply.text),
                    None => println!("(not a command; prefix with {})", processor.config().commands.prefix),
                }
            }
        }
        Commands::Status => {
            let config = Config::load(&cli.config).await?;
            init_logging(&Some(config.clone()), cli.verbose);
            let ledger = ShopLedger::from_config(&config.shop);
            let wallets = WalletFile::open(config.shop.wallets_path(), config.shop.starting_balance);
            println!("Items:    {} ({:?})", ledger.item_count(), ledger.items_path());
            println!("Receipts: {} ({:?})", ledger.receipt_count(), ledger.receipts_path());
            println!("Wallets:  {} ({:?})", wallets.wallet_count(), wallets.path());
            let bridge = GistBridge::new(config.gist);
            println!(
                "Gist token ({}): {}",
                bridge.config().token_env,
                if bridge.is_configured() { "set" } else { "not set" }
            );
        }
    }

    Ok(())
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .and_then(|c| c.logging.level.parse::<log::LevelFilter>().ok())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config
        .as_ref()
        .and_then(|c| c.logging.file.clone())
        .and_then(|path| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        });
    let security_path = config.as_ref().and_then(|c| c.logging.security_file.clone());

    if let Some(f) = log_file {
        let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
        // The console subcommand prints replies on stdout; only echo log lines there when interactive.
        let is_tty = atty::is(atty::Stream::Stderr);
        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}", ts, record.level(), record.args());
            if let Ok(mut guard) = write_mutex.lock() {
                let _ = writeln!(guard, "{}", line);
            }
            if record.target() == "security" {
                if let Some(ref sec_path) = security_path {
                    if let Ok(mut sf) = std::fs::OpenOptions::new()
                        .create(true)
                        .append(true)
                        .open(sec_path)
                    {
                        let _ = writeln!(sf, "{}", line);
                    }
                }
            }
            if is_tty {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
        });
    }
    let _ = builder.try_init();
}
