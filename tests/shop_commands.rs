//! Integration tests for the chat command surface.

mod common;

use std::collections::HashMap;

use chatshop::commands::roles::{LEVEL_CONSOLE, LEVEL_DRIVER, LEVEL_USER, LEVEL_VOICE};
use chatshop::commands::{CommandContext, CommandProcessor, Reply};
use chatshop::config::Config;
use chatshop::shop::{BalanceProvider, ShopLedger, WalletFile};
use common::config_in;
use tempfile::{tempdir, TempDir};

fn processor_with(
    balances: &[(&str, u64)],
    tweak: impl FnOnce(&mut Config),
) -> (TempDir, CommandProcessor<HashMap<String, u64>>) {
    let tmp = tempdir().unwrap();
    let mut config = config_in(tmp.path());
    tweak(&mut config);
    let ledger = ShopLedger::from_config(&config.shop);
    let map: HashMap<String, u64> = balances
        .iter()
        .map(|(u, b)| (u.to_string(), *b))
        .collect();
    (tmp, CommandProcessor::new(config, ledger, map))
}

fn processor(balances: &[(&str, u64)]) -> (TempDir, CommandProcessor<HashMap<String, u64>>) {
    processor_with(balances, |_| {})
}

async fn run<B: BalanceProvider + Send>(p: &CommandProcessor<B>, ctx: &CommandContext, line: &str) -> Reply {
    p.process(ctx, line).await.expect("line should be a command")
}

fn staff() -> CommandContext {
    CommandContext::new("Staff Member", "lobby", LEVEL_DRIVER)
}

fn dev() -> CommandContext {
    CommandContext::new("DevUser", "development", LEVEL_CONSOLE).with_console()
}

#[tokio::test]
async fn test_additem_and_shop_listing() {
    let (_tmp, p) = processor(&[]);
    let reply = run(&p, &staff(), "/additem Badge, 100, Shiny, and round").await;
    assert_eq!(reply.text, "Added Badge to the shop for 100 bucks.");

    let user = CommandContext::new("alice", "lobby", LEVEL_USER);
    let reply = run(&p, &user, "/shop").await;
    assert_eq!(reply.text, "Shop items:\nBadge (100 bucks): Shiny, and round");
    assert!(!reply.broadcast);
}

#[tokio::test]
async fn test_additem_rejects_bad_input() {
    let (_tmp, p) = processor(&[]);
    for line in [
        "/additem Badge, 0, Shiny",
        "/additem Badge, -3, Shiny",
        "/additem Badge, lots, Shiny",
        "/additem Badge, 100",
        "/additem , 100, Shiny",
        "/additem Badge, 100,   ",
    ] {
        let reply = run(&p, &staff(), line).await;
        assert!(
            reply.text.contains("Usage: /additem"),
            "{} -> {}",
            line,
            reply.text
        );
    }
    assert_eq!(p.with_ledger(|l| l.item_count()).await, 0);
}

#[tokio::test]
async fn test_staff_commands_need_privilege() {
    let (_tmp, p) = processor(&[]);
    let user = CommandContext::new("alice", "lobby", LEVEL_USER);
    assert_eq!(run(&p, &user, "/additem Badge, 1, x").await.text, "/additem - Access denied.");
    assert_eq!(run(&p, &user, "/deleteitem Badge").await.text, "/deleteitem - Access denied.");
    assert_eq!(run(&p, &user, "/receiptlogs").await.text, "/receiptlogs - Access denied.");
    assert_eq!(run(&p, &user, "/givebucks bob, 5").await.text, "/givebucks - Access denied.");
}

#[tokio::test]
async fn test_buyitem_flow() {
    let (_tmp, p) = processor(&[("alice", 150)]);
    run(&p, &staff(), "/additem Badge, 100, Shiny").await;
    let alice = CommandContext::new("Alice", "lobby", LEVEL_USER);

    let reply = run(&p, &alice, "/buyitem Badge").await;
    assert!(reply.text.starts_with("You purchased Badge for 100 bucks. Your receipt ID is "));
    assert_eq!(p.balance_of("alice").await, 50);

    let reply = run(&p, &alice, "/buyitem Badge").await;
    assert_eq!(
        reply.text,
        "You need 100 bucks to buy Badge, but you only have 50 bucks."
    );
    assert_eq!(p.balance_of("alice").await, 50);

    let reply = run(&p, &alice, "/buyitem Crown").await;
    assert_eq!(reply.text, "Item 'Crown' not found. Use /shop to see what is for sale.");

    let reply = run(&p, &alice, "/buyitem").await;
    assert_eq!(reply.text, "Usage: /buyitem [item name]");

    let receipts = run(&p, &alice, "/receipts").await;
    assert!(receipts.text.starts_with("Your receipts:\n["));
    assert!(receipts.text.ends_with("Badge for 100 bucks"));
}

#[tokio::test]
async fn test_receipts_empty_and_logs_filter() {
    let (_tmp, p) = processor(&[("alice", 100), ("bob", 100)]);
    run(&p, &staff(), "/additem Hat, 10, Warm").await;
    let bob = CommandContext::new("bob", "lobby", LEVEL_USER);
    let carol = CommandContext::new("carol", "lobby", LEVEL_USER);
    assert_eq!(run(&p, &carol, "/receipts").await.text, "You have no receipts.");

    run(&p, &bob, "/buyitem Hat").await;
    run(&p, &CommandContext::new("alice", "lobby", LEVEL_USER), "/buyitem Hat").await;

    let all = run(&p, &staff(), "/receiptlogs").await.text;
    assert!(all.starts_with("All receipts:"));
    assert_eq!(all.lines().count(), 3);

    let only_bob = run(&p, &staff(), "/receiptlogs BOB").await.text;
    assert!(only_bob.starts_with("Receipts for bob:"));
    assert_eq!(only_bob.lines().count(), 2);
    assert!(only_bob.contains("bob: Hat for 10 bucks"));

    assert_eq!(
        run(&p, &staff(), "/receiptlogs carol").await.text,
        "No receipts found for carol."
    );
}

#[tokio::test]
async fn test_deleteitem_outcomes() {
    let (_tmp, p) = processor(&[]);
    run(&p, &staff(), "/additem Potion, 10, a").await;
    run(&p, &staff(), "/additem Potion, 20, b").await;
    assert_eq!(run(&p, &staff(), "/deleteitem potion").await.text, "Item 'potion' not found.");
    assert_eq!(
        run(&p, &staff(), "/deleteitem Potion").await.text,
        "Removed 2 items named Potion from the shop."
    );
    assert_eq!(run(&p, &staff(), "/shop").await.text, "The shop is empty.");
}

#[tokio::test]
async fn test_broadcast_gating() {
    let (_tmp, p) = processor(&[]);
    let voiced = CommandContext::new("vera", "lobby", LEVEL_VOICE);
    let reply = run(&p, &voiced, "!shop").await;
    assert!(reply.broadcast);
    assert_eq!(reply.text, "The shop is empty.");

    let plain = CommandContext::new("alice", "lobby", LEVEL_USER);
    let reply = run(&p, &plain, "!shophelp").await;
    assert!(!reply.broadcast);
    assert!(reply.text.contains("voiced"));

    let reply = run(&p, &voiced, "!buyitem Badge").await;
    assert!(!reply.broadcast);
    assert_eq!(reply.text, "This command can't be broadcast.");
}

#[tokio::test]
async fn test_unknown_command_reply() {
    let (_tmp, p) = processor(&[]);
    let user = CommandContext::new("alice", "lobby", LEVEL_USER);
    assert_eq!(
        run(&p, &user, "/sellitem Badge").await.text,
        "The command '/sellitem' was unrecognized."
    );
    assert!(p.process(&user, "hello").await.is_none());
}

#[tokio::test]
async fn test_file_commands_hidden_from_unauthorized_callers() {
    let (_tmp, p) = processor_with(&[], |c| {
        c.gist.allowed_users = vec!["DevUser".to_string()];
    });

    let cases = vec![
        // wrong room
        CommandContext::new("devuser", "lobby", LEVEL_CONSOLE).with_console(),
        // not a console connection
        CommandContext::new("devuser", "development", LEVEL_CONSOLE),
        // insufficient level
        CommandContext::new("devuser", "development", LEVEL_DRIVER).with_console(),
        // not on the allow-list
        CommandContext::new("mallory", "development", LEVEL_CONSOLE).with_console(),
    ];
    for ctx in cases {
        for cmd in ["getfile", "writefile", "forcewritefile"] {
            let reply = run(&p, &ctx, &format!("/{} config/config.js", cmd)).await;
            assert_eq!(reply.text, format!("The command '/{}' was unrecognized.", cmd));
        }
    }
}

#[tokio::test]
async fn test_getfile_reports_missing_token() {
    let (_tmp, p) = processor_with(&[], |c| {
        c.gist.allowed_users = vec!["devuser".to_string()];
        c.gist.token_env = "CHATSHOP_COMMANDS_TOKEN_NEVER_SET".to_string();
    });
    let reply = run(&p, &dev(), "/getfile Cargo.toml").await;
    assert_eq!(
        reply.text,
        "Error: the CHATSHOP_COMMANDS_TOKEN_NEVER_SET environment variable is not set"
    );
    assert_eq!(run(&p, &dev(), "/getfile").await.text, "Usage: /getfile [path]");
}

#[tokio::test]
async fn test_writefile_argument_checks() {
    let (tmp, p) = processor_with(&[], |c| {
        c.gist.allowed_users = vec!["devuser".to_string()];
    });
    assert_eq!(
        run(&p, &dev(), "/writefile https://gist.githubusercontent.com/x/raw").await.text,
        "Usage: /writefile [raw gist URL], [path]"
    );

    let missing = tmp.path().join("absent.js");
    let line = format!(
        "/writefile https://gist.githubusercontent.com/x/raw, {}",
        missing.display()
    );
    let reply = run(&p, &dev(), &line).await;
    assert!(reply.text.starts_with("Error: "));
    assert!(reply.text.contains("forcewritefile"));
    assert!(!missing.exists());

    let reply = run(
        &p,
        &dev(),
        &format!("/forcewritefile https://evil.example/raw, {}", missing.display()),
    )
    .await;
    assert_eq!(
        reply.text,
        "Error: only URLs starting with https://gist.githubusercontent.com/ are accepted"
    );
}

#[tokio::test]
async fn test_givebucks_with_wallet_file() {
    let tmp = tempdir().unwrap();
    let mut config = config_in(tmp.path());
    config.shop.starting_balance = 10;
    let p = CommandProcessor::from_config(config.clone());
    let admin = CommandContext::new("admin", "lobby", LEVEL_CONSOLE);

    let reply = run(&p, &admin, "/givebucks Bob, 90").await;
    assert_eq!(reply.text, "Gave 90 bucks to bob. They now have 100 bucks.");
    assert_eq!(
        run(&p, &admin, "/givebucks bob, zero").await.text,
        "Usage: /givebucks [user], [amount]"
    );

    run(&p, &staff(), "/additem Crown, 60, Heavy").await;
    let bob = CommandContext::new("bob", "lobby", LEVEL_USER);
    assert!(run(&p, &bob, "/buyitem Crown").await.text.starts_with("You purchased Crown"));

    let wallets = WalletFile::open(config.shop.wallets_path(), config.shop.starting_balance);
    assert_eq!(wallets.balance("bob"), 40);
    let history = wallets.history("bob");
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].delta, -60);
    assert_eq!(history[1].memo, "Purchased Crown from the shop");
}
