//! Test utilities & fixtures shared by the integration tests.

use std::collections::HashMap;
use std::path::Path;

use chatshop::config::Config;
use chatshop::shop::{Receipt, ShopLedger};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Config whose data directory is `dir`.
#[allow(dead_code)]
pub fn config_in(dir: &Path) -> Config {
    let mut config = Config::default();
    config.shop.data_dir = dir.to_string_lossy().into_owned();
    config
}

/// Ledger stored under `dir` with the default file names.
#[allow(dead_code)]
pub fn ledger_in(dir: &Path) -> ShopLedger {
    ShopLedger::from_config(&config_in(dir).shop)
}

/// Receipt with fixed fields, for seeding receipts documents.
#[allow(dead_code)]
pub fn receipt(id: &str, user: &str, timestamp: i64, item: &str, amount: u64) -> Receipt {
    Receipt {
        receipt_id: id.to_string(),
        user_id: user.to_string(),
        timestamp,
        item_name: item.to_string(),
        amount,
    }
}

/// Write a receipts document directly, bypassing the ledger.
#[allow(dead_code)]
pub fn seed_receipts(dir: &Path, receipts: HashMap<String, Vec<Receipt>>) {
    let path = dir.join("receipts.json");
    std::fs::write(path, serde_json::to_string_pretty(&receipts).unwrap()).unwrap();
}

/// A request captured by [serve_once].
#[allow(dead_code)]
pub struct CapturedRequest {
    pub head: String,
    pub body: String,
}

/// Serve exactly one HTTP request on a loopback port with the given status
/// line (e.g. `"201 Created"`) and body. Returns the base URL
/// (`http://127.0.0.1:<port>`) and a handle yielding the captured request.
#[allow(dead_code)]
pub async fn serve_once(status: &'static str, body: String) -> (String, JoinHandle<CapturedRequest>) {
    serve_once_bytes(status, body.into_bytes()).await
}

/// Like [serve_once] with a raw byte body.
#[allow(dead_code)]
pub async fn serve_once_bytes(
    status: &'static str,
    body: Vec<u8>,
) -> (String, JoinHandle<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        let header_end = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "client closed before sending headers");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };
        let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
        let content_length = head
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                if name.trim().eq_ignore_ascii_case("content-length") {
                    value.trim().parse::<usize>().ok()
                } else {
                    None
                }
            })
            .unwrap_or(0);
        while buf.len() < header_end + content_length {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
        let request_body = String::from_utf8_lossy(&buf[header_end..]).into_owned();

        let head_out = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            status,
            body.len()
        );
        socket.write_all(head_out.as_bytes()).await.unwrap();
        socket.write_all(&body).await.unwrap();
        socket.shutdown().await.ok();
        CapturedRequest {
            head,
            body: request_body,
        }
    });
    (format!("http://{}", addr), handle)
}
