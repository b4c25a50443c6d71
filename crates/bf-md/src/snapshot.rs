//! REST book snapshot fetcher.
//!
//! The dispatcher sends exchange-format symbols down a request channel
//! whenever a symbol needs (re)seeding; this task fetches
//! `/fapi/v1/depth?symbol=<SYM>&limit=<N>` and feeds the parsed snapshot back
//! onto the inbound channel. The fetch retries a few times; after the last
//! attempt it reports [`Inbound::SnapshotFailed`] so the dispatcher can arm a
//! re-request on the next diff instead of stalling the symbol forever.

use std::time::Duration;

use bf_core::error::FeedError;
use bf_core::time_util::now_us;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::dispatch::{BookSnapshot, Inbound};
use crate::json_util::{array_field, u64_field};
use crate::normalize::parse_levels;

/// REST endpoint for USDT-margined futures.
pub const REST_ENDPOINT: &str = "https://fapi.binance.com/fapi/v1";

const FETCH_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Serve snapshot requests until the request channel closes.
pub async fn run_snapshot_fetcher(
    mut req_rx: mpsc::UnboundedReceiver<String>,
    inbound_tx: mpsc::UnboundedSender<Inbound>,
    depth_limit: u32,
) {
    let client = reqwest::Client::new();
    while let Some(symbol) = req_rx.recv().await {
        let inbound = match fetch_with_retry(&client, &symbol, depth_limit).await {
            Ok(snap) => {
                info!("{symbol}: snapshot fetched, lastUpdateId={}", snap.last_update_id);
                Inbound::Snapshot(snap)
            }
            Err(e) => {
                warn!("{symbol}: snapshot fetch gave up: {e}");
                Inbound::SnapshotFailed(symbol)
            }
        };
        if inbound_tx.send(inbound).is_err() {
            return; // dispatcher gone, shutting down
        }
    }
}

async fn fetch_with_retry(
    client: &reqwest::Client,
    symbol: &str,
    depth_limit: u32,
) -> Result<BookSnapshot, FeedError> {
    let url = format!("{REST_ENDPOINT}/depth?symbol={symbol}&limit={depth_limit}");
    let mut last_err = FeedError::Http("no attempt made".into());
    for attempt in 1..=FETCH_ATTEMPTS {
        match fetch_once(client, &url, symbol).await {
            Ok(snap) => return Ok(snap),
            Err(e) => {
                warn!("{symbol}: snapshot attempt {attempt}/{FETCH_ATTEMPTS} failed: {e}");
                last_err = e;
                if attempt < FETCH_ATTEMPTS {
                    tokio::time::sleep(RETRY_DELAY).await;
                }
            }
        }
    }
    Err(last_err)
}

async fn fetch_once(
    client: &reqwest::Client,
    url: &str,
    symbol: &str,
) -> Result<BookSnapshot, FeedError> {
    let resp = client
        .get(url)
        .send()
        .await
        .map_err(|e| FeedError::Http(e.to_string()))?
        .error_for_status()
        .map_err(|e| FeedError::Http(e.to_string()))?;
    let body: Value = resp.json().await.map_err(|e| FeedError::Http(e.to_string()))?;
    parse_snapshot(&body, symbol)
}

/// Parse a `/depth` response:
/// `{"lastUpdateId":1027024,"E":...,"T":...,"bids":[["4.0","431"]],"asks":[...]}`.
pub fn parse_snapshot(body: &Value, symbol: &str) -> Result<BookSnapshot, FeedError> {
    Ok(BookSnapshot {
        symbol: symbol.to_string(),
        last_update_id: u64_field(body, "lastUpdateId")?,
        bids: parse_levels(array_field(body, "bids")?)?,
        asks: parse_levels(array_field(body, "asks")?)?,
        recv_ts_us: now_us(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use serde_json::json;
    use std::str::FromStr;

    #[test]
    fn parses_depth_response() {
        let body = json!({
            "lastUpdateId": 1027024u64,
            "E": 1589436922972u64,
            "T": 1589436922959u64,
            "bids": [["4.00000000", "431.00000000"]],
            "asks": [["4.00000200", "12.00000000"], ["4.1", "1"]]
        });
        let snap = parse_snapshot(&body, "BTCUSDT").unwrap();
        assert_eq!(snap.symbol, "BTCUSDT");
        assert_eq!(snap.last_update_id, 1027024);
        assert_eq!(snap.bids.len(), 1);
        assert_eq!(snap.bids[0].price, Decimal::from_str("4.00000000").unwrap());
        assert_eq!(snap.asks.len(), 2);
    }

    #[test]
    fn missing_update_id_fails() {
        let body = json!({"bids": [], "asks": []});
        assert!(matches!(parse_snapshot(&body, "BTCUSDT"), Err(FeedError::Parse(_))));
    }
}
