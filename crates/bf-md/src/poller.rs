//! Open-interest REST poller.
//!
//! Open interest has no stream on this venue; the only source is the
//! `/fapi/v1/openInterest` endpoint. The poller cycles through the configured
//! symbol URLs on a fixed period, with a stagger between requests so a large
//! symbol set does not burst against the rate limiter. Responses are fed onto
//! the inbound channel as raw poll-origin messages; the dispatcher classifies
//! and deduplicates them like any other message.

use std::time::Duration;

use bf_core::types::{ConnOrigin, RawMessage};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use crate::dispatch::Inbound;

/// Poll each URL in `urls` once per `period` until shutdown.
pub async fn run_open_interest_poller(
    urls: Vec<String>,
    period: Duration,
    stagger: Duration,
    inbound_tx: mpsc::UnboundedSender<Inbound>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    if urls.is_empty() {
        return;
    }
    info!("open interest poller started, {} symbols every {period:?}", urls.len());
    let client = reqwest::Client::new();

    loop {
        for url in &urls {
            match poll_once(&client, url).await {
                Ok(text) => {
                    let msg = Inbound::Raw(RawMessage::now(ConnOrigin::Poll, text));
                    if inbound_tx.send(msg).is_err() {
                        return; // dispatcher gone
                    }
                }
                // Transient failures just skip this round for the symbol.
                Err(e) => warn!("open interest poll failed for {url}: {e}"),
            }
            if sleep_or_shutdown(stagger, &mut shutdown_rx).await {
                return;
            }
        }
        if sleep_or_shutdown(period, &mut shutdown_rx).await {
            return;
        }
    }
}

async fn poll_once(client: &reqwest::Client, url: &str) -> Result<String, reqwest::Error> {
    client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await
}

/// Returns `true` when shutdown was signalled during the sleep.
async fn sleep_or_shutdown(duration: Duration, shutdown_rx: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(duration) => false,
        _ = shutdown_rx.changed() => {
            info!("open interest poller stopping");
            true
        }
    }
}
