//! Single WebSocket connection with auto-reconnect.
//!
//! Each `WsConnection` runs as a tokio task that:
//! 1. Connects to the exchange WebSocket endpoint (TLS). The combined-stream
//!    subscription is encoded in the URL path, so no subscribe message is
//!    required — an optional one can still be configured.
//! 2. Reads text frames, stamps each with a receipt timestamp, and forwards
//!    it to a callback as a [`RawMessage`].
//! 3. Answers protocol ping frames with pongs (Binance pings every few
//!    minutes and drops connections that fail to respond).
//! 4. Automatically reconnects on disconnection with exponential backoff.
//!
//! A reconnect is invisible to the consumer beyond a gap in messages — it
//! carries no state reset of its own. Data-continuity gaps are detected
//! downstream by the book consistency engine.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use crate::types::{ConnOrigin, RawMessage};

/// Callback invoked for each received text message.
pub type OnMessageCallback = Arc<dyn Fn(RawMessage) + Send + Sync>;

/// Configuration for a single WebSocket connection.
#[derive(Debug, Clone)]
pub struct WsConnConfig {
    /// Full WebSocket URL, streams included
    /// (e.g. `wss://fstream.binance.com/stream?streams=btcusdt@aggTrade`).
    pub url: String,
    /// Optional message to send immediately after connection.
    pub subscribe_msg: Option<String>,
    /// Origin tag stamped on every forwarded message.
    pub origin: ConnOrigin,
    /// Human-readable label for log lines.
    pub label: String,
}

/// A single WebSocket connection managed by a background tokio task.
pub struct WsConnection {
    pub config: WsConnConfig,
    shutdown_tx: Option<watch::Sender<bool>>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl WsConnection {
    /// Create a new (not yet started) connection.
    pub fn new(config: WsConnConfig) -> Self {
        Self { config, shutdown_tx: None, task: None }
    }

    /// Start the connection task. Text frames are forwarded to `on_message`.
    pub fn start(&mut self, on_message: OnMessageCallback) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let config = self.config.clone();

        let task = tokio::spawn(async move {
            connection_loop(config, on_message, shutdown_rx).await;
        });

        self.shutdown_tx = Some(shutdown_tx);
        self.task = Some(task);
    }

    /// Stop the connection and wait for the task to finish.
    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(true);
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

/// Main connection loop — connects, reads, reconnects.
async fn connection_loop(
    config: WsConnConfig,
    on_message: OnMessageCallback,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut backoff = Duration::from_millis(100);
    let max_backoff = Duration::from_secs(30);
    let label = config.label.clone();

    loop {
        if *shutdown_rx.borrow() {
            info!("[{label}] shutdown requested");
            return;
        }

        info!("[{label}] connecting to {}", config.url);

        let ws_stream = match connect_ws(&config.url).await {
            Ok(s) => {
                backoff = Duration::from_millis(100); // reset backoff on success
                info!("[{label}] connected");
                s
            }
            Err(e) => {
                error!("[{label}] connection failed: {e}, retrying in {backoff:?}");
                tokio::select! {
                    _ = tokio::time::sleep(backoff) => {},
                    _ = shutdown_rx.changed() => return,
                }
                backoff = (backoff * 2).min(max_backoff);
                continue;
            }
        };

        let (mut ws_write, mut ws_read) = ws_stream.split();

        if let Some(ref sub_msg) = config.subscribe_msg {
            debug!("[{label}] subscribing: {sub_msg}");
            if let Err(e) = ws_write.send(Message::Text(sub_msg.clone().into())).await {
                error!("[{label}] subscribe send failed: {e}");
                continue;
            }
        }

        // Main read loop
        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    info!("[{label}] shutdown signal received");
                    let _ = ws_write.close().await;
                    return;
                }

                msg = ws_read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            on_message(RawMessage::now(config.origin, text.to_string()));
                        }
                        Some(Ok(Message::Ping(data))) => {
                            let _ = ws_write.send(Message::Pong(data)).await;
                        }
                        Some(Ok(Message::Close(_))) => {
                            warn!("[{label}] received close frame");
                            break;
                        }
                        Some(Err(e)) => {
                            error!("[{label}] read error: {e}");
                            break;
                        }
                        None => {
                            warn!("[{label}] stream ended");
                            break;
                        }
                        _ => {} // Binary, Pong, Frame — ignore
                    }
                }
            }
        }

        // Disconnected — will reconnect at the top of the outer loop
        warn!("[{label}] disconnected, reconnecting in {backoff:?}");
        tokio::select! {
            _ = tokio::time::sleep(backoff) => {},
            _ = shutdown_rx.changed() => return,
        }
        backoff = (backoff * 2).min(max_backoff);
    }
}

/// Establish a TLS WebSocket connection.
async fn connect_ws(
    url: &str,
) -> anyhow::Result<
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>,
> {
    use tokio_tungstenite::tungstenite::http::Request;

    let request = Request::builder()
        .uri(url)
        .header("Host", extract_host(url))
        .body(())?;

    let (stream, _response) = tokio_tungstenite::connect_async(request).await?;
    Ok(stream)
}

/// Extract the host from a URL string.
fn extract_host(url: &str) -> String {
    url::Url::parse(url)
        .map(|u| u.host_str().unwrap_or("").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_extraction() {
        assert_eq!(
            extract_host("wss://fstream.binance.com/stream?streams=btcusdt@aggTrade"),
            "fstream.binance.com"
        );
        assert_eq!(extract_host("not a url"), "");
    }
}
