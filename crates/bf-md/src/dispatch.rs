//! Message dispatcher — classification and per-type routing.
//!
//! A single dispatcher task owns all per-symbol state (book sync, resync
//! bookkeeping, open-interest cache) and consumes one mpsc channel fed by the
//! streaming connection, the open-interest poller, and the snapshot fetcher.
//! Each inbound message runs to completion before the next is taken, so
//! per-connection ordering is preserved and state is never mutated
//! concurrently.
//!
//! Classification, first match wins:
//! 1. A bare `openInterest` field → polled open-interest response
//!    (change-deduplicated against the cache).
//! 2. Otherwise the message is a combined-stream envelope
//!    `{"stream": "<symbol>@<channel>", "data": {...}}` — the symbol is the
//!    upper-cased prefix before the first `@`.
//! 3. The unwrapped payload routes by its `e` tag to exactly one normalizer;
//!    unknown tags are logged and dropped, malformed messages fail hard for
//!    that message only.

use std::sync::Arc;

use ahash::{AHashMap, AHashSet};
use bf_core::error::FeedError;
use bf_core::sink::EventSink;
use bf_core::types::{MarketEvent, PriceLevel, RawMessage};
use rust_decimal::Decimal;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::book_sync::{BookSyncEngine, DiffOutcome};
use crate::json_util::{str_field, u64_field};
use crate::normalize;
use crate::symbol_map::SymbolMap;

/// A REST book snapshot, produced by the snapshot fetcher.
#[derive(Debug, Clone)]
pub struct BookSnapshot {
    /// Exchange-format symbol (e.g. `BTCUSDT`).
    pub symbol: String,
    pub last_update_id: u64,
    pub bids: Vec<PriceLevel>,
    pub asks: Vec<PriceLevel>,
    pub recv_ts_us: u64,
}

/// Everything the dispatcher consumes, multiplexed onto one channel.
#[derive(Debug)]
pub enum Inbound {
    /// A raw message from the streaming or polling connection.
    Raw(RawMessage),
    /// A fresh snapshot — seeds the consistency engine.
    Snapshot(BookSnapshot),
    /// Snapshot fetch gave up; the next diff re-triggers the request.
    SnapshotFailed(String),
}

/// Routes decoded messages to normalizers and the consistency engine.
pub struct Dispatcher {
    sink: Arc<dyn EventSink>,
    symbols: SymbolMap,
    books: BookSyncEngine,
    /// Symbols with a snapshot request in flight; their diffs are skipped
    /// (they predate the snapshot that is on its way).
    resync_pending: AHashSet<String>,
    /// Last emitted open-interest value per canonical symbol.
    open_interest: AHashMap<String, Decimal>,
    /// Resync requests to the snapshot fetcher (exchange-format symbols).
    snapshot_tx: mpsc::UnboundedSender<String>,
}

impl Dispatcher {
    pub fn new(
        sink: Arc<dyn EventSink>,
        symbols: SymbolMap,
        snapshot_tx: mpsc::UnboundedSender<String>,
    ) -> Self {
        Self {
            sink,
            symbols,
            books: BookSyncEngine::new(),
            resync_pending: AHashSet::new(),
            open_interest: AHashMap::new(),
            snapshot_tx,
        }
    }

    /// Process one inbound message to completion.
    pub async fn handle(&mut self, inbound: Inbound) -> Result<(), FeedError> {
        match inbound {
            Inbound::Raw(raw) => self.handle_raw(raw).await,
            Inbound::Snapshot(snap) => self.handle_snapshot(snap).await,
            Inbound::SnapshotFailed(symbol) => {
                self.resync_pending.remove(&symbol);
                Ok(())
            }
        }
    }

    async fn handle_raw(&mut self, raw: RawMessage) -> Result<(), FeedError> {
        let v: Value = serde_json::from_str(&raw.text)
            .map_err(|e| FeedError::Parse(format!("invalid JSON: {e}")))?;

        // Polled REST responses carry no envelope.
        if v.get("openInterest").is_some() {
            return self.handle_open_interest(&v, raw.recv_ts_us).await;
        }

        // Combined-stream envelope: {"stream": "<symbol>@<channel>", "data": {...}}
        let stream = str_field(&v, "stream")?;
        let pair = stream
            .split('@')
            .next()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| FeedError::Parse(format!("malformed stream name '{stream}'")))?
            .to_uppercase();
        let data = v
            .get("data")
            .ok_or_else(|| FeedError::Parse("envelope without data payload".into()))?;
        let symbol = self.symbols.to_canonical(&pair).to_string();

        match data.get("e").and_then(|e| e.as_str()) {
            Some("bookTicker") => self.publish(normalize::ticker(data, &symbol, raw.recv_ts_us)?).await,
            Some("depthUpdate") => self.handle_depth(data, &pair, &symbol, raw.recv_ts_us).await?,
            Some("aggTrade") => self.publish(normalize::trade(data, &symbol, raw.recv_ts_us)?).await,
            Some("forceOrder") => {
                self.publish(normalize::liquidation(data, &symbol, raw.recv_ts_us)?).await
            }
            Some("markPriceUpdate") => {
                self.publish(normalize::funding(data, &symbol, raw.recv_ts_us)?).await
            }
            Some("kline") => self.publish(normalize::candle(data, &symbol, raw.recv_ts_us)?).await,
            Some(other) => warn!("unexpected message type '{other}' on stream {stream}"),
            None => return Err(FeedError::Parse(format!("payload without event tag: {data}"))),
        }
        Ok(())
    }

    /// Book diffs pass through the consistency engine before normalization.
    async fn handle_depth(
        &mut self,
        data: &Value,
        pair: &str,
        symbol: &str,
        recv_ts_us: u64,
    ) -> Result<(), FeedError> {
        let first = u64_field(data, "U")?;
        let last = u64_field(data, "u")?;
        let prev_final = u64_field(data, "pu").ok();

        if self.resync_pending.contains(pair) {
            return Ok(()); // snapshot in flight; this diff predates it
        }
        if !self.books.is_seeded(symbol) {
            // First diff for this symbol — kick off the snapshot fetch.
            self.request_snapshot(pair);
            return Ok(());
        }

        match self.books.check(symbol, first, last, prev_final) {
            DiffOutcome::Skip => {}
            DiffOutcome::Resync => self.request_snapshot(pair),
            DiffOutcome::Apply { initial } => {
                self.publish(normalize::book_diff(data, symbol, initial, recv_ts_us)?).await;
            }
        }
        Ok(())
    }

    /// Polled open-interest response; forwarded only when the value changed.
    async fn handle_open_interest(&mut self, v: &Value, recv_ts_us: u64) -> Result<(), FeedError> {
        let pair = str_field(v, "symbol")?;
        let symbol = self.symbols.to_canonical(pair).to_string();
        let event = normalize::open_interest(v, &symbol, recv_ts_us)?;

        let MarketEvent::OpenInterest(ref oi) = event else { unreachable!() };
        if self.open_interest.get(&symbol) == Some(&oi.open_interest) {
            return Ok(()); // unchanged since the last poll
        }
        self.open_interest.insert(symbol, oi.open_interest);
        self.publish(event).await;
        Ok(())
    }

    async fn handle_snapshot(&mut self, snap: BookSnapshot) -> Result<(), FeedError> {
        self.resync_pending.remove(&snap.symbol);
        let symbol = self.symbols.to_canonical(&snap.symbol).to_string();
        self.books.seed(&symbol, snap.last_update_id);
        info!("{symbol}: book seeded at update id {}", snap.last_update_id);

        self.publish(MarketEvent::Book(bf_core::types::BookDiff {
            exchange: crate::EXCHANGE,
            symbol,
            initial: true,
            first_update_id: snap.last_update_id,
            final_update_id: snap.last_update_id,
            bids: snap.bids,
            asks: snap.asks,
            exchange_ts_us: 0,
            recv_ts_us: snap.recv_ts_us,
        }))
        .await;
        Ok(())
    }

    fn request_snapshot(&mut self, pair: &str) {
        if self.resync_pending.insert(pair.to_string())
            && self.snapshot_tx.send(pair.to_string()).is_err()
        {
            error!("{pair}: snapshot fetcher is gone");
        }
    }

    /// Hand one event to the sink. Sink failures are logged, never retried.
    async fn publish(&self, event: MarketEvent) {
        if let Err(e) = self.sink.publish(event).await {
            error!("sink rejected event: {e}");
        }
    }
}

/// Drain the inbound channel until all senders are dropped.
///
/// Malformed messages are logged and dropped — they never take the loop down.
pub async fn run_dispatch_loop(mut rx: mpsc::UnboundedReceiver<Inbound>, mut dispatcher: Dispatcher) {
    info!("dispatch loop started");
    while let Some(inbound) = rx.recv().await {
        if let Err(e) = dispatcher.handle(inbound).await {
            warn!("dropping malformed message: {e}");
        }
    }
    info!("dispatch loop exited");
}
