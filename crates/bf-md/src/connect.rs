//! Connection planning and feed-module lifecycle.
//!
//! [`build_connections`] turns a config into the set of connections the
//! adapter needs: at most one combined WebSocket stream plus one polling
//! connection for open interest. [`BinanceFuturesMd`] owns the whole runtime:
//! the WebSocket client, the poller, the snapshot fetcher, and the dispatcher
//! task, all wired through one inbound channel.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use bf_core::config::FeedConfig;
use bf_core::sink::EventSink;
use bf_core::types::{Channel, ConnOrigin};
use bf_core::ws::{WsConnConfig, WsConnection};
use tokio::sync::{mpsc, watch};
use tracing::info;

use crate::address::build_stream_address;
use crate::dispatch::{Dispatcher, Inbound, run_dispatch_loop};
use crate::instrument::Instrument;
use crate::poller::run_open_interest_poller;
use crate::snapshot::{REST_ENDPOINT, run_snapshot_fetcher};
use crate::symbol_map::SymbolMap;
use crate::FeedModule;

/// One planned connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionPlan {
    /// Combined WebSocket stream carrying every streamable channel.
    Stream { url: String },
    /// REST polling loop (open interest only on this venue).
    Poll { urls: Vec<String>, period: Duration, stagger: Duration },
}

/// Plan the connection set for a config.
///
/// Streamable channels share one combined-stream connection; open interest
/// gets its own polling plan. Either may be absent.
pub fn build_connections(cfg: &FeedConfig) -> Vec<ConnectionPlan> {
    let mut plans = Vec::new();

    if let Some(url) = build_stream_address(cfg) {
        plans.push(ConnectionPlan::Stream { url });
    }

    if cfg.has_channel(Channel::OpenInterest) {
        let urls: Vec<String> = cfg
            .channel_symbols(Channel::OpenInterest)
            .iter()
            .map(|sym| {
                format!("{REST_ENDPOINT}/openInterest?symbol={}", SymbolMap::to_exchange(sym))
            })
            .collect();
        if !urls.is_empty() {
            plans.push(ConnectionPlan::Poll {
                urls,
                period: cfg.open_interest_period(),
                stagger: cfg.open_interest_stagger(),
            });
        }
    }

    plans
}

/// The Binance USDT-futures market-data module.
pub struct BinanceFuturesMd {
    config: FeedConfig,
    sink: Arc<dyn EventSink>,
    name: String,
    ws: Option<WsConnection>,
    shutdown_tx: Option<watch::Sender<bool>>,
    tasks: Vec<tokio::task::JoinHandle<()>>,
}

impl BinanceFuturesMd {
    pub fn new(config: FeedConfig, sink: Arc<dyn EventSink>) -> Self {
        let name = config.module_name().to_string();
        Self { config, sink, name, ws: None, shutdown_tx: None, tasks: Vec::new() }
    }

    /// Union of the global symbol set and every per-channel override.
    fn all_symbols(&self) -> Vec<String> {
        let mut symbols = self.config.symbols.clone();
        if let Some(sub) = &self.config.subscription {
            for syms in sub.values() {
                symbols.extend(syms.iter().cloned());
            }
        }
        symbols.sort();
        symbols.dedup();
        symbols
    }
}

#[async_trait]
impl FeedModule for BinanceFuturesMd {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&mut self) -> Result<()> {
        let symbols = self.all_symbols();
        for sym in &symbols {
            sym.parse::<Instrument>()
                .map_err(|e| anyhow::anyhow!("invalid symbol '{sym}': {e}"))?;
        }

        let plans = build_connections(&self.config);
        anyhow::ensure!(!plans.is_empty(), "no channels or symbols configured");

        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        self.shutdown_tx = Some(shutdown_tx);

        let dispatcher =
            Dispatcher::new(self.sink.clone(), SymbolMap::from_canonical(symbols), snapshot_tx);
        self.tasks.push(tokio::spawn(run_dispatch_loop(inbound_rx, dispatcher)));

        if self.config.has_channel(Channel::Depth) {
            self.tasks.push(tokio::spawn(run_snapshot_fetcher(
                snapshot_rx,
                inbound_tx.clone(),
                self.config.snapshot_depth(),
            )));
        }

        for plan in plans {
            match plan {
                ConnectionPlan::Stream { url } => {
                    let mut conn = WsConnection::new(WsConnConfig {
                        url,
                        subscribe_msg: None,
                        origin: ConnOrigin::Stream,
                        label: self.name.clone(),
                    });
                    let tx = inbound_tx.clone();
                    conn.start(Arc::new(move |raw| {
                        let _ = tx.send(Inbound::Raw(raw));
                    }));
                    self.ws = Some(conn);
                }
                ConnectionPlan::Poll { urls, period, stagger } => {
                    self.tasks.push(tokio::spawn(run_open_interest_poller(
                        urls,
                        period,
                        stagger,
                        inbound_tx.clone(),
                        shutdown_rx.clone(),
                    )));
                }
            }
        }

        info!("{} started", self.name);
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(true);
        }
        if let Some(mut ws) = self.ws.take() {
            ws.stop().await;
        }
        // The dispatch loop drains and exits once every sender is dropped;
        // anything still blocked on I/O is aborted.
        for task in self.tasks.drain(..) {
            task.abort();
        }
        info!("{} stopped", self.name);
        Ok(())
    }
}
