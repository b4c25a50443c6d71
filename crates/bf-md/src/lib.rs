//! # bf-md
//!
//! Market-data adapter for Binance USDT-margined futures.
//!
//! ## Architecture
//!
//! ```text
//! ws stream ──┐
//! oi poller ──┼──► Inbound channel ──► Dispatcher ──► BookSyncEngine ──► sink
//! snapshots ──┘                              └──────► normalizers ─────► sink
//! ```
//!
//! The streaming WebSocket connection and the open-interest polling connection
//! feed one mpsc channel consumed by a single dispatcher task, so every
//! message runs to completion before the next — no symbol's sync state is
//! ever touched concurrently. The snapshot fetcher closes the resync loop:
//! gap detected → snapshot request → REST depth fetch → engine re-seeded.
//!
//! ## Modules
//!
//! - [`instrument`] — exchange instrument identifier parsing
//! - [`symbol_map`] — canonical ↔ exchange symbol translation
//! - [`address`] — combined-stream subscription address builder
//! - [`connect`] — connection-set builder + [`BinanceFuturesMd`] lifecycle
//! - [`dispatch`] — per-message classification and routing
//! - [`book_sync`] — order-book consistency engine
//! - [`normalize`] — exchange payload → canonical event transforms
//! - [`snapshot`] — REST depth snapshot fetcher
//! - [`poller`] — open-interest REST poller

pub mod address;
pub mod book_sync;
pub mod connect;
pub mod dispatch;
pub mod instrument;
pub mod json_util;
pub mod normalize;
pub mod poller;
pub mod snapshot;
pub mod symbol_map;

use anyhow::Result;
use async_trait::async_trait;

pub use connect::BinanceFuturesMd;

/// Exchange identifier stamped on every canonical event.
pub const EXCHANGE: &str = "binance-futures";

/// Trait implemented by feed modules.
///
/// Only `Send` is required (not `Sync`) because modules are accessed
/// sequentially by the runner, never concurrently.
#[async_trait]
pub trait FeedModule: Send {
    /// Human-readable module name.
    fn name(&self) -> &str;
    /// Connect and begin processing market data.
    async fn start(&mut self) -> Result<()>;
    /// Gracefully stop all connections and tasks.
    async fn stop(&mut self) -> Result<()>;
}
