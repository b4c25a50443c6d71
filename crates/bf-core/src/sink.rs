//! Downstream event-sink port.
//!
//! The adapter pushes one canonical [`MarketEvent`] at a time into an
//! [`EventSink`]. Delivery failures are the sink's concern — the dispatcher
//! logs them and moves on, it never retries.

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::info;

use crate::types::MarketEvent;

/// Accepts normalized events, keyed by [`MarketEvent::kind`].
///
/// Implementations may suspend (channel back-pressure, network writes).
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn publish(&self, event: MarketEvent) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Reference implementations
// ---------------------------------------------------------------------------

/// Sink that logs every event as a JSON line. Useful for smoke runs.
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait]
impl EventSink for LogSink {
    async fn publish(&self, event: MarketEvent) -> Result<()> {
        info!(target: "events", kind = event.kind(), "{}", serde_json::to_string(&event)?);
        Ok(())
    }
}

/// Sink that forwards events into a tokio mpsc channel.
///
/// Used by embedders that consume the event stream elsewhere, and by tests.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<MarketEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiving half of its channel.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<MarketEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn publish(&self, event: MarketEvent) -> Result<()> {
        self.tx
            .send(event)
            .map_err(|e| anyhow::anyhow!("event channel closed: {e}"))
    }
}
