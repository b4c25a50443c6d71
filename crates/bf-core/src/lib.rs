//! # bf-core
//!
//! Core crate for the Binance USDT-futures market-data adapter, providing:
//!
//! - **Types** (`types`) — channels, canonical market events, raw feed messages
//! - **Configuration** (`config`) — JSON config deserialization
//! - **Error types** (`error`) — domain-specific `FeedError` via thiserror
//! - **WebSocket** (`ws`) — WS client with auto-reconnect
//! - **Sink** (`sink`) — downstream event-sink port + reference implementations
//! - **Time utilities** (`time_util`) — microsecond timestamps
//! - **Logging** (`logging`) — tracing-based structured logging

pub mod config;
pub mod error;
pub mod logging;
pub mod sink;
pub mod time_util;
pub mod types;
pub mod ws;

// Re-export types at crate root for convenience.
pub use types::*;
