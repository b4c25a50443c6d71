//! Typed error definitions for the feed adapter.
//!
//! Provides [`FeedError`] for domain-specific errors that are more informative
//! than plain `anyhow::Error` strings. All variants implement `std::error::Error`
//! via `thiserror`, so they integrate seamlessly with `anyhow::Result`.
//!
//! Note that a stale book diff or a detected sequence gap is *not* an error —
//! both are ordinary outcomes of the consistency protocol. `Parse` covers only
//! genuinely malformed messages; the dispatch loop drops the offending message
//! and carries on.

use thiserror::Error;

/// Domain-specific errors for the feed adapter.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Configuration parsing or validation error.
    #[error("config error: {0}")]
    Config(String),

    /// WebSocket connection, handshake, or communication error.
    #[error("websocket error: {0}")]
    WebSocket(String),

    /// REST request error (open-interest poll, depth snapshot).
    #[error("http error: {0}")]
    Http(String),

    /// Malformed message — decode or shape failure, fatal for that message only.
    #[error("parse error: {0}")]
    Parse(String),

    /// Downstream sink rejected an event.
    #[error("sink error: {0}")]
    Sink(String),
}
