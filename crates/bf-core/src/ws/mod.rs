//! WebSocket transport.

pub mod client;

pub use client::{OnMessageCallback, WsConnConfig, WsConnection};
