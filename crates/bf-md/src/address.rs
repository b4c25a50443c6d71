//! Combined-stream subscription address builder.
//!
//! Binance futures multiplexes any number of logical streams over one
//! WebSocket connection; the subscription is encoded in the URL as
//! `/stream?streams=<name>/<name>/...` where each name is
//! `<symbol>@<channel>`. Pure function — no I/O.

use bf_core::config::FeedConfig;
use bf_core::types::Channel;

use crate::symbol_map::SymbolMap;

/// WebSocket endpoint for USDT-margined futures.
pub const WS_ENDPOINT: &str = "wss://fstream.binance.com";

/// Build the combined-stream URL from the configured channels and symbols.
///
/// Rules:
/// - Open interest is polling-only and never contributes a stream.
/// - The ticker channel maps to the exchange's `bookTicker` stream; every
///   other channel maps to `<symbol>@<channelName>`.
/// - Symbols are lower-cased, as the exchange expects.
///
/// Returns `None` when no streamable channel/symbol combination is
/// configured — no streaming connection is needed at all then.
pub fn build_stream_address(cfg: &FeedConfig) -> Option<String> {
    let mut streams = Vec::new();

    for &chan in &cfg.channels {
        let Some(name) = chan.stream_name(cfg.candle_interval()) else {
            continue; // polling-only channel
        };
        for sym in cfg.channel_symbols(chan) {
            let pair = SymbolMap::to_exchange(sym).to_lowercase();
            streams.push(format!("{pair}@{name}"));
        }
    }

    if streams.is_empty() {
        return None;
    }
    Some(format!("{WS_ENDPOINT}/stream?streams={}", streams.join("/")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(json: &str) -> FeedConfig {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn ticker_maps_to_book_ticker_stream() {
        let cfg = cfg(r#"{"symbols": ["BTC-USDT"], "channels": ["ticker"]}"#);
        assert_eq!(
            build_stream_address(&cfg).unwrap(),
            "wss://fstream.binance.com/stream?streams=btcusdt@bookTicker"
        );
    }

    #[test]
    fn multiple_channels_and_symbols() {
        let cfg = cfg(
            r#"{"symbols": ["BTC-USDT", "ETH-USDT"], "channels": ["trades", "depth"]}"#,
        );
        let addr = build_stream_address(&cfg).unwrap();
        assert_eq!(
            addr,
            "wss://fstream.binance.com/stream?streams=\
             btcusdt@aggTrade/ethusdt@aggTrade/btcusdt@depth@100ms/ethusdt@depth@100ms"
        );
    }

    #[test]
    fn open_interest_never_streams() {
        let cfg = cfg(r#"{"symbols": ["BTC-USDT"], "channels": ["open_interest"]}"#);
        assert_eq!(build_stream_address(&cfg), None);
    }

    #[test]
    fn channel_override_narrows_symbols() {
        let cfg = cfg(
            r#"{
                "symbols": ["BTC-USDT", "ETH-USDT"],
                "channels": ["candles"],
                "subscription": {"candles": ["ETH-USDT"]},
                "candle_interval": "5m"
            }"#,
        );
        assert_eq!(
            build_stream_address(&cfg).unwrap(),
            "wss://fstream.binance.com/stream?streams=ethusdt@kline_5m"
        );
    }

    #[test]
    fn dated_future_symbol_is_lowercased_with_suffix() {
        let cfg = cfg(r#"{"symbols": ["BTC-USDT_210625"], "channels": ["trades"]}"#);
        assert_eq!(
            build_stream_address(&cfg).unwrap(),
            "wss://fstream.binance.com/stream?streams=btcusdt_210625@aggTrade"
        );
    }
}
