//! Enumerations used throughout the feed adapter.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Channels
// ---------------------------------------------------------------------------

/// Subscribable data channels.
///
/// All channels except [`Channel::OpenInterest`] are delivered over the
/// multiplexed WebSocket stream. Open interest has no streaming counterpart on
/// Binance futures and is polled from the REST endpoint instead — it never
/// contributes to the streaming address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Ticker,
    Trades,
    Depth,
    Funding,
    Liquidations,
    Candles,
    OpenInterest,
}

impl Channel {
    /// The exchange-native stream name for this channel, or `None` for
    /// polling-only channels.
    ///
    /// `interval` is only consulted for [`Channel::Candles`]
    /// (e.g. `"1m"` → `kline_1m`).
    pub fn stream_name(&self, interval: &str) -> Option<String> {
        match self {
            Self::Ticker => Some("bookTicker".to_string()),
            Self::Trades => Some("aggTrade".to_string()),
            Self::Depth => Some("depth@100ms".to_string()),
            Self::Funding => Some("markPrice".to_string()),
            Self::Liquidations => Some("forceOrder".to_string()),
            Self::Candles => Some(format!("kline_{interval}")),
            Self::OpenInterest => None,
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ticker => write!(f, "ticker"),
            Self::Trades => write!(f, "trades"),
            Self::Depth => write!(f, "depth"),
            Self::Funding => write!(f, "funding"),
            Self::Liquidations => write!(f, "liquidations"),
            Self::Candles => write!(f, "candles"),
            Self::OpenInterest => write!(f, "open_interest"),
        }
    }
}

// ---------------------------------------------------------------------------
// Instrument / trade metadata
// ---------------------------------------------------------------------------

/// Contract kind of a futures instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstrumentKind {
    /// No expiry (e.g. `BTC-USDT`).
    Perpetual,
    /// Dated contract carrying an expiry label (e.g. `BTC-USDT_210625`).
    Future,
}

/// Buy or sell direction, from the taker's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_names_from_config_keys() {
        let chans: Vec<Channel> =
            serde_json::from_str(r#"["ticker", "open_interest", "candles"]"#).unwrap();
        assert_eq!(chans, vec![Channel::Ticker, Channel::OpenInterest, Channel::Candles]);
    }

    #[test]
    fn stream_names() {
        assert_eq!(Channel::Ticker.stream_name("1m").as_deref(), Some("bookTicker"));
        assert_eq!(Channel::Candles.stream_name("5m").as_deref(), Some("kline_5m"));
        assert_eq!(Channel::OpenInterest.stream_name("1m"), None);
    }
}
