//! Canonical market events — the normalized output of the adapter.
//!
//! Every event carries the canonical symbol (`BASE-QUOTE[_EXPIRY]` form), the
//! exchange identifier, the exchange event time and the local receipt time.
//!
//! # Timestamp convention
//!
//! All timestamps are **microseconds since Unix epoch**. Binance sends
//! milliseconds; normalizers multiply by 1000 at the boundary.

use rust_decimal::Decimal;
use serde::Serialize;

use super::enums::Side;

/// One price level of a book diff or snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceLevel {
    pub price: Decimal,
    /// New absolute size at this price. Zero means the level is removed.
    pub size: Decimal,
}

/// Best bid and offer quote.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ticker {
    pub exchange: &'static str,
    pub symbol: String,
    pub bid_price: Decimal,
    pub bid_size: Decimal,
    pub ask_price: Decimal,
    pub ask_size: Decimal,
    pub exchange_ts_us: u64,
    pub recv_ts_us: u64,
}

/// A trade execution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    pub exchange: &'static str,
    pub symbol: String,
    pub side: Side,
    pub price: Decimal,
    pub size: Decimal,
    pub id: u64,
    /// `true` when the exchange aggregated several fills at one price.
    pub aggregated: bool,
    pub exchange_ts_us: u64,
    pub recv_ts_us: u64,
}

/// A forced liquidation order.
///
/// Binance does not assign liquidation ids; `id` carries the order's fill
/// transaction time, which is unique enough for downstream keying.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Liquidation {
    pub exchange: &'static str,
    pub symbol: String,
    pub side: Side,
    pub price: Decimal,
    pub quantity: Decimal,
    /// Exchange order status (e.g. `FILLED`).
    pub status: String,
    pub id: u64,
    pub exchange_ts_us: u64,
    pub recv_ts_us: u64,
}

/// Mark price and funding rate update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Funding {
    pub exchange: &'static str,
    pub symbol: String,
    pub mark_price: Decimal,
    pub rate: Decimal,
    pub next_funding_ts_us: u64,
    pub exchange_ts_us: u64,
    pub recv_ts_us: u64,
}

/// Open interest for one instrument, change-deduplicated at the source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenInterest {
    pub exchange: &'static str,
    pub symbol: String,
    pub open_interest: Decimal,
    pub exchange_ts_us: u64,
    pub recv_ts_us: u64,
}

/// A candlestick update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candle {
    pub exchange: &'static str,
    pub symbol: String,
    pub interval: String,
    pub open_ts_us: u64,
    pub close_ts_us: u64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    /// `true` once the interval is closed; intermediate updates are `false`.
    pub closed: bool,
    pub exchange_ts_us: u64,
    pub recv_ts_us: u64,
}

/// An order-book update accepted by the consistency engine.
///
/// `initial == true` marks a full level set (REST snapshot, or the first diff
/// bracketing the snapshot boundary); `false` marks sparse incremental
/// changes. Level changes are forwarded, not materialized, here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookDiff {
    pub exchange: &'static str,
    pub symbol: String,
    pub initial: bool,
    pub first_update_id: u64,
    pub final_update_id: u64,
    pub bids: Vec<PriceLevel>,
    pub asks: Vec<PriceLevel>,
    pub exchange_ts_us: u64,
    pub recv_ts_us: u64,
}

// ---------------------------------------------------------------------------
// MarketEvent — tagged union handed to the sink
// ---------------------------------------------------------------------------

/// A tagged union of all canonical event types.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MarketEvent {
    Ticker(Ticker),
    Trade(Trade),
    Liquidation(Liquidation),
    Funding(Funding),
    OpenInterest(OpenInterest),
    Candle(Candle),
    Book(BookDiff),
}

impl MarketEvent {
    /// Event-kind tag used to key the downstream sink.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ticker(_) => "ticker",
            Self::Trade(_) => "trade",
            Self::Liquidation(_) => "liquidation",
            Self::Funding(_) => "funding",
            Self::OpenInterest(_) => "open_interest",
            Self::Candle(_) => "candle",
            Self::Book(_) => "book",
        }
    }

    /// Canonical symbol of the instrument this event refers to.
    pub fn symbol(&self) -> &str {
        match self {
            Self::Ticker(e) => &e.symbol,
            Self::Trade(e) => &e.symbol,
            Self::Liquidation(e) => &e.symbol,
            Self::Funding(e) => &e.symbol,
            Self::OpenInterest(e) => &e.symbol,
            Self::Candle(e) => &e.symbol,
            Self::Book(e) => &e.symbol,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[test]
    fn event_kind_tags() {
        let oi = MarketEvent::OpenInterest(OpenInterest {
            exchange: "binance-futures",
            symbol: "BTC-USDT".into(),
            open_interest: Decimal::from_str("10659.509").unwrap(),
            exchange_ts_us: 1_589_437_530_011_000,
            recv_ts_us: 1_589_437_530_500_000,
        });
        assert_eq!(oi.kind(), "open_interest");
        assert_eq!(oi.symbol(), "BTC-USDT");
    }

    #[test]
    fn serializes_with_kind_tag() {
        let tick = MarketEvent::Ticker(Ticker {
            exchange: "binance-futures",
            symbol: "BTC-USDT".into(),
            bid_price: Decimal::from_str("25.3519").unwrap(),
            bid_size: Decimal::from_str("31.21").unwrap(),
            ask_price: Decimal::from_str("25.3652").unwrap(),
            ask_size: Decimal::from_str("40.66").unwrap(),
            exchange_ts_us: 0,
            recv_ts_us: 0,
        });
        let json = serde_json::to_value(&tick).unwrap();
        assert_eq!(json["kind"], "ticker");
        assert_eq!(json["bid_price"], "25.3519");
    }
}
