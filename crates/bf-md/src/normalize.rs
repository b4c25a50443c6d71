//! Event normalizers — exchange-native payloads to canonical events.
//!
//! Each normalizer is a stateless transform of one unwrapped payload plus a
//! receipt timestamp. Field shapes follow the Binance futures stream
//! documentation; all prices/sizes are parsed as exact decimals. A missing or
//! ill-typed field fails the whole message with [`FeedError::Parse`] — none
//! of it is forwarded.
//!
//! Normalizers never touch the consistency engine: depth payloads are checked
//! by [`crate::book_sync`] before [`book_diff`] is invoked for accepted diffs.

use bf_core::error::FeedError;
use bf_core::time_util::ms_to_us;
use bf_core::types::*;
use serde_json::Value;

use crate::EXCHANGE;
use crate::json_util::*;

/// `bookTicker` — best bid/offer update.
///
/// ```json
/// {"e":"bookTicker","u":400900217,"E":1568014460893,"T":1568014460891,
///  "s":"BTCUSDT","b":"25.35190000","B":"31.21","a":"25.36520000","A":"40.66"}
/// ```
pub fn ticker(v: &Value, symbol: &str, recv_ts_us: u64) -> Result<MarketEvent, FeedError> {
    Ok(MarketEvent::Ticker(Ticker {
        exchange: EXCHANGE,
        symbol: symbol.to_string(),
        bid_price: decimal_field(v, "b")?,
        bid_size: decimal_field(v, "B")?,
        ask_price: decimal_field(v, "a")?,
        ask_size: decimal_field(v, "A")?,
        exchange_ts_us: ms_to_us(u64_field_or_zero(v, "E")),
        recv_ts_us,
    }))
}

/// `aggTrade` — aggregated trade.
///
/// `m == true` means the buyer was the maker, i.e. the taker sold.
pub fn trade(v: &Value, symbol: &str, recv_ts_us: u64) -> Result<MarketEvent, FeedError> {
    let side = if bool_field(v, "m")? { Side::Sell } else { Side::Buy };
    Ok(MarketEvent::Trade(Trade {
        exchange: EXCHANGE,
        symbol: symbol.to_string(),
        side,
        price: decimal_field(v, "p")?,
        size: decimal_field(v, "q")?,
        id: u64_field(v, "a")?,
        aggregated: true,
        exchange_ts_us: ms_to_us(u64_field(v, "T")?),
        recv_ts_us,
    }))
}

/// `forceOrder` — forced liquidation. The order detail is nested under `o`.
///
/// ```json
/// {"e":"forceOrder","E":1568014460893,"o":{"s":"BTCUSDT","S":"SELL",
///  "q":"0.014","p":"9910","ap":"9910","X":"FILLED","T":1568014460893}}
/// ```
pub fn liquidation(v: &Value, symbol: &str, recv_ts_us: u64) -> Result<MarketEvent, FeedError> {
    let order = object_field(v, "o")?;
    let side = match str_field(order, "S")? {
        "BUY" => Side::Buy,
        "SELL" => Side::Sell,
        other => return Err(FeedError::Parse(format!("unknown liquidation side '{other}'"))),
    };
    let fill_ts = u64_field(order, "T")?;
    Ok(MarketEvent::Liquidation(Liquidation {
        exchange: EXCHANGE,
        symbol: symbol.to_string(),
        side,
        price: decimal_field(order, "p")?,
        quantity: decimal_field(order, "q")?,
        status: str_field(order, "X")?.to_string(),
        id: fill_ts,
        exchange_ts_us: ms_to_us(u64_field_or_zero(v, "E")),
        recv_ts_us,
    }))
}

/// `markPriceUpdate` — mark price + funding rate.
pub fn funding(v: &Value, symbol: &str, recv_ts_us: u64) -> Result<MarketEvent, FeedError> {
    Ok(MarketEvent::Funding(Funding {
        exchange: EXCHANGE,
        symbol: symbol.to_string(),
        mark_price: decimal_field(v, "p")?,
        rate: decimal_field(v, "r")?,
        next_funding_ts_us: ms_to_us(u64_field_or_zero(v, "T")),
        exchange_ts_us: ms_to_us(u64_field(v, "E")?),
        recv_ts_us,
    }))
}

/// `kline` — candlestick. The candle detail is nested under `k`.
pub fn candle(v: &Value, symbol: &str, recv_ts_us: u64) -> Result<MarketEvent, FeedError> {
    let k = object_field(v, "k")?;
    Ok(MarketEvent::Candle(Candle {
        exchange: EXCHANGE,
        symbol: symbol.to_string(),
        interval: str_field(k, "i")?.to_string(),
        open_ts_us: ms_to_us(u64_field(k, "t")?),
        close_ts_us: ms_to_us(u64_field(k, "T")?),
        open: decimal_field(k, "o")?,
        high: decimal_field(k, "h")?,
        low: decimal_field(k, "l")?,
        close: decimal_field(k, "c")?,
        volume: decimal_field(k, "v")?,
        closed: bool_field(k, "x")?,
        exchange_ts_us: ms_to_us(u64_field(v, "E")?),
        recv_ts_us,
    }))
}

/// Polled open-interest response (no envelope):
/// `{"openInterest":"10659.509","symbol":"BTCUSDT","time":1589437530011}`.
pub fn open_interest(v: &Value, symbol: &str, recv_ts_us: u64) -> Result<MarketEvent, FeedError> {
    Ok(MarketEvent::OpenInterest(OpenInterest {
        exchange: EXCHANGE,
        symbol: symbol.to_string(),
        open_interest: decimal_field(v, "openInterest")?,
        exchange_ts_us: ms_to_us(u64_field(v, "time")?),
        recv_ts_us,
    }))
}

/// `depthUpdate` — an accepted book diff. Only called for diffs the
/// consistency engine decided to apply; `initial` comes from its verdict.
pub fn book_diff(
    v: &Value,
    symbol: &str,
    initial: bool,
    recv_ts_us: u64,
) -> Result<MarketEvent, FeedError> {
    Ok(MarketEvent::Book(BookDiff {
        exchange: EXCHANGE,
        symbol: symbol.to_string(),
        initial,
        first_update_id: u64_field(v, "U")?,
        final_update_id: u64_field(v, "u")?,
        bids: parse_levels(array_field(v, "b")?)?,
        asks: parse_levels(array_field(v, "a")?)?,
        exchange_ts_us: ms_to_us(u64_field_or_zero(v, "E")),
        recv_ts_us,
    }))
}

/// Parse `[["price","size"], ...]` level arrays.
pub fn parse_levels(levels: &[Value]) -> Result<Vec<PriceLevel>, FeedError> {
    levels
        .iter()
        .map(|level| {
            let arr = level
                .as_array()
                .ok_or_else(|| FeedError::Parse("level is not an array".into()))?;
            Ok(PriceLevel {
                price: decimal_field_at(arr, 0)?,
                size: decimal_field_at(arr, 1)?,
            })
        })
        .collect()
}

fn decimal_field_at(arr: &[Value], idx: usize) -> Result<rust_decimal::Decimal, FeedError> {
    use std::str::FromStr;
    let v = arr
        .get(idx)
        .ok_or_else(|| FeedError::Parse(format!("level missing element {idx}")))?;
    match v {
        Value::String(s) => rust_decimal::Decimal::from_str(s)
            .map_err(|_| FeedError::Parse(format!("bad level value {v}"))),
        Value::Number(n) => rust_decimal::Decimal::from_str(&n.to_string())
            .map_err(|_| FeedError::Parse(format!("bad level value {v}"))),
        _ => Err(FeedError::Parse(format!("bad level value {v}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use serde_json::json;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn ticker_fields_pass_through() {
        let v = json!({
            "e": "bookTicker", "u": 400900217, "E": 1568014460893u64,
            "s": "BTCUSDT", "b": "25.3519", "B": "31.21", "a": "25.3652", "A": "40.66"
        });
        let MarketEvent::Ticker(t) = ticker(&v, "BTC-USDT", 7).unwrap() else {
            panic!("expected ticker");
        };
        assert_eq!(t.symbol, "BTC-USDT");
        assert_eq!(t.bid_price, dec("25.3519"));
        assert_eq!(t.ask_size, dec("40.66"));
        assert_eq!(t.exchange_ts_us, 1_568_014_460_893_000);
        assert_eq!(t.recv_ts_us, 7);
    }

    #[test]
    fn agg_trade_side_from_maker_flag() {
        let v = json!({
            "e": "aggTrade", "E": 1672515782136u64, "s": "BTCUSDT", "a": 123456789u64,
            "p": "16500.50", "q": "0.001", "f": 100, "l": 105,
            "T": 1672515782136u64, "m": true
        });
        let MarketEvent::Trade(t) = trade(&v, "BTC-USDT", 0).unwrap() else {
            panic!("expected trade");
        };
        assert_eq!(t.side, Side::Sell);
        assert_eq!(t.id, 123456789);
        assert!(t.aggregated);
        assert_eq!(t.price, dec("16500.50"));
    }

    #[test]
    fn liquidation_unwraps_order_detail() {
        let v = json!({
            "e": "forceOrder", "E": 1568014460893u64,
            "o": {"s": "BTCUSDT", "S": "SELL", "q": "0.014", "p": "9910",
                  "ap": "9910", "X": "FILLED", "T": 1568014460891u64}
        });
        let MarketEvent::Liquidation(l) = liquidation(&v, "BTC-USDT", 0).unwrap() else {
            panic!("expected liquidation");
        };
        assert_eq!(l.side, Side::Sell);
        assert_eq!(l.quantity, dec("0.014"));
        assert_eq!(l.status, "FILLED");
        assert_eq!(l.id, 1568014460891);
    }

    #[test]
    fn funding_rate_is_exact() {
        let v = json!({
            "e": "markPriceUpdate", "E": 1562306400000u64, "s": "BTCUSDT",
            "p": "11794.15000000", "r": "0.00038167", "T": 1562334000000u64
        });
        let MarketEvent::Funding(f) = funding(&v, "BTC-USDT", 0).unwrap() else {
            panic!("expected funding");
        };
        assert_eq!(f.mark_price, dec("11794.15000000"));
        assert_eq!(f.rate, dec("0.00038167"));
        assert_eq!(f.next_funding_ts_us, 1_562_334_000_000_000);
    }

    #[test]
    fn candle_unwraps_kline_detail() {
        let v = json!({
            "e": "kline", "E": 1638747660000u64, "s": "BTCUSDT",
            "k": {"t": 1638747660000u64, "T": 1638747719999u64, "s": "BTCUSDT",
                  "i": "1m", "o": "0.0010", "c": "0.0020", "h": "0.0025",
                  "l": "0.0015", "v": "1000", "x": false}
        });
        let MarketEvent::Candle(c) = candle(&v, "BTC-USDT", 0).unwrap() else {
            panic!("expected candle");
        };
        assert_eq!(c.interval, "1m");
        assert_eq!(c.high, dec("0.0025"));
        assert!(!c.closed);
    }

    #[test]
    fn book_diff_parses_levels() {
        let v = json!({
            "e": "depthUpdate", "E": 1571889248277u64, "s": "BTCUSDT",
            "U": 390497796u64, "u": 390497878u64, "pu": 390497794u64,
            "b": [["7403.89", "0.002"], ["7403.90", "3.906"]],
            "a": [["7405.96", "3.340"]]
        });
        let MarketEvent::Book(b) = book_diff(&v, "BTC-USDT", false, 0).unwrap() else {
            panic!("expected book diff");
        };
        assert_eq!(b.first_update_id, 390497796);
        assert_eq!(b.final_update_id, 390497878);
        assert_eq!(b.bids.len(), 2);
        assert_eq!(b.bids[0].price, dec("7403.89"));
        assert_eq!(b.asks[0].size, dec("3.340"));
        assert!(!b.initial);
    }

    #[test]
    fn malformed_payload_fails_whole_message() {
        let v = json!({"e": "aggTrade", "s": "BTCUSDT"});
        assert!(matches!(trade(&v, "BTC-USDT", 0), Err(FeedError::Parse(_))));
    }
}
