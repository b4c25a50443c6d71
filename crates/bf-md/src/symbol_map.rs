//! Bidirectional symbol mapping between canonical and exchange formats.
//!
//! The adapter speaks canonical `BASE-QUOTE[_EXPIRY]` symbols at its
//! boundaries, while Binance uses concatenated symbols (`BTCUSDT`,
//! `BTCUSDT_210625`). The map is built from the configured symbol list;
//! unknown symbols pass through unchanged.

use ahash::AHashMap;

/// Bidirectional symbol mapper with O(1) lookups in either direction.
#[derive(Debug, Clone, Default)]
pub struct SymbolMap {
    /// Exchange format → canonical format (e.g. `BTCUSDT` → `BTC-USDT`).
    exchange_to_canonical: AHashMap<String, String>,
}

impl SymbolMap {
    /// Build a mapper from a list of canonical symbols.
    pub fn from_canonical<S: AsRef<str>>(symbols: impl IntoIterator<Item = S>) -> Self {
        let mut map = Self::default();
        for sym in symbols {
            let canonical = sym.as_ref();
            map.exchange_to_canonical
                .insert(Self::to_exchange(canonical), canonical.to_string());
        }
        map
    }

    /// Convert a canonical symbol to exchange format. Pure string transform —
    /// the dash is dropped, the expiry suffix (if any) is kept.
    pub fn to_exchange(canonical: &str) -> String {
        canonical.replace('-', "")
    }

    /// Convert an exchange symbol back to canonical format.
    ///
    /// Returns the original string if no mapping exists.
    pub fn to_canonical<'a>(&'a self, exchange: &'a str) -> &'a str {
        self.exchange_to_canonical
            .get(exchange)
            .map(|s| s.as_str())
            .unwrap_or(exchange)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let map = SymbolMap::from_canonical(["BTC-USDT", "ETH-USDT"]);
        assert_eq!(SymbolMap::to_exchange("BTC-USDT"), "BTCUSDT");
        assert_eq!(map.to_canonical("BTCUSDT"), "BTC-USDT");
        assert_eq!(map.to_canonical("ETHUSDT"), "ETH-USDT");
    }

    #[test]
    fn dated_future_keeps_expiry_suffix() {
        let map = SymbolMap::from_canonical(["BTC-USDT_210625"]);
        assert_eq!(SymbolMap::to_exchange("BTC-USDT_210625"), "BTCUSDT_210625");
        assert_eq!(map.to_canonical("BTCUSDT_210625"), "BTC-USDT_210625");
    }

    #[test]
    fn unknown_symbol_passthrough() {
        let map = SymbolMap::from_canonical(["BTC-USDT"]);
        assert_eq!(map.to_canonical("DOGEUSDT"), "DOGEUSDT");
    }
}
