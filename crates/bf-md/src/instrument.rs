//! Exchange instrument identifier parsing.
//!
//! Binance futures identifies instruments as `BASE-QUOTE` for perpetuals and
//! `BASE-QUOTE_YYMMDD` for dated contracts. The second, underscore-delimited
//! segment is present exactly when the contract carries an expiry.

use std::str::FromStr;

use bf_core::error::FeedError;
use bf_core::types::InstrumentKind;

/// Structured view of one instrument identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instrument {
    /// The `BASE-QUOTE` pair, without any expiry suffix.
    pub pair: String,
    pub base: String,
    pub quote: String,
    pub kind: InstrumentKind,
    /// Expiry label (e.g. `210625`), present only for dated contracts.
    pub expiry: Option<String>,
}

impl FromStr for Instrument {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (pair, expiry) = match s.split_once('_') {
            Some((pair, expiry)) if !expiry.is_empty() => (pair, Some(expiry.to_string())),
            Some(_) => {
                return Err(FeedError::Parse(format!("empty expiry segment in '{s}'")));
            }
            None => (s, None),
        };

        let (base, quote) = pair
            .split_once('-')
            .filter(|(b, q)| !b.is_empty() && !q.is_empty())
            .ok_or_else(|| FeedError::Parse(format!("instrument '{s}' is not BASE-QUOTE form")))?;

        let kind = if expiry.is_some() { InstrumentKind::Future } else { InstrumentKind::Perpetual };

        Ok(Self {
            pair: pair.to_string(),
            base: base.to_string(),
            quote: quote.to_string(),
            kind,
            expiry,
        })
    }
}

impl std::fmt::Display for Instrument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.expiry {
            Some(exp) => write!(f, "{}_{exp}", self.pair),
            None => write!(f, "{}", self.pair),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perpetual() {
        let inst: Instrument = "BTC-USDT".parse().unwrap();
        assert_eq!(inst.pair, "BTC-USDT");
        assert_eq!(inst.base, "BTC");
        assert_eq!(inst.quote, "USDT");
        assert_eq!(inst.kind, InstrumentKind::Perpetual);
        assert_eq!(inst.expiry, None);
    }

    #[test]
    fn dated_future() {
        let inst: Instrument = "BTC-USDT_210625".parse().unwrap();
        assert_eq!(inst.base, "BTC");
        assert_eq!(inst.quote, "USDT");
        assert_eq!(inst.kind, InstrumentKind::Future);
        assert_eq!(inst.expiry.as_deref(), Some("210625"));
        assert_eq!(inst.to_string(), "BTC-USDT_210625");
    }

    #[test]
    fn rejects_malformed() {
        assert!("BTCUSDT".parse::<Instrument>().is_err());
        assert!("BTC-".parse::<Instrument>().is_err());
        assert!("BTC-USDT_".parse::<Instrument>().is_err());
    }
}
