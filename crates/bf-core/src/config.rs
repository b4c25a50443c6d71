//! Configuration parsing for the feed adapter.
//!
//! The adapter reads its settings from a single JSON config file: the global
//! symbol set (canonical `BASE-QUOTE[_EXPIRY]` form), the channel list, and an
//! optional per-channel symbol override.
//!
//! # Example config
//!
//! ```json
//! {
//!   "module_name": "binance_futures_md",
//!   "log_path": "/tmp/log",
//!   "symbols": ["BTC-USDT", "ETH-USDT"],
//!   "channels": ["ticker", "trades", "depth", "open_interest"],
//!   "subscription": { "candles": ["BTC-USDT"] },
//!   "candle_interval": "1m"
//! }
//! ```

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;

use crate::types::Channel;

/// Adapter configuration, deserialized from a JSON file.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Module name used for logging and log-file prefixes.
    pub module_name: Option<String>,

    /// Optional directory for daily-rotating log files.
    pub log_path: Option<String>,

    /// Global symbol set in canonical form (e.g. `["BTC-USDT"]`).
    pub symbols: Vec<String>,

    /// Channels to subscribe.
    pub channels: Vec<Channel>,

    /// Per-channel symbol override. Channels absent from this map use the
    /// global `symbols` set.
    pub subscription: Option<HashMap<Channel, Vec<String>>>,

    /// Candle interval (default `"1m"`).
    pub candle_interval: Option<String>,

    /// Open-interest polling period in seconds (default 60).
    pub open_interest_period_secs: Option<u64>,

    /// Delay between consecutive open-interest requests in one polling round
    /// (default 1).
    pub open_interest_stagger_secs: Option<u64>,

    /// Depth limit for REST book snapshots (default 1000).
    pub snapshot_depth: Option<u32>,
}

impl FeedConfig {
    /// Returns the module name, defaulting to `binance_futures_md`.
    pub fn module_name(&self) -> &str {
        self.module_name.as_deref().unwrap_or("binance_futures_md")
    }

    /// Returns the candle interval, defaulting to `1m`.
    pub fn candle_interval(&self) -> &str {
        self.candle_interval.as_deref().unwrap_or("1m")
    }

    /// Returns the open-interest polling period.
    pub fn open_interest_period(&self) -> Duration {
        Duration::from_secs(self.open_interest_period_secs.unwrap_or(60))
    }

    /// Returns the inter-request stagger within one polling round.
    pub fn open_interest_stagger(&self) -> Duration {
        Duration::from_secs(self.open_interest_stagger_secs.unwrap_or(1))
    }

    /// Returns the REST snapshot depth limit.
    pub fn snapshot_depth(&self) -> u32 {
        self.snapshot_depth.unwrap_or(1000)
    }

    /// Returns `true` if the channel is configured.
    pub fn has_channel(&self, chan: Channel) -> bool {
        self.channels.contains(&chan)
    }

    /// Symbols for one channel: the per-channel override if present,
    /// otherwise the global set.
    pub fn channel_symbols(&self, chan: Channel) -> &[String] {
        self.subscription
            .as_ref()
            .and_then(|s| s.get(&chan))
            .map(|v| v.as_slice())
            .unwrap_or(&self.symbols)
    }
}

/// Load and parse a JSON config file.
pub fn load_config(path: &std::path::Path) -> anyhow::Result<FeedConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: FeedConfig = serde_json::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FeedConfig {
        serde_json::from_str(
            r#"{
                "symbols": ["BTC-USDT", "ETH-USDT"],
                "channels": ["ticker", "depth", "open_interest"],
                "subscription": { "depth": ["BTC-USDT"] }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn defaults() {
        let cfg = sample();
        assert_eq!(cfg.module_name(), "binance_futures_md");
        assert_eq!(cfg.candle_interval(), "1m");
        assert_eq!(cfg.open_interest_period(), Duration::from_secs(60));
        assert_eq!(cfg.open_interest_stagger(), Duration::from_secs(1));
        assert_eq!(cfg.snapshot_depth(), 1000);
    }

    #[test]
    fn channel_symbol_override() {
        let cfg = sample();
        assert_eq!(cfg.channel_symbols(Channel::Depth), ["BTC-USDT"]);
        assert_eq!(cfg.channel_symbols(Channel::Ticker), ["BTC-USDT", "ETH-USDT"]);
    }

    #[test]
    fn has_channel() {
        let cfg = sample();
        assert!(cfg.has_channel(Channel::OpenInterest));
        assert!(!cfg.has_channel(Channel::Candles));
    }
}
