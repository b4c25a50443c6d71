//! Time utilities.
//!
//! All timestamps flowing through the adapter are **microseconds since Unix
//! epoch**. Binance sends milliseconds on the wire, so exchange timestamps
//! pass through [`ms_to_us`] at the normalization boundary.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current time as **microseconds** since Unix epoch.
#[inline]
pub fn now_us() -> u64 {
    let d = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    d.as_secs() * 1_000_000 + d.subsec_micros() as u64
}

/// Current time as **milliseconds** since Unix epoch.
#[inline]
pub fn now_ms() -> u64 {
    now_us() / 1_000
}

/// Convert an exchange millisecond timestamp to microseconds.
#[inline]
pub fn ms_to_us(ms: u64) -> u64 {
    ms * 1_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ms_conversion() {
        assert_eq!(ms_to_us(1_589_437_530_011), 1_589_437_530_011_000);
    }

    #[test]
    fn now_is_after_2020() {
        assert!(now_us() > 1_577_836_800_000_000);
    }
}
