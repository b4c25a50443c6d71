//! Shared JSON field-access helpers.
//!
//! Binance encodes prices and sizes as JSON strings (`"16500.50"`) and ids and
//! timestamps as native numbers. These helpers pull typed fields out of a
//! `serde_json::Value`, turning a missing or ill-typed field into a
//! [`FeedError::Parse`] so the whole message fails as malformed rather than
//! being half-processed.

use std::str::FromStr;

use bf_core::error::FeedError;
use rust_decimal::Decimal;
use serde_json::Value;

/// Extract a field as an exact decimal (string or native number).
pub fn decimal_field(v: &Value, key: &str) -> Result<Decimal, FeedError> {
    let field = v.get(key).ok_or_else(|| missing(key))?;
    match field {
        Value::String(s) => Decimal::from_str(s).map_err(|_| invalid(key, field)),
        // Numbers go through their exact textual form, not via f64.
        Value::Number(n) => Decimal::from_str(&n.to_string()).map_err(|_| invalid(key, field)),
        _ => Err(invalid(key, field)),
    }
}

/// Extract a field as `u64` (string or native number).
pub fn u64_field(v: &Value, key: &str) -> Result<u64, FeedError> {
    let field = v.get(key).ok_or_else(|| missing(key))?;
    match field {
        Value::String(s) => s.parse().map_err(|_| invalid(key, field)),
        Value::Number(_) => field.as_u64().ok_or_else(|| invalid(key, field)),
        _ => Err(invalid(key, field)),
    }
}

/// Extract a field as `u64`, defaulting to 0 when absent.
///
/// Binance omits the event-time field on a few message shapes.
pub fn u64_field_or_zero(v: &Value, key: &str) -> u64 {
    u64_field(v, key).unwrap_or(0)
}

/// Extract a string field.
pub fn str_field<'a>(v: &'a Value, key: &str) -> Result<&'a str, FeedError> {
    v.get(key)
        .and_then(|f| f.as_str())
        .ok_or_else(|| missing(key))
}

/// Extract a boolean field.
pub fn bool_field(v: &Value, key: &str) -> Result<bool, FeedError> {
    v.get(key)
        .and_then(|f| f.as_bool())
        .ok_or_else(|| missing(key))
}

/// Extract an object field.
pub fn object_field<'a>(v: &'a Value, key: &str) -> Result<&'a Value, FeedError> {
    v.get(key)
        .filter(|f| f.is_object())
        .ok_or_else(|| missing(key))
}

/// Extract an array field.
pub fn array_field<'a>(v: &'a Value, key: &str) -> Result<&'a Vec<Value>, FeedError> {
    v.get(key)
        .and_then(|f| f.as_array())
        .ok_or_else(|| missing(key))
}

fn missing(key: &str) -> FeedError {
    FeedError::Parse(format!("missing or ill-typed field '{key}'"))
}

fn invalid(key: &str, value: &Value) -> FeedError {
    FeedError::Parse(format!("field '{key}' has invalid value {value}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decimal_from_string_and_number() {
        let v = json!({"p": "16500.50", "r": 0.00038167});
        assert_eq!(decimal_field(&v, "p").unwrap(), Decimal::from_str("16500.50").unwrap());
        assert_eq!(decimal_field(&v, "r").unwrap(), Decimal::from_str("0.00038167").unwrap());
    }

    #[test]
    fn u64_from_string_and_number() {
        let v = json!({"a": 123456789u64, "b": "42"});
        assert_eq!(u64_field(&v, "a").unwrap(), 123456789);
        assert_eq!(u64_field(&v, "b").unwrap(), 42);
        assert_eq!(u64_field_or_zero(&v, "missing"), 0);
    }

    #[test]
    fn missing_field_is_parse_error() {
        let v = json!({});
        assert!(matches!(decimal_field(&v, "p"), Err(FeedError::Parse(_))));
        assert!(matches!(str_field(&v, "s"), Err(FeedError::Parse(_))));
    }
}
