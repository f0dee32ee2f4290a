//! Monetary amounts as decimal strings.
//!
//! Amounts travel end-to-end as strings. [`rust_decimal::Decimal`] is used for
//! display only; nothing here produces a float.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

use crate::X402Error;

/// Convert a smallest-unit integer string (e.g. `"50"`) into a display amount
/// with `decimals` places (e.g. `"0.000050"` for 6 decimals).
pub fn format_atomic_amount(atomic: &str, decimals: u32) -> Result<String, X402Error> {
    let trimmed = atomic.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(X402Error::InvalidPayment(format!(
            "amount '{atomic}' is not a non-negative integer"
        )));
    }
    let units: i128 = trimmed
        .parse()
        .map_err(|e| X402Error::InvalidPayment(format!("amount '{atomic}': {e}")))?;
    let value = Decimal::try_from_i128_with_scale(units, decimals)
        .map_err(|e| X402Error::InvalidPayment(format!("amount '{atomic}': {e}")))?;
    Ok(value.to_string())
}

/// Parse a display amount such as `"0.000050"` or `"$0.01"`.
pub fn parse_display_amount(amount: &str) -> Option<Decimal> {
    let cleaned = amount.trim().trim_start_matches('$');
    Decimal::from_str(cleaned).ok()
}

/// Render a display amount with its asset symbol, keeping the gateway's precision.
pub fn describe_amount(amount: &str, symbol: &str) -> String {
    match parse_display_amount(amount) {
        Some(value) => format!("{value} {symbol}"),
        None => format!("{amount} {symbol}"),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(serde_json::Number),
}

/// Accept a JSON string or number and keep its textual form.
pub fn deserialize_opt_decimal_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<StringOrNumber> = Option::deserialize(deserializer)?;
    Ok(raw.map(|v| match v {
        StringOrNumber::String(s) => s,
        StringOrNumber::Number(n) => n.to_string(),
    }))
}
