use alloy::primitives::Address;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::X402Error;

/// Settlement proof returned in the `X-PAYMENT-RESPONSE` header.
///
/// Absent when the query was covered entirely by credit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer: Option<Address>,
    /// Transaction hash of the on-chain transfer.
    pub transaction: String,
    pub network: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::money::deserialize_opt_decimal_string"
    )]
    pub timestamp: Option<String>,
}

/// Decode the settlement header: base64 JSON, with plain JSON as a fallback.
pub fn decode_settlement_header(value: &str) -> Result<SettlementResult, X402Error> {
    let value = value.trim();
    if let Ok(bytes) = base64::engine::general_purpose::STANDARD.decode(value) {
        if let Ok(settlement) = serde_json::from_slice::<SettlementResult>(&bytes) {
            return Ok(settlement);
        }
    }
    serde_json::from_str(value)
        .map_err(|e| X402Error::Encoding(format!("invalid settlement header: {e}")))
}

/// Encode a settlement for the `X-PAYMENT-RESPONSE` header.
pub fn encode_settlement_header(settlement: &SettlementResult) -> Result<String, X402Error> {
    let json = serde_json::to_vec(settlement)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(&json))
}
