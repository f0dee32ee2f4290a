use alloy::primitives::{Address, FixedBytes};
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use crate::X402Error;

/// Gateway-specific fields attached to a requirement. Unknown keys are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementExtra {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::money::deserialize_opt_decimal_string"
    )]
    pub estimated_cost: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::money::deserialize_opt_decimal_string"
    )]
    pub available_credit: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::money::deserialize_opt_decimal_string"
    )]
    pub amount_due: Option<String>,
    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

/// A single entry in the `accepts` array of a 402 response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirement {
    pub scheme: String,
    pub network: String,
    /// Smallest token unit, decimal string.
    pub max_amount_required: String,
    #[serde(default)]
    pub resource: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    pub pay_to: Address,
    /// Zero when the gateway omits it; such a requirement cannot be signed.
    #[serde(default)]
    pub max_timeout_seconds: u64,
    pub asset: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<RequirementExtra>,
}

/// The 402 response body returned by the gateway.
///
/// Entries of `accepts` that don't parse as a [`PaymentRequirement`] (another
/// chain family, missing fields) are kept verbatim in `unsupported` instead of
/// failing the whole body. `accepts` keeps the gateway's order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawRequirementsResponse")]
pub struct PaymentRequirementsResponse {
    pub x402_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub accepts: Vec<PaymentRequirement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unsupported: Vec<serde_json::Value>,
}

impl PaymentRequirementsResponse {
    /// True when the gateway offered nothing at all, parseable or not.
    pub fn is_empty(&self) -> bool {
        self.accepts.is_empty() && self.unsupported.is_empty()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRequirementsResponse {
    x402_version: u32,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    accepts: Vec<serde_json::Value>,
    #[serde(default)]
    unsupported: Vec<serde_json::Value>,
}

impl From<RawRequirementsResponse> for PaymentRequirementsResponse {
    fn from(raw: RawRequirementsResponse) -> Self {
        let mut accepts = Vec::with_capacity(raw.accepts.len());
        let mut unsupported = raw.unsupported;
        for entry in raw.accepts {
            match serde_json::from_value::<PaymentRequirement>(entry.clone()) {
                Ok(requirement) => accepts.push(requirement),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unsupported payment requirement");
                    unsupported.push(entry);
                }
            }
        }
        Self {
            x402_version: raw.x402_version,
            error: raw.error,
            accepts,
            unsupported,
        }
    }
}

/// EIP-3009 transfer authorization as it travels on the wire.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Authorization {
    pub from: Address,
    pub to: Address,
    /// Smallest token unit, decimal string. Never a float.
    pub value: String,
    #[serde_as(as = "DisplayFromStr")]
    pub valid_after: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub valid_before: u64,
    pub nonce: FixedBytes<32>,
}

/// An authorization together with its signature (`0x` + 130 hex).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentPayload {
    pub signature: String,
    pub authorization: Authorization,
}

/// Wire-format payment header (sent in `X-PAYMENT`, base64-encoded JSON).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentHeader {
    pub x402_version: u32,
    pub scheme: String,
    pub network: String,
    pub payload: PaymentPayload,
}

/// Base64-encode a payment header for the `X-PAYMENT` request header.
pub fn encode_payment_header(header: &PaymentHeader) -> Result<String, X402Error> {
    let json = serde_json::to_vec(header)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(&json))
}

/// Decode a payment header from its `X-PAYMENT` form.
pub fn decode_payment_header(encoded: &str) -> Result<PaymentHeader, X402Error> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| X402Error::Encoding(format!("invalid base64: {e}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| X402Error::InvalidPayment(format!("invalid payment header JSON: {e}")))
}
