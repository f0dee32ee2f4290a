use alloy::primitives::{address, Address};

/// x402 protocol version spoken by the query gateway.
pub const X402_VERSION: u32 = 1;

/// x402 scheme name for EIP-3009 transfer authorizations.
pub const SCHEME_NAME: &str = "exact";

/// Base Sepolia chain ID.
pub const BASE_SEPOLIA_CHAIN_ID: u64 = 84532;

/// x402 network name for Base Sepolia.
pub const BASE_SEPOLIA_NETWORK: &str = "base-sepolia";

/// USDC contract on Base Sepolia; the EIP-712 verifying contract.
pub const USDC_BASE_SEPOLIA: Address = address!("036CbD53842c5426634e7929541eC2318f3dCF7e");

/// USDC has 6 decimal places.
pub const TOKEN_DECIMALS: u32 = 6;

/// Display symbol of the payment asset.
pub const TOKEN_SYMBOL: &str = "USDC";

/// Block explorer base URL.
pub const EXPLORER_BASE: &str = "https://sepolia.basescan.org";

/// Query endpoint on the gateway.
pub const QUERY_ENDPOINT_PATH: &str = "/api/query";

/// Header carrying the gateway API key on every attempt.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Header carrying the base64 payment payload on the paid retry.
pub const PAYMENT_HEADER: &str = "x-payment";

/// Response header carrying the base64 settlement result.
pub const PAYMENT_RESPONSE_HEADER: &str = "x-payment-response";

/// The typed-data domain every authorization is signed under.
///
/// These values are fixed for the deployment and are never taken from a
/// payment requirement returned by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentDomain {
    pub chain_id: u64,
    pub network: String,
    pub verifying_contract: Address,
    pub eip712_domain_name: String,
    pub eip712_domain_version: String,
    pub token_decimals: u32,
    pub token_symbol: String,
    pub explorer_base: String,
}

impl PaymentDomain {
    /// Explorer link for a settlement transaction.
    pub fn tx_url(&self, transaction: &str) -> String {
        format!("{}/tx/{}", self.explorer_base, transaction)
    }
}

impl Default for PaymentDomain {
    /// Defaults to USDC on Base Sepolia.
    fn default() -> Self {
        Self {
            chain_id: BASE_SEPOLIA_CHAIN_ID,
            network: BASE_SEPOLIA_NETWORK.to_string(),
            verifying_contract: USDC_BASE_SEPOLIA,
            eip712_domain_name: "USDC".to_string(),
            eip712_domain_version: "2".to_string(),
            token_decimals: TOKEN_DECIMALS,
            token_symbol: TOKEN_SYMBOL.to_string(),
            explorer_base: EXPLORER_BASE.to_string(),
        }
    }
}
