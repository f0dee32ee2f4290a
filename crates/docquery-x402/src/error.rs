use thiserror::Error;

/// Errors returned by x402 operations.
#[derive(Debug, Error)]
pub enum X402Error {
    #[error("signature error: {0}")]
    SignatureError(String),

    #[error("invalid payment: {0}")]
    InvalidPayment(String),

    #[error("config error: {0}")]
    ConfigError(String),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

/// Input rejected before any network activity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("query contains forbidden operation: {0}")]
    ForbiddenOperation(&'static str),

    #[error("invalid wallet address '{0}': expected 0x followed by 40 hex characters")]
    InvalidAddress(String),
}
