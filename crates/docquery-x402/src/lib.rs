//! x402 payment primitives for the paid document query gateway.
//!
//! Implements the client half of HTTP 402 pay-per-query using EIP-712 signed
//! EIP-3009 `TransferWithAuthorization` messages over USDC.
//!
//! - [`validation`]: denylist query check and wallet address check
//! - [`payment`]: 402 challenge body, authorization, `X-PAYMENT` codec
//! - [`response`]: settlement result and `X-PAYMENT-RESPONSE` codec
//! - [`eip712`]: typed-data hashing, signing, verification, nonces
//! - [`money`]: decimal-string amounts, display formatting
//!
//! # Quick example
//!
//! ```no_run
//! use alloy::signers::local::PrivateKeySigner;
//! use x402::{eip712, Authorization, PaymentDomain};
//!
//! let signer = PrivateKeySigner::random();
//! let auth = Authorization {
//!     from: signer.address(),
//!     to: alloy::primitives::Address::ZERO,
//!     value: "50".to_string(),
//!     valid_after: 0,
//!     valid_before: 1_900_000_000,
//!     nonce: eip712::random_nonce(),
//! };
//! let signature = eip712::sign_authorization(&signer, &auth, &PaymentDomain::default()).unwrap();
//! ```

pub mod constants;
pub mod eip712;
pub mod error;
pub mod money;
pub mod payment;
pub mod response;
pub mod scheme;
pub mod validation;

use alloy::sol;

// EIP-3009 authorization struct. The sol! macro derives SolStruct which
// provides eip712_signing_hash().
sol! {
    #[derive(Debug, serde::Serialize, serde::Deserialize)]
    struct TransferWithAuthorization {
        address from;
        address to;
        uint256 value;
        uint256 validAfter;
        uint256 validBefore;
        bytes32 nonce;
    }
}

pub use constants::*;
pub use error::{ValidationError, X402Error};
pub use payment::*;
pub use response::*;
pub use scheme::*;
pub use validation::{validate_address, validate_query};
