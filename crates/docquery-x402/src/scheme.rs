//! Client-side signing seam.
//!
//! The orchestrator only ever talks to a [`SchemeClient`]; the EIP-3009
//! implementation lives in the client crate and tests swap in their own.

use alloy::primitives::Address;

use crate::error::X402Error;
use crate::payment::{PaymentHeader, PaymentRequirement};

/// Creates signed payment headers for a gateway challenge.
pub trait SchemeClient: Send + Sync {
    /// Address controlled by the signing key.
    fn address(&self) -> Address;

    /// Sign a fresh authorization from `from` for the given requirement.
    fn create_payment_header(
        &self,
        x402_version: u32,
        requirement: &PaymentRequirement,
        from: Address,
    ) -> impl std::future::Future<Output = Result<PaymentHeader, X402Error>> + Send;
}
