use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;

use x402::{
    eip712::{parse_amount, random_nonce, sign_authorization},
    Authorization, PaymentDomain, PaymentHeader, PaymentPayload, PaymentRequirement,
    SchemeClient, X402Error,
};

/// Client-side scheme implementation: builds and signs EIP-3009
/// `TransferWithAuthorization` messages.
///
/// Use this with [`QueryClient`](crate::QueryClient) to pay for queries
/// automatically.
#[derive(Clone)]
pub struct Eip3009SchemeClient {
    signer: PrivateKeySigner,
    domain: PaymentDomain,
}

impl std::fmt::Debug for Eip3009SchemeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Eip3009SchemeClient")
            .field("address", &self.signer.address())
            .field("domain", &self.domain)
            .finish()
    }
}

impl Eip3009SchemeClient {
    /// Create a new client with the default USDC domain.
    pub fn new(signer: PrivateKeySigner) -> Self {
        Self {
            signer,
            domain: PaymentDomain::default(),
        }
    }

    /// Create a new client with a custom signing domain.
    pub fn with_domain(signer: PrivateKeySigner, domain: PaymentDomain) -> Self {
        Self { signer, domain }
    }

    pub fn domain(&self) -> &PaymentDomain {
        &self.domain
    }
}

fn unix_now() -> Result<u64, X402Error> {
    Ok(std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_err(|e| X402Error::ConfigError(format!("system time error: {e}")))?
        .as_secs())
}

impl SchemeClient for Eip3009SchemeClient {
    fn address(&self) -> Address {
        self.signer.address()
    }

    async fn create_payment_header(
        &self,
        x402_version: u32,
        requirement: &PaymentRequirement,
        from: Address,
    ) -> Result<PaymentHeader, X402Error> {
        // The value is signed as a uint256; reject anything that isn't one.
        parse_amount(&requirement.max_amount_required)?;

        if requirement.max_timeout_seconds == 0 {
            return Err(X402Error::InvalidPayment(
                "maxTimeoutSeconds must be greater than zero".to_string(),
            ));
        }

        if from != self.signer.address() {
            tracing::warn!(
                %from,
                signer = %self.signer.address(),
                "caller address differs from signing key address; gateway may reject the authorization"
            );
        }
        if requirement.network != self.domain.network {
            tracing::warn!(
                requirement_network = %requirement.network,
                domain_network = %self.domain.network,
                "requirement network differs from signing domain"
            );
        }

        let now = unix_now()?;
        let valid_before = now
            .checked_add(requirement.max_timeout_seconds)
            .ok_or_else(|| X402Error::InvalidPayment("maxTimeoutSeconds overflow".to_string()))?;

        let authorization = Authorization {
            from,
            to: requirement.pay_to,
            value: requirement.max_amount_required.clone(),
            valid_after: 0,
            valid_before,
            nonce: random_nonce(),
        };

        let signature = sign_authorization(&self.signer, &authorization, &self.domain)?;

        Ok(PaymentHeader {
            x402_version,
            scheme: requirement.scheme.clone(),
            network: requirement.network.clone(),
            payload: PaymentPayload {
                signature,
                authorization,
            },
        })
    }
}
