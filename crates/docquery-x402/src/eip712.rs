//! EIP-712 typed-data hashing and signing for EIP-3009 transfer authorizations.
//!
//! Provides functions for:
//! - Building the EIP-712 domain ([`payment_domain`])
//! - Converting wire authorizations into the typed struct ([`typed_authorization`])
//! - Computing signing hashes ([`signing_hash`])
//! - Signing and verifying with EIP-2 malleability protection ([`sign_authorization`], [`verify_authorization`])
//! - Generating cryptographically secure random nonces ([`random_nonce`])

use std::borrow::Cow;

use alloy::primitives::{Address, FixedBytes, Signature, B256, U256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use alloy::sol_types::{Eip712Domain, SolStruct};

use crate::payment::Authorization;
use crate::TransferWithAuthorization;
use crate::{PaymentDomain, X402Error};

/// Build the EIP-712 domain for the configured asset contract.
pub fn payment_domain(domain: &PaymentDomain) -> Eip712Domain {
    Eip712Domain {
        name: Some(Cow::Owned(domain.eip712_domain_name.clone())),
        version: Some(Cow::Owned(domain.eip712_domain_version.clone())),
        chain_id: Some(U256::from(domain.chain_id)),
        verifying_contract: Some(domain.verifying_contract),
        salt: None,
    }
}

/// Parse a decimal smallest-unit string into `U256`. Rejects anything that
/// is not a plain non-negative integer.
pub fn parse_amount(value: &str) -> Result<U256, X402Error> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(X402Error::InvalidPayment(format!(
            "amount '{value}' is not a non-negative integer"
        )));
    }
    U256::from_str_radix(value, 10)
        .map_err(|e| X402Error::InvalidPayment(format!("invalid amount '{value}': {e}")))
}

/// Convert a wire authorization into the typed struct that gets hashed.
pub fn typed_authorization(auth: &Authorization) -> Result<TransferWithAuthorization, X402Error> {
    Ok(TransferWithAuthorization {
        from: auth.from,
        to: auth.to,
        value: parse_amount(&auth.value)?,
        validAfter: U256::from(auth.valid_after),
        validBefore: U256::from(auth.valid_before),
        nonce: auth.nonce,
    })
}

/// Compute the EIP-712 signing hash of an authorization.
pub fn signing_hash(auth: &Authorization, domain: &PaymentDomain) -> Result<B256, X402Error> {
    let typed = typed_authorization(auth)?;
    Ok(typed.eip712_signing_hash(&payment_domain(domain)))
}

/// Sign an authorization and return the `0x`-prefixed 65-byte signature.
pub fn sign_authorization(
    signer: &PrivateKeySigner,
    auth: &Authorization,
    domain: &PaymentDomain,
) -> Result<String, X402Error> {
    let hash = signing_hash(auth, domain)?;
    let sig = signer
        .sign_hash_sync(&hash)
        .map_err(|e| X402Error::SignatureError(format!("signing failed: {e}")))?;
    Ok(encode_signature_hex(&sig))
}

/// secp256k1 curve order N / 2; signatures with s > this are malleable (EIP-2).
const SECP256K1_N_DIV_2: U256 = U256::from_limbs([
    0xBFD25E8CD0364140,
    0xBAAEDCE6AF48A03B,
    0xFFFFFFFFFFFFFFFE,
    0x7FFFFFFFFFFFFFFF,
]);

/// Recover the address that signed `auth`. Rejects high-s signatures.
pub fn verify_authorization(
    auth: &Authorization,
    signature_hex: &str,
    domain: &PaymentDomain,
) -> Result<Address, X402Error> {
    let signature_bytes = alloy::hex::decode(signature_hex.trim_start_matches("0x"))
        .map_err(|e| X402Error::SignatureError(format!("invalid signature hex: {e}")))?;

    if signature_bytes.len() != 65 {
        return Err(X402Error::SignatureError(format!(
            "signature must be 65 bytes, got {}",
            signature_bytes.len()
        )));
    }

    let sig = Signature::from_raw(&signature_bytes)
        .map_err(|e| X402Error::SignatureError(format!("invalid signature: {e}")))?;

    if sig.s() > SECP256K1_N_DIV_2 {
        return Err(X402Error::SignatureError(
            "high-s signature rejected (EIP-2 malleability)".to_string(),
        ));
    }

    let hash = signing_hash(auth, domain)?;
    sig.recover_address_from_prehash(&hash)
        .map_err(|e| X402Error::SignatureError(format!("recovery failed: {e}")))
}

/// Generate a random 32-byte nonce from the OS-seeded thread RNG.
/// Each call is independent, so concurrent signers never share a counter.
pub fn random_nonce() -> FixedBytes<32> {
    let mut bytes = [0u8; 32];
    rand::fill(&mut bytes);
    FixedBytes(bytes)
}

/// Encode a Signature to a hex string with 0x prefix (65 bytes -> 0x + 130 hex).
pub fn encode_signature_hex(sig: &Signature) -> String {
    format!("0x{}", alloy::hex::encode(sig.as_bytes()))
}
