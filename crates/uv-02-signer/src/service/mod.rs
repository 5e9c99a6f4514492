//! # Signer Service
//!
//! The two `MessageSigner` strategies and the factory that picks one.

mod paranoid;
mod standard;

pub use paranoid::ParanoidSigner;
pub use standard::SessionSigner;

use crate::domain::errors::SignerError;
use crate::domain::types::{SignedPayload, SignerConfig, SignerMode};
use crate::ports::inbound::MessageSigner;
use crate::ports::outbound::PasswordProvider;
use serde_json::Value;
use shared_crypto::{recover_signer, Address, RecoverableSignature, Secp256k1KeyPair};
use std::sync::Arc;

/// Build the signer selected by `config.mode`.
///
/// `provider` is only consulted in paranoid mode.
pub fn build_signer(
    config: SignerConfig,
    provider: Arc<dyn PasswordProvider>,
) -> Arc<dyn MessageSigner> {
    match config.mode {
        SignerMode::Standard => Arc::new(SessionSigner::new(config.session_timeout)),
        SignerMode::Paranoid => Arc::new(ParanoidSigner::new(provider)),
    }
}

/// Check that `signature` over `canonical_payload` was produced by `expected_address`.
///
/// Returns `Ok(false)` for a well-formed signature by another key.
pub fn verify_signed_payload(
    canonical_payload: &str,
    signature: &str,
    expected_address: &str,
) -> Result<bool, SignerError> {
    let signature = RecoverableSignature::from_hex(signature)
        .map_err(|e| SignerError::Signing(e.to_string()))?;
    let expected =
        Address::from_hex(expected_address).map_err(|e| SignerError::Signing(e.to_string()))?;
    let recovered = recover_signer(canonical_payload.as_bytes(), &signature)
        .map_err(|e| SignerError::Signing(e.to_string()))?;
    Ok(recovered == expected)
}

pub(crate) fn sign_canonical(
    keypair: &Secp256k1KeyPair,
    payload: &Value,
) -> Result<SignedPayload, SignerError> {
    let canonical_payload = shared_types::canonicalize(payload);
    let signature = keypair
        .sign_message(canonical_payload.as_bytes())
        .map_err(|e| SignerError::Signing(e.to_string()))?;
    Ok(SignedPayload {
        signature: signature.to_hex(),
        canonical_payload,
    })
}
