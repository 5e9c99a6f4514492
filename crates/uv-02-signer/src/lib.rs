//! # Message Signer Subsystem (UV-02)
//!
//! Holds (or re-derives) the wallet key and signs canonical message bodies.
//!
//! ## Architecture
//!
//! - **Ports** (`ports/`): `MessageSigner` (inbound), `PasswordProvider` (outbound)
//! - **Service** (`service/`): `SessionSigner`, `ParanoidSigner`, `build_signer`
//! - **Adapters** (`adapters/`): in-memory password provider
//!
//! ## Modes
//!
//! | Mode | Key lifetime | Cost per signature |
//! |------|--------------|--------------------|
//! | Standard | Until `lock()` or the session timeout | One ECDSA signature |
//! | Paranoid | One `sign_message` call | Password request + Argon2id + ECDSA |
//!
//! ## Signature Scheme
//!
//! `canonical_json(data)` is hashed as an EIP-191 personal message
//! (Keccak-256) and signed with recoverable secp256k1 ECDSA. The signature is
//! `0x`-hex `r || s || v` with `v` in `{27, 28}`, so a hub can recover the
//! wallet address directly.
//!
//! ## Fail-Closed
//!
//! Any failure while decrypting or signing leaves the signer locked. Signing
//! holds the state mutex for its whole duration, so `lock()` and `destroy()`
//! never interleave with a signature in progress.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::StaticPasswordProvider;
pub use domain::errors::SignerError;
pub use domain::types::{SignedPayload, SignerConfig, SignerMode};
pub use ports::inbound::MessageSigner;
pub use ports::outbound::PasswordProvider;
pub use service::{build_signer, verify_signed_payload, ParanoidSigner, SessionSigner};
