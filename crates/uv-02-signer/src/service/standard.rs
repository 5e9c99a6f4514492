//! Standard (session-cached) signer.

use super::sign_canonical;
use crate::domain::errors::SignerError;
use crate::domain::types::{SignedPayload, SignerMode};
use crate::ports::inbound::MessageSigner;
use parking_lot::Mutex;
use serde_json::Value;
use shared_crypto::{Password, Secp256k1KeyPair};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{info, warn};
use uv_01_keystore::KeystoreManager;

enum SignerState {
    Locked,
    Unlocked {
        keypair: Secp256k1KeyPair,
        unlocked_at: Instant,
    },
}

/// Keeps the unlocked key in memory until `lock()` or the session timeout.
pub struct SessionSigner {
    state: Mutex<SignerState>,
    session_timeout: Option<Duration>,
    destroyed: AtomicBool,
}

impl SessionSigner {
    /// Create a locked signer. `None` disables session expiry.
    pub fn new(session_timeout: Option<Duration>) -> Self {
        Self {
            state: Mutex::new(SignerState::Locked),
            session_timeout,
            destroyed: AtomicBool::new(false),
        }
    }

    /// Run `f` with the keypair while holding the state lock.
    ///
    /// An expired session is locked here, before `f` can see the key.
    fn with_keypair<T>(
        &self,
        f: impl FnOnce(&Secp256k1KeyPair) -> Result<T, SignerError>,
    ) -> Result<T, SignerError> {
        let mut state = self.state.lock();
        let expired = match &*state {
            SignerState::Locked => return Err(SignerError::NotAuthenticated),
            SignerState::Unlocked { unlocked_at, .. } => self
                .session_timeout
                .is_some_and(|timeout| unlocked_at.elapsed() >= timeout),
        };
        if expired {
            *state = SignerState::Locked;
            info!("[signer] Session expired, signer locked");
            return Err(SignerError::NotAuthenticated);
        }
        match &*state {
            SignerState::Unlocked { keypair, .. } => f(keypair),
            SignerState::Locked => Err(SignerError::NotAuthenticated),
        }
    }
}

impl MessageSigner for SessionSigner {
    fn mode(&self) -> SignerMode {
        SignerMode::Standard
    }

    fn authenticate(&self, keystore_path: &Path, password: &Password) -> Result<(), SignerError> {
        if self.destroyed.load(Ordering::Acquire) {
            return Err(SignerError::Destroyed);
        }

        let keypair = match KeystoreManager::unlock(keystore_path, password) {
            Ok(keypair) => keypair,
            Err(e) => {
                *self.state.lock() = SignerState::Locked;
                warn!(path = %keystore_path.display(), "[signer] Authentication failed");
                return Err(SignerError::Authentication(e));
            }
        };

        let mut state = self.state.lock();
        if self.destroyed.load(Ordering::Acquire) {
            return Err(SignerError::Destroyed);
        }
        info!(address = %keypair.address(), "[signer] Unlocked (standard mode)");
        *state = SignerState::Unlocked {
            keypair,
            unlocked_at: Instant::now(),
        };
        Ok(())
    }

    fn is_authenticated(&self) -> bool {
        self.with_keypair(|_| Ok(())).is_ok()
    }

    fn address(&self) -> Result<String, SignerError> {
        self.with_keypair(|keypair| Ok(keypair.address().to_checksum()))
    }

    fn public_key(&self) -> Result<String, SignerError> {
        self.with_keypair(|keypair| Ok(keypair.public_key_hex()))
    }

    fn sign_message(&self, payload: &Value) -> Result<SignedPayload, SignerError> {
        let result = self.with_keypair(|keypair| sign_canonical(keypair, payload));
        if let Err(SignerError::Signing(reason)) = &result {
            warn!(%reason, "[signer] Signing failed, locking");
            self.lock();
        }
        result
    }

    fn lock(&self) {
        let mut state = self.state.lock();
        if matches!(*state, SignerState::Unlocked { .. }) {
            info!("[signer] Locked");
        }
        *state = SignerState::Locked;
    }

    fn destroy(&self) {
        let mut state = self.state.lock();
        *state = SignerState::Locked;
        if !self.destroyed.swap(true, Ordering::AcqRel) {
            info!("[signer] Destroyed");
        }
    }
}
