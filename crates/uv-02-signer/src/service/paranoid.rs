//! Paranoid signer: no resident key between calls.

use super::sign_canonical;
use crate::domain::errors::SignerError;
use crate::domain::types::{SignedPayload, SignerMode};
use crate::ports::inbound::MessageSigner;
use crate::ports::outbound::PasswordProvider;
use parking_lot::Mutex;
use serde_json::Value;
use shared_crypto::Password;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uv_01_keystore::KeystoreManager;

/// Public facts cached after a successful `authenticate`. No key material.
#[derive(Debug, Clone)]
struct ParanoidSession {
    keystore_path: PathBuf,
    address: String,
    public_key: String,
}

/// Re-derives the key from the keystore for every signature.
///
/// Each `sign_message` asks the [`PasswordProvider`] for the password,
/// decrypts the keystore, signs, and drops the key before returning.
///
/// Key derivation runs under `signing` only. `session` is held just long
/// enough to copy or replace the public facts, so the accessors never wait
/// on a derivation. A signature finished after `lock()`, `destroy()` or a
/// fresh `authenticate()` (any `epoch` change) is discarded.
pub struct ParanoidSigner {
    provider: Arc<dyn PasswordProvider>,
    session: Mutex<Option<ParanoidSession>>,
    signing: Mutex<()>,
    epoch: AtomicU64,
    destroyed: AtomicBool,
}

impl ParanoidSigner {
    /// Create a locked paranoid signer.
    pub fn new(provider: Arc<dyn PasswordProvider>) -> Self {
        Self {
            provider,
            session: Mutex::new(None),
            signing: Mutex::new(()),
            epoch: AtomicU64::new(0),
            destroyed: AtomicBool::new(false),
        }
    }

    /// Replace the session. Caller holds the `session` lock.
    fn replace_session(&self, slot: &mut Option<ParanoidSession>, session: Option<ParanoidSession>) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        *slot = session;
    }

    fn derive_and_sign(&self, session: &ParanoidSession, payload: &Value) -> Result<SignedPayload, SignerError> {
        let password = self.provider.password_for(&session.keystore_path).ok_or_else(|| {
            SignerError::PasswordUnavailable(session.keystore_path.display().to_string())
        })?;
        let keypair = KeystoreManager::unlock(&session.keystore_path, &password)
            .map_err(SignerError::Authentication)?;
        if keypair.address().to_checksum() != session.address {
            return Err(SignerError::Signing(
                "keystore no longer holds the authenticated key".into(),
            ));
        }
        sign_canonical(&keypair, payload)
    }

    fn cached<T>(&self, f: impl FnOnce(&ParanoidSession) -> T) -> Result<T, SignerError> {
        self.session
            .lock()
            .as_ref()
            .map(f)
            .ok_or(SignerError::NotAuthenticated)
    }
}

impl MessageSigner for ParanoidSigner {
    fn mode(&self) -> SignerMode {
        SignerMode::Paranoid
    }

    fn authenticate(&self, keystore_path: &Path, password: &Password) -> Result<(), SignerError> {
        if self.destroyed.load(Ordering::Acquire) {
            return Err(SignerError::Destroyed);
        }

        // Decrypt once to prove the password, keep only the public facts.
        let keypair = match KeystoreManager::unlock(keystore_path, password) {
            Ok(keypair) => keypair,
            Err(e) => {
                let mut guard = self.session.lock();
                self.replace_session(&mut guard, None);
                drop(guard);
                warn!(path = %keystore_path.display(), "[signer] Authentication failed");
                return Err(SignerError::Authentication(e));
            }
        };
        let session = ParanoidSession {
            keystore_path: keystore_path.to_path_buf(),
            address: keypair.address().to_checksum(),
            public_key: keypair.public_key_hex(),
        };
        drop(keypair);

        let mut guard = self.session.lock();
        if self.destroyed.load(Ordering::Acquire) {
            return Err(SignerError::Destroyed);
        }
        info!(address = %session.address, "[signer] Unlocked (paranoid mode)");
        self.replace_session(&mut guard, Some(session));
        Ok(())
    }

    fn is_authenticated(&self) -> bool {
        self.session.lock().is_some()
    }

    fn address(&self) -> Result<String, SignerError> {
        self.cached(|s| s.address.clone())
    }

    fn public_key(&self) -> Result<String, SignerError> {
        self.cached(|s| s.public_key.clone())
    }

    fn sign_message(&self, payload: &Value) -> Result<SignedPayload, SignerError> {
        let _signing = self.signing.lock();
        let (session, epoch) = {
            let guard = self.session.lock();
            let session = guard.clone().ok_or(SignerError::NotAuthenticated)?;
            (session, self.epoch.load(Ordering::Acquire))
        };

        let result = self.derive_and_sign(&session, payload);

        let mut guard = self.session.lock();
        if self.epoch.load(Ordering::Acquire) != epoch {
            debug!("[signer] Session changed while signing, signature discarded");
            return Err(SignerError::NotAuthenticated);
        }
        match result {
            Ok(signed) => {
                debug!("[signer] Paranoid signature produced, key discarded");
                Ok(signed)
            }
            Err(e) => {
                warn!(error = %e, "[signer] Paranoid signing failed, locking");
                self.replace_session(&mut guard, None);
                Err(e)
            }
        }
    }

    fn lock(&self) {
        let mut guard = self.session.lock();
        if guard.is_some() {
            self.replace_session(&mut guard, None);
            info!("[signer] Locked");
        }
    }

    fn destroy(&self) {
        let mut guard = self.session.lock();
        self.replace_session(&mut guard, None);
        if !self.destroyed.swap(true, Ordering::AcqRel) {
            info!("[signer] Destroyed");
        }
    }
}
