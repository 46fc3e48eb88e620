//! Service-account credential store.
//!
//! The service account password lives in an encrypted file on disk,
//! sealed with AES-256-GCM under a key derived via HKDF-SHA256 from the
//! operator-supplied master key and the local hostname. Binding the
//! derivation to the host means the file only opens on the machine it was
//! sealed on. The secret is read once at startup and reused for every
//! downstream connection.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use hkdf::Hkdf;
use sha2::Sha256;
use std::path::Path;
use thiserror::Error;

/// Length of the AES-256 key in bytes.
const KEY_LENGTH: usize = 32;

/// Length of the GCM nonce in bytes.
const NONCE_LENGTH: usize = 12;

/// Length of the GCM authentication tag in bytes.
const TAG_LENGTH: usize = 16;

/// Context string for HKDF key derivation.
const HKDF_INFO: &[u8] = b"embark-service-credential-v1";

/// Errors that can occur reading the credential store.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The master key is not valid.
    #[error("invalid master key: {message}")]
    InvalidKey { message: String },

    /// The credential file could not be read.
    #[error("credential file unreadable: {message}")]
    Io { message: String },

    /// Decryption failed — wrong key, wrong host, or a tampered file.
    #[error("credential decryption failed: {message}")]
    DecryptionFailed { message: String },

    /// Encryption failed.
    #[error("credential encryption failed: {message}")]
    EncryptionFailed { message: String },
}

impl From<CredentialError> for embark_core::EmbarkError {
    fn from(err: CredentialError) -> Self {
        embark_core::EmbarkError::configuration(err.to_string())
    }
}

/// The local host identity the credential file is bound to.
///
/// Hostname from the environment, then `/etc/hostname`, then a fixed
/// fallback so the derivation is always defined.
pub fn local_host_binding() -> String {
    if let Ok(name) = std::env::var("HOSTNAME") {
        let name = name.trim().to_string();
        if !name.is_empty() {
            return name;
        }
    }

    if let Ok(contents) = std::fs::read_to_string("/etc/hostname") {
        let name = contents.trim().to_string();
        if !name.is_empty() {
            return name;
        }
    }

    "localhost".to_string()
}

/// Encrypted, host-bound credential store.
#[derive(Clone)]
pub struct CredentialStore {
    /// AES key derived from the master key and the host binding.
    derived_key: [u8; KEY_LENGTH],
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore").finish_non_exhaustive()
    }
}

impl CredentialStore {
    /// Create a store from a hex-encoded 32-byte master key, bound to the
    /// given host identity.
    pub fn from_hex_key(hex_key: &str, host_binding: &str) -> Result<Self, CredentialError> {
        let bytes = hex::decode(hex_key).map_err(|e| CredentialError::InvalidKey {
            message: format!("invalid hex key: {e}"),
        })?;

        if bytes.len() != KEY_LENGTH {
            return Err(CredentialError::InvalidKey {
                message: format!("key must be {} bytes, got {}", KEY_LENGTH, bytes.len()),
            });
        }

        let mut master_key = [0u8; KEY_LENGTH];
        master_key.copy_from_slice(&bytes);

        let hkdf = Hkdf::<Sha256>::new(Some(host_binding.as_bytes()), &master_key);
        let mut derived_key = [0u8; KEY_LENGTH];
        hkdf.expand(HKDF_INFO, &mut derived_key)
            .map_err(|e| CredentialError::InvalidKey {
                message: format!("key derivation failed: {e}"),
            })?;

        Ok(Self { derived_key })
    }

    /// Seal a plaintext secret into the on-disk format
    /// (nonce || ciphertext || tag).
    pub fn seal(&self, plaintext: &str) -> Result<Vec<u8>, CredentialError> {
        let cipher = Aes256Gcm::new_from_slice(&self.derived_key).map_err(|e| {
            CredentialError::EncryptionFailed {
                message: format!("failed to create cipher: {e}"),
            }
        })?;

        use rand::rngs::OsRng;
        use rand::RngCore;
        let mut nonce_bytes = [0u8; NONCE_LENGTH];
        OsRng
            .try_fill_bytes(&mut nonce_bytes)
            .map_err(|e| CredentialError::EncryptionFailed {
                message: format!("nonce generation failed: {e}"),
            })?;
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher.encrypt(nonce, plaintext.as_bytes()).map_err(|e| {
            CredentialError::EncryptionFailed {
                message: format!("encryption failed: {e}"),
            }
        })?;

        let mut result = Vec::with_capacity(NONCE_LENGTH + ciphertext.len());
        result.extend_from_slice(&nonce_bytes);
        result.extend_from_slice(&ciphertext);

        Ok(result)
    }

    /// Open a sealed secret.
    pub fn open(&self, sealed: &[u8]) -> Result<String, CredentialError> {
        if sealed.len() < NONCE_LENGTH + TAG_LENGTH {
            return Err(CredentialError::DecryptionFailed {
                message: "sealed data too short".to_string(),
            });
        }

        let cipher = Aes256Gcm::new_from_slice(&self.derived_key).map_err(|e| {
            CredentialError::DecryptionFailed {
                message: format!("failed to create cipher: {e}"),
            }
        })?;

        let (nonce_bytes, encrypted) = sealed.split_at(NONCE_LENGTH);
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = cipher.decrypt(nonce, encrypted).map_err(|e| {
            CredentialError::DecryptionFailed {
                message: format!("decryption failed: {e}"),
            }
        })?;

        String::from_utf8(plaintext).map_err(|_| CredentialError::DecryptionFailed {
            message: "decrypted secret is not valid UTF-8".to_string(),
        })
    }

    /// Read and open the credential file.
    pub fn read_file(&self, path: &Path) -> Result<String, CredentialError> {
        let sealed = std::fs::read(path).map_err(|e| CredentialError::Io {
            message: format!("{}: {e}", path.display()),
        })?;

        self.open(&sealed)
    }
}
