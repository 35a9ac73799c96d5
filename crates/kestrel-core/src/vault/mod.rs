//! Encrypt-at-rest boundary for credential secrets.
//!
//! A [`SecretVault`] turns a [`SecretConfig`] into opaque bytes suitable for
//! storage and back. Vaults are pure with respect to shared state and are
//! called concurrently without locking.

mod secret_config;
#[cfg(feature = "encryption")]
mod sealed;

use thiserror::Error;

#[cfg(feature = "encryption")]
use crate::crypto::CryptoError;

pub use secret_config::SecretConfig;
#[cfg(feature = "encryption")]
#[cfg_attr(docsrs, doc(cfg(feature = "encryption")))]
pub use sealed::{ENVELOPE_VERSION, SealedVault};

/// Result type for vault operations.
pub type VaultResult<T> = std::result::Result<T, VaultError>;

/// Errors produced by a [`SecretVault`].
///
/// Decrypt-side variants are reported through [`VaultError::is_decrypt_failure`]
/// so callers can fail closed without inspecting the cause.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Sealing the configuration failed.
    #[cfg(feature = "encryption")]
    #[error("failed to encrypt secret configuration")]
    Encrypt(#[source] CryptoError),
    /// The ciphertext could not be opened.
    #[cfg(feature = "encryption")]
    #[error("failed to decrypt secret configuration")]
    Decrypt(#[source] CryptoError),
    /// The ciphertext opened but did not contain a configuration object.
    #[error("decrypted secret is not a configuration object")]
    Malformed,
    /// The envelope was written by an unknown vault version.
    #[error("unsupported secret envelope version {0}")]
    UnsupportedVersion(u8),
}

impl VaultError {
    /// Returns `true` if this error was raised while decrypting.
    pub fn is_decrypt_failure(&self) -> bool {
        match self {
            #[cfg(feature = "encryption")]
            Self::Encrypt(_) => false,
            _ => true,
        }
    }
}

/// Opaque encrypt/decrypt boundary for provider configuration.
pub trait SecretVault: Send + Sync {
    /// Seals a configuration into an opaque ciphertext.
    fn encrypt(&self, config: &SecretConfig) -> VaultResult<Vec<u8>>;

    /// Opens a ciphertext produced by [`SecretVault::encrypt`].
    ///
    /// Never returns an empty configuration in place of a failure.
    fn decrypt(&self, ciphertext: &[u8]) -> VaultResult<SecretConfig>;
}
