//! Symmetric key material.

use std::fmt;

use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;

use super::error::{CryptoError, CryptoResult};

/// The size of an XChaCha20-Poly1305 key in bytes.
pub const KEY_SIZE: usize = 32;

/// A 256-bit key for XChaCha20-Poly1305.
///
/// The bytes never leave the type through `Debug`.
#[derive(Clone)]
pub struct EncryptionKey {
    bytes: [u8; KEY_SIZE],
}

impl EncryptionKey {
    /// Creates a key from exactly [`KEY_SIZE`] raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKeyLength`] for any other length.
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        let bytes: [u8; KEY_SIZE] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyLength)?;
        Ok(Self { bytes })
    }

    /// Generates a random key from the thread-local CSPRNG.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        rand::rng().fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Returns the raw key bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }

    /// Derives a purpose-bound subkey with HKDF-SHA256.
    ///
    /// The same `(salt, info)` pair always yields the same subkey for a given
    /// key; changing either yields an unrelated one.
    pub fn derive(&self, salt: &[u8], info: &[u8]) -> CryptoResult<Self> {
        let hkdf = Hkdf::<Sha256>::new(Some(salt), &self.bytes);

        let mut bytes = [0u8; KEY_SIZE];
        hkdf.expand(info, &mut bytes)
            .map_err(|_| CryptoError::KeyDerivationFailed)?;

        Ok(Self { bytes })
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

impl TryFrom<&[u8]> for EncryptionKey {
    type Error = CryptoError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::from_bytes(bytes)
    }
}

impl TryFrom<Vec<u8>> for EncryptionKey {
    type Error = CryptoError;

    fn try_from(bytes: Vec<u8>) -> Result<Self, Self::Error> {
        Self::from_bytes(&bytes)
    }
}
