//! Cryptographic error types.

use thiserror::Error;

/// Result type for cryptographic operations.
pub type CryptoResult<T> = std::result::Result<T, CryptoError>;

/// Errors that can occur during cryptographic operations.
///
/// None of the variants carry key material or plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// The sealed payload is too short to contain a nonce and a tag.
    #[error("sealed payload too short to contain nonce and authentication tag")]
    CiphertextTooShort,
    /// Authentication failed: wrong key, corrupted or tampered data.
    #[error("decryption failed: data may be corrupted or tampered with")]
    DecryptionFailed,
    /// The cipher refused to seal the plaintext.
    #[error("encryption failed")]
    EncryptionFailed,
    /// The provided key has an invalid length.
    #[error("invalid key length: expected 32 bytes")]
    InvalidKeyLength,
    /// HKDF expansion failed.
    #[error("key derivation failed")]
    KeyDerivationFailed,
}
