//! XChaCha20-Poly1305 sealing and opening.

use chacha20poly1305::XChaCha20Poly1305;
use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng, Payload};

use super::error::{CryptoError, CryptoResult};
use super::key::EncryptionKey;

/// Size of the XChaCha20-Poly1305 nonce in bytes.
pub const NONCE_SIZE: usize = 24;

/// Size of the Poly1305 authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// Minimum size of a sealed payload (nonce + tag, empty plaintext).
pub const MIN_SEALED_SIZE: usize = NONCE_SIZE + TAG_SIZE;

/// Seals `plaintext` under `key`, authenticating `aad` alongside it.
///
/// A fresh random nonce is drawn for every call and prepended to the output,
/// so sealing the same plaintext twice yields different payloads.
pub fn seal(key: &EncryptionKey, plaintext: &[u8], aad: &[u8]) -> CryptoResult<Vec<u8>> {
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
    let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);

    let payload = Payload {
        msg: plaintext,
        aad,
    };
    let ciphertext = cipher
        .encrypt(&nonce, payload)
        .map_err(|_| CryptoError::EncryptionFailed)?;

    let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Opens a payload produced by [`seal`] with the same `key` and `aad`.
///
/// # Errors
///
/// - [`CryptoError::CiphertextTooShort`] if the payload cannot hold a nonce and tag
/// - [`CryptoError::DecryptionFailed`] on any authentication failure
pub fn open(key: &EncryptionKey, sealed: &[u8], aad: &[u8]) -> CryptoResult<Vec<u8>> {
    if sealed.len() < MIN_SEALED_SIZE {
        return Err(CryptoError::CiphertextTooShort);
    }

    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
    let (nonce, ciphertext) = sealed.split_at(NONCE_SIZE);

    let payload = Payload {
        msg: ciphertext,
        aad,
    };
    cipher
        .decrypt(nonce.into(), payload)
        .map_err(|_| CryptoError::DecryptionFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const AAD: &[u8] = b"test-context";

    #[test]
    fn seal_open_roundtrip() {
        let key = EncryptionKey::generate();
        let sealed = seal(&key, b"api-token", AAD).unwrap();
        assert_eq!(open(&key, &sealed, AAD).unwrap(), b"api-token");
    }

    #[test]
    fn seal_open_empty_plaintext() {
        let key = EncryptionKey::generate();
        let sealed = seal(&key, b"", AAD).unwrap();
        assert_eq!(sealed.len(), MIN_SEALED_SIZE);
        assert!(open(&key, &sealed, AAD).unwrap().is_empty());
    }

    #[test]
    fn sealed_size_is_plaintext_plus_overhead() {
        let key = EncryptionKey::generate();
        let sealed = seal(&key, b"test", AAD).unwrap();
        assert_eq!(sealed.len(), NONCE_SIZE + 4 + TAG_SIZE);
    }

    #[test]
    fn open_with_wrong_key_fails() {
        let sealed = seal(&EncryptionKey::generate(), b"secret", AAD).unwrap();
        let result = open(&EncryptionKey::generate(), &sealed, AAD);
        assert_eq!(result, Err(CryptoError::DecryptionFailed));
    }

    #[test]
    fn open_with_wrong_aad_fails() {
        let key = EncryptionKey::generate();
        let sealed = seal(&key, b"secret", AAD).unwrap();
        let result = open(&key, &sealed, b"other-context");
        assert_eq!(result, Err(CryptoError::DecryptionFailed));
    }

    #[test]
    fn open_tampered_payload_fails() {
        let key = EncryptionKey::generate();
        let mut sealed = seal(&key, b"secret", AAD).unwrap();
        sealed[NONCE_SIZE + 1] ^= 0xFF;
        assert_eq!(open(&key, &sealed, AAD), Err(CryptoError::DecryptionFailed));
    }

    #[test]
    fn open_truncated_payload_fails() {
        let key = EncryptionKey::generate();
        let short = vec![0u8; MIN_SEALED_SIZE - 1];
        assert_eq!(open(&key, &short, AAD), Err(CryptoError::CiphertextTooShort));
    }

    #[test]
    fn same_plaintext_seals_differently() {
        let key = EncryptionKey::generate();
        let first = seal(&key, b"same", AAD).unwrap();
        let second = seal(&key, b"same", AAD).unwrap();
        assert_ne!(first, second);
    }
}
