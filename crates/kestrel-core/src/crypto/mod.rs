//! Authenticated encryption for credential secrets.
//!
//! Secrets are sealed with XChaCha20-Poly1305 under a key derived from the
//! process master key with HKDF-SHA256. The sealed layout is
//! `nonce (24 bytes) || ciphertext || tag (16 bytes)`.

mod cipher;
mod error;
mod key;

pub use cipher::{MIN_SEALED_SIZE, NONCE_SIZE, TAG_SIZE, open, seal};
pub use error::{CryptoError, CryptoResult};
pub use key::{EncryptionKey, KEY_SIZE};
