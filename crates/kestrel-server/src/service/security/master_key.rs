//! Master encryption key management for credential secrets.
//!
//! The master key is read once at startup from a file holding exactly 32 raw
//! bytes. It is never used to encrypt directly: [`MasterKey::vault`] derives a
//! purpose-bound subkey via HKDF-SHA256.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[cfg(any(test, feature = "config"))]
use clap::Args;
use kestrel_core::crypto::EncryptionKey;
use kestrel_core::vault::SealedVault;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Tracing target for master key operations.
const TRACING_TARGET: &str = "kestrel_server::master_key";

/// Master encryption key file path configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(any(test, feature = "config"), derive(Args))]
pub struct MasterKeyConfig {
    /// File path to the 32-byte master encryption key.
    #[cfg_attr(
        any(test, feature = "config"),
        arg(
            long,
            env = "ENCRYPTION_KEY_FILEPATH",
            default_value = "./encryption.key"
        )
    )]
    #[serde(default = "MasterKeyConfig::default_key_path")]
    pub key_path: PathBuf,
}

impl MasterKeyConfig {
    /// Creates a configuration pointing at `key_path`.
    pub fn new(key_path: impl Into<PathBuf>) -> Self {
        Self {
            key_path: key_path.into(),
        }
    }

    fn default_key_path() -> PathBuf {
        "./encryption.key".into()
    }
}

impl Default for MasterKeyConfig {
    fn default() -> Self {
        Self::new(Self::default_key_path())
    }
}

/// Master encryption key the credential vault is derived from.
#[derive(Clone)]
pub struct MasterKey {
    inner: Arc<EncryptionKey>,
}

impl MasterKey {
    /// Loads the master key from the path specified in `config`.
    pub async fn from_config(config: &MasterKeyConfig) -> Result<Self> {
        Self::new(&config.key_path).await
    }

    /// Loads the master key from a file path.
    pub async fn new(key_path: impl AsRef<Path>) -> Result<Self> {
        let path = key_path.as_ref();
        Self::validate_path(path)?;
        Self::load(path).await
    }

    /// Returns a reference to the underlying [`EncryptionKey`].
    #[inline]
    pub fn encryption_key(&self) -> &EncryptionKey {
        &self.inner
    }

    /// Builds the credential vault keyed by a subkey of this master key.
    pub fn vault(&self) -> Result<SealedVault> {
        SealedVault::new(&self.inner).map_err(|e| {
            Error::config("Failed to derive the credential vault key").with_source(e)
        })
    }

    fn validate_path(path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(Error::config("Encryption key file does not exist"));
        }

        if !path.is_file() {
            return Err(Error::config("Encryption key path is not a file"));
        }

        Ok(())
    }

    async fn load(path: &Path) -> Result<Self> {
        tracing::debug!(
            target: TRACING_TARGET,
            path = %path.display(),
            "Loading master encryption key",
        );

        let bytes = tokio::fs::read(path).await.map_err(|e| {
            tracing::error!(
                target: TRACING_TARGET,
                path = %path.display(),
                error = %e,
                "Failed to read encryption key file",
            );
            Error::file_system("Failed to read encryption key file").with_source(e)
        })?;

        let key = EncryptionKey::from_bytes(&bytes).map_err(|e| {
            tracing::error!(
                target: TRACING_TARGET,
                path = %path.display(),
                length = bytes.len(),
                "Invalid encryption key: expected exactly 32 bytes",
            );
            Error::config("Invalid encryption key: expected exactly 32 bytes").with_source(e)
        })?;

        tracing::info!(target: TRACING_TARGET, "Master encryption key loaded");

        Ok(Self {
            inner: Arc::new(key),
        })
    }
}

impl From<EncryptionKey> for MasterKey {
    fn from(key: EncryptionKey) -> Self {
        Self {
            inner: Arc::new(key),
        }
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MasterKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use kestrel_core::vault::{SecretConfig, SecretVault};
    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn load_valid_key() {
        let temp_dir = TempDir::new().unwrap();
        let key_path = temp_dir.path().join("encryption.key");
        fs::write(&key_path, [0xABu8; 32]).unwrap();

        let master_key = MasterKey::new(&key_path).await.unwrap();
        assert_eq!(master_key.encryption_key().as_bytes(), &[0xAB; 32]);
    }

    #[tokio::test]
    async fn reject_invalid_key_length() {
        let temp_dir = TempDir::new().unwrap();
        let key_path = temp_dir.path().join("encryption.key");
        fs::write(&key_path, [0u8; 16]).unwrap();

        let error = MasterKey::new(&key_path).await.unwrap_err();
        assert_eq!(error.kind(), crate::ErrorKind::Config);
    }

    #[tokio::test]
    async fn reject_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let key_path = temp_dir.path().join("nonexistent.key");

        assert!(MasterKey::new(&key_path).await.is_err());
        assert!(MasterKey::new(temp_dir.path()).await.is_err());
    }

    #[tokio::test]
    async fn vaults_from_same_file_interoperate() {
        let temp_dir = TempDir::new().unwrap();
        let key_path = temp_dir.path().join("encryption.key");
        fs::write(&key_path, [0x42u8; 32]).unwrap();
        let config = MasterKeyConfig::new(&key_path);

        let first = MasterKey::from_config(&config).await.unwrap().vault().unwrap();
        let second = MasterKey::from_config(&config).await.unwrap().vault().unwrap();

        let secret = SecretConfig::new().with("token", "ghp_example");
        let sealed = first.encrypt(&secret).unwrap();
        assert_eq!(second.decrypt(&sealed).unwrap(), secret);
    }

    #[test]
    fn debug_is_redacted() {
        let master_key = MasterKey::from(EncryptionKey::from_bytes(&[7u8; 32]).unwrap());
        let debug = format!("{master_key:?}");
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains('7'));
    }
}
