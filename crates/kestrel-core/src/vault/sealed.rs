use std::fmt;

use super::{SecretConfig, SecretVault, VaultError, VaultResult};
use crate::TRACING_TARGET_VAULT;
use crate::crypto::{CryptoError, CryptoResult, EncryptionKey, open, seal};

/// Current envelope version, written as the first byte of every ciphertext.
pub const ENVELOPE_VERSION: u8 = 1;

const VAULT_KEY_SALT: &[u8] = b"kestrel-credential-vault";
const VAULT_KEY_INFO: &[u8] = b"kestrel-credential-vault-v1";

/// [`SecretVault`] backed by XChaCha20-Poly1305.
///
/// Envelope layout: `version (1 byte) || nonce || ciphertext || tag`, with the
/// version byte authenticated as associated data.
#[derive(Clone)]
pub struct SealedVault {
    key: EncryptionKey,
}

impl SealedVault {
    /// Creates a vault keyed by a subkey derived from `master`.
    pub fn new(master: &EncryptionKey) -> CryptoResult<Self> {
        let key = master.derive(VAULT_KEY_SALT, VAULT_KEY_INFO)?;
        Ok(Self { key })
    }
}

impl SecretVault for SealedVault {
    fn encrypt(&self, config: &SecretConfig) -> VaultResult<Vec<u8>> {
        let plaintext = serde_json::to_vec(config)
            .map_err(|_| VaultError::Encrypt(CryptoError::EncryptionFailed))?;
        let header = [ENVELOPE_VERSION];
        let sealed = seal(&self.key, &plaintext, &header).map_err(VaultError::Encrypt)?;

        let mut envelope = Vec::with_capacity(header.len() + sealed.len());
        envelope.extend_from_slice(&header);
        envelope.extend_from_slice(&sealed);
        Ok(envelope)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> VaultResult<SecretConfig> {
        let Some((&version, sealed)) = ciphertext.split_first() else {
            return Err(VaultError::Decrypt(CryptoError::CiphertextTooShort));
        };

        if version != ENVELOPE_VERSION {
            tracing::warn!(
                target: TRACING_TARGET_VAULT,
                version,
                "Rejected secret envelope with unknown version"
            );
            return Err(VaultError::UnsupportedVersion(version));
        }

        let plaintext = open(&self.key, sealed, &[version]).map_err(|error| {
            tracing::warn!(
                target: TRACING_TARGET_VAULT,
                error = %error,
                "Failed to open secret envelope"
            );
            VaultError::Decrypt(error)
        })?;

        serde_json::from_slice(&plaintext).map_err(|_| VaultError::Malformed)
    }
}

impl fmt::Debug for SealedVault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SealedVault")
            .field("version", &ENVELOPE_VERSION)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::crypto::MIN_SEALED_SIZE;

    fn vault() -> SealedVault {
        SealedVault::new(&EncryptionKey::generate()).unwrap()
    }

    #[test]
    fn decrypt_inverts_encrypt() {
        let vault = vault();
        let configs = [
            SecretConfig::new(),
            SecretConfig::new().with("accessKeyId", "AKIA0000").with("secretAccessKey", "s3cr3t"),
            SecretConfig::try_from(json!({
                "tenantId": "t", "nested": {"list": [1, 2, 3], "flag": true}, "empty": null
            }))
            .unwrap(),
        ];

        for config in configs {
            let sealed = vault.encrypt(&config).unwrap();
            assert_eq!(vault.decrypt(&sealed).unwrap(), config);
        }
    }

    #[test]
    fn ciphertext_does_not_contain_plaintext() {
        let sealed = vault()
            .encrypt(&SecretConfig::new().with("token", "plaintext-token"))
            .unwrap();
        let needle = b"plaintext-token";
        assert!(!sealed.windows(needle.len()).any(|window| window == needle));
        assert_eq!(sealed[0], ENVELOPE_VERSION);
    }

    #[test]
    fn decrypt_fails_closed() {
        let vault = vault();
        let sealed = vault.encrypt(&SecretConfig::new().with("k", "v")).unwrap();

        let other = self::vault();
        assert!(other.decrypt(&sealed).unwrap_err().is_decrypt_failure());
        assert!(vault.decrypt(&[]).unwrap_err().is_decrypt_failure());
        assert!(vault.decrypt(&[ENVELOPE_VERSION; MIN_SEALED_SIZE]).unwrap_err().is_decrypt_failure());
    }

    #[test]
    fn decrypt_rejects_unknown_version() {
        let vault = vault();
        let mut sealed = vault.encrypt(&SecretConfig::new()).unwrap();
        sealed[0] = 9;
        assert!(matches!(
            vault.decrypt(&sealed),
            Err(VaultError::UnsupportedVersion(9))
        ));
    }

    #[test]
    fn same_master_opens_across_instances() {
        let master = EncryptionKey::generate();
        let sealed = SealedVault::new(&master)
            .unwrap()
            .encrypt(&SecretConfig::new().with("k", "v"))
            .unwrap();
        let reopened = SealedVault::new(&master).unwrap().decrypt(&sealed).unwrap();
        assert_eq!(reopened.get("k"), Some(&json!("v")));
    }
}
