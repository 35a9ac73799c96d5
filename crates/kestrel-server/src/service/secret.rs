//! Vault calls scoped to one credential.

use kestrel_core::vault::{SecretConfig, SecretVault};
use kestrel_postgres::model::Credential;

use crate::{Error, Result};

/// Tracing target for credential secret handling.
const TRACING_TARGET: &str = "kestrel_server::secret";

/// Opens the secret of `credential`, failing closed.
pub(crate) fn decrypt_credential(
    vault: &dyn SecretVault,
    credential: &Credential,
) -> Result<SecretConfig> {
    vault.decrypt(&credential.secret).map_err(|e| {
        tracing::error!(
            target: TRACING_TARGET,
            credential_id = %credential.id,
            integration_type = %credential.integration_type,
            cause = %e,
            "Failed to decrypt credential secret"
        );
        Error::secret_decrypt_failed().with_source(e)
    })
}

/// Seals a configuration for storage.
pub(crate) fn encrypt_config(vault: &dyn SecretVault, config: &SecretConfig) -> Result<Vec<u8>> {
    vault.encrypt(config).map_err(|e| {
        tracing::error!(
            target: TRACING_TARGET,
            keys = config.len(),
            cause = %e,
            "Failed to encrypt credential configuration"
        );
        Error::secret_encrypt_failed().with_source(e)
    })
}
