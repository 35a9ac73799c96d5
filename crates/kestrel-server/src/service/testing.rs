//! Engine fixtures over the in-memory store and a mock provider.

use std::sync::Arc;

use kestrel_core::crypto::EncryptionKey;
use kestrel_core::integration::{IntegrationType, IntegrationTypeRegistry};
use kestrel_core::vault::{SealedVault, SecretConfig};
use kestrel_postgres::model::{Credential, Integration, NewCredential, NewIntegration};
use kestrel_postgres::types::IntegrationState;
use kestrel_test::{MockCalls, MockProvider};
use serde_json::json;

use crate::service::store::{CredentialStore, IntegrationStore, MemoryStore};
use crate::service::{ServiceConfig, ServiceState, SharedVault};

pub(crate) struct Fixture {
    pub state: ServiceState,
    pub store: MemoryStore,
    pub vault: SharedVault,
    pub calls: MockCalls,
}

impl Fixture {
    /// Registers `provider` under `integration_type`.
    pub fn new(integration_type: &str, provider: MockProvider) -> Self {
        let calls = provider.calls();
        let registry = IntegrationTypeRegistry::builder()
            .register(IntegrationType::new(integration_type).unwrap(), provider)
            .build();

        let store = MemoryStore::new();
        let vault: SharedVault = Arc::new(SealedVault::new(&EncryptionKey::generate()).unwrap());
        let config = ServiceConfig::builder().build().unwrap();
        let state =
            ServiceState::from_parts(&config, Arc::new(store.clone()), vault.clone(), registry);

        Self {
            state,
            store,
            vault,
            calls,
        }
    }

    /// Stores a credential holding a fixed token.
    pub async fn credential(&self, integration_type: &str) -> Credential {
        let config = SecretConfig::new().with("token", "fixture-token");
        self.store
            .create_credential(NewCredential {
                integration_type: integration_type.to_owned(),
                secret: self.vault.encrypt(&config).unwrap(),
                metadata: json!({}),
            })
            .await
            .unwrap()
    }

    /// Stores an integration under `credential` without consulting a provider.
    pub async fn integration(
        &self,
        credential: &Credential,
        provider_id: &str,
        state: IntegrationState,
    ) -> Integration {
        self.store
            .create_integration_if_absent(NewIntegration {
                provider_id: provider_id.to_owned(),
                name: provider_id.to_owned(),
                integration_type: credential.integration_type.clone(),
                credential_id: credential.id,
                labels: json!({}),
                annotations: json!({}),
                state,
                last_check: None,
            })
            .await
            .unwrap()
            .unwrap()
    }
}
