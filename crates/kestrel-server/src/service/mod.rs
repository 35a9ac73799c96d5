//! Application state and dependency injection.

mod catalog;
mod config;
mod discovery;
mod health;
mod reconciler;
mod secret;
mod security;
pub mod store;
#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use kestrel_core::integration::IntegrationTypeRegistry;
use kestrel_core::vault::SecretVault;

pub use crate::service::catalog::{IntegrationCatalog, IntegrationTypeEntry};
pub use crate::service::config::{ServiceConfig, ServiceConfigBuilder};
pub use crate::service::discovery::{
    DiscoveredCandidate, DiscoveryEngine, DiscoveryFailure, DiscoveryOutcome, DiscoverySource,
};
pub use crate::service::health::{HealthCheckEngine, HealthCheckFailure, HealthReport};
pub use crate::service::reconciler::{
    AddOutcome, CredentialChanges, CredentialUpdateOutcome, Reconciler,
};
pub use crate::service::security::{MasterKey, MasterKeyConfig};
use crate::service::store::{PgStore, SharedStore};
// Re-export error types from crate root for convenience
pub use crate::{Error, Result};

/// Shared, type-erased vault handle.
pub type SharedVault = Arc<dyn SecretVault>;

/// Application state.
///
/// Used for the [`State`] extraction (dependency injection).
///
/// [`State`]: axum::extract::State
#[must_use = "state does nothing unless you use it"]
#[derive(Clone)]
pub struct ServiceState {
    // External services:
    pub store: SharedStore,
    pub vault: SharedVault,

    // Internal services:
    pub catalog: IntegrationCatalog,
    pub discovery: DiscoveryEngine,
    pub health: HealthCheckEngine,
    pub reconciler: Reconciler,
}

impl ServiceState {
    /// Initializes application state from configuration.
    ///
    /// Connects to Postgres, applies migrations, and loads the master key.
    pub async fn new(
        service_config: ServiceConfig,
        registry: IntegrationTypeRegistry,
    ) -> Result<Self> {
        let pg_client = service_config.connect_postgres().await?;
        let master_key = service_config.load_master_key().await?;

        let store: SharedStore = Arc::new(PgStore::new(pg_client));
        let vault: SharedVault = Arc::new(master_key.vault()?);

        Ok(Self::from_parts(&service_config, store, vault, registry))
    }

    /// Wires the engines over already constructed collaborators.
    pub fn from_parts(
        service_config: &ServiceConfig,
        store: SharedStore,
        vault: SharedVault,
        registry: IntegrationTypeRegistry,
    ) -> Self {
        let catalog = IntegrationCatalog::new(registry, store.clone());

        let health = HealthCheckEngine::new(
            store.clone(),
            vault.clone(),
            catalog.clone(),
            service_config.health_check_timeout(),
            service_config.max_concurrent_health_checks,
        );

        let discovery = DiscoveryEngine::new(
            store.clone(),
            vault.clone(),
            catalog.clone(),
            service_config.discovery_timeout(),
            service_config.health_check_timeout(),
            service_config.max_concurrent_health_checks,
        );

        let reconciler = Reconciler::new(
            store.clone(),
            vault.clone(),
            catalog.clone(),
            discovery.clone(),
            health.clone(),
        );

        Self {
            store,
            vault,
            catalog,
            discovery,
            health,
            reconciler,
        }
    }
}

macro_rules! impl_di {
    ($($f:ident: $t:ty),+) => {$(
        impl axum::extract::FromRef<ServiceState> for $t {
            fn from_ref(state: &ServiceState) -> Self {
                state.$f.clone()
            }
        }
    )+};
}

// External services:
impl_di!(store: SharedStore);
impl_di!(vault: SharedVault);

// Internal services:
impl_di!(catalog: IntegrationCatalog);
impl_di!(discovery: DiscoveryEngine);
impl_di!(health: HealthCheckEngine);
impl_di!(reconciler: Reconciler);
