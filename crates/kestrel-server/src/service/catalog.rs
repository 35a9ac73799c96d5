//! Registered integration types combined with their persisted setup flag.

use std::sync::Arc;

use kestrel_core::integration::{
    IntegrationConfiguration, IntegrationProvider, IntegrationType, IntegrationTypeRegistry,
};
use kestrel_postgres::model::NewIntegrationTypeSetup;

use crate::service::store::SharedStore;
use crate::{Error, Result};

/// Tracing target for integration type resolution.
const TRACING_TARGET: &str = "kestrel_server::catalog";

/// A registered integration type as reported to operators.
#[derive(Debug, Clone)]
pub struct IntegrationTypeEntry {
    /// Type identifier.
    pub integration_type: IntegrationType,
    /// Static runtime metadata of the provider.
    pub configuration: IntegrationConfiguration,
    /// Administrative enable flag.
    pub enabled: bool,
}

/// Resolves integration types to providers, honoring the setup flag.
#[derive(Clone)]
pub struct IntegrationCatalog {
    registry: IntegrationTypeRegistry,
    store: SharedStore,
}

impl IntegrationCatalog {
    /// Creates a catalog over a frozen registry.
    pub fn new(registry: IntegrationTypeRegistry, store: SharedStore) -> Self {
        Self { registry, store }
    }

    /// Returns the underlying registry.
    pub fn registry(&self) -> &IntegrationTypeRegistry {
        &self.registry
    }

    /// Resolves a declared type to its provider.
    ///
    /// Malformed, unregistered, and disabled types are all rejected with
    /// [`ErrorKind::InvalidIntegrationType`].
    ///
    /// [`ErrorKind::InvalidIntegrationType`]: crate::ErrorKind::InvalidIntegrationType
    pub async fn resolve(
        &self,
        integration_type: &str,
    ) -> Result<(IntegrationType, Arc<dyn IntegrationProvider>)> {
        let integration_type = self.registered(integration_type)?;
        let Some(provider) = self.registry.get(&integration_type) else {
            return Err(Error::invalid_integration_type(&integration_type));
        };

        if !self.is_enabled(&integration_type).await? {
            tracing::debug!(
                target: TRACING_TARGET,
                integration_type = %integration_type,
                "Rejected disabled integration type"
            );
            return Err(Error::invalid_integration_type(&integration_type));
        }

        Ok((integration_type, provider))
    }

    /// Lists every registered type with its configuration and setup flag.
    pub async fn list(&self) -> Result<Vec<IntegrationTypeEntry>> {
        let setups = self.store.list_integration_type_setups().await?;

        let entries = self
            .registry
            .integration_types()
            .into_iter()
            .filter_map(|integration_type| {
                let provider = self.registry.get(&integration_type)?;
                let enabled = setups
                    .iter()
                    .find(|s| s.integration_type == integration_type.as_str())
                    .is_none_or(|s| s.enabled);

                Some(IntegrationTypeEntry {
                    configuration: provider.configuration(),
                    integration_type,
                    enabled,
                })
            })
            .collect();

        Ok(entries)
    }

    /// Enables or disables a registered type.
    pub async fn set_enabled(
        &self,
        integration_type: &str,
        enabled: bool,
    ) -> Result<IntegrationTypeEntry> {
        let integration_type = self.registered(integration_type)?;
        let Some(provider) = self.registry.get(&integration_type) else {
            return Err(Error::invalid_integration_type(&integration_type));
        };

        let setup = self
            .store
            .upsert_integration_type_setup(NewIntegrationTypeSetup {
                integration_type: integration_type.to_string(),
                enabled,
            })
            .await?;

        tracing::info!(
            target: TRACING_TARGET,
            integration_type = %integration_type,
            enabled = setup.enabled,
            "Integration type setup changed"
        );

        Ok(IntegrationTypeEntry {
            configuration: provider.configuration(),
            integration_type,
            enabled: setup.enabled,
        })
    }

    fn registered(&self, integration_type: &str) -> Result<IntegrationType> {
        IntegrationType::new(integration_type)
            .ok()
            .filter(|t| self.registry.contains(t))
            .ok_or_else(|| Error::invalid_integration_type(integration_type))
    }

    async fn is_enabled(&self, integration_type: &IntegrationType) -> Result<bool> {
        let setup = self
            .store
            .find_integration_type_setup(integration_type.as_str())
            .await?;
        Ok(setup.is_none_or(|s| s.enabled))
    }
}
