use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::{IntegrationProvider, IntegrationType};
use crate::TRACING_TARGET_REGISTRY;

/// Immutable lookup from [`IntegrationType`] to its provider.
///
/// Cloning is cheap; all clones share the same map. Disabling a type is not a
/// registry concern and is decided by callers from their own setup records.
#[derive(Clone, Default)]
pub struct IntegrationTypeRegistry {
    providers: Arc<HashMap<IntegrationType, Arc<dyn IntegrationProvider>>>,
}

impl IntegrationTypeRegistry {
    /// Starts building a registry.
    pub fn builder() -> IntegrationTypeRegistryBuilder {
        IntegrationTypeRegistryBuilder::default()
    }

    /// Returns the provider registered for `integration_type`.
    pub fn get(&self, integration_type: &IntegrationType) -> Option<Arc<dyn IntegrationProvider>> {
        self.providers.get(integration_type).cloned()
    }

    /// Returns `true` if `integration_type` is registered.
    pub fn contains(&self, integration_type: &IntegrationType) -> bool {
        self.providers.contains_key(integration_type)
    }

    /// Returns the registered types in lexical order.
    pub fn integration_types(&self) -> Vec<IntegrationType> {
        let mut types: Vec<_> = self.providers.keys().cloned().collect();
        types.sort();
        types
    }

    /// Returns the number of registered types.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Returns `true` if no type is registered.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl fmt::Debug for IntegrationTypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntegrationTypeRegistry")
            .field("integration_types", &self.integration_types())
            .finish()
    }
}

/// Builder for [`IntegrationTypeRegistry`].
#[derive(Default)]
pub struct IntegrationTypeRegistryBuilder {
    providers: HashMap<IntegrationType, Arc<dyn IntegrationProvider>>,
}

impl IntegrationTypeRegistryBuilder {
    /// Registers `provider` under `integration_type`.
    ///
    /// A later registration for the same type replaces the earlier one.
    pub fn register(
        self,
        integration_type: IntegrationType,
        provider: impl IntegrationProvider + 'static,
    ) -> Self {
        self.register_shared(integration_type, Arc::new(provider))
    }

    /// Registers an already shared provider under `integration_type`.
    pub fn register_shared(
        mut self,
        integration_type: IntegrationType,
        provider: Arc<dyn IntegrationProvider>,
    ) -> Self {
        let plugin_name = provider.configuration().plugin_name;

        tracing::debug!(
            target: TRACING_TARGET_REGISTRY,
            integration_type = %integration_type,
            plugin_name = %plugin_name,
            "Registered integration type"
        );

        if self.providers.insert(integration_type.clone(), provider).is_some() {
            tracing::warn!(
                target: TRACING_TARGET_REGISTRY,
                integration_type = %integration_type,
                "Replaced previously registered integration type"
            );
        }

        self
    }

    /// Freezes the registry.
    pub fn build(self) -> IntegrationTypeRegistry {
        tracing::info!(
            target: TRACING_TARGET_REGISTRY,
            count = self.providers.len(),
            "Integration type registry initialized"
        );

        IntegrationTypeRegistry {
            providers: Arc::new(self.providers),
        }
    }
}
