use serde::{Deserialize, Serialize};

use super::{Annotations, Labels};
use crate::ProviderResult;
use crate::vault::SecretConfig;

/// Default number of concurrent health checks a provider tolerates.
const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Static runtime metadata a provider advertises.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationConfiguration {
    /// Name of the plugin implementing the integration type.
    pub plugin_name: String,
    /// UI specification file rendered by clients when collecting credentials.
    pub ui_spec_file: Option<String>,
    /// Queue consumed by the provider's resource describers.
    pub describer_queue: Option<String>,
    /// Upper bound on concurrent calls the vendor API tolerates.
    pub max_concurrency: usize,
}

impl IntegrationConfiguration {
    /// Creates a configuration for the named plugin.
    pub fn new(plugin_name: impl Into<String>) -> Self {
        Self {
            plugin_name: plugin_name.into(),
            ui_spec_file: None,
            describer_queue: None,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    /// Sets the UI specification file.
    pub fn with_ui_spec_file(mut self, file: impl Into<String>) -> Self {
        self.ui_spec_file = Some(file.into());
        self
    }

    /// Sets the describer queue name.
    pub fn with_describer_queue(mut self, queue: impl Into<String>) -> Self {
        self.describer_queue = Some(queue.into());
        self
    }

    /// Sets the concurrency limit, never below one.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }
}

/// A target enumerated by [`IntegrationProvider::discover_integrations`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredIntegration {
    /// Vendor-assigned identifier, e.g. an AWS account id.
    pub provider_id: String,
    /// Human-readable name.
    pub name: String,
    /// Provider-assigned labels.
    #[serde(default)]
    pub labels: Labels,
}

impl DiscoveredIntegration {
    /// Creates a candidate without labels.
    pub fn new(provider_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            name: name.into(),
            labels: Labels::new(),
        }
    }

    /// Adds a label.
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }
}

/// Capability contract implemented once per vendor.
///
/// Every call receives the decrypted configuration and must treat it as
/// request-scoped: implementations never cache or log it. Discovery and
/// health checks are expected to perform network requests; callers bound them
/// with a deadline and may drop the future at any point.
///
/// # Example
///
/// ```rust,ignore
/// #[async_trait::async_trait]
/// impl IntegrationProvider for GitHubProvider {
///     fn configuration(&self) -> IntegrationConfiguration {
///         IntegrationConfiguration::new("github")
///     }
///
///     async fn discover_integrations(
///         &self,
///         config: &SecretConfig,
///     ) -> ProviderResult<Vec<DiscoveredIntegration>> {
///         let config: GitHubConfig = config.parse()?;
///         // list organizations
///     }
///     // ...
/// }
/// ```
#[async_trait::async_trait]
pub trait IntegrationProvider: Send + Sync {
    /// Returns static runtime metadata.
    fn configuration(&self) -> IntegrationConfiguration;

    /// Enumerates the targets reachable with `config`.
    async fn discover_integrations(
        &self,
        config: &SecretConfig,
    ) -> ProviderResult<Vec<DiscoveredIntegration>>;

    /// Verifies that `config` still grants access to `provider_id`.
    ///
    /// `Ok(false)` reports a reachable vendor that denied the target; `Err`
    /// reports a failure to decide.
    async fn health_check(
        &self,
        config: &SecretConfig,
        provider_id: &str,
        labels: &Labels,
        annotations: &Annotations,
    ) -> ProviderResult<bool>;

    /// Maps integration labels to the resource types collectable from it.
    async fn resource_types_by_labels(&self, labels: &Labels) -> ProviderResult<Vec<String>>;
}
