//! Scriptable [`IntegrationProvider`] implementation.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use kestrel_core::integration::{
    Annotations, DiscoveredIntegration, IntegrationConfiguration, IntegrationProvider, Labels,
};
use kestrel_core::vault::SecretConfig;
use kestrel_core::{ProviderError, ProviderErrorKind, ProviderResult};

/// Scripted outcome of a health check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockHealth {
    /// Reports `Ok(true)`.
    Healthy,
    /// Reports `Ok(false)`.
    Unhealthy,
    /// Reports an upstream error with the given message.
    Fail(String),
    /// Sleeps for the given duration before reporting healthy.
    Stall(Duration),
}

/// Shared call counters of a [`MockProvider`].
#[derive(Debug, Clone, Default)]
pub struct MockCalls {
    discover: Arc<AtomicUsize>,
    health_check: Arc<AtomicUsize>,
}

impl MockCalls {
    /// Number of `discover_integrations` calls so far.
    pub fn discover(&self) -> usize {
        self.discover.load(Ordering::SeqCst)
    }

    /// Number of `health_check` calls so far.
    pub fn health_check(&self) -> usize {
        self.health_check.load(Ordering::SeqCst)
    }
}

/// A provider whose every answer is configured up front.
#[derive(Debug, Clone)]
pub struct MockProvider {
    configuration: IntegrationConfiguration,
    candidates: Vec<DiscoveredIntegration>,
    discovery_failure: Option<String>,
    discovery_delay: Option<Duration>,
    required_key: Option<String>,
    health: HashMap<String, MockHealth>,
    default_health: MockHealth,
    resource_types: HashMap<String, Vec<String>>,
    calls: MockCalls,
}

impl MockProvider {
    /// Creates a provider with no candidates that reports every target healthy.
    pub fn new(plugin_name: impl Into<String>) -> Self {
        Self {
            configuration: IntegrationConfiguration::new(plugin_name),
            candidates: Vec::new(),
            discovery_failure: None,
            discovery_delay: None,
            required_key: None,
            health: HashMap::new(),
            default_health: MockHealth::Healthy,
            resource_types: HashMap::new(),
            calls: MockCalls::default(),
        }
    }

    /// Replaces the advertised configuration.
    pub fn with_configuration(mut self, configuration: IntegrationConfiguration) -> Self {
        self.configuration = configuration;
        self
    }

    /// Adds a candidate returned by discovery, in insertion order.
    pub fn with_candidate(mut self, candidate: DiscoveredIntegration) -> Self {
        self.candidates.push(candidate);
        self
    }

    /// Makes discovery fail with an upstream error.
    pub fn with_discovery_failure(mut self, message: impl Into<String>) -> Self {
        self.discovery_failure = Some(message.into());
        self
    }

    /// Delays every discovery call.
    pub fn with_discovery_delay(mut self, delay: Duration) -> Self {
        self.discovery_delay = Some(delay);
        self
    }

    /// Rejects configurations lacking `key` with an authentication error.
    pub fn with_required_key(mut self, key: impl Into<String>) -> Self {
        self.required_key = Some(key.into());
        self
    }

    /// Scripts the health outcome of one provider id.
    pub fn with_health(mut self, provider_id: impl Into<String>, health: MockHealth) -> Self {
        self.health.insert(provider_id.into(), health);
        self
    }

    /// Scripts the health outcome of every unlisted provider id.
    pub fn with_default_health(mut self, health: MockHealth) -> Self {
        self.default_health = health;
        self
    }

    /// Maps the value of the `kind` label to resource types.
    pub fn with_resource_types<I, S>(mut self, kind: impl Into<String>, resource_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let resource_types = resource_types.into_iter().map(Into::into).collect();
        self.resource_types.insert(kind.into(), resource_types);
        self
    }

    /// Returns the shared call counters.
    pub fn calls(&self) -> MockCalls {
        self.calls.clone()
    }

    fn check_config(&self, config: &SecretConfig) -> ProviderResult<()> {
        match &self.required_key {
            Some(key) if config.get(key).is_none() => Err(ProviderError::authentication(
                format!("configuration is missing '{key}'"),
            )),
            _ => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl IntegrationProvider for MockProvider {
    fn configuration(&self) -> IntegrationConfiguration {
        self.configuration.clone()
    }

    async fn discover_integrations(
        &self,
        config: &SecretConfig,
    ) -> ProviderResult<Vec<DiscoveredIntegration>> {
        self.calls.discover.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.discovery_delay {
            tokio::time::sleep(delay).await;
        }

        self.check_config(config)?;

        if let Some(message) = &self.discovery_failure {
            return Err(ProviderError::upstream(message.clone()));
        }

        Ok(self.candidates.clone())
    }

    async fn health_check(
        &self,
        config: &SecretConfig,
        provider_id: &str,
        _labels: &Labels,
        _annotations: &Annotations,
    ) -> ProviderResult<bool> {
        self.calls.health_check.fetch_add(1, Ordering::SeqCst);
        self.check_config(config)?;

        let health = self.health.get(provider_id).unwrap_or(&self.default_health);
        match health {
            MockHealth::Healthy => Ok(true),
            MockHealth::Unhealthy => Ok(false),
            MockHealth::Fail(message) => Err(ProviderError::upstream(message.clone())),
            MockHealth::Stall(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(true)
            }
        }
    }

    async fn resource_types_by_labels(&self, labels: &Labels) -> ProviderResult<Vec<String>> {
        let Some(kind) = labels.get("kind") else {
            return Ok(Vec::new());
        };

        self.resource_types.get(kind).cloned().ok_or_else(|| {
            ProviderError::new(
                ProviderErrorKind::NotFound,
                format!("no resource types for kind '{kind}'"),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn config(value: serde_json::Value) -> SecretConfig {
        SecretConfig::try_from(value).unwrap()
    }

    #[tokio::test]
    async fn scripted_discovery_and_health() {
        let provider = MockProvider::new("aws")
            .with_candidate(DiscoveredIntegration::new("1", "one"))
            .with_candidate(DiscoveredIntegration::new("2", "two"))
            .with_health("2", MockHealth::Unhealthy);
        let calls = provider.calls();
        let config = config(json!({ "token": "t" }));

        let found = provider.discover_integrations(&config).await.unwrap();
        assert_eq!(found.len(), 2);

        let labels = Labels::new();
        let annotations = Annotations::new();
        assert!(provider.health_check(&config, "1", &labels, &annotations).await.unwrap());
        assert!(!provider.health_check(&config, "2", &labels, &annotations).await.unwrap());

        assert_eq!(calls.discover(), 1);
        assert_eq!(calls.health_check(), 2);
    }

    #[tokio::test]
    async fn required_key_rejects_config() {
        let provider = MockProvider::new("aws").with_required_key("accessKeyId");

        let error = provider
            .discover_integrations(&config(json!({})))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ProviderErrorKind::Authentication);
    }

    #[tokio::test]
    async fn resource_types_by_kind_label() {
        let provider = MockProvider::new("aws").with_resource_types("account", ["ec2", "s3"]);

        let mut labels = Labels::new();
        assert!(provider.resource_types_by_labels(&labels).await.unwrap().is_empty());

        labels.insert("kind".into(), "account".into());
        let types = provider.resource_types_by_labels(&labels).await.unwrap();
        assert_eq!(types, vec!["ec2".to_owned(), "s3".to_owned()]);
    }
}
