//! Vendor plugin configuration.

use std::time::Duration;

use anyhow::{Context, Result as AnyhowResult, anyhow};
use clap::Args;
use kestrel_core::integration::{IntegrationType, IntegrationTypeRegistry};
use kestrel_providers::{CloudflareProvider, GitHubProvider, HttpClientConfig};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::TRACING_TARGET_CONFIG;

/// Vendor API endpoints and HTTP settings of the bundled plugins.
#[derive(Debug, Clone, Args, Serialize, Deserialize)]
#[must_use = "config does nothing unless you use it"]
pub struct ProviderConfig {
    /// Base URL of the GitHub REST API.
    #[arg(long, env = "GITHUB_API_URL", default_value = kestrel_providers::github::GITHUB_API_URL)]
    pub github_api_url: Url,

    /// Base URL of the Cloudflare v4 API.
    #[arg(
        long,
        env = "CLOUDFLARE_API_URL",
        default_value = kestrel_providers::cloudflare::CLOUDFLARE_API_URL
    )]
    pub cloudflare_api_url: Url,

    /// Timeout of one vendor API request in seconds.
    #[arg(long = "provider-timeout", env = "PROVIDER_TIMEOUT", default_value_t = 30)]
    pub provider_timeout_secs: u64,
}

impl ProviderConfig {
    /// Validates the provider settings.
    pub fn validate(&self) -> AnyhowResult<()> {
        if self.provider_timeout_secs == 0 || self.provider_timeout_secs > 300 {
            return Err(anyhow!(
                "Provider timeout {} seconds is invalid. Must be between 1 and 300 seconds.",
                self.provider_timeout_secs
            ));
        }

        Ok(())
    }

    /// Returns the vendor request timeout as a `Duration`.
    #[must_use]
    pub const fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    /// Builds the registry of every bundled integration type.
    ///
    /// # Errors
    ///
    /// Returns an error if a plugin's HTTP client cannot be created.
    pub fn create_registry(&self) -> AnyhowResult<IntegrationTypeRegistry> {
        let http = HttpClientConfig::default().with_timeout(self.provider_timeout());

        let github = GitHubProvider::new(self.github_api_url.clone(), &http)
            .context("failed to create GitHub provider")?;
        let cloudflare = CloudflareProvider::new(self.cloudflare_api_url.clone(), &http)
            .context("failed to create Cloudflare provider")?;

        let registry = IntegrationTypeRegistry::builder()
            .register(IntegrationType::new("github")?, github)
            .register(IntegrationType::new("cloudflare")?, cloudflare)
            .build();

        Ok(registry)
    }

    /// Logs the provider configuration at info level.
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            github_api_url = %self.github_api_url,
            cloudflare_api_url = %self.cloudflare_api_url,
            provider_timeout_secs = self.provider_timeout_secs,
            "Provider configuration"
        );
    }
}
