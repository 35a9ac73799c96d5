//! Cloudflare accounts as integration targets.
//!
//! Every response of the v4 API is wrapped in an envelope carrying a
//! `success` flag, a list of errors, and pagination info.

mod config;

use kestrel_core::integration::{
    Annotations, DiscoveredIntegration, IntegrationConfiguration, IntegrationProvider, Labels,
};
use kestrel_core::vault::SecretConfig;
use kestrel_core::{ProviderError, ProviderResult};
use reqwest::StatusCode;
use serde::Deserialize;
use url::Url;

pub use self::config::CloudflareConfig;
use crate::client::ApiClient;
use crate::config::HttpClientConfig;

/// Tracing target for the Cloudflare plugin.
const TRACING_TARGET: &str = "kestrel_providers::cloudflare";

/// Default Cloudflare v4 API base URL.
pub const CLOUDFLARE_API_URL: &str = "https://api.cloudflare.com/client/v4/";

const PAGE_SIZE: u32 = 50;
const MAX_PAGES: u32 = 100;

const KIND_LABEL: &str = "kind";
const ACCOUNT_KIND: &str = "account";

/// Resource types collectable from a Cloudflare account.
const ACCOUNT_RESOURCE_TYPES: &[&str] = &[
    "cloudflare/zone",
    "cloudflare/dns-record",
    "cloudflare/worker",
    "cloudflare/r2-bucket",
];

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiError>,
    result: Option<T>,
    #[serde(default)]
    result_info: Option<ResultInfo>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: i64,
}

#[derive(Debug, Deserialize)]
struct ResultInfo {
    #[serde(default)]
    total_pages: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct Account {
    id: String,
    name: String,
    #[serde(default, rename = "type")]
    account_type: Option<String>,
}

impl<T> Envelope<T> {
    /// Returns the result of a successful envelope.
    ///
    /// Only the numeric error codes are reported; vendor messages are not
    /// forwarded.
    fn into_result(self) -> ProviderResult<T> {
        match (self.success, self.result) {
            (true, Some(result)) => Ok(result),
            _ => {
                let codes: Vec<String> = self.errors.iter().map(|e| e.code.to_string()).collect();
                Err(ProviderError::upstream(format!(
                    "cloudflare reported failure (codes: {})",
                    if codes.is_empty() { "none".to_owned() } else { codes.join(", ") }
                )))
            }
        }
    }
}

/// The `cloudflare` integration provider.
#[derive(Debug, Clone)]
pub struct CloudflareProvider {
    client: ApiClient,
}

impl CloudflareProvider {
    /// Creates a provider talking to the API at `base_url`.
    pub fn new(base_url: Url, http: &HttpClientConfig) -> ProviderResult<Self> {
        let client = ApiClient::new("cloudflare", base_url, http)?;
        Ok(Self { client })
    }

    /// Creates a provider talking to the public Cloudflare API.
    pub fn with_defaults(http: &HttpClientConfig) -> ProviderResult<Self> {
        let base_url = Url::parse(CLOUDFLARE_API_URL)
            .map_err(|e| ProviderError::invalid_config("invalid cloudflare url").with_source(e))?;
        Self::new(base_url, http)
    }

    fn parse_config(config: &SecretConfig) -> ProviderResult<CloudflareConfig> {
        let config: CloudflareConfig = config.parse()?;
        if config.api_token.trim().is_empty() {
            return Err(ProviderError::invalid_config("apiToken must not be empty"));
        }
        Ok(config)
    }

    async fn list_accounts(&self, token: &str) -> ProviderResult<Vec<Account>> {
        let mut accounts = Vec::new();
        let mut page = 1;

        loop {
            let mut url = self.client.endpoint(&["accounts"]);
            url.query_pairs_mut()
                .append_pair("page", &page.to_string())
                .append_pair("per_page", &PAGE_SIZE.to_string());

            let envelope: Envelope<Vec<Account>> = self.client.get_json(url, token).await?;
            let total_pages = envelope
                .result_info
                .as_ref()
                .and_then(|info| info.total_pages)
                .unwrap_or(1);
            accounts.extend(envelope.into_result()?);

            if page >= total_pages.min(MAX_PAGES) {
                break;
            }
            page += 1;
        }

        Ok(accounts)
    }
}

#[async_trait::async_trait]
impl IntegrationProvider for CloudflareProvider {
    fn configuration(&self) -> IntegrationConfiguration {
        IntegrationConfiguration::new("kestrel-cloudflare")
            .with_ui_spec_file("ui-spec/cloudflare.json")
            .with_describer_queue("describer.cloudflare")
    }

    async fn discover_integrations(
        &self,
        config: &SecretConfig,
    ) -> ProviderResult<Vec<DiscoveredIntegration>> {
        let config = Self::parse_config(config)?;
        let accounts = self.list_accounts(&config.api_token).await?;

        tracing::debug!(
            target: TRACING_TARGET,
            accounts = accounts.len(),
            "Accounts listed"
        );

        let discovered = accounts
            .into_iter()
            .map(|account| {
                let mut integration = DiscoveredIntegration::new(account.id, account.name)
                    .with_label(KIND_LABEL, ACCOUNT_KIND);
                if let Some(account_type) = account.account_type {
                    integration = integration.with_label("account-type", account_type);
                }
                integration
            })
            .collect();

        Ok(discovered)
    }

    async fn health_check(
        &self,
        config: &SecretConfig,
        provider_id: &str,
        _labels: &Labels,
        _annotations: &Annotations,
    ) -> ProviderResult<bool> {
        let config = Self::parse_config(config)?;
        let url = self.client.endpoint(&["accounts", provider_id]);
        let response = self.client.get(url, &config.api_token).await?;

        match response.status() {
            status if status.is_success() => {
                let envelope: Envelope<Account> = response.json().await.map_err(|e| {
                    ProviderError::upstream("cloudflare returned an unexpected payload")
                        .with_source(e)
                })?;
                Ok(envelope.success)
            }
            StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    provider_id,
                    status = response.status().as_u16(),
                    "Account is no longer readable"
                );
                Ok(false)
            }
            status => Err(self.client.status_error(status)),
        }
    }

    async fn resource_types_by_labels(&self, labels: &Labels) -> ProviderResult<Vec<String>> {
        let resource_types = match labels.get(KIND_LABEL).map(String::as_str) {
            Some(ACCOUNT_KIND) => ACCOUNT_RESOURCE_TYPES,
            _ => &[],
        };
        Ok(resource_types.iter().map(|t| (*t).to_owned()).collect())
    }
}
