//! GitHub organizations as integration targets.
//!
//! A token discovers every organization its owner is a member of. The
//! organization login is the provider id and is re-read on each health check.

mod config;

use kestrel_core::integration::{
    Annotations, DiscoveredIntegration, IntegrationConfiguration, IntegrationProvider, Labels,
};
use kestrel_core::vault::SecretConfig;
use kestrel_core::{ProviderError, ProviderResult};
use reqwest::StatusCode;
use serde::Deserialize;
use url::Url;

pub use self::config::GitHubConfig;
use crate::client::ApiClient;
use crate::config::HttpClientConfig;

/// Tracing target for the GitHub plugin.
const TRACING_TARGET: &str = "kestrel_providers::github";

/// Default GitHub REST API base URL.
pub const GITHUB_API_URL: &str = "https://api.github.com/";

/// Page size requested from the organizations endpoint.
const PAGE_SIZE: usize = 100;

/// Upper bound on pages read during one discovery.
const MAX_PAGES: usize = 50;

/// Label holding the kind of a discovered target.
const KIND_LABEL: &str = "kind";

const ORGANIZATION_KIND: &str = "organization";

/// Resource types collectable from a GitHub organization.
const ORGANIZATION_RESOURCE_TYPES: &[&str] = &[
    "github/repository",
    "github/team",
    "github/member",
    "github/actions-workflow",
];

#[derive(Debug, Deserialize)]
struct Organization {
    id: u64,
    login: String,
    #[serde(default)]
    description: Option<String>,
}

/// The `github` integration provider.
#[derive(Debug, Clone)]
pub struct GitHubProvider {
    client: ApiClient,
}

impl GitHubProvider {
    /// Creates a provider talking to the API at `base_url`.
    pub fn new(base_url: Url, http: &HttpClientConfig) -> ProviderResult<Self> {
        let client = ApiClient::new("github", base_url, http)?;
        Ok(Self { client })
    }

    /// Creates a provider talking to the public GitHub API.
    pub fn with_defaults(http: &HttpClientConfig) -> ProviderResult<Self> {
        let base_url = Url::parse(GITHUB_API_URL)
            .map_err(|e| ProviderError::invalid_config("invalid github url").with_source(e))?;
        Self::new(base_url, http)
    }

    fn parse_config(config: &SecretConfig) -> ProviderResult<GitHubConfig> {
        let config: GitHubConfig = config.parse()?;
        if config.token.trim().is_empty() {
            return Err(ProviderError::invalid_config("token must not be empty"));
        }
        Ok(config)
    }

    async fn list_organizations(&self, token: &str) -> ProviderResult<Vec<Organization>> {
        let mut organizations = Vec::new();

        for page in 1..=MAX_PAGES {
            let mut url = self.client.endpoint(&["user", "orgs"]);
            url.query_pairs_mut()
                .append_pair("per_page", &PAGE_SIZE.to_string())
                .append_pair("page", &page.to_string());

            let batch: Vec<Organization> = self.client.get_json(url, token).await?;
            let is_last = batch.len() < PAGE_SIZE;
            organizations.extend(batch);

            if is_last {
                return Ok(organizations);
            }
        }

        tracing::warn!(
            target: TRACING_TARGET,
            pages = MAX_PAGES,
            organizations = organizations.len(),
            "Organization listing stopped at the page limit"
        );
        Ok(organizations)
    }
}

#[async_trait::async_trait]
impl IntegrationProvider for GitHubProvider {
    fn configuration(&self) -> IntegrationConfiguration {
        IntegrationConfiguration::new("kestrel-github")
            .with_ui_spec_file("ui-spec/github.json")
            .with_describer_queue("describer.github")
            .with_max_concurrency(4)
    }

    async fn discover_integrations(
        &self,
        config: &SecretConfig,
    ) -> ProviderResult<Vec<DiscoveredIntegration>> {
        let config = Self::parse_config(config)?;
        let organizations = self.list_organizations(&config.token).await?;

        tracing::debug!(
            target: TRACING_TARGET,
            organizations = organizations.len(),
            "Organizations listed"
        );

        let discovered = organizations
            .into_iter()
            .map(|org| {
                let mut integration = DiscoveredIntegration::new(&org.login, &org.login)
                    .with_label(KIND_LABEL, ORGANIZATION_KIND)
                    .with_label("github-id", org.id.to_string());
                if let Some(description) = org.description.filter(|d| !d.is_empty()) {
                    integration = integration.with_label("description", description);
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
        let url = self.client.endpoint(&["orgs", provider_id]);
        let response = self.client.get(url, &config.token).await?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    provider_id,
                    status = response.status().as_u16(),
                    "Organization is no longer readable"
                );
                Ok(false)
            }
            status => Err(self.client.status_error(status)),
        }
    }

    async fn resource_types_by_labels(&self, labels: &Labels) -> ProviderResult<Vec<String>> {
        let resource_types = match labels.get(KIND_LABEL).map(String::as_str) {
            Some(ORGANIZATION_KIND) => ORGANIZATION_RESOURCE_TYPES,
            _ => &[],
        };
        Ok(resource_types.iter().map(|t| (*t).to_owned()).collect())
    }
}

#[cfg(test)]
mod tests {
    use axum::Json;
    use axum::Router;
    use axum::extract::{Path, Query};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use kestrel_core::ProviderErrorKind;
    use serde_json::{Value, json};

    use super::*;
    use crate::testing::{bearer, serve};

    const TOKEN: &str = "ghp_exampletoken";

    async fn user_orgs(
        headers: HeaderMap,
        Query(query): Query<std::collections::HashMap<String, String>>,
    ) -> (StatusCode, Json<Value>) {
        if bearer(&headers) != Some(TOKEN) {
            return (StatusCode::UNAUTHORIZED, Json(json!({"message": "Bad credentials"})));
        }

        let page = query.get("page").map(String::as_str);
        let body = match page {
            Some("1") => json!([
                {"id": 1, "login": "acme", "description": "Acme Corp"},
                {"id": 2, "login": "globex", "description": ""},
            ]),
            _ => json!([]),
        };
        (StatusCode::OK, Json(body))
    }

    async fn org(headers: HeaderMap, Path(login): Path<String>) -> StatusCode {
        match (bearer(&headers), login.as_str()) {
            (Some(TOKEN), "acme") => StatusCode::OK,
            (Some(TOKEN), _) => StatusCode::NOT_FOUND,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    async fn provider() -> GitHubProvider {
        let router = Router::new()
            .route("/user/orgs", get(user_orgs))
            .route("/orgs/{login}", get(org));
        let base_url = serve(router).await;
        GitHubProvider::new(base_url, &HttpClientConfig::default()).unwrap()
    }

    fn config(token: &str) -> SecretConfig {
        SecretConfig::new().with("token", token)
    }

    #[tokio::test]
    async fn discovers_organizations() {
        let provider = provider().await;

        let found = provider.discover_integrations(&config(TOKEN)).await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].provider_id, "acme");
        assert_eq!(found[0].labels.get("github-id").map(String::as_str), Some("1"));
        assert_eq!(
            found[0].labels.get("description").map(String::as_str),
            Some("Acme Corp")
        );
        assert!(!found[1].labels.contains_key("description"));
    }

    #[tokio::test]
    async fn rejected_token_fails_discovery_without_echoing_it() {
        let provider = provider().await;

        let error = provider
            .discover_integrations(&config("ghp_revoked"))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ProviderErrorKind::Authentication);
        assert!(!error.to_string().contains("ghp_revoked"));
    }

    #[tokio::test]
    async fn health_distinguishes_denied_from_failed() {
        let provider = provider().await;
        let labels = Labels::new();
        let annotations = Annotations::new();

        let healthy = provider
            .health_check(&config(TOKEN), "acme", &labels, &annotations)
            .await
            .unwrap();
        assert!(healthy);

        let healthy = provider
            .health_check(&config(TOKEN), "initech", &labels, &annotations)
            .await
            .unwrap();
        assert!(!healthy);

        let error = provider
            .health_check(&config("ghp_revoked"), "acme", &labels, &annotations)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ProviderErrorKind::Authentication);
    }

    #[tokio::test]
    async fn invalid_config_is_rejected_before_any_request() {
        let provider = GitHubProvider::with_defaults(&HttpClientConfig::default()).unwrap();

        let error = provider
            .discover_integrations(&SecretConfig::new().with("accessKeyId", "AKIA"))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ProviderErrorKind::InvalidConfig);

        let error = provider
            .discover_integrations(&config("  "))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ProviderErrorKind::InvalidConfig);
    }

    #[tokio::test]
    async fn organization_resource_types() {
        let provider = GitHubProvider::with_defaults(&HttpClientConfig::default()).unwrap();

        let mut labels = Labels::new();
        assert!(provider.resource_types_by_labels(&labels).await.unwrap().is_empty());

        labels.insert(KIND_LABEL.to_owned(), ORGANIZATION_KIND.to_owned());
        let types = provider.resource_types_by_labels(&labels).await.unwrap();
        assert!(types.contains(&"github/repository".to_owned()));
    }

    #[tokio::test]
    async fn listing_stops_at_page_limit() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let requests = Arc::new(AtomicUsize::new(0));
        let counter = requests.clone();
        let full_page = move || {
            let counter = counter.clone();
            async move {
                let page = counter.fetch_add(1, Ordering::SeqCst);
                let orgs: Vec<_> = (0..PAGE_SIZE)
                    .map(|i| json!({"id": page * PAGE_SIZE + i, "login": format!("org-{page}-{i}")}))
                    .collect();
                Json(Value::Array(orgs))
            }
        };

        let base_url = serve(Router::new().route("/user/orgs", get(full_page))).await;
        let provider = GitHubProvider::new(base_url, &HttpClientConfig::default()).unwrap();

        let organizations = provider.list_organizations(TOKEN).await.unwrap();
        assert_eq!(organizations.len(), MAX_PAGES * PAGE_SIZE);
        assert_eq!(requests.load(Ordering::SeqCst), MAX_PAGES);
    }
}
