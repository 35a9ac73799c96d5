//! Thin JSON-over-HTTPS client the vendor plugins share.

use std::fmt;

use kestrel_core::{ProviderError, ProviderErrorKind, ProviderResult};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::HttpClientConfig;

/// Tracing target for vendor API calls.
pub const TRACING_TARGET: &str = "kestrel_providers::client";

/// A vendor API rooted at a base URL, authenticated with bearer tokens.
#[derive(Clone)]
pub(crate) struct ApiClient {
    http: Client,
    base_url: Url,
    vendor: &'static str,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("vendor", &self.vendor)
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Creates a client for `vendor` rooted at `base_url`.
    pub fn new(
        vendor: &'static str,
        base_url: Url,
        config: &HttpClientConfig,
    ) -> ProviderResult<Self> {
        if base_url.cannot_be_a_base() {
            return Err(ProviderError::new(
                ProviderErrorKind::Internal,
                format!("{vendor} base url cannot be a base"),
            ));
        }

        let http = Client::builder()
            .timeout(config.effective_timeout())
            .user_agent(config.effective_user_agent())
            .build()
            .map_err(|e| {
                let message = "http client could not be built";
                ProviderError::new(ProviderErrorKind::Internal, message).with_source(e)
            })?;

        tracing::debug!(
            target: TRACING_TARGET,
            vendor,
            base_url = %base_url,
            timeout_ms = config.effective_timeout().as_millis(),
            "Vendor client created"
        );

        Ok(Self {
            http,
            base_url,
            vendor,
        })
    }

    /// Returns the vendor name used in error messages.
    pub fn vendor(&self) -> &'static str {
        self.vendor
    }

    /// Builds an endpoint URL from path segments.
    ///
    /// Segments are percent-encoded, so a vendor-supplied identifier can
    /// never escape its path position.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Sends an authenticated GET request.
    ///
    /// Transport failures are mapped to provider errors. Any status code is
    /// returned to the caller.
    pub async fn get(&self, url: Url, token: &str) -> ProviderResult<Response> {
        tracing::trace!(target: TRACING_TARGET, vendor = self.vendor, url = %url, "GET");

        self.http
            .get(url)
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.transport_error(e))
    }

    /// Sends an authenticated GET request and decodes a successful response.
    pub async fn get_json<T: DeserializeOwned>(&self, url: Url, token: &str) -> ProviderResult<T> {
        let response = self.get(url, token).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(self.status_error(status));
        }

        response.json::<T>().await.map_err(|e| {
            ProviderError::upstream(format!("{} returned an unexpected payload", self.vendor))
                .with_source(e)
        })
    }

    /// Maps an unsuccessful status code to a provider error.
    pub fn status_error(&self, status: StatusCode) -> ProviderError {
        let vendor = self.vendor;
        let kind = match status {
            StatusCode::UNAUTHORIZED => ProviderErrorKind::Authentication,
            StatusCode::FORBIDDEN => ProviderErrorKind::Authorization,
            StatusCode::NOT_FOUND => ProviderErrorKind::NotFound,
            StatusCode::TOO_MANY_REQUESTS => ProviderErrorKind::RateLimited,
            _ => ProviderErrorKind::Upstream,
        };

        let message = match kind {
            ProviderErrorKind::Authentication => format!("{vendor} rejected the token"),
            ProviderErrorKind::Authorization => format!("{vendor} denied access with the token"),
            ProviderErrorKind::NotFound => format!("{vendor} resource not found"),
            ProviderErrorKind::RateLimited => format!("{vendor} rate limit exceeded"),
            _ => format!("{vendor} answered with HTTP {}", status.as_u16()),
        };

        ProviderError::new(kind, message)
    }

    fn transport_error(&self, error: reqwest::Error) -> ProviderError {
        let vendor = self.vendor;
        let message = if error.is_timeout() {
            format!("request to {vendor} timed out")
        } else if error.is_connect() {
            format!("could not connect to {vendor}")
        } else {
            format!("request to {vendor} failed")
        };

        tracing::warn!(target: TRACING_TARGET, vendor, error = %message, "Vendor request failed");
        ProviderError::network(message).with_source(error.without_url())
    }
}
