//! Integration request types.

use std::collections::BTreeMap;

use kestrel_core::integration::DiscoveredIntegration;
use kestrel_core::vault::SecretConfig;
use kestrel_postgres::types::{IntegrationFilter, IntegrationState};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::PaginationRequest;
use crate::handler::{ErrorKind, Result};
use crate::service::DiscoverySource;

/// Request payload for discovering the targets reachable by a credential.
///
/// Exactly one of `credentials` (first-time configuration) and
/// `credentialId` (stored credential) must be given.
#[must_use]
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverIntegrations {
    /// Integration type to discover with.
    #[validate(length(min = 1, max = 64))]
    pub integration_type: String,

    /// Provider configuration to discover with and persist on success.
    pub credentials: Option<SecretConfig>,

    /// Metadata of the credential created from `credentials`.
    #[validate(length(max = 64))]
    pub metadata: Option<BTreeMap<String, String>>,

    /// Stored credential to discover with.
    pub credential_id: Option<Uuid>,
}

impl DiscoverIntegrations {
    /// Returns where the configuration comes from.
    pub fn into_source(self) -> Result<DiscoverySource> {
        match (self.credentials, self.credential_id) {
            (Some(config), None) => Ok(DiscoverySource::RawConfig {
                config,
                metadata: self.metadata.unwrap_or_default(),
            }),
            (None, Some(credential_id)) => Ok(DiscoverySource::Credential(credential_id)),
            (Some(_), Some(_)) => Err(ErrorKind::BadRequest
                .with_message("Provide either credentials or credentialId, not both")),
            (None, None) => Err(ErrorKind::BadRequest
                .with_message("One of credentials or credentialId is required")),
        }
    }
}

/// Request payload for persisting discovered integrations.
#[must_use]
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddIntegrations {
    /// Credential the integrations are reached through.
    pub credential_id: Uuid,

    /// Integration type of the credential.
    #[validate(length(min = 1, max = 64))]
    pub integration_type: String,

    /// Provider ids of the candidates to persist.
    #[validate(length(min = 1, max = 1000))]
    pub provider_ids: Vec<String>,
}

/// Query parameters for listing integrations.
#[must_use]
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListIntegrationsQuery {
    /// Only return integrations owned by this credential.
    pub credential_id: Option<Uuid>,
    /// Only return integrations of this type.
    pub integration_type: Option<String>,
    /// Only return integrations in this state.
    pub state: Option<IntegrationState>,
    /// Number of records to skip.
    pub offset: Option<u32>,
    /// Maximum number of records to return.
    pub limit: Option<u32>,
}

impl ListIntegrationsQuery {
    /// Returns the storage filter.
    pub fn filter(&self) -> IntegrationFilter {
        let mut filter = IntegrationFilter::new();
        if let Some(credential_id) = self.credential_id {
            filter = filter.with_credential_id(credential_id);
        }
        if let Some(integration_type) = &self.integration_type {
            filter = filter.with_integration_type(integration_type);
        }
        if let Some(state) = self.state {
            filter = filter.with_state(state);
        }
        filter
    }

    /// Returns the pagination parameters.
    pub fn pagination(&self) -> PaginationRequest {
        PaginationRequest {
            offset: self.offset,
            limit: self.limit,
        }
    }
}

/// Request payload for a batch health check.
#[must_use]
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CheckIntegrations {
    /// Only check integrations not checked for at least this many seconds.
    #[serde(default)]
    pub older_than_secs: u64,

    /// Maximum number of integrations to check.
    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<i64>,
}

impl CheckIntegrations {
    /// Default batch size.
    pub const DEFAULT_LIMIT: i64 = 100;

    /// Returns the batch size.
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(Self::DEFAULT_LIMIT)
    }
}

/// Request payload for restoring an archived integration.
#[must_use]
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnarchiveIntegration {
    /// Credential to rebind the integration to.
    pub credential_id: Option<Uuid>,
}

/// One sample integration to seed.
#[must_use]
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SampleIntegration {
    /// Vendor-side identifier.
    #[validate(length(min = 1, max = 255))]
    pub provider_id: String,

    /// Human-readable name.
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    /// Vendor labels.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

impl From<SampleIntegration> for DiscoveredIntegration {
    fn from(sample: SampleIntegration) -> Self {
        let mut discovered = DiscoveredIntegration::new(sample.provider_id, sample.name);
        discovered.labels = sample.labels;
        discovered
    }
}

/// Request payload for seeding sample integrations.
#[must_use]
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SeedSampleIntegrations {
    /// Credential the samples are attached to.
    pub credential_id: Uuid,

    /// Samples to create.
    #[validate(length(min = 1, max = 100), nested)]
    pub integrations: Vec<SampleIntegration>,
}
