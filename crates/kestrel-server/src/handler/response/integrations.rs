//! Integration response types.

use std::collections::BTreeMap;

use jiff::Timestamp;
use kestrel_postgres::model;
use kestrel_postgres::types::IntegrationState;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::service::{self, DiscoveredCandidate, DiscoveryFailure, DiscoveryOutcome};

/// Integration response.
#[must_use]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Integration {
    /// Unique integration identifier.
    pub integration_id: Uuid,
    /// Vendor-side identifier of the target.
    pub provider_id: String,
    /// Human-readable name.
    pub name: String,
    /// Integration type.
    pub integration_type: String,
    /// Credential the integration is reached through.
    pub credential_id: Uuid,
    /// Vendor labels.
    pub labels: BTreeMap<String, String>,
    /// Framework annotations, including the last health failure reason.
    pub annotations: BTreeMap<String, String>,
    /// Lifecycle state.
    pub state: IntegrationState,
    /// Timestamp of the last health check.
    pub last_check: Option<Timestamp>,
    /// Timestamp when the integration was created.
    pub created_at: Timestamp,
    /// Timestamp when the integration was last modified.
    pub updated_at: Timestamp,
}

impl Integration {
    pub fn from_model(integration: model::Integration) -> Self {
        Self {
            labels: integration.labels_map(),
            annotations: integration.annotations_map(),
            integration_id: integration.id,
            provider_id: integration.provider_id,
            name: integration.name,
            integration_type: integration.integration_type,
            credential_id: integration.credential_id,
            state: integration.state,
            last_check: integration.last_check.map(Into::into),
            created_at: integration.created_at.into(),
            updated_at: integration.updated_at.into(),
        }
    }

    pub fn from_models(integrations: Vec<model::Integration>) -> Vec<Self> {
        integrations.into_iter().map(Self::from_model).collect()
    }
}

/// A discovered candidate.
#[must_use]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Vendor-side identifier of the target.
    pub provider_id: String,
    /// Human-readable name.
    pub name: String,
    /// Vendor labels.
    pub labels: BTreeMap<String, String>,
    /// `ACTIVE` when the initial health check passed, `INACTIVE` otherwise.
    pub state: IntegrationState,
    /// Why the initial health check failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_reason: Option<String>,
}

impl From<DiscoveredCandidate> for Candidate {
    fn from(candidate: DiscoveredCandidate) -> Self {
        Self {
            provider_id: candidate.provider_id,
            name: candidate.name,
            labels: candidate.labels,
            state: candidate.state,
            health_reason: candidate.health_reason,
        }
    }
}

/// A candidate rejected during discovery.
#[must_use]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateFailure {
    /// Provider id of the rejected candidate, when it had one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
    /// Why the candidate was rejected.
    pub reason: String,
}

impl From<DiscoveryFailure> for CandidateFailure {
    fn from(failure: DiscoveryFailure) -> Self {
        Self {
            provider_id: failure.provider_id,
            reason: failure.reason,
        }
    }
}

/// Response of a discovery.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discovered {
    /// Credential the candidates are reachable through.
    pub credential_id: Uuid,
    /// Classified candidates.
    pub integrations: Vec<Candidate>,
    /// Candidates rejected during validation.
    pub failures: Vec<CandidateFailure>,
}

impl Discovered {
    pub fn from_outcome(outcome: DiscoveryOutcome) -> Self {
        Self {
            credential_id: outcome.credential_id,
            integrations: outcome.candidates.into_iter().map(Into::into).collect(),
            failures: outcome.failures.into_iter().map(Into::into).collect(),
        }
    }
}

/// A failed check in a batch.
#[must_use]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckFailure {
    /// Integration the check was for.
    pub integration_id: Uuid,
    /// Error category, such as `secret_decrypt_failed`.
    pub error: String,
    /// Error message.
    pub message: String,
}

/// Results of a batch of health checks.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    /// Integrations whose check completed, with their refreshed state.
    pub checked: Vec<Integration>,
    /// Checks that could not be performed.
    pub failures: Vec<HealthCheckFailure>,
}

impl HealthReport {
    pub fn from_report(report: service::HealthReport) -> Self {
        Self {
            checked: Integration::from_models(report.checked),
            failures: report
                .failures
                .into_iter()
                .map(|failure| HealthCheckFailure {
                    integration_id: failure.integration_id,
                    error: failure.kind.as_str().to_owned(),
                    message: failure.message,
                })
                .collect(),
        }
    }
}

/// Resource types an integration exposes.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceTypes {
    /// Resource type names.
    pub resource_types: Vec<String>,
}

/// Response of seeding sample integrations.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplesSeeded {
    /// Samples created by this call.
    pub created: Vec<Integration>,
    /// Provider ids that already had a live integration.
    pub existing: Vec<String>,
}

/// Response of purging sample integrations.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplesPurged {
    /// Number of sample integrations removed.
    pub purged: usize,
}
