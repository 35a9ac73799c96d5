//! Credential response types.

use std::collections::BTreeMap;

use jiff::Timestamp;
use kestrel_postgres::model;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::HealthReport;
use crate::service::CredentialUpdateOutcome;

/// Credential response.
///
/// The encrypted secret is never part of the response.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    /// Unique credential identifier.
    pub credential_id: Uuid,
    /// Integration type the credential belongs to.
    pub integration_type: String,
    /// Caller-supplied metadata.
    pub metadata: BTreeMap<String, String>,
    /// Timestamp when the credential was created.
    pub created_at: Timestamp,
    /// Timestamp when the credential was last modified.
    pub updated_at: Timestamp,
}

impl Credential {
    pub fn from_model(credential: model::Credential) -> Self {
        Self {
            metadata: credential.metadata_map(),
            credential_id: credential.id,
            integration_type: credential.integration_type,
            created_at: credential.created_at.into(),
            updated_at: credential.updated_at.into(),
        }
    }

    pub fn from_models(credentials: Vec<model::Credential>) -> Vec<Self> {
        credentials.into_iter().map(Self::from_model).collect()
    }
}

/// Response of a credential update.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialUpdated {
    /// The updated credential.
    pub credential: Credential,
    /// Re-check results of the credential's integrations.
    pub health: HealthReport,
}

impl CredentialUpdated {
    pub fn from_outcome(outcome: CredentialUpdateOutcome) -> Self {
        Self {
            credential: Credential::from_model(outcome.credential),
            health: HealthReport::from_report(outcome.health),
        }
    }
}

/// Response of a credential deletion.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialDeleted {
    /// Number of integrations archived with the credential.
    pub archived_integrations: usize,
}
