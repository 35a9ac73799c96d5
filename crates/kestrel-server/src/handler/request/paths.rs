//! Path parameter types for HTTP handlers.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Path parameters for credential operations.
#[must_use]
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialPathParams {
    /// Unique identifier of the credential.
    pub credential_id: Uuid,
}

/// Path parameters for integration operations.
#[must_use]
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationPathParams {
    /// Unique identifier of the integration.
    pub integration_id: Uuid,
}

/// Path parameters for integration type operations.
#[must_use]
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationTypePathParams {
    /// Name of the integration type.
    pub integration_type: String,
}
