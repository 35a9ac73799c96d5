//! Filtering options for list queries.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::IntegrationState;

/// Filter options for credential listings.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct CredentialFilter {
    /// Filter by integration type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integration_type: Option<String>,
}

impl CredentialFilter {
    /// Creates a new empty filter.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters by integration type.
    #[inline]
    pub fn with_integration_type(mut self, integration_type: impl Into<String>) -> Self {
        self.integration_type = Some(integration_type.into());
        self
    }
}

/// Filter options for integration listings.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct IntegrationFilter {
    /// Filter by owning credential.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_id: Option<Uuid>,
    /// Filter by integration type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integration_type: Option<String>,
    /// Filter by lifecycle state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<IntegrationState>,
}

impl IntegrationFilter {
    /// Creates a new empty filter.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters by owning credential.
    #[inline]
    pub fn with_credential_id(mut self, credential_id: Uuid) -> Self {
        self.credential_id = Some(credential_id);
        self
    }

    /// Filters by integration type.
    #[inline]
    pub fn with_integration_type(mut self, integration_type: impl Into<String>) -> Self {
        self.integration_type = Some(integration_type.into());
        self
    }

    /// Filters by lifecycle state.
    #[inline]
    pub fn with_state(mut self, state: IntegrationState) -> Self {
        self.state = Some(state);
        self
    }

    /// Returns whether any filter is active.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.credential_id.is_none() && self.integration_type.is_none() && self.state.is_none()
    }
}
