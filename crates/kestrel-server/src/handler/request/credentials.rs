//! Credential request types.

use std::collections::BTreeMap;

use kestrel_core::vault::SecretConfig;
use kestrel_postgres::types::CredentialFilter;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::PaginationRequest;
use crate::service::CredentialChanges;

/// Query parameters for listing credentials.
#[must_use]
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCredentialsQuery {
    /// Only return credentials of this integration type.
    pub integration_type: Option<String>,
    /// Number of records to skip.
    pub offset: Option<u32>,
    /// Maximum number of records to return.
    pub limit: Option<u32>,
}

impl ListCredentialsQuery {
    /// Returns the storage filter.
    pub fn filter(&self) -> CredentialFilter {
        match &self.integration_type {
            Some(integration_type) => CredentialFilter::new().with_integration_type(integration_type),
            None => CredentialFilter::new(),
        }
    }

    /// Returns the pagination parameters.
    pub fn pagination(&self) -> PaginationRequest {
        PaginationRequest {
            offset: self.offset,
            limit: self.limit,
        }
    }
}

/// Request payload for updating a credential.
///
/// Omitted fields are left unchanged.
#[must_use]
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCredential {
    /// Replacement provider configuration.
    pub credentials: Option<SecretConfig>,

    /// Replacement metadata.
    #[validate(length(max = 64))]
    pub metadata: Option<BTreeMap<String, String>>,
}

impl UpdateCredential {
    /// Returns `true` if the request changes nothing.
    pub fn is_empty(&self) -> bool {
        self.credentials.is_none() && self.metadata.is_none()
    }

    /// Converts the request into service-level changes.
    pub fn into_changes(self) -> CredentialChanges {
        CredentialChanges {
            config: self.credentials,
            metadata: self.metadata,
        }
    }
}
