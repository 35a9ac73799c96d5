//! Integration model for PostgreSQL database operations.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::integrations;
use crate::types::{
    HasCreatedAt, HasDeletedAt, HasLastCheck, HasUpdatedAt, IntegrationConstraints,
    IntegrationState, from_string_map, jsonb_text_len,
};

/// Accepted length of `provider_id` and `name`, in characters.
pub const INTEGRATION_TEXT_LEN: RangeInclusive<usize> = 1..=255;

/// Accepted length of the rendered `labels` and `annotations`, in characters.
pub const INTEGRATION_DOCUMENT_LEN: RangeInclusive<usize> = 2..=16384;

/// Returns the first `integrations` check constraint the given column values
/// would violate.
pub fn check_integration_columns(
    provider_id: &str,
    name: &str,
    labels: &serde_json::Value,
    annotations: &serde_json::Value,
) -> Option<IntegrationConstraints> {
    if !INTEGRATION_TEXT_LEN.contains(&provider_id.chars().count()) {
        Some(IntegrationConstraints::ProviderIdLength)
    } else if !INTEGRATION_TEXT_LEN.contains(&name.chars().count()) {
        Some(IntegrationConstraints::NameLength)
    } else if !INTEGRATION_DOCUMENT_LEN.contains(&jsonb_text_len(labels)) {
        Some(IntegrationConstraints::LabelsSize)
    } else if !INTEGRATION_DOCUMENT_LEN.contains(&jsonb_text_len(annotations)) {
        Some(IntegrationConstraints::AnnotationsSize)
    } else {
        None
    }
}

/// Integration model representing one discovered target.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = integrations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Integration {
    /// Unique integration identifier.
    pub id: Uuid,
    /// Vendor-assigned identifier, e.g. an AWS account id.
    pub provider_id: String,
    /// Human-readable name.
    pub name: String,
    /// Provider type tag, equal to the owning credential's.
    pub integration_type: String,
    /// Owning credential.
    pub credential_id: Uuid,
    /// Provider-supplied labels.
    pub labels: serde_json::Value,
    /// Framework-maintained annotations.
    pub annotations: serde_json::Value,
    /// Lifecycle state.
    pub state: IntegrationState,
    /// Timestamp of the last health check.
    pub last_check: Option<Timestamp>,
    /// Timestamp when the integration was created.
    pub created_at: Timestamp,
    /// Timestamp when the integration was last updated.
    pub updated_at: Timestamp,
    /// Timestamp when the integration was soft-deleted.
    pub deleted_at: Option<Timestamp>,
}

/// Data for creating a new integration.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = integrations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewIntegration {
    pub provider_id: String,
    pub name: String,
    pub integration_type: String,
    pub credential_id: Uuid,
    pub labels: serde_json::Value,
    pub annotations: serde_json::Value,
    pub state: IntegrationState,
    pub last_check: Option<Timestamp>,
}

/// Data for updating an integration.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = integrations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UpdateIntegration {
    /// Lifecycle state.
    pub state: Option<IntegrationState>,
    /// Provider-supplied labels.
    pub labels: Option<serde_json::Value>,
    /// Framework-maintained annotations.
    pub annotations: Option<serde_json::Value>,
    /// Rebinds the integration to another credential of the same type.
    pub credential_id: Option<Uuid>,
    /// Last health check timestamp.
    pub last_check: Option<Option<Timestamp>>,
    /// Soft delete timestamp.
    pub deleted_at: Option<Option<Timestamp>>,
}

impl NewIntegration {
    /// Returns the first check constraint this row would violate on insert.
    pub fn violated_constraint(&self) -> Option<IntegrationConstraints> {
        check_integration_columns(&self.provider_id, &self.name, &self.labels, &self.annotations)
    }
}

impl Integration {
    /// Returns the labels as a string map.
    pub fn labels_map(&self) -> BTreeMap<String, String> {
        from_string_map(&self.labels)
    }

    /// Returns the annotations as a string map.
    pub fn annotations_map(&self) -> BTreeMap<String, String> {
        from_string_map(&self.annotations)
    }

    /// Returns whether the integration is archived.
    #[inline]
    pub fn is_archived(&self) -> bool {
        self.state.is_archived()
    }
}

impl HasCreatedAt for Integration {
    fn created_at(&self) -> jiff::Timestamp {
        self.created_at.into()
    }
}

impl HasUpdatedAt for Integration {
    fn updated_at(&self) -> jiff::Timestamp {
        self.updated_at.into()
    }
}

impl HasDeletedAt for Integration {
    fn deleted_at(&self) -> Option<jiff::Timestamp> {
        self.deleted_at.map(Into::into)
    }
}

impl HasLastCheck for Integration {
    fn last_check(&self) -> Option<jiff::Timestamp> {
        self.last_check.map(Into::into)
    }
}
