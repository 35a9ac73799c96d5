//! Credential model for PostgreSQL database operations.

use std::collections::BTreeMap;

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::credentials;
use crate::types::{HasCreatedAt, HasDeletedAt, HasUpdatedAt, from_string_map};

/// Credential model holding an encrypted provider configuration.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = credentials)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Credential {
    /// Unique credential identifier.
    pub id: Uuid,
    /// Provider type tag; immutable after creation.
    pub integration_type: String,
    /// Vault envelope of the provider configuration.
    pub secret: Vec<u8>,
    /// Free-form string metadata.
    pub metadata: serde_json::Value,
    /// Timestamp when the credential was created.
    pub created_at: Timestamp,
    /// Timestamp when the credential was last updated.
    pub updated_at: Timestamp,
    /// Timestamp when the credential was soft-deleted.
    pub deleted_at: Option<Timestamp>,
}

/// Data for creating a new credential.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = credentials)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewCredential {
    /// Provider type tag.
    pub integration_type: String,
    /// Vault envelope.
    pub secret: Vec<u8>,
    /// Free-form string metadata.
    pub metadata: serde_json::Value,
}

/// Data for updating a credential.
///
/// The integration type is deliberately absent.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = credentials)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UpdateCredential {
    /// Replacement vault envelope.
    pub secret: Option<Vec<u8>>,
    /// Replacement metadata.
    pub metadata: Option<serde_json::Value>,
    /// Soft delete timestamp.
    pub deleted_at: Option<Option<Timestamp>>,
}

impl Credential {
    /// Returns the metadata as a string map.
    pub fn metadata_map(&self) -> BTreeMap<String, String> {
        from_string_map(&self.metadata)
    }
}

impl HasCreatedAt for Credential {
    fn created_at(&self) -> jiff::Timestamp {
        self.created_at.into()
    }
}

impl HasUpdatedAt for Credential {
    fn updated_at(&self) -> jiff::Timestamp {
        self.updated_at.into()
    }
}

impl HasDeletedAt for Credential {
    fn deleted_at(&self) -> Option<jiff::Timestamp> {
        self.deleted_at.map(Into::into)
    }
}
