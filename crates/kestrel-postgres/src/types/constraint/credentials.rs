//! Credentials table constraint violations.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use super::ConstraintCategory;

/// Credentials table constraint violations.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[derive(Serialize, Deserialize, Display, EnumIter, EnumString)]
#[serde(into = "String", try_from = "String")]
pub enum CredentialConstraints {
    // Credential validation constraints
    #[strum(serialize = "credentials_integration_type_length")]
    IntegrationTypeLength,
    #[strum(serialize = "credentials_secret_size")]
    SecretSize,
    #[strum(serialize = "credentials_metadata_size")]
    MetadataSize,

    // Credential uniqueness constraints
    #[strum(serialize = "credentials_id_type_unique")]
    IdTypeUnique,

    // Credential chronological constraints
    #[strum(serialize = "credentials_updated_after_created")]
    UpdatedAfterCreated,
    #[strum(serialize = "credentials_deleted_after_created")]
    DeletedAfterCreated,
}

impl CredentialConstraints {
    /// Creates a new [`CredentialConstraints`] from the constraint name.
    pub fn new(constraint: &str) -> Option<Self> {
        constraint.parse().ok()
    }

    /// Returns the category of this constraint violation.
    pub fn categorize(&self) -> ConstraintCategory {
        match self {
            CredentialConstraints::IntegrationTypeLength
            | CredentialConstraints::SecretSize
            | CredentialConstraints::MetadataSize => ConstraintCategory::Validation,

            CredentialConstraints::IdTypeUnique => ConstraintCategory::Uniqueness,

            CredentialConstraints::UpdatedAfterCreated
            | CredentialConstraints::DeletedAfterCreated => ConstraintCategory::Chronological,
        }
    }
}

impl From<CredentialConstraints> for String {
    #[inline]
    fn from(val: CredentialConstraints) -> Self {
        val.to_string()
    }
}

impl TryFrom<String> for CredentialConstraints {
    type Error = strum::ParseError;

    #[inline]
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
