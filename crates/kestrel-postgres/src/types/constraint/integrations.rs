//! Integrations table constraint violations.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use super::ConstraintCategory;

/// Integrations table constraint violations.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[derive(Serialize, Deserialize, Display, EnumIter, EnumString)]
#[serde(into = "String", try_from = "String")]
pub enum IntegrationConstraints {
    // Integration validation constraints
    #[strum(serialize = "integrations_provider_id_length")]
    ProviderIdLength,
    #[strum(serialize = "integrations_name_length")]
    NameLength,
    #[strum(serialize = "integrations_labels_size")]
    LabelsSize,
    #[strum(serialize = "integrations_annotations_size")]
    AnnotationsSize,

    // Integration business logic constraints
    #[strum(serialize = "integrations_credential_type_fkey")]
    CredentialTypeMismatch,

    // Integration uniqueness constraints
    #[strum(serialize = "integrations_provider_id_unique_idx")]
    ProviderIdUnique,

    // Integration chronological constraints
    #[strum(serialize = "integrations_updated_after_created")]
    UpdatedAfterCreated,
    #[strum(serialize = "integrations_deleted_after_created")]
    DeletedAfterCreated,
}

impl IntegrationConstraints {
    /// Creates a new [`IntegrationConstraints`] from the constraint name.
    pub fn new(constraint: &str) -> Option<Self> {
        constraint.parse().ok()
    }

    /// Returns the category of this constraint violation.
    pub fn categorize(&self) -> ConstraintCategory {
        match self {
            IntegrationConstraints::ProviderIdLength
            | IntegrationConstraints::NameLength
            | IntegrationConstraints::LabelsSize
            | IntegrationConstraints::AnnotationsSize => ConstraintCategory::Validation,

            IntegrationConstraints::CredentialTypeMismatch => ConstraintCategory::BusinessLogic,

            IntegrationConstraints::ProviderIdUnique => ConstraintCategory::Uniqueness,

            IntegrationConstraints::UpdatedAfterCreated
            | IntegrationConstraints::DeletedAfterCreated => ConstraintCategory::Chronological,
        }
    }
}

impl From<IntegrationConstraints> for String {
    #[inline]
    fn from(val: IntegrationConstraints) -> Self {
        val.to_string()
    }
}

impl TryFrom<String> for IntegrationConstraints {
    type Error = strum::ParseError;

    #[inline]
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
