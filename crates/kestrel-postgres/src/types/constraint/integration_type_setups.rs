//! Integration type setups table constraint violations.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use super::ConstraintCategory;

/// Integration type setups table constraint violations.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[derive(Serialize, Deserialize, Display, EnumIter, EnumString)]
#[serde(into = "String", try_from = "String")]
pub enum IntegrationTypeSetupConstraints {
    #[strum(serialize = "integration_type_setups_integration_type_length")]
    IntegrationTypeLength,
    #[strum(serialize = "integration_type_setups_updated_after_created")]
    UpdatedAfterCreated,
}

impl IntegrationTypeSetupConstraints {
    /// Creates a new [`IntegrationTypeSetupConstraints`] from the constraint name.
    pub fn new(constraint: &str) -> Option<Self> {
        constraint.parse().ok()
    }

    /// Returns the category of this constraint violation.
    pub fn categorize(&self) -> ConstraintCategory {
        match self {
            IntegrationTypeSetupConstraints::IntegrationTypeLength => ConstraintCategory::Validation,
            IntegrationTypeSetupConstraints::UpdatedAfterCreated => ConstraintCategory::Chronological,
        }
    }
}

impl From<IntegrationTypeSetupConstraints> for String {
    #[inline]
    fn from(val: IntegrationTypeSetupConstraints) -> Self {
        val.to_string()
    }
}

impl TryFrom<String> for IntegrationTypeSetupConstraints {
    type Error = strum::ParseError;

    #[inline]
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
