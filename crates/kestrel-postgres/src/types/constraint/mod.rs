//! Database constraint violations, one enum per table.

mod credentials;
mod integration_type_setups;
mod integrations;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use self::credentials::CredentialConstraints;
pub use self::integration_type_setups::IntegrationTypeSetupConstraints;
pub use self::integrations::IntegrationConstraints;

/// Unified constraint violation enum that can represent any known constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ConstraintViolation {
    Credential(CredentialConstraints),
    Integration(IntegrationConstraints),
    IntegrationTypeSetup(IntegrationTypeSetupConstraints),
}

/// Categories of database constraint violations.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintCategory {
    /// Data validation constraints (format, length, range checks).
    Validation,
    /// Chronological integrity constraints (timestamp relationships).
    Chronological,
    /// Business logic constraints (domain-specific rules).
    BusinessLogic,
    /// Uniqueness constraints (primary keys, unique indexes).
    Uniqueness,
}

impl ConstraintViolation {
    /// Creates a new [`ConstraintViolation`] from the constraint name.
    ///
    /// Returns `None` if the constraint name is not recognized.
    ///
    /// ```
    /// use kestrel_postgres::types::ConstraintViolation;
    ///
    /// let violation = ConstraintViolation::new("integrations_provider_id_unique_idx");
    /// assert!(violation.is_some());
    ///
    /// let unknown = ConstraintViolation::new("unknown_constraint");
    /// assert!(unknown.is_none());
    /// ```
    pub fn new(constraint: &str) -> Option<Self> {
        let prefix = constraint.split('_').next()?;
        macro_rules! try_parse {
            ($($parser:expr => $variant:ident),+ $(,)?) => {
                None$(.or_else(|| $parser(constraint).map(Self::$variant)))+
            };
        }

        match prefix {
            "credentials" => try_parse!(CredentialConstraints::new => Credential),
            "integrations" => try_parse!(IntegrationConstraints::new => Integration),
            "integration" => {
                try_parse!(IntegrationTypeSetupConstraints::new => IntegrationTypeSetup)
            }
            _ => None,
        }
    }

    /// Returns the table name associated with this constraint.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConstraintViolation::Credential(_) => "credentials",
            ConstraintViolation::Integration(_) => "integrations",
            ConstraintViolation::IntegrationTypeSetup(_) => "integration_type_setups",
        }
    }

    /// Returns the category of this constraint violation.
    pub fn constraint_category(&self) -> ConstraintCategory {
        match self {
            ConstraintViolation::Credential(c) => c.categorize(),
            ConstraintViolation::Integration(c) => c.categorize(),
            ConstraintViolation::IntegrationTypeSetup(c) => c.categorize(),
        }
    }

    /// Returns the underlying constraint name as used in the database.
    #[inline]
    pub fn constraint_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ConstraintViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintViolation::Credential(c) => write!(f, "{}", c),
            ConstraintViolation::Integration(c) => write!(f, "{}", c),
            ConstraintViolation::IntegrationTypeSetup(c) => write!(f, "{}", c),
        }
    }
}

impl From<ConstraintViolation> for String {
    #[inline]
    fn from(val: ConstraintViolation) -> Self {
        val.to_string()
    }
}

impl TryFrom<String> for ConstraintViolation {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value).ok_or_else(|| format!("Unknown constraint: {}", value))
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn constraint_parsing() {
        assert_eq!(
            ConstraintViolation::new("integrations_provider_id_unique_idx"),
            Some(ConstraintViolation::Integration(
                IntegrationConstraints::ProviderIdUnique
            ))
        );

        assert_eq!(
            ConstraintViolation::new("integration_type_setups_integration_type_length"),
            Some(ConstraintViolation::IntegrationTypeSetup(
                IntegrationTypeSetupConstraints::IntegrationTypeLength
            ))
        );

        assert_eq!(ConstraintViolation::new("unknown_constraint"), None);
        assert_eq!(ConstraintViolation::new("integrations_unknown"), None);
    }

    #[test]
    fn every_constraint_parses_back() {
        for c in CredentialConstraints::iter() {
            let violation = ConstraintViolation::new(&c.to_string());
            assert_eq!(violation, Some(ConstraintViolation::Credential(c)));
        }
        for c in IntegrationConstraints::iter() {
            let violation = ConstraintViolation::new(&c.to_string());
            assert_eq!(violation, Some(ConstraintViolation::Integration(c)));
        }
        for c in IntegrationTypeSetupConstraints::iter() {
            let violation = ConstraintViolation::new(&c.to_string());
            assert_eq!(violation, Some(ConstraintViolation::IntegrationTypeSetup(c)));
        }
    }

    #[test]
    fn table_name_extraction() {
        let violation = ConstraintViolation::Credential(CredentialConstraints::SecretSize);
        assert_eq!(violation.table_name(), "credentials");

        let violation =
            ConstraintViolation::Integration(IntegrationConstraints::CredentialTypeMismatch);
        assert_eq!(violation.table_name(), "integrations");
    }

    #[test]
    fn constraint_categorization() {
        let violation = ConstraintViolation::Integration(IntegrationConstraints::ProviderIdUnique);
        assert_eq!(
            violation.constraint_category(),
            ConstraintCategory::Uniqueness
        );

        let violation =
            ConstraintViolation::Integration(IntegrationConstraints::CredentialTypeMismatch);
        assert_eq!(
            violation.constraint_category(),
            ConstraintCategory::BusinessLogic
        );

        let violation = ConstraintViolation::Credential(CredentialConstraints::UpdatedAfterCreated);
        assert_eq!(
            violation.constraint_category(),
            ConstraintCategory::Chronological
        );
    }
}
