use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum length of an integration type identifier.
const MAX_LENGTH: usize = 64;

/// Error returned when a string is not a valid [`IntegrationType`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid integration type '{0}': expected 1-64 lowercase letters, digits, '_' or '-', starting with a letter")]
pub struct ParseIntegrationTypeError(String);

/// Identifier of a provider type, e.g. `github` or `aws_cloud_account`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IntegrationType(String);

impl IntegrationType {
    /// Validates and wraps an identifier.
    pub fn new(value: impl Into<String>) -> Result<Self, ParseIntegrationTypeError> {
        let value = value.into();
        if Self::is_valid(&value) {
            Ok(Self(value))
        } else {
            Err(ParseIntegrationTypeError(value))
        }
    }

    /// Returns the identifier as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_valid(value: &str) -> bool {
        let mut chars = value.chars();
        let Some(first) = chars.next() else {
            return false;
        };

        value.len() <= MAX_LENGTH
            && first.is_ascii_lowercase()
            && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
    }
}

impl fmt::Display for IntegrationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for IntegrationType {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for IntegrationType {
    type Err = ParseIntegrationTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for IntegrationType {
    type Error = ParseIntegrationTypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<IntegrationType> for String {
    fn from(value: IntegrationType) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_identifiers() {
        for value in ["github", "aws_cloud_account", "azure-subscription", "k8s"] {
            assert_eq!(IntegrationType::new(value).unwrap().as_str(), value);
        }
    }

    #[test]
    fn rejects_invalid_identifiers() {
        let too_long = "a".repeat(MAX_LENGTH + 1);
        for value in ["", "GitHub", "1password", "with space", "emoji🦀", too_long.as_str()] {
            assert!(IntegrationType::new(value).is_err(), "{value}");
        }
    }

    #[test]
    fn deserialization_validates() {
        let parsed: IntegrationType = serde_json::from_str("\"cloudflare\"").unwrap();
        assert_eq!(parsed.to_string(), "cloudflare");
        assert!(serde_json::from_str::<IntegrationType>("\"Not Valid\"").is_err());
    }
}
