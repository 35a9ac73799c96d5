use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{ProviderError, ProviderResult};

/// Decrypted provider configuration: an arbitrary JSON object.
///
/// The framework treats the content as opaque. Each provider owns its own
/// schema and validates it with [`SecretConfig::parse`]. `Debug` prints only
/// the keys.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretConfig(Map<String, Value>);

impl SecretConfig {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, returning the previous one for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Builder-style [`SecretConfig::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns the configuration keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the configuration has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Deserializes the configuration into a provider-owned schema.
    ///
    /// The error names missing or unknown fields but never echoes a value.
    pub fn parse<T: DeserializeOwned>(&self) -> ProviderResult<T> {
        T::deserialize(Value::Object(self.0.clone())).map_err(|error| {
            let message = error.to_string();
            if message.starts_with("missing field") || message.starts_with("unknown field") {
                ProviderError::invalid_config(message)
            } else {
                ProviderError::invalid_config(
                    "configuration does not match the provider schema",
                )
            }
        })
    }
}

impl From<Map<String, Value>> for SecretConfig {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for SecretConfig {
    type Error = Value;

    /// Accepts only JSON objects, handing back any other value unchanged.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(other),
        }
    }
}

impl fmt::Debug for SecretConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretConfig")
            .field("keys", &self.0.keys().collect::<Vec<_>>())
            .field("values", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;
    use crate::ProviderErrorKind;

    #[derive(Debug, Deserialize)]
    #[serde(deny_unknown_fields)]
    struct TokenConfig {
        token: String,
        #[serde(default)]
        retries: u32,
    }

    #[test]
    fn parse_into_provider_schema() {
        let config = SecretConfig::new().with("token", "ghp_abc").with("retries", 3);
        let parsed: TokenConfig = config.parse().unwrap();
        assert_eq!(parsed.token, "ghp_abc");
        assert_eq!(parsed.retries, 3);
    }

    #[test]
    fn parse_reports_missing_field() {
        let error = SecretConfig::new().parse::<TokenConfig>().unwrap_err();
        assert_eq!(error.kind(), ProviderErrorKind::InvalidConfig);
        assert!(error.message().contains("token"));
    }

    #[test]
    fn parse_never_echoes_values() {
        let config = SecretConfig::new().with("token", "ghp_abc").with("retries", "hunter2");
        let error = config.parse::<TokenConfig>().unwrap_err();
        assert!(!error.to_string().contains("hunter2"));
    }

    #[test]
    fn debug_hides_values() {
        let config = SecretConfig::new().with("token", "ghp_abc");
        let debug = format!("{config:?}");
        assert!(debug.contains("token"));
        assert!(!debug.contains("ghp_abc"));
    }

    #[test]
    fn only_objects_convert() {
        assert!(SecretConfig::try_from(serde_json::json!({"a": 1})).is_ok());
        assert!(SecretConfig::try_from(serde_json::json!("plain")).is_err());
    }
}
