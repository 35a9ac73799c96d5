//! Errors reported by integration providers.

use strum::{AsRefStr, IntoStaticStr};
use thiserror::Error;

/// Type alias for boxed dynamic errors that can be sent across threads.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Result type returned by every [`IntegrationProvider`] call.
///
/// [`IntegrationProvider`]: crate::integration::IntegrationProvider
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Categories of failures a provider can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ProviderErrorKind {
    /// The decrypted configuration does not match the provider's schema.
    InvalidConfig,
    /// The vendor rejected the credentials.
    Authentication,
    /// The credentials are valid but lack access to the target.
    Authorization,
    /// The target no longer exists at the vendor.
    NotFound,
    /// The vendor throttled the request.
    RateLimited,
    /// The vendor could not be reached.
    Network,
    /// The vendor answered with an unexpected status or payload.
    Upstream,
    /// Failure inside the provider itself.
    Internal,
}

/// A structured error reported by a vendor plugin.
///
/// Messages are authored by the plugin and must never quote secret values.
#[derive(Debug, Error)]
#[error("{}: {message}", kind.as_ref())]
pub struct ProviderError {
    kind: ProviderErrorKind,
    message: String,
    #[source]
    source: Option<BoxedError>,
}

impl ProviderError {
    /// Creates a new error with the given kind and message.
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Creates an [`ProviderErrorKind::InvalidConfig`] error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::InvalidConfig, message)
    }

    /// Creates an [`ProviderErrorKind::Authentication`] error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Authentication, message)
    }

    /// Creates a [`ProviderErrorKind::Network`] error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Network, message)
    }

    /// Creates an [`ProviderErrorKind::Upstream`] error.
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Upstream, message)
    }

    /// Attaches a source error.
    pub fn with_source(mut self, source: impl Into<BoxedError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Returns the error kind.
    #[inline]
    pub fn kind(&self) -> ProviderErrorKind {
        self.kind
    }

    /// Returns the plugin-authored message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_and_message() {
        let error = ProviderError::authentication("token rejected");
        assert_eq!(error.to_string(), "authentication: token rejected");
        assert_eq!(error.kind(), ProviderErrorKind::Authentication);
    }

    #[test]
    fn source_is_preserved() {
        use std::error::Error as _;

        let io = std::io::Error::other("connection reset");
        let error = ProviderError::network("request failed").with_source(io);
        assert!(error.source().is_some());
    }
}
