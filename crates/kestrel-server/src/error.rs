//! Service layer error types.
//!
//! Every failure the engines report carries an [`ErrorKind`] that drives both
//! propagation (what aborts an operation) and the HTTP mapping in
//! [`handler`]. Messages are written by this crate and never quote secret
//! values; provider messages are attached only as sources.
//!
//! [`handler`]: crate::handler

use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;

use kestrel_postgres::PgError;

/// Type alias for boxed errors that are Send + Sync.
pub type BoxedError = Box<dyn StdError + Send + Sync>;

/// Result type alias for service layer operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error kind enumeration for categorizing service layer errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The integration type is not registered or is administratively disabled.
    InvalidIntegrationType,
    /// The referenced credential does not exist or was deleted.
    CredentialNotFound,
    /// The referenced integration does not exist or was deleted.
    IntegrationNotFound,
    /// The credential belongs to a different integration type.
    CredentialTypeMismatch,
    /// The requested transition is not allowed from the current state.
    InvalidStateTransition,
    /// The vault could not decrypt a stored secret.
    SecretDecryptFailed,
    /// The vault could not encrypt a configuration.
    SecretEncryptFailed,
    /// The provider's discovery call failed or timed out.
    ProviderDiscoveryFailed,
    /// The provider's health check failed or timed out.
    ProviderHealthCheckFailed,
    /// Persistence failure.
    Database,
    /// Configuration-related errors.
    Config,
    /// File system operation errors.
    FileSystem,
    /// Internal service logic errors.
    Internal,
}

impl ErrorKind {
    /// Returns the error kind as a string for categorization.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidIntegrationType => "invalid_integration_type",
            Self::CredentialNotFound => "credential_not_found",
            Self::IntegrationNotFound => "integration_not_found",
            Self::CredentialTypeMismatch => "credential_type_mismatch",
            Self::InvalidStateTransition => "invalid_state_transition",
            Self::SecretDecryptFailed => "secret_decrypt_failed",
            Self::SecretEncryptFailed => "secret_encrypt_failed",
            Self::ProviderDiscoveryFailed => "provider_discovery_failed",
            Self::ProviderHealthCheckFailed => "provider_health_check_failed",
            Self::Database => "database",
            Self::Config => "config",
            Self::FileSystem => "file_system",
            Self::Internal => "internal_service",
        }
    }

    /// Returns `true` for errors caused by the caller's input.
    #[must_use]
    pub const fn is_client_error(self) -> bool {
        matches!(
            self,
            Self::InvalidIntegrationType
                | Self::CredentialNotFound
                | Self::IntegrationNotFound
                | Self::CredentialTypeMismatch
                | Self::InvalidStateTransition
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Service layer error with structured information.
#[derive(Debug, thiserror::Error)]
#[error("{kind} error: {message}")]
pub struct Error {
    kind: ErrorKind,
    message: Cow<'static, str>,
    #[source]
    source: Option<BoxedError>,
}

impl Error {
    /// Creates a new [`Error`].
    #[inline]
    pub fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Attaches a source error to this error.
    #[inline]
    pub fn with_source(mut self, source: impl Into<BoxedError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Returns the error kind.
    #[must_use]
    #[inline]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error message.
    #[must_use]
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the underlying database error, if this error wraps one.
    pub fn as_pg_error(&self) -> Option<&PgError> {
        self.source.as_deref()?.downcast_ref::<PgError>()
    }

    /// Creates an [`ErrorKind::InvalidIntegrationType`] error.
    pub fn invalid_integration_type(integration_type: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::InvalidIntegrationType,
            format!("integration type '{integration_type}' is not available"),
        )
    }

    /// Creates an [`ErrorKind::CredentialNotFound`] error.
    pub fn credential_not_found(credential_id: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::CredentialNotFound,
            format!("credential {credential_id} not found"),
        )
    }

    /// Creates an [`ErrorKind::IntegrationNotFound`] error.
    pub fn integration_not_found(integration_id: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::IntegrationNotFound,
            format!("integration {integration_id} not found"),
        )
    }

    /// Creates an [`ErrorKind::CredentialTypeMismatch`] error.
    pub fn credential_type_mismatch(expected: impl fmt::Display, actual: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::CredentialTypeMismatch,
            format!("credential has type '{actual}', expected '{expected}'"),
        )
    }

    /// Creates an [`ErrorKind::InvalidStateTransition`] error.
    pub fn invalid_state_transition(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::InvalidStateTransition, message)
    }

    /// Creates an [`ErrorKind::SecretDecryptFailed`] error.
    pub fn secret_decrypt_failed() -> Self {
        Self::new(
            ErrorKind::SecretDecryptFailed,
            "stored credential secret could not be decrypted",
        )
    }

    /// Creates an [`ErrorKind::SecretEncryptFailed`] error.
    pub fn secret_encrypt_failed() -> Self {
        Self::new(
            ErrorKind::SecretEncryptFailed,
            "credential configuration could not be encrypted",
        )
    }

    /// Creates an [`ErrorKind::ProviderDiscoveryFailed`] error.
    pub fn provider_discovery_failed(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::ProviderDiscoveryFailed, message)
    }

    /// Creates an [`ErrorKind::ProviderHealthCheckFailed`] error.
    pub fn provider_health_check_failed(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::ProviderHealthCheckFailed, message)
    }

    /// Creates a new configuration error.
    #[inline]
    pub fn config(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    /// Creates a new file system error.
    #[inline]
    pub fn file_system(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::FileSystem, message)
    }

    /// Creates a new internal service error.
    #[inline]
    pub fn internal(
        service: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        let service_name = service.into();
        let msg = message.into();
        Self::new(ErrorKind::Internal, format!("{}: {}", service_name, msg))
    }
}

impl From<PgError> for Error {
    fn from(error: PgError) -> Self {
        Self::new(ErrorKind::Database, "database operation failed").with_source(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_creation() {
        let error = Error::config("invalid configuration");
        assert_eq!(error.kind(), ErrorKind::Config);
        assert_eq!(error.message(), "invalid configuration");
    }

    #[test]
    fn error_with_source() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error = Error::file_system("cannot read key file").with_source(source);

        assert!(StdError::source(&error).is_some());
        assert!(error.as_pg_error().is_none());
    }

    #[test]
    fn database_error_keeps_pg_source() {
        let error = Error::from(PgError::Config("bad url".into()));

        assert_eq!(error.kind(), ErrorKind::Database);
        assert!(matches!(error.as_pg_error(), Some(PgError::Config(_))));
        assert!(!error.to_string().contains("bad url"));
    }

    #[test]
    fn client_errors() {
        assert!(ErrorKind::InvalidIntegrationType.is_client_error());
        assert!(ErrorKind::InvalidStateTransition.is_client_error());
        assert!(!ErrorKind::SecretDecryptFailed.is_client_error());
        assert!(!ErrorKind::Database.is_client_error());
    }

    #[test]
    fn display_includes_kind() {
        let error = Error::invalid_integration_type("nope");
        assert_eq!(
            error.to_string(),
            "invalid_integration_type error: integration type 'nope' is not available"
        );
    }
}
