//! Service error to HTTP error conversion.
//!
//! Client errors keep the service message as context. Server errors are
//! logged with their source chain and answered without internal detail.

use super::http_error::{Error as HttpError, ErrorKind};
use crate::ErrorKind as ServiceErrorKind;

/// Tracing target for service error conversions.
const TRACING_TARGET: &str = "kestrel_server::handler::service";

impl From<crate::Error> for HttpError<'static> {
    fn from(error: crate::Error) -> Self {
        if error.kind().is_client_error() {
            tracing::debug!(
                target: TRACING_TARGET,
                error_kind = %error.kind(),
                error = %error,
                "Request rejected"
            );
        }

        let message = error.message().to_owned();

        match error.kind() {
            ServiceErrorKind::InvalidIntegrationType => {
                ErrorKind::InvalidIntegrationType.with_context(message)
            }
            ServiceErrorKind::CredentialNotFound => ErrorKind::NotFound
                .with_resource("credential")
                .with_context(message),
            ServiceErrorKind::IntegrationNotFound => ErrorKind::NotFound
                .with_resource("integration")
                .with_context(message),
            ServiceErrorKind::CredentialTypeMismatch => ErrorKind::BadRequest
                .with_message("Credential does not belong to the integration type")
                .with_context(message),
            ServiceErrorKind::InvalidStateTransition => ErrorKind::Conflict
                .with_resource("integration")
                .with_context(message),
            ServiceErrorKind::SecretDecryptFailed => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %error,
                    "Credential secret could not be decrypted"
                );
                ErrorKind::SecretDecryptFailed.with_resource("credential")
            }
            ServiceErrorKind::ProviderDiscoveryFailed
            | ServiceErrorKind::ProviderHealthCheckFailed => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    error_kind = %error.kind(),
                    error = %error,
                    "Integration provider failed"
                );
                ErrorKind::BadGateway.with_context(message)
            }
            ServiceErrorKind::Database => match error.as_pg_error() {
                Some(pg_error) => pg_error.into(),
                None => {
                    tracing::error!(
                        target: TRACING_TARGET,
                        error = %error,
                        "Database operation failed"
                    );
                    ErrorKind::InternalServerError.into_error()
                }
            },
            ServiceErrorKind::SecretEncryptFailed
            | ServiceErrorKind::Config
            | ServiceErrorKind::FileSystem
            | ServiceErrorKind::Internal => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error_kind = %error.kind(),
                    error = %error,
                    "Service operation failed"
                );
                ErrorKind::InternalServerError.into_error()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use kestrel_postgres::PgError;
    use uuid::Uuid;

    use super::*;

    fn status(error: crate::Error) -> StatusCode {
        HttpError::from(error).kind().status_code()
    }

    #[test]
    fn client_errors_map_to_4xx() {
        assert_eq!(
            status(crate::Error::invalid_integration_type("nope")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(crate::Error::credential_not_found(Uuid::nil())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(crate::Error::integration_not_found(Uuid::nil())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(crate::Error::credential_type_mismatch("aws", "azure")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(crate::Error::invalid_state_transition("not archived")),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn provider_failures_map_to_bad_gateway() {
        let error = HttpError::from(crate::Error::provider_discovery_failed("timed out"));
        assert_eq!(error.kind(), ErrorKind::BadGateway);
        assert_eq!(error.context(), Some("timed out"));
    }

    #[test]
    fn decrypt_failure_has_its_own_kind() {
        let error = HttpError::from(crate::Error::secret_decrypt_failed());
        assert_eq!(error.kind(), ErrorKind::SecretDecryptFailed);
        assert!(error.context().is_none());
    }

    #[test]
    fn database_errors_hide_details() {
        let error = HttpError::from(crate::Error::from(PgError::Config("postgres://u:p@h".into())));
        assert_eq!(error.kind(), ErrorKind::InternalServerError);
        assert!(error.context().is_none());
        assert!(!error.to_string().contains("postgres://"));
    }
}
