//! Credential and integration constraint violation error handlers.

use kestrel_postgres::types::{
    CredentialConstraints, IntegrationConstraints, IntegrationTypeSetupConstraints,
};

use crate::handler::{Error, ErrorKind};

impl From<CredentialConstraints> for Error<'static> {
    fn from(c: CredentialConstraints) -> Self {
        let error = match c {
            CredentialConstraints::IntegrationTypeLength => ErrorKind::InvalidIntegrationType
                .with_message("Integration type must be between 1 and 64 characters long"),
            CredentialConstraints::SecretSize => {
                ErrorKind::PayloadTooLarge.with_message("Credential configuration is too large")
            }
            CredentialConstraints::MetadataSize => {
                ErrorKind::BadRequest.with_message("Credential metadata is too large")
            }
            CredentialConstraints::IdTypeUnique => ErrorKind::Conflict.into_error(),
            CredentialConstraints::UpdatedAfterCreated
            | CredentialConstraints::DeletedAfterCreated => {
                ErrorKind::InternalServerError.into_error()
            }
        };

        error.with_resource("credential")
    }
}

impl From<IntegrationConstraints> for Error<'static> {
    fn from(c: IntegrationConstraints) -> Self {
        let error = match c {
            IntegrationConstraints::ProviderIdLength => ErrorKind::BadRequest
                .with_message("Provider id must be between 1 and 255 characters long"),
            IntegrationConstraints::NameLength => ErrorKind::BadRequest
                .with_message("Integration name must be between 1 and 255 characters long"),
            IntegrationConstraints::LabelsSize => {
                ErrorKind::BadRequest.with_message("Integration labels are too large")
            }
            IntegrationConstraints::AnnotationsSize => {
                ErrorKind::BadRequest.with_message("Integration annotations are too large")
            }
            IntegrationConstraints::CredentialTypeMismatch => ErrorKind::BadRequest
                .with_message("Credential does not belong to the integration type"),
            IntegrationConstraints::ProviderIdUnique => ErrorKind::Conflict
                .with_message("An integration with this provider id already exists"),
            IntegrationConstraints::UpdatedAfterCreated
            | IntegrationConstraints::DeletedAfterCreated => {
                ErrorKind::InternalServerError.into_error()
            }
        };

        error.with_resource("integration")
    }
}

impl From<IntegrationTypeSetupConstraints> for Error<'static> {
    fn from(c: IntegrationTypeSetupConstraints) -> Self {
        let error = match c {
            IntegrationTypeSetupConstraints::IntegrationTypeLength => {
                ErrorKind::InvalidIntegrationType.into_error()
            }
            IntegrationTypeSetupConstraints::UpdatedAfterCreated => {
                ErrorKind::InternalServerError.into_error()
            }
        };

        error.with_resource("integration_type")
    }
}
