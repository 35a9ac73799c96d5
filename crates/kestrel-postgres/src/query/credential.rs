//! Credentials repository.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::model::{Credential, NewCredential, UpdateCredential};
use crate::types::{CredentialFilter, OffsetPagination};
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for credential database operations.
pub trait CredentialRepository {
    /// Creates a new credential record.
    fn create_credential(
        &mut self,
        new_credential: NewCredential,
    ) -> impl Future<Output = PgResult<Credential>> + Send;

    /// Finds a live credential by its unique identifier.
    fn find_credential_by_id(
        &mut self,
        credential_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<Credential>>> + Send;

    /// Lists live credentials, newest first.
    fn offset_list_credentials(
        &mut self,
        filter: CredentialFilter,
        pagination: OffsetPagination,
    ) -> impl Future<Output = PgResult<Vec<Credential>>> + Send;

    /// Updates a live credential, returning `None` if it does not exist.
    fn update_credential(
        &mut self,
        credential_id: Uuid,
        updates: UpdateCredential,
    ) -> impl Future<Output = PgResult<Option<Credential>>> + Send;

    /// Soft deletes a credential, returning `false` if it was not live.
    fn delete_credential(
        &mut self,
        credential_id: Uuid,
    ) -> impl Future<Output = PgResult<bool>> + Send;
}

impl CredentialRepository for PgConnection {
    async fn create_credential(&mut self, new_credential: NewCredential) -> PgResult<Credential> {
        use schema::credentials;

        let credential = diesel::insert_into(credentials::table)
            .values(&new_credential)
            .returning(Credential::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(credential)
    }

    async fn find_credential_by_id(&mut self, credential_id: Uuid) -> PgResult<Option<Credential>> {
        use schema::credentials::{self, dsl};

        let credential = credentials::table
            .filter(dsl::id.eq(credential_id))
            .filter(dsl::deleted_at.is_null())
            .select(Credential::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(credential)
    }

    async fn offset_list_credentials(
        &mut self,
        filter: CredentialFilter,
        pagination: OffsetPagination,
    ) -> PgResult<Vec<Credential>> {
        use schema::credentials::{self, dsl};

        let mut query = credentials::table
            .filter(dsl::deleted_at.is_null())
            .into_boxed();

        if let Some(integration_type) = filter.integration_type {
            query = query.filter(dsl::integration_type.eq(integration_type));
        }

        let credentials = query
            .order(dsl::created_at.desc())
            .limit(pagination.limit)
            .offset(pagination.offset)
            .select(Credential::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(credentials)
    }

    async fn update_credential(
        &mut self,
        credential_id: Uuid,
        updates: UpdateCredential,
    ) -> PgResult<Option<Credential>> {
        use schema::credentials::{self, dsl};

        let credential = diesel::update(credentials::table)
            .filter(dsl::id.eq(credential_id))
            .filter(dsl::deleted_at.is_null())
            .set(&updates)
            .returning(Credential::as_returning())
            .get_result(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(credential)
    }

    async fn delete_credential(&mut self, credential_id: Uuid) -> PgResult<bool> {
        use diesel::dsl::now;
        use schema::credentials::{self, dsl};

        let affected = diesel::update(credentials::table)
            .filter(dsl::id.eq(credential_id))
            .filter(dsl::deleted_at.is_null())
            .set(dsl::deleted_at.eq(now))
            .execute(self)
            .await
            .map_err(PgError::from)?;

        Ok(affected > 0)
    }
}
