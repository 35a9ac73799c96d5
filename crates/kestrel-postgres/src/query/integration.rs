//! Integrations repository.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use strum::IntoEnumIterator;
use uuid::Uuid;

use crate::model::{Integration, NewIntegration, UpdateIntegration};
use crate::types::{IntegrationFilter, IntegrationState, OffsetPagination};
use crate::{PgConnection, PgError, PgResult, TRACING_TARGET_QUERY, schema};

/// Repository for integration database operations.
pub trait IntegrationRepository {
    /// Inserts an integration unless a live row with the same
    /// `(integration_type, provider_id)` already exists.
    ///
    /// Returns `None` when the insert was skipped due to the conflict.
    fn create_integration_if_absent(
        &mut self,
        new_integration: NewIntegration,
    ) -> impl Future<Output = PgResult<Option<Integration>>> + Send;

    /// Finds a live integration by its unique identifier.
    fn find_integration_by_id(
        &mut self,
        integration_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<Integration>>> + Send;

    /// Finds a live integration by its natural key.
    fn find_integration_by_provider_id(
        &mut self,
        integration_type: &str,
        provider_id: &str,
    ) -> impl Future<Output = PgResult<Option<Integration>>> + Send;

    /// Lists live integrations matching the filter, newest first.
    fn offset_list_integrations(
        &mut self,
        filter: IntegrationFilter,
        pagination: OffsetPagination,
    ) -> impl Future<Output = PgResult<Vec<Integration>>> + Send;

    /// Lists every live integration owned by a credential.
    fn list_credential_integrations(
        &mut self,
        credential_id: Uuid,
    ) -> impl Future<Output = PgResult<Vec<Integration>>> + Send;

    /// Lists schedulable integrations never checked or last checked before
    /// `checked_before`, oldest check first.
    fn list_integrations_due_for_check(
        &mut self,
        checked_before: jiff::Timestamp,
        limit: i64,
    ) -> impl Future<Output = PgResult<Vec<Integration>>> + Send;

    /// Updates a live integration, returning `None` if it does not exist.
    fn update_integration(
        &mut self,
        integration_id: Uuid,
        updates: UpdateIntegration,
    ) -> impl Future<Output = PgResult<Option<Integration>>> + Send;

    /// Updates a live integration only while it is still in `expected`.
    ///
    /// Returns `None` if the row is gone or its state has moved on.
    fn update_integration_in_state(
        &mut self,
        integration_id: Uuid,
        expected: IntegrationState,
        updates: UpdateIntegration,
    ) -> impl Future<Output = PgResult<Option<Integration>>> + Send;

    /// Soft deletes an integration, returning `false` if it was not live.
    fn delete_integration(
        &mut self,
        integration_id: Uuid,
    ) -> impl Future<Output = PgResult<bool>> + Send;

    /// Applies [`IntegrationState::orphaned`] to every live integration of a
    /// credential and returns how many rows changed state.
    fn archive_credential_integrations(
        &mut self,
        credential_id: Uuid,
    ) -> impl Future<Output = PgResult<usize>> + Send;

    /// Hard deletes every sample integration and returns how many were removed.
    fn purge_sample_integrations(&mut self) -> impl Future<Output = PgResult<usize>> + Send;
}

impl IntegrationRepository for PgConnection {
    async fn create_integration_if_absent(
        &mut self,
        new_integration: NewIntegration,
    ) -> PgResult<Option<Integration>> {
        use schema::integrations;

        let integration = diesel::insert_into(integrations::table)
            .values(&new_integration)
            .on_conflict_do_nothing()
            .returning(Integration::as_returning())
            .get_result(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        if integration.is_none() {
            tracing::debug!(
                target: TRACING_TARGET_QUERY,
                integration_type = %new_integration.integration_type,
                provider_id = %new_integration.provider_id,
                "Integration already exists, insert skipped"
            );
        }

        Ok(integration)
    }

    async fn find_integration_by_id(
        &mut self,
        integration_id: Uuid,
    ) -> PgResult<Option<Integration>> {
        use schema::integrations::{self, dsl};

        let integration = integrations::table
            .filter(dsl::id.eq(integration_id))
            .filter(dsl::deleted_at.is_null())
            .select(Integration::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(integration)
    }

    async fn find_integration_by_provider_id(
        &mut self,
        integration_type: &str,
        provider_id: &str,
    ) -> PgResult<Option<Integration>> {
        use schema::integrations::{self, dsl};

        let integration = integrations::table
            .filter(dsl::integration_type.eq(integration_type))
            .filter(dsl::provider_id.eq(provider_id))
            .filter(dsl::deleted_at.is_null())
            .select(Integration::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(integration)
    }

    async fn offset_list_integrations(
        &mut self,
        filter: IntegrationFilter,
        pagination: OffsetPagination,
    ) -> PgResult<Vec<Integration>> {
        use schema::integrations::{self, dsl};

        let mut query = integrations::table
            .filter(dsl::deleted_at.is_null())
            .into_boxed();

        if let Some(credential_id) = filter.credential_id {
            query = query.filter(dsl::credential_id.eq(credential_id));
        }
        if let Some(integration_type) = filter.integration_type {
            query = query.filter(dsl::integration_type.eq(integration_type));
        }
        if let Some(state) = filter.state {
            query = query.filter(dsl::state.eq(state));
        }

        let integrations = query
            .order((dsl::created_at.desc(), dsl::id.asc()))
            .limit(pagination.limit)
            .offset(pagination.offset)
            .select(Integration::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(integrations)
    }

    async fn list_credential_integrations(
        &mut self,
        credential_id: Uuid,
    ) -> PgResult<Vec<Integration>> {
        use schema::integrations::{self, dsl};

        let integrations = integrations::table
            .filter(dsl::credential_id.eq(credential_id))
            .filter(dsl::deleted_at.is_null())
            .order(dsl::provider_id.asc())
            .select(Integration::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(integrations)
    }

    async fn list_integrations_due_for_check(
        &mut self,
        checked_before: jiff::Timestamp,
        limit: i64,
    ) -> PgResult<Vec<Integration>> {
        use schema::integrations::{self, dsl};

        let cutoff = jiff_diesel::Timestamp::from(checked_before);

        let mut query = integrations::table
            .filter(dsl::deleted_at.is_null())
            .filter(dsl::last_check.is_null().or(dsl::last_check.lt(cutoff)))
            .into_boxed();

        for state in IntegrationState::iter().filter(|s| !s.is_schedulable()) {
            query = query.filter(dsl::state.ne(state));
        }

        let integrations = query
            .order(dsl::last_check.asc().nulls_first())
            .limit(limit)
            .select(Integration::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(integrations)
    }

    async fn update_integration(
        &mut self,
        integration_id: Uuid,
        updates: UpdateIntegration,
    ) -> PgResult<Option<Integration>> {
        use schema::integrations::{self, dsl};

        let integration = diesel::update(integrations::table)
            .filter(dsl::id.eq(integration_id))
            .filter(dsl::deleted_at.is_null())
            .set(&updates)
            .returning(Integration::as_returning())
            .get_result(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(integration)
    }

    async fn update_integration_in_state(
        &mut self,
        integration_id: Uuid,
        expected: IntegrationState,
        updates: UpdateIntegration,
    ) -> PgResult<Option<Integration>> {
        use schema::integrations::{self, dsl};

        let integration = diesel::update(integrations::table)
            .filter(dsl::id.eq(integration_id))
            .filter(dsl::deleted_at.is_null())
            .filter(dsl::state.eq(expected))
            .set(&updates)
            .returning(Integration::as_returning())
            .get_result(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(integration)
    }

    async fn delete_integration(&mut self, integration_id: Uuid) -> PgResult<bool> {
        use diesel::dsl::now;
        use schema::integrations::{self, dsl};

        let affected = diesel::update(integrations::table)
            .filter(dsl::id.eq(integration_id))
            .filter(dsl::deleted_at.is_null())
            .set(dsl::deleted_at.eq(now))
            .execute(self)
            .await
            .map_err(PgError::from)?;

        Ok(affected > 0)
    }

    async fn archive_credential_integrations(&mut self, credential_id: Uuid) -> PgResult<usize> {
        use schema::integrations::{self, dsl};

        let mut archived = 0;
        for from in IntegrationState::iter() {
            let to = from.orphaned();
            if to == from {
                continue;
            }

            archived += diesel::update(integrations::table)
                .filter(dsl::credential_id.eq(credential_id))
                .filter(dsl::deleted_at.is_null())
                .filter(dsl::state.eq(from))
                .set(dsl::state.eq(to))
                .execute(self)
                .await
                .map_err(PgError::from)?;
        }

        Ok(archived)
    }

    async fn purge_sample_integrations(&mut self) -> PgResult<usize> {
        use schema::integrations::{self, dsl};

        let purged = diesel::delete(integrations::table)
            .filter(dsl::state.eq(IntegrationState::SampleIntegration))
            .execute(self)
            .await
            .map_err(PgError::from)?;

        Ok(purged)
    }
}
