//! Integration type setups repository.

use std::future::Future;

use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;

use crate::model::{IntegrationTypeSetup, NewIntegrationTypeSetup};
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for integration type setup operations.
pub trait IntegrationTypeSetupRepository {
    /// Finds the setup row for a type.
    fn find_integration_type_setup(
        &mut self,
        integration_type: &str,
    ) -> impl Future<Output = PgResult<Option<IntegrationTypeSetup>>> + Send;

    /// Lists every setup row ordered by type.
    fn list_integration_type_setups(
        &mut self,
    ) -> impl Future<Output = PgResult<Vec<IntegrationTypeSetup>>> + Send;

    /// Inserts the setup row or replaces its `enabled` flag.
    fn upsert_integration_type_setup(
        &mut self,
        setup: NewIntegrationTypeSetup,
    ) -> impl Future<Output = PgResult<IntegrationTypeSetup>> + Send;
}

impl IntegrationTypeSetupRepository for PgConnection {
    async fn find_integration_type_setup(
        &mut self,
        integration_type: &str,
    ) -> PgResult<Option<IntegrationTypeSetup>> {
        use schema::integration_type_setups::{self, dsl};

        let setup = integration_type_setups::table
            .filter(dsl::integration_type.eq(integration_type))
            .select(IntegrationTypeSetup::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(setup)
    }

    async fn list_integration_type_setups(&mut self) -> PgResult<Vec<IntegrationTypeSetup>> {
        use schema::integration_type_setups::{self, dsl};

        let setups = integration_type_setups::table
            .order(dsl::integration_type.asc())
            .select(IntegrationTypeSetup::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(setups)
    }

    async fn upsert_integration_type_setup(
        &mut self,
        setup: NewIntegrationTypeSetup,
    ) -> PgResult<IntegrationTypeSetup> {
        use schema::integration_type_setups::{self, dsl};

        let setup = diesel::insert_into(integration_type_setups::table)
            .values(&setup)
            .on_conflict(dsl::integration_type)
            .do_update()
            .set(dsl::enabled.eq(excluded(dsl::enabled)))
            .returning(IntegrationTypeSetup::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(setup)
    }
}
