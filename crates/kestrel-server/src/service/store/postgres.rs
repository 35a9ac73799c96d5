use kestrel_postgres::model::{
    Credential, Integration, IntegrationTypeSetup, NewCredential, NewIntegration,
    NewIntegrationTypeSetup, UpdateCredential, UpdateIntegration,
};
use kestrel_postgres::query::{
    CredentialRepository, IntegrationRepository, IntegrationTypeSetupRepository,
};
use kestrel_postgres::types::{
    CredentialFilter, IntegrationFilter, IntegrationState, OffsetPagination,
};
use kestrel_postgres::{PgClient, PgConn, PgError};
use uuid::Uuid;

use super::{CredentialStore, IntegrationStore, IntegrationTypeSetupStore};
use crate::Result;

/// [`Store`] backed by the PostgreSQL connection pool.
///
/// Every call checks out one pooled connection for its duration.
///
/// [`Store`]: super::Store
#[derive(Debug, Clone)]
pub struct PgStore {
    client: PgClient,
}

impl PgStore {
    /// Wraps a connected client.
    pub fn new(client: PgClient) -> Self {
        Self { client }
    }

    /// Returns the underlying client.
    pub fn client(&self) -> &PgClient {
        &self.client
    }

    async fn conn(&self) -> Result<PgConn> {
        Ok(self.client.get_connection().await?)
    }
}

#[async_trait::async_trait]
impl CredentialStore for PgStore {
    async fn create_credential(&self, new_credential: NewCredential) -> Result<Credential> {
        let mut conn = self.conn().await?;
        Ok(conn.create_credential(new_credential).await?)
    }

    async fn find_credential(&self, credential_id: Uuid) -> Result<Option<Credential>> {
        let mut conn = self.conn().await?;
        Ok(conn.find_credential_by_id(credential_id).await?)
    }

    async fn list_credentials(
        &self,
        filter: CredentialFilter,
        pagination: OffsetPagination,
    ) -> Result<Vec<Credential>> {
        let mut conn = self.conn().await?;
        Ok(conn.offset_list_credentials(filter, pagination).await?)
    }

    async fn update_credential(
        &self,
        credential_id: Uuid,
        updates: UpdateCredential,
    ) -> Result<Option<Credential>> {
        let mut conn = self.conn().await?;
        Ok(conn.update_credential(credential_id, updates).await?)
    }

    async fn delete_credential(&self, credential_id: Uuid) -> Result<Option<usize>> {
        let mut conn = self.conn().await?;

        let archived = conn
            .transaction(|conn| {
                Box::pin(async move {
                    if !conn.delete_credential(credential_id).await? {
                        return Ok(None);
                    }

                    let archived = conn.archive_credential_integrations(credential_id).await?;
                    Ok::<_, PgError>(Some(archived))
                })
            })
            .await?;

        Ok(archived)
    }
}

#[async_trait::async_trait]
impl IntegrationStore for PgStore {
    async fn create_integration_if_absent(
        &self,
        new_integration: NewIntegration,
    ) -> Result<Option<Integration>> {
        let mut conn = self.conn().await?;
        Ok(conn.create_integration_if_absent(new_integration).await?)
    }

    async fn find_integration(&self, integration_id: Uuid) -> Result<Option<Integration>> {
        let mut conn = self.conn().await?;
        Ok(conn.find_integration_by_id(integration_id).await?)
    }

    async fn find_integration_by_provider_id(
        &self,
        integration_type: &str,
        provider_id: &str,
    ) -> Result<Option<Integration>> {
        let mut conn = self.conn().await?;
        Ok(conn
            .find_integration_by_provider_id(integration_type, provider_id)
            .await?)
    }

    async fn list_integrations(
        &self,
        filter: IntegrationFilter,
        pagination: OffsetPagination,
    ) -> Result<Vec<Integration>> {
        let mut conn = self.conn().await?;
        Ok(conn.offset_list_integrations(filter, pagination).await?)
    }

    async fn list_credential_integrations(
        &self,
        credential_id: Uuid,
    ) -> Result<Vec<Integration>> {
        let mut conn = self.conn().await?;
        Ok(conn.list_credential_integrations(credential_id).await?)
    }

    async fn list_integrations_due_for_check(
        &self,
        checked_before: jiff::Timestamp,
        limit: i64,
    ) -> Result<Vec<Integration>> {
        let mut conn = self.conn().await?;
        Ok(conn
            .list_integrations_due_for_check(checked_before, limit)
            .await?)
    }

    async fn update_integration(
        &self,
        integration_id: Uuid,
        updates: UpdateIntegration,
    ) -> Result<Option<Integration>> {
        let mut conn = self.conn().await?;
        Ok(conn.update_integration(integration_id, updates).await?)
    }

    async fn update_integration_in_state(
        &self,
        integration_id: Uuid,
        expected: IntegrationState,
        updates: UpdateIntegration,
    ) -> Result<Option<Integration>> {
        let mut conn = self.conn().await?;
        Ok(conn
            .update_integration_in_state(integration_id, expected, updates)
            .await?)
    }

    async fn delete_integration(&self, integration_id: Uuid) -> Result<bool> {
        let mut conn = self.conn().await?;
        Ok(conn.delete_integration(integration_id).await?)
    }

    async fn purge_sample_integrations(&self) -> Result<usize> {
        let mut conn = self.conn().await?;
        Ok(conn.purge_sample_integrations().await?)
    }
}

#[async_trait::async_trait]
impl IntegrationTypeSetupStore for PgStore {
    async fn find_integration_type_setup(
        &self,
        integration_type: &str,
    ) -> Result<Option<IntegrationTypeSetup>> {
        let mut conn = self.conn().await?;
        Ok(conn.find_integration_type_setup(integration_type).await?)
    }

    async fn list_integration_type_setups(&self) -> Result<Vec<IntegrationTypeSetup>> {
        let mut conn = self.conn().await?;
        Ok(conn.list_integration_type_setups().await?)
    }

    async fn upsert_integration_type_setup(
        &self,
        setup: NewIntegrationTypeSetup,
    ) -> Result<IntegrationTypeSetup> {
        let mut conn = self.conn().await?;
        Ok(conn.upsert_integration_type_setup(setup).await?)
    }
}
