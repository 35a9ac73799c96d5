//! Persistence seam used by the engines.
//!
//! The engines talk to storage only through these traits. [`PgStore`] is the
//! production implementation; `MemoryStore` mirrors its semantics (live-row
//! natural key, credential type check, cascade-archive on delete) for tests.

mod postgres;
#[cfg(any(test, feature = "test-utils"))]
mod memory;

use std::sync::Arc;

use kestrel_postgres::model::{
    Credential, Integration, IntegrationTypeSetup, NewCredential, NewIntegration,
    NewIntegrationTypeSetup, UpdateCredential, UpdateIntegration,
};
use kestrel_postgres::types::{
    CredentialFilter, IntegrationFilter, IntegrationState, OffsetPagination,
};
use uuid::Uuid;

#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::Result;

/// Credential persistence.
#[async_trait::async_trait]
pub trait CredentialStore: Send + Sync {
    /// Persists a new credential.
    async fn create_credential(&self, new_credential: NewCredential) -> Result<Credential>;

    /// Returns a live credential.
    async fn find_credential(&self, credential_id: Uuid) -> Result<Option<Credential>>;

    /// Lists live credentials, newest first.
    async fn list_credentials(
        &self,
        filter: CredentialFilter,
        pagination: OffsetPagination,
    ) -> Result<Vec<Credential>>;

    /// Updates a live credential.
    async fn update_credential(
        &self,
        credential_id: Uuid,
        updates: UpdateCredential,
    ) -> Result<Option<Credential>>;

    /// Soft deletes a credential and archives every live integration it owns
    /// as one atomic unit.
    ///
    /// Returns the number of integrations that changed state, or `None` if
    /// the credential was not live.
    async fn delete_credential(&self, credential_id: Uuid) -> Result<Option<usize>>;
}

/// Integration persistence.
#[async_trait::async_trait]
pub trait IntegrationStore: Send + Sync {
    /// Inserts an integration unless its natural key is already taken by a
    /// live row, in which case `None` is returned and nothing changes.
    async fn create_integration_if_absent(
        &self,
        new_integration: NewIntegration,
    ) -> Result<Option<Integration>>;

    /// Returns a live integration.
    async fn find_integration(&self, integration_id: Uuid) -> Result<Option<Integration>>;

    /// Returns the live integration with the given natural key.
    async fn find_integration_by_provider_id(
        &self,
        integration_type: &str,
        provider_id: &str,
    ) -> Result<Option<Integration>>;

    /// Lists live integrations, newest first.
    async fn list_integrations(
        &self,
        filter: IntegrationFilter,
        pagination: OffsetPagination,
    ) -> Result<Vec<Integration>>;

    /// Lists every live integration owned by a credential.
    async fn list_credential_integrations(&self, credential_id: Uuid)
    -> Result<Vec<Integration>>;

    /// Lists schedulable integrations not checked since `checked_before`.
    async fn list_integrations_due_for_check(
        &self,
        checked_before: jiff::Timestamp,
        limit: i64,
    ) -> Result<Vec<Integration>>;

    /// Updates a live integration.
    async fn update_integration(
        &self,
        integration_id: Uuid,
        updates: UpdateIntegration,
    ) -> Result<Option<Integration>>;

    /// Updates a live integration only while its state is still `expected`.
    ///
    /// Returns `None` both when the row is gone and when another writer
    /// changed its state first; callers re-read to tell the two apart.
    async fn update_integration_in_state(
        &self,
        integration_id: Uuid,
        expected: IntegrationState,
        updates: UpdateIntegration,
    ) -> Result<Option<Integration>>;

    /// Soft deletes an integration.
    async fn delete_integration(&self, integration_id: Uuid) -> Result<bool>;

    /// Hard deletes every sample integration.
    async fn purge_sample_integrations(&self) -> Result<usize>;
}

/// Integration type setup persistence.
#[async_trait::async_trait]
pub trait IntegrationTypeSetupStore: Send + Sync {
    /// Returns the setup row of a type, if one was ever written.
    async fn find_integration_type_setup(
        &self,
        integration_type: &str,
    ) -> Result<Option<IntegrationTypeSetup>>;

    /// Lists every setup row.
    async fn list_integration_type_setups(&self) -> Result<Vec<IntegrationTypeSetup>>;

    /// Inserts or replaces the setup row of a type.
    async fn upsert_integration_type_setup(
        &self,
        setup: NewIntegrationTypeSetup,
    ) -> Result<IntegrationTypeSetup>;
}

/// Every persistence capability the service needs.
pub trait Store: CredentialStore + IntegrationStore + IntegrationTypeSetupStore {}

impl<T> Store for T where T: CredentialStore + IntegrationStore + IntegrationTypeSetupStore {}

/// Shared, type-erased store handle.
pub type SharedStore = Arc<dyn Store>;
