use std::collections::BTreeMap;
use std::sync::Arc;

use kestrel_postgres::model::{
    Credential, INTEGRATION_DOCUMENT_LEN, Integration, IntegrationTypeSetup, NewCredential,
    NewIntegration, NewIntegrationTypeSetup, UpdateCredential, UpdateIntegration,
};
use kestrel_postgres::types::{
    CredentialFilter, HasCreatedAt, HasLastCheck, IntegrationConstraints, IntegrationFilter,
    IntegrationState, OffsetPagination, jsonb_text_len,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CredentialStore, IntegrationStore, IntegrationTypeSetupStore};
use crate::{Error, ErrorKind, Result};

#[derive(Debug, Default)]
struct Tables {
    credentials: Vec<Credential>,
    integrations: Vec<Integration>,
    setups: BTreeMap<String, IntegrationTypeSetup>,
}

/// In-memory [`Store`] with the same observable semantics as [`PgStore`].
///
/// [`Store`]: super::Store
/// [`PgStore`]: super::PgStore
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every integration row, including soft-deleted ones.
    pub async fn all_integrations(&self) -> Vec<Integration> {
        self.tables.read().await.integrations.clone()
    }

    /// Returns every credential row, including soft-deleted ones.
    pub async fn all_credentials(&self) -> Vec<Credential> {
        self.tables.read().await.credentials.clone()
    }

    /// Overwrites the stored secret of a credential, ignoring liveness.
    pub async fn corrupt_secret(&self, credential_id: Uuid, secret: Vec<u8>) {
        let mut tables = self.tables.write().await;
        if let Some(credential) = tables.credentials.iter_mut().find(|c| c.id == credential_id) {
            credential.secret = secret;
        }
    }
}

fn now() -> jiff::Timestamp {
    jiff::Timestamp::now()
}

fn paginate<T>(rows: Vec<T>, pagination: OffsetPagination) -> Vec<T> {
    let offset = usize::try_from(pagination.offset).unwrap_or(0);
    let limit = usize::try_from(pagination.limit).unwrap_or(0);
    rows.into_iter().skip(offset).take(limit).collect()
}

/// Mirrors how a violated check constraint surfaces from [`PgStore`].
///
/// [`PgStore`]: super::PgStore
fn check_violation(constraint: IntegrationConstraints) -> Error {
    Error::new(ErrorKind::Database, "database operation failed")
        .with_source(format!("new row violates check constraint \"{constraint}\""))
}

fn apply_credential_update(credential: &mut Credential, updates: UpdateCredential) {
    if let Some(secret) = updates.secret {
        credential.secret = secret;
    }
    if let Some(metadata) = updates.metadata {
        credential.metadata = metadata;
    }
    if let Some(deleted_at) = updates.deleted_at {
        credential.deleted_at = deleted_at;
    }
    credential.updated_at = now().into();
}

fn apply_integration_update(integration: &mut Integration, updates: UpdateIntegration) {
    if let Some(state) = updates.state {
        integration.state = state;
    }
    if let Some(labels) = updates.labels {
        integration.labels = labels;
    }
    if let Some(annotations) = updates.annotations {
        integration.annotations = annotations;
    }
    if let Some(credential_id) = updates.credential_id {
        integration.credential_id = credential_id;
    }
    if let Some(last_check) = updates.last_check {
        integration.last_check = last_check;
    }
    if let Some(deleted_at) = updates.deleted_at {
        integration.deleted_at = deleted_at;
    }
    integration.updated_at = now().into();
}

impl Tables {
    fn live_credential(&self, credential_id: Uuid) -> Option<&Credential> {
        self.credentials
            .iter()
            .find(|c| c.id == credential_id && c.deleted_at.is_none())
    }

    fn live_integration_mut(&mut self, integration_id: Uuid) -> Option<&mut Integration> {
        self.integrations
            .iter_mut()
            .find(|i| i.id == integration_id && i.deleted_at.is_none())
    }

    /// Applies `updates` to a live row, optionally only while it is in
    /// `expected`.
    fn update_integration(
        &mut self,
        integration_id: Uuid,
        expected: Option<IntegrationState>,
        updates: UpdateIntegration,
    ) -> Result<Option<Integration>> {
        let oversized = [
            (updates.labels.as_ref(), IntegrationConstraints::LabelsSize),
            (updates.annotations.as_ref(), IntegrationConstraints::AnnotationsSize),
        ]
        .into_iter()
        .find(|(document, _)| {
            document.is_some_and(|d| !INTEGRATION_DOCUMENT_LEN.contains(&jsonb_text_len(d)))
        });
        if let Some((_, constraint)) = oversized {
            return Err(check_violation(constraint));
        }

        if let Some(credential_id) = updates.credential_id {
            let Some(integration_type) = self
                .integrations
                .iter()
                .find(|i| i.id == integration_id)
                .map(|i| i.integration_type.clone())
            else {
                return Ok(None);
            };
            self.check_credential_reference(credential_id, &integration_type)?;
        }

        let Some(integration) = self.live_integration_mut(integration_id) else {
            return Ok(None);
        };
        if expected.is_some_and(|state| state != integration.state) {
            return Ok(None);
        }

        apply_integration_update(integration, updates);
        Ok(Some(integration.clone()))
    }

    /// Mirrors the composite `(credential_id, integration_type)` foreign key.
    fn check_credential_reference(&self, credential_id: Uuid, integration_type: &str) -> Result<()> {
        match self.credentials.iter().find(|c| c.id == credential_id) {
            None => Err(Error::credential_not_found(credential_id)),
            Some(c) if c.integration_type != integration_type => Err(
                Error::credential_type_mismatch(integration_type, &c.integration_type),
            ),
            Some(_) => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl CredentialStore for MemoryStore {
    async fn create_credential(&self, new_credential: NewCredential) -> Result<Credential> {
        let timestamp = now();
        let credential = Credential {
            id: Uuid::now_v7(),
            integration_type: new_credential.integration_type,
            secret: new_credential.secret,
            metadata: new_credential.metadata,
            created_at: timestamp.into(),
            updated_at: timestamp.into(),
            deleted_at: None,
        };

        self.tables.write().await.credentials.push(credential.clone());
        Ok(credential)
    }

    async fn find_credential(&self, credential_id: Uuid) -> Result<Option<Credential>> {
        Ok(self.tables.read().await.live_credential(credential_id).cloned())
    }

    async fn list_credentials(
        &self,
        filter: CredentialFilter,
        pagination: OffsetPagination,
    ) -> Result<Vec<Credential>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<_> = tables
            .credentials
            .iter()
            .filter(|c| c.deleted_at.is_none())
            .filter(|c| {
                filter
                    .integration_type
                    .as_deref()
                    .is_none_or(|t| c.integration_type == t)
            })
            .cloned()
            .collect();

        rows.sort_by(|a, b| b.created_at().cmp(&a.created_at()).then(b.id.cmp(&a.id)));
        Ok(paginate(rows, pagination))
    }

    async fn update_credential(
        &self,
        credential_id: Uuid,
        updates: UpdateCredential,
    ) -> Result<Option<Credential>> {
        let mut tables = self.tables.write().await;
        let Some(credential) = tables
            .credentials
            .iter_mut()
            .find(|c| c.id == credential_id && c.deleted_at.is_none())
        else {
            return Ok(None);
        };

        apply_credential_update(credential, updates);
        Ok(Some(credential.clone()))
    }

    async fn delete_credential(&self, credential_id: Uuid) -> Result<Option<usize>> {
        let mut tables = self.tables.write().await;
        let timestamp = now();

        let Some(credential) = tables
            .credentials
            .iter_mut()
            .find(|c| c.id == credential_id && c.deleted_at.is_none())
        else {
            return Ok(None);
        };
        credential.deleted_at = Some(timestamp.into());

        let mut archived = 0;
        for integration in tables
            .integrations
            .iter_mut()
            .filter(|i| i.credential_id == credential_id && i.deleted_at.is_none())
        {
            let orphaned = integration.state.orphaned();
            if orphaned != integration.state {
                integration.state = orphaned;
                integration.updated_at = timestamp.into();
                archived += 1;
            }
        }

        Ok(Some(archived))
    }
}

#[async_trait::async_trait]
impl IntegrationStore for MemoryStore {
    async fn create_integration_if_absent(
        &self,
        new_integration: NewIntegration,
    ) -> Result<Option<Integration>> {
        let mut tables = self.tables.write().await;
        tables.check_credential_reference(
            new_integration.credential_id,
            &new_integration.integration_type,
        )?;
        if let Some(constraint) = new_integration.violated_constraint() {
            return Err(check_violation(constraint));
        }

        let taken = tables.integrations.iter().any(|i| {
            i.deleted_at.is_none()
                && i.integration_type == new_integration.integration_type
                && i.provider_id == new_integration.provider_id
        });
        if taken {
            return Ok(None);
        }

        let timestamp = now();
        let integration = Integration {
            id: Uuid::now_v7(),
            provider_id: new_integration.provider_id,
            name: new_integration.name,
            integration_type: new_integration.integration_type,
            credential_id: new_integration.credential_id,
            labels: new_integration.labels,
            annotations: new_integration.annotations,
            state: new_integration.state,
            last_check: new_integration.last_check,
            created_at: timestamp.into(),
            updated_at: timestamp.into(),
            deleted_at: None,
        };

        tables.integrations.push(integration.clone());
        Ok(Some(integration))
    }

    async fn find_integration(&self, integration_id: Uuid) -> Result<Option<Integration>> {
        let tables = self.tables.read().await;
        Ok(tables
            .integrations
            .iter()
            .find(|i| i.id == integration_id && i.deleted_at.is_none())
            .cloned())
    }

    async fn find_integration_by_provider_id(
        &self,
        integration_type: &str,
        provider_id: &str,
    ) -> Result<Option<Integration>> {
        let tables = self.tables.read().await;
        Ok(tables
            .integrations
            .iter()
            .find(|i| {
                i.deleted_at.is_none()
                    && i.integration_type == integration_type
                    && i.provider_id == provider_id
            })
            .cloned())
    }

    async fn list_integrations(
        &self,
        filter: IntegrationFilter,
        pagination: OffsetPagination,
    ) -> Result<Vec<Integration>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<_> = tables
            .integrations
            .iter()
            .filter(|i| i.deleted_at.is_none())
            .filter(|i| filter.credential_id.is_none_or(|id| i.credential_id == id))
            .filter(|i| {
                filter
                    .integration_type
                    .as_deref()
                    .is_none_or(|t| i.integration_type == t)
            })
            .filter(|i| filter.state.is_none_or(|s| i.state == s))
            .cloned()
            .collect();

        rows.sort_by(|a, b| b.created_at().cmp(&a.created_at()).then(a.id.cmp(&b.id)));
        Ok(paginate(rows, pagination))
    }

    async fn list_credential_integrations(
        &self,
        credential_id: Uuid,
    ) -> Result<Vec<Integration>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<_> = tables
            .integrations
            .iter()
            .filter(|i| i.credential_id == credential_id && i.deleted_at.is_none())
            .cloned()
            .collect();

        rows.sort_by(|a, b| a.provider_id.cmp(&b.provider_id));
        Ok(rows)
    }

    async fn list_integrations_due_for_check(
        &self,
        checked_before: jiff::Timestamp,
        limit: i64,
    ) -> Result<Vec<Integration>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<_> = tables
            .integrations
            .iter()
            .filter(|i| i.deleted_at.is_none() && i.state.is_schedulable())
            .filter(|i| i.is_due_for_check(checked_before))
            .cloned()
            .collect();

        // `None` sorts first, matching `NULLS FIRST`.
        rows.sort_by_key(HasLastCheck::last_check);
        rows.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(rows)
    }

    async fn update_integration(
        &self,
        integration_id: Uuid,
        updates: UpdateIntegration,
    ) -> Result<Option<Integration>> {
        let mut tables = self.tables.write().await;
        tables.update_integration(integration_id, None, updates)
    }

    async fn update_integration_in_state(
        &self,
        integration_id: Uuid,
        expected: IntegrationState,
        updates: UpdateIntegration,
    ) -> Result<Option<Integration>> {
        let mut tables = self.tables.write().await;
        tables.update_integration(integration_id, Some(expected), updates)
    }

    async fn delete_integration(&self, integration_id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let Some(integration) = tables.live_integration_mut(integration_id) else {
            return Ok(false);
        };

        integration.deleted_at = Some(now().into());
        Ok(true)
    }

    async fn purge_sample_integrations(&self) -> Result<usize> {
        let mut tables = self.tables.write().await;
        let before = tables.integrations.len();
        tables
            .integrations
            .retain(|i| i.state != IntegrationState::SampleIntegration);
        Ok(before - tables.integrations.len())
    }
}

#[async_trait::async_trait]
impl IntegrationTypeSetupStore for MemoryStore {
    async fn find_integration_type_setup(
        &self,
        integration_type: &str,
    ) -> Result<Option<IntegrationTypeSetup>> {
        Ok(self.tables.read().await.setups.get(integration_type).cloned())
    }

    async fn list_integration_type_setups(&self) -> Result<Vec<IntegrationTypeSetup>> {
        Ok(self.tables.read().await.setups.values().cloned().collect())
    }

    async fn upsert_integration_type_setup(
        &self,
        setup: NewIntegrationTypeSetup,
    ) -> Result<IntegrationTypeSetup> {
        let mut tables = self.tables.write().await;
        let timestamp = now();

        let row = tables
            .setups
            .entry(setup.integration_type.clone())
            .and_modify(|row| {
                row.enabled = setup.enabled;
                row.updated_at = timestamp.into();
            })
            .or_insert_with(|| IntegrationTypeSetup {
                integration_type: setup.integration_type,
                enabled: setup.enabled,
                created_at: timestamp.into(),
                updated_at: timestamp.into(),
            });

        Ok(row.clone())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn new_credential(integration_type: &str) -> NewCredential {
        NewCredential {
            integration_type: integration_type.to_owned(),
            secret: vec![1, 2, 3],
            metadata: json!({}),
        }
    }

    fn new_integration(credential: &Credential, provider_id: &str) -> NewIntegration {
        NewIntegration {
            provider_id: provider_id.to_owned(),
            name: provider_id.to_owned(),
            integration_type: credential.integration_type.clone(),
            credential_id: credential.id,
            labels: json!({}),
            annotations: json!({}),
            state: IntegrationState::Active,
            last_check: None,
        }
    }

    #[tokio::test]
    async fn natural_key_is_unique_among_live_rows() {
        let store = MemoryStore::new();
        let credential = store.create_credential(new_credential("github")).await.unwrap();

        let first = store
            .create_integration_if_absent(new_integration(&credential, "acme"))
            .await
            .unwrap()
            .unwrap();
        let second = store
            .create_integration_if_absent(new_integration(&credential, "acme"))
            .await
            .unwrap();
        assert!(second.is_none());

        assert!(store.delete_integration(first.id).await.unwrap());
        let third = store
            .create_integration_if_absent(new_integration(&credential, "acme"))
            .await
            .unwrap();
        assert!(third.is_some());
    }

    #[tokio::test]
    async fn rejects_credential_of_another_type() {
        let store = MemoryStore::new();
        let credential = store.create_credential(new_credential("github")).await.unwrap();

        let mut integration = new_integration(&credential, "acme");
        integration.integration_type = "cloudflare".into();
        let error = store.create_integration_if_absent(integration).await.unwrap_err();
        assert_eq!(error.kind(), crate::ErrorKind::CredentialTypeMismatch);
    }

    #[tokio::test]
    async fn credential_delete_archives_owned_integrations() {
        let store = MemoryStore::new();
        let credential = store.create_credential(new_credential("github")).await.unwrap();
        for provider_id in ["a", "b"] {
            store
                .create_integration_if_absent(new_integration(&credential, provider_id))
                .await
                .unwrap();
        }

        assert_eq!(store.delete_credential(credential.id).await.unwrap(), Some(2));
        assert_eq!(store.delete_credential(credential.id).await.unwrap(), None);
        assert!(store.find_credential(credential.id).await.unwrap().is_none());

        let integrations = store.list_credential_integrations(credential.id).await.unwrap();
        assert_eq!(integrations.len(), 2);
        assert!(integrations.iter().all(Integration::is_archived));
    }

    #[tokio::test]
    async fn due_for_check_skips_archived_and_samples() {
        let store = MemoryStore::new();
        let credential = store.create_credential(new_credential("github")).await.unwrap();

        for (provider_id, state) in [
            ("active", IntegrationState::Active),
            ("inactive", IntegrationState::Inactive),
            ("archived", IntegrationState::Archived),
            ("sample", IntegrationState::SampleIntegration),
        ] {
            let mut integration = new_integration(&credential, provider_id);
            integration.state = state;
            store.create_integration_if_absent(integration).await.unwrap();
        }

        let due = store
            .list_integrations_due_for_check(jiff::Timestamp::now(), 10)
            .await
            .unwrap();
        let mut provider_ids: Vec<_> = due.iter().map(|i| i.provider_id.as_str()).collect();
        provider_ids.sort_unstable();
        assert_eq!(provider_ids, ["active", "inactive"]);

        assert_eq!(store.purge_sample_integrations().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn setup_upsert_replaces_flag() {
        let store = MemoryStore::new();
        let setup = |enabled| NewIntegrationTypeSetup {
            integration_type: "github".into(),
            enabled,
        };

        assert!(!store.upsert_integration_type_setup(setup(false)).await.unwrap().enabled);
        assert!(store.upsert_integration_type_setup(setup(true)).await.unwrap().enabled);
        assert_eq!(store.list_integration_type_setups().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rejects_rows_outside_column_bounds() {
        let store = MemoryStore::new();
        let credential = store.create_credential(new_credential("github")).await.unwrap();

        let mut long_id = new_integration(&credential, &"a".repeat(256));
        long_id.name = "acme".into();
        let error = store.create_integration_if_absent(long_id).await.unwrap_err();
        assert_eq!(error.kind(), crate::ErrorKind::Database);

        let mut unnamed = new_integration(&credential, "acme");
        unnamed.name = String::new();
        assert!(store.create_integration_if_absent(unnamed).await.is_err());

        let mut labelled = new_integration(&credential, "acme");
        labelled.labels = json!({ "description": "x".repeat(16384) });
        assert!(store.create_integration_if_absent(labelled).await.is_err());
        assert!(store.all_integrations().await.is_empty());

        let stored = store
            .create_integration_if_absent(new_integration(&credential, "acme"))
            .await
            .unwrap()
            .unwrap();
        let updates = UpdateIntegration {
            annotations: Some(json!({ "note": "x".repeat(16384) })),
            ..Default::default()
        };
        assert!(store.update_integration(stored.id, updates).await.is_err());
    }

    #[tokio::test]
    async fn guarded_update_requires_expected_state() {
        let store = MemoryStore::new();
        let credential = store.create_credential(new_credential("github")).await.unwrap();
        let stored = store
            .create_integration_if_absent(new_integration(&credential, "acme"))
            .await
            .unwrap()
            .unwrap();
        let to_inactive = || UpdateIntegration {
            state: Some(IntegrationState::Inactive),
            ..Default::default()
        };

        let missed = store
            .update_integration_in_state(stored.id, IntegrationState::Archived, to_inactive())
            .await
            .unwrap();
        assert!(missed.is_none());
        assert_eq!(
            store.find_integration(stored.id).await.unwrap().unwrap().state,
            IntegrationState::Active
        );

        let applied = store
            .update_integration_in_state(stored.id, IntegrationState::Active, to_inactive())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(applied.state, IntegrationState::Inactive);
    }
}
