//! Operator workflows composed from discovery, health checks, and the store.

use std::collections::{BTreeMap, HashSet};

use kestrel_core::integration::{DiscoveredIntegration, HEALTH_REASON_ANNOTATION};
use kestrel_core::vault::SecretConfig;
use kestrel_postgres::model::{Credential, Integration, NewIntegration, UpdateCredential, UpdateIntegration};
use kestrel_postgres::types::{IntegrationState, to_string_map};
use uuid::Uuid;

use crate::service::SharedVault;
use crate::service::catalog::IntegrationCatalog;
use crate::service::discovery::{DiscoveredCandidate, DiscoveryEngine, DiscoverySource};
use crate::service::health::{HealthCheckEngine, HealthReport};
use crate::service::secret::encrypt_config;
use crate::service::store::SharedStore;
use crate::{Error, Result};

/// Tracing target for reconciliation workflows.
const TRACING_TARGET: &str = "kestrel_server::reconciler";

/// Result of persisting a selection of discovered candidates.
#[derive(Debug, Clone, Default)]
pub struct AddOutcome {
    /// Rows inserted by this call.
    pub created: Vec<Integration>,
    /// Selected provider ids that already had a live row.
    pub existing: Vec<String>,
    /// Selected provider ids the provider no longer reports.
    pub missing: Vec<String>,
}

/// Changes applied to a stored credential.
#[derive(Debug, Clone, Default)]
pub struct CredentialChanges {
    /// Replacement provider configuration.
    pub config: Option<SecretConfig>,
    /// Replacement metadata.
    pub metadata: Option<BTreeMap<String, String>>,
}

/// Result of a credential update.
#[derive(Debug, Clone)]
pub struct CredentialUpdateOutcome {
    /// The updated credential.
    pub credential: Credential,
    /// Re-check of its integrations, empty when the configuration is unchanged.
    pub health: HealthReport,
}

/// Add, update, delete, and lifecycle workflows.
#[derive(Clone)]
pub struct Reconciler {
    store: SharedStore,
    vault: SharedVault,
    catalog: IntegrationCatalog,
    discovery: DiscoveryEngine,
    health: HealthCheckEngine,
}

impl Reconciler {
    /// Creates a reconciler.
    pub fn new(
        store: SharedStore,
        vault: SharedVault,
        catalog: IntegrationCatalog,
        discovery: DiscoveryEngine,
        health: HealthCheckEngine,
    ) -> Self {
        Self {
            store,
            vault,
            catalog,
            discovery,
            health,
        }
    }

    /// Re-discovers through `credential_id` and persists the selected
    /// candidates.
    ///
    /// Concurrent or repeated calls with the same selection are safe: a
    /// candidate whose natural key is already taken is skipped, never
    /// overwritten.
    #[tracing::instrument(skip_all, fields(credential_id = %credential_id, integration_type = %integration_type))]
    pub async fn add(
        &self,
        credential_id: Uuid,
        integration_type: &str,
        provider_ids: &[String],
    ) -> Result<AddOutcome> {
        let outcome = self
            .discovery
            .discover(integration_type, DiscoverySource::Credential(credential_id))
            .await?;

        let selected: HashSet<&str> = provider_ids.iter().map(String::as_str).collect();
        let now = jiff::Timestamp::now();
        let mut result = AddOutcome::default();

        let mut found = HashSet::new();
        for candidate in outcome.candidates {
            if !selected.contains(candidate.provider_id.as_str()) {
                continue;
            }
            found.insert(candidate.provider_id.clone());

            let provider_id = candidate.provider_id.clone();
            let new_integration = new_integration(
                credential_id,
                outcome.integration_type.as_str(),
                candidate,
                Some(now),
            );

            match self.store.create_integration_if_absent(new_integration).await? {
                Some(integration) => result.created.push(integration),
                None => result.existing.push(provider_id),
            }
        }

        result.missing = provider_ids
            .iter()
            .filter(|id| !found.contains(id.as_str()))
            .cloned()
            .collect();

        tracing::info!(
            target: TRACING_TARGET,
            created = result.created.len(),
            existing = result.existing.len(),
            missing = result.missing.len(),
            "Integrations added"
        );

        Ok(result)
    }

    /// Replaces the configuration and/or metadata of a credential.
    ///
    /// A new configuration is re-encrypted and every integration of the
    /// credential is re-checked against it.
    #[tracing::instrument(skip_all, fields(credential_id = %credential_id))]
    pub async fn update_credential(
        &self,
        credential_id: Uuid,
        changes: CredentialChanges,
    ) -> Result<CredentialUpdateOutcome> {
        let secret = changes
            .config
            .as_ref()
            .map(|config| encrypt_config(self.vault.as_ref(), config))
            .transpose()?;
        let config_changed = secret.is_some();

        let updates = UpdateCredential {
            secret,
            metadata: changes.metadata.as_ref().map(to_string_map),
            deleted_at: None,
        };

        let credential = self
            .store
            .update_credential(credential_id, updates)
            .await?
            .ok_or_else(|| Error::credential_not_found(credential_id))?;

        let health = if config_changed {
            let integrations = self.store.list_credential_integrations(credential_id).await?;
            self.health
                .check_many(integrations.iter().map(|i| i.id).collect())
                .await
        } else {
            HealthReport::default()
        };

        tracing::info!(
            target: TRACING_TARGET,
            config_changed,
            rechecked = health.checked.len(),
            "Credential updated"
        );

        Ok(CredentialUpdateOutcome { credential, health })
    }

    /// Soft deletes a credential and archives its integrations.
    ///
    /// Returns the number of integrations that were archived.
    #[tracing::instrument(skip_all, fields(credential_id = %credential_id))]
    pub async fn delete_credential(&self, credential_id: Uuid) -> Result<usize> {
        let archived = self
            .store
            .delete_credential(credential_id)
            .await?
            .ok_or_else(|| Error::credential_not_found(credential_id))?;

        tracing::info!(target: TRACING_TARGET, archived, "Credential deleted");
        Ok(archived)
    }

    /// Soft deletes one integration.
    pub async fn delete_integration(&self, integration_id: Uuid) -> Result<()> {
        if !self.store.delete_integration(integration_id).await? {
            return Err(Error::integration_not_found(integration_id));
        }

        tracing::info!(
            target: TRACING_TARGET,
            integration_id = %integration_id,
            "Integration deleted"
        );
        Ok(())
    }

    /// Withdraws an integration from service.
    pub async fn archive(&self, integration_id: Uuid) -> Result<Integration> {
        let integration = self.find_integration(integration_id).await?;
        if integration.is_archived() {
            return Ok(integration);
        }

        let updates = UpdateIntegration {
            state: Some(integration.state.archived()),
            ..Default::default()
        };

        let archived = self
            .store
            .update_integration(integration_id, updates)
            .await?
            .ok_or_else(|| Error::integration_not_found(integration_id))?;

        tracing::info!(
            target: TRACING_TARGET,
            integration_id = %integration_id,
            from = %integration.state,
            "Integration archived"
        );
        Ok(archived)
    }

    /// Brings an archived integration back and immediately health-checks it.
    ///
    /// With `credential_id` the integration is rebound to that credential,
    /// which must be live and of the same type. Without it the current
    /// credential must still be live. The provider is asked before anything
    /// is written, so a failure leaves the integration archived.
    #[tracing::instrument(skip_all, fields(integration_id = %integration_id))]
    pub async fn unarchive(
        &self,
        integration_id: Uuid,
        credential_id: Option<Uuid>,
    ) -> Result<Integration> {
        let integration = self.find_integration(integration_id).await?;
        let Some(state) = integration.state.unarchived() else {
            return Err(not_unarchivable(integration.state));
        };

        let target = credential_id.unwrap_or(integration.credential_id);
        let credential = self
            .store
            .find_credential(target)
            .await?
            .ok_or_else(|| Error::credential_not_found(target))?;

        if credential.integration_type != integration.integration_type {
            return Err(Error::credential_type_mismatch(
                &integration.integration_type,
                &credential.integration_type,
            ));
        }

        let verdict = self.health.evaluate(&integration, &credential).await?;

        let mut annotations = integration.annotations_map();
        annotations.remove(HEALTH_REASON_ANNOTATION);
        let updates = UpdateIntegration {
            credential_id: credential_id.filter(|id| *id != integration.credential_id),
            ..verdict.changes(state, annotations)
        };

        let Some(restored) = self
            .store
            .update_integration_in_state(integration_id, integration.state, updates)
            .await?
        else {
            let current = self.find_integration(integration_id).await?;
            return Err(not_unarchivable(current.state));
        };

        tracing::info!(
            target: TRACING_TARGET,
            credential_id = %target,
            to = %restored.state,
            healthy = verdict.is_healthy(),
            "Integration unarchived"
        );

        Ok(restored)
    }

    /// Maps the labels of an integration to its collectable resource types.
    pub async fn resource_types(&self, integration_id: Uuid) -> Result<Vec<String>> {
        let integration = self.find_integration(integration_id).await?;
        let (_, provider) = self.catalog.resolve(&integration.integration_type).await?;

        provider
            .resource_types_by_labels(&integration.labels_map())
            .await
            .map_err(|e| {
                Error::provider_discovery_failed(format!("provider could not map labels: {e}"))
                    .with_source(e)
            })
    }

    /// Seeds sample integrations under an existing credential.
    ///
    /// Samples already present are left untouched.
    #[tracing::instrument(skip_all, fields(credential_id = %credential_id))]
    pub async fn seed_samples(
        &self,
        credential_id: Uuid,
        samples: Vec<DiscoveredIntegration>,
    ) -> Result<AddOutcome> {
        let credential = self
            .store
            .find_credential(credential_id)
            .await?
            .ok_or_else(|| Error::credential_not_found(credential_id))?;

        let mut result = AddOutcome::default();
        for sample in samples {
            let provider_id = sample.provider_id.clone();
            let candidate = DiscoveredCandidate {
                provider_id: sample.provider_id,
                name: sample.name,
                labels: sample.labels,
                state: IntegrationState::SampleIntegration,
                health_reason: None,
            };
            let new_integration =
                new_integration(credential_id, &credential.integration_type, candidate, None);

            match self.store.create_integration_if_absent(new_integration).await? {
                Some(integration) => result.created.push(integration),
                None => result.existing.push(provider_id),
            }
        }

        tracing::info!(
            target: TRACING_TARGET,
            created = result.created.len(),
            "Sample integrations seeded"
        );
        Ok(result)
    }

    /// Hard deletes every sample integration.
    pub async fn purge_samples(&self) -> Result<usize> {
        let purged = self.store.purge_sample_integrations().await?;
        tracing::info!(target: TRACING_TARGET, purged, "Sample integrations purged");
        Ok(purged)
    }

    async fn find_integration(&self, integration_id: Uuid) -> Result<Integration> {
        self.store
            .find_integration(integration_id)
            .await?
            .ok_or_else(|| Error::integration_not_found(integration_id))
    }
}

fn not_unarchivable(state: IntegrationState) -> Error {
    Error::invalid_state_transition(format!("integration is {state} and cannot be unarchived"))
}

fn new_integration(
    credential_id: Uuid,
    integration_type: &str,
    candidate: DiscoveredCandidate,
    checked_at: Option<jiff::Timestamp>,
) -> NewIntegration {
    let mut annotations = BTreeMap::new();
    if let Some(reason) = candidate.health_reason {
        annotations.insert(HEALTH_REASON_ANNOTATION.to_owned(), reason);
    }

    NewIntegration {
        provider_id: candidate.provider_id,
        name: candidate.name,
        integration_type: integration_type.to_owned(),
        credential_id,
        labels: to_string_map(&candidate.labels),
        annotations: to_string_map(&annotations),
        state: candidate.state,
        last_check: checked_at.map(Into::into),
    }
}

#[cfg(test)]
mod tests {
    use kestrel_test::{MockHealth, MockProvider};

    use super::*;
    use crate::ErrorKind;
    use crate::service::testing::Fixture;

    fn aws() -> MockProvider {
        MockProvider::new("aws")
            .with_candidate(DiscoveredIntegration::new("123456789012", "123456789012"))
            .with_candidate(DiscoveredIntegration::new("210987654321", "sandbox").with_label("kind", "account"))
            .with_health("210987654321", MockHealth::Unhealthy)
            .with_resource_types("account", ["AWS::EC2::Instance", "AWS::S3::Bucket"])
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_owned()).collect()
    }

    #[tokio::test]
    async fn add_is_idempotent() {
        let fixture = Fixture::new("aws", aws());
        let credential = fixture.credential("aws").await;
        let selection = ids(&["123456789012"]);

        let first = fixture
            .state
            .reconciler
            .add(credential.id, "aws", &selection)
            .await
            .unwrap();
        assert_eq!(first.created.len(), 1);
        assert_eq!(first.created[0].state, IntegrationState::Active);
        assert!(first.created[0].last_check.is_some());

        let second = fixture
            .state
            .reconciler
            .add(credential.id, "aws", &selection)
            .await
            .unwrap();
        assert!(second.created.is_empty());
        assert_eq!(second.existing, selection);

        let rows = fixture.store.all_integrations().await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0], first.created[0]);
    }

    #[tokio::test]
    async fn concurrent_adds_create_one_row() {
        let fixture = Fixture::new("aws", aws());
        let credential = fixture.credential("aws").await;
        let selection = ids(&["123456789012"]);

        let reconciler = &fixture.state.reconciler;
        let (a, b) = tokio::join!(
            reconciler.add(credential.id, "aws", &selection),
            reconciler.add(credential.id, "aws", &selection),
        );

        assert_eq!(a.unwrap().created.len() + b.unwrap().created.len(), 1);
        assert_eq!(fixture.store.all_integrations().await.len(), 1);
    }

    #[tokio::test]
    async fn add_reports_missing_and_keeps_health_reason() {
        let fixture = Fixture::new("aws", aws());
        let credential = fixture.credential("aws").await;

        let outcome = fixture
            .state
            .reconciler
            .add(credential.id, "aws", &ids(&["210987654321", "999999999999"]))
            .await
            .unwrap();

        assert_eq!(outcome.missing, ids(&["999999999999"]));
        let sandbox = &outcome.created[0];
        assert_eq!(sandbox.state, IntegrationState::Inactive);
        assert!(sandbox.annotations_map().contains_key(HEALTH_REASON_ANNOTATION));
        assert_eq!(sandbox.labels_map()["kind"], "account");
    }

    #[tokio::test]
    async fn credential_delete_archives_both_integrations() {
        let fixture = Fixture::new("aws", aws().with_default_health(MockHealth::Healthy));
        let credential = fixture.credential("aws").await;
        fixture
            .state
            .reconciler
            .add(credential.id, "aws", &ids(&["123456789012", "210987654321"]))
            .await
            .unwrap();

        let archived = fixture
            .state
            .reconciler
            .delete_credential(credential.id)
            .await
            .unwrap();
        assert_eq!(archived, 2);

        let rows = fixture.store.all_integrations().await;
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|i| i.is_archived() && i.credential_id == credential.id));

        let error = fixture
            .state
            .reconciler
            .delete_credential(credential.id)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::CredentialNotFound);
    }

    #[tokio::test]
    async fn update_credential_reencrypts_and_rechecks() {
        let fixture = Fixture::new("aws", aws());
        let credential = fixture.credential("aws").await;
        fixture
            .state
            .reconciler
            .add(credential.id, "aws", &ids(&["123456789012"]))
            .await
            .unwrap();

        let config = SecretConfig::new().with("token", "rotated");
        let outcome = fixture
            .state
            .reconciler
            .update_credential(
                credential.id,
                CredentialChanges {
                    config: Some(config.clone()),
                    metadata: Some(BTreeMap::from([("owner".to_owned(), "sre".to_owned())])),
                },
            )
            .await
            .unwrap();

        assert_eq!(fixture.vault.decrypt(&outcome.credential.secret).unwrap(), config);
        assert_eq!(outcome.credential.metadata_map()["owner"], "sre");
        assert_eq!(outcome.health.checked.len(), 1);

        let metadata_only = fixture
            .state
            .reconciler
            .update_credential(
                credential.id,
                CredentialChanges {
                    config: None,
                    metadata: Some(BTreeMap::new()),
                },
            )
            .await
            .unwrap();
        assert!(metadata_only.health.checked.is_empty());
        assert_eq!(metadata_only.credential.secret, outcome.credential.secret);
    }

    #[tokio::test]
    async fn archive_and_unarchive() {
        let fixture = Fixture::new("aws", aws());
        let credential = fixture.credential("aws").await;
        let integration = fixture
            .integration(&credential, "123456789012", IntegrationState::Active)
            .await;
        let reconciler = &fixture.state.reconciler;

        let error = reconciler.unarchive(integration.id, None).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidStateTransition);

        let archived = reconciler.archive(integration.id).await.unwrap();
        assert_eq!(archived.state, IntegrationState::Archived);
        assert_eq!(reconciler.archive(integration.id).await.unwrap().state, IntegrationState::Archived);

        let restored = reconciler.unarchive(integration.id, None).await.unwrap();
        assert_eq!(restored.state, IntegrationState::Active);
        assert!(restored.last_check.is_some());
    }

    #[tokio::test]
    async fn unarchive_after_credential_delete_requires_rebind() {
        let fixture = Fixture::new("aws", aws());
        let old = fixture.credential("aws").await;
        let integration = fixture
            .integration(&old, "123456789012", IntegrationState::Active)
            .await;
        let reconciler = &fixture.state.reconciler;
        reconciler.delete_credential(old.id).await.unwrap();

        let error = reconciler.unarchive(integration.id, None).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::CredentialNotFound);

        let other_type = fixture.credential("github").await;
        let error = reconciler
            .unarchive(integration.id, Some(other_type.id))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::CredentialTypeMismatch);

        let replacement = fixture.credential("aws").await;
        let restored = reconciler
            .unarchive(integration.id, Some(replacement.id))
            .await
            .unwrap();
        assert_eq!(restored.credential_id, replacement.id);
        assert_eq!(restored.state, IntegrationState::Active);
    }

    #[tokio::test]
    async fn failed_unarchive_leaves_integration_archived() {
        let fixture = Fixture::new("aws", aws());
        let credential = fixture.credential("aws").await;
        let integration = fixture
            .integration(&credential, "123456789012", IntegrationState::Archived)
            .await;
        let reconciler = &fixture.state.reconciler;
        fixture.store.corrupt_secret(credential.id, vec![1, 0, 0, 0]).await;

        let error = reconciler.unarchive(integration.id, None).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::SecretDecryptFailed);
        assert_eq!(fixture.store.all_integrations().await, [integration.clone()]);

        let replacement = fixture.credential("aws").await;
        fixture.store.corrupt_secret(replacement.id, Vec::new()).await;
        let error = reconciler
            .unarchive(integration.id, Some(replacement.id))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::SecretDecryptFailed);

        let stored = fixture.store.all_integrations().await;
        assert_eq!(stored, [integration]);
        assert_eq!(fixture.calls.health_check(), 0);
    }

    #[tokio::test]
    async fn unhealthy_unarchive_records_reason() {
        let fixture = Fixture::new("aws", aws());
        let credential = fixture.credential("aws").await;
        let integration = fixture
            .integration(&credential, "210987654321", IntegrationState::Archived)
            .await;

        let restored = fixture
            .state
            .reconciler
            .unarchive(integration.id, None)
            .await
            .unwrap();
        assert_eq!(restored.state, IntegrationState::Inactive);
        assert!(restored.annotations_map().contains_key(HEALTH_REASON_ANNOTATION));
        assert!(restored.last_check.is_some());
    }

    #[tokio::test]
    async fn resource_types_follow_labels() {
        let fixture = Fixture::new("aws", aws());
        let credential = fixture.credential("aws").await;
        let outcome = fixture
            .state
            .reconciler
            .add(credential.id, "aws", &ids(&["210987654321", "123456789012"]))
            .await
            .unwrap();

        let labelled = outcome.created.iter().find(|i| i.provider_id == "210987654321").unwrap();
        let types = fixture.state.reconciler.resource_types(labelled.id).await.unwrap();
        assert_eq!(types, ["AWS::EC2::Instance", "AWS::S3::Bucket"]);

        let bare = outcome.created.iter().find(|i| i.provider_id == "123456789012").unwrap();
        assert!(fixture.state.reconciler.resource_types(bare.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn samples_are_seeded_once_and_purged() {
        let fixture = Fixture::new("aws", aws());
        let credential = fixture.credential("aws").await;
        let samples = vec![
            DiscoveredIntegration::new("000000000001", "demo-a"),
            DiscoveredIntegration::new("000000000002", "demo-b"),
        ];
        let reconciler = &fixture.state.reconciler;

        let seeded = reconciler.seed_samples(credential.id, samples.clone()).await.unwrap();
        assert_eq!(seeded.created.len(), 2);
        assert!(seeded.created.iter().all(|i| i.state == IntegrationState::SampleIntegration));

        let again = reconciler.seed_samples(credential.id, samples).await.unwrap();
        assert_eq!(again.existing.len(), 2);

        fixture.integration(&credential, "123456789012", IntegrationState::Active).await;
        assert_eq!(reconciler.purge_samples().await.unwrap(), 2);
        assert_eq!(fixture.store.all_integrations().await.len(), 1);
    }
}
