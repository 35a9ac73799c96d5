//! Health checks of persisted integrations.
//!
//! A check never fails because the provider said no: unhealthy answers,
//! provider errors, and deadline overruns all become an `INACTIVE` state plus
//! a `health-reason` annotation. Only problems that prevent asking the
//! provider at all (missing rows, undecryptable secrets, unknown types) are
//! returned as errors, and those leave the integration untouched.

use std::time::Duration;

use futures::{StreamExt, stream};
use jiff::SignedDuration;
use kestrel_core::integration::{
    Annotations, HEALTH_REASON_ANNOTATION, IntegrationProvider, Labels,
};
use kestrel_core::vault::SecretConfig;
use kestrel_postgres::model::{Credential, Integration, UpdateIntegration};
use kestrel_postgres::types::{IntegrationState, to_string_map};
use uuid::Uuid;

use crate::service::catalog::IntegrationCatalog;
use crate::service::secret::decrypt_credential;
use crate::service::store::SharedStore;
use crate::service::SharedVault;
use crate::{Error, ErrorKind, Result};

/// Tracing target for health check operations.
const TRACING_TARGET: &str = "kestrel_server::health";

/// Longest failure reason stored in an annotation.
const MAX_REASON_LEN: usize = 1024;

/// Times a verdict is re-applied after losing a race with a state change.
const MAX_WRITE_ATTEMPTS: usize = 3;

/// Asks `provider` about one target under a deadline.
///
/// Returns [`ErrorKind::ProviderHealthCheckFailed`] carrying the reason for
/// every outcome other than a healthy answer.
pub(crate) async fn probe(
    provider: &dyn IntegrationProvider,
    config: &SecretConfig,
    provider_id: &str,
    labels: &Labels,
    annotations: &Annotations,
    deadline: Duration,
) -> Result<()> {
    let call = provider.health_check(config, provider_id, labels, annotations);
    let reason = match tokio::time::timeout(deadline, call).await {
        Ok(Ok(true)) => return Ok(()),
        Ok(Ok(false)) => "provider reported the integration as unhealthy".to_owned(),
        Ok(Err(error)) => error.to_string(),
        Err(_) => format!("health check timed out after {}s", deadline.as_secs()),
    };

    Err(Error::provider_health_check_failed(truncate_reason(reason)))
}

fn truncate_reason(mut reason: String) -> String {
    if reason.len() > MAX_REASON_LEN {
        let mut end = MAX_REASON_LEN;
        while !reason.is_char_boundary(end) {
            end -= 1;
        }
        reason.truncate(end);
    }
    reason
}

/// Provider answer for one integration, not yet persisted.
#[derive(Debug)]
pub(crate) struct Verdict {
    outcome: Result<()>,
    checked_at: jiff::Timestamp,
}

impl Verdict {
    pub(crate) fn is_healthy(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Changes that record this verdict on a row currently in `state`.
    ///
    /// Archived rows only get the check timestamp; their state and
    /// annotations stay as they are.
    pub(crate) fn changes(
        &self,
        state: IntegrationState,
        mut annotations: Annotations,
    ) -> UpdateIntegration {
        if !state.is_archived() {
            match &self.outcome {
                Ok(()) => {
                    annotations.remove(HEALTH_REASON_ANNOTATION);
                }
                Err(error) => {
                    annotations
                        .insert(HEALTH_REASON_ANNOTATION.to_owned(), error.message().to_owned());
                }
            }
        }

        UpdateIntegration {
            state: Some(state.after_health_check(self.is_healthy())),
            annotations: Some(to_string_map(&annotations)),
            last_check: Some(Some(self.checked_at.into())),
            ..Default::default()
        }
    }
}

/// One integration a batch could not check.
#[derive(Debug, Clone)]
pub struct HealthCheckFailure {
    /// Integration that was skipped.
    pub integration_id: Uuid,
    /// Why the check could not run.
    pub kind: ErrorKind,
    /// Human-readable cause.
    pub message: String,
}

/// Aggregated result of a batch of health checks.
#[derive(Debug, Clone, Default)]
pub struct HealthReport {
    /// Integrations whose check completed, whatever the verdict.
    pub checked: Vec<Integration>,
    /// Integrations whose check could not run.
    pub failures: Vec<HealthCheckFailure>,
}

impl HealthReport {
    /// Number of checked integrations now in `state`.
    pub fn count(&self, state: IntegrationState) -> usize {
        self.checked.iter().filter(|i| i.state == state).count()
    }
}

/// Runs provider health checks and applies the resulting transitions.
#[derive(Clone)]
pub struct HealthCheckEngine {
    store: SharedStore,
    vault: SharedVault,
    catalog: IntegrationCatalog,
    timeout: Duration,
    max_concurrency: usize,
}

impl HealthCheckEngine {
    /// Creates an engine.
    pub fn new(
        store: SharedStore,
        vault: SharedVault,
        catalog: IntegrationCatalog,
        timeout: Duration,
        max_concurrency: usize,
    ) -> Self {
        Self {
            store,
            vault,
            catalog,
            timeout,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Checks one integration and persists the outcome.
    ///
    /// Safe to call concurrently for different integrations and to retry for
    /// the same one. The verdict is applied to the state the row holds when
    /// it is written, so a lifecycle change that lands while the provider is
    /// being asked is never undone.
    #[tracing::instrument(skip_all, fields(integration_id = %integration_id))]
    pub async fn check(&self, integration_id: Uuid) -> Result<Integration> {
        let integration = self.find_integration(integration_id).await?;
        let credential = self
            .store
            .find_credential(integration.credential_id)
            .await?
            .ok_or_else(|| Error::credential_not_found(integration.credential_id))?;

        let verdict = self.evaluate(&integration, &credential).await?;
        let updated = self.record(integration, &verdict).await?;

        tracing::info!(
            target: TRACING_TARGET,
            integration_type = %updated.integration_type,
            provider_id = %updated.provider_id,
            to = %updated.state,
            healthy = verdict.is_healthy(),
            "Health check completed"
        );

        Ok(updated)
    }

    /// Asks the provider about `integration` using `credential`, writing
    /// nothing.
    ///
    /// Fails only when the provider cannot be asked at all.
    pub(crate) async fn evaluate(
        &self,
        integration: &Integration,
        credential: &Credential,
    ) -> Result<Verdict> {
        let config = decrypt_credential(self.vault.as_ref(), credential)?;
        let (_, provider) = self.catalog.resolve(&integration.integration_type).await?;

        let outcome = probe(
            provider.as_ref(),
            &config,
            &integration.provider_id,
            &integration.labels_map(),
            &integration.annotations_map(),
            self.timeout,
        )
        .await;

        Ok(Verdict {
            outcome,
            checked_at: jiff::Timestamp::now(),
        })
    }

    /// Writes `verdict` against the freshest state of the row.
    async fn record(&self, mut current: Integration, verdict: &Verdict) -> Result<Integration> {
        let integration_id = current.id;

        for _ in 0..MAX_WRITE_ATTEMPTS {
            let updates = verdict.changes(current.state, current.annotations_map());
            let written = self
                .store
                .update_integration_in_state(integration_id, current.state, updates)
                .await?;
            if let Some(updated) = written {
                return Ok(updated);
            }

            let from = current.state;
            current = self.find_integration(integration_id).await?;
            tracing::debug!(
                target: TRACING_TARGET,
                from = %from,
                to = %current.state,
                "State changed during health check"
            );
        }

        Err(Error::invalid_state_transition(
            "integration state kept changing during the health check",
        ))
    }

    async fn find_integration(&self, integration_id: Uuid) -> Result<Integration> {
        self.store
            .find_integration(integration_id)
            .await?
            .ok_or_else(|| Error::integration_not_found(integration_id))
    }

    /// Checks several integrations with bounded concurrency.
    pub async fn check_many(&self, integration_ids: Vec<Uuid>) -> HealthReport {
        let results: Vec<_> = stream::iter(integration_ids)
            .map(|integration_id| async move { (integration_id, self.check(integration_id).await) })
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;

        let mut report = HealthReport::default();
        for (integration_id, result) in results {
            match result {
                Ok(integration) => report.checked.push(integration),
                Err(error) => {
                    tracing::warn!(
                        target: TRACING_TARGET,
                        integration_id = %integration_id,
                        kind = %error.kind(),
                        "Health check could not run"
                    );
                    report.failures.push(HealthCheckFailure {
                        integration_id,
                        kind: error.kind(),
                        message: error.message().to_owned(),
                    });
                }
            }
        }

        report
    }

    /// Checks every schedulable integration not checked within `older_than`.
    #[tracing::instrument(skip_all, fields(older_than = %older_than, limit = limit))]
    pub async fn check_due(&self, older_than: SignedDuration, limit: i64) -> Result<HealthReport> {
        let cutoff = jiff::Timestamp::now()
            .checked_sub(older_than)
            .unwrap_or(jiff::Timestamp::MIN);

        let due = self
            .store
            .list_integrations_due_for_check(cutoff, limit)
            .await?;

        tracing::debug!(target: TRACING_TARGET, due = due.len(), "Running batch health check");

        let report = self.check_many(due.iter().map(|i| i.id).collect()).await;

        tracing::info!(
            target: TRACING_TARGET,
            checked = report.checked.len(),
            failed = report.failures.len(),
            "Batch health check completed"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use kestrel_core::integration::DiscoveredIntegration;
    use kestrel_test::{MockHealth, MockProvider};

    use super::*;
    use crate::service::store::IntegrationStore;
    use crate::service::testing::Fixture;

    fn provider() -> MockProvider {
        MockProvider::new("aws")
            .with_candidate(DiscoveredIntegration::new("111111111111", "prod"))
            .with_candidate(DiscoveredIntegration::new("222222222222", "staging"))
    }

    #[tokio::test]
    async fn healthy_and_unhealthy_transitions() {
        let fixture = Fixture::new("aws", provider().with_health("222222222222", MockHealth::Unhealthy));
        let credential = fixture.credential("aws").await;
        let prod = fixture.integration(&credential, "111111111111", IntegrationState::Inactive).await;
        let staging = fixture.integration(&credential, "222222222222", IntegrationState::Active).await;

        let prod = fixture.state.health.check(prod.id).await.unwrap();
        assert_eq!(prod.state, IntegrationState::Active);
        assert!(prod.last_check.is_some());
        assert!(!prod.annotations_map().contains_key(HEALTH_REASON_ANNOTATION));

        let staging = fixture.state.health.check(staging.id).await.unwrap();
        assert_eq!(staging.state, IntegrationState::Inactive);
        let reason = &staging.annotations_map()[HEALTH_REASON_ANNOTATION];
        assert!(!reason.is_empty());
    }

    #[tokio::test]
    async fn recovery_clears_health_reason() {
        let fixture = Fixture::new("aws", provider());
        let credential = fixture.credential("aws").await;
        let integration = fixture
            .integration(&credential, "111111111111", IntegrationState::Inactive)
            .await;
        fixture
            .store
            .update_integration(
                integration.id,
                UpdateIntegration {
                    annotations: Some(serde_json::json!({ "health-reason": "stale", "owner": "ops" })),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let checked = fixture.state.health.check(integration.id).await.unwrap();
        let annotations = checked.annotations_map();
        assert!(!annotations.contains_key(HEALTH_REASON_ANNOTATION));
        assert_eq!(annotations["owner"], "ops");
    }

    #[tokio::test]
    async fn archived_is_sticky_but_stamped() {
        for health in [MockHealth::Healthy, MockHealth::Unhealthy, MockHealth::Fail("boom".into())] {
            let fixture = Fixture::new("aws", provider().with_default_health(health));
            let credential = fixture.credential("aws").await;
            let integration = fixture
                .integration(&credential, "111111111111", IntegrationState::Archived)
                .await;

            let checked = fixture.state.health.check(integration.id).await.unwrap();
            assert_eq!(checked.state, IntegrationState::Archived);
            assert!(checked.last_check.is_some());
            assert!(!checked.annotations_map().contains_key(HEALTH_REASON_ANNOTATION));
        }
    }

    #[tokio::test]
    async fn retry_is_idempotent() {
        let fixture = Fixture::new("aws", provider().with_default_health(MockHealth::Unhealthy));
        let credential = fixture.credential("aws").await;
        let integration = fixture
            .integration(&credential, "111111111111", IntegrationState::Active)
            .await;

        let first = fixture.state.health.check(integration.id).await.unwrap();
        let second = fixture.state.health.check(integration.id).await.unwrap();
        assert_eq!(first.state, second.state);
        assert_eq!(first.annotations, second.annotations);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_is_an_unhealthy_verdict() {
        let fixture = Fixture::new(
            "aws",
            provider().with_default_health(MockHealth::Stall(Duration::from_secs(3600))),
        );
        let credential = fixture.credential("aws").await;
        let integration = fixture
            .integration(&credential, "111111111111", IntegrationState::Active)
            .await;

        let checked = fixture.state.health.check(integration.id).await.unwrap();
        assert_eq!(checked.state, IntegrationState::Inactive);
        assert!(checked.annotations_map()[HEALTH_REASON_ANNOTATION].contains("timed out"));
    }

    async fn wait_for_health_calls(fixture: &Fixture, calls: usize) {
        while fixture.calls.health_check() < calls {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn credential_delete_during_check_stays_archived() {
        let fixture = Fixture::new(
            "aws",
            provider().with_default_health(MockHealth::Stall(Duration::from_secs(5))),
        );
        let credential = fixture.credential("aws").await;
        let integration = fixture
            .integration(&credential, "111111111111", IntegrationState::Active)
            .await;
        let integration_id = integration.id;

        let health = fixture.state.health.clone();
        let check = tokio::spawn(async move { health.check(integration_id).await });
        wait_for_health_calls(&fixture, 1).await;

        let archived = fixture
            .state
            .reconciler
            .delete_credential(credential.id)
            .await
            .unwrap();
        assert_eq!(archived, 1);

        let checked = check.await.unwrap().unwrap();
        assert_eq!(checked.state, IntegrationState::Archived);
        assert!(checked.last_check.is_some());

        let stored = fixture.store.find_integration(integration.id).await.unwrap().unwrap();
        assert_eq!(stored.state, IntegrationState::Archived);
    }

    #[tokio::test(start_paused = true)]
    async fn archive_during_failing_check_stays_archived() {
        let fixture = Fixture::new(
            "aws",
            provider().with_default_health(MockHealth::Stall(Duration::from_secs(3600))),
        );
        let credential = fixture.credential("aws").await;
        let integration = fixture
            .integration(&credential, "111111111111", IntegrationState::Active)
            .await;
        let integration_id = integration.id;

        let health = fixture.state.health.clone();
        let check = tokio::spawn(async move { health.check(integration_id).await });
        wait_for_health_calls(&fixture, 1).await;

        fixture.state.reconciler.archive(integration.id).await.unwrap();

        let checked = check.await.unwrap().unwrap();
        assert_eq!(checked.state, IntegrationState::Archived);
        assert!(!checked.annotations_map().contains_key(HEALTH_REASON_ANNOTATION));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_checks_and_archive_converge() {
        let fixture = Fixture::new(
            "aws",
            provider().with_default_health(MockHealth::Stall(Duration::from_secs(5))),
        );
        let credential = fixture.credential("aws").await;
        let integration = fixture
            .integration(&credential, "111111111111", IntegrationState::Inactive)
            .await;
        let integration_id = integration.id;

        let checks: Vec<_> = (0..3)
            .map(|_| {
                let health = fixture.state.health.clone();
                tokio::spawn(async move { health.check(integration_id).await })
            })
            .collect();
        wait_for_health_calls(&fixture, 3).await;

        fixture.state.reconciler.archive(integration.id).await.unwrap();

        for check in checks {
            let checked = check.await.unwrap().unwrap();
            assert_eq!(checked.state, IntegrationState::Archived);
        }

        let rows = fixture.store.all_integrations().await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].state, IntegrationState::Archived);
        assert!(rows[0].last_check.is_some());
    }

    #[tokio::test]
    async fn decrypt_failure_leaves_integration_untouched() {
        let fixture = Fixture::new("aws", provider());
        let credential = fixture.credential("aws").await;
        let integration = fixture
            .integration(&credential, "111111111111", IntegrationState::Active)
            .await;
        fixture.store.corrupt_secret(credential.id, vec![1, 0, 0, 0]).await;

        let error = fixture.state.health.check(integration.id).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::SecretDecryptFailed);

        let stored = fixture.store.find_integration(integration.id).await.unwrap().unwrap();
        assert_eq!(stored.state, integration.state);
        assert_eq!(stored.last_check, integration.last_check);
        assert_eq!(fixture.calls.health_check(), 0);
    }

    #[tokio::test]
    async fn unknown_type_is_rejected_without_writes() {
        let fixture = Fixture::new("aws", provider());
        let credential = fixture.credential("gcp").await;
        let integration = fixture
            .integration(&credential, "project-1", IntegrationState::Active)
            .await;

        let error = fixture.state.health.check(integration.id).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidIntegrationType);

        let stored = fixture.store.find_integration(integration.id).await.unwrap().unwrap();
        assert_eq!(stored, integration);
    }

    #[tokio::test]
    async fn missing_integration() {
        let fixture = Fixture::new("aws", provider());
        let error = fixture.state.health.check(Uuid::now_v7()).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::IntegrationNotFound);
    }

    #[tokio::test]
    async fn batch_skips_archived_and_samples() {
        let fixture = Fixture::new("aws", provider());
        let credential = fixture.credential("aws").await;
        for (provider_id, state) in [
            ("1", IntegrationState::Active),
            ("2", IntegrationState::Inactive),
            ("3", IntegrationState::Archived),
            ("4", IntegrationState::SampleIntegration),
        ] {
            fixture.integration(&credential, provider_id, state).await;
        }

        let report = fixture
            .state
            .health
            .check_due(SignedDuration::ZERO, 100)
            .await
            .unwrap();
        assert_eq!(report.checked.len(), 2);
        assert_eq!(report.count(IntegrationState::Active), 2);
        assert!(report.failures.is_empty());

        let again = fixture
            .state
            .health
            .check_due(SignedDuration::from_hours(1), 100)
            .await
            .unwrap();
        assert!(again.checked.is_empty());
    }

    #[tokio::test]
    async fn batch_reports_failures() {
        let fixture = Fixture::new("aws", provider());
        let credential = fixture.credential("aws").await;
        let integration = fixture
            .integration(&credential, "1", IntegrationState::Active)
            .await;
        fixture.store.corrupt_secret(credential.id, Vec::new()).await;

        let report = fixture.state.health.check_many(vec![integration.id]).await;
        assert!(report.checked.is_empty());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].kind, ErrorKind::SecretDecryptFailed);
    }

    #[test]
    fn long_reasons_are_truncated_on_char_boundary() {
        let reason = "é".repeat(MAX_REASON_LEN);
        let truncated = truncate_reason(reason);
        assert!(truncated.len() <= MAX_REASON_LEN);
        assert!(truncated.chars().all(|c| c == 'é'));
    }
}
