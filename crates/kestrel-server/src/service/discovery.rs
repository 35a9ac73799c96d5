//! Discovery of integration candidates reachable through a configuration.
//!
//! Discovery never writes integration rows. The only write it may perform is
//! persisting a credential for a first-time raw configuration, and that
//! happens after every provider call has returned, so an abandoned request
//! leaves nothing behind.

use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use futures::{StreamExt, stream};
use kestrel_core::integration::{
    Annotations, DiscoveredIntegration, IntegrationProvider, IntegrationType, Labels,
};
use kestrel_core::vault::SecretConfig;
use kestrel_postgres::model::{
    INTEGRATION_DOCUMENT_LEN, INTEGRATION_TEXT_LEN, NewCredential, check_integration_columns,
};
use kestrel_postgres::types::{IntegrationConstraints, IntegrationState, to_string_map};
use uuid::Uuid;

use crate::service::SharedVault;
use crate::service::catalog::IntegrationCatalog;
use crate::service::health::probe;
use crate::service::secret::{decrypt_credential, encrypt_config};
use crate::service::store::SharedStore;
use crate::{Error, Result};

/// Tracing target for discovery operations.
const TRACING_TARGET: &str = "kestrel_server::discovery";

/// Where the configuration for a discovery comes from.
#[derive(Debug, Clone)]
pub enum DiscoverySource {
    /// A stored credential.
    Credential(Uuid),
    /// A configuration supplied for the first time, persisted on success.
    RawConfig {
        /// Provider configuration.
        config: SecretConfig,
        /// Metadata of the credential to create.
        metadata: BTreeMap<String, String>,
    },
}

/// A discovered target with its initial health verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredCandidate {
    /// Vendor-assigned identifier.
    pub provider_id: String,
    /// Human-readable name.
    pub name: String,
    /// Provider-assigned labels.
    pub labels: Labels,
    /// `ACTIVE` if the initial health check passed, `INACTIVE` otherwise.
    pub state: IntegrationState,
    /// Why the candidate was classified `INACTIVE`.
    pub health_reason: Option<String>,
}

/// A candidate the provider returned but discovery rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryFailure {
    /// Identifier of the rejected candidate, when it had one.
    pub provider_id: Option<String>,
    /// Why it was rejected.
    pub reason: String,
}

/// Result of one discovery.
#[derive(Debug, Clone)]
pub struct DiscoveryOutcome {
    /// Credential the candidates are reachable through.
    pub credential_id: Uuid,
    /// Resolved integration type.
    pub integration_type: IntegrationType,
    /// Accepted candidates in provider order.
    pub candidates: Vec<DiscoveredCandidate>,
    /// Rejected candidates.
    pub failures: Vec<DiscoveryFailure>,
}

/// Orchestrates decrypt, provider lookup, discovery, and initial health checks.
#[derive(Clone)]
pub struct DiscoveryEngine {
    store: SharedStore,
    vault: SharedVault,
    catalog: IntegrationCatalog,
    discovery_timeout: Duration,
    health_check_timeout: Duration,
    max_concurrency: usize,
}

impl DiscoveryEngine {
    /// Creates an engine.
    pub fn new(
        store: SharedStore,
        vault: SharedVault,
        catalog: IntegrationCatalog,
        discovery_timeout: Duration,
        health_check_timeout: Duration,
        max_concurrency: usize,
    ) -> Self {
        Self {
            store,
            vault,
            catalog,
            discovery_timeout,
            health_check_timeout,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Enumerates the targets reachable through `source`.
    #[tracing::instrument(skip_all, fields(integration_type = %integration_type))]
    pub async fn discover(
        &self,
        integration_type: &str,
        source: DiscoverySource,
    ) -> Result<DiscoveryOutcome> {
        let (credential_id, config, metadata) = match source {
            DiscoverySource::Credential(credential_id) => {
                let credential = self
                    .store
                    .find_credential(credential_id)
                    .await?
                    .ok_or_else(|| Error::credential_not_found(credential_id))?;

                if credential.integration_type != integration_type {
                    return Err(Error::credential_type_mismatch(
                        integration_type,
                        &credential.integration_type,
                    ));
                }

                let config = decrypt_credential(self.vault.as_ref(), &credential)?;
                (Some(credential_id), config, None)
            }
            DiscoverySource::RawConfig { config, metadata } => (None, config, Some(metadata)),
        };

        let (integration_type, provider) = self.catalog.resolve(integration_type).await?;
        let discovered = self.call_discover(provider.as_ref(), &config).await?;
        let (accepted, failures) = validate_candidates(discovered);
        let candidates = self.classify(provider.as_ref(), &config, accepted).await;

        let credential_id = match (credential_id, metadata) {
            (Some(credential_id), _) => credential_id,
            (None, metadata) => {
                let secret = encrypt_config(self.vault.as_ref(), &config)?;
                let credential = self
                    .store
                    .create_credential(NewCredential {
                        integration_type: integration_type.to_string(),
                        secret,
                        metadata: to_string_map(&metadata.unwrap_or_default()),
                    })
                    .await?;

                tracing::info!(
                    target: TRACING_TARGET,
                    credential_id = %credential.id,
                    "Credential created from raw configuration"
                );
                credential.id
            }
        };

        tracing::info!(
            target: TRACING_TARGET,
            credential_id = %credential_id,
            candidates = candidates.len(),
            rejected = failures.len(),
            "Discovery completed"
        );

        Ok(DiscoveryOutcome {
            credential_id,
            integration_type,
            candidates,
            failures,
        })
    }

    async fn call_discover(
        &self,
        provider: &dyn IntegrationProvider,
        config: &SecretConfig,
    ) -> Result<Vec<DiscoveredIntegration>> {
        let call = provider.discover_integrations(config);
        match tokio::time::timeout(self.discovery_timeout, call).await {
            Ok(Ok(discovered)) => Ok(discovered),
            Ok(Err(error)) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    kind = error.kind().as_ref(),
                    "Provider discovery failed"
                );
                Err(Error::provider_discovery_failed(format!(
                    "provider discovery failed: {error}"
                ))
                .with_source(error))
            }
            Err(_) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    timeout = ?self.discovery_timeout,
                    "Provider discovery timed out"
                );
                Err(Error::provider_discovery_failed(format!(
                    "provider discovery timed out after {}s",
                    self.discovery_timeout.as_secs()
                )))
            }
        }
    }

    /// Health-checks every candidate concurrently, preserving provider order.
    async fn classify(
        &self,
        provider: &dyn IntegrationProvider,
        config: &SecretConfig,
        candidates: Vec<DiscoveredIntegration>,
    ) -> Vec<DiscoveredCandidate> {
        let concurrency = self
            .max_concurrency
            .min(provider.configuration().max_concurrency)
            .max(1);
        let annotations = Annotations::new();
        let annotations = &annotations;

        stream::iter(candidates)
            .map(|candidate| async move {
                let outcome = probe(
                    provider,
                    config,
                    &candidate.provider_id,
                    &candidate.labels,
                    annotations,
                    self.health_check_timeout,
                )
                .await;

                DiscoveredCandidate {
                    state: IntegrationState::from_health(outcome.is_ok()),
                    health_reason: outcome.err().map(|e| e.message().to_owned()),
                    provider_id: candidate.provider_id,
                    name: candidate.name,
                    labels: candidate.labels,
                }
            })
            .buffered(concurrency)
            .collect()
            .await
    }
}

/// Drops candidates with an empty or repeated provider id, and those the
/// `integrations` table would refuse.
fn validate_candidates(
    discovered: Vec<DiscoveredIntegration>,
) -> (Vec<DiscoveredIntegration>, Vec<DiscoveryFailure>) {
    let mut seen = HashSet::new();
    let mut accepted = Vec::with_capacity(discovered.len());
    let mut failures = Vec::new();
    let no_annotations = serde_json::Value::Object(serde_json::Map::new());

    for candidate in discovered {
        if candidate.provider_id.trim().is_empty() {
            failures.push(DiscoveryFailure {
                provider_id: None,
                reason: "candidate has an empty provider id".to_owned(),
            });
            continue;
        }

        let labels = to_string_map(&candidate.labels);
        let violation = check_integration_columns(
            &candidate.provider_id,
            &candidate.name,
            &labels,
            &no_annotations,
        );

        if let Some(constraint) = violation {
            failures.push(DiscoveryFailure {
                reason: column_violation_reason(constraint),
                provider_id: Some(candidate.provider_id),
            });
        } else if !seen.insert(candidate.provider_id.clone()) {
            failures.push(DiscoveryFailure {
                reason: "candidate repeats a provider id".to_owned(),
                provider_id: Some(candidate.provider_id),
            });
        } else {
            accepted.push(candidate);
        }
    }

    (accepted, failures)
}

fn column_violation_reason(constraint: IntegrationConstraints) -> String {
    let (start, end) = (*INTEGRATION_TEXT_LEN.start(), *INTEGRATION_TEXT_LEN.end());
    match constraint {
        IntegrationConstraints::ProviderIdLength => {
            format!("candidate provider id must be {start} to {end} characters")
        }
        IntegrationConstraints::NameLength => {
            format!("candidate name must be {start} to {end} characters")
        }
        IntegrationConstraints::LabelsSize => format!(
            "candidate labels exceed {} characters",
            INTEGRATION_DOCUMENT_LEN.end()
        ),
        other => format!("candidate violates {other}"),
    }
}
