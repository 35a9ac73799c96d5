//! Integration discovery, lifecycle, and health check handlers.
//!
//! Discovery enumerates what a credential can reach and classifies each
//! candidate with an initial health check, without persisting integrations.
//! Adding a selection of candidates persists them idempotently. The remaining
//! handlers drive the lifecycle of persisted integrations.

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use jiff::SignedDuration;
use kestrel_postgres::types::OffsetPagination;
use validator::Validate;

use crate::extract::{Json, Path, Query, ValidateJson};
use crate::handler::Result;
use crate::handler::request::{
    AddIntegrations, CheckIntegrations, DiscoverIntegrations, IntegrationPathParams,
    ListIntegrationsQuery, SeedSampleIntegrations, UnarchiveIntegration,
};
use crate::handler::response::{
    Discovered, HealthReport, Integration, Page, ResourceTypes, SamplesPurged, SamplesSeeded,
};
use crate::service::store::SharedStore;
use crate::service::{DiscoveryEngine, HealthCheckEngine, Reconciler, ServiceState};

/// Tracing target for integration operations.
const TRACING_TARGET: &str = "kestrel_server::handler::integrations";

/// Discovers the targets reachable by a credential.
///
/// With raw `credentials` the configuration is encrypted and stored as a new
/// credential once the provider accepts it.
#[tracing::instrument(skip_all, fields(integration_type = %request.integration_type))]
async fn discover_integrations(
    State(discovery): State<DiscoveryEngine>,
    ValidateJson(request): ValidateJson<DiscoverIntegrations>,
) -> Result<(StatusCode, Json<Discovered>)> {
    let integration_type = request.integration_type.clone();
    let source = request.into_source()?;

    let outcome = discovery.discover(&integration_type, source).await?;

    tracing::info!(
        target: TRACING_TARGET,
        credential_id = %outcome.credential_id,
        candidates = outcome.candidates.len(),
        failures = outcome.failures.len(),
        "Integrations discovered"
    );

    Ok((StatusCode::OK, Json(Discovered::from_outcome(outcome))))
}

/// Persists a selection of discovered integrations.
///
/// Re-runs discovery with the stored credential and persists the selected
/// candidates. Candidates that already exist are left untouched.
#[tracing::instrument(
    skip_all,
    fields(
        credential_id = %request.credential_id,
        integration_type = %request.integration_type,
    )
)]
async fn add_integrations(
    State(reconciler): State<Reconciler>,
    ValidateJson(request): ValidateJson<AddIntegrations>,
) -> Result<StatusCode> {
    let outcome = reconciler
        .add(
            request.credential_id,
            &request.integration_type,
            &request.provider_ids,
        )
        .await?;

    if !outcome.missing.is_empty() {
        tracing::warn!(
            target: TRACING_TARGET,
            missing = ?outcome.missing,
            "Selected provider ids were not discovered"
        );
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Lists live integrations.
#[tracing::instrument(skip_all)]
async fn list_integrations(
    State(store): State<SharedStore>,
    Query(query): Query<ListIntegrationsQuery>,
) -> Result<(StatusCode, Json<Page<Integration>>)> {
    let pagination = OffsetPagination::from(query.pagination());
    let integrations = store.list_integrations(query.filter(), pagination).await?;

    tracing::debug!(
        target: TRACING_TARGET,
        integration_count = integrations.len(),
        "Integrations listed"
    );

    let page = Page::new(integrations, pagination).map(Integration::from_model);
    Ok((StatusCode::OK, Json(page)))
}

/// Health-checks every integration not checked recently.
///
/// Archived and sample integrations are skipped.
#[tracing::instrument(skip_all)]
async fn check_integrations(
    State(health): State<HealthCheckEngine>,
    request: Option<Json<CheckIntegrations>>,
) -> Result<(StatusCode, Json<HealthReport>)> {
    let Json(request) = request.unwrap_or_default();
    request.validate()?;

    let older_than = i64::try_from(request.older_than_secs).unwrap_or(i64::MAX);
    let report = health
        .check_due(SignedDuration::from_secs(older_than), request.limit())
        .await?;

    Ok((StatusCode::OK, Json(HealthReport::from_report(report))))
}

/// Reads one integration.
#[tracing::instrument(skip_all, fields(integration_id = %path_params.integration_id))]
async fn read_integration(
    State(store): State<SharedStore>,
    Path(path_params): Path<IntegrationPathParams>,
) -> Result<(StatusCode, Json<Integration>)> {
    let integration = store
        .find_integration(path_params.integration_id)
        .await?
        .ok_or_else(|| crate::Error::integration_not_found(path_params.integration_id))?;

    Ok((StatusCode::OK, Json(Integration::from_model(integration))))
}

/// Deletes one integration.
#[tracing::instrument(skip_all, fields(integration_id = %path_params.integration_id))]
async fn delete_integration(
    State(reconciler): State<Reconciler>,
    Path(path_params): Path<IntegrationPathParams>,
) -> Result<StatusCode> {
    reconciler
        .delete_integration(path_params.integration_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Health-checks one integration and returns its refreshed state.
#[tracing::instrument(skip_all, fields(integration_id = %path_params.integration_id))]
async fn check_integration(
    State(health): State<HealthCheckEngine>,
    Path(path_params): Path<IntegrationPathParams>,
) -> Result<(StatusCode, Json<Integration>)> {
    let integration = health.check(path_params.integration_id).await?;

    tracing::debug!(
        target: TRACING_TARGET,
        state = %integration.state,
        "Integration checked"
    );

    Ok((StatusCode::OK, Json(Integration::from_model(integration))))
}

/// Withdraws an integration from service.
#[tracing::instrument(skip_all, fields(integration_id = %path_params.integration_id))]
async fn archive_integration(
    State(reconciler): State<Reconciler>,
    Path(path_params): Path<IntegrationPathParams>,
) -> Result<(StatusCode, Json<Integration>)> {
    let integration = reconciler.archive(path_params.integration_id).await?;
    Ok((StatusCode::OK, Json(Integration::from_model(integration))))
}

/// Restores an archived integration, optionally under another credential.
#[tracing::instrument(skip_all, fields(integration_id = %path_params.integration_id))]
async fn unarchive_integration(
    State(reconciler): State<Reconciler>,
    Path(path_params): Path<IntegrationPathParams>,
    request: Option<Json<UnarchiveIntegration>>,
) -> Result<(StatusCode, Json<Integration>)> {
    let Json(request) = request.unwrap_or_default();

    let integration = reconciler
        .unarchive(path_params.integration_id, request.credential_id)
        .await?;

    Ok((StatusCode::OK, Json(Integration::from_model(integration))))
}

/// Lists the resource types collectable from an integration.
#[tracing::instrument(skip_all, fields(integration_id = %path_params.integration_id))]
async fn resource_types(
    State(reconciler): State<Reconciler>,
    Path(path_params): Path<IntegrationPathParams>,
) -> Result<(StatusCode, Json<ResourceTypes>)> {
    let resource_types = reconciler
        .resource_types(path_params.integration_id)
        .await?;

    Ok((StatusCode::OK, Json(ResourceTypes { resource_types })))
}

/// Seeds sample integrations under an existing credential.
#[tracing::instrument(skip_all, fields(credential_id = %request.credential_id))]
async fn seed_samples(
    State(reconciler): State<Reconciler>,
    ValidateJson(request): ValidateJson<SeedSampleIntegrations>,
) -> Result<(StatusCode, Json<SamplesSeeded>)> {
    let samples = request.integrations.into_iter().map(Into::into).collect();
    let outcome = reconciler.seed_samples(request.credential_id, samples).await?;

    let response = SamplesSeeded {
        created: Integration::from_models(outcome.created),
        existing: outcome.existing,
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// Removes every sample integration.
#[tracing::instrument(skip_all)]
async fn purge_samples(
    State(reconciler): State<Reconciler>,
) -> Result<(StatusCode, Json<SamplesPurged>)> {
    let purged = reconciler.purge_samples().await?;
    Ok((StatusCode::OK, Json(SamplesPurged { purged })))
}

/// Returns a [`Router`] with all integration routes.
pub fn routes() -> Router<ServiceState> {
    Router::new()
        .route(
            "/integrations/",
            post(add_integrations).get(list_integrations),
        )
        .route("/integrations/discover/", post(discover_integrations))
        .route("/integrations/healthcheck/", post(check_integrations))
        .route(
            "/integrations/samples/",
            post(seed_samples).delete(purge_samples),
        )
        .route(
            "/integrations/{integrationId}/",
            get(read_integration).delete(delete_integration),
        )
        .route(
            "/integrations/{integrationId}/healthcheck/",
            post(check_integration),
        )
        .route(
            "/integrations/{integrationId}/archive/",
            post(archive_integration),
        )
        .route(
            "/integrations/{integrationId}/unarchive/",
            post(unarchive_integration),
        )
        .route(
            "/integrations/{integrationId}/resource-types/",
            get(resource_types),
        )
}
