//! Credential management handlers.
//!
//! Credentials are created implicitly by discovery with a raw provider
//! configuration. These handlers read, rotate, and remove them. No response
//! ever carries the stored secret.

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use kestrel_postgres::types::OffsetPagination;

use crate::extract::{Json, Path, Query, ValidateJson};
use crate::handler::request::{CredentialPathParams, ListCredentialsQuery, UpdateCredential};
use crate::handler::response::{Credential, CredentialDeleted, CredentialUpdated, Page};
use crate::handler::{ErrorKind, Result};
use crate::service::store::SharedStore;
use crate::service::{Reconciler, ServiceState};

/// Tracing target for credential operations.
const TRACING_TARGET: &str = "kestrel_server::handler::credentials";

/// Lists live credentials.
#[tracing::instrument(skip_all, fields(integration_type = ?query.integration_type))]
async fn list_credentials(
    State(store): State<SharedStore>,
    Query(query): Query<ListCredentialsQuery>,
) -> Result<(StatusCode, Json<Page<Credential>>)> {
    let pagination = OffsetPagination::from(query.pagination());
    let credentials = store.list_credentials(query.filter(), pagination).await?;

    tracing::debug!(
        target: TRACING_TARGET,
        credential_count = credentials.len(),
        "Credentials listed"
    );

    let page = Page::new(credentials, pagination).map(Credential::from_model);
    Ok((StatusCode::OK, Json(page)))
}

/// Reads one credential, without its secret.
#[tracing::instrument(skip_all, fields(credential_id = %path_params.credential_id))]
async fn read_credential(
    State(store): State<SharedStore>,
    Path(path_params): Path<CredentialPathParams>,
) -> Result<(StatusCode, Json<Credential>)> {
    let credential = store
        .find_credential(path_params.credential_id)
        .await?
        .ok_or_else(|| crate::Error::credential_not_found(path_params.credential_id))?;

    Ok((StatusCode::OK, Json(Credential::from_model(credential))))
}

/// Replaces the configuration and/or metadata of a credential.
///
/// A new configuration triggers a re-check of every integration of the
/// credential; the results are returned alongside the credential.
#[tracing::instrument(skip_all, fields(credential_id = %path_params.credential_id))]
async fn update_credential(
    State(reconciler): State<Reconciler>,
    Path(path_params): Path<CredentialPathParams>,
    ValidateJson(request): ValidateJson<UpdateCredential>,
) -> Result<(StatusCode, Json<CredentialUpdated>)> {
    if request.is_empty() {
        return Err(ErrorKind::BadRequest
            .with_message("At least one of credentials or metadata is required"));
    }

    let outcome = reconciler
        .update_credential(path_params.credential_id, request.into_changes())
        .await?;

    tracing::info!(
        target: TRACING_TARGET,
        rechecked = outcome.health.checked.len(),
        failed = outcome.health.failures.len(),
        "Credential updated"
    );

    Ok((StatusCode::OK, Json(CredentialUpdated::from_outcome(outcome))))
}

/// Deletes a credential and archives every integration it owns.
#[tracing::instrument(skip_all, fields(credential_id = %path_params.credential_id))]
async fn delete_credential(
    State(reconciler): State<Reconciler>,
    Path(path_params): Path<CredentialPathParams>,
) -> Result<(StatusCode, Json<CredentialDeleted>)> {
    let archived_integrations = reconciler
        .delete_credential(path_params.credential_id)
        .await?;

    tracing::info!(
        target: TRACING_TARGET,
        archived_integrations,
        "Credential deleted"
    );

    Ok((
        StatusCode::OK,
        Json(CredentialDeleted {
            archived_integrations,
        }),
    ))
}

/// Returns a [`Router`] with all credential routes.
pub fn routes() -> Router<ServiceState> {
    Router::new()
        .route("/credentials/", get(list_credentials))
        .route(
            "/credentials/{credentialId}/",
            get(read_credential)
                .put(update_credential)
                .delete(delete_credential),
        )
}

#[cfg(test)]
mod tests {
    use kestrel_postgres::types::IntegrationState;
    use kestrel_test::{MockHealth, MockProvider};
    use serde_json::json;
    use uuid::Uuid;

    use super::*;
    use crate::handler::test::create_test_server;
    use crate::service::testing::Fixture;

    #[tokio::test]
    async fn read_never_returns_secret() -> anyhow::Result<()> {
        let fixture = Fixture::new("github", MockProvider::new("github"));
        let credential = fixture.credential("github").await;
        let server = create_test_server(&fixture)?;

        let response = server
            .get(&format!("/credentials/{}/", credential.id))
            .await;
        response.assert_status_ok();
        assert!(!response.text().contains("fixture-token"));

        let body = response.json::<Credential>();
        assert_eq!(body.credential_id, credential.id);
        assert_eq!(body.integration_type, "github");
        Ok(())
    }

    #[tokio::test]
    async fn read_missing_credential_is_not_found() -> anyhow::Result<()> {
        let fixture = Fixture::new("github", MockProvider::new("github"));
        let server = create_test_server(&fixture)?;

        let response = server.get(&format!("/credentials/{}/", Uuid::new_v4())).await;
        response.assert_status(StatusCode::NOT_FOUND);
        Ok(())
    }

    #[tokio::test]
    async fn list_filters_by_type() -> anyhow::Result<()> {
        let fixture = Fixture::new("github", MockProvider::new("github"));
        fixture.credential("github").await;
        fixture.credential("github").await;
        fixture.credential("cloudflare").await;
        let server = create_test_server(&fixture)?;

        let response = server
            .get("/credentials/")
            .add_query_param("integrationType", "github")
            .await;
        response.assert_status_ok();

        let page = response.json::<Page<Credential>>();
        assert_eq!(page.items.len(), 2);
        assert!(page.items.iter().all(|c| c.integration_type == "github"));
        Ok(())
    }

    #[tokio::test]
    async fn delete_archives_owned_integrations() -> anyhow::Result<()> {
        let fixture = Fixture::new("github", MockProvider::new("github"));
        let credential = fixture.credential("github").await;
        fixture
            .integration(&credential, "acme", IntegrationState::Active)
            .await;
        fixture
            .integration(&credential, "globex", IntegrationState::Inactive)
            .await;
        let server = create_test_server(&fixture)?;

        let response = server
            .delete(&format!("/credentials/{}/", credential.id))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<CredentialDeleted>().archived_integrations, 2);

        let integrations = fixture.store.all_integrations().await;
        assert!(
            integrations
                .iter()
                .all(|i| i.state == IntegrationState::Archived)
        );

        let response = server
            .get(&format!("/credentials/{}/", credential.id))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
        Ok(())
    }

    #[tokio::test]
    async fn update_rejects_empty_request() -> anyhow::Result<()> {
        let fixture = Fixture::new("github", MockProvider::new("github"));
        let credential = fixture.credential("github").await;
        let server = create_test_server(&fixture)?;

        let response = server
            .put(&format!("/credentials/{}/", credential.id))
            .json(&json!({}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn update_config_rechecks_integrations() -> anyhow::Result<()> {
        let provider = MockProvider::new("github").with_default_health(MockHealth::Healthy);
        let fixture = Fixture::new("github", provider);
        let credential = fixture.credential("github").await;
        fixture
            .integration(&credential, "acme", IntegrationState::Inactive)
            .await;
        let server = create_test_server(&fixture)?;

        let response = server
            .put(&format!("/credentials/{}/", credential.id))
            .json(&json!({
                "credentials": {"token": "rotated-token"},
                "metadata": {"owner": "platform"},
            }))
            .await;
        response.assert_status_ok();
        assert!(!response.text().contains("rotated-token"));

        let body = response.json::<CredentialUpdated>();
        assert_eq!(
            body.credential.metadata.get("owner").map(String::as_str),
            Some("platform")
        );
        assert_eq!(body.health.checked.len(), 1);
        assert_eq!(body.health.checked[0].state, IntegrationState::Active);
        Ok(())
    }
}
