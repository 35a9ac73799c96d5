//! Integration type catalog handlers.

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, put};

use crate::extract::{Json, Path};
use crate::handler::Result;
use crate::handler::request::{IntegrationTypePathParams, UpdateIntegrationTypeSetup};
use crate::handler::response::IntegrationType;
use crate::service::{IntegrationCatalog, ServiceState};

/// Tracing target for integration type operations.
const TRACING_TARGET: &str = "kestrel_server::handler::integration_types";

/// Lists every registered integration type with its setup flag.
#[tracing::instrument(skip_all)]
async fn list_integration_types(
    State(catalog): State<IntegrationCatalog>,
) -> Result<(StatusCode, Json<Vec<IntegrationType>>)> {
    let entries = catalog.list().await?;
    Ok((StatusCode::OK, Json(IntegrationType::from_entries(entries))))
}

/// Enables or disables an integration type.
///
/// A disabled type is rejected by discovery and health checks exactly like
/// an unregistered one.
#[tracing::instrument(skip_all, fields(integration_type = %path_params.integration_type))]
async fn update_integration_type_setup(
    State(catalog): State<IntegrationCatalog>,
    Path(path_params): Path<IntegrationTypePathParams>,
    Json(request): Json<UpdateIntegrationTypeSetup>,
) -> Result<(StatusCode, Json<IntegrationType>)> {
    let entry = catalog
        .set_enabled(&path_params.integration_type, request.enabled)
        .await?;

    tracing::info!(
        target: TRACING_TARGET,
        enabled = entry.enabled,
        "Integration type setup updated"
    );

    Ok((StatusCode::OK, Json(IntegrationType::from_entry(entry))))
}

/// Returns a [`Router`] with all integration type routes.
pub fn routes() -> Router<ServiceState> {
    Router::new()
        .route("/integration-types/", get(list_integration_types))
        .route(
            "/integration-types/{integrationType}/setup/",
            put(update_integration_type_setup),
        )
}

#[cfg(test)]
mod tests {
    use kestrel_core::integration::IntegrationConfiguration;
    use kestrel_test::MockProvider;
    use serde_json::json;

    use super::*;
    use crate::handler::test::create_test_server;
    use crate::service::testing::Fixture;

    #[tokio::test]
    async fn lists_registered_types() -> anyhow::Result<()> {
        let mut configuration = IntegrationConfiguration::new("kestrel-github");
        configuration.max_concurrency = 4;
        let provider = MockProvider::new("kestrel-github").with_configuration(configuration);
        let fixture = Fixture::new("github", provider);
        let server = create_test_server(&fixture)?;

        let response = server.get("/integration-types/").await;
        response.assert_status_ok();

        let types = response.json::<Vec<IntegrationType>>();
        assert_eq!(types.len(), 1);
        assert_eq!(types[0].integration_type, "github");
        assert_eq!(types[0].plugin_name, "kestrel-github");
        assert_eq!(types[0].max_concurrency, 4);
        assert!(types[0].enabled);
        Ok(())
    }

    #[tokio::test]
    async fn disabled_type_rejects_discovery() -> anyhow::Result<()> {
        let fixture = Fixture::new("github", MockProvider::new("github"));
        let server = create_test_server(&fixture)?;

        let response = server
            .put("/integration-types/github/setup/")
            .json(&json!({"enabled": false}))
            .await;
        response.assert_status_ok();
        assert!(!response.json::<IntegrationType>().enabled);

        let response = server
            .post("/integrations/discover/")
            .json(&json!({
                "integrationType": "github",
                "credentials": {"token": "ghp_example"},
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(fixture.calls.discover(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn unknown_type_setup_is_rejected() -> anyhow::Result<()> {
        let fixture = Fixture::new("github", MockProvider::new("github"));
        let server = create_test_server(&fixture)?;

        let response = server
            .put("/integration-types/gitlab/setup/")
            .json(&json!({"enabled": true}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        Ok(())
    }
}
