//! Liveness handler.

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;

use crate::extract::Json;
use crate::handler::response::MonitorStatus;
use crate::service::ServiceState;
use crate::service::store::SharedStore;

/// Tracing target for monitor operations.
const TRACING_TARGET: &str = "kestrel_server::handler::monitors";

/// Reports whether the server and its storage backend are reachable.
#[tracing::instrument(skip_all)]
async fn health_status(
    State(store): State<SharedStore>,
) -> (StatusCode, Json<MonitorStatus>) {
    let is_healthy = match store.list_integration_type_setups().await {
        Ok(_) => true,
        Err(error) => {
            tracing::warn!(
                target: TRACING_TARGET,
                error = %error,
                "Storage backend is unreachable"
            );
            false
        }
    };

    let status_code = if is_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(MonitorStatus::new(is_healthy)))
}

/// Returns a [`Router`] with all health monitoring routes.
pub fn routes() -> Router<ServiceState> {
    Router::new().route("/health/", get(health_status))
}
