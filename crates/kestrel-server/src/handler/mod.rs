//! All `axum::`[`Router`]s with related `axum::`[`Handler`]s.
//!
//! # Usage Example
//!
//! ```rust,ignore
//! use kestrel_server::handler::routes;
//! use kestrel_server::middleware::{RouterObservabilityExt, RouterRecoveryExt};
//!
//! let router = routes()
//!     .with_state(state)
//!     .with_default_recovery()
//!     .with_observability();
//! ```
//!
//! [`Router`]: axum::routing::Router
//! [`Handler`]: axum::handler::Handler

mod credentials;
mod error;
mod integration_types;
mod integrations;
mod monitors;
pub mod request;
pub mod response;

use axum::Router;
use axum::response::{IntoResponse, Response};

pub use crate::handler::error::{Error, ErrorKind, Result};
use crate::service::ServiceState;

#[inline]
async fn handler() -> Response {
    ErrorKind::NotFound.into_response()
}

/// Returns a [`Router`] with all routes.
pub fn routes() -> Router<ServiceState> {
    Router::new()
        .merge(credentials::routes())
        .merge(integrations::routes())
        .merge(integration_types::routes())
        .merge(monitors::routes())
        .fallback(handler)
}
