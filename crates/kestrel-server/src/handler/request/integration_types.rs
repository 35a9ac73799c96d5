//! Integration type request types.

use serde::{Deserialize, Serialize};

/// Request payload for enabling or disabling an integration type.
#[must_use]
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateIntegrationTypeSetup {
    /// Whether the type accepts discovery and health checks.
    pub enabled: bool,
}
