//! The pluggable per-provider capability contract.
//!
//! Every vendor plugin implements [`IntegrationProvider`]. Plugins are keyed by
//! [`IntegrationType`] in an [`IntegrationTypeRegistry`] that is assembled once
//! at startup and never mutated afterwards.

mod integration_type;
mod provider;
mod registry;

use std::collections::BTreeMap;

pub use integration_type::{IntegrationType, ParseIntegrationTypeError};
pub use provider::{DiscoveredIntegration, IntegrationConfiguration, IntegrationProvider};
pub use registry::{IntegrationTypeRegistry, IntegrationTypeRegistryBuilder};

/// Provider-assigned key/value labels of an integration.
pub type Labels = BTreeMap<String, String>;

/// Free-form key/value annotations of an integration.
pub type Annotations = BTreeMap<String, String>;

/// Annotation key holding the reason of the last failed health check.
pub const HEALTH_REASON_ANNOTATION: &str = "health-reason";
