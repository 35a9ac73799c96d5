//! Integration type response types.

use serde::{Deserialize, Serialize};

use crate::service::IntegrationTypeEntry;

/// A registered integration type with its setup flag.
#[must_use]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationType {
    /// Type identifier, such as `github`.
    pub integration_type: String,
    /// Name of the plugin implementing the type.
    pub plugin_name: String,
    /// UI descriptor file, when the plugin ships one.
    pub ui_spec_file: Option<String>,
    /// Queue the plugin's describer jobs are routed to.
    pub describer_queue: Option<String>,
    /// Maximum concurrent provider calls the plugin accepts.
    pub max_concurrency: usize,
    /// Whether the type accepts new work.
    pub enabled: bool,
}

impl IntegrationType {
    pub fn from_entry(entry: IntegrationTypeEntry) -> Self {
        Self {
            integration_type: entry.integration_type.to_string(),
            plugin_name: entry.configuration.plugin_name,
            ui_spec_file: entry.configuration.ui_spec_file,
            describer_queue: entry.configuration.describer_queue,
            max_concurrency: entry.configuration.max_concurrency,
            enabled: entry.enabled,
        }
    }

    pub fn from_entries(entries: Vec<IntegrationTypeEntry>) -> Vec<Self> {
        entries.into_iter().map(Self::from_entry).collect()
    }
}
