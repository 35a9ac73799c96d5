use std::fmt;

use serde::Deserialize;

/// Configuration schema of the `cloudflare` integration type.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CloudflareConfig {
    /// API token with at least account read permission.
    pub api_token: String,
}

impl fmt::Debug for CloudflareConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudflareConfig")
            .field("api_token", &"[REDACTED]")
            .finish()
    }
}
