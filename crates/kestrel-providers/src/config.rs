//! HTTP client configuration shared by the vendor plugins.

use std::time::Duration;

/// Default timeout for vendor API requests: 30 seconds.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration of the HTTP client a plugin talks to its vendor with.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Timeout of a single vendor API request.
    pub timeout: Duration,
    /// User-Agent header sent with every request.
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: Self::default_user_agent(),
        }
    }
}

impl HttpClientConfig {
    fn default_user_agent() -> String {
        format!("kestrel/{}", env!("CARGO_PKG_VERSION"))
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Returns the effective timeout, using the default if zero.
    pub fn effective_timeout(&self) -> Duration {
        if self.timeout.is_zero() {
            DEFAULT_TIMEOUT
        } else {
            self.timeout
        }
    }

    /// Returns the effective user agent, using the default if empty.
    pub fn effective_user_agent(&self) -> String {
        if self.user_agent.is_empty() {
            Self::default_user_agent()
        } else {
            self.user_agent.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_and_empty_fall_back_to_defaults() {
        let config = HttpClientConfig::default()
            .with_timeout(Duration::ZERO)
            .with_user_agent("");

        assert_eq!(config.effective_timeout(), DEFAULT_TIMEOUT);
        assert!(config.effective_user_agent().starts_with("kestrel/"));
    }
}
