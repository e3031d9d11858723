//! Public configuration for the narration HTTP client.

use std::time::Duration;

/// Configuration for [`HttpNarrationBackend`](crate::HttpNarrationBackend).
///
/// Use the builder pattern methods to customize the client configuration.
///
/// # Example
///
/// ```
/// use dictee_narration::NarrationClientConfig;
/// use std::time::Duration;
///
/// let config = NarrationClientConfig::new()
///     .with_base_url("http://192.168.1.20:3001")
///     .with_timeout(Duration::from_secs(30));
/// ```
#[derive(Debug, Clone)]
pub struct NarrationClientConfig {
    /// Base URL of the narration server, without the `/api` suffix
    pub(crate) base_url: String,
    /// User agent string for HTTP requests
    pub(crate) user_agent: String,
    /// Request timeout
    pub(crate) timeout: Duration,
    /// Maximum number of retry attempts for transient errors
    pub(crate) max_retries: u8,
    /// Base delay for exponential backoff
    pub(crate) retry_base_delay: Duration,
}

impl Default for NarrationClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001".to_string(),
            user_agent: concat!("dictee-narration/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: Duration::from_secs(60),
            max_retries: 1,
            retry_base_delay: Duration::from_millis(500),
        }
    }
}

impl NarrationClientConfig {
    /// Create a new configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the server base URL. A trailing slash is ignored.
    ///
    /// Defaults to `http://localhost:3001`.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        let url: String = url.into();
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the request timeout.
    ///
    /// Defaults to 60 seconds; synthesis of a full text is slow on CPU.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the maximum number of retry attempts for 5xx and transport
    /// errors. Timeouts are never retried.
    ///
    /// Defaults to 1 retry.
    #[must_use]
    pub const fn with_max_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the base delay for exponential backoff retries.
    ///
    /// Defaults to 500ms.
    #[must_use]
    pub const fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}
