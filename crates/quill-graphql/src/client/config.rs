//! Configuration for the GraphQL client.

/// Configuration for the GraphQL client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// GraphQL endpoint for queries and mutations.
    pub endpoint: String,
    /// Endpoint for SSE subscriptions. Falls back to `endpoint` when empty.
    pub subscription_endpoint: String,
    /// Sent as `x-api-key` when non-empty.
    pub api_key: String,
    /// Request timeout in milliseconds.
    pub request_timeout_ms: u64,
    /// Maximum retries for failed requests.
    pub max_retries: u32,
    /// Base retry delay in milliseconds.
    pub retry_delay_ms: u64,
    /// A subscription that delivers no payload for this long yields a
    /// timeout. Keep-alive comments do not count. Zero disables the check.
    pub heartbeat_timeout_secs: u64,
    /// Enable request logging.
    pub enable_logging: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            endpoint: String::new(),
            subscription_endpoint: String::new(),
            api_key: String::new(),
            request_timeout_ms: 30000,
            max_retries: 2,
            retry_delay_ms: 1000,
            heartbeat_timeout_secs: 0,
            enable_logging: false,
        }
    }
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn subscription_url(&self) -> &str {
        if self.subscription_endpoint.is_empty() {
            &self.endpoint
        } else {
            &self.subscription_endpoint
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.retry_delay_ms, 1000);
        assert_eq!(config.request_timeout_ms, 30000);
        assert_eq!(config.heartbeat_timeout_secs, 0);
        assert!(!config.enable_logging);
        assert_eq!(config.api_key, "");
    }

    #[test]
    fn test_subscription_url_falls_back_to_endpoint() {
        let config = ClientConfig::new("https://api.example.com/graphql");
        assert_eq!(config.subscription_url(), "https://api.example.com/graphql");

        let config = ClientConfig {
            subscription_endpoint: "https://api.example.com/graphql/stream".into(),
            ..config
        };
        assert_eq!(config.subscription_url(), "https://api.example.com/graphql/stream");
    }

    #[test]
    fn test_partial_override() {
        let config = ClientConfig {
            max_retries: 10,
            ..Default::default()
        }
        .with_api_key("da2-secret");
        assert_eq!(config.max_retries, 10);
        assert_eq!(config.retry_delay_ms, 1000);
        assert_eq!(config.api_key, "da2-secret");
    }
}
