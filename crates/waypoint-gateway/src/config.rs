//! Endpoint configuration shared by the gateway and indexer clients.

use std::time::Duration;

use url::Url;

/// Environment variable that overrides the configured bearer token.
const TOKEN_ENV: &str = "WAYPOINT_GATEWAY_TOKEN";

/// Where and how to reach one remote endpoint.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    pub base_url: Url,
    /// Per-request timeout. Polling cadence is the tracker's concern; this
    /// only bounds a single HTTP exchange.
    pub request_timeout: Duration,
    /// Optional bearer token sent with every request.
    pub auth_token: Option<String>,
}

impl EndpointConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            request_timeout: Duration::from_secs(10),
            auth_token: None,
        }
    }

    pub fn parse(base_url: &str) -> Result<Self, url::ParseError> {
        Ok(Self::new(Url::parse(base_url)?))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Apply the `WAYPOINT_GATEWAY_TOKEN` override, if set and non-empty.
    pub fn with_env_token(mut self) -> Self {
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            if !token.is_empty() {
                self.auth_token = Some(token);
            }
        }
        self
    }

    /// Resolve a path against the base URL.
    pub(crate) fn endpoint(&self, path: &str) -> Url {
        // Base URLs are validated at construction; a join can only fail on a
        // malformed path literal, which is a programming error here.
        self.base_url
            .join(path)
            .unwrap_or_else(|_| self.base_url.clone())
    }
}
