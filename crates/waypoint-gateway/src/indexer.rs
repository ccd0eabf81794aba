//! HTTP client for the read-side indexer's probe endpoint.

use async_trait::async_trait;

use waypoint_core::{EntityProbe, Indexer, IndexerError};

use crate::config::EndpointConfig;
use crate::types::{ProbeBody, ProbeResponse};

/// Reqwest-backed implementation of [`Indexer`]. The probe's condition is
/// forwarded verbatim; the indexer service decides how to evaluate it.
#[derive(Debug, Clone)]
pub struct HttpIndexer {
    client: reqwest::Client,
    config: EndpointConfig,
}

impl HttpIndexer {
    pub fn new(config: EndpointConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .expect("failed to build HTTP client");
        Self { client, config }
    }
}

#[async_trait]
impl Indexer for HttpIndexer {
    async fn probe(&self, probe: &EntityProbe) -> Result<bool, IndexerError> {
        let body = ProbeBody {
            entity: &probe.entity,
            condition: &probe.condition,
        };

        let mut request = self.client.post(self.config.endpoint("query")).json(&body);
        if let Some(token) = &self.config.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|err| IndexerError::Transport {
            message: err.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(IndexerError::Transport {
                message: format!("indexer returned {}", status),
            });
        }
        let parsed: ProbeResponse =
            response
                .json()
                .await
                .map_err(|err| IndexerError::InvalidResponse {
                    message: err.to_string(),
                })?;
        Ok(parsed.satisfied)
    }
}
