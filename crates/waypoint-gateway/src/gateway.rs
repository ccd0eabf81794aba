//! HTTP client for the transaction-submission gateway and its challenge
//! endpoint.
//!
//! Status-code interpretation lives here and nowhere else. Submission is a
//! single call with no internal retry: a retried submission could
//! double-apply a non-idempotent operation, so retry decisions belong to
//! the caller, guided by the error class.

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

use waypoint_core::{
    ActionDescriptor, AuthFailure, AuthorizationChallenge, ChallengeProvider, GatewayError,
    LedgerGateway, OperationRequest, SubmissionError, TransactionHandle, TransactionStatus,
    UserId,
};

use crate::config::EndpointConfig;
use crate::types::{
    ChallengeBody, ChallengeResponse, ErrorBody, SubmitBody, SubmitResponse,
    TransactionStatusResponse,
};

/// Reqwest-backed implementation of [`LedgerGateway`] and
/// [`ChallengeProvider`]. Cheap to clone; safe for concurrent use by any
/// number of in-flight runs.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    config: EndpointConfig,
}

impl HttpGateway {
    pub fn new(config: EndpointConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .expect("failed to build HTTP client");
        Self { client, config }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut request = self.client.request(method, self.config.endpoint(path));
        if let Some(token) = &self.config.auth_token {
            request = request.bearer_auth(token);
        }
        request
    }
}

/// Read an error body, tolerating gateways that return plain text.
async fn error_body(response: reqwest::Response) -> ErrorBody {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    serde_json::from_str(&text).unwrap_or(ErrorBody {
        error_code: format!("http_{}", status.as_u16()),
        message: text,
    })
}

#[async_trait]
impl LedgerGateway for HttpGateway {
    async fn submit_operation(
        &self,
        request: &OperationRequest,
        challenge: AuthorizationChallenge,
    ) -> Result<TransactionHandle, SubmissionError> {
        let challenge_id = challenge.challenge_id.clone();
        let body = SubmitBody {
            kind: request.kind.wire_name(),
            target: request.target.as_str(),
            payload: &request.payload,
            actor_id: request.actor.as_str(),
            challenge_id: &challenge_id,
            proof: challenge.into_proof(),
        };

        let response = self
            .request(reqwest::Method::POST, "operations")
            .json(&body)
            .send()
            .await
            .map_err(|err| SubmissionError::Transport {
                message: err.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            // An unreadable success body means the response was lost, not
            // that the request was refused.
            let accepted: SubmitResponse =
                response
                    .json()
                    .await
                    .map_err(|err| SubmissionError::Transport {
                        message: format!("unreadable submission response: {}", err),
                    })?;
            debug!(tx = %accepted.transaction_id, kind = %request.kind, "operation accepted");
            return Ok(TransactionHandle::new(accepted.transaction_id));
        }
        if status.is_client_error() {
            let body = error_body(response).await;
            return Err(SubmissionError::Rejected {
                code: body.error_code,
                message: body.message,
            });
        }
        // 5xx: the gateway failed before accepting the operation.
        Err(SubmissionError::Transport {
            message: format!("gateway returned {}", status),
        })
    }

    async fn transaction_status(
        &self,
        tx: &TransactionHandle,
    ) -> Result<TransactionStatus, GatewayError> {
        let response = self
            .request(
                reqwest::Method::GET,
                &format!("transactions/{}", tx.as_str()),
            )
            .send()
            .await
            .map_err(|err| GatewayError::Transport {
                message: err.to_string(),
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = error_body(response).await;
            return Err(GatewayError::Unauthorized {
                message: body.message,
            });
        }
        if !status.is_success() {
            return Err(GatewayError::Transport {
                message: format!("gateway returned {}", status),
            });
        }
        let parsed: TransactionStatusResponse =
            response
                .json()
                .await
                .map_err(|err| GatewayError::InvalidResponse {
                    message: err.to_string(),
                })?;
        parsed.into_status()
    }
}

/// Map the authorization service's error codes onto the failure taxonomy.
fn auth_failure(body: ErrorBody) -> AuthFailure {
    match body.error_code.as_str() {
        "wrong_secret" => AuthFailure::WrongSecret,
        "factor_expired" => AuthFailure::FactorExpired,
        "factor_locked" => AuthFailure::FactorLocked,
        "no_factor" | "no_factor_configured" => AuthFailure::NoFactorConfigured,
        other => AuthFailure::Unavailable {
            message: format!("{}: {}", other, body.message),
        },
    }
}

#[async_trait]
impl ChallengeProvider for HttpGateway {
    async fn obtain_challenge(
        &self,
        user: &UserId,
        action: &ActionDescriptor,
    ) -> Result<AuthorizationChallenge, AuthFailure> {
        let body = ChallengeBody {
            user_id: user.as_str(),
            kind: action.kind.wire_name(),
            label: &action.label,
        };

        let response = self
            .request(reqwest::Method::POST, "challenges")
            .json(&body)
            .send()
            .await
            .map_err(|err| AuthFailure::Unavailable {
                message: err.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            let issued: ChallengeResponse =
                response.json().await.map_err(|err| AuthFailure::Unavailable {
                    message: format!("unreadable challenge response: {}", err),
                })?;
            return Ok(AuthorizationChallenge::new(issued.challenge_id, issued.proof));
        }
        if status.is_client_error() {
            return Err(auth_failure(error_body(response).await));
        }
        Err(AuthFailure::Unavailable {
            message: format!("authorization service returned {}", status),
        })
    }
}
