//! Collaborator traits the tracker drives: the authorization service, the
//! ledger gateway, and the indexer.
//!
//! Implementations must tolerate concurrent calls from multiple in-flight
//! runs; the tracker holds them as `Arc<dyn …>` and never serializes access
//! on its side.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{AuthFailure, GatewayError, IndexerError, SubmissionError};
use crate::model::{
    AuthorizationChallenge, BlockRef, OperationKind, OperationRequest, TransactionHandle, UserId,
};

/// What the user is being asked to authorize. The label is for display in
/// the authorization prompt only; it carries no policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDescriptor {
    pub kind: OperationKind,
    pub label: String,
}

impl ActionDescriptor {
    pub fn new(kind: OperationKind, label: impl Into<String>) -> Self {
        Self {
            kind,
            label: label.into(),
        }
    }

    /// Default descriptor for a request: "<kind label> on <target>".
    pub fn for_request(request: &OperationRequest) -> Self {
        Self::new(
            request.kind,
            format!("{} on {}", request.kind.label(), request.target),
        )
    }
}

/// Mined status of a submitted transaction, as reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
    Pending,
    Mined { block: BlockRef },
    Reverted { reason: Option<String> },
    /// The transaction is no longer known to the network (replaced, or
    /// evicted from the pending pool).
    Dropped,
}

/// A "has this entity reached state X" predicate evaluated against the
/// indexer. The condition is opaque to the tracker; the concrete indexer
/// binding interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityProbe {
    /// Entity the probe inspects, e.g. a token address or holder id.
    pub entity: String,
    /// Expected post-state, in whatever shape the indexer binding expects.
    pub condition: serde_json::Value,
}

impl EntityProbe {
    pub fn new(entity: impl Into<String>, condition: serde_json::Value) -> Self {
        Self {
            entity: entity.into(),
            condition,
        }
    }
}

/// Obtains a short-lived, single-use authorization proof for one user and
/// one intended action. Pure request/response; no retry policy of its own.
#[async_trait]
pub trait ChallengeProvider: Send + Sync {
    async fn obtain_challenge(
        &self,
        user: &UserId,
        action: &ActionDescriptor,
    ) -> Result<AuthorizationChallenge, AuthFailure>;
}

/// The transaction-submission service.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Submit one state-changing operation, consuming the challenge.
    ///
    /// Exactly one external mutation call per invocation; implementations
    /// must fail fast and never retry internally; a retry here could
    /// double-apply a non-idempotent operation.
    async fn submit_operation(
        &self,
        request: &OperationRequest,
        challenge: AuthorizationChallenge,
    ) -> Result<TransactionHandle, SubmissionError>;

    /// Report the current mined status of a previously accepted
    /// transaction.
    async fn transaction_status(
        &self,
        tx: &TransactionHandle,
    ) -> Result<TransactionStatus, GatewayError>;
}

/// The read-side indexer. Evaluates probes; assumes no fixed schema.
#[async_trait]
pub trait Indexer: Send + Sync {
    /// True once the expected post-state is queryable.
    async fn probe(&self, probe: &EntityProbe) -> Result<bool, IndexerError>;
}
