//! Core data model: operation requests, transaction handles, and the status
//! vocabulary emitted while an operation is tracked.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// The state-changing operations the platform submits to the ledger gateway.
///
/// The tracker never interprets the business payload of a kind; the kind is
/// used for deadline classification, logging, and message lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationKind {
    Mint,
    Burn,
    Transfer,
    Approve,
    Freeze,
    Unfreeze,
    Pause,
    Unpause,
    Redeem,
    Recovery,
    SetCap,
    SetYield,
    GrantRole,
    RevokeRole,
    CreateToken,
    IssueClaim,
    RevokeClaim,
    AddTrustedIssuer,
    DeleteTrustedIssuer,
    UpdateCollateral,
    MatureBond,
}

impl OperationKind {
    /// Wire name, matching the gateway's camelCase vocabulary.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::Mint => "mint",
            Self::Burn => "burn",
            Self::Transfer => "transfer",
            Self::Approve => "approve",
            Self::Freeze => "freeze",
            Self::Unfreeze => "unfreeze",
            Self::Pause => "pause",
            Self::Unpause => "unpause",
            Self::Redeem => "redeem",
            Self::Recovery => "recovery",
            Self::SetCap => "setCap",
            Self::SetYield => "setYield",
            Self::GrantRole => "grantRole",
            Self::RevokeRole => "revokeRole",
            Self::CreateToken => "createToken",
            Self::IssueClaim => "issueClaim",
            Self::RevokeClaim => "revokeClaim",
            Self::AddTrustedIssuer => "addTrustedIssuer",
            Self::DeleteTrustedIssuer => "deleteTrustedIssuer",
            Self::UpdateCollateral => "updateCollateral",
            Self::MatureBond => "matureBond",
        }
    }

    /// Short human phrase used by the default message catalog.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Mint => "mint",
            Self::Burn => "burn",
            Self::Transfer => "transfer",
            Self::Approve => "approval",
            Self::Freeze => "freeze",
            Self::Unfreeze => "unfreeze",
            Self::Pause => "pause",
            Self::Unpause => "unpause",
            Self::Redeem => "redemption",
            Self::Recovery => "recovery",
            Self::SetCap => "cap update",
            Self::SetYield => "yield update",
            Self::GrantRole => "role grant",
            Self::RevokeRole => "role revocation",
            Self::CreateToken => "token creation",
            Self::IssueClaim => "claim issuance",
            Self::RevokeClaim => "claim revocation",
            Self::AddTrustedIssuer => "trusted issuer registration",
            Self::DeleteTrustedIssuer => "trusted issuer removal",
            Self::UpdateCollateral => "collateral update",
            Self::MatureBond => "bond maturation",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Errors from [`ResourceAddress::parse`].
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("address must start with 0x: {input}")]
    MissingPrefix { input: String },

    #[error("address must be 40 hex digits, got {got}")]
    BadLength { got: usize },

    #[error("address contains non-hex characters: {input}")]
    NotHex { input: String },
}

/// A ledger address identifying the resource an operation targets
/// (token contract, identity registry, …). Stored in canonical lowercase
/// `0x`-prefixed form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceAddress(String);

impl ResourceAddress {
    /// Parse and canonicalize an address.
    pub fn parse(input: &str) -> Result<Self, AddressError> {
        let hex_part = input.strip_prefix("0x").or_else(|| input.strip_prefix("0X"));
        let hex_part = hex_part.ok_or_else(|| AddressError::MissingPrefix {
            input: input.to_string(),
        })?;
        if hex_part.len() != 40 {
            return Err(AddressError::BadLength {
                got: hex_part.len(),
            });
        }
        if hex::decode(hex_part).is_err() {
            return Err(AddressError::NotHex {
                input: input.to_string(),
            });
        }
        Ok(Self(format!("0x{}", hex_part.to_ascii_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of the acting user, as known to the authorization service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Caller intent: one state-changing operation to drive to a terminal status.
/// Immutable once submitted.
#[derive(Debug, Clone)]
pub struct OperationRequest {
    /// Correlation id for events and logs. Generated at construction; not a
    /// ledger-side identifier.
    pub operation_id: Uuid,
    pub kind: OperationKind,
    pub target: ResourceAddress,
    /// Kind-specific payload (mint amount, role name, claim topic, …),
    /// opaque to the tracker.
    pub payload: serde_json::Value,
    pub actor: UserId,
}

impl OperationRequest {
    pub fn new(kind: OperationKind, target: ResourceAddress, actor: UserId) -> Self {
        Self {
            operation_id: Uuid::new_v4(),
            kind,
            target,
            payload: serde_json::Value::Null,
            actor,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

/// Single-use authorization proof bound to one user and one pending action.
///
/// Consumed by value on submission; a failed submission never re-issues one.
/// Never persisted.
#[derive(Clone)]
pub struct AuthorizationChallenge {
    pub challenge_id: String,
    proof: String,
}

impl AuthorizationChallenge {
    pub fn new(challenge_id: impl Into<String>, proof: impl Into<String>) -> Self {
        Self {
            challenge_id: challenge_id.into(),
            proof: proof.into(),
        }
    }

    /// Consume the challenge, yielding the proof for exactly one submission.
    pub fn into_proof(self) -> String {
        self.proof
    }
}

impl fmt::Debug for AuthorizationChallenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Proof is a secret; never log it.
        f.debug_struct("AuthorizationChallenge")
            .field("challenge_id", &self.challenge_id)
            .field("proof", &"<redacted>")
            .finish()
    }
}

/// Opaque transaction identifier returned by the gateway on acceptance.
/// Correlation key for all subsequent polling; never reused across
/// operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionHandle(String);

impl TransactionHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Block reference attached to a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRef {
    pub number: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

/// The two pollable stages a deadline can expire in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Mining,
    Indexing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mining => f.write_str("mining"),
            Self::Indexing => f.write_str("indexing"),
        }
    }
}

/// Current status of a tracked operation.
///
/// Transitions are monotonic; exactly one terminal status is reached for
/// every operation that leaves `Preparing`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum OperationStatus {
    Preparing,
    Submitting,
    WaitingForMining,
    Mined { block: BlockRef },
    WaitingForIndexing,
    Indexed,
    Failed { reason: Option<String> },
    Dropped,
    TimedOut { stage: Stage },
    Cancelled,
}

impl OperationStatus {
    /// Terminal statuses end the run; no event follows them.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Indexed
                | Self::Failed { .. }
                | Self::Dropped
                | Self::TimedOut { .. }
                | Self::Cancelled
        )
    }

    /// Stable discriminant name, used as the message catalog key.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Preparing => "preparing",
            Self::Submitting => "submitting",
            Self::WaitingForMining => "waitingForMining",
            Self::Mined { .. } => "mined",
            Self::WaitingForIndexing => "waitingForIndexing",
            Self::Indexed => "indexed",
            Self::Failed { .. } => "failed",
            Self::Dropped => "dropped",
            Self::TimedOut { .. } => "timedOut",
            Self::Cancelled => "cancelled",
        }
    }
}

/// One event per status transition of a tracked operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEvent {
    pub operation_id: Uuid,
    pub kind: OperationKind,
    #[serde(flatten)]
    pub status: OperationStatus,
    /// Transaction handle, once known (from `WaitingForMining` onward).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx: Option<TransactionHandle>,
    pub at: DateTime<Utc>,
}
