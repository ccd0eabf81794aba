//! Error taxonomy for tracked operations.
//!
//! The split matters to callers: a `Transport` failure means nothing reached
//! the ledger and the whole run is safe to repeat; a `Rejected` or on-chain
//! failure means the input must change; `Dropped` and a mining timeout mean
//! the outcome is unknown and the ledger must be re-checked before any
//! resubmission.

use crate::model::Stage;

/// The challenge could not be obtained or was rejected by the authorization
/// service. Fatal for the run; never retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthFailure {
    #[error("wrong secret")]
    WrongSecret,

    #[error("authentication factor expired")]
    FactorExpired,

    #[error("authentication factor locked")]
    FactorLocked,

    #[error("no authentication factor configured for user")]
    NoFactorConfigured,

    /// The authorization service could not be reached at all.
    #[error("authorization service unavailable: {message}")]
    Unavailable { message: String },
}

/// Outcome of the single submission call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    /// The gateway received the request and refused it (validation,
    /// permission, business rule). No transaction exists; retrying the same
    /// input will fail the same way.
    #[error("gateway rejected operation ({code}): {message}")]
    Rejected { code: String, message: String },

    /// The request never reached the gateway or the response was lost.
    /// Safe to retry the whole run with a fresh challenge.
    #[error("submission transport failure: {message}")]
    Transport { message: String },
}

/// Per-poll error from the ledger gateway's status endpoint. Non-terminal
/// inside the mining wait loop; the iteration is logged and polling
/// continues until the deadline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("gateway transport error: {message}")]
    Transport { message: String },

    #[error("gateway returned an invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("gateway rejected credentials: {message}")]
    Unauthorized { message: String },
}

/// Per-poll error from the indexer. Non-terminal inside the indexing wait
/// loop.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexerError {
    #[error("indexer transport error: {message}")]
    Transport { message: String },

    #[error("indexer returned an invalid response: {message}")]
    InvalidResponse { message: String },
}

/// Errors loading policy or message-catalog overrides from config files.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// What a caller should do with a terminal failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guidance {
    /// Nothing reached the ledger; the run can be repeated as-is.
    RetrySafe,
    /// The ledger may or may not have applied the change; query it before
    /// resubmitting to avoid duplicate effects.
    CheckBeforeRetry,
    /// The change is on the ledger and will become visible; no action
    /// needed.
    Wait,
    /// The input or credentials must change before another attempt.
    Fatal,
}

/// Terminal classification of a tracked run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrackError {
    #[error(transparent)]
    Auth(#[from] AuthFailure),

    /// Gateway refused the submission; no transaction was created.
    #[error("operation rejected ({code}): {message}")]
    Rejected { code: String, message: String },

    /// Submission never reached the gateway.
    #[error("submission transport failure: {message}")]
    Transport { message: String },

    /// Transaction was mined but reverted.
    #[error("transaction reverted: {}", reason.as_deref().unwrap_or("no reason reported"))]
    OnChainFailure { reason: Option<String> },

    /// Transaction vanished from the network before mining (replaced or
    /// evicted from the pending pool). Outcome is ambiguous.
    #[error("transaction dropped before mining")]
    Dropped,

    #[error("timed out waiting for {stage}")]
    Timeout { stage: Stage },

    #[error("operation cancelled by caller")]
    Cancelled,
}

impl TrackError {
    /// True only when repeating the run cannot duplicate a ledger-side
    /// effect.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Caller guidance for this failure class. Distinguishes "nothing
    /// happened, try again" from "it may have happened, check first" from
    /// "it happened, just wait".
    pub fn guidance(&self) -> Guidance {
        match self {
            Self::Auth(_) | Self::Rejected { .. } | Self::OnChainFailure { .. } => Guidance::Fatal,
            Self::Transport { .. } => Guidance::RetrySafe,
            Self::Dropped => Guidance::CheckBeforeRetry,
            Self::Timeout {
                stage: Stage::Mining,
            } => Guidance::CheckBeforeRetry,
            Self::Timeout {
                stage: Stage::Indexing,
            } => Guidance::Wait,
            // Cancellation stops observation, not the submitted transaction;
            // its fate is as unknown as a mining timeout's.
            Self::Cancelled => Guidance::CheckBeforeRetry,
        }
    }
}

impl From<SubmissionError> for TrackError {
    fn from(err: SubmissionError) -> Self {
        match err {
            SubmissionError::Rejected { code, message } => Self::Rejected { code, message },
            SubmissionError::Transport { message } => Self::Transport { message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transport_is_blindly_retryable() {
        let errors = [
            TrackError::Auth(AuthFailure::WrongSecret),
            TrackError::Rejected {
                code: "insufficient_permission".into(),
                message: "caller lacks MINTER role".into(),
            },
            TrackError::OnChainFailure {
                reason: Some("InsufficientBalance".into()),
            },
            TrackError::Dropped,
            TrackError::Timeout {
                stage: Stage::Mining,
            },
            TrackError::Timeout {
                stage: Stage::Indexing,
            },
            TrackError::Cancelled,
        ];
        for err in &errors {
            assert!(!err.is_retryable(), "{:?}", err);
        }
        assert!(TrackError::Transport {
            message: "connection reset".into()
        }
        .is_retryable());
    }

    #[test]
    fn guidance_separates_the_three_user_messages() {
        assert_eq!(
            TrackError::Transport {
                message: "dns".into()
            }
            .guidance(),
            Guidance::RetrySafe
        );
        assert_eq!(TrackError::Dropped.guidance(), Guidance::CheckBeforeRetry);
        assert_eq!(
            TrackError::Timeout {
                stage: Stage::Mining
            }
            .guidance(),
            Guidance::CheckBeforeRetry
        );
        assert_eq!(
            TrackError::Timeout {
                stage: Stage::Indexing
            }
            .guidance(),
            Guidance::Wait
        );
        assert_eq!(
            TrackError::Auth(AuthFailure::FactorLocked).guidance(),
            Guidance::Fatal
        );
    }

    #[test]
    fn submission_error_maps_onto_track_error() {
        let rejected: TrackError = SubmissionError::Rejected {
            code: "bad_input".into(),
            message: "amount must be positive".into(),
        }
        .into();
        assert!(matches!(rejected, TrackError::Rejected { .. }));

        let transport: TrackError = SubmissionError::Transport {
            message: "timeout".into(),
        }
        .into();
        assert!(transport.is_retryable());
    }

    #[test]
    fn on_chain_failure_display_includes_reason() {
        let err = TrackError::OnChainFailure {
            reason: Some("InsufficientBalance".into()),
        };
        assert_eq!(
            err.to_string(),
            "transaction reverted: InsufficientBalance"
        );
        let bare = TrackError::OnChainFailure { reason: None };
        assert_eq!(
            bare.to_string(),
            "transaction reverted: no reason reported"
        );
    }
}
