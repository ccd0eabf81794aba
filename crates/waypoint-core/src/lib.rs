//! Tracking for asynchronous on-chain operations.
//!
//! An asset-tokenization platform mutates ledger state through a gateway:
//! obtain a single-use authorization challenge, submit the operation, wait
//! for the transaction to mine, then wait for the indexer to catch up. This
//! crate owns that orchestration: one cancellable state machine per
//! operation, a status event per transition, and a classified terminal
//! outcome that tells the caller whether nothing happened, something may
//! have happened, or everything happened and just is not visible yet.
//!
//! The ledger gateway, authorization service, and indexer are reached
//! through the traits in [`providers`]; `waypoint-gateway` ships HTTP
//! bindings for them.

pub mod claims;
pub mod error;
pub mod messages;
pub mod model;
pub mod providers;
pub mod tracker;

pub use error::{
    AuthFailure, ConfigError, GatewayError, Guidance, IndexerError, SubmissionError, TrackError,
};
pub use messages::MessageCatalog;
pub use model::{
    AddressError, AuthorizationChallenge, BlockRef, OperationKind, OperationRequest,
    OperationStatus, ResourceAddress, Stage, StatusEvent, TransactionHandle, UserId,
};
pub use providers::{
    ActionDescriptor, ChallengeProvider, EntityProbe, Indexer, LedgerGateway, TransactionStatus,
};
pub use tracker::{
    cancel_pair, CancelHandle, CancelSignal, DeadlineClass, EventStream, OperationRun,
    OperationTracker, TrackOutcome, TrackerPolicy,
};
