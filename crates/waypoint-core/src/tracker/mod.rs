//! The operation tracker: one cancellable state machine per submitted
//! operation, driving challenge → submit → mining wait → indexing wait and
//! emitting a status event at every transition.

mod waiters;

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{ConfigError, TrackError};
use crate::model::{
    BlockRef, OperationKind, OperationRequest, OperationStatus, Stage, StatusEvent,
    TransactionHandle,
};
use crate::providers::{ActionDescriptor, ChallengeProvider, EntityProbe, Indexer, LedgerGateway};

use waiters::{IndexingOutcome, MiningOutcome};

/// Caller surface for a run's events.
pub type EventStream = ReceiverStream<StatusEvent>;

/// Deadline class of an operation kind. Balance-affecting mutations settle
/// within a block or two; structural operations (token creation, recovery,
/// bond maturation) batch more work and get the longer budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineClass {
    Lightweight,
    Heavy,
}

impl DeadlineClass {
    pub fn of(kind: OperationKind) -> Self {
        match kind {
            OperationKind::CreateToken | OperationKind::Recovery | OperationKind::MatureBond => {
                Self::Heavy
            }
            _ => Self::Lightweight,
        }
    }
}

/// Timing policy for tracked runs. Deserializable so deployments can
/// override the defaults from config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrackerPolicy {
    /// Fixed interval between status polls, for both stages. No backoff:
    /// expected latency is bounded by block time, not by load.
    pub poll_interval_ms: u64,
    /// Overall run deadline for lightweight operations.
    pub lightweight_deadline_ms: u64,
    /// Overall run deadline for heavy operations.
    pub heavy_deadline_ms: u64,
}

impl Default for TrackerPolicy {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            lightweight_deadline_ms: 30_000,
            heavy_deadline_ms: 120_000,
        }
    }
}

impl TrackerPolicy {
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    /// Load overrides from a YAML file.
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Overall deadline budget for a kind.
    pub fn deadline_for(&self, kind: OperationKind) -> Duration {
        match DeadlineClass::of(kind) {
            DeadlineClass::Lightweight => Duration::from_millis(self.lightweight_deadline_ms),
            DeadlineClass::Heavy => Duration::from_millis(self.heavy_deadline_ms),
        }
    }
}

/// Requests cancellation of one run. Cancellation stops observation, not the
/// underlying transaction; a submitted transaction cannot be un-submitted.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Receiving side of a cancellation request; one per run.
pub type CancelSignal = watch::Receiver<bool>;

/// New cancellation pair. The signal starts un-cancelled.
pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx: Arc::new(tx) }, rx)
}

/// Resolves once cancellation is requested. If every handle is gone the
/// signal can never fire; park forever rather than spuriously cancelling.
pub(crate) async fn cancelled(signal: &mut CancelSignal) {
    loop {
        if *signal.borrow() {
            return;
        }
        if signal.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Successful terminal state of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackOutcome {
    pub tx: TransactionHandle,
    pub block: BlockRef,
}

/// A spawned run: the event stream, the cancel handle, and the final
/// outcome.
pub struct OperationRun {
    pub operation_id: Uuid,
    pub events: EventStream,
    cancel: CancelHandle,
    outcome: JoinHandle<Result<TrackOutcome, TrackError>>,
}

impl OperationRun {
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the terminal result. Events not yet drained from
    /// `self.events` are lost once this returns.
    pub async fn outcome(self) -> Result<TrackOutcome, TrackError> {
        match self.outcome.await {
            Ok(res) => res,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(_) => Err(TrackError::Cancelled),
        }
    }
}

/// Composes the challenge provider, gateway, and indexer into one state
/// machine per operation. Clients are shared and must tolerate concurrent
/// calls; the tracker itself keeps no mutable state between runs.
#[derive(Clone)]
pub struct OperationTracker {
    challenges: Arc<dyn ChallengeProvider>,
    gateway: Arc<dyn LedgerGateway>,
    indexer: Arc<dyn Indexer>,
    policy: TrackerPolicy,
}

/// Event channel depth per run. Slow consumers apply backpressure to the
/// poll loop rather than losing events.
const EVENT_BUFFER: usize = 32;

impl OperationTracker {
    pub fn new(
        challenges: Arc<dyn ChallengeProvider>,
        gateway: Arc<dyn LedgerGateway>,
        indexer: Arc<dyn Indexer>,
        policy: TrackerPolicy,
    ) -> Self {
        Self {
            challenges,
            gateway,
            indexer,
            policy,
        }
    }

    pub fn policy(&self) -> &TrackerPolicy {
        &self.policy
    }

    /// Spawn a run with the policy's deadline for the request's kind.
    pub fn spawn(&self, request: OperationRequest, probe: EntityProbe) -> OperationRun {
        let deadline = self.policy.deadline_for(request.kind);
        self.spawn_with_deadline(request, probe, deadline)
    }

    /// Spawn a run bound to an explicit overall deadline.
    pub fn spawn_with_deadline(
        &self,
        request: OperationRequest,
        probe: EntityProbe,
        deadline: Duration,
    ) -> OperationRun {
        let (cancel, signal) = cancel_pair();
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        let operation_id = request.operation_id;
        let tracker = self.clone();
        let outcome = tokio::spawn(async move {
            tracker
                .run_with_deadline(request, probe, deadline, signal, events_tx)
                .await
        });
        OperationRun {
            operation_id,
            events: ReceiverStream::new(events_rx),
            cancel,
            outcome,
        }
    }

    /// Drive one run to its terminal status, emitting an event at every
    /// transition. Exactly one terminal event is emitted, always last.
    pub async fn run(
        &self,
        request: OperationRequest,
        probe: EntityProbe,
        cancel: CancelSignal,
        events: mpsc::Sender<StatusEvent>,
    ) -> Result<TrackOutcome, TrackError> {
        let deadline = self.policy.deadline_for(request.kind);
        self.run_with_deadline(request, probe, deadline, cancel, events)
            .await
    }

    pub async fn run_with_deadline(
        &self,
        request: OperationRequest,
        probe: EntityProbe,
        deadline: Duration,
        mut cancel: CancelSignal,
        events: mpsc::Sender<StatusEvent>,
    ) -> Result<TrackOutcome, TrackError> {
        let mut sink = EventSink {
            operation_id: request.operation_id,
            kind: request.kind,
            tx: None,
            events,
        };

        debug!(
            operation = %request.operation_id,
            kind = %request.kind,
            target = %request.target,
            deadline_ms = deadline.as_millis() as u64,
            "tracking operation"
        );

        let result = self
            .drive(&request, &probe, deadline, &mut cancel, &mut sink)
            .await;

        let terminal = match &result {
            Ok(_) => OperationStatus::Indexed,
            Err(err) => terminal_status(err),
        };
        match &result {
            Ok(outcome) => info!(
                operation = %request.operation_id,
                tx = %outcome.tx,
                block = outcome.block.number,
                "operation indexed"
            ),
            Err(err) => info!(
                operation = %request.operation_id,
                error = %err,
                guidance = ?err.guidance(),
                "operation did not complete"
            ),
        }
        sink.emit(terminal).await;
        result
    }

    /// Non-terminal transitions only; the terminal event is the wrapper's
    /// job so it is emitted exactly once on every path out of here.
    async fn drive(
        &self,
        request: &OperationRequest,
        probe: &EntityProbe,
        deadline: Duration,
        cancel: &mut CancelSignal,
        sink: &mut EventSink,
    ) -> Result<TrackOutcome, TrackError> {
        let interval = self.policy.poll_interval();
        let deadline = tokio::time::Instant::now() + deadline;

        sink.emit(OperationStatus::Preparing).await;
        let action = ActionDescriptor::for_request(request);
        let challenge = tokio::select! {
            _ = cancelled(cancel) => return Err(TrackError::Cancelled),
            res = self.challenges.obtain_challenge(&request.actor, &action) => res?,
        };

        sink.emit(OperationStatus::Submitting).await;
        let tx = tokio::select! {
            _ = cancelled(cancel) => return Err(TrackError::Cancelled),
            res = self.gateway.submit_operation(request, challenge) => {
                res.map_err(TrackError::from)?
            }
        };
        sink.tx = Some(tx.clone());

        sink.emit(OperationStatus::WaitingForMining).await;
        let block = match waiters::await_mining(self.gateway.as_ref(), &tx, interval, deadline, cancel)
            .await
        {
            MiningOutcome::Mined(block) => block,
            MiningOutcome::Reverted { reason } => {
                return Err(TrackError::OnChainFailure { reason })
            }
            MiningOutcome::Dropped => return Err(TrackError::Dropped),
            MiningOutcome::TimedOut => {
                return Err(TrackError::Timeout {
                    stage: Stage::Mining,
                })
            }
            MiningOutcome::Cancelled => return Err(TrackError::Cancelled),
        };
        sink.emit(OperationStatus::Mined {
            block: block.clone(),
        })
        .await;

        sink.emit(OperationStatus::WaitingForIndexing).await;
        match waiters::await_indexed(self.indexer.as_ref(), probe, interval, deadline, cancel).await
        {
            IndexingOutcome::Indexed => Ok(TrackOutcome { tx, block }),
            IndexingOutcome::TimedOut => Err(TrackError::Timeout {
                stage: Stage::Indexing,
            }),
            IndexingOutcome::Cancelled => Err(TrackError::Cancelled),
        }
    }
}

/// Terminal status for a classified failure.
fn terminal_status(err: &TrackError) -> OperationStatus {
    match err {
        TrackError::OnChainFailure { reason } => OperationStatus::Failed {
            reason: reason.clone(),
        },
        TrackError::Auth(_) | TrackError::Rejected { .. } | TrackError::Transport { .. } => {
            OperationStatus::Failed {
                reason: Some(err.to_string()),
            }
        }
        TrackError::Dropped => OperationStatus::Dropped,
        TrackError::Timeout { stage } => OperationStatus::TimedOut { stage: *stage },
        TrackError::Cancelled => OperationStatus::Cancelled,
    }
}

/// Stamps and forwards events for one run. Sends are best-effort: a caller
/// that dropped its stream does not stop the run.
struct EventSink {
    operation_id: Uuid,
    kind: OperationKind,
    tx: Option<TransactionHandle>,
    events: mpsc::Sender<StatusEvent>,
}

impl EventSink {
    async fn emit(&self, status: OperationStatus) {
        let _ = self
            .events
            .send(StatusEvent {
                operation_id: self.operation_id,
                kind: self.kind,
                status,
                tx: self.tx.clone(),
                at: chrono::Utc::now(),
            })
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_defaults_match_reference_values() {
        let policy = TrackerPolicy::default();
        assert_eq!(policy.poll_interval(), Duration::from_millis(500));
        assert_eq!(
            policy.deadline_for(OperationKind::Mint),
            Duration::from_secs(30)
        );
        assert_eq!(
            policy.deadline_for(OperationKind::CreateToken),
            Duration::from_secs(120)
        );
    }

    #[test]
    fn policy_yaml_overrides_partial_fields() {
        let policy = TrackerPolicy::from_yaml("poll_interval_ms: 250\n").unwrap();
        assert_eq!(policy.poll_interval_ms, 250);
        assert_eq!(
            policy.lightweight_deadline_ms,
            TrackerPolicy::default().lightweight_deadline_ms
        );
    }

    #[test]
    fn policy_yaml_rejects_unknown_fields() {
        assert!(TrackerPolicy::from_yaml("poll_interval: 250\n").is_err());
    }

    #[test]
    fn policy_loads_from_a_config_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tracker.yaml");
        std::fs::write(&path, "heavy_deadline_ms: 240000\n").expect("write policy");

        let policy = TrackerPolicy::load(&path).unwrap();
        assert_eq!(policy.heavy_deadline_ms, 240_000);

        let missing = TrackerPolicy::load(dir.path().join("absent.yaml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn heavy_kinds_get_the_long_budget() {
        for kind in [
            OperationKind::CreateToken,
            OperationKind::Recovery,
            OperationKind::MatureBond,
        ] {
            assert_eq!(DeadlineClass::of(kind), DeadlineClass::Heavy);
        }
        assert_eq!(
            DeadlineClass::of(OperationKind::Transfer),
            DeadlineClass::Lightweight
        );
    }

    #[tokio::test]
    async fn cancel_pair_signals_once_cancelled() {
        let (handle, mut signal) = cancel_pair();
        handle.cancel();
        // Resolves immediately; would hang the test otherwise.
        cancelled(&mut signal).await;
    }
}
