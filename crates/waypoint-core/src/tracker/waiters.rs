//! Fixed-interval polling loops for the two waiting stages.
//!
//! Both loops sleep the configured interval between remote calls, never
//! busy-spin, and are cancellable at every suspension point. A failed poll
//! iteration is logged and skipped; only a terminal report from the
//! collaborator or the deadline ends a wait.

use std::time::Duration;

use tokio::time::Instant;
use tracing::warn;

use super::{cancelled, CancelSignal};
use crate::model::{BlockRef, TransactionHandle};
use crate::providers::{EntityProbe, Indexer, LedgerGateway, TransactionStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum MiningOutcome {
    Mined(BlockRef),
    Reverted { reason: Option<String> },
    Dropped,
    TimedOut,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IndexingOutcome {
    Indexed,
    TimedOut,
    Cancelled,
}

/// Poll the gateway for the handle's mined status until a terminal report
/// or the deadline.
pub(crate) async fn await_mining(
    gateway: &dyn LedgerGateway,
    tx: &TransactionHandle,
    interval: Duration,
    deadline: Instant,
    cancel: &mut CancelSignal,
) -> MiningOutcome {
    loop {
        if Instant::now() >= deadline {
            return MiningOutcome::TimedOut;
        }
        match gateway.transaction_status(tx).await {
            Ok(TransactionStatus::Pending) => {}
            Ok(TransactionStatus::Mined { block }) => return MiningOutcome::Mined(block),
            Ok(TransactionStatus::Reverted { reason }) => {
                return MiningOutcome::Reverted { reason }
            }
            Ok(TransactionStatus::Dropped) => return MiningOutcome::Dropped,
            // Transient: the transaction may still mine while the gateway is
            // unreachable. Keep polling until the deadline says otherwise.
            Err(err) => warn!(tx = %tx, error = %err, "transaction status poll failed"),
        }
        if pause(interval, deadline, cancel).await.is_cancelled() {
            return MiningOutcome::Cancelled;
        }
    }
}

/// Poll the indexer with the caller's probe until it reports the expected
/// post-state or the deadline. Only ever invoked after a mined report.
pub(crate) async fn await_indexed(
    indexer: &dyn Indexer,
    probe: &EntityProbe,
    interval: Duration,
    deadline: Instant,
    cancel: &mut CancelSignal,
) -> IndexingOutcome {
    loop {
        if Instant::now() >= deadline {
            return IndexingOutcome::TimedOut;
        }
        match indexer.probe(probe).await {
            Ok(true) => return IndexingOutcome::Indexed,
            Ok(false) => {}
            Err(err) => warn!(entity = %probe.entity, error = %err, "indexer probe failed"),
        }
        if pause(interval, deadline, cancel).await.is_cancelled() {
            return IndexingOutcome::Cancelled;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pause {
    Elapsed,
    Cancelled,
}

impl Pause {
    fn is_cancelled(self) -> bool {
        self == Self::Cancelled
    }
}

/// Sleep one interval, clamped to the deadline, unless cancelled first.
async fn pause(interval: Duration, deadline: Instant, cancel: &mut CancelSignal) -> Pause {
    let wake = deadline.min(Instant::now() + interval);
    tokio::select! {
        _ = cancelled(cancel) => Pause::Cancelled,
        _ = tokio::time::sleep_until(wake) => Pause::Elapsed,
    }
}
