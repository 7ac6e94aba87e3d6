//! Hands committed proposals to the replication coordinator and storage.
//!
//! A single consumer drains the engine's in-order release channel, so
//! operations reach `apply` and the outbound replication queues in strict
//! sequence order. A storage failure is fatal to that operation's
//! application only; the commit log keeps advancing.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::sync::oneshot;
use tokio::sync::watch;
use tracing::debug;
use tracing::error;
use tracing::warn;

use super::engine::CommittedBatch;
use super::engine::ProposeOutcome;
use crate::core::now_ms;
use crate::core::CommitEvent;
use crate::core::CommitHandle;
use crate::core::CommitStream;
use crate::core::ProposalDigest;
use crate::metrics::COMMITTED_OPERATIONS;
use crate::metrics::COMMIT_LATENCY_MS;
use crate::replication::ReplicationCoordinator;
use crate::ConsensusError;
use crate::Error;
use crate::ReplicationError;
use crate::Result;
use crate::TypeConfig;

pub(crate) struct CommitApplier<T>
where T: TypeConfig
{
    coordinator: Arc<ReplicationCoordinator<T>>,
    commit_stream: CommitStream,
    pending: Arc<DashMap<ProposalDigest, oneshot::Sender<ProposeOutcome>>>,
    committed_rx: Option<mpsc::UnboundedReceiver<CommittedBatch>>,
    shutdown: watch::Receiver<()>,
}

impl<T> CommitApplier<T>
where T: TypeConfig
{
    pub(crate) fn new(
        coordinator: Arc<ReplicationCoordinator<T>>,
        commit_stream: CommitStream,
        pending: Arc<DashMap<ProposalDigest, oneshot::Sender<ProposeOutcome>>>,
        committed_rx: mpsc::UnboundedReceiver<CommittedBatch>,
        shutdown: watch::Receiver<()>,
    ) -> Self {
        Self {
            coordinator,
            commit_stream,
            pending,
            committed_rx: Some(committed_rx),
            shutdown,
        }
    }

    pub(crate) async fn run(&mut self) -> Result<()> {
        let mut committed_rx = self
            .committed_rx
            .take()
            .ok_or_else(|| Error::Fatal("commit receiver already taken".to_string()))?;
        let mut shutdown = self.shutdown.clone();

        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => {
                    warn!("[CommitApplier] shutdown signal received.");
                    return Ok(());
                }
                batch = committed_rx.recv() => {
                    match batch {
                        Some(batch) => self.apply_batch(batch).await,
                        None => return Ok(()),
                    }
                }
            }
        }
    }

    pub(crate) async fn apply_batch(
        &self,
        batch: CommittedBatch,
    ) {
        let CommittedBatch {
            proposal,
            certificate,
        } = batch;
        debug!(
            "applying committed proposal (view {}, sequence {}), {} operation(s)",
            proposal.view,
            proposal.sequence,
            proposal.operations.len()
        );

        let mut failure: Option<ProposeOutcome> = None;
        for operation in &proposal.operations {
            match self.coordinator.publish(operation.clone()).await {
                Ok(clock) => {
                    COMMITTED_OPERATIONS.inc();
                    let latency = now_ms().saturating_sub(operation.origin_ts_ms);
                    COMMIT_LATENCY_MS
                        .with_label_values(&[operation.collection.as_str()])
                        .observe(latency as f64);
                    self.commit_stream.publish(CommitEvent {
                        view: proposal.view,
                        sequence: proposal.sequence,
                        operation: operation.clone(),
                        vector_clock: clock,
                    });
                }
                Err(e) => {
                    // A quorum-backed commit is never dropped: the record is
                    // retained locally and the proposer learns the delivery
                    // failure.
                    error!(
                        "replication publish failed for (view {}, sequence {}): {:?}",
                        proposal.view, proposal.sequence, e
                    );
                    failure = Some(match e {
                        Error::Consensus(ConsensusError::Replication(ReplicationError::ReplicationTimeout {
                            peer,
                            duration,
                        })) => ProposeOutcome::ReplicationFailed {
                            peer,
                            duration_ms: duration.as_millis() as u64,
                        },
                        other => ProposeOutcome::Failed(other.to_string()),
                    });
                }
            }
        }

        let outcome = failure.unwrap_or(ProposeOutcome::Committed(CommitHandle {
            view: proposal.view,
            sequence: proposal.sequence,
            digest: certificate.digest,
        }));
        if let Some((_, responder)) = self.pending.remove(&certificate.digest) {
            let _ = responder.send(outcome);
        }
    }
}
