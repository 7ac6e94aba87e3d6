//! One assembled cluster member.
//!
//! Wires the consensus engine, commit applier, and replication coordinator
//! together, owns their lifecycle, and exposes the embedding surface:
//! propose/submit, inbound delivery hooks for the transport collaborator,
//! the commit event stream, and read-only cluster status.

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::sync::watch;
use tracing::error;
use tracing::info;

use crate::config::Settings;
use crate::core::CommitApplier;
use crate::core::CommitEvent;
use crate::core::CommitHandle;
use crate::core::CommitStream;
use crate::core::ConsensusEngine;
use crate::core::Operation;
use crate::core::PeerMessage;
use crate::ids::NodeId;
use crate::ids::ViewNumber;
use crate::membership::PeerHealth;
use crate::membership::PeerHealthTracker;
use crate::replication::LinkStatus;
use crate::replication::ReplicationAck;
use crate::replication::ReplicationCoordinator;
use crate::replication::ReplicationRecord;
use crate::Result;
use crate::TypeConfig;

/// Read-only cluster view for the admin surface.
#[derive(Debug, Clone)]
pub struct ClusterStatus {
    pub view_number: ViewNumber,
    pub leader: NodeId,
    pub view_changing: bool,
    pub members: Vec<PeerHealth>,
    pub replication: Vec<LinkStatus>,
}

pub struct Node<T>
where T: TypeConfig
{
    pub(crate) engine: Arc<ConsensusEngine<T>>,
    pub(crate) coordinator: Arc<ReplicationCoordinator<T>>,
    pub(crate) health: Arc<PeerHealthTracker>,
    pub(crate) commit_stream: CommitStream,
    pub(crate) settings: Arc<Settings>,
    pub(crate) shutdown_tx: watch::Sender<()>,
    pub(crate) applier: Mutex<Option<CommitApplier<T>>>,
    pub(crate) started: AtomicBool,
}

impl<T> Node<T>
where T: TypeConfig
{
    pub fn node_id(&self) -> &NodeId {
        self.engine.node_id()
    }

    /// Spawns the engine timer loop, the commit applier, and the outbound
    /// replication links. Idempotent.
    pub fn start(self: &Arc<Self>) {
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("[Node:{}] starting", self.node_id());

        self.coordinator.start(self.shutdown_tx.subscribe());

        let engine = Arc::clone(&self.engine);
        let engine_shutdown = self.shutdown_tx.subscribe();
        tokio::spawn(async move {
            if let Err(e) = engine.run(engine_shutdown).await {
                error!("engine loop exited with error: {:?}", e);
            }
        });

        if let Some(mut applier) = self.applier.lock().take() {
            tokio::spawn(async move {
                if let Err(e) = applier.run().await {
                    error!("commit applier exited with error: {:?}", e);
                }
            });
        }
    }

    /// Signals every background task to stop.
    pub fn shutdown(&self) {
        info!("[Node:{}] shutdown requested", self.node_id());
        let _ = self.shutdown_tx.send(());
    }

    /// Proposes one explicit batch. See
    /// [`ConsensusEngine::propose`](crate::core::ConsensusEngine::propose).
    pub async fn propose(
        &self,
        operations: Vec<Operation>,
    ) -> Result<CommitHandle> {
        self.engine.propose(operations).await
    }

    /// Submits one operation into the current batch round.
    pub async fn submit(
        &self,
        operation: Operation,
    ) -> Result<CommitHandle> {
        self.engine.submit(operation).await
    }

    /// Inbound hook for the transport collaborator: one signed protocol
    /// message from a peer.
    pub async fn deliver_message(
        &self,
        message: PeerMessage,
    ) -> Result<()> {
        self.engine.handle_peer_message(message).await
    }

    /// Inbound hook for the transport collaborator: one replication record
    /// from a peer coordinator.
    pub async fn deliver_record(
        &self,
        record: ReplicationRecord,
    ) -> Result<ReplicationAck> {
        self.coordinator.receive(record).await
    }

    /// Every finalized commit as `{sequence, view, operation, clock}`.
    pub fn subscribe_commits(&self) -> broadcast::Receiver<CommitEvent> {
        self.commit_stream.subscribe()
    }

    pub fn engine(&self) -> &Arc<ConsensusEngine<T>> {
        &self.engine
    }

    /// Direct coordinator access, used by partition-recovery tooling to
    /// exchange replication deltas.
    pub fn coordinator(&self) -> &Arc<ReplicationCoordinator<T>> {
        &self.coordinator
    }

    /// Current view, member health, and per-link replication lag.
    pub fn status(&self) -> ClusterStatus {
        let view = self.engine.current_view();
        let failure_timeout = Duration::from_millis(self.settings.consensus.failure_timeout_ms);
        let peers = view.peers_of(self.node_id());
        ClusterStatus {
            view_number: view.view_number(),
            leader: view.leader_id().clone(),
            view_changing: self.engine.is_view_changing(),
            members: self.health.snapshot(&peers, failure_timeout),
            replication: self.coordinator.link_status(),
        }
    }
}

impl<T: TypeConfig> std::fmt::Debug for Node<T> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Node").field("node_id", self.node_id()).finish()
    }
}
