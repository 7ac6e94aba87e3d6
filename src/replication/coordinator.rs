//! Cross-node replication coordinator.
//!
//! Sits between the consensus engine and the peer datacenters. Locally
//! committed operations enter through `publish`, get stamped with this
//! node's vector clock, land in the per-key append-only store, and fan out
//! to peer links. Records from peers enter through `receive` and go
//! through the same per-key merge, so partition healing is nothing but
//! ordinary concurrent-write resolution applied in bulk.

use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::sync::watch;
use tracing::debug;
use tracing::error;
use tracing::warn;

use crate::alias::SMOF;
use crate::alias::TROF;
use crate::clock::CausalOrder;
use crate::clock::VectorClock;
use crate::config::BackoffPolicy;
use crate::config::LinkMode;
use crate::config::PeerLinkConfig;
use crate::config::ReplicationConfig;
use crate::core::Operation;
use crate::ids::NodeId;
use crate::metrics::CONFLICTS_RESOLVED;
use crate::metrics::REPLICATION_QUEUE_DEPTH;
use crate::metrics::STORAGE_APPLY_FAILURES;
use crate::network::Transport;
use crate::replication::ConflictPolicy;
use crate::replication::ConflictSet;
use crate::replication::ReplicationAck;
use crate::replication::ReplicationRecord;
use crate::storage::StateMachine;
use crate::Result;
use crate::TypeConfig;

/// Read-only view of one peer link, for the admin surface.
#[derive(Debug, Clone)]
pub struct LinkStatus {
    pub peer: NodeId,
    pub datacenter: String,
    pub mode: LinkMode,
    pub queue_depth: usize,
    pub last_ack_ms_ago: Option<u64>,
}

struct PeerLink {
    config: PeerLinkConfig,
    outbound_tx: mpsc::Sender<ReplicationRecord>,
    queue_depth: Arc<AtomicUsize>,
    last_ack: Arc<Mutex<Option<tokio::time::Instant>>>,
}

/// Per-key append-only record store. The head is the current resolved
/// value; history keeps every record ever observed for audit.
#[derive(Debug, Default)]
struct KeyHistory {
    history: Vec<ReplicationRecord>,
    head: Option<ReplicationRecord>,
}

pub struct ReplicationCoordinator<T>
where T: TypeConfig
{
    node_id: NodeId,
    datacenter: String,
    config: ReplicationConfig,
    retry: BackoffPolicy,
    clock: Mutex<VectorClock>,
    store: DashMap<(String, String), Arc<tokio::sync::Mutex<KeyHistory>>>,
    state_machine: Arc<SMOF<T>>,
    transport: Arc<TROF<T>>,
    links: DashMap<NodeId, PeerLink>,
    policy: RwLock<ConflictPolicy>,
    default_mode: RwLock<LinkMode>,
    started: AtomicBool,
}

impl<T> ReplicationCoordinator<T>
where T: TypeConfig
{
    pub fn new(
        node_id: NodeId,
        datacenter: impl Into<String>,
        config: ReplicationConfig,
        retry: BackoffPolicy,
        state_machine: Arc<SMOF<T>>,
        transport: Arc<TROF<T>>,
    ) -> Self {
        let policy = ConflictPolicy::from_kind(config.conflict_policy);
        let default_mode = config.default_mode;
        Self {
            node_id,
            datacenter: datacenter.into(),
            config,
            retry,
            clock: Mutex::new(VectorClock::new()),
            store: DashMap::new(),
            state_machine,
            transport,
            links: DashMap::new(),
            policy: RwLock::new(policy),
            default_mode: RwLock::new(default_mode),
            started: AtomicBool::new(false),
        }
    }

    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    pub fn current_clock(&self) -> VectorClock {
        self.clock.lock().clone()
    }

    /// Runtime switch of the conflict policy and/or the default delivery
    /// mode for links without an explicit override.
    pub fn configure(
        &self,
        policy: Option<ConflictPolicy>,
        default_mode: Option<LinkMode>,
    ) {
        if let Some(policy) = policy {
            *self.policy.write() = policy;
        }
        if let Some(mode) = default_mode {
            *self.default_mode.write() = mode;
        }
    }

    /// Spawns one outbound drain task per configured peer link. Idempotent.
    pub fn start(
        self: &Arc<Self>,
        shutdown: watch::Receiver<()>,
    ) {
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }
        for peer_config in self.config.peers.clone() {
            let peer = NodeId::from(peer_config.id.as_str());
            let (outbound_tx, outbound_rx) = mpsc::channel(self.config.outbound_queue_capacity);
            let queue_depth = Arc::new(AtomicUsize::new(0));
            let last_ack = Arc::new(Mutex::new(None));
            self.links.insert(
                peer.clone(),
                PeerLink {
                    config: peer_config,
                    outbound_tx,
                    queue_depth: Arc::clone(&queue_depth),
                    last_ack: Arc::clone(&last_ack),
                },
            );

            let coordinator = Arc::clone(self);
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                coordinator
                    .drain_link(peer, outbound_rx, queue_depth, last_ack, shutdown)
                    .await;
            });
        }
    }

    async fn drain_link(
        &self,
        peer: NodeId,
        mut outbound_rx: mpsc::Receiver<ReplicationRecord>,
        queue_depth: Arc<AtomicUsize>,
        last_ack: Arc<Mutex<Option<tokio::time::Instant>>>,
        mut shutdown: watch::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => {
                    warn!("[Replication:{}] link {} shutting down.", self.node_id, peer);
                    return;
                }
                record = outbound_rx.recv() => {
                    let record = match record {
                        Some(record) => record,
                        None => return,
                    };
                    let _ = queue_depth.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| Some(v.saturating_sub(1)));
                    REPLICATION_QUEUE_DEPTH
                        .with_label_values(&[peer.as_str()])
                        .set(queue_depth.load(Ordering::SeqCst) as f64);
                    self.deliver_with_retry(&peer, record, &last_ack).await;
                }
            }
        }
    }

    /// Exponential-backoff delivery. `max_retries == 0` retries until the
    /// record lands; a bounded policy eventually gives up and leaves
    /// catch-up to partition recovery.
    async fn deliver_with_retry(
        &self,
        peer: &NodeId,
        record: ReplicationRecord,
        last_ack: &Arc<Mutex<Option<tokio::time::Instant>>>,
    ) {
        let timeout = Duration::from_millis(self.retry.timeout_ms);
        let mut attempt = 0usize;
        loop {
            match self.transport.send_record(peer.clone(), record.clone(), timeout).await {
                Ok(_ack) => {
                    *last_ack.lock() = Some(tokio::time::Instant::now());
                    return;
                }
                Err(e) => {
                    if self.retry.max_retries > 0 && attempt >= self.retry.max_retries {
                        warn!(
                            "[Replication:{}] giving up on {} after {} attempts: {:?}",
                            self.node_id, peer, attempt + 1, e
                        );
                        return;
                    }
                    debug!(
                        "[Replication:{}] delivery to {} failed (attempt {}): {:?}",
                        self.node_id, peer, attempt + 1, e
                    );
                    tokio::time::sleep(self.retry.delay_for_attempt(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Publishes one locally committed operation: stamps it with this
    /// node's incremented clock, merges it into the local store, applies it
    /// to storage, and ships it to every peer link.
    ///
    /// Asynchronous links never block the commit path; synchronous links
    /// surface their ack timeout to the caller.
    pub async fn publish(
        &self,
        operation: Operation,
    ) -> Result<VectorClock> {
        let clock = {
            let mut clock = self.clock.lock();
            clock.increment(&self.node_id);
            clock.clone()
        };
        let record = ReplicationRecord::new(operation, clock.clone(), self.node_id.clone(), self.datacenter.clone());

        self.integrate(record.clone()).await;

        struct Outbound {
            peer: NodeId,
            mode: LinkMode,
            tx: mpsc::Sender<ReplicationRecord>,
            queue_depth: Arc<AtomicUsize>,
            last_ack: Arc<Mutex<Option<tokio::time::Instant>>>,
        }
        let outbounds: Vec<Outbound> = self
            .links
            .iter()
            .map(|link| Outbound {
                peer: link.key().clone(),
                mode: self.mode_for(&link.config, &record.operation.collection),
                tx: link.outbound_tx.clone(),
                queue_depth: Arc::clone(&link.queue_depth),
                last_ack: Arc::clone(&link.last_ack),
            })
            .collect();

        for outbound in outbounds {
            match outbound.mode {
                LinkMode::Async => match outbound.tx.try_send(record.clone()) {
                    Ok(()) => {
                        let depth = outbound.queue_depth.fetch_add(1, Ordering::SeqCst) + 1;
                        REPLICATION_QUEUE_DEPTH
                            .with_label_values(&[outbound.peer.as_str()])
                            .set(depth as f64);
                    }
                    Err(e) => {
                        // The local commit stands; the peer catches up
                        // through partition recovery.
                        warn!(
                            "[Replication:{}] outbound queue for {} rejected record: {}",
                            self.node_id, outbound.peer, e
                        );
                    }
                },
                LinkMode::Sync => {
                    let timeout = Duration::from_millis(self.config.sync_ack_timeout_ms);
                    let ack = self
                        .transport
                        .send_record(outbound.peer.clone(), record.clone(), timeout)
                        .await?;
                    *outbound.last_ack.lock() = Some(tokio::time::Instant::now());
                    debug!(
                        "[Replication:{}] sync ack from {} at clock {}",
                        self.node_id, ack.node, ack.clock
                    );
                }
            }
        }

        Ok(clock)
    }

    /// Ingests one record from a peer coordinator. Merges the remote clock
    /// into the local clock (pointwise max plus one on this node's own
    /// entry), then runs the per-key merge.
    pub async fn receive(
        &self,
        record: ReplicationRecord,
    ) -> Result<ReplicationAck> {
        {
            let mut clock = self.clock.lock();
            *clock = clock.merge(&record.vector_clock);
            clock.increment(&self.node_id);
        }

        self.integrate(record).await;

        Ok(ReplicationAck {
            node: self.node_id.clone(),
            clock: self.current_clock(),
        })
    }

    /// Per-key merge. Serialized by a per-key async mutex, so storage sees
    /// causally ordered applies per key while distinct keys proceed
    /// concurrently.
    async fn integrate(
        &self,
        record: ReplicationRecord,
    ) {
        let key = (record.operation.collection.clone(), record.operation.key.clone());
        let cell = self
            .store
            .entry(key)
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(KeyHistory::default())))
            .clone();
        let mut history = cell.lock().await;

        let to_apply = match &history.head {
            None => {
                history.history.push(record.clone());
                history.head = Some(record.clone());
                Some(record)
            }
            Some(head) => match record.vector_clock.compare(&head.vector_clock) {
                CausalOrder::Before | CausalOrder::Equal => {
                    debug!(
                        "[Replication:{}] duplicate or stale record for {:?} dropped",
                        self.node_id,
                        record.key()
                    );
                    None
                }
                CausalOrder::After => {
                    history.history.push(record.clone());
                    history.head = Some(record.clone());
                    Some(record)
                }
                CausalOrder::Concurrent => {
                    let policy = self.policy.read().clone();
                    let conflict = ConflictSet::new(vec![head.clone(), record.clone()]);
                    let winner = conflict.resolve(&policy);
                    CONFLICTS_RESOLVED.with_label_values(&[policy.label()]).inc();
                    debug!(
                        "[Replication:{}] conflict on {:?} resolved by {} in favor of {}",
                        self.node_id,
                        record.key(),
                        policy.label(),
                        winner.origin_node
                    );
                    history.history.push(record);
                    if history.history.last() != Some(&winner) {
                        history.history.push(winner.clone());
                    }
                    history.head = Some(winner.clone());
                    Some(winner)
                }
            },
        };

        if let Some(resolved) = to_apply {
            if let Err(e) = self.state_machine.apply(&resolved.operation, &resolved.vector_clock).await {
                STORAGE_APPLY_FAILURES
                    .with_label_values(&[resolved.operation.collection.as_str()])
                    .inc();
                error!(
                    "[Replication:{}] storage apply failed for {:?}: {:?}",
                    self.node_id,
                    resolved.key(),
                    e
                );
            }
        }
    }

    /// The current resolved value for one key, if any.
    pub async fn head_of(
        &self,
        collection: &str,
        key: &str,
    ) -> Option<ReplicationRecord> {
        let cell = self
            .store
            .get(&(collection.to_string(), key.to_string()))
            .map(|c| c.clone())?;
        let history = cell.lock().await;
        history.head.clone()
    }

    /// Full audit trail for one key, oldest first.
    pub async fn history_of(
        &self,
        collection: &str,
        key: &str,
    ) -> Vec<ReplicationRecord> {
        let cell = match self.store.get(&(collection.to_string(), key.to_string())) {
            Some(c) => c.clone(),
            None => return Vec::new(),
        };
        let history = cell.lock().await;
        history.history.clone()
    }

    /// Records a reconnecting peer is missing: everything not already
    /// covered by `since`. Deterministically ordered for stable replay.
    pub async fn records_since(
        &self,
        since: &VectorClock,
    ) -> Vec<ReplicationRecord> {
        let cells: Vec<Arc<tokio::sync::Mutex<KeyHistory>>> =
            self.store.iter().map(|entry| entry.value().clone()).collect();

        let mut missing = Vec::new();
        for cell in cells {
            let history = cell.lock().await;
            for record in &history.history {
                if !since.dominates(&record.vector_clock) && !missing.contains(record) {
                    missing.push(record.clone());
                }
            }
        }
        missing.sort_by(|a, b| {
            (a.operation.origin_ts_ms, &a.origin_node).cmp(&(b.operation.origin_ts_ms, &b.origin_node))
        });
        missing
    }

    /// Bulk replay after a partition heals. Every record runs through the
    /// ordinary `receive` path; convergence falls out of deterministic
    /// conflict resolution.
    pub async fn resync_with(
        &self,
        records: Vec<ReplicationRecord>,
    ) -> Result<usize> {
        let count = records.len();
        for record in records {
            self.receive(record).await?;
        }
        Ok(count)
    }

    /// Per-link replication lag for the admin surface.
    pub fn link_status(&self) -> Vec<LinkStatus> {
        self.links
            .iter()
            .map(|link| LinkStatus {
                peer: link.key().clone(),
                datacenter: link.config.datacenter.clone(),
                mode: self.mode_for(&link.config, ""),
                queue_depth: link.queue_depth.load(Ordering::SeqCst),
                last_ack_ms_ago: link.last_ack.lock().map(|at| at.elapsed().as_millis() as u64),
            })
            .collect()
    }

    fn mode_for(
        &self,
        link: &PeerLinkConfig,
        collection: &str,
    ) -> LinkMode {
        if let Some(mode) = self.config.collection_modes.get(collection) {
            return *mode;
        }
        link.mode.unwrap_or(*self.default_mode.read())
    }
}

impl<T: TypeConfig> std::fmt::Debug for ReplicationCoordinator<T> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("ReplicationCoordinator")
            .field("node_id", &self.node_id)
            .field("datacenter", &self.datacenter)
            .finish()
    }
}
