//! The Byzantine agreement engine.
//!
//! One engine instance runs per cluster node. Client mutations enter
//! through `propose`/`submit` on the current leader; peer traffic enters
//! through `handle_peer_message`; `run` drives the timers (leader
//! heartbeats, failure detection, prepare-timeout sweep, batch flush).
//!
//! The protocol core is synchronous: all slot transitions happen under one
//! lock and every network interaction goes through the `Transport` seam,
//! so agreement logic is testable without real I/O.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::sync::oneshot;
use tokio::sync::watch;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::batch_buffer::BatchBuffer;
use super::slot::PrePrepareOutcome;
use super::slot::ProposalSlot;
use super::slot::SlotPhase;
use super::slot::VoteOutcome;
use super::timer::ProgressTimer;
use super::view_change::ViewChangeController;
use crate::alias::TROF;
use crate::core::Heartbeat;
use crate::core::MessagePayload;
use crate::core::NewView;
use crate::core::Operation;
use crate::core::PeerMessage;
use crate::core::Proposal;
use crate::core::ProposalDigest;
use crate::core::QuorumCertificate;
use crate::core::ViewChangeVote;
use crate::core::Vote;
use crate::core::VotePhase;
use crate::config::Settings;
use crate::ids::NodeId;
use crate::ids::SequenceNumber;
use crate::ids::ViewNumber;
use crate::membership::MembershipView;
use crate::membership::PeerHealthTracker;
use crate::metrics::EQUIVOCATION_EVENTS;
use crate::metrics::VIEW_CHANGES_TOTAL;
use crate::network::MessageSigner;
use crate::network::Transport;
use crate::replication::ReplicationCoordinator;
use crate::ConsensusError;
use crate::Error;
use crate::ReplicationError;
use crate::Result;
use crate::TypeConfig;

/// Proof of a finalized proposal, returned to the proposer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitHandle {
    pub view: ViewNumber,
    pub sequence: SequenceNumber,
    pub digest: ProposalDigest,
}

/// Shared outcome delivered to every waiter of one proposal round.
#[derive(Debug, Clone)]
pub(crate) enum ProposeOutcome {
    Committed(CommitHandle),
    ReplicationFailed { peer: NodeId, duration_ms: u64 },
    Failed(String),
}

impl ProposeOutcome {
    pub(crate) fn into_result(self) -> Result<CommitHandle> {
        match self {
            ProposeOutcome::Committed(handle) => Ok(handle),
            ProposeOutcome::ReplicationFailed { peer, duration_ms } => Err(ReplicationError::ReplicationTimeout {
                peer,
                duration: Duration::from_millis(duration_ms),
            }
            .into()),
            ProposeOutcome::Failed(reason) => Err(Error::Fatal(reason)),
        }
    }
}

/// A submitted operation waiting for its batch to commit.
pub(crate) struct PendingProposal {
    pub(crate) operation: Operation,
    pub(crate) responder: oneshot::Sender<ProposeOutcome>,
}

/// A committed proposal released for in-order application.
#[derive(Debug)]
pub(crate) struct CommittedBatch {
    pub(crate) proposal: Proposal,
    pub(crate) certificate: QuorumCertificate,
}

struct EngineInner {
    /// Next sequence this node would assign as leader
    next_sequence: SequenceNumber,
    /// Next sequence to release to the applier; commits release strictly in
    /// this order
    next_apply: SequenceNumber,
    /// Highest sequence seen committed anywhere, reported in view changes
    highest_committed: SequenceNumber,
    slots: BTreeMap<SequenceNumber, ProposalSlot>,
    /// Committed but not yet released (a lower sequence is still open)
    committed: BTreeMap<SequenceNumber, CommittedBatch>,
}

pub struct ConsensusEngine<T>
where T: TypeConfig
{
    signer: MessageSigner,
    settings: Arc<Settings>,
    membership: ArcSwap<MembershipView>,
    transport: Arc<TROF<T>>,
    coordinator: Arc<ReplicationCoordinator<T>>,
    health: Arc<PeerHealthTracker>,
    view_change: ViewChangeController,
    inner: Mutex<EngineInner>,
    batch: Mutex<BatchBuffer<PendingProposal>>,
    pending: Arc<DashMap<ProposalDigest, oneshot::Sender<ProposeOutcome>>>,
    committed_tx: mpsc::UnboundedSender<CommittedBatch>,
    leader_timer: Mutex<ProgressTimer>,
}

impl<T> ConsensusEngine<T>
where T: TypeConfig
{
    pub(crate) fn new(
        signer: MessageSigner,
        settings: Arc<Settings>,
        initial_view: MembershipView,
        transport: Arc<TROF<T>>,
        coordinator: Arc<ReplicationCoordinator<T>>,
        health: Arc<PeerHealthTracker>,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<CommittedBatch>) {
        let (committed_tx, committed_rx) = mpsc::unbounded_channel();
        let consensus = &settings.consensus;
        let leader_timer = ProgressTimer::new(
            Duration::from_millis(consensus.failure_timeout_ms),
            (consensus.election_timeout_min_ms, consensus.election_timeout_max_ms),
        );
        let batch = BatchBuffer::new(
            consensus.batch.batch_size,
            Duration::from_millis(consensus.batch.batch_timeout_ms),
        );
        let view_number = initial_view.view_number();

        let engine = Arc::new(Self {
            signer,
            settings,
            membership: ArcSwap::from_pointee(initial_view),
            transport,
            coordinator,
            health,
            view_change: ViewChangeController::new(view_number),
            inner: Mutex::new(EngineInner {
                next_sequence: crate::constants::INITIAL_SEQUENCE,
                next_apply: crate::constants::INITIAL_SEQUENCE,
                highest_committed: 0,
                slots: BTreeMap::new(),
                committed: BTreeMap::new(),
            }),
            batch: Mutex::new(batch),
            pending: Arc::new(DashMap::new()),
            committed_tx,
            leader_timer: Mutex::new(leader_timer),
        });
        (engine, committed_rx)
    }

    pub fn node_id(&self) -> &NodeId {
        self.signer.node_id()
    }

    pub fn current_view(&self) -> Arc<MembershipView> {
        self.membership.load_full()
    }

    pub fn is_view_changing(&self) -> bool {
        self.view_change.is_changing()
    }

    pub fn highest_committed(&self) -> SequenceNumber {
        self.inner.lock().highest_committed
    }

    pub(crate) fn pending_waiters(&self) -> Arc<DashMap<ProposalDigest, oneshot::Sender<ProposeOutcome>>> {
        Arc::clone(&self.pending)
    }

    /// Proposes one batch of operations. Leader only: followers answer
    /// `NotLeader` with a redirect hint, and proposals are refused while a
    /// view change is in flight.
    ///
    /// Suspends until commit quorum forms, bounded by `propose_timeout_ms`.
    /// A timeout leaves no partial state behind: votes already cast remain
    /// valid, and the reported outcome is indeterminate.
    pub async fn propose(
        &self,
        operations: Vec<Operation>,
    ) -> Result<CommitHandle> {
        let view = self.current_view();
        if self.view_change.is_changing() {
            return Err(ConsensusError::ViewChanging {
                candidate_view: self.view_change.candidate().unwrap_or(view.view_number() + 1),
            }
            .into());
        }
        if !view.is_leader(self.node_id()) {
            return Err(ConsensusError::NotLeader {
                view: view.view_number(),
                leader: Some(view.leader_id().clone()),
            }
            .into());
        }

        let (proposal, sequence) = {
            let mut inner = self.inner.lock();
            let sequence = inner.next_sequence;
            let proposal = Proposal::new(view.view_number(), sequence, operations, self.node_id().clone())?;
            inner.next_sequence += 1;
            let slot = inner
                .slots
                .entry(sequence)
                .or_insert_with(|| ProposalSlot::new(view.view_number(), sequence));
            slot.accept_pre_prepare(proposal.clone());
            (proposal, sequence)
        };

        let digest = proposal.digest;
        let (tx, rx) = oneshot::channel();
        self.pending.insert(digest, tx);

        debug!(
            "[{}] proposing (view {}, sequence {}) digest {}",
            self.node_id(),
            view.view_number(),
            sequence,
            digest
        );

        self.broadcast_payload(MessagePayload::PrePrepare(proposal), &self.settings.retry.consensus)
            .await?;
        let own_prepare = self.make_vote(VotePhase::Prepare, view.view_number(), sequence, digest);
        self.broadcast_payload(MessagePayload::Vote(own_prepare.clone()), &self.settings.retry.consensus)
            .await?;
        self.ingest_vote(own_prepare).await?;

        let timeout = Duration::from_millis(self.settings.consensus.propose_timeout_ms);
        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(outcome)) => outcome.into_result(),
            // Waiter dropped by a view change: indeterminate.
            Ok(Err(_)) => Err(ConsensusError::QuorumTimeout {
                view: view.view_number(),
                sequence,
            }
            .into()),
            Err(_) => {
                self.pending.remove(&digest);
                Err(ConsensusError::QuorumTimeout {
                    view: view.view_number(),
                    sequence,
                }
                .into())
            }
        }
    }

    /// Enqueues one operation into the current batch round and waits for
    /// its commit. Batches flush on size or on the configured delay.
    pub async fn submit(
        self: &Arc<Self>,
        operation: Operation,
    ) -> Result<CommitHandle> {
        let view = self.current_view();
        if self.view_change.is_changing() {
            return Err(ConsensusError::ViewChanging {
                candidate_view: self.view_change.candidate().unwrap_or(view.view_number() + 1),
            }
            .into());
        }
        if !view.is_leader(self.node_id()) {
            return Err(ConsensusError::NotLeader {
                view: view.view_number(),
                leader: Some(view.leader_id().clone()),
            }
            .into());
        }

        let (tx, rx) = oneshot::channel();
        let flush_now = {
            let mut batch = self.batch.lock();
            batch
                .push(PendingProposal {
                    operation,
                    responder: tx,
                })
                .is_some()
        };
        if flush_now {
            self.flush_batch();
        }

        match rx.await {
            Ok(outcome) => outcome.into_result(),
            Err(_) => Err(ConsensusError::QuorumTimeout {
                view: view.view_number(),
                sequence: 0,
            }
            .into()),
        }
    }

    fn flush_batch(self: &Arc<Self>) {
        let items: Vec<PendingProposal> = { self.batch.lock().take().into() };
        if items.is_empty() {
            return;
        }
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            engine.propose_and_notify(items).await;
        });
    }

    async fn propose_and_notify(
        self: Arc<Self>,
        items: Vec<PendingProposal>,
    ) {
        let operations: Vec<Operation> = items.iter().map(|p| p.operation.clone()).collect();
        let outcome = match self.propose(operations).await {
            Ok(handle) => ProposeOutcome::Committed(handle),
            Err(e) => {
                debug!("[{}] batch proposal failed: {:?}", self.node_id(), e);
                ProposeOutcome::Failed(e.to_string())
            }
        };
        for item in items {
            let _ = item.responder.send(outcome.clone());
        }
    }

    /// Processes one signed message from a peer. Malformed, unsigned, or
    /// unverifiable messages are dropped and logged, never fatal.
    pub async fn handle_peer_message(
        &self,
        message: PeerMessage,
    ) -> Result<()> {
        let view = self.current_view();
        let member = match view.member(&message.sender) {
            Some(member) => member,
            None => {
                warn!(
                    "[{}] dropping {} from non-member {}",
                    self.node_id(),
                    message.message_type(),
                    message.sender
                );
                return Ok(());
            }
        };
        if let Some(key) = &member.verifying_key {
            if !message.verify(key) {
                warn!(
                    "[{}] signature rejected on {} from {}",
                    self.node_id(),
                    message.message_type(),
                    message.sender
                );
                return Ok(());
            }
        }

        self.health.record_heartbeat(&message.sender);

        let sender = message.sender;
        match message.payload {
            MessagePayload::PrePrepare(proposal) => self.on_pre_prepare(sender, proposal).await,
            MessagePayload::Vote(vote) => {
                if vote.voter != sender {
                    warn!("[{}] vote voter {} != sender {}", self.node_id(), vote.voter, sender);
                    return Ok(());
                }
                self.ingest_vote(vote).await
            }
            MessagePayload::ViewChange(vote) => {
                if vote.voter != sender {
                    warn!("[{}] view-change voter mismatch from {}", self.node_id(), sender);
                    return Ok(());
                }
                self.on_view_change_vote(vote).await
            }
            MessagePayload::NewView(new_view) => self.on_new_view(sender, new_view).await,
            MessagePayload::Heartbeat(heartbeat) => {
                self.on_heartbeat(sender, heartbeat);
                Ok(())
            }
        }
    }

    async fn on_pre_prepare(
        &self,
        sender: NodeId,
        proposal: Proposal,
    ) -> Result<()> {
        if !proposal.verify_digest() {
            warn!("[{}] pre-prepare digest mismatch from {}", self.node_id(), sender);
            return Ok(());
        }

        let view = self.current_view();
        if proposal.view != view.view_number() {
            debug!(
                "[{}] dropping pre-prepare for view {} (current {})",
                self.node_id(),
                proposal.view,
                view.view_number()
            );
            return Ok(());
        }
        if view.leader_id() != &sender || proposal.proposer != sender {
            warn!(
                "[{}] pre-prepare from non-leader {} (leader {})",
                self.node_id(),
                sender,
                view.leader_id()
            );
            return Ok(());
        }
        if self.view_change.is_changing() {
            debug!("[{}] ignoring pre-prepare during view change", self.node_id());
            return Ok(());
        }

        let (sequence, digest) = (proposal.sequence, proposal.digest);
        let outcome = {
            let mut inner = self.inner.lock();
            if sequence < inner.next_apply {
                None
            } else {
                inner.next_sequence = inner.next_sequence.max(sequence + 1);
                let slot = inner
                    .slots
                    .entry(sequence)
                    .or_insert_with(|| ProposalSlot::new(proposal.view, sequence));
                Some(slot.accept_pre_prepare(proposal))
            }
        };

        match outcome {
            Some(PrePrepareOutcome::Accepted) => {
                let vote = self.make_vote(VotePhase::Prepare, view.view_number(), sequence, digest);
                self.broadcast_payload(MessagePayload::Vote(vote.clone()), &self.settings.retry.consensus)
                    .await?;
                self.ingest_vote(vote).await
            }
            Some(PrePrepareOutcome::Equivocation { existing, conflicting }) => {
                error!(
                    "[{}] SECURITY: equivocation by leader {} at (view {}, sequence {}): {} vs {}",
                    self.node_id(),
                    sender,
                    view.view_number(),
                    sequence,
                    existing,
                    conflicting
                );
                EQUIVOCATION_EVENTS.with_label_values(&[sender.as_str()]).inc();
                self.trigger_view_change("leader equivocation").await
            }
            Some(PrePrepareOutcome::Duplicate) | None => Ok(()),
        }
    }

    /// Records a vote and walks any transitions it completes: a prepare
    /// quorum triggers this member's commit vote, a commit quorum releases
    /// the proposal toward the applier.
    async fn ingest_vote(
        &self,
        vote: Vote,
    ) -> Result<()> {
        let mut vote = vote;
        loop {
            let view = self.current_view();
            if vote.view != view.view_number() {
                debug!(
                    "[{}] dropping {} vote for view {} (current {})",
                    self.node_id(),
                    vote.phase,
                    vote.view,
                    view.view_number()
                );
                return Ok(());
            }
            if !view.contains(&vote.voter) {
                return Ok(());
            }

            let quorum = view.quorum();
            let outcome = {
                let mut inner = self.inner.lock();
                if vote.sequence < inner.next_apply {
                    return Ok(());
                }
                let slot = inner
                    .slots
                    .entry(vote.sequence)
                    .or_insert_with(|| ProposalSlot::new(vote.view, vote.sequence));
                slot.record_vote(vote.clone(), quorum)
            };

            match outcome {
                VoteOutcome::BecamePrepared => {
                    let commit = self.make_vote(VotePhase::Commit, vote.view, vote.sequence, vote.digest);
                    self.broadcast_payload(MessagePayload::Vote(commit.clone()), &self.settings.retry.consensus)
                        .await?;
                    vote = commit;
                }
                VoteOutcome::BecameCommitted(certificate) => {
                    self.release_committed(certificate);
                    return Ok(());
                }
                VoteOutcome::Recorded => return Ok(()),
                VoteOutcome::Ignored(reason) => {
                    debug!("[{}] vote ignored: {}", self.node_id(), reason);
                    return Ok(());
                }
            }
        }
    }

    /// Moves a freshly committed slot into the release buffer and forwards
    /// every contiguous committed sequence to the applier, preserving
    /// strict sequence order.
    fn release_committed(
        &self,
        certificate: QuorumCertificate,
    ) {
        let mut inner = self.inner.lock();
        let sequence = certificate.sequence;
        if let Some(mut slot) = inner.slots.remove(&sequence) {
            if let Some(proposal) = slot.take_proposal() {
                inner.committed.insert(
                    sequence,
                    CommittedBatch {
                        proposal,
                        certificate,
                    },
                );
            }
        }
        inner.highest_committed = inner.highest_committed.max(sequence);

        while let Some(batch) = { let k = inner.next_apply; inner.committed.remove(&k) } {
            inner.next_apply += 1;
            // Sent under the lock so releases can never reorder.
            if self.committed_tx.send(batch).is_err() {
                warn!("[{}] commit applier is gone", self.node_id());
                return;
            }
        }
    }

    async fn on_view_change_vote(
        &self,
        vote: ViewChangeVote,
    ) -> Result<()> {
        let view = self.current_view();
        if !view.contains(&vote.voter) {
            return Ok(());
        }
        if let Some(decision) = self.view_change.record_vote(vote, view.quorum()) {
            self.install_view(decision.candidate_view, decision.resume_sequence).await?;
        }
        Ok(())
    }

    async fn on_new_view(
        &self,
        sender: NodeId,
        new_view: NewView,
    ) -> Result<()> {
        let current = self.current_view();
        if new_view.view <= current.view_number() {
            return Ok(());
        }
        let expected = current.successor(new_view.view);
        if expected.leader_id() != &sender {
            warn!(
                "[{}] new-view for {} from {}, expected leader {}",
                self.node_id(),
                new_view.view,
                sender,
                expected.leader_id()
            );
            return Ok(());
        }
        self.install_view(new_view.view, new_view.resume_sequence).await
    }

    fn on_heartbeat(
        &self,
        sender: NodeId,
        heartbeat: Heartbeat,
    ) {
        let view = self.current_view();
        if heartbeat.view == view.view_number() && view.leader_id() == &sender {
            self.leader_timer.lock().reset();
        }
    }

    /// Starts a view change toward the next view and casts this member's
    /// vote. Idempotent while a change toward the same or a later candidate
    /// is in flight.
    async fn trigger_view_change(
        &self,
        reason: &str,
    ) -> Result<()> {
        let view = self.current_view();
        let candidate = view.view_number() + 1;
        let last_committed = self.highest_committed();
        let vote = match self.view_change.begin(candidate, last_committed, self.node_id()) {
            Some(vote) => vote,
            None => return Ok(()),
        };

        warn!(
            "[{}] view change toward {} triggered: {}",
            self.node_id(),
            candidate,
            reason
        );
        self.broadcast_payload(MessagePayload::ViewChange(vote.clone()), &self.settings.retry.view_change)
            .await?;
        self.on_view_change_vote(vote).await
    }

    /// Installs `candidate` atomically: readers see either the old or the
    /// new view, never a mix. In-flight slots of the old view are
    /// abandoned; their waiters learn the outcome is indeterminate.
    async fn install_view(
        &self,
        candidate: ViewNumber,
        resume_sequence: SequenceNumber,
    ) -> Result<()> {
        let current = self.current_view();
        if candidate <= current.view_number() {
            return Ok(());
        }
        let next = current.successor(candidate);
        let new_leader = next.leader_id().clone();
        self.membership.store(Arc::new(next));

        let next_sequence = {
            let mut inner = self.inner.lock();
            inner.next_sequence = inner.next_sequence.max(resume_sequence);

            let abandoned: Vec<ProposalDigest> = inner
                .slots
                .values()
                .filter(|slot| slot.phase() < SlotPhase::Committed)
                .filter_map(|slot| slot.accepted().map(|p| p.digest))
                .collect();
            inner.slots.clear();
            for digest in abandoned {
                // Dropping the waiter reports the indeterminate outcome.
                self.pending.remove(&digest);
            }

            // Sequences below the resume point with no committed entry were
            // abandoned by the quorum; skip them so release never stalls.
            while inner.next_apply < resume_sequence && !inner.committed.contains_key(&inner.next_apply) {
                inner.next_apply += 1;
            }
            while let Some(batch) = { let k = inner.next_apply; inner.committed.remove(&k) } {
                inner.next_apply += 1;
                if self.committed_tx.send(batch).is_err() {
                    break;
                }
            }
            inner.next_sequence
        };

        self.view_change.installed(candidate);
        self.leader_timer.lock().reset();
        self.health.record_heartbeat(&new_leader);
        VIEW_CHANGES_TOTAL.inc();
        info!(
            "[{}] installed view {} (leader {}, resume sequence {})",
            self.node_id(),
            candidate,
            new_leader,
            resume_sequence
        );

        if &new_leader == self.node_id() {
            self.broadcast_payload(
                MessagePayload::NewView(NewView {
                    view: candidate,
                    resume_sequence: next_sequence,
                }),
                &self.settings.retry.view_change,
            )
            .await?;
        }
        Ok(())
    }

    fn make_vote(
        &self,
        phase: VotePhase,
        view: ViewNumber,
        sequence: SequenceNumber,
        digest: ProposalDigest,
    ) -> Vote {
        Vote {
            view,
            sequence,
            digest,
            phase,
            voter: self.node_id().clone(),
        }
    }

    async fn broadcast_payload(
        &self,
        payload: MessagePayload,
        retry: &crate::config::BackoffPolicy,
    ) -> Result<()> {
        let view = self.current_view();
        let peers = view.peers_of(self.node_id());
        if peers.is_empty() {
            return Ok(());
        }
        let message = PeerMessage::signed(&self.signer, payload)?;
        self.transport.broadcast_message(peers, message, retry).await
    }

    /// Timer loop: leader heartbeats, leader-failure detection, the
    /// prepare-timeout sweep, and batch flushing. Returns on shutdown.
    pub async fn run(
        self: Arc<Self>,
        mut shutdown: watch::Receiver<()>,
    ) -> Result<()> {
        // Grant the boot leader a full grace window before suspecting it.
        {
            let view = self.current_view();
            self.health.record_heartbeat(view.leader_id());
            self.leader_timer.lock().reset();
        }

        let mut tick = tokio::time::interval(Duration::from_millis(self.settings.consensus.heartbeat_interval_ms));
        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => {
                    warn!("[Engine:{}] shutdown signal received.", self.node_id());
                    return Ok(());
                }
                _ = tick.tick() => {
                    self.on_tick().await;
                }
            }
        }
    }

    async fn on_tick(self: &Arc<Self>) {
        let should_flush = { self.batch.lock().should_flush() };
        if should_flush {
            self.flush_batch();
        }

        let view = self.current_view();
        if view.is_leader(self.node_id()) {
            let heartbeat = MessagePayload::Heartbeat(Heartbeat {
                view: view.view_number(),
            });
            if let Err(e) = self.broadcast_payload(heartbeat, &self.settings.retry.heartbeat).await {
                debug!("[{}] heartbeat broadcast failed: {:?}", self.node_id(), e);
            }
        } else if !self.view_change.is_changing() {
            let failure_timeout = Duration::from_millis(self.settings.consensus.failure_timeout_ms);
            let leader_silent = !self.health.is_alive(view.leader_id(), failure_timeout);
            if leader_silent && self.leader_timer.lock().is_expired() {
                if let Err(e) = self.trigger_view_change("leader heartbeat missed").await {
                    error!("[{}] view change trigger failed: {:?}", self.node_id(), e);
                }
            }
        }

        let prepare_timeout = Duration::from_millis(self.settings.consensus.prepare_timeout_ms);
        let overdue = {
            let inner = self.inner.lock();
            inner.slots.values().any(|slot| slot.prepare_overdue(prepare_timeout))
        };
        if overdue && !self.view_change.is_changing() {
            if let Err(e) = self.trigger_view_change("prepare timeout").await {
                error!("[{}] view change trigger failed: {:?}", self.node_id(), e);
            }
        }
    }
}

impl<T: TypeConfig> std::fmt::Debug for ConsensusEngine<T> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("ConsensusEngine")
            .field("node_id", self.node_id())
            .finish()
    }
}
