//! Per-(view, sequence) agreement state machine.
//!
//! Every member runs the identical transition sequence for each slot:
//! `Idle -> PrePrepared -> Prepared -> Committed`. The slot is pure
//! bookkeeping — no I/O — so the whole protocol core is testable without a
//! network.

use std::collections::HashMap;

use tokio::time::Instant;

use crate::core::Proposal;
use crate::core::ProposalDigest;
use crate::core::QuorumCertificate;
use crate::core::Vote;
use crate::core::VotePhase;
use crate::ids::NodeId;
use crate::ids::SequenceNumber;
use crate::ids::ViewNumber;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum SlotPhase {
    Idle,
    PrePrepared,
    Prepared,
    Committed,
}

/// What accepting a pre-prepare did to the slot.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum PrePrepareOutcome {
    /// First pre-prepare for this slot; the member should cast its Prepare
    /// vote.
    Accepted,
    /// Same digest seen again (network duplicate); nothing to do.
    Duplicate,
    /// A different digest for an occupied slot: leader equivocation.
    Equivocation {
        existing: ProposalDigest,
        conflicting: ProposalDigest,
    },
}

/// What recording a vote did to the slot.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum VoteOutcome {
    /// Vote stored; no phase boundary crossed yet
    Recorded,
    /// Prepare quorum reached; the member should cast its Commit vote
    BecamePrepared,
    /// Commit quorum reached; the operation is durably ordered
    BecameCommitted(QuorumCertificate),
    /// Vote not usable (duplicate, digest mismatch, wrong slot)
    Ignored(&'static str),
}

pub(crate) struct ProposalSlot {
    view: ViewNumber,
    sequence: SequenceNumber,
    phase: SlotPhase,
    accepted: Option<Proposal>,
    prepare_votes: HashMap<NodeId, Vote>,
    commit_votes: HashMap<NodeId, Vote>,
    opened_at: Instant,
}

impl ProposalSlot {
    pub(crate) fn new(
        view: ViewNumber,
        sequence: SequenceNumber,
    ) -> Self {
        Self {
            view,
            sequence,
            phase: SlotPhase::Idle,
            accepted: None,
            prepare_votes: HashMap::new(),
            commit_votes: HashMap::new(),
            opened_at: Instant::now(),
        }
    }

    pub(crate) fn phase(&self) -> SlotPhase {
        self.phase
    }

    pub(crate) fn accepted(&self) -> Option<&Proposal> {
        self.accepted.as_ref()
    }

    pub(crate) fn take_proposal(&mut self) -> Option<Proposal> {
        self.accepted.take()
    }

    /// True when the slot has sat below Prepared longer than `timeout`.
    pub(crate) fn prepare_overdue(
        &self,
        timeout: std::time::Duration,
    ) -> bool {
        self.phase < SlotPhase::Prepared && self.opened_at.elapsed() > timeout
    }

    /// Accepts the leader's proposal for this slot. The first digest wins;
    /// a different digest later is evidence of equivocation, reported to
    /// the caller and never overwritten.
    pub(crate) fn accept_pre_prepare(
        &mut self,
        proposal: Proposal,
    ) -> PrePrepareOutcome {
        debug_assert_eq!(proposal.view, self.view);
        debug_assert_eq!(proposal.sequence, self.sequence);

        match &self.accepted {
            Some(existing) if existing.digest == proposal.digest => PrePrepareOutcome::Duplicate,
            Some(existing) => PrePrepareOutcome::Equivocation {
                existing: existing.digest,
                conflicting: proposal.digest,
            },
            None => {
                self.accepted = Some(proposal);
                if self.phase == SlotPhase::Idle {
                    self.phase = SlotPhase::PrePrepared;
                }
                PrePrepareOutcome::Accepted
            }
        }
    }

    /// Records one vote and advances through any phase boundaries it
    /// completes. Votes arriving ahead of the pre-prepare are buffered and
    /// counted once the proposal lands.
    pub(crate) fn record_vote(
        &mut self,
        vote: Vote,
        quorum: usize,
    ) -> VoteOutcome {
        if vote.view != self.view || vote.sequence != self.sequence {
            return VoteOutcome::Ignored("wrong slot");
        }

        if let Some(accepted) = &self.accepted {
            if accepted.digest != vote.digest {
                return VoteOutcome::Ignored("digest mismatch");
            }
        }

        let book = match vote.phase {
            VotePhase::Prepare => &mut self.prepare_votes,
            VotePhase::Commit => &mut self.commit_votes,
        };
        if book.contains_key(&vote.voter) {
            return VoteOutcome::Ignored("duplicate vote");
        }
        book.insert(vote.voter.clone(), vote);

        self.try_advance(quorum)
    }

    fn try_advance(
        &mut self,
        quorum: usize,
    ) -> VoteOutcome {
        let digest = match &self.accepted {
            Some(p) => p.digest,
            // Buffered votes only; transitions wait for the pre-prepare.
            None => return VoteOutcome::Recorded,
        };

        let mut became_prepared = false;

        if self.phase == SlotPhase::PrePrepared && self.matching(&self.prepare_votes, &digest) >= quorum {
            self.phase = SlotPhase::Prepared;
            became_prepared = true;
        }

        if self.phase == SlotPhase::Prepared && self.matching(&self.commit_votes, &digest) >= quorum {
            self.phase = SlotPhase::Committed;
            let votes = self
                .commit_votes
                .values()
                .filter(|v| v.digest == digest)
                .cloned()
                .collect();
            return VoteOutcome::BecameCommitted(QuorumCertificate {
                view: self.view,
                sequence: self.sequence,
                digest,
                phase: VotePhase::Commit,
                votes,
            });
        }

        if became_prepared {
            VoteOutcome::BecamePrepared
        } else {
            VoteOutcome::Recorded
        }
    }

    fn matching(
        &self,
        book: &HashMap<NodeId, Vote>,
        digest: &ProposalDigest,
    ) -> usize {
        book.values().filter(|v| &v.digest == digest).count()
    }
}
