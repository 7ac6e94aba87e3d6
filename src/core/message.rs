//! Protocol wire types.
//!
//! Every message travels inside a signed [`PeerMessage`] envelope. The
//! signature covers the bincode encoding of the payload, so any mutation in
//! flight fails verification at the receiver's ingress boundary.

use std::fmt;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Deserialize;
use serde::Serialize;
use sha2::Digest as _;
use sha2::Sha256;

use crate::ids::NodeId;
use crate::ids::SequenceNumber;
use crate::ids::ViewNumber;
use crate::network::verify_signature;
use crate::network::MessageSigner;
use crate::Result;

/// One document mutation, as submitted by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub collection: String,
    pub key: String,
    pub payload: Vec<u8>,
    /// Origin wall clock in ms since epoch. Input to the last-write-wins
    /// conflict tiebreak; never used for ordering within a view.
    pub origin_ts_ms: u64,
}

impl Operation {
    pub fn new(
        collection: impl Into<String>,
        key: impl Into<String>,
        payload: Vec<u8>,
    ) -> Self {
        Self::with_timestamp(collection, key, payload, now_ms())
    }

    pub fn with_timestamp(
        collection: impl Into<String>,
        key: impl Into<String>,
        payload: Vec<u8>,
        origin_ts_ms: u64,
    ) -> Self {
        Self {
            collection: collection.into(),
            key: key.into(),
            payload,
            origin_ts_ms,
        }
    }
}

pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// SHA-256 content hash pinning a proposal's identity.
///
/// Two pre-prepares for one (view, sequence) slot with different digests are
/// proof of leader equivocation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProposalDigest([u8; 32]);

impl ProposalDigest {
    pub fn compute<V: Serialize>(value: &V) -> Result<Self> {
        let bytes = bincode::serialize(value).map_err(crate::Error::from)?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(Self(hasher.finalize().into()))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for ProposalDigest {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for ProposalDigest {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "ProposalDigest({}..)", &hex::encode(&self.0[..6]))
    }
}

/// An ordered batch of operations bound to one (view, sequence) slot.
/// Immutable once created; all votes reference it by digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub view: ViewNumber,
    pub sequence: SequenceNumber,
    pub operations: Vec<Operation>,
    pub proposer: NodeId,
    pub digest: ProposalDigest,
}

impl Proposal {
    pub fn new(
        view: ViewNumber,
        sequence: SequenceNumber,
        operations: Vec<Operation>,
        proposer: NodeId,
    ) -> Result<Self> {
        let digest = ProposalDigest::compute(&(view, sequence, &operations, &proposer))?;
        Ok(Self {
            view,
            sequence,
            operations,
            proposer,
            digest,
        })
    }

    /// Recomputes the content hash. False means the proposal was tampered
    /// with after signing or the proposer lied about its digest.
    pub fn verify_digest(&self) -> bool {
        ProposalDigest::compute(&(self.view, self.sequence, &self.operations, &self.proposer))
            .map(|d| d == self.digest)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VotePhase {
    Prepare,
    Commit,
}

impl fmt::Display for VotePhase {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            VotePhase::Prepare => f.write_str("prepare"),
            VotePhase::Commit => f.write_str("commit"),
        }
    }
}

/// One member's endorsement of a proposal digest for one phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub view: ViewNumber,
    pub sequence: SequenceNumber,
    pub digest: ProposalDigest,
    pub phase: VotePhase,
    pub voter: NodeId,
}

/// Threshold proof that a phase transition is safe: >= 2f+1 matching votes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumCertificate {
    pub view: ViewNumber,
    pub sequence: SequenceNumber,
    pub digest: ProposalDigest,
    pub phase: VotePhase,
    pub votes: Vec<Vote>,
}

/// A member's request to depose the current leader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewChangeVote {
    pub candidate_view: ViewNumber,
    /// Highest sequence this member has committed; the new leader resumes
    /// strictly above the quorum maximum of these.
    pub last_committed_sequence: SequenceNumber,
    pub voter: NodeId,
}

/// Broadcast by the incoming leader once a view-change quorum formed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewView {
    pub view: ViewNumber,
    pub resume_sequence: SequenceNumber,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heartbeat {
    pub view: ViewNumber,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessagePayload {
    PrePrepare(Proposal),
    Vote(Vote),
    ViewChange(ViewChangeVote),
    NewView(NewView),
    Heartbeat(Heartbeat),
}

impl MessagePayload {
    pub fn message_type(&self) -> &'static str {
        match self {
            MessagePayload::PrePrepare(_) => "pre-prepare",
            MessagePayload::Vote(v) => match v.phase {
                VotePhase::Prepare => "prepare",
                VotePhase::Commit => "commit",
            },
            MessagePayload::ViewChange(_) => "view-change",
            MessagePayload::NewView(_) => "new-view",
            MessagePayload::Heartbeat(_) => "heartbeat",
        }
    }
}

/// Signed envelope around one protocol message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerMessage {
    pub sender: NodeId,
    pub payload: MessagePayload,
    pub signature: Vec<u8>,
}

impl PeerMessage {
    pub fn signed(
        signer: &MessageSigner,
        payload: MessagePayload,
    ) -> Result<Self> {
        let bytes = bincode::serialize(&payload).map_err(crate::Error::from)?;
        let signature = signer.sign(&bytes);
        Ok(Self {
            sender: signer.node_id().clone(),
            payload,
            signature,
        })
    }

    /// Verifies the envelope signature against `key`. Serialization failure
    /// verifies as false.
    pub fn verify(
        &self,
        key: &ed25519_dalek::VerifyingKey,
    ) -> bool {
        match bincode::serialize(&self.payload) {
            Ok(bytes) => verify_signature(key, &bytes, &self.signature),
            Err(_) => false,
        }
    }

    pub fn message_type(&self) -> &'static str {
        self.payload.message_type()
    }
}
