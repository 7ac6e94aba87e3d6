//! Consensus and replication error hierarchy.
//!
//! Errors are layered by protocol area: consensus-protocol outcomes the
//! caller is expected to react to (redirect, back off, re-query), and
//! infrastructure failures (network, storage, serialization).

use std::time::Duration;

use config::ConfigError;

use crate::ids::NodeId;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Infrastructure-level failures (network, storage, serialization)
    #[error(transparent)]
    System(#[from] SystemError),

    /// Configuration validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Consensus protocol outcomes and violations
    #[error(transparent)]
    Consensus(#[from] ConsensusError),

    /// Unrecoverable failures requiring process termination
    #[error("Fatal error: {0}")]
    Fatal(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ConsensusError {
    /// Proposal submitted to a non-leader node. The caller should redirect
    /// to the hinted leader and retry.
    #[error("Not the leader for view {view} (leader hint: {leader:?})")]
    NotLeader { view: u64, leader: Option<NodeId> },

    /// A view change is in progress; retry after backoff once a new leader
    /// is installed.
    #[error("View change in progress (candidate view {candidate_view})")]
    ViewChanging { candidate_view: u64 },

    /// Commit quorum did not form within the propose timeout. The outcome
    /// is indeterminate: votes already cast remain valid and the operation
    /// may still commit through quorum among other nodes. Callers must
    /// re-query commit status rather than assume failure.
    #[error("Quorum timeout for (view {view}, sequence {sequence}); outcome indeterminate")]
    QuorumTimeout { view: u64, sequence: u64 },

    /// Conflicting pre-prepares observed for one (view, sequence) slot.
    /// Evidence of a faulty leader; triggers a view change.
    #[error("Equivocation by {node} at (view {view}, sequence {sequence})")]
    Equivocation { node: NodeId, view: u64, sequence: u64 },

    /// Cluster membership violations
    #[error(transparent)]
    Membership(#[from] MembershipError),

    /// Cross-node replication failures
    #[error(transparent)]
    Replication(#[from] ReplicationError),
}

#[derive(Debug, thiserror::Error)]
pub enum MembershipError {
    /// Message or vote from a node outside the current view
    #[error("Node {node} is not a member of view {view}")]
    UnknownPeer { node: NodeId, view: u64 },

    /// Member list does not satisfy n >= 3f+1 for the configured tolerance
    #[error("Member count {members} cannot tolerate any Byzantine fault (need at least 4)")]
    InsufficientMembers { members: usize },

    /// Missing verification key for a configured member
    #[error("No verifying key for node {node}")]
    NoVerifyingKey { node: NodeId },
}

#[derive(Debug, thiserror::Error)]
pub enum ReplicationError {
    /// Synchronous-mode delivery not acknowledged in time. Surfaced to the
    /// original proposer; asynchronous links retry with backoff instead.
    #[error("Replication to {peer} timed out after {duration:?}")]
    ReplicationTimeout { peer: NodeId, duration: Duration },

    /// Peer link unreachable after retry exhaustion
    #[error("Peer {peer} unreachable for replication")]
    PeerUnreachable { peer: NodeId },

    /// Outbound queue for an asynchronous link is full or closed
    #[error("Replication queue for {peer} rejected record: {reason}")]
    QueueRejected { peer: NodeId, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    /// Message signature did not verify against the sender's membership key
    #[error("Signature rejected for message from {node}")]
    SignatureRejected { node: NodeId },

    /// Peer communication timeout
    #[error("Connection timeout to {node} after {duration:?}")]
    Timeout { node: NodeId, duration: Duration },

    /// Transport-level send failure
    #[error("Failed to send {message_type} to {node}: {reason}")]
    SendFailed {
        node: NodeId,
        message_type: &'static str,
        reason: String,
    },

    /// Internal channel closed while forwarding an event
    #[error("{0}")]
    SignalSendFailed(String),

    /// Internal channel closed while awaiting a response
    #[error("{0}")]
    SignalReceiveFailed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// State machine application errors
    #[error("State machine error: {0}")]
    StateMachineError(String),

    /// Checksum validation failures
    #[error("Data corruption detected at {location}")]
    DataCorruption { location: String },
}

// Serialization is classified separately (it crosses protocol and system layers)
#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    #[error("Bincode serialization failed: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("Invalid key material: {0}")]
    InvalidKey(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    // Network layer
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    // Storage layer
    #[error("Storage operation failed")]
    Storage(#[from] StorageError),

    // Serialization
    #[error("Serialization error")]
    Serialization(#[from] SerializationError),
}

// ============== Conversion Implementations ============== //
impl From<NetworkError> for Error {
    fn from(e: NetworkError) -> Self {
        Error::System(SystemError::Network(e))
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Error::System(SystemError::Storage(e))
    }
}

impl From<SerializationError> for Error {
    fn from(e: SerializationError) -> Self {
        Error::System(SystemError::Serialization(e))
    }
}

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        Error::System(SystemError::Serialization(SerializationError::Bincode(e)))
    }
}

// ===== Consensus error conversions =====

impl From<MembershipError> for Error {
    fn from(e: MembershipError) -> Self {
        Error::Consensus(ConsensusError::Membership(e))
    }
}

impl From<ReplicationError> for Error {
    fn from(e: ReplicationError) -> Self {
        Error::Consensus(ConsensusError::Replication(e))
    }
}
