use serde::Deserialize;
use serde::Serialize;

use crate::clock::CausalOrder;
use crate::clock::VectorClock;
use crate::core::Operation;
use crate::ids::NodeId;

/// One committed operation as shipped between coordinators.
///
/// Immutable once created. Conflict resolution never mutates a record; it
/// layers a new one on top, so the full causal history stays auditable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicationRecord {
    pub operation: Operation,
    pub vector_clock: VectorClock,
    pub origin_node: NodeId,
    pub origin_datacenter: String,
}

impl ReplicationRecord {
    pub fn new(
        operation: Operation,
        vector_clock: VectorClock,
        origin_node: NodeId,
        origin_datacenter: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            vector_clock,
            origin_node,
            origin_datacenter: origin_datacenter.into(),
        }
    }

    /// The document identity this record mutates.
    pub fn key(&self) -> (&str, &str) {
        (&self.operation.collection, &self.operation.key)
    }

    pub fn is_concurrent_with(
        &self,
        other: &ReplicationRecord,
    ) -> bool {
        self.vector_clock.compare(&other.vector_clock) == CausalOrder::Concurrent
    }
}

/// Receiver's acknowledgment of one delivered record. Carries the
/// receiver's clock so the sender can reason about replication lag and
/// partition-recovery deltas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicationAck {
    pub node: NodeId,
    pub clock: VectorClock,
}
