//! Passive peer liveness tracking.
//!
//! Every authenticated message or heartbeat from a peer refreshes its
//! last-seen timestamp. The view-change controller consults this to decide
//! whether the current leader has gone quiet; the admin surface reads the
//! same data for member health reporting.

use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

use crate::ids::NodeId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerHealth {
    pub node: NodeId,
    pub healthy: bool,
    /// Milliseconds since the last message from this peer; `None` when
    /// nothing has been heard yet.
    pub silent_for_ms: Option<u64>,
}

#[derive(Debug, Default)]
pub struct PeerHealthTracker {
    last_seen: DashMap<NodeId, Instant>,
}

impl PeerHealthTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_heartbeat(
        &self,
        node: &NodeId,
    ) {
        self.last_seen.insert(node.clone(), Instant::now());
    }

    pub fn silent_for(
        &self,
        node: &NodeId,
    ) -> Option<Duration> {
        self.last_seen.get(node).map(|seen| seen.elapsed())
    }

    /// A peer is alive when heard from within `failure_timeout`. Peers never
    /// heard from are reported dead; a fresh tracker must be primed with
    /// `record_heartbeat` at startup to grant the usual grace window.
    pub fn is_alive(
        &self,
        node: &NodeId,
        failure_timeout: Duration,
    ) -> bool {
        match self.silent_for(node) {
            Some(elapsed) => elapsed <= failure_timeout,
            None => false,
        }
    }

    pub fn snapshot(
        &self,
        peers: &[NodeId],
        failure_timeout: Duration,
    ) -> Vec<PeerHealth> {
        peers
            .iter()
            .map(|node| {
                let silent = self.silent_for(node);
                PeerHealth {
                    node: node.clone(),
                    healthy: silent.map(|d| d <= failure_timeout).unwrap_or(false),
                    silent_for_ms: silent.map(|d| d.as_millis() as u64),
                }
            })
            .collect()
    }
}
