//! Causal timestamp for cross-datacenter replication.
//!
//! A vector clock maps each originating node to the count of events that
//! node has produced. Comparing two clocks tells the replication layer
//! whether two writes are causally related or concurrent.
//!
//! Merge satisfies the usual laws: commutative, associative, idempotent.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::ids::NodeId;

/// Result of comparing two vector clocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CausalOrder {
    /// Every entry <= the other's, at least one strictly less
    Before,
    /// Every entry >= the other's, at least one strictly greater
    After,
    /// All entries match
    Equal,
    /// Neither dominates; the writes happened independently
    Concurrent,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorClock {
    entries: BTreeMap<NodeId, u64>,
}

impl VectorClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counter for one node's dimension. Absent entries read as 0.
    pub fn get(
        &self,
        node: &NodeId,
    ) -> u64 {
        self.entries.get(node).copied().unwrap_or(0)
    }

    /// Strictly increases `node`'s own entry by 1.
    ///
    /// Invariant: a node only ever increments its own entry.
    pub fn increment(
        &mut self,
        node: &NodeId,
    ) {
        *self.entries.entry(node.clone()).or_insert(0) += 1;
    }

    /// Pointwise maximum of both clocks. Pure; does not touch `self`.
    pub fn merge(
        &self,
        other: &VectorClock,
    ) -> VectorClock {
        let mut merged = self.entries.clone();
        for (node, counter) in &other.entries {
            merged
                .entry(node.clone())
                .and_modify(|c| *c = (*c).max(*counter))
                .or_insert(*counter);
        }
        VectorClock { entries: merged }
    }

    /// Compares the causal relationship between two clocks.
    pub fn compare(
        &self,
        other: &VectorClock,
    ) -> CausalOrder {
        let mut less = false;
        let mut greater = false;

        for node in self.entries.keys().chain(other.entries.keys()) {
            let a = self.get(node);
            let b = other.get(node);
            if a < b {
                less = true;
            } else if a > b {
                greater = true;
            }
            if less && greater {
                return CausalOrder::Concurrent;
            }
        }

        match (less, greater) {
            (false, false) => CausalOrder::Equal,
            (true, false) => CausalOrder::Before,
            (false, true) => CausalOrder::After,
            (true, true) => CausalOrder::Concurrent,
        }
    }

    /// True when `self` is causally at or after `other`.
    pub fn dominates(
        &self,
        other: &VectorClock,
    ) -> bool {
        matches!(self.compare(other), CausalOrder::After | CausalOrder::Equal)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &u64)> {
        self.entries.iter()
    }
}

impl fmt::Display for VectorClock {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (node, counter)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}:{}", node, counter)?;
        }
        write!(f, "}}")
    }
}
