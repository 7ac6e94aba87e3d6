//! Concurrent-write resolution.
//!
//! When two records on the same key carry pairwise-concurrent vector
//! clocks, the coordinator builds a transient [`ConflictSet`] and resolves
//! it with the configured policy. Resolution is a pure function of the
//! records themselves, so every node that sees the same conflict set picks
//! the same winner — the property cross-datacenter convergence rests on.

use std::fmt;
use std::sync::Arc;

use crate::core::Operation;
use crate::config::ConflictPolicyKind;
use crate::replication::ReplicationRecord;

/// Application-supplied merge: derives the surviving operation from the
/// two colliding records. Must itself be deterministic.
pub type MergeFn = dyn Fn(&ReplicationRecord, &ReplicationRecord) -> Operation + Send + Sync;

#[derive(Clone)]
pub enum ConflictPolicy {
    /// Winner is the record with the greater (origin wall-clock ms,
    /// origin node id) pair, node id compared lexicographically. The
    /// tiebreak is total, so identical conflict sets resolve identically
    /// everywhere.
    LastWriteWins,
    /// Winner is the record whose origin node id is lexicographically
    /// greatest, regardless of wall clock.
    OriginPrecedence,
    /// The merge function produces the surviving operation; the layered
    /// record carries the union of both clocks.
    Merge(Arc<MergeFn>),
}

impl ConflictPolicy {
    pub fn from_kind(kind: ConflictPolicyKind) -> Self {
        match kind {
            ConflictPolicyKind::LastWriteWins => ConflictPolicy::LastWriteWins,
            ConflictPolicyKind::OriginPrecedence => ConflictPolicy::OriginPrecedence,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConflictPolicy::LastWriteWins => "last_write_wins",
            ConflictPolicy::OriginPrecedence => "origin_precedence",
            ConflictPolicy::Merge(_) => "merge",
        }
    }
}

impl fmt::Debug for ConflictPolicy {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A transient set of pairwise-concurrent records on one key. Built during
/// merge, resolved to a single record, then discarded.
#[derive(Debug, Clone)]
pub struct ConflictSet {
    records: Vec<ReplicationRecord>,
}

impl ConflictSet {
    pub fn new(records: Vec<ReplicationRecord>) -> Self {
        debug_assert!(records.len() >= 2);
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ReplicationRecord] {
        &self.records
    }

    /// Resolves the set into the surviving record.
    ///
    /// The input order never matters: records are first brought into the
    /// deterministic (wall clock, origin node) order, so every replica
    /// computes the same winner.
    pub fn resolve(
        &self,
        policy: &ConflictPolicy,
    ) -> ReplicationRecord {
        let mut ordered = self.records.clone();
        ordered.sort_by(|a, b| {
            (a.operation.origin_ts_ms, &a.origin_node).cmp(&(b.operation.origin_ts_ms, &b.origin_node))
        });

        match policy {
            ConflictPolicy::LastWriteWins => ordered.last().cloned().expect("conflict set is never empty"),
            ConflictPolicy::OriginPrecedence => ordered
                .iter()
                .max_by(|a, b| (&a.origin_node, a.operation.origin_ts_ms).cmp(&(&b.origin_node, b.operation.origin_ts_ms)))
                .cloned()
                .expect("conflict set is never empty"),
            ConflictPolicy::Merge(merge) => {
                let mut iter = ordered.into_iter();
                let first = iter.next().expect("conflict set is never empty");
                iter.fold(first, |acc, next| {
                    let operation = merge(&acc, &next);
                    let clock = acc.vector_clock.merge(&next.vector_clock);
                    // The layered record inherits the later writer's origin
                    // so repeated merges stay deterministic.
                    let (origin_node, origin_datacenter) =
                        if (next.operation.origin_ts_ms, &next.origin_node)
                            >= (acc.operation.origin_ts_ms, &acc.origin_node)
                        {
                            (next.origin_node.clone(), next.origin_datacenter.clone())
                        } else {
                            (acc.origin_node.clone(), acc.origin_datacenter.clone())
                        };
                    ReplicationRecord::new(operation, clock, origin_node, origin_datacenter)
                })
            }
        }
    }
}
