use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// Monotonic leader-epoch number. Incremented only by a successful view change.
pub type ViewNumber = u64;

/// Per-view proposal order assigned by the leader.
pub type SequenceNumber = u64;

/// Opaque, stable identifier for a cluster member.
///
/// Doubles as the vector-clock dimension key, and its lexicographic order is
/// the deterministic tiebreak used by conflict resolution.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh id for a node joining without a configured identity.
    pub fn generate() -> Self {
        Self(nanoid::nanoid!())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}
