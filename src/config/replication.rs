use std::collections::HashMap;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Delivery discipline for one peer datacenter link.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LinkMode {
    /// Caller blocks until the peer acknowledges. Used for strong
    /// cross-datacenter consistency on selected collections.
    Sync,
    /// Fire-and-forget with background retry. Default.
    #[default]
    Async,
}

/// Which deterministic rule resolves a set of concurrent writes.
///
/// Application-supplied merge functions are installed at runtime through
/// `ReplicationCoordinator::configure`; they have no file representation.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicyKind {
    /// Greatest (origin wall-clock ms, origin node id) pair wins
    #[default]
    LastWriteWins,
    /// Greatest origin node id wins, regardless of wall clock
    OriginPrecedence,
}

/// One peer coordinator this node replicates committed operations to.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PeerLinkConfig {
    pub id: String,

    #[serde(default)]
    pub datacenter: String,

    pub address: String,

    /// Overrides `default_mode` for this link when set
    #[serde(default)]
    pub mode: Option<LinkMode>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ReplicationConfig {
    /// Peer coordinators in other nodes/datacenters
    #[serde(default)]
    pub peers: Vec<PeerLinkConfig>,

    /// Delivery mode applied to links without an explicit override
    #[serde(default)]
    pub default_mode: LinkMode,

    /// Per-collection delivery mode overrides (collection name -> mode)
    #[serde(default)]
    pub collection_modes: HashMap<String, LinkMode>,

    /// Concurrent-write resolution rule
    #[serde(default)]
    pub conflict_policy: ConflictPolicyKind,

    /// Ack deadline for synchronous links (ms)
    #[serde(default = "default_sync_ack_timeout")]
    pub sync_ack_timeout_ms: u64,

    /// Bounded depth of each asynchronous link's outbound queue
    #[serde(default = "default_outbound_queue_capacity")]
    pub outbound_queue_capacity: usize,
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            peers: vec![],
            default_mode: LinkMode::default(),
            collection_modes: HashMap::new(),
            conflict_policy: ConflictPolicyKind::default(),
            sync_ack_timeout_ms: default_sync_ack_timeout(),
            outbound_queue_capacity: default_outbound_queue_capacity(),
        }
    }
}

impl ReplicationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.sync_ack_timeout_ms == 0 {
            return Err(Error::Config(ConfigError::Message(
                "sync_ack_timeout_ms must be at least 1ms".into(),
            )));
        }

        if self.outbound_queue_capacity == 0 {
            return Err(Error::Config(ConfigError::Message(
                "outbound_queue_capacity cannot be 0".into(),
            )));
        }

        let mut ids = std::collections::HashSet::new();
        for peer in &self.peers {
            if !ids.insert(&peer.id) {
                return Err(Error::Config(ConfigError::Message(format!(
                    "Duplicate peer id {} in replication.peers",
                    peer.id
                ))));
            }
        }

        Ok(())
    }

    /// Delivery mode for a record in `collection` over `link`.
    pub fn mode_for(
        &self,
        link: &PeerLinkConfig,
        collection: &str,
    ) -> LinkMode {
        if let Some(mode) = self.collection_modes.get(collection) {
            return *mode;
        }
        link.mode.unwrap_or(self.default_mode)
    }
}

fn default_sync_ack_timeout() -> u64 {
    2000
}
fn default_outbound_queue_capacity() -> usize {
    1024
}
