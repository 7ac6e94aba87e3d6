use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Static identity of one voting member, as configured.
///
/// `public_key` is the hex form of the member's ed25519 verifying key, used
/// to authenticate every protocol message it signs.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct MemberConfig {
    pub id: String,

    #[serde(default = "default_datacenter")]
    pub datacenter: String,

    pub address: String,

    #[serde(default)]
    pub public_key: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ClusterConfig {
    #[serde(default = "default_node_id")]
    pub node_id: String,

    #[serde(default = "default_datacenter")]
    pub datacenter: String,

    #[serde(default = "default_listen_addr")]
    pub listen_address: String,

    #[serde(default)]
    pub initial_members: Vec<MemberConfig>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            datacenter: default_datacenter(),
            listen_address: default_listen_addr(),
            initial_members: vec![],
        }
    }
}

impl ClusterConfig {
    /// Validates cluster topology consistency.
    pub fn validate(&self) -> Result<()> {
        if self.node_id.is_empty() {
            return Err(Error::Config(ConfigError::Message("node_id cannot be empty".into())));
        }

        if self.initial_members.is_empty() {
            return Err(Error::Config(ConfigError::Message(
                "initial_members must contain at least one node".into(),
            )));
        }

        let self_in_cluster = self.initial_members.iter().any(|m| m.id == self.node_id);
        if !self_in_cluster {
            return Err(Error::Config(ConfigError::Message(format!(
                "Current node {} not found in initial_members",
                self.node_id
            ))));
        }

        let mut ids = std::collections::HashSet::new();
        for member in &self.initial_members {
            if !ids.insert(&member.id) {
                return Err(Error::Config(ConfigError::Message(format!(
                    "Duplicate node id {} in initial_members",
                    member.id
                ))));
            }
            if !member.public_key.is_empty() && hex::decode(&member.public_key).map(|b| b.len()) != Ok(32) {
                return Err(Error::Config(ConfigError::Message(format!(
                    "public_key for node {} is not a 32-byte hex string",
                    member.id
                ))));
            }
        }

        Ok(())
    }
}

fn default_node_id() -> String {
    "node-1".to_string()
}
fn default_datacenter() -> String {
    "dc-1".to_string()
}
fn default_listen_addr() -> String {
    "127.0.0.1:19001".to_string()
}
