//! Shared fixtures for unit and cluster tests.

use std::sync::Arc;

use crate::config::ConsensusConfig;
use crate::config::ReplicationConfig;
use crate::config::Settings;
use crate::core::MessagePayload;
use crate::core::PeerMessage;
use crate::ids::NodeId;
use crate::membership::Member;
use crate::membership::MembershipView;
use crate::network::InProcessTransport;
use crate::network::MessageSigner;
use crate::storage::MemStateMachine;
use crate::TypeConfig;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct TestTypeConfig;

impl TypeConfig for TestTypeConfig {
    type TR = InProcessTransport;

    type SM = MemStateMachine;
}

pub(crate) struct TestCluster {
    pub signers: Vec<MessageSigner>,
    pub view: MembershipView,
}

impl TestCluster {
    pub fn signer(
        &self,
        id: &str,
    ) -> &MessageSigner {
        self.signers
            .iter()
            .find(|s| s.node_id().as_str() == id)
            .expect("unknown test node id")
    }

    pub fn signed(
        &self,
        id: &str,
        payload: MessagePayload,
    ) -> PeerMessage {
        PeerMessage::signed(self.signer(id), payload).expect("signing should succeed")
    }
}

/// A cluster fixture with generated identities, single-letter node ids
/// starting at "a", and a genesis view whose leader is "a".
pub(crate) fn test_cluster(n: usize) -> TestCluster {
    let ids: Vec<NodeId> = (0..n)
        .map(|i| NodeId::from(((b'a' + i as u8) as char).to_string().as_str()))
        .collect();
    let signers: Vec<MessageSigner> = ids.iter().map(|id| MessageSigner::generate(id.clone())).collect();
    let members = ids
        .iter()
        .zip(signers.iter())
        .enumerate()
        .map(|(i, (id, signer))| Member {
            id: id.clone(),
            datacenter: "dc-1".to_string(),
            address: format!("127.0.0.1:19{:03}", i + 1),
            verifying_key: Some(signer.verifying_key()),
        })
        .collect();
    TestCluster {
        signers,
        view: MembershipView::new(0, members),
    }
}

/// Settings tuned so tests never wait on production-scale timeouts.
pub(crate) fn test_settings() -> Arc<Settings> {
    Arc::new(Settings {
        consensus: ConsensusConfig {
            election_timeout_min_ms: 10,
            election_timeout_max_ms: 30,
            failure_timeout_ms: 200,
            heartbeat_interval_ms: 40,
            prepare_timeout_ms: 300,
            propose_timeout_ms: 1500,
            ..ConsensusConfig::default()
        },
        replication: ReplicationConfig {
            sync_ack_timeout_ms: 300,
            ..ReplicationConfig::default()
        },
        ..Settings::default()
    })
}
