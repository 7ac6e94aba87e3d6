use std::io::Write;

use crate::config::BatchConfig;
use crate::config::ClusterConfig;
use crate::config::ConflictPolicyKind;
use crate::config::ConsensusConfig;
use crate::config::LinkMode;
use crate::config::MemberConfig;
use crate::config::PeerLinkConfig;
use crate::config::ReplicationConfig;
use crate::config::Settings;
use crate::Error;

fn member(id: &str) -> MemberConfig {
    MemberConfig {
        id: id.to_string(),
        datacenter: "dc-1".to_string(),
        address: format!("127.0.0.1:1900{}", id.len()),
        public_key: String::new(),
    }
}

/// # Case 1: a well-formed cluster config passes validation
#[test]
fn test_cluster_config_valid() {
    let config = ClusterConfig {
        node_id: "a".to_string(),
        datacenter: "dc-1".to_string(),
        listen_address: "127.0.0.1:19001".to_string(),
        initial_members: vec![member("a"), member("b"), member("c"), member("d")],
    };

    assert!(config.validate().is_ok());
}

/// # Case 2: the local node must appear in initial_members
#[test]
fn test_cluster_config_missing_self() {
    let config = ClusterConfig {
        node_id: "zz".to_string(),
        initial_members: vec![member("a"), member("b")],
        ..ClusterConfig::default()
    };

    assert!(matches!(config.validate(), Err(Error::Config(_))));
}

/// # Case 3: duplicate member ids are rejected
#[test]
fn test_cluster_config_duplicate_ids() {
    let config = ClusterConfig {
        node_id: "a".to_string(),
        initial_members: vec![member("a"), member("a")],
        ..ClusterConfig::default()
    };

    assert!(matches!(config.validate(), Err(Error::Config(_))));
}

/// # Case 4: non-hex or wrong-length public keys are rejected
#[test]
fn test_cluster_config_bad_public_key() {
    let mut bad = member("a");
    bad.public_key = "deadbeef".to_string();
    let config = ClusterConfig {
        node_id: "a".to_string(),
        initial_members: vec![bad],
        ..ClusterConfig::default()
    };

    assert!(matches!(config.validate(), Err(Error::Config(_))));
}

/// # Case 5: election timeout range must be a proper interval
#[test]
fn test_consensus_config_bad_election_range() {
    let config = ConsensusConfig {
        election_timeout_min_ms: 300,
        election_timeout_max_ms: 300,
        ..ConsensusConfig::default()
    };

    assert!(matches!(config.validate(), Err(Error::Config(_))));
}

/// # Case 6: failure timeout must exceed the heartbeat cadence
#[test]
fn test_consensus_config_failure_vs_heartbeat() {
    let config = ConsensusConfig {
        heartbeat_interval_ms: 1000,
        failure_timeout_ms: 500,
        ..ConsensusConfig::default()
    };

    assert!(matches!(config.validate(), Err(Error::Config(_))));
}

/// # Case 7: zero-size batches are rejected
#[test]
fn test_consensus_config_zero_batch() {
    let config = ConsensusConfig {
        batch: BatchConfig {
            batch_size: 0,
            batch_timeout_ms: 5,
        },
        ..ConsensusConfig::default()
    };

    assert!(matches!(config.validate(), Err(Error::Config(_))));
}

/// # Case 8: per-collection mode overrides beat the link override, which
/// beats the default
#[test]
fn test_replication_mode_precedence() {
    let link = PeerLinkConfig {
        id: "dc2-a".to_string(),
        datacenter: "dc-2".to_string(),
        address: "10.0.0.2:19001".to_string(),
        mode: Some(LinkMode::Sync),
    };
    let mut config = ReplicationConfig {
        peers: vec![link.clone()],
        default_mode: LinkMode::Async,
        ..ReplicationConfig::default()
    };
    config.collection_modes.insert("billing".to_string(), LinkMode::Async);

    assert_eq!(config.mode_for(&link, "billing"), LinkMode::Async);
    assert_eq!(config.mode_for(&link, "sessions"), LinkMode::Sync);

    let plain = PeerLinkConfig { mode: None, ..link };
    assert_eq!(config.mode_for(&plain, "sessions"), LinkMode::Async);
}

/// # Case 9: settings round-trip from a TOML cluster file
#[test]
fn test_settings_load_from_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("node-a.toml");
    let mut file = std::fs::File::create(&path).expect("create config");
    writeln!(
        file,
        r#"
[cluster]
node_id = "a"
datacenter = "dc-1"
listen_address = "127.0.0.1:19001"

[[cluster.initial_members]]
id = "a"
datacenter = "dc-1"
address = "127.0.0.1:19001"

[[cluster.initial_members]]
id = "b"
datacenter = "dc-1"
address = "127.0.0.1:19002"

[[cluster.initial_members]]
id = "c"
datacenter = "dc-2"
address = "10.0.0.3:19001"

[[cluster.initial_members]]
id = "d"
datacenter = "dc-2"
address = "10.0.0.4:19001"

[consensus]
failure_timeout_ms = 800
heartbeat_interval_ms = 50

[replication]
conflict_policy = "last_write_wins"
"#
    )
    .expect("write config");

    let settings = Settings::load(path.to_str()).expect("load should succeed");
    assert_eq!(settings.cluster.node_id, "a");
    assert_eq!(settings.cluster.initial_members.len(), 4);
    assert_eq!(settings.consensus.failure_timeout_ms, 800);
    assert_eq!(settings.replication.conflict_policy, ConflictPolicyKind::LastWriteWins);
}
