use std::time::Duration;

use crate::ids::NodeId;
use crate::membership::PeerHealthTracker;

/// # Case 1: a peer never heard from is reported dead
#[tokio::test]
async fn test_unheard_peer_is_dead() {
    let tracker = PeerHealthTracker::new();
    let peer = NodeId::from("b");

    assert!(!tracker.is_alive(&peer, Duration::from_secs(1)));
    assert_eq!(tracker.silent_for(&peer), None);
}

/// # Case 2: a recent heartbeat marks the peer alive
#[tokio::test]
async fn test_recent_heartbeat_alive() {
    let tracker = PeerHealthTracker::new();
    let peer = NodeId::from("b");
    tracker.record_heartbeat(&peer);

    assert!(tracker.is_alive(&peer, Duration::from_secs(1)));
}

/// # Case 3: silence beyond the failure timeout marks the peer dead
#[tokio::test(start_paused = true)]
async fn test_stale_heartbeat_dead() {
    let tracker = PeerHealthTracker::new();
    let peer = NodeId::from("b");
    tracker.record_heartbeat(&peer);

    tokio::time::advance(Duration::from_millis(1500)).await;

    assert!(!tracker.is_alive(&peer, Duration::from_millis(1000)));
}

/// # Case 4: snapshot covers every requested peer
#[tokio::test]
async fn test_snapshot_all_peers() {
    let tracker = PeerHealthTracker::new();
    let heard = NodeId::from("b");
    let silent = NodeId::from("c");
    tracker.record_heartbeat(&heard);

    let snapshot = tracker.snapshot(&[heard.clone(), silent.clone()], Duration::from_secs(1));

    assert_eq!(snapshot.len(), 2);
    assert!(snapshot.iter().find(|p| p.node == heard).unwrap().healthy);
    assert!(!snapshot.iter().find(|p| p.node == silent).unwrap().healthy);
}
