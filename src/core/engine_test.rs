use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::config::ConsensusConfig;
use crate::config::Settings;
use crate::core::CommitApplier;
use crate::core::CommitStream;
use crate::core::ConsensusEngine;
use crate::core::MessagePayload;
use crate::core::Operation;
use crate::core::Proposal;
use crate::core::ViewChangeVote;
use crate::core::Vote;
use crate::core::VotePhase;
use crate::ids::NodeId;
use crate::membership::PeerHealthTracker;
use crate::network::InProcessHub;
use crate::network::InProcessTransport;
use crate::network::MessageSigner;
use crate::replication::ReplicationCoordinator;
use crate::config::ReplicationConfig;
use crate::config::RetryPolicies;
use crate::storage::MemStateMachine;
use crate::test_utils::test_cluster;
use crate::test_utils::test_settings;
use crate::test_utils::TestCluster;
use crate::test_utils::TestTypeConfig;
use crate::ConsensusError;
use crate::Error;

struct EngineHarness {
    engine: Arc<ConsensusEngine<TestTypeConfig>>,
    state_machine: Arc<MemStateMachine>,
    health: Arc<PeerHealthTracker>,
    commit_stream: CommitStream,
    _shutdown_tx: watch::Sender<()>,
}

fn build_engine(
    cluster: &TestCluster,
    node: &str,
    settings: Arc<Settings>,
) -> EngineHarness {
    let hub = InProcessHub::new();
    let node_id = NodeId::from(node);
    let transport = Arc::new(InProcessTransport::new(Arc::clone(&hub), node_id.clone()));
    let state_machine = Arc::new(MemStateMachine::new());
    let coordinator = Arc::new(ReplicationCoordinator::new(
        node_id,
        "dc-1",
        ReplicationConfig::default(),
        RetryPolicies::default().replication,
        Arc::clone(&state_machine),
        Arc::clone(&transport),
    ));
    let health = Arc::new(PeerHealthTracker::new());

    let (engine, committed_rx) = ConsensusEngine::new(
        cluster.signer(node).clone(),
        settings,
        cluster.view.clone(),
        transport,
        Arc::clone(&coordinator),
        Arc::clone(&health),
    );

    let commit_stream = CommitStream::default();
    let (shutdown_tx, shutdown_rx) = watch::channel(());
    let mut applier = CommitApplier::new(
        coordinator,
        commit_stream.clone(),
        engine.pending_waiters(),
        committed_rx,
        shutdown_rx,
    );
    tokio::spawn(async move {
        let _ = applier.run().await;
    });

    EngineHarness {
        engine,
        state_machine,
        health,
        commit_stream,
        _shutdown_tx: shutdown_tx,
    }
}

fn sample_ops() -> Vec<Operation> {
    vec![Operation::with_timestamp("docs", "k1", b"v1".to_vec(), 1234)]
}

fn vote_for(
    cluster: &TestCluster,
    voter: &str,
    phase: VotePhase,
    proposal: &Proposal,
) -> crate::core::PeerMessage {
    cluster.signed(
        voter,
        MessagePayload::Vote(Vote {
            view: proposal.view,
            sequence: proposal.sequence,
            digest: proposal.digest,
            phase,
            voter: NodeId::from(voter),
        }),
    )
}

/// # Case 1: propose on a follower redirects to the leader
#[tokio::test]
async fn test_propose_not_leader() {
    let cluster = test_cluster(4);
    let harness = build_engine(&cluster, "b", test_settings());

    match harness.engine.propose(sample_ops()).await {
        Err(Error::Consensus(ConsensusError::NotLeader { view, leader })) => {
            assert_eq!(view, 0);
            assert_eq!(leader, Some(NodeId::from("a")));
        }
        other => panic!("expected NotLeader, got {:?}", other),
    }
}

/// # Case 2: the leader commits once prepare and commit quorums form, the
/// operation reaches storage, and the commit stream reports it
#[tokio::test(flavor = "multi_thread")]
async fn test_leader_commit_path() {
    let cluster = test_cluster(4);
    let harness = build_engine(&cluster, "a", test_settings());
    let mut commits = harness.commit_stream.subscribe();

    let expected = Proposal::new(0, 1, sample_ops(), NodeId::from("a")).expect("proposal");

    let engine = Arc::clone(&harness.engine);
    let proposer = tokio::spawn(async move { engine.propose(sample_ops()).await });
    // Let the proposal register and broadcast before feeding votes.
    tokio::time::sleep(Duration::from_millis(50)).await;

    for voter in ["b", "c"] {
        harness
            .engine
            .handle_peer_message(vote_for(&cluster, voter, VotePhase::Prepare, &expected))
            .await
            .expect("prepare vote");
    }
    for voter in ["b", "c"] {
        harness
            .engine
            .handle_peer_message(vote_for(&cluster, voter, VotePhase::Commit, &expected))
            .await
            .expect("commit vote");
    }

    let handle = proposer
        .await
        .expect("task")
        .expect("proposal should commit");
    assert_eq!(handle.view, 0);
    assert_eq!(handle.sequence, 1);
    assert_eq!(handle.digest, expected.digest);

    let stored = harness.state_machine.get("docs", "k1").expect("applied");
    assert_eq!(stored.payload, b"v1".to_vec());

    let event = tokio::time::timeout(Duration::from_secs(1), commits.recv())
        .await
        .expect("commit event")
        .expect("stream open");
    assert_eq!(event.sequence, 1);
    assert_eq!(event.operation.key, "k1");
    assert_eq!(event.vector_clock.get(&NodeId::from("a")), 1);
}

/// # Case 3: conflicting pre-prepares for one slot force a view change and
/// nothing commits under the faulty leader
#[tokio::test]
async fn test_equivocation_forces_view_change() {
    let cluster = test_cluster(4);
    let harness = build_engine(&cluster, "b", test_settings());

    let honest = Proposal::new(0, 1, sample_ops(), NodeId::from("a")).expect("proposal");
    let forged = Proposal::new(
        0,
        1,
        vec![Operation::with_timestamp("docs", "k1", b"other".to_vec(), 1234)],
        NodeId::from("a"),
    )
    .expect("proposal");

    harness
        .engine
        .handle_peer_message(cluster.signed("a", MessagePayload::PrePrepare(honest)))
        .await
        .expect("first pre-prepare");
    assert!(!harness.engine.is_view_changing());

    harness
        .engine
        .handle_peer_message(cluster.signed("a", MessagePayload::PrePrepare(forged)))
        .await
        .expect("conflicting pre-prepare");

    assert!(harness.engine.is_view_changing());
    assert!(harness.state_machine.is_empty());
}

/// # Case 4: a quorum of view-change votes installs the successor view and
/// rotates leadership
#[tokio::test]
async fn test_view_change_install() {
    let cluster = test_cluster(4);
    let harness = build_engine(&cluster, "b", test_settings());

    for voter in ["a", "c", "d"] {
        harness
            .engine
            .handle_peer_message(cluster.signed(
                voter,
                MessagePayload::ViewChange(ViewChangeVote {
                    candidate_view: 1,
                    last_committed_sequence: 0,
                    voter: NodeId::from(voter),
                }),
            ))
            .await
            .expect("view change vote");
    }

    let view = harness.engine.current_view();
    assert_eq!(view.view_number(), 1);
    assert_eq!(view.leader_id(), &NodeId::from("b"));
    assert!(!harness.engine.is_view_changing());
}

/// # Case 5: messages from non-members are dropped without effect
#[tokio::test]
async fn test_unknown_sender_dropped() {
    let cluster = test_cluster(4);
    let harness = build_engine(&cluster, "b", test_settings());

    let stranger = MessageSigner::generate(NodeId::from("z"));
    let forged = crate::core::PeerMessage::signed(
        &stranger,
        MessagePayload::ViewChange(ViewChangeVote {
            candidate_view: 1,
            last_committed_sequence: 0,
            voter: NodeId::from("z"),
        }),
    )
    .expect("signing");

    harness.engine.handle_peer_message(forged).await.expect("drop is ok");
    assert_eq!(harness.engine.current_view().view_number(), 0);
    assert!(!harness.engine.is_view_changing());
}

/// # Case 6: a message failing signature verification is dropped at the
/// ingress boundary
#[tokio::test]
async fn test_forged_signature_dropped() {
    let cluster = test_cluster(4);
    let harness = build_engine(&cluster, "a", test_settings());

    let proposal = Proposal::new(0, 1, sample_ops(), NodeId::from("a")).expect("proposal");
    // Signed with c's key but claiming to be b.
    let mut forged = vote_for(&cluster, "c", VotePhase::Prepare, &proposal);
    forged.sender = NodeId::from("b");
    if let MessagePayload::Vote(vote) = &mut forged.payload {
        vote.voter = NodeId::from("b");
    }

    harness.engine.handle_peer_message(forged).await.expect("drop is ok");
    // Verification failed before any liveness bookkeeping.
    assert_eq!(harness.health.silent_for(&NodeId::from("b")), None);
}

/// # Case 7: a proposal that cannot gather quorum reports the
/// indeterminate outcome within the propose timeout
#[tokio::test(flavor = "multi_thread")]
async fn test_propose_quorum_timeout() {
    let cluster = test_cluster(4);
    let settings = Arc::new(Settings {
        consensus: ConsensusConfig {
            propose_timeout_ms: 100,
            ..test_settings().consensus.clone()
        },
        ..Settings::default()
    });
    let harness = build_engine(&cluster, "a", settings);

    match harness.engine.propose(sample_ops()).await {
        Err(Error::Consensus(ConsensusError::QuorumTimeout { view, sequence })) => {
            assert_eq!(view, 0);
            assert_eq!(sequence, 1);
        }
        other => panic!("expected QuorumTimeout, got {:?}", other),
    }
}
