use crate::core::MessagePayload;
use crate::core::Operation;
use crate::core::PeerMessage;
use crate::core::Proposal;
use crate::ids::NodeId;
use crate::network::MessageSigner;

fn sample_ops() -> Vec<Operation> {
    vec![Operation::with_timestamp("orders", "o-1", b"v1".to_vec(), 1000)]
}

/// # Case 1: identical proposal content hashes identically on every node
#[test]
fn test_digest_deterministic() {
    let a = Proposal::new(0, 1, sample_ops(), NodeId::from("a")).expect("proposal");
    let b = Proposal::new(0, 1, sample_ops(), NodeId::from("a")).expect("proposal");

    assert_eq!(a.digest, b.digest);
    assert!(a.verify_digest());
}

/// # Case 2: any content difference changes the digest
#[test]
fn test_digest_binds_content() {
    let base = Proposal::new(0, 1, sample_ops(), NodeId::from("a")).expect("proposal");
    let other_slot = Proposal::new(0, 2, sample_ops(), NodeId::from("a")).expect("proposal");
    let other_ops = Proposal::new(
        0,
        1,
        vec![Operation::with_timestamp("orders", "o-1", b"v2".to_vec(), 1000)],
        NodeId::from("a"),
    )
    .expect("proposal");

    assert_ne!(base.digest, other_slot.digest);
    assert_ne!(base.digest, other_ops.digest);
}

/// # Case 3: tampering with operations after creation fails digest
/// verification
#[test]
fn test_tampered_proposal_detected() {
    let mut proposal = Proposal::new(0, 1, sample_ops(), NodeId::from("a")).expect("proposal");
    proposal.operations[0].payload = b"forged".to_vec();

    assert!(!proposal.verify_digest());
}

/// # Case 4: signed envelope verifies, and payload mutation breaks it
#[test]
fn test_envelope_signature() {
    let signer = MessageSigner::generate(NodeId::from("a"));
    let proposal = Proposal::new(0, 1, sample_ops(), NodeId::from("a")).expect("proposal");
    let message = PeerMessage::signed(&signer, MessagePayload::PrePrepare(proposal)).expect("signing");

    assert!(message.verify(&signer.verifying_key()));

    let mut forged = message.clone();
    if let MessagePayload::PrePrepare(p) = &mut forged.payload {
        p.sequence = 99;
    }
    assert!(!forged.verify(&signer.verifying_key()));
}

/// # Case 5: message type labels follow the vote phase
#[test]
fn test_message_type_labels() {
    let signer = MessageSigner::generate(NodeId::from("a"));
    let proposal = Proposal::new(0, 1, sample_ops(), NodeId::from("a")).expect("proposal");
    let vote = crate::core::Vote {
        view: 0,
        sequence: 1,
        digest: proposal.digest,
        phase: crate::core::VotePhase::Commit,
        voter: NodeId::from("a"),
    };
    let message = PeerMessage::signed(&signer, MessagePayload::Vote(vote)).expect("signing");

    assert_eq!(message.message_type(), "commit");
}
