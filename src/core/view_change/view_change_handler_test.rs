use crate::core::view_change::InstallDecision;
use crate::core::view_change::ViewChangeController;
use crate::core::ViewChangeVote;
use crate::ids::NodeId;

const QUORUM: usize = 3; // 4-node cluster, f=1

fn vote(
    voter: &str,
    candidate: u64,
    last_committed: u64,
) -> ViewChangeVote {
    ViewChangeVote {
        candidate_view: candidate,
        last_committed_sequence: last_committed,
        voter: NodeId::from(voter),
    }
}

/// # Case 1: beginning a change emits this member's vote exactly once
#[test]
fn test_begin_emits_single_vote() {
    let controller = ViewChangeController::new(0);

    let first = controller.begin(1, 5, &NodeId::from("a"));
    assert_eq!(first, Some(vote("a", 1, 5)));
    assert!(controller.is_changing());
    assert_eq!(controller.candidate(), Some(1));

    // Re-triggering toward the same candidate is idempotent.
    assert_eq!(controller.begin(1, 5, &NodeId::from("a")), None);
}

/// # Case 2: a quorum of matching candidate votes yields the install
/// decision with the resume sequence above every reported commit
#[test]
fn test_quorum_install_decision() {
    let controller = ViewChangeController::new(0);
    controller.begin(1, 4, &NodeId::from("a"));

    assert_eq!(controller.record_vote(vote("a", 1, 4), QUORUM), None);
    assert_eq!(controller.record_vote(vote("b", 1, 7), QUORUM), None);
    let decision = controller.record_vote(vote("c", 1, 2), QUORUM);

    assert_eq!(
        decision,
        Some(InstallDecision {
            candidate_view: 1,
            resume_sequence: 8,
        })
    );
}

/// # Case 3: duplicate voters never complete a quorum
#[test]
fn test_duplicate_voters_ignored() {
    let controller = ViewChangeController::new(0);

    assert_eq!(controller.record_vote(vote("a", 1, 1), QUORUM), None);
    assert_eq!(controller.record_vote(vote("a", 1, 1), QUORUM), None);
    assert_eq!(controller.record_vote(vote("a", 1, 9), QUORUM), None);
    assert_eq!(controller.record_vote(vote("b", 1, 1), QUORUM), None);
}

/// # Case 4: votes for an already-installed view are stale
#[test]
fn test_stale_votes_after_install() {
    let controller = ViewChangeController::new(0);
    controller.begin(1, 0, &NodeId::from("a"));
    controller.record_vote(vote("a", 1, 0), QUORUM);
    controller.record_vote(vote("b", 1, 0), QUORUM);
    assert!(controller.record_vote(vote("c", 1, 0), QUORUM).is_some());

    controller.installed(1);
    assert!(!controller.is_changing());

    assert_eq!(controller.record_vote(vote("d", 1, 0), QUORUM), None);
    assert_eq!(controller.begin(1, 0, &NodeId::from("a")), None);
}

/// # Case 5: a later candidate supersedes an in-flight earlier one
#[test]
fn test_higher_candidate_supersedes() {
    let controller = ViewChangeController::new(0);
    controller.begin(1, 0, &NodeId::from("a"));

    let escalated = controller.begin(3, 0, &NodeId::from("a"));
    assert!(escalated.is_some());
    assert_eq!(controller.candidate(), Some(3));

    // And the reverse direction is refused.
    assert_eq!(controller.begin(2, 0, &NodeId::from("a")), None);
}

/// # Case 6: concurrent tallies for different candidates stay independent
#[test]
fn test_independent_candidate_tallies() {
    let controller = ViewChangeController::new(0);

    controller.record_vote(vote("a", 1, 0), QUORUM);
    controller.record_vote(vote("b", 1, 0), QUORUM);
    controller.record_vote(vote("a", 2, 0), QUORUM);
    controller.record_vote(vote("b", 2, 0), QUORUM);

    // Completing view 2's quorum does not borrow view 1's votes.
    let decision = controller.record_vote(vote("c", 2, 6), QUORUM);
    assert_eq!(
        decision,
        Some(InstallDecision {
            candidate_view: 2,
            resume_sequence: 7,
        })
    );
}
