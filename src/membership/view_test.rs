use crate::ids::NodeId;
use crate::membership::Member;
use crate::membership::MembershipView;

fn members(ids: &[&str]) -> Vec<Member> {
    ids.iter()
        .map(|id| Member {
            id: NodeId::from(*id),
            datacenter: "dc-1".to_string(),
            address: format!("127.0.0.1:19{:03}", id.len()),
            verifying_key: None,
        })
        .collect()
}

/// # Case 1: quorum math for the canonical 4-node cluster (f=1, quorum=3)
#[test]
fn test_quorum_math_four_nodes() {
    let view = MembershipView::new(0, members(&["a", "b", "c", "d"]));

    assert_eq!(view.max_faulty(), 1);
    assert_eq!(view.quorum(), 3);
    assert!(view.is_quorum(3));
    assert!(!view.is_quorum(2));
}

/// # Case 2: quorum math across cluster sizes
#[test]
fn test_quorum_math_scaling() {
    let cases = [(1usize, 0usize, 1usize), (4, 1, 3), (7, 2, 5), (10, 3, 7)];
    for (n, f, q) in cases {
        let ids: Vec<String> = (0..n).map(|i| format!("n{}", i)).collect();
        let refs: Vec<&str> = ids.iter().map(|s| s.as_str()).collect();
        let view = MembershipView::new(0, members(&refs));
        assert_eq!(view.max_faulty(), f, "f for n={}", n);
        assert_eq!(view.quorum(), q, "quorum for n={}", n);
    }
}

/// # Case 3: leader rotates deterministically with the view number
#[test]
fn test_leader_rotation() {
    let base = MembershipView::new(0, members(&["a", "b", "c", "d"]));

    assert_eq!(base.leader_id(), &NodeId::from("a"));
    assert_eq!(base.successor(1).leader_id(), &NodeId::from("b"));
    assert_eq!(base.successor(5).leader_id(), &NodeId::from("b"));
    assert_eq!(base.successor(7).leader_id(), &NodeId::from("d"));
}

/// # Case 4: successor keeps the member list, bumps only the view
#[test]
fn test_successor_preserves_members() {
    let base = MembershipView::new(2, members(&["a", "b", "c", "d"]));
    let next = base.successor(3);

    assert_eq!(next.view_number(), 3);
    assert_eq!(next.member_count(), 4);
    assert!(next.contains(&NodeId::from("c")));
}

/// # Case 5: peers_of excludes the caller only
#[test]
fn test_peers_of_excludes_self() {
    let view = MembershipView::new(0, members(&["a", "b", "c", "d"]));
    let peers = view.peers_of(&NodeId::from("b"));

    assert_eq!(peers.len(), 3);
    assert!(!peers.contains(&NodeId::from("b")));
}

/// # Case 6: unknown nodes have no verifying key and are not members
#[test]
fn test_unknown_node() {
    let view = MembershipView::new(0, members(&["a", "b", "c", "d"]));
    let stranger = NodeId::from("zz");

    assert!(!view.contains(&stranger));
    assert!(view.verifying_key(&stranger).is_err());
}
