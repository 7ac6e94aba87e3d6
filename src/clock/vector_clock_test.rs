use crate::clock::CausalOrder;
use crate::clock::VectorClock;
use crate::ids::NodeId;

fn node(id: &str) -> NodeId {
    NodeId::from(id)
}

fn clock_of(entries: &[(&str, u64)]) -> VectorClock {
    let mut clock = VectorClock::new();
    for (id, count) in entries {
        for _ in 0..*count {
            clock.increment(&node(id));
        }
    }
    clock
}

/// # Case 1: increment only touches the caller's own entry
#[test]
fn test_increment_isolated_per_node() {
    let mut clock = VectorClock::new();
    clock.increment(&node("a"));
    clock.increment(&node("a"));
    clock.increment(&node("b"));

    assert_eq!(clock.get(&node("a")), 2);
    assert_eq!(clock.get(&node("b")), 1);
    assert_eq!(clock.get(&node("c")), 0);
}

/// # Case 2: merge is commutative for arbitrary pairs
#[test]
fn test_merge_commutative() {
    let a = clock_of(&[("n1", 3), ("n2", 1)]);
    let b = clock_of(&[("n2", 4), ("n3", 2)]);

    assert_eq!(a.merge(&b), b.merge(&a));
}

/// # Case 3: merge is idempotent
#[test]
fn test_merge_idempotent() {
    let a = clock_of(&[("n1", 3), ("n2", 1)]);

    assert_eq!(a.merge(&a), a);
}

/// # Case 4: merge is associative
#[test]
fn test_merge_associative() {
    let a = clock_of(&[("n1", 3)]);
    let b = clock_of(&[("n2", 2)]);
    let c = clock_of(&[("n1", 1), ("n3", 5)]);

    assert_eq!(a.merge(&b).merge(&c), a.merge(&b.merge(&c)));
}

/// # Case 5: compare(a, a) is Equal
#[test]
fn test_compare_reflexive_equal() {
    let a = clock_of(&[("n1", 2), ("n2", 7)]);

    assert_eq!(a.compare(&a), CausalOrder::Equal);
}

/// # Case 6: Before in one direction implies After in the other
#[test]
fn test_compare_antisymmetric() {
    let earlier = clock_of(&[("n1", 1)]);
    let later = clock_of(&[("n1", 2), ("n2", 1)]);

    assert_eq!(earlier.compare(&later), CausalOrder::Before);
    assert_eq!(later.compare(&earlier), CausalOrder::After);
}

/// # Case 7: divergent entries on both sides are Concurrent
#[test]
fn test_compare_concurrent() {
    let a = clock_of(&[("n1", 2)]);
    let b = clock_of(&[("n2", 1)]);

    assert_eq!(a.compare(&b), CausalOrder::Concurrent);
    assert_eq!(b.compare(&a), CausalOrder::Concurrent);
}

/// # Case 8: absent dimensions read as zero during comparison
#[test]
fn test_compare_missing_entries_as_zero() {
    let empty = VectorClock::new();
    let populated = clock_of(&[("n1", 1)]);

    assert_eq!(empty.compare(&populated), CausalOrder::Before);
    assert!(populated.dominates(&empty));
}

/// # Case 9: merged clock dominates both inputs
#[test]
fn test_merge_dominates_inputs() {
    let a = clock_of(&[("n1", 2), ("n2", 1)]);
    let b = clock_of(&[("n2", 4)]);
    let merged = a.merge(&b);

    assert!(merged.dominates(&a));
    assert!(merged.dominates(&b));
    assert_eq!(merged.get(&node("n2")), 4);
}
