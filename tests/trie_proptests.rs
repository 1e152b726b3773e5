//! Property-based tests for `PriorityTrie`.
//!
//! Uses differential testing against a `BTreeSet` of intervals as an oracle.

use priority_search_trie::{PriorityTrie, TrieError};
use proptest::prelude::*;
use std::collections::BTreeSet;

const BITS: u32 = 5;
const MAX: u64 = (1 << BITS) - 1;

// ============================================================================
//  Strategies
// ============================================================================

/// Strategy for a valid closed interval within the key width.
fn interval() -> impl Strategy<Value = (u64, u64)> {
    (0..=MAX).prop_flat_map(|start| (Just(start), start..=MAX))
}

fn intervals(max_count: usize) -> impl Strategy<Value = Vec<(u64, u64)>> {
    prop::collection::vec(interval(), 0..=max_count)
}

#[derive(Debug, Clone)]
enum Op {
    Insert(u64, u64),
    Delete(u64, u64),
}

fn operations(max_ops: usize) -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(
        prop_oneof![
            3 => interval().prop_map(|(start, last)| Op::Insert(start, last)),
            2 => interval().prop_map(|(start, last)| Op::Delete(start, last)),
        ],
        0..=max_ops,
    )
}

fn build(intervals: &[(u64, u64)]) -> PriorityTrie {
    let mut trie = PriorityTrie::new(BITS).unwrap();
    for &(start, last) in intervals {
        trie.insert(start, last).unwrap();
    }
    trie
}

/// Collects a query through the cursor API, keeping duplicates visible.
fn walk(trie: &PriorityTrie, left: u64, right: u64) -> Vec<(u64, u64)> {
    let mut found = vec![];
    let mut cur = trie.first_overlap(left, right);
    while let Some(overlap) = cur {
        found.push(overlap.interval());
        cur = trie.next_overlap(left, right, &overlap);
    }
    found.sort();
    found
}

fn expected(oracle: &BTreeSet<(u64, u64)>, left: u64, right: u64) -> Vec<(u64, u64)> {
    oracle
        .iter()
        .copied()
        .filter(|&(start, last)| start <= right && last >= left)
        .collect()
}

// ============================================================================
//  Overlap queries
// ============================================================================

proptest! {
    #[test]
    fn overlaps_match_oracle(stored in intervals(64), (left, right) in interval()) {
        let trie = build(&stored);
        let oracle: BTreeSet<_> = stored.iter().copied().collect();
        prop_assert_eq!(walk(&trie, left, right), expected(&oracle, left, right));
    }

    #[test]
    fn insertion_order_does_not_change_results(
        stored in intervals(48),
        (left, right) in interval()
    ) {
        let mut reversed = stored.clone();
        reversed.reverse();
        let forward = build(&stored);
        let backward = build(&reversed);
        prop_assert_eq!(walk(&forward, left, right), walk(&backward, left, right));
    }

    #[test]
    fn first_overlap_agrees_with_oracle(stored in intervals(64), (left, right) in interval()) {
        let trie = build(&stored);
        let oracle: BTreeSet<_> = stored.iter().copied().collect();
        let found = trie.first_overlap(left, right).map(|overlap| overlap.interval());
        match found {
            Some(interval) => prop_assert!(expected(&oracle, left, right).contains(&interval)),
            None => prop_assert!(expected(&oracle, left, right).is_empty()),
        }
    }

    #[test]
    fn iter_yields_everything_once(stored in intervals(64)) {
        let trie = build(&stored);
        let oracle: BTreeSet<_> = stored.iter().copied().collect();
        let mut all: Vec<_> = trie.iter().collect();
        all.sort();
        prop_assert_eq!(all, oracle.into_iter().collect::<Vec<_>>());
    }
}

// ============================================================================
//  Mutation
// ============================================================================

proptest! {
    #[test]
    fn insert_twice_is_idempotent(stored in intervals(48), (start, last) in interval()) {
        let mut trie = build(&stored);
        trie.insert(start, last).unwrap();
        let before = trie.clone();
        trie.insert(start, last).unwrap();
        prop_assert_eq!(trie, before);
    }

    #[test]
    fn delete_absent_is_a_no_op(stored in intervals(48), (start, last) in interval()) {
        let mut trie = build(&stored);
        prop_assume!(!stored.contains(&(start, last)));
        let before = trie.clone();
        prop_assert_eq!(trie.delete(start, last), Ok(false));
        prop_assert_eq!(trie, before);
    }

    #[test]
    fn deleted_interval_is_never_reported(stored in intervals(48), pick in any::<prop::sample::Index>()) {
        prop_assume!(!stored.is_empty());
        let mut trie = build(&stored);
        let victim = stored[pick.index(stored.len())];
        prop_assert_eq!(trie.delete(victim.0, victim.1), Ok(true));
        prop_assert!(!trie.contains(victim.0, victim.1));

        let mut oracle: BTreeSet<_> = stored.iter().copied().collect();
        oracle.remove(&victim);
        prop_assert_eq!(walk(&trie, 0, MAX), oracle.into_iter().collect::<Vec<_>>());
    }

    #[test]
    fn random_operations_match_oracle(ops in operations(200), (left, right) in interval()) {
        let mut trie = PriorityTrie::new(BITS).unwrap();
        let mut oracle = BTreeSet::new();
        for op in ops {
            match op {
                Op::Insert(start, last) => {
                    trie.insert(start, last).unwrap();
                    oracle.insert((start, last));
                }
                Op::Delete(start, last) => {
                    let stored = oracle.remove(&(start, last));
                    prop_assert_eq!(trie.delete(start, last), Ok(stored));
                }
            }
            prop_assert_eq!(trie.len(), oracle.len());
        }
        prop_assert_eq!(walk(&trie, left, right), expected(&oracle, left, right));
    }

    #[test]
    fn out_of_range_endpoints_are_rejected(start in 0..=MAX, last in (MAX + 1)..1024u64) {
        let mut trie = PriorityTrie::new(BITS).unwrap();
        prop_assert_eq!(
            trie.insert(start, last),
            Err(TrieError::EndpointOutOfRange { value: last, bits: BITS })
        );
        prop_assert_eq!(
            trie.delete(start, last),
            Err(TrieError::EndpointOutOfRange { value: last, bits: BITS })
        );
        prop_assert!(trie.is_empty());
    }
}
