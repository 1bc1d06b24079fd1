//! Cycle-safe transitive closure over user-editable directed graphs.
//!
//! Group nesting and role inclusion are both edited by API callers and
//! are not guaranteed to be acyclic, so closures are computed with an
//! explicit breadth-first frontier and a visited set instead of recursion.

use std::collections::{BTreeSet, VecDeque};

use crate::error::WardenResult;

/// Returns every node reachable from `seeds` by following `edges` one or
/// more times.
///
/// A seed is part of the result only if some edge leads back to it. Each
/// node is expanded at most once, so the walk terminates on any graph and
/// costs O(E) calls to `edges` over the reachable subgraph. The first
/// error returned by `edges` aborts the walk.
pub fn reachable<K, I, F>(seeds: I, mut edges: F) -> WardenResult<BTreeSet<K>>
where
    K: Ord + Clone,
    I: IntoIterator<Item = K>,
    F: FnMut(&K) -> WardenResult<BTreeSet<K>>,
{
    let mut expanded = BTreeSet::new();
    let mut reached = BTreeSet::new();
    let mut frontier: VecDeque<K> = seeds.into_iter().collect();

    while let Some(node) = frontier.pop_front() {
        if !expanded.insert(node.clone()) {
            continue;
        }
        for next in edges(&node)? {
            if !expanded.contains(&next) {
                frontier.push_back(next.clone());
            }
            reached.insert(next);
        }
    }

    Ok(reached)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::error::WardenError;

    fn graph(edges: &[(u32, u32)]) -> BTreeMap<u32, BTreeSet<u32>> {
        let mut adjacency: BTreeMap<u32, BTreeSet<u32>> = BTreeMap::new();
        for (from, to) in edges {
            adjacency.entry(*from).or_default().insert(*to);
        }
        adjacency
    }

    fn walk(adjacency: &BTreeMap<u32, BTreeSet<u32>>, seed: u32) -> BTreeSet<u32> {
        reachable([seed], |n| Ok(adjacency.get(n).cloned().unwrap_or_default())).unwrap()
    }

    #[test]
    fn chain_is_followed_to_the_end() {
        let g = graph(&[(1, 2), (2, 3), (3, 4)]);
        assert_eq!(walk(&g, 1), BTreeSet::from([2, 3, 4]));
    }

    #[test]
    fn seed_excluded_without_back_edge() {
        let g = graph(&[(1, 2)]);
        assert!(!walk(&g, 1).contains(&1));
    }

    #[test]
    fn two_node_cycle_terminates() {
        let g = graph(&[(1, 2), (2, 1)]);
        let first = walk(&g, 1);
        assert_eq!(first, BTreeSet::from([1, 2]));
        assert_eq!(walk(&g, 1), first);
    }

    #[test]
    fn self_loop_terminates() {
        let g = graph(&[(7, 7)]);
        assert_eq!(walk(&g, 7), BTreeSet::from([7]));
    }

    #[test]
    fn each_node_expanded_once() {
        // Diamond with a cycle back to the top.
        let g = graph(&[(1, 2), (1, 3), (2, 4), (3, 4), (4, 1)]);
        let mut calls = 0;
        let result = reachable([1], |n| {
            calls += 1;
            Ok(g.get(n).cloned().unwrap_or_default())
        })
        .unwrap();
        assert_eq!(result, BTreeSet::from([1, 2, 3, 4]));
        assert_eq!(calls, 4);
    }

    #[test]
    fn edge_error_aborts_walk() {
        let result: WardenResult<BTreeSet<u32>> = reachable([1], |n| {
            if *n == 2 {
                Err(WardenError::not_found("group", n))
            } else {
                Ok(BTreeSet::from([n + 1]))
            }
        });
        assert!(matches!(result, Err(WardenError::NotFound { .. })));
    }
}
