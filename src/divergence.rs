//! Comparing shortest paths before and after closures.

use std::fmt;

use serde::Serialize;

use crate::paths::ShortestPaths;

/// The outcome of comparing two sets of shortest paths.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Divergence {
    /// Sum of the absolute distance changes over pairs reachable in both states.
    pub total: f64,
    /// Number of ordered pairs whose finite distance changed.
    pub changed_pairs: usize,
    /// Number of ordered pairs reachable before but not after. They don't add to the total.
    pub disconnected_pairs: usize,
}

impl fmt::Display for Divergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} pairs changed, {} pairs disconnected)",
            self.total, self.changed_pairs, self.disconnected_pairs
        )
    }
}

/// Sums the absolute change in distance over every ordered pair `(s, t)`, `s != t`, of `before`.
///
/// Only pairs reachable in both states contribute. Pairs that become (or already were)
/// unreachable add nothing. Each undirected pair is counted in both directions and the sum isn't
/// normalised.
///
/// # Examples
///
/// ```
/// use severance::divergence::divergence;
/// use severance::edge::Link;
/// use severance::graph::Graph;
/// use severance::paths::{all_pairs_shortest_paths, DistanceMode};
///
/// let mut graph = Graph::new();
/// graph.add_edge("a", "b", Link::new(1.0));
/// graph.add_edge("b", "c", Link::new(1.0));
/// graph.add_edge("a", "c", Link::new(5.0));
///
/// let before = all_pairs_shortest_paths(&graph, DistanceMode::Weighted);
/// graph.remove_edge(&"b", &"c");
/// let after = all_pairs_shortest_paths(&graph, DistanceMode::Weighted);
///
/// // a-c grows from 2 to 5 and b-c from 1 to 6, both counted twice.
/// assert_eq!(divergence(&before, &after), 16.0);
/// assert_eq!(divergence(&before, &before), 0.0);
/// ```
pub fn divergence<T: Ord>(before: &ShortestPaths<T>, after: &ShortestPaths<T>) -> f64 {
    compare(before, after).total
}

/// Compares two sets of shortest paths, see [`divergence`] for how the total is computed.
pub fn compare<T: Ord>(before: &ShortestPaths<T>, after: &ShortestPaths<T>) -> Divergence {
    let mut result = Divergence::default();

    for (source, targets) in before.iter() {
        let after_targets = after.from_source(source);

        for (target, d0) in targets {
            if source == target {
                continue;
            }

            match after_targets.and_then(|t| t.get(target)) {
                Some(d1) if d0 != d1 => {
                    result.total += (d0 - d1).abs();
                    result.changed_pairs += 1;
                }
                Some(_) => {}
                None => result.disconnected_pairs += 1,
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use proptest::prelude::*;

    use super::*;

    fn paths(rows: &[(&'static str, &[(&'static str, f64)])]) -> ShortestPaths<&'static str> {
        rows.iter()
            .map(|(source, targets)| {
                let targets: BTreeMap<_, _> = targets.iter().copied().collect();
                (*source, targets)
            })
            .collect()
    }

    #[test]
    fn identical_results() {
        let result = paths(&[
            ("a", &[("a", 0.0), ("b", 1.0)]),
            ("b", &[("a", 1.0), ("b", 0.0)]),
        ]);

        assert_eq!(compare(&result, &result), Divergence::default());
    }

    #[test]
    fn empty_results() {
        let empty: ShortestPaths<&str> = ShortestPaths::default();

        assert_eq!(divergence(&empty, &empty), 0.0);
    }

    #[test]
    fn changed_distances() {
        let before = paths(&[
            ("a", &[("b", 1.0), ("c", 2.0)]),
            ("c", &[("a", 2.0)]),
        ]);
        let after = paths(&[
            ("a", &[("b", 1.0), ("c", 6.0)]),
            ("c", &[("a", 6.0)]),
        ]);

        let result = compare(&before, &after);

        assert_eq!(result.total, 8.0);
        assert_eq!(result.changed_pairs, 2);
        assert_eq!(result.disconnected_pairs, 0);
    }

    #[test]
    fn shorter_paths_count_too() {
        let before = paths(&[("a", &[("b", 4.0)])]);
        let after = paths(&[("a", &[("b", 1.5)])]);

        assert_eq!(divergence(&before, &after), 2.5);
    }

    #[test]
    fn new_unreachability_is_not_penalised() {
        let before = paths(&[
            ("a", &[("b", 1.0), ("c", 2.0)]),
            ("b", &[("a", 1.0), ("c", 1.0)]),
        ]);
        // `a` lost every target and `b` can no longer reach `a`.
        let after = paths(&[("a", &[("a", 0.0)]), ("b", &[("c", 1.0)])]);

        let result = compare(&before, &after);

        assert_eq!(result.total, 0.0);
        assert_eq!(result.disconnected_pairs, 3);
    }

    #[test]
    fn missing_source_in_after() {
        let before = paths(&[("a", &[("b", 1.0)])]);
        let after = paths(&[]);

        assert_eq!(compare(&before, &after).disconnected_pairs, 1);
        assert_eq!(divergence(&before, &after), 0.0);
    }

    #[test]
    fn pairs_only_reachable_after_are_ignored() {
        let before = paths(&[("a", &[("a", 0.0)])]);
        let after = paths(&[("a", &[("a", 0.0), ("b", 3.0)])]);

        assert_eq!(compare(&before, &after), Divergence::default());
    }

    fn arbitrary_paths() -> impl Strategy<Value = ShortestPaths<u8>> {
        prop::collection::btree_map(
            0u8..8,
            prop::collection::btree_map(0u8..8, 0.0f64..100.0, 0..8),
            0..8,
        )
        .prop_map(|rows| rows.into_iter().collect())
    }

    proptest! {
        #[test]
        fn identity(result in arbitrary_paths()) {
            prop_assert_eq!(divergence(&result, &result), 0.0);
        }

        #[test]
        fn non_negative(before in arbitrary_paths(), after in arbitrary_paths()) {
            prop_assert!(divergence(&before, &after) >= 0.0);
        }
    }
}
