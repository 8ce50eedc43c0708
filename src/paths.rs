//! A module for computing all-pairs shortest paths.
//!
//! Distances are computed from every vertex with a breadth-first search (hop counts) or with
//! Dijkstra's algorithm (link weights). Both run in `O(N * (N + E))` and `O(N * E log N)`
//! respectively, which is only tractable for sub-networks of a few thousand vertices.

use std::{
    cmp::Ordering,
    collections::{BTreeMap, BinaryHeap, VecDeque},
    fmt::{self, Debug},
    hash::Hash,
    panic,
    sync::atomic::{self, AtomicUsize},
    thread,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::graph::Graph;

pub const MIN_NUM_THREADS: usize = 1;
pub const MAX_NUM_THREADS: usize = 128;

/// The position of a vertex in the indexed adjacency used during the searches.
type GraphIndex = usize;

/// An adjacency list of `(neighbour, weight)` pairs, indexed by vertex position.
type Adjacency = Vec<Vec<(GraphIndex, f64)>>;

/// How path lengths are measured.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMode {
    /// Number of links along the path.
    #[default]
    Hops,
    /// Sum of the link weights along the path.
    Weighted,
}

impl fmt::Display for DistanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hops => f.write_str("hops"),
            Self::Weighted => f.write_str("weighted"),
        }
    }
}

/// The shortest distance from every vertex of a graph to every vertex it can reach.
///
/// Each source maps to itself at distance 0. Unreachable targets are absent rather than stored as
/// an infinite distance.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShortestPaths<T> {
    distances: BTreeMap<T, BTreeMap<T, f64>>,
}

impl<T: Ord> ShortestPaths<T> {
    /// Returns the distance from `source` to `target`, `None` if it can't be reached.
    pub fn distance(&self, source: &T, target: &T) -> Option<f64> {
        self.distances.get(source)?.get(target).copied()
    }

    /// Returns the distances to every target reachable from `source`.
    pub fn from_source(&self, source: &T) -> Option<&BTreeMap<T, f64>> {
        self.distances.get(source)
    }

    /// Returns the sources alongside their reachable targets, in order.
    pub fn iter(&self) -> impl Iterator<Item = (&T, &BTreeMap<T, f64>)> {
        self.distances.iter()
    }

    /// Returns the number of sources.
    pub fn len(&self) -> usize {
        self.distances.len()
    }

    /// Returns whether there are no sources, as for an empty graph.
    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    /// Returns the number of ordered pairs of distinct vertices connected by a path.
    pub fn reachable_pairs(&self) -> usize {
        self.distances
            .iter()
            .map(|(source, targets)| {
                targets.len() - usize::from(targets.contains_key(source))
            })
            .sum()
    }
}

impl<T: Ord> FromIterator<(T, BTreeMap<T, f64>)> for ShortestPaths<T> {
    fn from_iter<I: IntoIterator<Item = (T, BTreeMap<T, f64>)>>(iter: I) -> Self {
        Self {
            distances: iter.into_iter().collect(),
        }
    }
}

/// Computes the shortest distance between every pair of vertices in `graph` on the calling
/// thread.
///
/// # Examples
///
/// ```
/// use severance::edge::Link;
/// use severance::graph::Graph;
/// use severance::paths::{all_pairs_shortest_paths, DistanceMode};
///
/// let mut graph = Graph::new();
/// graph.add_edge("a", "b", Link::new(1.0));
/// graph.add_edge("b", "c", Link::new(1.0));
/// graph.add_edge("a", "c", Link::new(5.0));
///
/// let hops = all_pairs_shortest_paths(&graph, DistanceMode::Hops);
/// let weighted = all_pairs_shortest_paths(&graph, DistanceMode::Weighted);
///
/// assert_eq!(hops.distance(&"a", &"c"), Some(1.0));
/// assert_eq!(weighted.distance(&"a", &"c"), Some(2.0));
/// ```
#[instrument(skip(graph), fields(nodes = graph.node_count()))]
pub fn all_pairs_shortest_paths<T>(graph: &Graph<T>, mode: DistanceMode) -> ShortestPaths<T>
where
    T: Clone + Eq + Hash + Ord + Debug,
{
    let (nodes, adjacency) = index_graph(graph, mode);
    let rows = (0..nodes.len())
        .map(|source| distances_from(source, &adjacency, mode))
        .collect();

    assemble(nodes, rows)
}

/// Computes the same result as [`all_pairs_shortest_paths`] with `num_threads` workers.
///
/// Each worker grabs the next unprocessed source until none are left, the searches only read the
/// shared adjacency and write to their own rows. The thread count is clamped to
/// [`MIN_NUM_THREADS`]..=[`MAX_NUM_THREADS`].
#[instrument(skip(graph), fields(nodes = graph.node_count()))]
pub fn all_pairs_shortest_paths_parallel<T>(
    graph: &Graph<T>,
    mode: DistanceMode,
    num_threads: usize,
) -> ShortestPaths<T>
where
    T: Clone + Eq + Hash + Ord + Debug,
{
    let num_threads = num_threads.clamp(MIN_NUM_THREADS, MAX_NUM_THREADS);
    let (nodes, adjacency) = index_graph(graph, mode);

    let mut rows: Vec<Vec<Option<f64>>> = vec![Vec::new(); nodes.len()];
    let counter = AtomicUsize::new(0);

    thread::scope(|scope| {
        let (counter, adjacency) = (&counter, &adjacency);
        let handles: Vec<_> = (0..num_threads)
            .map(|_| scope.spawn(move || shortest_paths_task(counter, adjacency, mode)))
            .collect();

        for handle in handles {
            match handle.join() {
                Ok(computed) => {
                    for (source, row) in computed {
                        rows[source] = row;
                    }
                }
                Err(payload) => panic::resume_unwind(payload),
            }
        }
    });

    assemble(nodes, rows)
}

/// The worker task: grabs the next unprocessed source, if none are left, exits and returns the
/// rows it computed.
fn shortest_paths_task(
    counter: &AtomicUsize,
    adjacency: &Adjacency,
    mode: DistanceMode,
) -> Vec<(GraphIndex, Vec<Option<f64>>)> {
    let mut rows = Vec::new();

    loop {
        let index = counter.fetch_add(1, atomic::Ordering::Relaxed);
        if index >= adjacency.len() {
            break;
        }
        rows.push((index, distances_from(index, adjacency, mode)));
    }

    rows
}

fn distances_from(
    source: GraphIndex,
    adjacency: &Adjacency,
    mode: DistanceMode,
) -> Vec<Option<f64>> {
    match mode {
        DistanceMode::Hops => breadth_first(source, adjacency),
        DistanceMode::Weighted => dijkstra(source, adjacency),
    }
}

fn breadth_first(source: GraphIndex, adjacency: &Adjacency) -> Vec<Option<f64>> {
    let mut hops: Vec<Option<usize>> = vec![None; adjacency.len()];
    let mut queue: VecDeque<GraphIndex> = VecDeque::new();

    hops[source] = Some(0);
    queue.push_back(source);

    while let Some(current) = queue.pop_front() {
        let next_hops = hops[current].map_or(0, |h| h + 1);
        for &(neighbor, _) in &adjacency[current] {
            if hops[neighbor].is_none() {
                hops[neighbor] = Some(next_hops);
                queue.push_back(neighbor);
            }
        }
    }

    hops.into_iter().map(|h| h.map(|h| h as f64)).collect()
}

/// A vertex queued with a tentative distance. Ordered so the `BinaryHeap` pops the closest first.
#[derive(Clone, Copy, Debug)]
struct Candidate {
    cost: f64,
    node: GraphIndex,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| self.node.cmp(&other.node))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Dijkstra's algorithm, weights must be non-negative.
fn dijkstra(source: GraphIndex, adjacency: &Adjacency) -> Vec<Option<f64>> {
    let mut distance: Vec<Option<f64>> = vec![None; adjacency.len()];
    let mut heap = BinaryHeap::new();

    distance[source] = Some(0.0);
    heap.push(Candidate {
        cost: 0.0,
        node: source,
    });

    while let Some(Candidate { cost, node }) = heap.pop() {
        // Skip stale entries superseded by a shorter path.
        if distance[node].is_some_and(|best| cost > best) {
            continue;
        }

        for &(neighbor, weight) in &adjacency[node] {
            let next = cost + weight;
            if distance[neighbor].map_or(true, |best| next < best) {
                distance[neighbor] = Some(next);
                heap.push(Candidate {
                    cost: next,
                    node: neighbor,
                });
            }
        }
    }

    distance
}

/// Lays the graph out as an index-addressed adjacency list, in vertex order.
fn index_graph<T>(graph: &Graph<T>, mode: DistanceMode) -> (Vec<T>, Adjacency)
where
    T: Clone + Eq + Hash + Ord + Debug,
{
    let nodes: Vec<T> = graph.nodes().cloned().collect();
    let index: BTreeMap<&T, GraphIndex> = nodes.iter().enumerate().map(|(i, n)| (n, i)).collect();

    let adjacency = nodes
        .iter()
        .map(|node| {
            graph
                .neighbors(node)
                .filter_map(|neighbor| {
                    let j = *index.get(neighbor)?;
                    let weight = match mode {
                        DistanceMode::Hops => 1.0,
                        DistanceMode::Weighted => graph.link(node, neighbor)?.weight(),
                    };
                    Some((j, weight))
                })
                .collect()
        })
        .collect();

    (nodes, adjacency)
}

/// Maps the index-addressed rows back onto the vertices, dropping unreachable targets.
fn assemble<T: Clone + Ord>(nodes: Vec<T>, rows: Vec<Vec<Option<f64>>>) -> ShortestPaths<T> {
    let distances: BTreeMap<T, BTreeMap<T, f64>> = nodes
        .iter()
        .zip(rows)
        .map(|(source, row)| {
            let reachable = nodes
                .iter()
                .zip(row)
                .filter_map(|(target, d)| d.map(|d| (target.clone(), d)))
                .collect();
            (source.clone(), reachable)
        })
        .collect();

    debug!(sources = distances.len(), "computed shortest paths");

    ShortestPaths { distances }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rstest::rstest;

    use super::*;
    use crate::{edge::Link, graph::NodeAttributes};

    fn triangle() -> Graph<&'static str> {
        let mut graph = Graph::new();
        graph.add_edge("a", "b", Link::new(1.0));
        graph.add_edge("b", "c", Link::new(1.0));
        graph.add_edge("a", "c", Link::new(5.0));
        graph
    }

    #[rstest]
    #[case::hops(DistanceMode::Hops, 1.0)]
    #[case::weighted(DistanceMode::Weighted, 2.0)]
    fn triangle_distances(#[case] mode: DistanceMode, #[case] expected: f64) {
        let paths = all_pairs_shortest_paths(&triangle(), mode);

        assert_eq!(paths.distance(&"a", &"c"), Some(expected));
        assert_eq!(paths.distance(&"c", &"a"), Some(expected));
        assert_eq!(paths.distance(&"a", &"b"), Some(1.0));
        assert_eq!(paths.distance(&"a", &"a"), Some(0.0));
    }

    #[test]
    fn empty_graph() {
        let graph: Graph<&str> = Graph::new();

        let sequential = all_pairs_shortest_paths(&graph, DistanceMode::Hops);
        let parallel = all_pairs_shortest_paths_parallel(&graph, DistanceMode::Weighted, 4);

        assert!(sequential.is_empty());
        assert!(parallel.is_empty());

        let single = all_pairs_shortest_paths(&graph!(["a", "b"]), DistanceMode::Hops);
        assert!(!single.is_empty());
    }

    #[test]
    fn unreachable_targets_are_absent() {
        let mut graph = graph!(["a", "b"], ["c", "d"]);
        graph.update_node_attributes("e", &NodeAttributes::default());

        let paths = all_pairs_shortest_paths(&graph, DistanceMode::Hops);

        assert_eq!(paths.len(), 5);
        assert_eq!(paths.distance(&"a", &"c"), None);
        assert_eq!(paths.from_source(&"a").map(BTreeMap::len), Some(2));
        assert_eq!(paths.from_source(&"e").map(BTreeMap::len), Some(1));
        assert_eq!(paths.reachable_pairs(), 4);
    }

    #[test]
    fn line_hops() {
        let graph = graph!(["a", "b", "c", "d", "e"]);
        let paths = all_pairs_shortest_paths(&graph, DistanceMode::Hops);

        assert_eq!(paths.distance(&"a", &"e"), Some(4.0));
        assert_eq!(paths.distance(&"b", &"d"), Some(2.0));
        assert_eq!(paths.reachable_pairs(), 20);
    }

    #[test]
    fn weighted_prefers_lighter_detour() {
        let mut graph = Graph::new();
        graph.add_edge("a", "b", Link::new(10.0));
        graph.add_edge("a", "c", Link::new(2.0));
        graph.add_edge("c", "d", Link::new(2.0));
        graph.add_edge("d", "b", Link::new(2.0));

        let paths = all_pairs_shortest_paths(&graph, DistanceMode::Weighted);

        assert_eq!(paths.distance(&"a", &"b"), Some(6.0));
        assert_eq!(paths.distance(&"b", &"c"), Some(4.0));
    }

    #[rstest]
    #[case(DistanceMode::Hops)]
    #[case(DistanceMode::Weighted)]
    fn parallel_matches_sequential(#[case] mode: DistanceMode) {
        let mut graph = Graph::new();
        for i in 0u32..60 {
            graph.add_edge(i, (i * 7 + 3) % 60, Link::new(f64::from(i % 5) + 1.0));
            graph.add_edge(i, (i + 1) % 60, Link::new(3.0));
        }

        let sequential = all_pairs_shortest_paths(&graph, mode);
        for threads in [0, 1, 3, 8] {
            let parallel = all_pairs_shortest_paths_parallel(&graph, mode, threads);
            assert_eq!(parallel, sequential);
        }
    }

    #[test]
    fn candidates_pop_closest_first() {
        let mut heap = BinaryHeap::new();
        heap.push(Candidate { cost: 3.0, node: 0 });
        heap.push(Candidate { cost: 1.0, node: 1 });
        heap.push(Candidate { cost: 2.0, node: 2 });

        assert_eq!(heap.pop().map(|c| c.node), Some(1));
        assert_eq!(heap.pop().map(|c| c.node), Some(2));
        assert_eq!(heap.pop().map(|c| c.node), Some(0));
    }

    proptest! {
        #[test]
        fn distances_are_symmetric(
            edges in prop::collection::vec((0u8..15, 0u8..15, 1u8..10), 0..40),
        ) {
            let mut graph = Graph::new();
            for (u, v, w) in &edges {
                graph.add_edge(*u, *v, Link::new(f64::from(*w)));
            }

            let paths = all_pairs_shortest_paths(&graph, DistanceMode::Weighted);
            for (source, targets) in paths.iter() {
                for (target, distance) in targets {
                    prop_assert_eq!(paths.distance(target, source), Some(*distance));
                }
            }
        }
    }
}
