//! Partitioning graphs into connected components and choosing one to analyse.

use std::{
    collections::{BTreeSet, VecDeque},
    fmt::{self, Debug},
    hash::Hash,
};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::graph::Graph;

/// Computes the connected components of `graph` with a breadth-first search from each vertex not
/// yet visited.
///
/// Every vertex ends up in exactly one component. Vertices are visited in `T`'s order, so the
/// components come out ordered by their smallest member. The result is a snapshot and doesn't
/// follow later mutations of the graph.
///
/// # Examples
///
/// ```
/// use severance::components::connected_components;
/// use severance::edge::Link;
/// use severance::graph::Graph;
///
/// let mut graph = Graph::new();
/// graph.add_edge("a", "b", Link::new(1.0));
/// graph.add_edge("c", "d", Link::new(1.0));
///
/// let components = connected_components(&graph);
/// assert_eq!(components.len(), 2);
/// assert!(components[0].contains("a"));
/// ```
pub fn connected_components<T>(graph: &Graph<T>) -> Vec<BTreeSet<T>>
where
    T: Clone + Eq + Hash + Ord + Debug,
{
    let mut visited: BTreeSet<T> = BTreeSet::new();
    let mut components = Vec::new();
    let mut queue: VecDeque<T> = VecDeque::new();

    for start in graph.nodes() {
        if visited.contains(start) {
            continue;
        }

        let mut component = BTreeSet::new();
        visited.insert(start.clone());
        queue.push_back(start.clone());

        while let Some(current) = queue.pop_front() {
            for neighbor in graph.neighbors(&current) {
                if visited.insert(neighbor.clone()) {
                    queue.push_back(neighbor.clone());
                }
            }
            component.insert(current);
        }

        components.push(component);
    }

    debug!(count = components.len(), "partitioned graph into components");

    components
}

/// Which connected component to take as the analysis domain.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentSelection<T> {
    /// The component with the most vertices.
    #[default]
    Largest,
    /// The component with the fewest vertices.
    Smallest,
    /// The `n`th component when sorted by size, largest first (0-based).
    NthLargest(usize),
    /// The component containing the given vertex.
    Containing(T),
}

impl<T: fmt::Display> fmt::Display for ComponentSelection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Largest => f.write_str("largest"),
            Self::Smallest => f.write_str("smallest"),
            Self::NthLargest(n) => write!(f, "nth largest ({n})"),
            Self::Containing(node) => write!(f, "containing {node}"),
        }
    }
}

/// Picks a component out of a partition according to `selection`.
///
/// Components of equal size are ranked by their position in `components`, the earliest one wins.
/// Returns `None` if the partition is empty or nothing matches.
pub fn select_component<'a, T>(
    components: &'a [BTreeSet<T>],
    selection: &ComponentSelection<T>,
) -> Option<&'a BTreeSet<T>>
where
    T: Ord,
{
    match selection {
        ComponentSelection::Largest => ranked_by_size(components).first().copied(),
        ComponentSelection::Smallest => components
            .iter()
            .enumerate()
            .min_by_key(|(i, component)| (component.len(), *i))
            .map(|(_, component)| component),
        ComponentSelection::NthLargest(n) => ranked_by_size(components).get(*n).copied(),
        ComponentSelection::Containing(node) => {
            components.iter().find(|component| component.contains(node))
        }
    }
}

/// Partitions `graph` and returns the subgraph induced by the selected component.
pub fn component_subgraph<T>(
    graph: &Graph<T>,
    selection: &ComponentSelection<T>,
) -> Option<Graph<T>>
where
    T: Clone + Eq + Hash + Ord + Debug,
{
    let components = connected_components(graph);
    select_component(&components, selection)
        .map(|component| graph.induced_subgraph(component))
}

/// Sorts the components by descending size. The sort is stable so ties keep partition order.
fn ranked_by_size<T>(components: &[BTreeSet<T>]) -> Vec<&BTreeSet<T>> {
    let mut ranked: Vec<&BTreeSet<T>> = components.iter().collect();
    ranked.sort_by(|a, b| b.len().cmp(&a.len()));
    ranked
}
