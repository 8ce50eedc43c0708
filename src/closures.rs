//! Simulating link closures.
//!
//! Closures are picked at random from the links of a graph, then applied to a copy of it so the
//! original stays available as the "before" state. All randomness comes from a caller supplied
//! [`Rng`], seeding it makes a simulation reproducible.

use std::{fmt::Debug, hash::Hash};

use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    edge::Edge,
    error::{Error, Result},
    graph::Graph,
};

const DEFAULT_MIN_CLOSURES: usize = 3;
const DEFAULT_MAX_CLOSURES: usize = 13;

/// An inclusive range from which the number of closures of a run is drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosureRange {
    pub min: usize,
    pub max: usize,
}

impl Default for ClosureRange {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_CLOSURES,
            max: DEFAULT_MAX_CLOSURES,
        }
    }
}

impl ClosureRange {
    /// Creates a range, failing if `min > max`.
    pub fn new(min: usize, max: usize) -> Result<Self> {
        let range = Self { min, max };
        range.validate()?;
        Ok(range)
    }

    /// Fails with [`Error::InvalidClosureRange`] if `min > max`.
    pub fn validate(&self) -> Result<()> {
        if self.min > self.max {
            return Err(Error::InvalidClosureRange {
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    /// Draws a closure count uniformly from the range.
    ///
    /// # Examples
    ///
    /// ```
    /// use rand::{rngs::StdRng, SeedableRng};
    /// use severance::closures::ClosureRange;
    ///
    /// let mut rng = StdRng::seed_from_u64(7);
    /// let count = ClosureRange::default().draw(&mut rng).unwrap();
    ///
    /// assert!((3..=13).contains(&count));
    /// ```
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<usize> {
        self.validate()?;
        Ok(rng.gen_range(self.min..=self.max))
    }
}

/// How closures are picked from a graph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClosureStrategy {
    /// Independent links, see [`select_closures`].
    #[default]
    RandomEdges,
    /// Consecutive links along cycle-free random walks, see [`select_walk_closures`].
    RandomWalk { min_links: usize, max_links: usize },
}

impl ClosureStrategy {
    /// Selects `count` closures from `graph` using this strategy.
    pub fn select<T, R>(&self, graph: &Graph<T>, count: usize, rng: &mut R) -> Result<Vec<Edge<T>>>
    where
        T: Clone + Eq + Hash + Ord + Debug,
        R: Rng + ?Sized,
    {
        match *self {
            Self::RandomEdges => select_closures(graph, count, rng),
            Self::RandomWalk {
                min_links,
                max_links,
            } => select_walk_closures(graph, count, min_links, max_links, rng),
        }
    }

    /// Fails with [`Error::InvalidWalkLength`] if walk bounds can't produce a walk.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::RandomEdges => Ok(()),
            Self::RandomWalk {
                min_links,
                max_links,
            } => {
                if max_links == 0 || min_links > max_links {
                    return Err(Error::InvalidWalkLength {
                        min: min_links,
                        max: max_links,
                    });
                }
                Ok(())
            }
        }
    }
}

/// Picks `count` links of `graph` to close.
///
/// Each pick chooses a vertex uniformly among those with at least one neighbour, then one of its
/// neighbours uniformly. The same link may be picked more than once. The graph isn't modified.
///
/// Returns [`Error::NoEdgesToClose`] if closures are requested from a graph without edges.
///
/// # Examples
///
/// ```
/// use rand::{rngs::StdRng, SeedableRng};
/// use severance::closures::select_closures;
/// use severance::edge::Link;
/// use severance::graph::Graph;
///
/// let mut graph = Graph::new();
/// graph.add_edge("a", "b", Link::new(1.0));
/// graph.add_edge("b", "c", Link::new(1.0));
///
/// let mut rng = StdRng::seed_from_u64(1);
/// let closures = select_closures(&graph, 4, &mut rng).unwrap();
///
/// assert_eq!(closures.len(), 4);
/// assert!(closures
///     .iter()
///     .all(|closure| graph.contains_edge(closure.source(), closure.target())));
/// ```
pub fn select_closures<T, R>(graph: &Graph<T>, count: usize, rng: &mut R) -> Result<Vec<Edge<T>>>
where
    T: Clone + Eq + Hash + Ord + Debug,
    R: Rng + ?Sized,
{
    if count == 0 {
        return Ok(Vec::new());
    }

    let candidates = linked_nodes(graph);
    if candidates.is_empty() {
        return Err(Error::NoEdgesToClose { requested: count });
    }

    let mut closures = Vec::with_capacity(count);
    for _ in 0..count {
        // Every candidate has a neighbour so neither choice comes back empty.
        let Some(&start) = candidates.choose(rng) else {
            break;
        };
        let neighbors: Vec<&T> = graph.neighbors(start).collect();
        let Some(&end) = neighbors.choose(rng) else {
            continue;
        };

        closures.push(Edge::new(start.clone(), end.clone()));
    }

    debug!(count = closures.len(), "selected closures");

    Ok(closures)
}

/// Picks `count` links to close by walking the graph.
///
/// Walks are drawn with [`random_walk`] and every consecutive pair along a walk becomes a closure
/// until `count` closures have been collected; the last walk is truncated if needed.
pub fn select_walk_closures<T, R>(
    graph: &Graph<T>,
    count: usize,
    min_links: usize,
    max_links: usize,
    rng: &mut R,
) -> Result<Vec<Edge<T>>>
where
    T: Clone + Eq + Hash + Ord + Debug,
    R: Rng + ?Sized,
{
    ClosureStrategy::RandomWalk {
        min_links,
        max_links,
    }
    .validate()?;

    if count == 0 {
        return Ok(Vec::new());
    }

    let mut closures = Vec::with_capacity(count);
    while closures.len() < count {
        let walk = random_walk(graph, min_links, max_links, rng)
            .ok_or(Error::NoEdgesToClose { requested: count })?;

        closures.extend(
            walk.windows(2)
                .take(count - closures.len())
                .map(|pair| Edge::new(pair[0].clone(), pair[1].clone())),
        );
    }

    debug!(count = closures.len(), "selected closures along random walks");

    Ok(closures)
}

/// Draws a random walk without repeated vertices.
///
/// The walk starts at a vertex chosen uniformly among those with a neighbour and repeatedly moves
/// to a random unvisited neighbour. It ends after `max_links` links, when no unvisited neighbour
/// is left, or with probability one half at each step once it spans at least `min_links` links.
/// A walk always spans at least one link. Returns `None` if the graph has no edges between
/// distinct vertices.
pub fn random_walk<T, R>(
    graph: &Graph<T>,
    min_links: usize,
    max_links: usize,
    rng: &mut R,
) -> Option<Vec<T>>
where
    T: Clone + Eq + Hash + Ord + Debug,
    R: Rng + ?Sized,
{
    // A vertex whose only link is a loop can't start a walk.
    let candidates: Vec<&T> = graph
        .nodes()
        .filter(|node| graph.neighbors(node).any(|neighbor| neighbor != *node))
        .collect();
    let start = *candidates.choose(rng)?;
    let min_links = min_links.max(1);

    let mut walk = vec![start.clone()];
    while walk.len() <= max_links {
        let links = walk.len() - 1;
        if links >= min_links && rng.gen_bool(0.5) {
            break;
        }

        let last = walk.last()?;
        let unvisited: Vec<&T> = graph
            .neighbors(last)
            .filter(|neighbor| !walk.contains(*neighbor))
            .collect();
        let Some(&next) = unvisited.choose(rng) else {
            break;
        };

        walk.push(next.clone());
    }

    Some(walk)
}

/// Returns a copy of `graph` with every closure removed.
///
/// Closures that don't match an edge, for instance a link picked twice, are skipped.
pub fn apply_closures<T>(graph: &Graph<T>, closures: &[Edge<T>]) -> Graph<T>
where
    T: Clone + Eq + Hash + Ord + Debug,
{
    let mut closed = graph.clone();
    let mut removed = 0;

    for closure in closures {
        if closed.remove_edge(closure.source(), closure.target()) {
            removed += 1;
        } else {
            debug!(?closure, "closure doesn't match an edge, skipping");
        }
    }

    debug!(requested = closures.len(), removed, "applied closures");

    closed
}

/// The vertices with at least one neighbour, in order.
fn linked_nodes<T>(graph: &Graph<T>) -> Vec<&T>
where
    T: Clone + Eq + Hash + Ord + Debug,
{
    graph
        .nodes()
        .filter(|node| graph.degree(node) > 0)
        .collect()
}
