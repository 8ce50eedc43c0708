//! Severance is a small toolkit for measuring how closing links of a road network changes its
//! shortest paths, though it applies more generally to undirected, weighted graphs.
//!
//! # Basic usage
//!
//! The library is centered around the [`Graph`](graph::Graph) structure, built from links between
//! pairs of vertices. Closures are drawn from a graph, applied to a copy of it, and the
//! [`divergence`](divergence::divergence) between the shortest paths of both states summarises
//! the disruption.
//!
//! ```rust
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! use severance::closures::{apply_closures, select_closures};
//! use severance::divergence::divergence;
//! use severance::edge::Link;
//! use severance::graph::Graph;
//! use severance::paths::{all_pairs_shortest_paths, DistanceMode};
//!
//! // Construct the graph instance, vertex IDs can be any type that is
//! // `Clone + Eq + Hash + Ord + Debug`.
//! let mut graph = Graph::new();
//! graph.add_edge("a", "b", Link::new(120.0));
//! graph.add_edge("b", "c", Link::new(80.0));
//! graph.add_edge("a", "c", Link::new(310.0));
//!
//! // Close a couple of links, the seed makes the draw reproducible.
//! let mut rng = StdRng::seed_from_u64(1);
//! let closures = select_closures(&graph, 2, &mut rng).unwrap();
//! let closed = apply_closures(&graph, &closures);
//!
//! let before = all_pairs_shortest_paths(&graph, DistanceMode::Weighted);
//! let after = all_pairs_shortest_paths(&closed, DistanceMode::Weighted);
//!
//! assert!(divergence(&before, &after) >= 0.0);
//! ```
//!
//! Whole runs over ingested networks are driven by [`run_analysis`](analysis::run_analysis).

#[cfg(test)]
macro_rules! graph {
    ($($path:expr),*) => {{
        let mut graph = $crate::graph::Graph::new();

        $(
            let mut iter = $path.into_iter().peekable();
            while let (Some(a), Some(b)) = (iter.next(), iter.peek()) {
                graph.add_edge(a, *b, $crate::edge::Link::new(1.0));
            }
        )*

        graph
    }}
}

pub mod analysis;
pub mod closures;
pub mod components;
pub mod config;
pub mod divergence;
pub mod edge;
pub mod error;
pub mod graph;
pub mod ingest;
pub mod paths;
pub mod spectral;

pub use error::{Error, Result};
