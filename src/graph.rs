//! A module for working with graphs.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    fmt::Debug,
    hash::Hash,
};

use serde::{Deserialize, Serialize};

use crate::edge::{Edge, Link};

/// Optional spatial attributes of a node, populated when the ingested links carry geometry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeAttributes {
    pub easting: Option<f64>,
    pub northing: Option<f64>,
}

impl NodeAttributes {
    /// Attributes positioning a node at the given coordinates.
    pub fn at(easting: f64, northing: f64) -> Self {
        Self {
            easting: Some(easting),
            northing: Some(northing),
        }
    }

    /// Overwrites every attribute that is set in `other`, leaving the rest untouched.
    pub fn merge(&mut self, other: &NodeAttributes) {
        if let Some(easting) = other.easting {
            self.easting = Some(easting);
        }
        if let Some(northing) = other.northing {
            self.northing = Some(northing);
        }
    }
}

#[derive(Clone, Debug)]
struct Vertex<T> {
    attributes: NodeAttributes,
    neighbors: BTreeSet<T>,
}

impl<T> Default for Vertex<T> {
    fn default() -> Self {
        Self {
            attributes: NodeAttributes::default(),
            neighbors: BTreeSet::new(),
        }
    }
}

/// An undirected, weighted graph made up of links between vertices.
///
/// Vertices are kept in a `BTreeMap` so every traversal visits them in `T`'s order, which keeps
/// seeded simulations reproducible. At most one [`Link`] is stored per unordered pair of
/// vertices.
///
/// `Clone` produces a fully independent deep copy.
#[derive(Clone, Debug)]
pub struct Graph<T> {
    /// The vertices, their attributes and their adjacency.
    nodes: BTreeMap<T, Vertex<T>>,
    /// The link carried by each edge.
    links: HashMap<Edge<T>, Link>,
}

impl<T> Default for Graph<T>
where
    T: Clone + Eq + Hash + Ord + Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Graph<T>
where
    T: Clone + Eq + Hash + Ord + Debug,
{
    /// Creates an empty graph.
    ///
    /// # Examples
    ///
    /// ```
    /// use severance::graph::Graph;
    ///
    /// let graph: Graph<&str> = Graph::new();
    /// assert!(graph.is_empty());
    /// ```
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
            links: HashMap::new(),
        }
    }

    /// Inserts a link between `u` and `v`, creating either vertex if it doesn't exist yet.
    ///
    /// If the pair was already linked the old link is replaced and returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use severance::edge::Link;
    /// use severance::graph::Graph;
    ///
    /// let mut graph = Graph::new();
    ///
    /// assert!(graph.add_edge("x", "y", Link::new(3.0)).is_none());
    /// assert!(graph.add_edge("y", "x", Link::new(7.0)).is_some());
    ///
    /// assert_eq!(graph.edge_count(), 1);
    /// assert_eq!(graph.link(&"x", &"y").map(|link| link.weight()), Some(7.0));
    /// ```
    pub fn add_edge(&mut self, u: T, v: T, link: Link) -> Option<Link> {
        self.nodes
            .entry(u.clone())
            .or_default()
            .neighbors
            .insert(v.clone());
        self.nodes
            .entry(v.clone())
            .or_default()
            .neighbors
            .insert(u.clone());

        self.links.insert(Edge::new(u, v), link)
    }

    /// Merges `attributes` into the vertex `node`, creating it if it doesn't exist yet.
    pub fn update_node_attributes(&mut self, node: T, attributes: &NodeAttributes) {
        self.nodes
            .entry(node)
            .or_default()
            .attributes
            .merge(attributes);
    }

    /// Removes the edge between `u` and `v` and returns whether it was present.
    ///
    /// Removing an absent edge is a no-op.
    ///
    /// # Examples
    ///
    /// ```
    /// use severance::edge::Link;
    /// use severance::graph::Graph;
    ///
    /// let mut graph = Graph::new();
    /// graph.add_edge("a", "b", Link::new(1.0));
    ///
    /// assert_eq!(graph.remove_edge(&"b", &"a"), true);
    /// assert_eq!(graph.remove_edge(&"a", &"b"), false);
    /// ```
    pub fn remove_edge(&mut self, u: &T, v: &T) -> bool {
        if self
            .links
            .remove(&Edge::new(u.clone(), v.clone()))
            .is_none()
        {
            return false;
        }

        if let Some(vertex) = self.nodes.get_mut(u) {
            vertex.neighbors.remove(v);
        }
        if let Some(vertex) = self.nodes.get_mut(v) {
            vertex.neighbors.remove(u);
        }

        true
    }

    /// Removes a vertex and every edge incident to it, returns whether it was present.
    pub fn remove_node(&mut self, node: &T) -> bool {
        let Some(vertex) = self.nodes.remove(node) else {
            return false;
        };

        for neighbor in vertex.neighbors {
            self.links.remove(&Edge::new(node.clone(), neighbor.clone()));
            if let Some(other) = self.nodes.get_mut(&neighbor) {
                other.neighbors.remove(node);
            }
        }

        true
    }

    /// Returns the vertices adjacent to `node`, in order. Empty if the vertex is isolated or
    /// absent.
    pub fn neighbors<'a>(&'a self, node: &T) -> impl Iterator<Item = &'a T> + 'a {
        self.nodes
            .get(node)
            .into_iter()
            .flat_map(|vertex| vertex.neighbors.iter())
    }

    /// Returns the number of edges incident to `node`.
    pub fn degree(&self, node: &T) -> usize {
        self.nodes
            .get(node)
            .map_or(0, |vertex| vertex.neighbors.len())
    }

    /// Returns a new graph made of the vertices in `nodes` and every edge of this graph with both
    /// endpoints in the set.
    ///
    /// Vertices in `nodes` that aren't part of this graph are ignored. The subgraph owns copies
    /// of all attributes and doesn't refer back to this graph.
    pub fn induced_subgraph(&self, nodes: &BTreeSet<T>) -> Self {
        let mut subgraph = Self::new();

        for node in nodes {
            if let Some(vertex) = self.nodes.get(node) {
                let neighbors = vertex
                    .neighbors
                    .iter()
                    .filter(|neighbor| nodes.contains(*neighbor))
                    .cloned()
                    .collect();

                subgraph.nodes.insert(
                    node.clone(),
                    Vertex {
                        attributes: vertex.attributes,
                        neighbors,
                    },
                );
            }
        }

        for (edge, link) in &self.links {
            if nodes.contains(edge.source()) && nodes.contains(edge.target()) {
                subgraph.links.insert(edge.clone(), link.clone());
            }
        }

        subgraph
    }

    /// Checks if the graph contains a vertex.
    pub fn contains_node(&self, node: &T) -> bool {
        self.nodes.contains_key(node)
    }

    /// Checks if the graph contains an edge between `u` and `v`.
    pub fn contains_edge(&self, u: &T, v: &T) -> bool {
        self.link(u, v).is_some()
    }

    /// Returns the link between `u` and `v`, if any.
    pub fn link(&self, u: &T, v: &T) -> Option<&Link> {
        self.links.get(&Edge::new(u.clone(), v.clone()))
    }

    /// Returns the attributes of a vertex.
    pub fn node_attributes(&self, node: &T) -> Option<&NodeAttributes> {
        self.nodes.get(node).map(|vertex| &vertex.attributes)
    }

    /// Returns the vertices of the graph in order.
    pub fn nodes(&self) -> impl Iterator<Item = &T> {
        self.nodes.keys()
    }

    /// Returns the edges of the graph alongside their links, in no particular order.
    pub fn edges(&self) -> impl Iterator<Item = (&Edge<T>, &Link)> {
        self.links.iter()
    }

    /// Returns the vertex count of the graph, isolated vertices included.
    ///
    /// # Examples
    ///
    /// ```
    /// use severance::edge::Link;
    /// use severance::graph::{Graph, NodeAttributes};
    ///
    /// let mut graph = Graph::new();
    /// graph.add_edge("a", "b", Link::new(1.0));
    /// graph.update_node_attributes("c", &NodeAttributes::default());
    ///
    /// assert_eq!(graph.node_count(), 3);
    /// ```
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the edge count of the graph.
    pub fn edge_count(&self) -> usize {
        self.links.len()
    }

    /// Returns whether the graph has no vertices.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Computes the density of the graph, the ratio of edges with respect to the maximum possible
    /// edges.
    pub fn density(&self) -> f64 {
        let vc = self.node_count() as f64;
        let ec = self.edge_count() as f64;

        // Calculate the total number of possible edges given a vertex count.
        let pec = vc * (vc - 1.0) / 2.0;
        // Actual edges divided by the possible edges gives the density.
        ec / pec
    }

    /// Returns the shortest and longest link weights, `None` if the graph has no edges.
    pub fn weight_range(&self) -> Option<(f64, f64)> {
        self.links.values().map(Link::weight).fold(None, |range, w| {
            Some(match range {
                None => (w, w),
                Some((min, max)) => (min.min(w), max.max(w)),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn new() {
        let graph: Graph<()> = Graph::new();

        assert!(graph.is_empty());
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn add_edge_creates_vertices() {
        let mut graph = Graph::new();
        graph.add_edge("a", "b", Link::new(2.0));

        assert!(graph.contains_node(&"a"));
        assert!(graph.contains_node(&"b"));
        assert!(graph.contains_edge(&"b", &"a"));
        assert_eq!(graph.node_count(), 2);
    }

    #[test]
    fn duplicate_edge_replaces_link() {
        let mut graph = Graph::new();
        let (x, y) = ("x", "y");

        graph.add_edge(x, y, Link::new(3.0).with_name("old"));
        let replaced = graph.add_edge(x, y, Link::new(7.0));

        assert_eq!(replaced.map(|link| link.weight()), Some(3.0));
        assert_eq!(graph.edge_count(), 1);

        // Attributes are replaced, not merged.
        let link = graph.link(&y, &x).unwrap();
        assert_eq!(link.weight(), 7.0);
        assert_eq!(link.name(), crate::edge::UNKNOWN_NAME);
    }

    #[test]
    fn update_node_attributes() {
        let mut graph = Graph::new();
        graph.add_edge("a", "b", Link::new(1.0));

        let position = NodeAttributes::at(1.0, 2.0);
        graph.update_node_attributes("a", &position);
        graph.update_node_attributes("a", &position);
        assert_eq!(graph.node_attributes(&"a"), Some(&position));

        // Unset attributes leave the existing values alone.
        graph.update_node_attributes(
            "a",
            &NodeAttributes {
                easting: None,
                northing: Some(5.0),
            },
        );
        assert_eq!(
            graph.node_attributes(&"a"),
            Some(&NodeAttributes::at(1.0, 5.0))
        );

        // Absent vertices get created.
        graph.update_node_attributes("c", &position);
        assert!(graph.contains_node(&"c"));
        assert_eq!(graph.degree(&"c"), 0);
    }

    #[test]
    fn remove_edge() {
        let mut graph = graph!(["a", "b", "c"]);

        assert!(graph.remove_edge(&"b", &"a"));
        assert!(!graph.remove_edge(&"a", &"b"));
        assert!(!graph.remove_edge(&"a", &"z"));

        // Vertices stay behind.
        assert!(graph.contains_node(&"a"));
        assert_eq!(graph.neighbors(&"a").count(), 0);
        assert_eq!(graph.neighbors(&"b").collect::<Vec<_>>(), vec![&"c"]);
    }

    #[test]
    fn remove_node() {
        let mut graph = graph!(["a", "b", "c"], ["b", "d"]);

        assert!(graph.remove_node(&"b"));
        assert!(!graph.remove_node(&"b"));

        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.degree(&"c"), 0);
    }

    #[test]
    fn neighbors() {
        let graph = graph!(["a", "b", "c"], ["a", "c"]);

        assert_eq!(graph.neighbors(&"a").collect::<Vec<_>>(), vec![&"b", &"c"]);
        assert_eq!(graph.neighbors(&"z").count(), 0);
    }

    #[test]
    fn copies_are_independent() {
        let original = graph!(["a", "b", "c"]);
        let mut copy = original.clone();

        copy.remove_edge(&"a", &"b");
        copy.update_node_attributes("a", &NodeAttributes::at(1.0, 1.0));

        assert!(original.contains_edge(&"a", &"b"));
        assert_eq!(
            original.node_attributes(&"a"),
            Some(&NodeAttributes::default())
        );
    }

    #[test]
    fn induced_subgraph() {
        let mut graph = graph!(["a", "b", "c", "d"], ["a", "c"]);
        graph.update_node_attributes("b", &NodeAttributes::at(3.0, 4.0));

        let nodes: BTreeSet<_> = ["a", "b", "c", "z"].into_iter().collect();
        let mut subgraph = graph.induced_subgraph(&nodes);

        assert_eq!(subgraph.node_count(), 3);
        assert_eq!(subgraph.edge_count(), 3);
        assert!(!subgraph.contains_node(&"d"));
        let neighbors: Vec<_> = subgraph.neighbors(&"c").collect();
        assert_eq!(neighbors, vec![&"a", &"b"]);
        assert_eq!(
            subgraph.node_attributes(&"b"),
            Some(&NodeAttributes::at(3.0, 4.0))
        );

        subgraph.remove_edge(&"a", &"b");
        assert!(graph.contains_edge(&"a", &"b"));
    }

    #[test]
    fn density() {
        let mut graph = Graph::new();
        assert!(graph.density().is_nan());

        graph.add_edge("a", "b", Link::new(1.0));
        assert_eq!(graph.density(), 1.0);

        graph.add_edge("a", "c", Link::new(1.0));
        assert_eq!(graph.density(), 2.0 / 3.0);
    }

    #[test]
    fn weight_range() {
        let mut graph = Graph::new();
        assert_eq!(graph.weight_range(), None);

        graph.add_edge("a", "b", Link::new(12.0));
        graph.add_edge("b", "c", Link::new(4.0));
        graph.add_edge("c", "d", Link::new(30.0));

        assert_eq!(graph.weight_range(), Some((4.0, 30.0)));
    }

    proptest! {
        #[test]
        fn neighbors_are_symmetric(pairs in prop::collection::vec((0u8..20, 0u8..20), 0..60)) {
            let mut graph = Graph::new();
            for (u, v) in &pairs {
                graph.add_edge(*u, *v, Link::new(1.0));
            }

            for (u, v) in &pairs {
                prop_assert!(graph.neighbors(u).any(|n| n == v));
                prop_assert!(graph.neighbors(v).any(|n| n == u));
            }
        }

        #[test]
        fn removing_a_missing_edge_is_idempotent(
            pairs in prop::collection::vec((0u8..10, 0u8..10), 0..30),
        ) {
            let mut graph = Graph::new();
            for (u, v) in &pairs {
                graph.add_edge(*u, *v, Link::new(1.0));
            }
            graph.remove_edge(&0, &1);
            let snapshot: Vec<(u8, Vec<u8>)> = graph
                .nodes()
                .map(|n| (*n, graph.neighbors(n).copied().collect()))
                .collect();

            prop_assert!(!graph.remove_edge(&0, &1));
            let after: Vec<(u8, Vec<u8>)> = graph
                .nodes()
                .map(|n| (*n, graph.neighbors(n).copied().collect()))
                .collect();

            prop_assert_eq!(snapshot, after);
        }
    }
}
