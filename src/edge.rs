//! A module for working with edges and the links they carry.

use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
};

use uuid::Uuid;

/// The name given to links that arrive without one.
pub const UNKNOWN_NAME: &str = "unknown";

/// A pair of vertices representing a graph edge. Edges don't have a direction, despite the
/// `source`-`target` nomenclature used.
#[derive(Clone, Debug, Eq)]
pub struct Edge<T> {
    source: T,
    target: T,
}

impl<T> Edge<T> {
    /// Creates a new edge from two vertices.
    ///
    /// # Examples
    ///
    /// ```
    /// use severance::edge::Edge;
    ///
    /// let edge = Edge::new("a", "b");
    /// assert_eq!(edge, Edge::new("b", "a"));
    /// ```
    pub fn new(source: T, target: T) -> Self {
        Self { source, target }
    }

    /// Returns the first vertex forming the edge.
    pub fn source(&self) -> &T {
        &self.source
    }

    /// Returns the second vertex forming the edge.
    pub fn target(&self) -> &T {
        &self.target
    }

    /// Consumes the edge, returning its vertices in insertion order.
    pub fn into_pair(self) -> (T, T) {
        (self.source, self.target)
    }
}

/// The attributes carried by a network link: its length, a unique identity and a display name.
#[derive(Clone, Debug, PartialEq)]
pub struct Link {
    weight: f64,
    id: Uuid,
    name: String,
}

impl Link {
    /// Creates a link with the given weight, a freshly generated identifier and the
    /// [`UNKNOWN_NAME`] placeholder name.
    ///
    /// The weight isn't validated here, negative or non-finite lengths are rejected when links
    /// are ingested.
    pub fn new(weight: f64) -> Self {
        Self {
            weight,
            id: Uuid::new_v4(),
            name: UNKNOWN_NAME.to_owned(),
        }
    }

    /// Sets the display name of the link.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Returns the length of the link.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Returns the link's unique identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the link's display name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

//
// Trait implementations
//

impl<T: PartialEq> PartialEq for Edge<T> {
    fn eq(&self, other: &Self) -> bool {
        let (a, b) = (&self.source, &self.target);
        let (c, d) = (&other.source, &other.target);

        a == d && b == c || a == c && b == d
    }
}

impl<T: Hash + Ord> Hash for Edge<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let (a, b) = (&self.source, &self.target);

        // This ensures the hash is the same for (a, b) as it is for (b, a).
        match a.cmp(b) {
            Ordering::Greater => {
                b.hash(state);
                a.hash(state);
            }
            _ => {
                a.hash(state);
                b.hash(state);
            }
        }
    }
}

impl<T: fmt::Display> fmt::Display for Edge<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.source, self.target)
    }
}
