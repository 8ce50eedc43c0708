//! Matrix representations of a graph and its algebraic connectivity.
//!
//! The algebraic connectivity (the second-smallest eigenvalue of the Laplacian) is zero for a
//! disconnected graph and grows as the graph gets harder to cut, which makes it a useful
//! companion to the divergence when comparing a network before and after closures. The dense
//! eigendecomposition limits it to small networks.

use std::{collections::BTreeMap, fmt::Debug, hash::Hash, ops::Sub};

use nalgebra::{DMatrix, SymmetricEigen};

use crate::graph::Graph;

/// Maps every vertex to its row (and column) in the matrices, following the vertex order.
pub fn index<T>(graph: &Graph<T>) -> BTreeMap<T, usize>
where
    T: Clone + Eq + Hash + Ord + Debug,
{
    graph
        .nodes()
        .enumerate()
        .map(|(i, vertex)| (vertex.clone(), i))
        .collect()
}

/// Constructs the adjacency matrix for this graph.
///
/// # Examples
///
/// ```
/// use nalgebra::dmatrix;
/// use severance::edge::Link;
/// use severance::graph::Graph;
/// use severance::spectral::adjacency_matrix;
///
/// let mut graph = Graph::new();
/// graph.add_edge("a", "b", Link::new(40.0));
/// assert_eq!(
///     adjacency_matrix(&graph),
///     dmatrix![0.0, 1.0;
///              1.0, 0.0]
/// );
/// ```
pub fn adjacency_matrix<T>(graph: &Graph<T>) -> DMatrix<f64>
where
    T: Clone + Eq + Hash + Ord + Debug,
{
    let index = index(graph);
    let n = index.len();
    let mut matrix = DMatrix::<f64>::zeros(n, n);

    // The graph is undirected so the matrix is symmetric, both triangles get written for each
    // edge.
    for (edge, _link) in graph.edges() {
        if let (Some(&i), Some(&j)) = (index.get(edge.source()), index.get(edge.target())) {
            matrix[(i, j)] = 1.0;
            matrix[(j, i)] = 1.0;
        }
    }

    matrix
}

/// Constructs the degree matrix for this graph.
pub fn degree_matrix<T>(graph: &Graph<T>) -> DMatrix<f64>
where
    T: Clone + Eq + Hash + Ord + Debug,
{
    degrees(&adjacency_matrix(graph))
}

/// Constructs the laplacian matrix for this graph.
///
/// # Examples
///
/// ```
/// use nalgebra::dmatrix;
/// use severance::edge::Link;
/// use severance::graph::Graph;
/// use severance::spectral::laplacian_matrix;
///
/// let mut graph = Graph::new();
/// graph.add_edge("a", "b", Link::new(1.0));
/// assert_eq!(
///     laplacian_matrix(&graph),
///     dmatrix![1.0, -1.0;
///              -1.0, 1.0]
/// );
/// ```
pub fn laplacian_matrix<T>(graph: &Graph<T>) -> DMatrix<f64>
where
    T: Clone + Eq + Hash + Ord + Debug,
{
    let adjacency_matrix = adjacency_matrix(graph);
    degrees(&adjacency_matrix).sub(&adjacency_matrix)
}

/// Returns the algebraic connectivity (Fiedler value) of the graph, `0.0` for graphs with fewer
/// than two vertices.
pub fn algebraic_connectivity<T>(graph: &Graph<T>) -> f64
where
    T: Clone + Eq + Hash + Ord + Debug,
{
    let eigenvalues = sorted_eigenvalues(laplacian_matrix(graph));

    // Second-smallest eigenvalue of the Laplacian is the Fiedler value. The eigensolver can land
    // marginally below zero on disconnected graphs.
    eigenvalues.get(1).map_or(0.0, |&value| value.max(0.0))
}

//
// Helpers
//

/// Builds the diagonal matrix of row sums. Rows are visited in order so the index isn't needed.
fn degrees(adjacency_matrix: &DMatrix<f64>) -> DMatrix<f64> {
    let n = adjacency_matrix.nrows();
    let mut matrix = DMatrix::<f64>::zeros(n, n);

    for (i, row) in adjacency_matrix.row_iter().enumerate() {
        matrix[(i, i)] = row.sum();
    }

    matrix
}

/// Computes the eigenvalues of the supplied symmetric matrix in ascending order.
fn sorted_eigenvalues(matrix: DMatrix<f64>) -> Vec<f64> {
    // Early return if the matrix is empty, the rest of the computation requires a matrix with
    // at least a dim of 1x1.
    if matrix.is_empty() {
        return vec![];
    }

    let mut eigenvalues: Vec<f64> = SymmetricEigen::new(matrix)
        .eigenvalues
        .iter()
        .copied()
        .collect();
    eigenvalues.sort_unstable_by(f64::total_cmp);

    eigenvalues
}
