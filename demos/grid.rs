use rand::{rngs::SmallRng, Rng, SeedableRng};
use severance::{
    closures::{apply_closures, select_closures},
    divergence::compare,
    edge::Link,
    graph::{Graph, NodeAttributes},
    paths::{all_pairs_shortest_paths, DistanceMode},
    spectral::{adjacency_matrix, algebraic_connectivity},
};

// Side of the square street grid and spacing between junctions, in metres.
const N: usize = 6;
const BLOCK: f64 = 100.0;

fn main() {
    let mut rng = SmallRng::seed_from_u64(2024);
    let mut graph = Graph::new();

    // Lay out a street grid, each link a little longer than the block because streets aren't
    // perfectly straight.
    for row in 0..N {
        for col in 0..N {
            let junction = (row, col);
            graph.update_node_attributes(
                junction,
                &NodeAttributes::at(col as f64 * BLOCK, row as f64 * BLOCK),
            );

            if col + 1 < N {
                let length = BLOCK * rng.gen_range(1.0..1.3);
                graph.add_edge(junction, (row, col + 1), Link::new(length));
            }
            if row + 1 < N {
                let length = BLOCK * rng.gen_range(1.0..1.3);
                graph.add_edge(junction, (row + 1, col), Link::new(length));
            }
        }
    }

    println!(
        "\nBuilt a {N}x{N} grid: {} junctions, {} links, density {:.3}",
        graph.node_count(),
        graph.edge_count(),
        graph.density()
    );

    let before = all_pairs_shortest_paths(&graph, DistanceMode::Weighted);
    let connectivity = algebraic_connectivity(&graph);
    println!("Algebraic connectivity: {connectivity:.4}");

    // Close more and more links and watch the shortest paths drift.
    for count in [1, 3, 6, 12] {
        let closures = select_closures(&graph, count, &mut rng).expect("the grid has links");
        let closed = apply_closures(&graph, &closures);

        let after = all_pairs_shortest_paths(&closed, DistanceMode::Weighted);
        let divergence = compare(&before, &after);

        println!(
            "Closed {count:>2} links ({} distinct): divergence {:.1} m over {} pairs, \
             {} pairs cut off, connectivity {:.4}",
            graph.edge_count() - closed.edge_count(),
            divergence.total,
            divergence.changed_pairs,
            divergence.disconnected_pairs,
            algebraic_connectivity(&closed)
        );
    }

    // A tiny network is easier to eyeball.
    let mut corner = Graph::new();
    corner.add_edge("a", "b", Link::new(BLOCK));
    corner.add_edge("b", "c", Link::new(BLOCK));
    corner.add_edge("a", "c", Link::new(BLOCK * 1.4));
    println!("\nCorner adjacency matrix: {}", adjacency_matrix(&corner));
}
