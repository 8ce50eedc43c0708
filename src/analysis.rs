//! Running a closure simulation end to end.
//!
//! The pipeline partitions the ingested network, takes the selected component as its domain,
//! closes a random number of links and measures how far the shortest paths diverge.

use std::{collections::BTreeSet, fmt};

use rand::Rng;
use serde::Serialize;
use tracing::{debug, info, info_span};

use crate::{
    closures::apply_closures,
    components::{connected_components, select_component},
    config::AnalysisConfig,
    divergence::{compare, Divergence},
    edge::Edge,
    error::{Error, Result},
    graph::Graph,
    ingest::{IngestStats, Network},
    paths::{
        all_pairs_shortest_paths, all_pairs_shortest_paths_parallel, DistanceMode, ShortestPaths,
    },
    spectral::algebraic_connectivity,
};

/// The algebraic connectivity of the analysed component before and after the closures.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Connectivity {
    pub before: f64,
    pub after: f64,
}

/// Everything measured during a run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub stats: IngestStats,
    /// Vertex counts of the connected components, in partition order.
    pub component_sizes: Vec<usize>,
    /// Vertex and link count of the analysed component.
    pub selected_nodes: usize,
    pub selected_links: usize,
    /// The closures as drawn, duplicates included.
    pub closures: Vec<(String, String)>,
    /// Number of distinct links removed by the closures.
    pub removed_links: usize,
    pub distance_mode: DistanceMode,
    pub divergence: Divergence,
    pub connectivity: Option<Connectivity>,
}

impl AnalysisReport {
    pub fn largest_component(&self) -> Option<usize> {
        self.component_sizes.iter().copied().max()
    }

    pub fn smallest_component(&self) -> Option<usize> {
        self.component_sizes.iter().copied().min()
    }
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let or_none =
            |value: Option<f64>| value.map_or_else(|| "n/a".to_owned(), |v| v.to_string());
        let size =
            |value: Option<usize>| value.map_or_else(|| "n/a".to_owned(), |v| v.to_string());

        writeln!(f, "Links ingested: {}", self.stats.links)?;
        writeln!(f, "Min length: {}", or_none(self.stats.min_length))?;
        writeln!(f, "Max length: {}", or_none(self.stats.max_length))?;
        writeln!(f, "Connected components: {}", self.component_sizes.len())?;
        writeln!(
            f,
            "Largest component: {} nodes",
            size(self.largest_component())
        )?;
        writeln!(
            f,
            "Smallest component: {} nodes",
            size(self.smallest_component())
        )?;
        writeln!(f, "Component sizes: {:?}", self.component_sizes)?;
        writeln!(
            f,
            "Selected component: {} nodes, {} links",
            self.selected_nodes, self.selected_links
        )?;
        writeln!(
            f,
            "Closures applied: {} ({} links removed)",
            self.closures.len(),
            self.removed_links
        )?;
        for (start, end) in &self.closures {
            writeln!(f, "  {start} - {end}")?;
        }
        write!(
            f,
            "Divergence ({}): {}",
            self.distance_mode, self.divergence
        )?;
        if let Some(connectivity) = self.connectivity {
            write!(
                f,
                "\nAlgebraic connectivity: {:.6} -> {:.6}",
                connectivity.before, connectivity.after
            )?;
        }

        Ok(())
    }
}

/// Runs a closure simulation over `network`.
///
/// # Errors
///
/// Fails if `config` doesn't validate, if no component matches the selection, or if closures are
/// requested from a component without links.
///
/// # Examples
///
/// ```
/// use rand::{rngs::StdRng, SeedableRng};
/// use severance::analysis::run_analysis;
/// use severance::closures::ClosureRange;
/// use severance::config::AnalysisConfig;
/// use severance::ingest::{ingest, RoadLink};
///
/// let link = |start: &str, end: &str| RoadLink {
///     start_node: start.to_owned(),
///     end_node: end.to_owned(),
///     length: Some(10.0),
///     ..Default::default()
/// };
/// let network = ingest(vec![link("a", "b"), link("b", "c"), link("x", "y")]).unwrap();
///
/// let config = AnalysisConfig {
///     closures: ClosureRange { min: 1, max: 1 },
///     ..Default::default()
/// };
/// let report = run_analysis(&network, &config, &mut StdRng::seed_from_u64(3)).unwrap();
///
/// assert_eq!(report.component_sizes, vec![3, 2]);
/// assert_eq!(report.selected_nodes, 3);
/// assert_eq!(report.removed_links, 1);
/// // Closing a link of a path only disconnects pairs.
/// assert_eq!(report.divergence.total, 0.0);
/// ```
pub fn run_analysis<R>(
    network: &Network,
    config: &AnalysisConfig,
    rng: &mut R,
) -> Result<AnalysisReport>
where
    R: Rng + ?Sized,
{
    config.validate()?;

    let span = info_span!(
        "analysis",
        mode = %config.distance_mode,
        component = %config.component
    );
    let _guard = span.enter();

    let components = connected_components(&network.graph);
    let component_sizes: Vec<usize> = components.iter().map(BTreeSet::len).collect();
    info!(count = components.len(), "partitioned network");

    let component = select_component(&components, &config.component).ok_or_else(|| {
        Error::ComponentNotFound {
            selection: config.component.to_string(),
        }
    })?;
    let before = network.graph.induced_subgraph(component);
    info!(
        nodes = before.node_count(),
        links = before.edge_count(),
        "selected component"
    );

    let count = config.closures.draw(rng)?;
    let closures = config.strategy.select(&before, count, rng)?;
    let after = apply_closures(&before, &closures);
    let removed_links = before.edge_count() - after.edge_count();
    info!(requested = count, removed = removed_links, "applied closures");

    let before_paths = shortest_paths(&before, config);
    let after_paths = shortest_paths(&after, config);
    let divergence = compare(&before_paths, &after_paths);
    info!(
        total = divergence.total,
        changed = divergence.changed_pairs,
        disconnected = divergence.disconnected_pairs,
        "computed divergence"
    );

    let connectivity = config.spectral.then(|| {
        let connectivity = Connectivity {
            before: algebraic_connectivity(&before),
            after: algebraic_connectivity(&after),
        };
        debug!(?connectivity, "computed algebraic connectivity");
        connectivity
    });

    Ok(AnalysisReport {
        stats: network.stats,
        component_sizes,
        selected_nodes: before.node_count(),
        selected_links: before.edge_count(),
        closures: closures.into_iter().map(Edge::into_pair).collect(),
        removed_links,
        distance_mode: config.distance_mode,
        divergence,
        connectivity,
    })
}

fn shortest_paths(graph: &Graph<String>, config: &AnalysisConfig) -> ShortestPaths<String> {
    if config.threads > 1 {
        all_pairs_shortest_paths_parallel(graph, config.distance_mode, config.threads)
    } else {
        all_pairs_shortest_paths(graph, config.distance_mode)
    }
}
