//! Argument parsing for the `severance` binary.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use severance::{
    closures::{ClosureRange, ClosureStrategy},
    components::ComponentSelection,
    config::AnalysisConfig,
    paths::DistanceMode,
    Result,
};

/// Walk length bounds used when `--strategy walk` is given without a configuration that sets
/// them.
const DEFAULT_WALK_LINKS: (usize, usize) = (1, 5);

/// Simulates random link closures on a road network and reports how far its shortest paths
/// diverge.
#[derive(Debug, Parser, Clone)]
#[command(name = "severance", version)]
pub struct Cli {
    /// Road network to load, GML (`.gml`, `.xml`) or JSON (`.json`).
    pub path: PathBuf,

    /// TOML file with analysis parameters, flags take precedence over its values.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Seed of the random generator.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Measure paths by link length instead of hop count.
    #[arg(long)]
    pub weighted: bool,

    /// Lower bound of the number of closures.
    #[arg(long = "min-closures")]
    pub min_closures: Option<usize>,

    /// Upper bound of the number of closures.
    #[arg(long = "max-closures")]
    pub max_closures: Option<usize>,

    /// Component to analyse: `largest`, `smallest`, `nth:N` (0 is the largest) or `node:ID`.
    #[arg(long, value_parser = parse_component)]
    pub component: Option<ComponentSelection<String>>,

    /// How closures are picked.
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,

    /// Worker threads for the shortest path computations.
    #[arg(long)]
    pub threads: Option<usize>,

    /// Also report the algebraic connectivity before and after the closures.
    #[arg(long)]
    pub spectral: bool,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    /// Independent random links.
    Edges,
    /// Consecutive links along random walks.
    Walk,
}

impl Cli {
    /// Builds the analysis configuration: defaults, then the configuration file, then the flags.
    pub fn analysis_config(&self) -> Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::load(path)?,
            None => AnalysisConfig::default(),
        };

        if self.weighted {
            config.distance_mode = DistanceMode::Weighted;
        }
        if self.spectral {
            config.spectral = true;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        if let Some(component) = &self.component {
            config.component = component.clone();
        }

        config.closures = ClosureRange {
            min: self.min_closures.unwrap_or(config.closures.min),
            max: self.max_closures.unwrap_or(config.closures.max),
        };

        match (self.strategy, config.strategy) {
            (Some(StrategyArg::Edges), _) => config.strategy = ClosureStrategy::RandomEdges,
            (Some(StrategyArg::Walk), ClosureStrategy::RandomEdges) => {
                let (min_links, max_links) = DEFAULT_WALK_LINKS;
                config.strategy = ClosureStrategy::RandomWalk {
                    min_links,
                    max_links,
                };
            }
            (Some(StrategyArg::Walk), ClosureStrategy::RandomWalk { .. }) | (None, _) => {}
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_component(raw: &str) -> Result<ComponentSelection<String>, String> {
    match raw.trim() {
        "largest" => Ok(ComponentSelection::Largest),
        "smallest" => Ok(ComponentSelection::Smallest),
        other => {
            if let Some(n) = other.strip_prefix("nth:") {
                n.parse()
                    .map(ComponentSelection::NthLargest)
                    .map_err(|err| format!("invalid component rank `{n}`: {err}"))
            } else if let Some(node) = other.strip_prefix("node:") {
                if node.is_empty() {
                    return Err("missing node ID after `node:`".to_owned());
                }
                Ok(ComponentSelection::Containing(node.to_owned()))
            } else {
                Err(format!(
                    "unsupported component `{other}`; \
                     expected `largest`, `smallest`, `nth:N` or `node:ID`"
                ))
            }
        }
    }
}
