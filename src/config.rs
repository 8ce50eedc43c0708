//! Analysis parameters.
//!
//! Every field has a default so a configuration file only needs to list what it changes:
//!
//! ```toml
//! distance_mode = "weighted"
//! seed = 37
//! threads = 4
//! component = { nth_largest = 2 }
//!
//! [closures]
//! min = 5
//! max = 9
//!
//! [strategy]
//! kind = "random_walk"
//! min_links = 2
//! max_links = 6
//! ```

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    closures::{ClosureRange, ClosureStrategy},
    components::ComponentSelection,
    error::{Error, Result},
    paths::DistanceMode,
};

/// Parameters of a closure simulation run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// How shortest path lengths are measured.
    pub distance_mode: DistanceMode,
    /// The range the number of closures is drawn from.
    pub closures: ClosureRange,
    /// How closures are picked.
    pub strategy: ClosureStrategy,
    /// Which connected component is analysed.
    pub component: ComponentSelection<String>,
    /// Seed of the random generator, a random seed is used when unset.
    pub seed: Option<u64>,
    /// Worker threads used for the shortest path computations.
    pub threads: usize,
    /// Whether to compute the algebraic connectivity before and after the closures.
    pub spectral: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            distance_mode: DistanceMode::default(),
            closures: ClosureRange::default(),
            strategy: ClosureStrategy::default(),
            component: ComponentSelection::Largest,
            seed: None,
            threads: 1,
            spectral: false,
        }
    }
}

impl AnalysisConfig {
    /// Parses and validates a TOML configuration.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Checks the parameters are usable.
    pub fn validate(&self) -> Result<()> {
        self.closures.validate()?;
        self.strategy.validate()?;
        if self.threads == 0 {
            return Err(Error::InvalidThreadCount);
        }
        Ok(())
    }
}
