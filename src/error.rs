//! Error types for the crate.

use std::{io, path::PathBuf};

use thiserror::Error;

/// A convenient result alias using the crate's [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// An error produced while building, simulating or measuring a network.
///
/// Empty graphs and closures of missing edges aren't errors: they yield empty results and no-op
/// removals respectively.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    /// A link arrived at the ingestion boundary with a missing, negative or non-finite length.
    #[error("link {start} - {end} has an invalid length: {}", describe_length(.length))]
    InvalidEdgeWeight {
        start: String,
        end: String,
        length: Option<f64>,
    },
    /// Closures were requested from a graph that has no edges.
    #[error("cannot select {requested} closures from a graph without edges")]
    NoEdgesToClose { requested: usize },
    /// The closure count range is inverted.
    #[error("closure range is inverted: min {min} > max {max}")]
    InvalidClosureRange { min: usize, max: usize },
    /// The random walk bounds can't produce a walk.
    #[error("random walk length bounds are invalid: min {min}, max {max}")]
    InvalidWalkLength { min: usize, max: usize },
    /// Shortest paths were requested with zero worker threads.
    #[error("the number of threads must be at least 1")]
    InvalidThreadCount,
    /// No connected component matched the selection policy.
    #[error("no connected component matches the selection: {selection}")]
    ComponentNotFound { selection: String },
    /// A file couldn't be read.
    #[error("failed to read `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The input path has an extension that no reader handles.
    #[error("unsupported input format for `{path}`, expected .gml, .xml or .json")]
    UnsupportedFormat { path: PathBuf },
    /// The GML document couldn't be tokenised.
    #[error("malformed GML: {0}")]
    Gml(#[from] quick_xml::Error),
    /// The GML document parsed but a road link is incomplete.
    #[error("malformed road link #{index}: {reason}")]
    MalformedLink { index: usize, reason: String },
    /// The JSON link list couldn't be decoded.
    #[error("malformed JSON link list: {0}")]
    Json(#[from] serde_json::Error),
    /// The configuration file couldn't be decoded.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

fn describe_length(length: &Option<f64>) -> String {
    match length {
        Some(length) => length.to_string(),
        None => "missing".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_edge_weight_message() {
        let missing = Error::InvalidEdgeWeight {
            start: "a".to_owned(),
            end: "b".to_owned(),
            length: None,
        };
        let negative = Error::InvalidEdgeWeight {
            start: "a".to_owned(),
            end: "b".to_owned(),
            length: Some(-2.0),
        };

        assert_eq!(
            missing.to_string(),
            "link a - b has an invalid length: missing"
        );
        assert_eq!(
            negative.to_string(),
            "link a - b has an invalid length: -2"
        );
    }
}
