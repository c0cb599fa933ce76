//! Error types for document rewriting.

use imgmap_mapper::MapError;
use thiserror::Error;

/// Errors that abort rewriting a whole document.
///
/// Failures mapping a single field or line never surface here: the affected
/// field or line is left alone.
#[derive(Debug, Error)]
pub enum RewriteError {
    /// The input is not valid YAML.
    #[error("unmarshalling yaml: {0}")]
    Parse(#[source] serde_yaml::Error),

    /// The input parsed but is not a mapping at the top level.
    #[error("values document must be a mapping at the top level")]
    NotAMapping,

    /// The rewritten document could not be serialized.
    #[error("marshalling yaml: {0}")]
    Serialize(#[source] serde_yaml::Error),

    /// No catalog data could be obtained before rewriting started.
    #[error("fetching catalog: {0}")]
    Catalog(#[source] MapError),
}
