//! Error types for catalog sources.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while fetching or caching catalog data.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The request to the catalog could not be completed.
    #[error("catalog request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The catalog answered with something other than 200 OK.
    #[error("unexpected status code from catalog: {0}")]
    Status(u16),

    /// A JSON document (catalog response or correction table) was malformed.
    #[error("malformed catalog data: {0}")]
    Parse(#[from] serde_json::Error),

    /// The on-disk cache exists but does not hold a valid snapshot.
    #[error("cache file {path:?} is corrupt: {source}")]
    CacheCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Reading or writing a file failed.
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CatalogError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns true if the remote catalog could not be reached or refused the request.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Status(_))
    }

    /// Returns true if the on-disk cache is unreadable as a snapshot.
    pub fn is_cache_corrupt(&self) -> bool {
        matches!(self, Self::CacheCorrupt { .. })
    }
}
