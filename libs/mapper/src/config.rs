//! Mapper configuration.
//!
//! Every recognized option lives in one struct that is passed by value to
//! [`Mapper::new`](crate::Mapper::new).

use std::path::PathBuf;
use std::time::Duration;

use directories::BaseDirs;
use imgmap_catalog::{AliasCorrections, DEFAULT_CATALOG_URL};

use crate::error::MapError;
use crate::ignore::IgnorePredicate;

/// Default destination repository.
pub const DEFAULT_REPOSITORY: &str = "cgr.dev/chainguard";

/// Subdirectory of the user cache directory holding the catalog cache.
pub const CACHE_DIR_NAME: &str = "chainguard-image-mapper";

/// Mapper configuration.
#[derive(Debug, Clone)]
pub struct MapperConfig {
    /// Repositories matching any predicate are never returned.
    pub ignore: Vec<IgnorePredicate>,

    /// Destination repository prefix, e.g. `registry.internal/chainguard`.
    pub repository: String,

    /// Persist catalog data to disk between invocations.
    pub cache: bool,

    /// How long fetched catalog data is reused.
    pub cache_duration: Duration,

    /// Catalog query endpoint.
    pub catalog_url: String,

    /// Overrides the platform cache directory.
    pub cache_dir: Option<PathBuf>,

    /// Timeout for one catalog request.
    pub request_timeout: Duration,

    pub alias_corrections: AliasCorrections,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            ignore: Vec::new(),
            repository: DEFAULT_REPOSITORY.to_string(),
            cache: true,
            cache_duration: Duration::from_secs(60 * 60),
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            cache_dir: None,
            request_timeout: Duration::from_secs(30),
            alias_corrections: AliasCorrections::builtin(),
        }
    }
}

impl MapperConfig {
    /// The directory holding the on-disk cache.
    pub fn cache_dir(&self) -> Result<PathBuf, MapError> {
        if let Some(dir) = &self.cache_dir {
            return Ok(dir.clone());
        }

        BaseDirs::new()
            .map(|dirs| dirs.cache_dir().join(CACHE_DIR_NAME))
            .ok_or(MapError::NoCacheDir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = MapperConfig::default();
        assert_eq!(config.repository, "cgr.dev/chainguard");
        assert!(config.cache);
        assert_eq!(config.cache_duration, Duration::from_secs(3600));
        assert!(config.ignore.is_empty());
        assert!(!config.alias_corrections.is_empty());
    }

    #[test]
    fn test_cache_dir_override() {
        let config = MapperConfig {
            cache_dir: Some(PathBuf::from("/tmp/image-mapper-test")),
            ..Default::default()
        };
        assert_eq!(
            config.cache_dir().unwrap(),
            PathBuf::from("/tmp/image-mapper-test")
        );
    }
}
