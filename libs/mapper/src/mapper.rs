//! Matches image references against the catalog.

use std::sync::Arc;

use async_trait::async_trait;
use imgmap_catalog::{
    CatalogSnapshot, CatalogSource, DiskCache, MemoryCache, RemoteSource, RemoteSourceConfig,
    RepoRecord,
};
use serde::Serialize;
use tracing::debug;

use crate::config::MapperConfig;
use crate::error::MapError;
use crate::ignore::IgnorePredicate;
use crate::reference::{parse_repository, ImageReference};

const DEFAULT_TAG: &str = "latest";

/// The candidates found for one input image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappingResult {
    /// The image as given by the caller.
    pub image: String,

    /// Fully qualified destination references, best match first.
    pub candidates: Vec<String>,
}

impl MappingResult {
    pub fn is_match(&self) -> bool {
        !self.candidates.is_empty()
    }

    /// The best candidate, or [`MapError::NoMatch`] when there is none.
    pub fn best(&self) -> Result<&str, MapError> {
        self.candidates
            .first()
            .map(String::as_str)
            .ok_or_else(|| MapError::NoMatch {
                image: self.image.clone(),
            })
    }
}

/// Maps a single image reference.
///
/// The rewriters depend on this seam rather than on [`Mapper`] directly.
#[async_trait]
pub trait MapImage: Send + Sync {
    async fn map(&self, image: &str) -> Result<MappingResult, MapError>;

    /// Make sure catalog data is available before mapping a batch.
    ///
    /// Fails only when no catalog data can be obtained at all.
    async fn prefetch(&self) -> Result<(), MapError> {
        Ok(())
    }
}

/// Maps upstream image references onto catalog repositories.
pub struct Mapper {
    source: Arc<dyn CatalogSource>,
    ignore: Vec<IgnorePredicate>,
    repository: String,
}

impl Mapper {
    /// Build a mapper backed by the remote catalog, cached in memory and,
    /// when `config.cache` is set, on disk.
    pub fn new(config: MapperConfig) -> Result<Self, MapError> {
        let remote = RemoteSource::new(RemoteSourceConfig {
            url: config.catalog_url.clone(),
            timeout: config.request_timeout,
            corrections: config.alias_corrections.clone(),
        })?;

        let source: Arc<dyn CatalogSource> = if config.cache {
            let disk = DiskCache::new(config.cache_duration, config.cache_dir()?, remote);
            Arc::new(MemoryCache::new(config.cache_duration, disk))
        } else {
            Arc::new(MemoryCache::new(config.cache_duration, remote))
        };

        Self::with_source(source, config)
    }

    /// Build a mapper over an existing source. Only `ignore` and `repository`
    /// are taken from `config`.
    pub fn with_source(
        source: Arc<dyn CatalogSource>,
        config: MapperConfig,
    ) -> Result<Self, MapError> {
        let repository = parse_repository(&config.repository)?;

        Ok(Self {
            source,
            ignore: config.ignore,
            repository,
        })
    }

    /// The normalized destination repository prefix.
    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// Map one image reference.
    ///
    /// No match is not an error: the result simply has no candidates.
    pub async fn map(&self, image: &str) -> Result<MappingResult, MapError> {
        let reference = ImageReference::parse(image)?;
        let snapshot = self.source.fetch().await?;

        let candidates = self.candidates(&reference, &snapshot);
        debug!(
            image = %image,
            context = %reference.context(),
            candidates = candidates.len(),
            "Mapped image"
        );

        Ok(MappingResult {
            image: image.to_string(),
            candidates,
        })
    }

    /// Fetch the catalog through the cache chain without mapping anything.
    pub async fn prefetch(&self) -> Result<(), MapError> {
        let snapshot = self.source.fetch().await?;
        debug!(records = snapshot.records.len(), "Catalog ready");
        Ok(())
    }

    /// Map every image, in input order.
    pub async fn map_all<I, S>(&self, images: I) -> Result<Vec<MappingResult>, MapError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut results = Vec::new();
        for image in images {
            results.push(self.map(image.as_ref()).await?);
        }

        Ok(results)
    }

    fn candidates(&self, reference: &ImageReference, snapshot: &CatalogSnapshot) -> Vec<String> {
        let context = reference.context();
        let mut candidates: Vec<String> = Vec::new();

        for record in &snapshot.records {
            if self.ignore.iter().any(|p| p.ignores(record)) {
                continue;
            }
            if !self.matches(&context, record) {
                continue;
            }

            let tag = reference
                .tag
                .as_deref()
                .filter(|tag| record.has_active_tag(tag))
                .unwrap_or(DEFAULT_TAG);
            let candidate = format!("{}/{}:{}", self.repository, record.name, tag);

            if !candidates.contains(&candidate) {
                candidates.push(candidate);
            }
        }

        candidates
    }

    /// Returns true if `context` names `record`, one of its aliases, or the
    /// record's own destination repository.
    fn matches(&self, context: &str, record: &RepoRecord) -> bool {
        if context == format!("{}/{}", self.repository, record.name) {
            return true;
        }

        std::iter::once(&record.name)
            .chain(&record.aliases)
            .any(|candidate| match ImageReference::parse(candidate) {
                Ok(alias) => alias.context() == context,
                Err(_) => false,
            })
    }
}

#[async_trait]
impl MapImage for Mapper {
    async fn map(&self, image: &str) -> Result<MappingResult, MapError> {
        Mapper::map(self, image).await
    }

    async fn prefetch(&self) -> Result<(), MapError> {
        Mapper::prefetch(self).await
    }
}

/// Image references from newline-separated text, skipping blank lines and
/// `#` comments.
pub fn image_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}
