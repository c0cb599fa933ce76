//! On-disk caching decorator.
//!
//! The cache file is the only state: nothing is kept in memory between calls,
//! so a snapshot written by one process is reused by the next. Separate
//! processes racing on the same file are not coordinated (last writer wins).

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::CatalogError;
use crate::model::CatalogSnapshot;
use crate::source::CatalogSource;

/// Name of the snapshot file inside the cache directory.
pub const CACHE_FILE_NAME: &str = "repos.json";

/// Persists snapshots to `<dir>/repos.json` and serves them while younger than `ttl`.
pub struct DiskCache<S> {
    inner: S,
    ttl: Duration,
    dir: PathBuf,
    /// Serializes callers within this process.
    lock: Mutex<()>,
}

impl<S: CatalogSource> DiskCache<S> {
    pub fn new(ttl: Duration, dir: impl Into<PathBuf>, inner: S) -> Self {
        Self {
            inner,
            ttl,
            dir: dir.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the snapshot file.
    pub fn path(&self) -> PathBuf {
        self.dir.join(CACHE_FILE_NAME)
    }

    /// Read the cached snapshot. A missing file is `Ok(None)`; an unparsable
    /// one is [`CatalogError::CacheCorrupt`].
    async fn read(&self) -> Result<Option<CatalogSnapshot>, CatalogError> {
        let path = self.path();

        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CatalogError::io(path, e)),
        };

        let mut snapshot: CatalogSnapshot = serde_json::from_slice(&data)
            .map_err(|source| CatalogError::CacheCorrupt { path, source })?;
        snapshot.retain_named();

        Ok(Some(snapshot))
    }

    async fn write(&self, snapshot: &CatalogSnapshot) -> Result<(), CatalogError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| CatalogError::io(&self.dir, e))?;

        let data = serde_json::to_vec(snapshot)?;

        // Write to a temporary file, then rename over the cache file
        let path = self.path();
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, &data)
            .await
            .map_err(|e| CatalogError::io(&temp_path, e))?;
        fs::rename(&temp_path, &path)
            .await
            .map_err(|e| CatalogError::io(&path, e))?;

        debug!(path = %path.display(), size = data.len(), "Wrote catalog cache file");
        Ok(())
    }
}

#[async_trait]
impl<S: CatalogSource> CatalogSource for DiskCache<S> {
    async fn fetch(&self) -> Result<Arc<CatalogSnapshot>, CatalogError> {
        let _guard = self.lock.lock().await;

        if let Some(cached) = self.read().await? {
            if cached.is_fresh(self.ttl) {
                debug!(fetched_at = %cached.fetched_at, "Disk cache hit");
                return Ok(Arc::new(cached));
            }
            debug!(fetched_at = %cached.fetched_at, "Disk cache expired");
        }

        let fresh = self.inner.fetch().await?;
        self.write(&fresh).await?;
        info!(path = %self.path().display(), "Cached catalog repositories to disk");

        Ok(fresh)
    }
}
