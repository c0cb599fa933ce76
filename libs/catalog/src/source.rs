//! The catalog source interface.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::CatalogError;
use crate::model::{CatalogSnapshot, RepoRecord};

/// Supplies the full repository list.
///
/// Snapshots are handed out behind an `Arc`: callers get a read-only view and
/// can never mutate a cache's internal state. Dropping the returned future
/// aborts any in-flight network request.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch a snapshot of the catalog.
    async fn fetch(&self) -> Result<Arc<CatalogSnapshot>, CatalogError>;
}

#[async_trait]
impl<T: CatalogSource + ?Sized> CatalogSource for Arc<T> {
    async fn fetch(&self) -> Result<Arc<CatalogSnapshot>, CatalogError> {
        (**self).fetch().await
    }
}

#[async_trait]
impl<T: CatalogSource + ?Sized> CatalogSource for Box<T> {
    async fn fetch(&self) -> Result<Arc<CatalogSnapshot>, CatalogError> {
        (**self).fetch().await
    }
}

/// A source serving a fixed record list, stamped fresh on every fetch.
#[derive(Debug, Clone)]
pub struct StaticSource {
    records: Vec<RepoRecord>,
}

impl StaticSource {
    pub fn new(records: Vec<RepoRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl CatalogSource for StaticSource {
    async fn fetch(&self) -> Result<Arc<CatalogSnapshot>, CatalogError> {
        Ok(Arc::new(CatalogSnapshot::new(self.records.clone())))
    }
}
