//! # imgmap-catalog
//!
//! Catalog repository data and the sources that supply it.
//!
//! ## Source chain
//!
//! Every source implements [`CatalogSource`], so sources wrap one another
//! explicitly at construction time:
//!
//! ```text
//! MemoryCache
//! └── DiskCache            (optional, survives process restarts)
//!     └── RemoteSource     (one GraphQL POST per fetch)
//!         └── AliasCorrections (applied once, at fetch time)
//! ```
//!
//! Caches never evict a snapshot because a refresh failed, and they never
//! retry. Retrying is the caller's decision.

mod corrections;
mod disk;
mod error;
mod memory;
mod model;
mod remote;
mod source;

pub use corrections::AliasCorrections;
pub use disk::{DiskCache, CACHE_FILE_NAME};
pub use error::CatalogError;
pub use memory::MemoryCache;
pub use model::{CatalogSnapshot, CatalogTier, RepoRecord, Tag};
pub use remote::{RemoteSource, RemoteSourceConfig, DEFAULT_CATALOG_URL, USER_AGENT};
pub use source::{CatalogSource, StaticSource};
