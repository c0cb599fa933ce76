//! # imgmap-mapper
//!
//! Maps upstream image references (`quay.io/argoproj/argocd:v2.13`) to
//! equivalents in the catalog (`cgr.dev/chainguard/argocd:v2.13`).
//!
//! ## Matching
//!
//! The input is normalized to `registry/repository` and compared with the
//! normalized name and aliases of every catalog repository, in catalog order.
//! Repositories rejected by an [`IgnorePredicate`] are skipped. Each match
//! becomes a candidate under the configured destination repository, keeping
//! the input tag when the repository actively builds it and `latest`
//! otherwise.

mod config;
mod error;
mod ignore;
mod mapper;
mod reference;

pub use config::{MapperConfig, CACHE_DIR_NAME, DEFAULT_REPOSITORY};
pub use error::MapError;
pub use ignore::{document_defaults, IgnorePredicate};
pub use mapper::{image_lines, MapImage, Mapper, MappingResult};
pub use reference::{parse_repository, ImageReference, DEFAULT_REGISTRY};
