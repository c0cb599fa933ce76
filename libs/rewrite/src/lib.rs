//! # imgmap-rewrite
//!
//! Rewrites image references embedded in configuration documents.
//!
//! - [`map_values`]: Helm values. Produces a sparse overlay containing only
//!   the rewritten fields, meant to be passed to Helm alongside the original.
//! - [`map_dockerfile`]: Dockerfiles. Produces the full text with `FROM`
//!   targets substituted in place.
//!
//! Both use the same [`MapImage`](imgmap_mapper::MapImage) seam and keep no
//! state between documents. Catalog data is fetched once before the first
//! image is mapped; if that fails the document fails. Any later failure only
//! skips the field or line it concerns.

mod dockerfile;
mod error;
mod helm;

pub use dockerfile::map_dockerfile;
pub use error::RewriteError;
pub use helm::map_values;

use imgmap_mapper::{ImageReference, MapError, MapImage};
use tracing::{debug, warn};

/// Fetch catalog data once before the first field is mapped. Only this
/// failure aborts a document.
async fn prefetch<M>(mapper: &M) -> Result<(), RewriteError>
where
    M: MapImage + ?Sized,
{
    mapper.prefetch().await.map_err(RewriteError::Catalog)
}

/// Map `image` and parse the best candidate.
///
/// Returns `None` when the field should be left alone: no match, an
/// unparsable reference, or a failed catalog refresh.
async fn map_best<M>(mapper: &M, image: &str) -> Option<ImageReference>
where
    M: MapImage + ?Sized,
{
    let result = match mapper.map(image).await {
        Ok(result) => result,
        Err(e) => {
            warn!(image = %image, error = %e, "Skipping image");
            return None;
        }
    };

    let parsed = result
        .best()
        .and_then(|best| best.parse::<ImageReference>());

    match parsed {
        Ok(reference) => Some(reference),
        Err(MapError::NoMatch { .. }) => {
            debug!(image = %image, "No catalog match");
            None
        }
        Err(e) => {
            warn!(image = %image, error = %e, "Skipping unparsable candidate");
            None
        }
    }
}
