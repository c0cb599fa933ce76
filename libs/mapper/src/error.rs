//! Error types for image mapping.

use imgmap_catalog::CatalogError;
use thiserror::Error;

/// Errors that can occur when mapping an image reference.
#[derive(Debug, Error)]
pub enum MapError {
    /// The input could not be parsed as an image reference or repository.
    #[error("invalid image reference {input:?}: {reason}")]
    InvalidReference { input: String, reason: String },

    /// No catalog repository matched the image.
    #[error("no catalog match for {image}")]
    NoMatch { image: String },

    /// The catalog could not be fetched.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// No cache directory was configured and the platform has none.
    #[error("could not determine the user cache directory")]
    NoCacheDir,
}

impl MapError {
    pub(crate) fn invalid(input: &str, reason: impl Into<String>) -> Self {
        Self::InvalidReference {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns true if this error only concerns the one image being mapped.
    ///
    /// Catalog failures affect every image and are not recoverable per field.
    pub fn is_per_image(&self) -> bool {
        matches!(self, Self::InvalidReference { .. } | Self::NoMatch { .. })
    }
}
