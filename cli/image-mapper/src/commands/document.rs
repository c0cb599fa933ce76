//! `map dockerfile` and `map helm-values` commands.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;
use imgmap_mapper::{document_defaults, Mapper};
use imgmap_rewrite::{map_dockerfile, map_values};

use crate::input::read_source;

use super::CatalogArgs;

/// Which rewriter a document goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Dockerfile,
    HelmValues,
}

impl DocumentKind {
    fn label(self) -> &'static str {
        match self {
            Self::Dockerfile => "dockerfile",
            Self::HelmValues => "helm values",
        }
    }
}

#[derive(Debug, Args)]
pub struct DocumentArgs {
    /// File to map, or `-` to read from stdin.
    #[arg(value_name = "FILE")]
    file: String,

    #[command(flatten)]
    catalog: CatalogArgs,
}

impl DocumentArgs {
    /// Rewrite the document and write it to stdout.
    ///
    /// Iamguarded and FIPS repositories are never chosen for documents.
    pub async fn run(self, kind: DocumentKind) -> Result<()> {
        let input = read_source(&self.file).await?;

        let mapper = Mapper::new(self.catalog.config(document_defaults())?)
            .context("creating mapper")?;

        let output = match kind {
            DocumentKind::Dockerfile => map_dockerfile(&mapper, &input).await,
            DocumentKind::HelmValues => map_values(&mapper, &input).await,
        }
        .with_context(|| format!("mapping {}", kind.label()))?;

        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(output.as_bytes())
            .and_then(|()| stdout.flush())
            .context("writing output")?;

        Ok(())
    }
}
