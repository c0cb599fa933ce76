//! `map` command.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use imgmap_mapper::{image_lines, IgnorePredicate, Mapper};
use tracing::debug;

use crate::input::{read_source, STDIN};
use crate::output::{print_mappings, OutputFormat};

use super::document::{DocumentArgs, DocumentKind};
use super::CatalogArgs;

/// Map image references given as arguments or on stdin.
///
/// Examples:
///   image-mapper map ghcr.io/stakater/reloader:v1.4.1 quay.io/argoproj/argocd
///   cat images.txt | image-mapper map -
#[derive(Debug, Args)]
#[command(args_conflicts_with_subcommands = true)]
pub struct MapCommand {
    #[command(subcommand)]
    command: Option<MapSubcommand>,

    #[command(flatten)]
    args: MapArgs,
}

#[derive(Debug, Subcommand)]
enum MapSubcommand {
    /// Map the base images of a Dockerfile. Prints the rewritten Dockerfile.
    Dockerfile(DocumentArgs),

    /// Map the images in a Helm values file. Prints only the rewritten values.
    HelmValues(DocumentArgs),
}

#[derive(Debug, Args)]
struct MapArgs {
    /// Image references, or `-` to read newline-separated references from
    /// stdin.
    #[arg(value_name = "IMAGE")]
    images: Vec<String>,

    /// Output format.
    #[arg(
        short,
        long,
        value_enum,
        default_value_t = OutputFormat::Text,
        env = "IMAGE_MAPPER_OUTPUT"
    )]
    output: OutputFormat,

    /// Ignore catalog repositories of these tiers (PREMIUM, APPLICATION,
    /// BASE, FIPS, AI).
    #[arg(long, value_delimiter = ',', env = "IMAGE_MAPPER_IGNORE_TIERS")]
    ignore_tiers: Vec<String>,

    /// Ignore iamguarded repositories.
    #[arg(long, env = "IMAGE_MAPPER_IGNORE_IAMGUARDED")]
    ignore_iamguarded: bool,

    #[command(flatten)]
    catalog: CatalogArgs,
}

impl MapArgs {
    fn ignore(&self) -> Vec<IgnorePredicate> {
        let mut ignore = Vec::new();
        if !self.ignore_tiers.is_empty() {
            ignore.push(IgnorePredicate::tiers(&self.ignore_tiers));
        }
        if self.ignore_iamguarded {
            ignore.push(IgnorePredicate::Iamguarded);
        }
        ignore
    }
}

impl MapCommand {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Some(MapSubcommand::Dockerfile(args)) => args.run(DocumentKind::Dockerfile).await,
            Some(MapSubcommand::HelmValues(args)) => args.run(DocumentKind::HelmValues).await,
            None => map_images(self.args).await,
        }
    }

    #[cfg(test)]
    pub(super) fn catalog_args(&self) -> CatalogArgs {
        self.args.catalog.clone()
    }
}

async fn map_images(args: MapArgs) -> Result<()> {
    if args.images.is_empty() {
        anyhow::bail!("No images specified. Pass image references or `-` to read from stdin.");
    }

    let ignore = args.ignore();
    let mapper = Mapper::new(args.catalog.config(ignore)?).context("creating mapper")?;

    let results = if args.images.len() == 1 && args.images[0] == STDIN {
        let input = read_source(STDIN).await?;
        mapper.map_all(image_lines(&input)).await
    } else {
        mapper.map_all(&args.images).await
    }
    .context("mapping images")?;

    debug!(
        images = results.len(),
        matched = results.iter().filter(|r| r.is_match()).count(),
        "Mapped images"
    );

    print_mappings(&results, args.output)
}
