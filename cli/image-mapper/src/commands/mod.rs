//! CLI commands.

mod document;
mod map;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use imgmap_catalog::{AliasCorrections, DEFAULT_CATALOG_URL};
use imgmap_mapper::{IgnorePredicate, MapperConfig, DEFAULT_REPOSITORY};

use crate::logging::LogFormat;

use document::{DocumentArgs, DocumentKind};

/// image-mapper - Map upstream container images to catalog images.
#[derive(Debug, Parser)]
#[command(name = "image-mapper")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log line format. Logs are written to stderr.
    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = LogFormat::Text,
        env = "IMAGE_MAPPER_LOG_FORMAT"
    )]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Map upstream image references to catalog images.
    Map(map::MapCommand),

    /// Same as `map dockerfile`.
    Dockerfile(DocumentArgs),

    /// Same as `map helm-values`.
    HelmValues(DocumentArgs),

    /// Show CLI version.
    Version,
}

impl Cli {
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Run the CLI command.
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Map(cmd) => cmd.run().await,
            Commands::Dockerfile(args) => args.run(DocumentKind::Dockerfile).await,
            Commands::HelmValues(args) => args.run(DocumentKind::HelmValues).await,
            Commands::Version => {
                println!("image-mapper {}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
        }
    }
}

/// Flags controlling where catalog data comes from.
#[derive(Debug, Clone, Args)]
pub struct CatalogArgs {
    /// Modifies the repository in the mappings. For instance,
    /// registry.internal.dev/chainguard results in
    /// registry.internal.dev/chainguard/<image> in the output.
    #[arg(long, default_value = DEFAULT_REPOSITORY, env = "IMAGE_MAPPER_REPOSITORY")]
    repository: String,

    /// Cache repository data to disk for use in subsequent invocations.
    #[arg(
        long,
        default_value_t = true,
        action = ArgAction::Set,
        env = "IMAGE_MAPPER_CACHE"
    )]
    cache: bool,

    /// How long to reuse cached data before fetching from the catalog
    /// again (e.g. 30m, 1h, 90s).
    #[arg(
        long,
        default_value = "1h",
        value_parser = humantime::parse_duration,
        env = "IMAGE_MAPPER_CACHE_DURATION"
    )]
    cache_duration: Duration,

    /// Directory holding the catalog cache. Defaults to the user cache
    /// directory.
    #[arg(long, value_name = "PATH", env = "IMAGE_MAPPER_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Catalog query endpoint.
    #[arg(long, default_value = DEFAULT_CATALOG_URL, env = "IMAGE_MAPPER_CATALOG_URL")]
    catalog_url: String,

    /// JSON file of alias corrections ({"repo": ["alias", ...]}) replacing
    /// the built-in table.
    #[arg(long, value_name = "PATH", env = "IMAGE_MAPPER_ALIAS_CORRECTIONS")]
    alias_corrections: Option<PathBuf>,
}

impl CatalogArgs {
    /// Build the mapper configuration for these flags.
    pub fn config(self, ignore: Vec<IgnorePredicate>) -> Result<MapperConfig> {
        let alias_corrections = match &self.alias_corrections {
            Some(path) => AliasCorrections::from_json_file(path).with_context(|| {
                format!("loading alias corrections: {}", path.display())
            })?,
            None => AliasCorrections::builtin(),
        };

        Ok(MapperConfig {
            ignore,
            repository: self.repository,
            cache: self.cache,
            cache_duration: self.cache_duration,
            catalog_url: self.catalog_url,
            cache_dir: self.cache_dir,
            alias_corrections,
            ..Default::default()
        })
    }
}
