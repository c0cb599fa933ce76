//! image-mapper - maps upstream container images to catalog equivalents.
//!
//! Reads image references from arguments, stdin, Dockerfiles or Helm values
//! and prints the matching catalog images.

use anyhow::Result;
use clap::Parser;

mod commands;
mod error;
mod input;
mod logging;
mod output;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(cli.log_format());

    if let Err(e) = cli.run().await {
        error::print_error(&e);
        std::process::exit(1);
    }

    Ok(())
}
