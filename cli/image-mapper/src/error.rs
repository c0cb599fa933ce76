//! Error display for the CLI.

use colored::Colorize;
use imgmap_catalog::CatalogError;
use imgmap_mapper::MapError;

/// Print an error chain in a user-friendly format, with a hint when the
/// cause is recognized.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {:#}", "Error:".red().bold(), err);

    if let Some(hint) = hint(err) {
        eprintln!("\n{}", hint.yellow());
    }
}

fn hint(err: &anyhow::Error) -> Option<String> {
    let catalog = err.chain().find_map(|cause| {
        cause.downcast_ref::<CatalogError>().or_else(|| {
            match cause.downcast_ref::<MapError>() {
                Some(MapError::Catalog(e)) => Some(e),
                _ => None,
            }
        })
    });

    if let Some(e) = catalog {
        if let CatalogError::CacheCorrupt { path, .. } = e {
            return Some(format!(
                "Hint: Delete {} or pass --cache=false to fetch fresh catalog data.",
                path.display()
            ));
        }
        if e.is_transport() {
            return Some(
                "Hint: Check your network connection and the --catalog-url endpoint.".to_string(),
            );
        }
    }

    if err
        .chain()
        .any(|cause| matches!(cause.downcast_ref::<MapError>(), Some(MapError::NoCacheDir)))
    {
        return Some("Hint: Pass --cache-dir or --cache=false.".to_string());
    }

    None
}
