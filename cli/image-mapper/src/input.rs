//! Reading command input from files or stdin.

use std::path::Path;

use anyhow::{Context, Result};
use tokio::io::AsyncReadExt;

/// Argument meaning "read from stdin".
pub const STDIN: &str = "-";

/// Read the whole of `source`, or stdin when it is `-`.
pub async fn read_source(source: &str) -> Result<String> {
    if source == STDIN {
        let mut input = String::new();
        tokio::io::stdin()
            .read_to_string(&mut input)
            .await
            .context("reading stdin")?;
        return Ok(input);
    }

    let path = Path::new(source);
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn test_read_source_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("Dockerfile");
        std::fs::write(&path, "FROM nginx\n").unwrap();

        let input = read_source(path.to_str().unwrap()).await.unwrap();
        assert_eq!(input, "FROM nginx\n");
    }

    #[tokio::test]
    async fn test_read_source_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.yaml");

        let err = read_source(path.to_str().unwrap()).await.unwrap_err();
        assert!(err.to_string().starts_with("reading file:"));
    }
}
