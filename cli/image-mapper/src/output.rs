//! Output formatting for mapping results.

use std::io::Write;

use anyhow::{Context, Result};
use clap::ValueEnum;
use imgmap_mapper::MappingResult;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Output format for `map`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// `<image> -> <best match>`, one line per image.
    #[default]
    Text,
    /// Human-readable table with every candidate.
    Table,
    /// JSON array of results.
    Json,
}

#[derive(Tabled)]
struct MappingRow<'a> {
    #[tabled(rename = "IMAGE")]
    image: &'a str,
    #[tabled(rename = "MATCH")]
    best: &'a str,
    #[tabled(rename = "ALTERNATIVES")]
    alternatives: String,
}

impl<'a> From<&'a MappingResult> for MappingRow<'a> {
    fn from(result: &'a MappingResult) -> Self {
        let best = result.candidates.first().map(String::as_str).unwrap_or("-");
        let alternatives = result.candidates.iter().skip(1).cloned().collect::<Vec<_>>();

        Self {
            image: &result.image,
            best,
            alternatives: if alternatives.is_empty() {
                "-".to_string()
            } else {
                alternatives.join(", ")
            },
        }
    }
}

/// Print results to stdout in the given format.
pub fn print_mappings(results: &[MappingResult], format: OutputFormat) -> Result<()> {
    let rendered = render(results, format)?;

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(rendered.as_bytes())
        .context("writing output")
}

fn render(results: &[MappingResult], format: OutputFormat) -> Result<String> {
    let rendered = match format {
        OutputFormat::Text => results
            .iter()
            .map(|r| match r.candidates.first() {
                Some(best) => format!("{} -> {}\n", r.image, best),
                None => format!("{} -> no match\n", r.image),
            })
            .collect(),
        OutputFormat::Table => {
            let rows: Vec<MappingRow<'_>> = results.iter().map(MappingRow::from).collect();
            let mut table = Table::new(rows);
            table.with(Style::blank());
            format!("{table}\n")
        }
        OutputFormat::Json => {
            let mut json =
                serde_json::to_string_pretty(results).context("serializing results")?;
            json.push('\n');
            json
        }
    };

    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn results() -> Vec<MappingResult> {
        vec![
            MappingResult {
                image: "quay.io/argoproj/argocd".to_string(),
                candidates: vec![
                    "cgr.dev/chainguard/argocd:latest".to_string(),
                    "cgr.dev/chainguard/argocd-fips:latest".to_string(),
                ],
            },
            MappingResult {
                image: "ghcr.io/acme/unknown".to_string(),
                candidates: Vec::new(),
            },
        ]
    }

    #[test]
    fn test_render_text() {
        let out = render(&results(), OutputFormat::Text).unwrap();
        assert_eq!(
            out,
            "quay.io/argoproj/argocd -> cgr.dev/chainguard/argocd:latest\n\
             ghcr.io/acme/unknown -> no match\n"
        );
    }

    #[test]
    fn test_render_json() {
        let out = render(&results(), OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();

        assert_eq!(parsed[0]["image"], "quay.io/argoproj/argocd");
        assert_eq!(parsed[0]["candidates"][1], "cgr.dev/chainguard/argocd-fips:latest");
        assert_eq!(parsed[1]["candidates"], serde_json::json!([]));
    }

    #[test]
    fn test_render_table() {
        let out = render(&results(), OutputFormat::Table).unwrap();

        assert!(out.contains("IMAGE"));
        assert!(out.contains("ALTERNATIVES"));
        assert!(out.contains("cgr.dev/chainguard/argocd-fips:latest"));
        assert!(out.contains("ghcr.io/acme/unknown"));
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render(&[], OutputFormat::Text).unwrap(), "");
        assert_eq!(render(&[], OutputFormat::Json).unwrap(), "[]\n");
    }
}
