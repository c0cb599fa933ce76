//! Dockerfile rewriting.

use std::collections::HashSet;

use imgmap_mapper::MapImage;
use tracing::debug;

use crate::error::RewriteError;
use crate::{map_best, prefetch};

/// Base image that means "no base image".
const SCRATCH: &str = "scratch";

/// A parsed `FROM` instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FromInstruction<'a> {
    /// Byte offset of the image token within the line.
    start: usize,
    image: &'a str,
    /// Stage name declared with `AS`.
    stage: Option<&'a str>,
}

impl FromInstruction<'_> {
    fn end(&self) -> usize {
        self.start + self.image.len()
    }
}

/// Map the base images of every `FROM` instruction in a Dockerfile.
///
/// Everything except the image token is preserved byte for byte. `FROM`
/// lines naming an earlier build stage, `scratch`, or a build argument
/// (`$BASE`) are left alone, as are images with no catalog match.
pub async fn map_dockerfile<M>(mapper: &M, input: &str) -> Result<String, RewriteError>
where
    M: MapImage + ?Sized,
{
    let mut output = String::with_capacity(input.len());
    let mut stages: HashSet<String> = HashSet::new();
    let mut prefetched = false;

    for line in input.split_inclusive('\n') {
        let Some(from) = parse_from(line) else {
            output.push_str(line);
            continue;
        };

        let replacement = if is_mappable(from.image, &stages) {
            if !prefetched {
                prefetch(mapper).await?;
                prefetched = true;
            }
            map_best(mapper, from.image).await
        } else {
            debug!(image = %from.image, "Skipping FROM target");
            None
        };

        match replacement {
            Some(mapped) => {
                let mapped = mapped.to_string();
                debug!(from = %from.image, to = %mapped, "Rewrote FROM line");
                output.push_str(&line[..from.start]);
                output.push_str(&mapped);
                output.push_str(&line[from.end()..]);
            }
            None => output.push_str(line),
        }

        if let Some(stage) = from.stage {
            stages.insert(stage.to_ascii_lowercase());
        }
    }

    Ok(output)
}

fn is_mappable(image: &str, stages: &HashSet<String>) -> bool {
    let lowered = image.to_ascii_lowercase();
    lowered != SCRATCH && !image.contains('$') && !stages.contains(&lowered)
}

/// Parse `FROM [--flag=value...] <image> [AS <name>]`. Keywords are
/// case-insensitive.
fn parse_from(line: &str) -> Option<FromInstruction<'_>> {
    let mut words = words(line).into_iter();

    let (_, instruction) = words.next()?;
    if !instruction.eq_ignore_ascii_case("FROM") {
        return None;
    }

    let (start, image) = words.by_ref().find(|(_, word)| !word.starts_with("--"))?;

    let stage = match (words.next(), words.next()) {
        (Some((_, keyword)), Some((_, name))) if keyword.eq_ignore_ascii_case("AS") => Some(name),
        _ => None,
    };

    Some(FromInstruction {
        start,
        image,
        stage,
    })
}

/// Whitespace-separated words with their byte offsets.
fn words(line: &str) -> Vec<(usize, &str)> {
    let mut words = Vec::new();
    let mut start = None;

    for (i, c) in line.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                words.push((s, &line[s..i]));
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        words.push((s, &line[s..]));
    }

    words
}
