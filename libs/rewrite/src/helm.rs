//! Helm values rewriting.
//!
//! Finds `image` keys anywhere under nested mappings and writes the mapped
//! values to a sparse overlay. Two shapes are recognized:
//!
//! ```yaml
//! image: ghcr.io/foo/bar
//!
//! image:
//!   registry: ghcr.io      # optional
//!   repository: foo/bar
//! ```
//!
//! Sequences are not descended into.

use std::collections::BTreeMap;

use imgmap_mapper::MapImage;
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::error::RewriteError;
use crate::{map_best, prefetch};

const IMAGE_KEY: &str = "image";
const REGISTRY_KEY: &str = "registry";
const REPOSITORY_KEY: &str = "repository";

/// An `image` field found in the input, with the key path leading to it.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ImageField {
    path: Vec<String>,
    shape: ImageShape,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ImageShape {
    /// `image: <reference>`
    Scalar(String),
    /// `image: {repository: ..., registry: ...}`
    Structured {
        /// Registry and repository joined.
        reference: String,
        /// Whether the `registry` key exists, even if empty.
        has_registry: bool,
    },
}

impl ImageShape {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::Scalar(s.clone())),
            Value::Mapping(m) => {
                let repository = m
                    .get(REPOSITORY_KEY)
                    .and_then(Value::as_str)
                    .filter(|r| !r.is_empty())?;

                let reference = match m.get(REGISTRY_KEY).and_then(Value::as_str) {
                    Some(registry) if !registry.is_empty() => format!("{registry}/{repository}"),
                    _ => repository.to_string(),
                };

                Some(Self::Structured {
                    reference,
                    has_registry: m.contains_key(REGISTRY_KEY),
                })
            }
            _ => None,
        }
    }

    fn reference(&self) -> &str {
        match self {
            Self::Scalar(reference) => reference,
            Self::Structured { reference, .. } => reference,
        }
    }
}

/// Sparse output tree. `BTreeMap` keeps keys sorted in the output.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Overlay {
    Scalar(String),
    Tree(BTreeMap<String, Overlay>),
}

/// Map the image references in a Helm values document.
///
/// Returns a YAML document containing only the rewritten fields, with keys
/// sorted. Images that don't parse or have no catalog match are left out.
/// An empty input produces an empty output.
pub async fn map_values<M>(mapper: &M, input: &str) -> Result<String, RewriteError>
where
    M: MapImage + ?Sized,
{
    if input.trim().is_empty() {
        return Ok(String::new());
    }

    let values: Value = serde_yaml::from_str(input).map_err(RewriteError::Parse)?;
    let root = match values {
        Value::Mapping(root) => root,
        Value::Null => return Ok(String::new()),
        _ => return Err(RewriteError::NotAMapping),
    };

    let mut fields = Vec::new();
    collect_image_fields(&mut Vec::new(), &root, &mut fields);
    debug!(fields = fields.len(), "Found image fields");

    if fields.is_empty() {
        return Ok(String::new());
    }
    prefetch(mapper).await?;

    let mut overlay = BTreeMap::new();
    for field in fields {
        let Some(mapped) = map_best(mapper, field.shape.reference()).await else {
            continue;
        };

        debug!(
            path = %field.path.join("."),
            from = %field.shape.reference(),
            to = %mapped.context(),
            "Rewrote image field"
        );

        match field.shape {
            ImageShape::Scalar(_) => set_value(&mut overlay, &field.path, mapped.context()),
            ImageShape::Structured {
                has_registry: true,
                ..
            } => {
                set_value(
                    &mut overlay,
                    &child_path(&field.path, REGISTRY_KEY),
                    mapped.registry,
                );
                set_value(
                    &mut overlay,
                    &child_path(&field.path, REPOSITORY_KEY),
                    mapped.repository,
                );
            }
            ImageShape::Structured {
                has_registry: false,
                ..
            } => set_value(
                &mut overlay,
                &child_path(&field.path, REPOSITORY_KEY),
                mapped.context(),
            ),
        }
    }

    if overlay.is_empty() {
        return Ok(String::new());
    }

    serde_yaml::to_string(&overlay).map_err(RewriteError::Serialize)
}

fn collect_image_fields(path: &mut Vec<String>, mapping: &Mapping, out: &mut Vec<ImageField>) {
    for (key, value) in mapping {
        let Some(key) = key_string(key) else {
            continue;
        };

        if key == IMAGE_KEY {
            if let Some(shape) = ImageShape::from_value(value) {
                out.push(ImageField {
                    path: child_path(path, &key),
                    shape,
                });
            }
        }

        if let Value::Mapping(child) = value {
            path.push(key);
            collect_image_fields(path, child, out);
            path.pop();
        }
    }
}

fn key_string(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn child_path(path: &[String], key: &str) -> Vec<String> {
    let mut child = path.to_vec();
    child.push(key.to_string());
    child
}

/// Set the value at `path`, creating intermediate trees. A scalar found where
/// a tree is needed is replaced.
fn set_value(root: &mut BTreeMap<String, Overlay>, path: &[String], value: String) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };

    let mut current = root;
    for key in parents {
        let node = current
            .entry(key.clone())
            .or_insert_with(|| Overlay::Tree(BTreeMap::new()));
        if !matches!(node, Overlay::Tree(_)) {
            *node = Overlay::Tree(BTreeMap::new());
        }
        let Overlay::Tree(tree) = node else {
            return;
        };
        current = tree;
    }

    current.insert(last.clone(), Overlay::Scalar(value));
}
