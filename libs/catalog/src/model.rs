//! Catalog record model.
//!
//! Field names follow the catalog's JSON (`catalogTier`, `activeTags`,
//! `fetchedAt`) so the same types read the remote response and the on-disk
//! cache file.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

/// Catalog tier of a repository.
///
/// Tiers the catalog introduces later are kept verbatim in [`CatalogTier::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum CatalogTier {
    Premium,
    Application,
    Base,
    Fips,
    Ai,
    Other(String),
}

impl CatalogTier {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Premium => "PREMIUM",
            Self::Application => "APPLICATION",
            Self::Base => "BASE",
            Self::Fips => "FIPS",
            Self::Ai => "AI",
            Self::Other(tier) => tier,
        }
    }
}

impl Default for CatalogTier {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for CatalogTier {
    fn from(value: String) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "PREMIUM" => Self::Premium,
            "APPLICATION" => Self::Application,
            "BASE" => Self::Base,
            "FIPS" => Self::Fips,
            "AI" => Self::Ai,
            _ => Self::Other(value),
        }
    }
}

impl From<Option<String>> for CatalogTier {
    fn from(value: Option<String>) -> Self {
        value.map(Self::from).unwrap_or_default()
    }
}

impl From<CatalogTier> for String {
    fn from(tier: CatalogTier) -> Self {
        match tier {
            CatalogTier::Other(tier) => tier,
            known => known.as_str().to_string(),
        }
    }
}

impl FromStr for CatalogTier {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s.trim().to_string()))
    }
}

impl fmt::Display for CatalogTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tag in a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
}

/// A repository in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoRecord {
    /// Catalog-unique repository name, e.g. `nginx`.
    pub name: String,

    #[serde(default)]
    pub catalog_tier: CatalogTier,

    /// Upstream references this repository replaces. Either bare paths
    /// (`hashicorp/vault-k8s`) or fully qualified (`quay.io/argoproj/argocli`).
    #[serde(default, deserialize_with = "null_as_empty")]
    pub aliases: Vec<String>,

    /// Tags currently built and supported.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub active_tags: Vec<String>,

    /// Every known tag, excluding referrers, epochs, and date tags.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<Tag>,
}

impl RepoRecord {
    pub fn new(name: impl Into<String>, catalog_tier: CatalogTier) -> Self {
        Self {
            name: name.into(),
            catalog_tier,
            aliases: Vec::new(),
            active_tags: Vec::new(),
            tags: Vec::new(),
        }
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_active_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.active_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Names of all known tags, in catalog order.
    pub fn tag_names(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(|tag| tag.name.as_str())
    }

    pub fn has_active_tag(&self, tag: &str) -> bool {
        self.active_tags.iter().any(|t| t == tag)
    }
}

/// A point-in-time view of the full repository list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    #[serde(rename = "repos")]
    pub records: Vec<RepoRecord>,

    #[serde(rename = "fetchedAt")]
    pub fetched_at: DateTime<Utc>,
}

impl CatalogSnapshot {
    /// Create a snapshot stamped with the current time.
    ///
    /// Records without a name are dropped.
    pub fn new(records: Vec<RepoRecord>) -> Self {
        Self {
            records: without_unnamed(records),
            fetched_at: Utc::now(),
        }
    }

    /// Drop records without a name, e.g. from a cache file written by an
    /// older version.
    pub(crate) fn retain_named(&mut self) {
        self.records = without_unnamed(std::mem::take(&mut self.records));
    }

    /// Returns true while the snapshot is younger than `ttl`.
    ///
    /// A zero `ttl` is never fresh.
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        if ttl.is_zero() {
            return false;
        }

        let age = Utc::now().signed_duration_since(self.fetched_at);
        match chrono::Duration::from_std(ttl) {
            Ok(ttl) => age < ttl,
            // Larger than chrono can represent: effectively forever.
            Err(_) => true,
        }
    }
}

fn without_unnamed(mut records: Vec<RepoRecord>) -> Vec<RepoRecord> {
    let before = records.len();
    records.retain(|record| !record.name.trim().is_empty());

    let dropped = before - records.len();
    if dropped > 0 {
        warn!(dropped, "Dropped catalog records without a name");
    }
    records
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<Vec<T>>::deserialize(deserializer).map(Option::unwrap_or_default)
}
