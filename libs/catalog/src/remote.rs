//! Remote catalog source.
//!
//! Lists every repository under the organization in a single GraphQL query.
//! No retries happen here.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::corrections::AliasCorrections;
use crate::error::CatalogError;
use crate::model::{CatalogSnapshot, RepoRecord};
use crate::source::CatalogSource;

/// Default catalog query endpoint.
pub const DEFAULT_CATALOG_URL: &str = "https://data.chainguard.dev/query?id=PrivateImageCatalog";

/// User agent sent with every catalog request.
pub const USER_AGENT: &str = "image-mapper";

const REPOS_QUERY: &str = r#"
query PrivateImageCatalog {
  repos(filter: {uidp: {childrenOf: "ce2d1984a010471142503340d670612d63ffb9f6"}}) {
    name
    aliases
    catalogTier
    activeTags
    tags(filter: {excludeDates: true, excludeEpochs: true, excludeReferrers: true}) {
      name
    }
  }
}
"#;

/// Configuration for [`RemoteSource`].
#[derive(Debug, Clone)]
pub struct RemoteSourceConfig {
    /// Catalog query endpoint.
    pub url: String,
    /// Timeout for the whole request, including reading the body.
    pub timeout: Duration,
    /// Corrections applied to every fetched record list.
    pub corrections: AliasCorrections,
}

impl Default for RemoteSourceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_CATALOG_URL.to_string(),
            timeout: Duration::from_secs(30),
            corrections: AliasCorrections::builtin(),
        }
    }
}

/// Fetches the repository list from the catalog service.
#[derive(Debug, Clone)]
pub struct RemoteSource {
    client: reqwest::Client,
    url: String,
    corrections: AliasCorrections,
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
}

#[derive(Deserialize)]
struct QueryResponse {
    data: QueryData,
}

#[derive(Deserialize)]
struct QueryData {
    #[serde(default)]
    repos: Vec<RepoRecord>,
}

impl RemoteSource {
    /// Create a new remote source.
    pub fn new(config: RemoteSourceConfig) -> Result<Self, CatalogError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            url: config.url,
            corrections: config.corrections,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl CatalogSource for RemoteSource {
    async fn fetch(&self) -> Result<Arc<CatalogSnapshot>, CatalogError> {
        info!(url = %self.url, "Fetching list of repositories from catalog");
        let start = Instant::now();

        let response = self
            .client
            .post(&self.url)
            .json(&QueryRequest { query: REPOS_QUERY })
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            debug!(status = %status, "Catalog returned unexpected status");
            return Err(CatalogError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let parsed: QueryResponse = serde_json::from_slice(&body)?;
        let records = self.corrections.apply(parsed.data.repos);

        info!(
            repo_count = records.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Fetched catalog repositories"
        );

        Ok(Arc::new(CatalogSnapshot::new(records)))
    }
}
