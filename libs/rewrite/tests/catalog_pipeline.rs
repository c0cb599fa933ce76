//! End-to-end rewriting against a mocked catalog endpoint, through the disk
//! and memory caches.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use imgmap_catalog::{
    CatalogError, CatalogSnapshot, CatalogSource, CatalogTier, MemoryCache, RepoRecord,
    CACHE_FILE_NAME,
};
use imgmap_mapper::{document_defaults, MapError, Mapper, MapperConfig};
use imgmap_rewrite::{map_dockerfile, map_values, RewriteError};
use tempfile::TempDir;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn catalog_body() -> serde_json::Value {
    serde_json::json!({
        "data": {
            "repos": [
                {
                    "name": "argocd",
                    "catalogTier": "APPLICATION",
                    "aliases": ["quay.io/argoproj/argocd"],
                    "activeTags": ["latest", "v2.13"]
                },
                {
                    "name": "argocd-fips",
                    "catalogTier": "FIPS",
                    "aliases": ["quay.io/argoproj/argocd"],
                    "activeTags": ["latest"]
                },
                {
                    "name": "cert-manager-webhook-iamguarded",
                    "catalogTier": "APPLICATION",
                    "aliases": ["quay.io/jetstack/cert-manager-webhook"]
                },
                {
                    "name": "cert-manager-webhook",
                    "catalogTier": "APPLICATION",
                    "aliases": ["quay.io/jetstack/cert-manager-webhook"]
                },
                {
                    "name": "go",
                    "catalogTier": "BASE",
                    "aliases": ["golang"],
                    "activeTags": ["latest", "1.22"]
                },
                {
                    "name": "nginx",
                    "catalogTier": "APPLICATION",
                    "aliases": ["docker.io/library/nginx"],
                    "activeTags": ["latest"],
                    "tags": null
                }
            ]
        }
    })
}

fn config(server: &MockServer, cache_dir: &TempDir) -> MapperConfig {
    MapperConfig {
        ignore: document_defaults(),
        catalog_url: server.uri(),
        cache_dir: Some(cache_dir.path().to_path_buf()),
        request_timeout: Duration::from_secs(5),
        ..Default::default()
    }
}

const VALUES: &str = r#"
server:
  image:
    repository: quay.io/argoproj/argocd
    tag: v2.13.1
webhook:
  image:
    registry: quay.io
    repository: jetstack/cert-manager-webhook
proxy:
  image: nginx:1.27
unknown:
  image: ghcr.io/acme/thing:1.0
"#;

const DOCKERFILE: &str = "FROM golang:1.22 AS build\nRUN go build\nFROM build\nFROM nginx\n";

#[tokio::test]
async fn test_documents_share_one_catalog_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog_body()))
        .expect(1)
        .mount(&server)
        .await;

    let cache_dir = TempDir::new().unwrap();
    let mapper = Mapper::new(config(&server, &cache_dir)).unwrap();

    let values = map_values(&mapper, VALUES).await.unwrap();
    assert_eq!(
        values,
        "\
proxy:
  image: cgr.dev/chainguard/nginx
server:
  image:
    repository: cgr.dev/chainguard/argocd
webhook:
  image:
    registry: cgr.dev
    repository: chainguard/cert-manager-webhook
"
    );

    let dockerfile = map_dockerfile(&mapper, DOCKERFILE).await.unwrap();
    assert_eq!(
        dockerfile,
        "FROM cgr.dev/chainguard/go:1.22 AS build\n\
         RUN go build\n\
         FROM build\n\
         FROM cgr.dev/chainguard/nginx:latest\n"
    );

    assert!(cache_dir.path().join(CACHE_FILE_NAME).exists());
}

#[tokio::test]
async fn test_disk_cache_is_reused_by_a_new_mapper() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog_body()))
        .expect(1)
        .mount(&server)
        .await;

    let cache_dir = TempDir::new().unwrap();

    let first = Mapper::new(config(&server, &cache_dir)).unwrap();
    let before = map_dockerfile(&first, DOCKERFILE).await.unwrap();
    drop(first);

    let second = Mapper::new(config(&server, &cache_dir)).unwrap();
    let after = map_dockerfile(&second, DOCKERFILE).await.unwrap();

    assert_eq!(before, after);
}

#[tokio::test]
async fn test_unreachable_catalog_fails_the_document() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let cache_dir = TempDir::new().unwrap();
    let mapper = Mapper::new(MapperConfig {
        cache: false,
        ..config(&server, &cache_dir)
    })
    .unwrap();

    let err = map_values(&mapper, VALUES).await.unwrap_err();
    assert!(matches!(
        err,
        RewriteError::Catalog(MapError::Catalog(CatalogError::Status(500)))
    ));
    assert!(!cache_dir.path().join(CACHE_FILE_NAME).exists());
}

#[tokio::test]
async fn test_corrupt_cache_file_fails_the_document() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog_body()))
        .expect(0)
        .mount(&server)
        .await;

    let cache_dir = TempDir::new().unwrap();
    std::fs::write(cache_dir.path().join(CACHE_FILE_NAME), b"{not json").unwrap();

    let mapper = Mapper::new(config(&server, &cache_dir)).unwrap();
    let err = map_dockerfile(&mapper, DOCKERFILE).await.unwrap_err();

    match err {
        RewriteError::Catalog(MapError::Catalog(e)) => assert!(e.is_cache_corrupt()),
        other => panic!("unexpected error: {other:?}"),
    }
}

/// Succeeds on every call except the `fail_on`-th.
struct FlakySource {
    calls: AtomicUsize,
    fail_on: usize,
}

impl FlakySource {
    fn failing_on(fail_on: usize) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_on,
        }
    }
}

#[async_trait]
impl CatalogSource for FlakySource {
    async fn fetch(&self) -> Result<Arc<CatalogSnapshot>, CatalogError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.fail_on {
            return Err(CatalogError::Status(503));
        }

        Ok(Arc::new(CatalogSnapshot::new(vec![
            RepoRecord::new("argocd", CatalogTier::Application)
                .with_aliases(["quay.io/argoproj/argocd"]),
            RepoRecord::new("nginx", CatalogTier::Application)
                .with_aliases(["docker.io/library/nginx"]),
        ])))
    }
}

/// A mapper that refetches on every call and whose second fetch fails, i.e.
/// the first image mapped after the catalog was found reachable.
fn flaky_mapper() -> Mapper {
    let source = MemoryCache::new(Duration::ZERO, FlakySource::failing_on(2));
    Mapper::with_source(Arc::new(source), MapperConfig::default()).unwrap()
}

#[tokio::test]
async fn test_values_field_with_failed_refresh_is_skipped() {
    let input = "\
a:
  image: quay.io/argoproj/argocd
b:
  image: nginx
c:
  image: quay.io/argoproj/argocd
";

    let got = map_values(&flaky_mapper(), input).await.unwrap();
    assert_eq!(
        got,
        "\
b:
  image: cgr.dev/chainguard/nginx
c:
  image: cgr.dev/chainguard/argocd
"
    );
}

#[tokio::test]
async fn test_dockerfile_line_with_failed_refresh_is_unchanged() {
    let input = "FROM quay.io/argoproj/argocd\nFROM nginx\n";

    let got = map_dockerfile(&flaky_mapper(), input).await.unwrap();
    assert_eq!(
        got,
        "FROM quay.io/argoproj/argocd\nFROM cgr.dev/chainguard/nginx:latest\n"
    );
}
