//! Image reference parsing and normalization.
//!
//! Parses Docker-style references like:
//! - `nginx` -> `index.docker.io/library/nginx`
//! - `myuser/myapp:v1.0` -> `index.docker.io/myuser/myapp:v1.0`
//! - `ghcr.io/owner/repo:tag`
//! - `registry.example.com:5000/app@sha256:abc...`
//!
//! Two references name the same repository when their [`ImageReference::context`]
//! strings are equal.

use std::fmt;
use std::str::FromStr;

use crate::error::MapError;

/// Registry used for references without an explicit registry.
pub const DEFAULT_REGISTRY: &str = "index.docker.io";

const MAX_TAG_LEN: usize = 128;

/// Parsed image reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageReference {
    /// Registry host, e.g. `ghcr.io` or `localhost:5000`.
    pub registry: String,

    /// Repository path, e.g. `library/nginx`.
    pub repository: String,

    pub tag: Option<String>,

    /// Digest, e.g. `sha256:abc123...`.
    pub digest: Option<String>,
}

impl ImageReference {
    pub fn parse(input: &str) -> Result<Self, MapError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(MapError::invalid(input, "empty image reference"));
        }

        let (name, digest) = match s.split_once('@') {
            Some((name, digest)) => {
                validate_digest(input, digest)?;
                (name, Some(digest.to_string()))
            }
            None => (s, None),
        };

        // A colon followed by a slash belongs to a registry port, not a tag
        let (name, tag) = match name.rsplit_once(':') {
            Some((before, after)) if !after.contains('/') => {
                validate_tag(input, after)?;
                (before, Some(after.to_string()))
            }
            _ => (name, None),
        };

        let (registry, repository) = split_registry(name);
        validate_registry(input, registry)?;
        let registry = normalize_registry(registry);

        let repository = if registry == DEFAULT_REGISTRY && !repository.contains('/') {
            format!("library/{repository}")
        } else {
            repository.to_string()
        };
        validate_repository(input, &repository)?;

        Ok(Self {
            registry,
            repository,
            tag,
            digest,
        })
    }

    /// `registry/repository`, without tag or digest.
    pub fn context(&self) -> String {
        format!("{}/{}", self.registry, self.repository)
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.registry, self.repository)?;
        if let Some(tag) = &self.tag {
            write!(f, ":{tag}")?;
        }
        if let Some(digest) = &self.digest {
            write!(f, "@{digest}")?;
        }
        Ok(())
    }
}

impl FromStr for ImageReference {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Parse a repository expressed as a registry hostname (`cgr.dev`) or a
/// repository path (`cgr.dev/chainguard`), returning its normalized form.
///
/// The empty string is the default registry.
pub fn parse_repository(input: &str) -> Result<String, MapError> {
    let s = input.trim().trim_end_matches('/');

    if !s.contains('/') {
        validate_registry(input, s)?;
        return Ok(normalize_registry(s));
    }

    let reference = ImageReference::parse(s)?;
    if reference.tag.is_some() || reference.digest.is_some() {
        return Err(MapError::invalid(
            input,
            "repository must not carry a tag or digest",
        ));
    }

    Ok(reference.context())
}

/// Split `name` into registry and repository. The first path component is a
/// registry when it looks like a host (has a dot or port, or is `localhost`).
fn split_registry(name: &str) -> (&str, &str) {
    match name.split_once('/') {
        Some((first, rest))
            if first.contains('.') || first.contains(':') || first == "localhost" =>
        {
            (first, rest)
        }
        _ => ("", name),
    }
}

fn normalize_registry(registry: &str) -> String {
    match registry {
        "" | "docker.io" | "registry-1.docker.io" | "registry.hub.docker.com" => {
            DEFAULT_REGISTRY.to_string()
        }
        other => other.to_string(),
    }
}

fn validate_registry(input: &str, registry: &str) -> Result<(), MapError> {
    if registry.is_empty() {
        return Ok(());
    }

    let (host, port) = match registry.rsplit_once(':') {
        Some((host, port)) => (host, Some(port)),
        None => (registry, None),
    };

    if host.is_empty()
        || !host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        return Err(MapError::invalid(input, format!("invalid registry {registry:?}")));
    }

    if let Some(port) = port {
        if port.is_empty() || !port.chars().all(|c| c.is_ascii_digit()) {
            return Err(MapError::invalid(input, format!("invalid registry port {port:?}")));
        }
    }

    Ok(())
}

fn validate_repository(input: &str, repository: &str) -> Result<(), MapError> {
    let valid = !repository.is_empty()
        && repository.split('/').all(|component| {
            !component.is_empty()
                && component.chars().all(|c| {
                    c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-')
                })
        });

    if valid {
        Ok(())
    } else {
        Err(MapError::invalid(input, format!("invalid repository {repository:?}")))
    }
}

fn validate_tag(input: &str, tag: &str) -> Result<(), MapError> {
    let valid = !tag.is_empty()
        && tag.len() <= MAX_TAG_LEN
        && !tag.starts_with(['.', '-'])
        && tag
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));

    if valid {
        Ok(())
    } else {
        Err(MapError::invalid(input, format!("invalid tag {tag:?}")))
    }
}

fn validate_digest(input: &str, digest: &str) -> Result<(), MapError> {
    match digest.split_once(':') {
        Some((algorithm, hex))
            if !algorithm.is_empty()
                && !hex.is_empty()
                && hex.chars().all(|c| c.is_ascii_hexdigit()) =>
        {
            Ok(())
        }
        _ => Err(MapError::invalid(input, format!("invalid digest {digest:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("nginx", "index.docker.io", "library/nginx", None)]
    #[case("nginx:1.25", "index.docker.io", "library/nginx", Some("1.25"))]
    #[case("docker.io/library/nginx", "index.docker.io", "library/nginx", None)]
    #[case("myuser/myapp:v1.0", "index.docker.io", "myuser/myapp", Some("v1.0"))]
    #[case("ghcr.io/owner/repo:latest", "ghcr.io", "owner/repo", Some("latest"))]
    #[case("localhost:5000/myapp:v1", "localhost:5000", "myapp", Some("v1"))]
    #[case("localhost/myapp", "localhost", "myapp", None)]
    #[case("registry.example.com:5000/a/b/c", "registry.example.com:5000", "a/b/c", None)]
    fn test_parse(
        #[case] input: &str,
        #[case] registry: &str,
        #[case] repository: &str,
        #[case] tag: Option<&str>,
    ) {
        let r = ImageReference::parse(input).unwrap();
        assert_eq!(r.registry, registry);
        assert_eq!(r.repository, repository);
        assert_eq!(r.tag.as_deref(), tag);
        assert!(r.digest.is_none());
    }

    #[test]
    fn test_parse_digest_reference() {
        let r = ImageReference::parse("ghcr.io/owner/repo:v2@sha256:def456").unwrap();
        assert_eq!(r.registry, "ghcr.io");
        assert_eq!(r.repository, "owner/repo");
        assert_eq!(r.tag.as_deref(), Some("v2"));
        assert_eq!(r.digest.as_deref(), Some("sha256:def456"));
        assert_eq!(r.to_string(), "ghcr.io/owner/repo:v2@sha256:def456");
    }

    #[test]
    fn test_context_strips_tag() {
        let r: ImageReference = "cgr.dev/chainguard/b:latest".parse().unwrap();
        assert_eq!(r.context(), "cgr.dev/chainguard/b");
    }

    #[rstest]
    #[case("")]
    #[case("not:a:valid:repo")]
    #[case("ghcr.io/Owner/Repo")]
    #[case("ghcr.io/owner//repo")]
    #[case("nginx:-bad")]
    #[case("nginx@sha256")]
    #[case("nginx@sha256:xyz")]
    #[case("${BASE_IMAGE}")]
    fn test_parse_rejects_malformed(#[case] input: &str) {
        let err = ImageReference::parse(input).unwrap_err();
        assert!(matches!(err, MapError::InvalidReference { .. }));
    }

    #[rstest]
    #[case("cgr.dev", "cgr.dev")]
    #[case("cgr.dev/chainguard", "cgr.dev/chainguard")]
    #[case("cgr.dev/chainguard/", "cgr.dev/chainguard")]
    #[case("gcr.io/my-project/my-repo", "gcr.io/my-project/my-repo")]
    #[case("registry.internal:8443/mirror", "registry.internal:8443/mirror")]
    #[case("", "index.docker.io")]
    fn test_parse_repository(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(parse_repository(input).unwrap(), expected);
    }

    #[rstest]
    #[case("not:a:valid:repo")]
    #[case("cgr.dev/chainguard:latest")]
    #[case("bad host")]
    fn test_parse_repository_rejects_malformed(#[case] input: &str) {
        assert!(parse_repository(input).is_err());
    }
}
