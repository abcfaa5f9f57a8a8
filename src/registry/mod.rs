//! Registry query capability used for license enrichment and other
//! best-effort metadata lookups.
//!
//! Parsers never talk to the network directly; they go through the
//! [`RegistryQuery`] trait so tests can substitute a mock registry.

use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use crate::shared::Result;

/// Response of a single registry lookup.
#[derive(Debug, Clone)]
pub struct RegistryResponse {
    pub status: u16,
    pub body: String,
}

impl RegistryResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A `GET <url>` capability against a package registry.
///
/// Implementations must be `Send + Sync`; lookups within one manifest are
/// issued concurrently.
#[async_trait]
pub trait RegistryQuery: Send + Sync {
    async fn get(&self, url: &str) -> Result<RegistryResponse>;
}

/// reqwest-backed registry client with an in-memory response cache.
///
/// The cache means a dependency shared by several manifests is only looked
/// up once per run. Each request inherits the client timeout; there are no
/// retries, a failed lookup is simply reported to the caller.
pub struct HttpRegistry {
    client: reqwest::Client,
    cache: DashMap<String, RegistryResponse>,
}

impl HttpRegistry {
    pub fn new() -> Result<Self> {
        let version = env!("CARGO_PKG_VERSION");
        let user_agent = format!("srcbom/{}", version);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            cache: DashMap::new(),
        })
    }
}

#[async_trait]
impl RegistryQuery for HttpRegistry {
    async fn get(&self, url: &str) -> Result<RegistryResponse> {
        if let Some(cached) = self.cache.get(url) {
            debug!(url, "registry cache hit");
            return Ok(cached.clone());
        }

        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        let response = RegistryResponse { status, body };
        self.cache.insert(url.to_string(), response.clone());
        Ok(response)
    }
}

/// Validates a package name or version before it is interpolated into a
/// registry URL, rejecting path separators and URL metacharacters.
pub fn validate_url_component(component: &str, component_type: &str) -> Result<()> {
    if component.contains('/') || component.contains('\\') {
        anyhow::bail!(
            "Security: {} contains path separators which are not allowed",
            component_type
        );
    }

    if component.contains("..") {
        anyhow::bail!(
            "Security: {} contains '..' which is not allowed",
            component_type
        );
    }

    if component.contains('#') || component.contains('?') || component.contains('@') {
        anyhow::bail!(
            "Security: {} contains URL-unsafe characters",
            component_type
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_registry_creation() {
        let registry = HttpRegistry::new();
        assert!(registry.is_ok());
    }

    #[test]
    fn test_response_is_success() {
        let ok = RegistryResponse {
            status: 200,
            body: String::new(),
        };
        let missing = RegistryResponse {
            status: 404,
            body: String::new(),
        };
        assert!(ok.is_success());
        assert!(!missing.is_success());
    }

    #[test]
    fn test_validate_url_component_accepts_names() {
        assert!(validate_url_component("jackson-databind", "Package name").is_ok());
        assert!(validate_url_component("2.15.0", "Version").is_ok());
    }

    #[test]
    fn test_validate_url_component_rejects_separators() {
        assert!(validate_url_component("a/b", "Package name").is_err());
        assert!(validate_url_component("a\\b", "Package name").is_err());
        assert!(validate_url_component("..", "Package name").is_err());
    }

    #[test]
    fn test_validate_url_component_rejects_metacharacters() {
        assert!(validate_url_component("a?b", "Version").is_err());
        assert!(validate_url_component("a#b", "Version").is_err());
        assert!(validate_url_component("a@b", "Version").is_err());
    }
}
