//! Module proxy HTTP client

use std::time::Duration;

use tracing::{debug, warn};

use crate::config::LATEST_VERSION;
use crate::error::{Error, Result};
use crate::module::{Module, VersionInfo};
use crate::proxy::ModuleProxy;

/// Client for a module proxy speaking the `/@v/` protocol
pub struct ProxyClient {
    client: reqwest::Client,
    base_url: String,
}

impl ProxyClient {
    /// Creates a new ProxyClient with a custom base URL
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("pkgdoc/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, module_path: &str, endpoint: &str) -> String {
        format!("{}/{}/{}", self.base_url, encode_path(module_path), endpoint)
    }

    async fn get(&self, module_path: &str, endpoint: &str) -> Result<reqwest::Response> {
        let url = self.url(module_path, endpoint);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();

        // Proxies answer 404 or 410 for modules and versions that don't exist
        if status == reqwest::StatusCode::NOT_FOUND || status == reqwest::StatusCode::GONE {
            return Err(Error::NotFound(format!("{} {}", module_path, endpoint)));
        }

        if !status.is_success() {
            warn!("Module proxy returned status {}: {}", status, url);
            return Err(Error::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        Ok(response)
    }
}

#[async_trait::async_trait]
impl ModuleProxy for ProxyClient {
    async fn info(&self, module_path: &str, version: &str) -> Result<VersionInfo> {
        let endpoint = if version == LATEST_VERSION {
            "@latest".to_string()
        } else {
            format!("@v/{}.info", encode_path(version))
        };
        let response = self.get(module_path, &endpoint).await?;

        response.json().await.map_err(|e| {
            warn!("Failed to parse .info response for {}: {}", module_path, e);
            Error::InvalidResponse(e.to_string())
        })
    }

    async fn module(&self, module_path: &str, version: &str) -> Result<Module> {
        let endpoint = format!("@v/{}.manifest", encode_path(version));
        let response = self.get(module_path, &endpoint).await?;

        let module: Module = response.json().await.map_err(|e| {
            warn!("Failed to parse manifest for {}@{}: {}", module_path, version, e);
            Error::InvalidResponse(e.to_string())
        })?;

        if module.info.module_path != module_path || module.info.version != version {
            return Err(Error::InvalidResponse(format!(
                "manifest for {}@{} describes {}@{}",
                module_path, version, module.info.module_path, module.info.version
            )));
        }
        Ok(module)
    }

    async fn list(&self, module_path: &str) -> Result<Vec<String>> {
        let response = self.get(module_path, "@v/list").await?;

        let body = response.text().await.map_err(|e| {
            warn!("Failed to read version list for {}: {}", module_path, e);
            Error::InvalidResponse(e.to_string())
        })?;

        // Versions come one per line
        Ok(body
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| line.to_string())
            .collect())
    }
}

/// Encodes a module path or version for use in proxy URLs.
/// Uppercase letters are escaped as !{lowercase}.
fn encode_path(path: &str) -> String {
    let mut result = String::with_capacity(path.len());
    for c in path.chars() {
        if c.is_ascii_uppercase() {
            result.push('!');
            result.push(c.to_ascii_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    fn client(server: &Server) -> ProxyClient {
        ProxyClient::new(&server.url(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn info_returns_version_and_time() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/golang.org/x/text/@v/v0.3.2.info")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"Version":"v0.3.2","Time":"2019-04-25T21:42:06Z"}"#)
            .create_async()
            .await;

        let result = client(&server)
            .info("golang.org/x/text", "v0.3.2")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result.version, "v0.3.2");
    }

    #[tokio::test]
    async fn info_for_latest_uses_latest_endpoint() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/golang.org/x/text/@latest")
            .with_status(200)
            .with_body(r#"{"Version":"v0.14.0","Time":"2023-10-11T18:00:00Z"}"#)
            .create_async()
            .await;

        let result = client(&server)
            .info("golang.org/x/text", LATEST_VERSION)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result.version, "v0.14.0");
    }

    #[tokio::test]
    async fn info_returns_not_found_for_missing_and_gone_modules() {
        let mut server = Server::new_async().await;

        let missing = server
            .mock("GET", "/nonexistent/module/@v/v1.0.0.info")
            .with_status(404)
            .with_body("not found")
            .create_async()
            .await;
        let gone = server
            .mock("GET", "/deprecated/module/@v/v1.0.0.info")
            .with_status(410)
            .with_body("gone")
            .create_async()
            .await;

        let proxy = client(&server);
        let missing_result = proxy.info("nonexistent/module", "v1.0.0").await;
        let gone_result = proxy.info("deprecated/module", "v1.0.0").await;

        missing.assert_async().await;
        gone.assert_async().await;
        assert!(matches!(missing_result, Err(Error::NotFound(_))));
        assert!(matches!(gone_result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn info_reports_unexpected_status_as_internal() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/example.com/m/@v/v1.0.0.info")
            .with_status(502)
            .create_async()
            .await;

        let result = client(&server).info("example.com/m", "v1.0.0").await;

        mock.assert_async().await;
        let err = result.unwrap_err();
        assert!(matches!(err, Error::InvalidResponse(_)));
        assert_eq!(err.kind(), crate::error::ErrorKind::Internal);
    }

    #[tokio::test]
    async fn module_parses_manifest() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/github.com/a/b/@v/v1.2.0.manifest")
            .with_status(200)
            .with_body(
                r#"{
                    "modulePath": "github.com/a/b",
                    "version": "v1.2.0",
                    "commitTime": "2020-05-01T10:00:00Z",
                    "isRedistributable": true,
                    "units": [{ "path": "github.com/a/b", "name": "b", "synopsis": "Package b." }],
                    "licenses": [{ "types": ["MIT"], "filePath": "LICENSE" }]
                }"#,
            )
            .create_async()
            .await;

        let module = client(&server)
            .module("github.com/a/b", "v1.2.0")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(module.units.len(), 1);
        assert_eq!(module.units[0].synopsis, "Package b.");
        assert_eq!(module.licenses[0].metadata.types, vec!["MIT"]);
    }

    #[tokio::test]
    async fn module_rejects_manifest_for_another_version() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/github.com/a/b/@v/v1.2.0.manifest")
            .with_status(200)
            .with_body(
                r#"{ "modulePath": "github.com/a/b", "version": "v1.1.0", "commitTime": "2020-05-01T10:00:00Z" }"#,
            )
            .create_async()
            .await;

        let result = client(&server).module("github.com/a/b", "v1.2.0").await;

        mock.assert_async().await;
        assert!(matches!(result, Err(Error::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn list_returns_versions_one_per_line() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/github.com/!azure/azure-sdk-for-go/@v/list")
            .with_status(200)
            .with_header("content-type", "text/plain")
            .with_body("v1.0.0\nv1.1.0\n\n")
            .create_async()
            .await;

        let result = client(&server)
            .list("github.com/Azure/azure-sdk-for-go")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result, vec!["v1.0.0", "v1.1.0"]);
    }

    #[test]
    fn encode_path_escapes_uppercase_letters() {
        assert_eq!(encode_path("github.com/Azure"), "github.com/!azure");
        assert_eq!(
            encode_path("github.com/Azure/AzureSDK"),
            "github.com/!azure/!azure!s!d!k"
        );
        assert_eq!(encode_path("golang.org/x/text"), "golang.org/x/text");
    }
}
