//! Resolution through the proxy-backed data source against a mock proxy

use std::time::Duration;

use mockito::Server;

use pkgdoc::config::{LATEST_VERSION, UNKNOWN_MODULE_PATH};
use pkgdoc::datasource::{DataSource, ProxyDataSource};
use pkgdoc::frontend::{fetch_directory_details, resolve_licenses, resolve_path_info};
use pkgdoc::proxy::ProxyClient;

const MANIFEST: &str = r#"{
    "modulePath": "github.com/a/b",
    "version": "v1.3.0",
    "commitTime": "2021-02-03T04:05:06Z",
    "isRedistributable": true,
    "units": [
        { "path": "github.com/a/b", "name": "b", "isRedistributable": true },
        { "path": "github.com/a/b/c", "name": "c", "isRedistributable": true }
    ],
    "licenses": [{ "types": ["MIT"], "filePath": "LICENSE" }]
}"#;

fn source(server: &Server) -> ProxyDataSource<ProxyClient> {
    ProxyDataSource::new(ProxyClient::new(&server.url(), Duration::from_secs(5)).unwrap())
}

#[tokio::test]
async fn resolves_unknown_module_through_proxy() {
    let mut server = Server::new_async().await;
    let missing = server
        .mock("GET", "/github.com/a/b/c/@latest")
        .with_status(404)
        .create_async()
        .await;
    let latest = server
        .mock("GET", "/github.com/a/b/@latest")
        .with_status(200)
        .with_body(r#"{"Version":"v1.3.0","Time":"2021-02-03T04:05:06Z"}"#)
        .create_async()
        .await;
    let manifest = server
        .mock("GET", "/github.com/a/b/@v/v1.3.0.manifest")
        .with_status(200)
        .with_body(MANIFEST)
        .expect(1)
        .create_async()
        .await;
    let ds = source(&server);

    let info = resolve_path_info(&ds, "github.com/a/b/c", UNKNOWN_MODULE_PATH, LATEST_VERSION)
        .await
        .unwrap();
    let licenses = resolve_licenses(&ds, "github.com/a/b/c", "github.com/a/b", "v1.3.0")
        .await
        .unwrap();

    missing.assert_async().await;
    latest.assert_async().await;
    manifest.assert_async().await;
    assert_eq!(info.module_path, "github.com/a/b");
    assert_eq!(info.version, "v1.3.0");
    assert_eq!(info.name, "c");
    assert_eq!(licenses[0].metadata.file_path, "LICENSE");
}

#[tokio::test]
async fn directory_listing_is_unavailable_through_proxy() {
    let mut server = Server::new_async().await;
    let _manifest = server
        .mock("GET", "/github.com/a/b/@v/v1.3.0.manifest")
        .with_status(200)
        .with_body(MANIFEST)
        .create_async()
        .await;
    let ds = source(&server);
    let mi = ds.get_module_info("github.com/a/b", "v1.3.0").await.unwrap();

    let err = fetch_directory_details(&ds, "github.com/a/b", &mi, &[], true, false)
        .await
        .unwrap_err();

    assert!(err.is_unsupported());
}

#[tokio::test]
async fn reports_missing_module_as_not_found() {
    let mut server = Server::new_async().await;
    let _gone = server
        .mock("GET", "/github.com/x/y/@v/v1.0.0.manifest")
        .with_status(410)
        .create_async()
        .await;
    let ds = source(&server);

    let err = resolve_path_info(&ds, "github.com/x/y", "github.com/x/y", "v1.0.0")
        .await
        .unwrap_err();

    assert!(err.is_not_found());
}
