//! Mock HTTP servers for the primary mirror and the historical API.

use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::json;
use std::io::Write;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mock primary mirror: serves a gzipped `02packages` index and tarballs
/// under `/authors/id/`.
#[derive(Debug)]
pub struct MockMirror {
    server: MockServer,
}

impl MockMirror {
    /// Start a new mock mirror.
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL of the mirror.
    #[must_use]
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Publish the module index. Entries are `(module, version, pathname)`.
    pub async fn publish_index(&self, entries: &[(&str, &str, &str)]) {
        let mut text = String::from(
            "File:         02packages.details.txt\n\
             Description:  Package names found in directory $CPAN/authors/id/\n\
             Columns:      package name, version, path\n\n",
        );
        for (module, version, pathname) in entries {
            text.push_str(&format!("{module} {version} {pathname}\n"));
        }

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(text.as_bytes()).expect("gzip write");
        let body = encoder.finish().expect("gzip finish");

        Mock::given(method("GET"))
            .and(path("/modules/02packages.details.txt.gz"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
            .mount(&self.server)
            .await;
    }

    /// Serve a tarball at `/authors/id/<pathname>`.
    pub async fn publish_tarball(&self, pathname: &str, bytes: Vec<u8>) {
        Mock::given(method("GET"))
            .and(path(format!("/authors/id/{pathname}")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(bytes)
                    .insert_header("Content-Type", "application/gzip"),
            )
            .mount(&self.server)
            .await;
    }

    /// Serve a tarball at an arbitrary path (for historical download URLs
    /// pointed at this server).
    pub async fn publish_file(&self, url_path: &str, bytes: Vec<u8>) {
        Mock::given(method("GET"))
            .and(path(url_path.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(bytes))
            .mount(&self.server)
            .await;
    }

    /// Number of requests the mirror has received.
    pub async fn received_requests(&self) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .len()
    }
}

/// Mock historical query API: answers `/v1/download_url/<module>`.
#[derive(Debug)]
pub struct MockHistorical {
    server: MockServer,
}

impl MockHistorical {
    /// Start a new mock API.
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL of the API.
    #[must_use]
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Register a release for a module.
    pub async fn publish_release(&self, module: &str, download_url: &str, version: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/v1/download_url/{module}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "download_url": download_url,
                "version": version,
                "status": "backpan"
            })))
            .mount(&self.server)
            .await;
    }

    /// Register a 404 for a module.
    pub async fn publish_missing(&self, module: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/v1/download_url/{module}")))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "code": 404,
                "message": "Not found"
            })))
            .mount(&self.server)
            .await;
    }
}
