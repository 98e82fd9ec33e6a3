//! Schema document fetching and parsing.

use std::time::Duration;

use thiserror::Error;

use crate::schema::document::SchemaDocument;

/// Errors raised while loading the schema document. All of them are fatal
/// at startup: an unloadable schema means the proxy cannot start.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The schema could not be fetched (connection, DNS, timeout).
    #[error("failed to fetch schema from {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The schema endpoint answered with a non-success status.
    #[error("schema endpoint {url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    /// The response body was not a parseable schema document.
    #[error("failed to parse schema document: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Fetch and parse the schema document from `url`.
///
/// The body is parsed as YAML, which also accepts JSON documents. Exactly
/// one network call is made; there is no retry — the caller decides whether
/// a failure is fatal (for this system it is).
pub async fn load_schema(url: &str, timeout: Duration) -> Result<SchemaDocument, SchemaError> {
    tracing::debug!(url = %url, "Loading OpenAPI schema");

    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|source| SchemaError::Fetch {
            url: url.to_string(),
            source,
        })?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| SchemaError::Fetch {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(SchemaError::Status {
            url: url.to_string(),
            status,
        });
    }

    let body = response.text().await.map_err(|source| SchemaError::Fetch {
        url: url.to_string(),
        source,
    })?;

    let document: SchemaDocument = serde_yaml::from_str(&body)?;

    tracing::info!(
        url = %url,
        paths = document.path_count(),
        operations = document.operation_count(),
        "Loaded OpenAPI schema"
    );

    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn loads_yaml_schema() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/openapi.yaml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "openapi: 3.0.0\npaths:\n  /pets:\n    get: {}\n  /pets/{petId}:\n    get: {}\n",
            ))
            .mount(&server)
            .await;

        let url = format!("{}/openapi.yaml", server.uri());
        let doc = load_schema(&url, Duration::from_secs(5)).await.unwrap();
        assert_eq!(doc.path_count(), 2);
    }

    #[tokio::test]
    async fn loads_json_schema() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/openapi.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"paths": {"/pets": {"get": {}}}}"#),
            )
            .mount(&server)
            .await;

        let url = format!("{}/openapi.json", server.uri());
        let doc = load_schema(&url, Duration::from_secs(5)).await.unwrap();
        assert_eq!(doc.operation_count(), 1);
    }

    #[tokio::test]
    async fn propagates_http_status_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = format!("{}/openapi.yaml", server.uri());
        let err = load_schema(&url, Duration::from_secs(5)).await.unwrap_err();
        match err {
            SchemaError::Status { status, .. } => assert_eq!(status.as_u16(), 404),
            other => panic!("expected status error, got {other}"),
        }
    }

    #[tokio::test]
    async fn rejects_malformed_documents() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("paths: [not, a, map]"))
            .mount(&server)
            .await;

        let url = server.uri();
        let err = load_schema(&url, Duration::from_secs(5)).await.unwrap_err();
        assert!(matches!(err, SchemaError::Parse(_)));
    }

    #[tokio::test]
    async fn connection_failure_is_a_fetch_error() {
        // Nothing listens on this port.
        let err = load_schema("http://127.0.0.1:9/openapi.yaml", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, SchemaError::Fetch { .. }));
    }
}
