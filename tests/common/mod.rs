//! Shared utilities for integration testing.

use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderName;
use serde_json::Value;
use tokio::net::TcpListener;
use wiremock::{Match, Request};

use openapi_proxy::config::schema::{
    LimitConfig, ListenerConfig, ObservabilityConfig, ProxyConfig, TimeoutConfig,
};
use openapi_proxy::http::HttpServer;
use openapi_proxy::lifecycle::Shutdown;
use openapi_proxy::routing::RouteTable;
use openapi_proxy::schema::{filter_endpoints, SchemaDocument};
use openapi_proxy::token::TokenManager;

/// A proxy instance bound to an ephemeral port for the duration of a test.
///
/// Dropping it closes the broadcast channel, which shuts the server down.
pub struct TestProxy {
    pub base_url: String,
    _shutdown: Shutdown,
}

impl TestProxy {
    pub fn url(&self, path_and_query: &str) -> String {
        format!("{}{}", self.base_url, path_and_query)
    }
}

/// A minimal config pointing at `origin`; tests adjust fields as needed.
pub fn base_config(origin: &str) -> ProxyConfig {
    ProxyConfig {
        listener: ListenerConfig::default(),
        schema_url: format!("{origin}/openapi.yaml"),
        origin_base_url: origin.to_string(),
        fixed_headers: Vec::new(),
        allow_list: None,
        oauth: None,
        timeouts: TimeoutConfig {
            schema_fetch_secs: 5,
            token_grant_secs: 5,
            upstream_secs: 5,
            request_secs: 10,
        },
        limits: LimitConfig::default(),
        observability: ObservabilityConfig::default(),
    }
}

/// Build the full pipeline (filter → route table → server) from a schema
/// document given as JSON, and serve it on an ephemeral port.
pub async fn start_proxy(config: ProxyConfig, schema: Value) -> TestProxy {
    let document: SchemaDocument = serde_json::from_value(schema).unwrap();
    let document = match &config.allow_list {
        Some(allow_list) => filter_endpoints(&document, allow_list).unwrap(),
        None => document,
    };

    let table = RouteTable::from_schema(&document, &config.origin_base_url).unwrap();
    let tokens = Arc::new(
        TokenManager::new(
            config.oauth.clone(),
            Duration::from_secs(config.timeouts.token_grant_secs),
        )
        .unwrap(),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(Arc::new(config), table, tokens);
    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, receiver).await;
    });

    TestProxy {
        base_url: format!("http://{addr}"),
        _shutdown: shutdown,
    }
}

/// Matches when the raw query string equals the expected value exactly
/// (ordering and duplicate keys included).
#[allow(dead_code)]
pub struct QueryIs(pub &'static str);

impl Match for QueryIs {
    fn matches(&self, request: &Request) -> bool {
        request.url.query() == Some(self.0)
    }
}

/// Matches when the named header carries exactly the expected values, in
/// order.
#[allow(dead_code)]
pub struct HeaderValuesAre {
    pub name: &'static str,
    pub expected: Vec<&'static str>,
}

impl Match for HeaderValuesAre {
    fn matches(&self, request: &Request) -> bool {
        let name = HeaderName::from_static(self.name);
        let values: Vec<&str> = request
            .headers
            .get_all(&name)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect();
        values == self.expected
    }
}

/// Matches when the named header is absent.
#[allow(dead_code)]
pub struct HeaderAbsent(pub &'static str);

impl Match for HeaderAbsent {
    fn matches(&self, request: &Request) -> bool {
        let name = HeaderName::from_static(self.0);
        request.headers.get(&name).is_none()
    }
}

/// Matches when the `Host` header names the mock server itself, proving the
/// inbound `Host` was stripped and recomputed for the outbound call.
#[allow(dead_code)]
pub struct HostIsSelf(pub String);

impl Match for HostIsSelf {
    fn matches(&self, request: &Request) -> bool {
        request
            .headers
            .get(HeaderName::from_static("host"))
            .and_then(|value| value.to_str().ok())
            .map(|value| value == self.0)
            .unwrap_or(false)
    }
}
