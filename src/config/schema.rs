//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! Values originate from environment variables (see `loader`); everything
//! here is validated once at startup and immutable afterwards.

use axum::http::{HeaderName, HeaderValue};

use crate::schema::filter::AllowListEntry;

/// Root configuration for the proxy.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Listener configuration (bind host and port).
    pub listener: ListenerConfig,

    /// URL of the OpenAPI schema document describing the origin API.
    pub schema_url: String,

    /// Base URL prefixed to every forwarded path.
    ///
    /// Stored verbatim; the forwarder concatenates it with the substituted
    /// path without normalizing slashes.
    pub origin_base_url: String,

    /// Headers appended to every forwarded request.
    pub fixed_headers: Vec<FixedHeader>,

    /// Allow list restricting which schema operations are exposed.
    /// `None` means every operation in the schema is proxied.
    pub allow_list: Option<Vec<AllowListEntry>>,

    /// OAuth2 grant parameters. `None` means unauthenticated proxying.
    pub oauth: Option<OAuthConfig>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request size limits.
    pub limits: LimitConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// Bind host (e.g. "0.0.0.0").
    pub host: String,

    /// Bind port.
    pub port: u16,
}

impl ListenerConfig {
    /// The address to bind the inbound listener to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// A fixed header appended to every forwarded request.
///
/// The name is lower-cased at parse time (`HeaderName` guarantees this);
/// the value is kept literal.
#[derive(Debug, Clone)]
pub struct FixedHeader {
    pub name: HeaderName,
    pub value: HeaderValue,
}

/// OAuth2 client-credentials / refresh-token grant parameters.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    /// Token endpoint URL.
    pub endpoint_url: String,

    /// OAuth2 client id.
    pub client_id: String,

    /// OAuth2 client secret.
    pub client_secret: String,

    /// Optional scope sent with the client-credentials grant.
    pub scope: Option<String>,
}

/// Timeout configuration for the proxy's network calls.
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Schema fetch timeout in seconds (startup only).
    pub schema_fetch_secs: u64,

    /// Token grant/refresh timeout in seconds.
    pub token_grant_secs: u64,

    /// Outbound forwarded request timeout in seconds.
    pub upstream_secs: u64,

    /// Total inbound request timeout in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            schema_fetch_secs: 10,
            token_grant_secs: 10,
            upstream_secs: 30,
            request_secs: 60,
        }
    }
}

/// Request size limits.
#[derive(Debug, Clone)]
pub struct LimitConfig {
    /// Maximum inbound request body size in bytes.
    pub max_body_size: usize,
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Default log level when `RUST_LOG` is not set.
    pub log_level: String,

    /// Optional Prometheus exporter bind address.
    pub metrics_address: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_address: None,
        }
    }
}
