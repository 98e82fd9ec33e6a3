//! Configuration loading from the environment.
//!
//! All settings arrive as environment variables (optionally overridable as
//! command-line flags for local runs). Parsing and validation happen once at
//! startup; a malformed value aborts the process before it starts serving.

use axum::http::{HeaderName, HeaderValue};
use clap::Parser;
use thiserror::Error;
use url::Url;

use crate::config::schema::{
    FixedHeader, LimitConfig, ListenerConfig, OAuthConfig, ObservabilityConfig, ProxyConfig,
    TimeoutConfig,
};
use crate::schema::filter::AllowListEntry;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required URL did not parse.
    #[error("invalid URL in {variable}: {source}")]
    InvalidUrl {
        variable: &'static str,
        #[source]
        source: url::ParseError,
    },

    /// A `FIXED_REQUEST_HEADERS` entry was not of the form `Name:Value`.
    #[error("malformed fixed header entry '{0}' (expected Name:Value)")]
    MalformedHeader(String),

    /// A fixed header entry had an invalid name or value.
    #[error("invalid fixed header '{0}'")]
    InvalidHeader(String),

    /// An `ENDPOINT_ALLOW_LIST` entry was not of the form `METHOD:/path`.
    #[error("malformed allow-list entry '{0}' (expected METHOD:/path)")]
    MalformedAllowEntry(String),
}

/// Command-line / environment interface of the proxy binary.
#[derive(Debug, Parser)]
#[command(name = "openapi-proxy")]
#[command(about = "Schema-driven reverse proxy for REST APIs", long_about = None)]
pub struct Cli {
    /// URL of the OpenAPI schema document describing the origin API.
    #[arg(long, env = "OPENAPI_SCHEMA_URL")]
    pub openapi_schema_url: String,

    /// Base URL prefixed to every forwarded path.
    #[arg(long, env = "ORIGIN_BASE_URL")]
    pub origin_base_url: String,

    /// `|`-delimited `Name:Value` pairs added to every forwarded request.
    #[arg(long, env = "FIXED_REQUEST_HEADERS", default_value = "")]
    pub fixed_request_headers: String,

    /// `|`-delimited `METHOD:/path` entries restricting exposed routes.
    #[arg(long, env = "ENDPOINT_ALLOW_LIST", default_value = "")]
    pub endpoint_allow_list: String,

    /// OAuth2 token endpoint URL.
    #[arg(long, env = "AUTH_ENDPOINT_URL")]
    pub auth_endpoint_url: Option<String>,

    /// OAuth2 client id.
    #[arg(long, env = "CLIENT_ID")]
    pub client_id: Option<String>,

    /// OAuth2 client secret.
    #[arg(long, env = "CLIENT_SECRET")]
    pub client_secret: Option<String>,

    /// Optional scope for the client-credentials grant.
    #[arg(long, env = "AUTH_SCOPE")]
    pub auth_scope: Option<String>,

    /// Bind host for the inbound listener.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Bind port for the inbound listener.
    #[arg(long, env = "PORT", default_value_t = 8000)]
    pub port: u16,

    /// Default log level when RUST_LOG is not set.
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Optional Prometheus exporter bind address (e.g. "0.0.0.0:9090").
    #[arg(long, env = "METRICS_ADDRESS")]
    pub metrics_address: Option<String>,
}

impl Cli {
    /// Validate the raw environment values and build the immutable config.
    pub fn into_config(self) -> Result<ProxyConfig, ConfigError> {
        Url::parse(&self.openapi_schema_url).map_err(|source| ConfigError::InvalidUrl {
            variable: "OPENAPI_SCHEMA_URL",
            source,
        })?;
        Url::parse(&self.origin_base_url).map_err(|source| ConfigError::InvalidUrl {
            variable: "ORIGIN_BASE_URL",
            source,
        })?;

        let fixed_headers = parse_fixed_headers(&self.fixed_request_headers)?;
        let allow_list = parse_allow_list(&self.endpoint_allow_list)?;
        let oauth = self.oauth_config()?;

        Ok(ProxyConfig {
            listener: ListenerConfig {
                host: self.host,
                port: self.port,
            },
            schema_url: self.openapi_schema_url,
            origin_base_url: self.origin_base_url,
            fixed_headers,
            allow_list,
            oauth,
            timeouts: TimeoutConfig::default(),
            limits: LimitConfig::default(),
            observability: ObservabilityConfig {
                log_level: self.log_level,
                metrics_address: self.metrics_address,
            },
        })
    }

    /// OAuth2 is enabled only when endpoint, client id and secret are all
    /// present. A partial set is treated as unconfigured (unauthenticated
    /// proxying), with a warning so the misconfiguration is visible.
    fn oauth_config(&self) -> Result<Option<OAuthConfig>, ConfigError> {
        match (&self.auth_endpoint_url, &self.client_id, &self.client_secret) {
            (Some(endpoint), Some(id), Some(secret)) => {
                Url::parse(endpoint).map_err(|source| ConfigError::InvalidUrl {
                    variable: "AUTH_ENDPOINT_URL",
                    source,
                })?;
                Ok(Some(OAuthConfig {
                    endpoint_url: endpoint.clone(),
                    client_id: id.clone(),
                    client_secret: secret.clone(),
                    scope: self.auth_scope.clone(),
                }))
            }
            (None, None, None) => Ok(None),
            _ => {
                tracing::warn!(
                    "Partial OAuth2 configuration ignored: AUTH_ENDPOINT_URL, CLIENT_ID and \
                     CLIENT_SECRET must all be set to enable token acquisition"
                );
                Ok(None)
            }
        }
    }
}

/// Parse `Name:Value|Name:Value` into fixed header pairs.
///
/// An empty string yields an empty set. Header names end up lower-cased
/// (`HeaderName` normalizes); values are literal.
fn parse_fixed_headers(raw: &str) -> Result<Vec<FixedHeader>, ConfigError> {
    if raw.is_empty() {
        return Ok(Vec::new());
    }

    let mut headers = Vec::new();
    for entry in raw.split('|') {
        let (name, value) = entry
            .split_once(':')
            .ok_or_else(|| ConfigError::MalformedHeader(entry.to_string()))?;
        let name: HeaderName = name
            .parse()
            .map_err(|_| ConfigError::InvalidHeader(entry.to_string()))?;
        let value: HeaderValue = value
            .parse()
            .map_err(|_| ConfigError::InvalidHeader(entry.to_string()))?;
        headers.push(FixedHeader { name, value });
    }
    Ok(headers)
}

/// Parse `METHOD:/path|METHOD:/path` into allow-list entries.
///
/// An empty string means no allow list (expose everything).
fn parse_allow_list(raw: &str) -> Result<Option<Vec<AllowListEntry>>, ConfigError> {
    if raw.is_empty() {
        return Ok(None);
    }

    let mut entries = Vec::new();
    for entry in raw.split('|') {
        let parsed = AllowListEntry::parse(entry)
            .ok_or_else(|| ConfigError::MalformedAllowEntry(entry.to_string()))?;
        entries.push(parsed);
    }
    Ok(Some(entries))
}
