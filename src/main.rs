//! Schema-driven reverse proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────┐
//!                     │                 OPENAPI PROXY                     │
//!                     │                                                   │
//!   OpenAPI schema ───┼─▶ schema loader ─▶ allow-list filter ─▶ routing  │
//!   (startup, once)   │                                          │        │
//!                     │                                          ▼        │
//!   Client Request ───┼─▶ http server ─▶ header injection ─▶ forwarder ──┼──▶ Origin
//!                     │                       │                           │     API
//!                     │                       ▼                           │
//!                     │                 token manager                     │
//!                     │           (OAuth2 acquire/cache/refresh)          │
//!                     │                                                   │
//!                     │  cross-cutting: config · observability · lifecycle│
//!                     └──────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use openapi_proxy::config::Cli;
use openapi_proxy::http::HttpServer;
use openapi_proxy::lifecycle::Shutdown;
use openapi_proxy::observability::{logging, metrics};
use openapi_proxy::routing::RouteTable;
use openapi_proxy::schema::{filter_endpoints, load_schema};
use openapi_proxy::token::TokenManager;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init(&cli.log_level);

    let config = Arc::new(cli.into_config()?);

    tracing::info!(
        origin = %config.origin_base_url,
        schema = %config.schema_url,
        "openapi-proxy v0.1.0 starting"
    );

    if let Some(metrics_address) = &config.observability.metrics_address {
        match metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // The schema is loaded exactly once; a proxy without a schema has no
    // routes to serve, so a failure here is fatal.
    let schema_timeout = Duration::from_secs(config.timeouts.schema_fetch_secs);
    let schema = load_schema(&config.schema_url, schema_timeout).await?;

    let schema = match &config.allow_list {
        Some(allow_list) => {
            tracing::info!(entries = allow_list.len(), "Filtering API to allow list");
            filter_endpoints(&schema, allow_list)?
        }
        None => {
            tracing::info!("No allow list provided. Proxying all endpoints.");
            schema
        }
    };

    let table = RouteTable::from_schema(&schema, &config.origin_base_url)?;
    tracing::info!(routes = table.len(), "Route table built");

    let tokens = Arc::new(TokenManager::new(
        config.oauth.clone(),
        Duration::from_secs(config.timeouts.token_grant_secs),
    )?);
    if tokens.is_configured() {
        tracing::info!("OAuth2 token acquisition enabled");
    } else {
        tracing::info!("OAuth2 not configured, proxying unauthenticated");
    }

    let listener = TcpListener::bind(config.listener.bind_address()).await?;

    let shutdown = Shutdown::new();
    shutdown.listen_for_signals();

    let server = HttpServer::new(config, table, tokens);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
