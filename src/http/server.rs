//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with one route per proxy route
//! - Wire up middleware (tracing, timeout, body limit, request id,
//!   header injection)
//! - Serve the status endpoint at `GET /`
//! - Dispatch matched requests to the forwarding pipeline
//! - Run until the shutdown signal fires

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::{RawPathParams, Request};
use axum::http::Method;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, on};
use axum::{Json, Router};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ProxyConfig;
use crate::http::forward::{self, HttpClient};
use crate::http::middleware;
use crate::http::request::MakeRequestUuid;
use crate::observability::metrics;
use crate::routing::registry::{ProxyRoute, RouteTable};
use crate::token::TokenManager;

/// Application state shared by the middleware and every forwarding handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ProxyConfig>,
    pub tokens: Arc<TokenManager>,
    pub client: HttpClient,
}

/// HTTP server for the proxy.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Build the server from the route table.
    pub fn new(config: Arc<ProxyConfig>, table: RouteTable, tokens: Arc<TokenManager>) -> Self {
        let client: HttpClient = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        let state = AppState {
            config,
            tokens,
            client,
        };

        let router = Self::build_router(table, state);
        Self { router }
    }

    /// Build the Axum router: the status route, one route per proxy route,
    /// and the middleware stack.
    fn build_router(table: RouteTable, state: AppState) -> Router {
        let status_config = state.config.clone();
        let mut router = Router::new().route(
            "/",
            get(move || {
                let config = status_config.clone();
                async move {
                    Json(json!({
                        "origin": config.origin_base_url,
                        "schema": config.schema_url,
                    }))
                }
            }),
        );

        for route in table.routes() {
            // `GET /` belongs to the status endpoint.
            if route.template.raw() == "/" && route.method == Method::GET {
                tracing::warn!("Schema declares GET /, which is reserved for the status endpoint");
                continue;
            }

            let handler = {
                let state = state.clone();
                let route = route.clone();
                move |params: RawPathParams, request: Request| {
                    let state = state.clone();
                    let route = route.clone();
                    async move { proxy_handler(state, route, params, request).await }
                }
            };
            router = router.route(route.template.raw(), on(route.filter, handler));
        }

        let request_timeout = Duration::from_secs(state.config.timeouts.request_secs);
        let max_body_size = state.config.limits.max_body_size;

        // Innermost to outermost: header injection, body limit, timeout,
        // then request id + trace around everything.
        router
            .layer(axum::middleware::from_fn_with_state(
                state,
                middleware::inject_headers,
            ))
            .layer(RequestBodyLimitLayer::new(max_body_size))
            .layer(TimeoutLayer::new(request_timeout))
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Forwarding handler bound to one proxy route.
async fn proxy_handler(
    state: AppState,
    route: Arc<ProxyRoute>,
    params: RawPathParams,
    request: Request<Body>,
) -> Response {
    let start = Instant::now();
    let method = route.method.as_str().to_string();

    tracing::debug!(
        method = %route.method,
        path = route.template.raw(),
        "Proxying request"
    );

    let captured: Vec<(String, String)> = params
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();

    let timeout = Duration::from_secs(state.config.timeouts.upstream_secs);
    let max_body_size = state.config.limits.max_body_size;

    match forward::forward(
        &state.client,
        &route,
        &captured,
        request,
        timeout,
        max_body_size,
    )
    .await
    {
        Ok(response) => {
            metrics::record_request(&method, response.status().as_u16(), start);
            response.into_response()
        }
        Err(error) => {
            tracing::error!(
                error = %error,
                method = %route.method,
                path = route.template.raw(),
                "Forwarding failed"
            );
            let response = error.into_response();
            metrics::record_request(&method, response.status().as_u16(), start);
            response
        }
    }
}
