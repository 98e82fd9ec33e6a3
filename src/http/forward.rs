//! Request forwarding to the origin.
//!
//! # Responsibilities
//! - Substitute captured path parameters into the route's template
//! - Relay the query string verbatim
//! - Strip hop-specific headers (`Host`, `Content-Length`) before forwarding;
//!   the outbound client recomputes both
//! - Execute the upstream call with a bounded timeout
//! - Relay the origin's status, headers and body unchanged
//!
//! # Design Decisions
//! - The origin's errors are the proxy's responses: a 404 or 500 from the
//!   origin is relayed, never reinterpreted
//! - Only a total connection failure or timeout produces a proxy-generated
//!   response (502)
//! - Request bodies are buffered to completion before forwarding; responses
//!   stream back

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode, Uri};
use axum::response::IntoResponse;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use thiserror::Error;

use crate::routing::registry::ProxyRoute;
use crate::routing::template::RouteError;

/// Outbound HTTP client shared by all forwarding handlers.
pub type HttpClient = Client<HttpConnector, Body>;

/// Errors raised while forwarding a request to the origin.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// The origin could not be reached at all.
    #[error("upstream request failed: {0}")]
    Upstream(#[source] hyper_util::client::legacy::Error),

    /// The origin did not answer within the configured bound.
    #[error("upstream request timed out after {0:?}")]
    Timeout(Duration),

    /// The substituted target did not form a valid URI.
    #[error("invalid upstream uri '{0}'")]
    InvalidUri(String),

    /// The outbound request could not be constructed.
    #[error("failed to build upstream request: {0}")]
    BuildRequest(#[from] axum::http::Error),

    /// The inbound body could not be read to completion.
    #[error("failed to read request body: {0}")]
    Body(#[source] axum::Error),

    /// A path parameter the template requires was not captured.
    #[error(transparent)]
    Substitution(#[from] RouteError),
}

impl ForwardError {
    /// The response surfaced to the caller when forwarding itself fails.
    pub fn status(&self) -> StatusCode {
        match self {
            ForwardError::Upstream(_) | ForwardError::Timeout(_) | ForwardError::InvalidUri(_) => {
                StatusCode::BAD_GATEWAY
            }
            ForwardError::Body(_) => StatusCode::BAD_REQUEST,
            ForwardError::BuildRequest(_) | ForwardError::Substitution(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ForwardError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let body = match status {
            StatusCode::BAD_GATEWAY => "Upstream request failed",
            StatusCode::BAD_REQUEST => "Failed to read request body",
            _ => "Internal proxy error",
        };
        (status, body).into_response()
    }
}

/// Forward `request` to the origin according to `route` and relay the
/// origin's response.
///
/// Header injection has already happened by the time this runs; this stage
/// only removes `Host` and `Content-Length` so the client recomputes them
/// for the outbound call.
pub async fn forward(
    client: &HttpClient,
    route: &ProxyRoute,
    captured: &[(String, String)],
    request: Request<Body>,
    timeout: Duration,
    max_body_size: usize,
) -> Result<Response<Body>, ForwardError> {
    let path = route.template.substitute(captured)?;

    let (parts, body) = request.into_parts();

    let target_url = match parts.uri.query() {
        Some(query) => format!("{}{}?{}", route.origin_base_url, path, query),
        None => format!("{}{}", route.origin_base_url, path),
    };
    let uri: Uri = target_url
        .parse()
        .map_err(|_| ForwardError::InvalidUri(target_url.clone()))?;

    let body_bytes = axum::body::to_bytes(body, max_body_size)
        .await
        .map_err(ForwardError::Body)?;

    let mut builder = Request::builder().method(route.method.clone()).uri(uri);
    if let Some(headers) = builder.headers_mut() {
        for (name, value) in parts.headers.iter() {
            if *name == header::HOST || *name == header::CONTENT_LENGTH {
                continue;
            }
            headers.append(name.clone(), value.clone());
        }
    }
    let outbound = builder.body(Body::from(body_bytes))?;

    tracing::debug!(url = %target_url, method = %route.method, "Forwarding to origin");

    let response: Response<hyper::body::Incoming> =
        tokio::time::timeout(timeout, client.request(outbound))
            .await
            .map_err(|_| ForwardError::Timeout(timeout))?
            .map_err(ForwardError::Upstream)?;

    // Relay verbatim: status and headers unchanged, body streamed through.
    let (parts, body) = response.into_parts();
    Ok(Response::from_parts(parts, Body::new(body)))
}
