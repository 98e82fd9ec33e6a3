//! Outbound header mutation.
//!
//! Runs once per inbound request, before the forwarding handler: appends the
//! configured fixed headers and, when OAuth2 is configured, an
//! `Authorization: Bearer` header with the current access token.
//!
//! # Design Decisions
//! - Headers are appended, never replaced: a fixed header and an inbound
//!   header with the same name coexist, consistent with the additive,
//!   non-canonicalizing design
//! - A failed token acquisition downgrades the request to unauthenticated
//!   instead of failing it; the origin decides what an unauthorized call
//!   gets

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;

use crate::http::server::AppState;

/// Append fixed headers and the bearer token to the inbound request before
/// it reaches the forwarding handler.
pub async fn inject_headers(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    for fixed in &state.config.fixed_headers {
        tracing::debug!(header = %fixed.name, "Adding fixed header");
        request
            .headers_mut()
            .append(fixed.name.clone(), fixed.value.clone());
    }

    match state.tokens.get_access_token().await {
        Ok(Some(token)) => match HeaderValue::from_str(&format!("Bearer {token}")) {
            Ok(value) => {
                request.headers_mut().append(AUTHORIZATION, value);
            }
            Err(_) => {
                tracing::warn!("Access token is not a valid header value, skipping authorization");
            }
        },
        Ok(None) => {}
        Err(error) => {
            // Explicit choice: a token failure must not fail the proxied
            // request; it is forwarded unauthenticated.
            tracing::warn!(error = %error, "Token acquisition failed, forwarding without authorization");
        }
    }

    next.run(request).await
}
