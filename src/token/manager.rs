//! OAuth2 access token acquisition, caching and refresh.

use std::time::{Duration, Instant};

use reqwest::header::CACHE_CONTROL;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::config::schema::OAuthConfig;

/// Errors raised while acquiring an access token.
#[derive(Debug, Error)]
pub enum TokenError {
    /// The token endpoint rejected the grant.
    #[error("token endpoint returned HTTP {status}: {body}")]
    Grant {
        status: reqwest::StatusCode,
        body: String,
    },

    /// The grant request itself failed (connection, timeout, bad payload).
    #[error("token request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Cached token state. `access_token` is either absent or valid until
/// `expires_at`; once expired it is never returned again.
#[derive(Debug, Default)]
struct TokenState {
    access_token: Option<String>,
    expires_at: Option<Instant>,
    refresh_token: Option<String>,
}

/// Successful token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
    refresh_token: Option<String>,
}

/// Acquires and caches an OAuth2 bearer token, refreshing on expiry.
///
/// Shared across all request-handling tasks; the internal mutex serializes
/// the check-then-acquire sequence so at most one grant is in flight at a
/// time. Callers that arrive during a grant wait for its result.
pub struct TokenManager {
    oauth: Option<OAuthConfig>,
    http: reqwest::Client,
    state: Mutex<TokenState>,
}

impl TokenManager {
    /// Create a manager. `oauth: None` disables token acquisition entirely
    /// (unauthenticated proxying, a supported mode).
    pub fn new(oauth: Option<OAuthConfig>, grant_timeout: Duration) -> Result<Self, TokenError> {
        let http = reqwest::Client::builder().timeout(grant_timeout).build()?;
        Ok(Self {
            oauth,
            http,
            state: Mutex::new(TokenState::default()),
        })
    }

    /// True when OAuth2 credentials are configured.
    pub fn is_configured(&self) -> bool {
        self.oauth.is_some()
    }

    /// Return a valid access token, acquiring or refreshing one if needed.
    ///
    /// `Ok(None)` means OAuth2 is not configured and the caller must skip
    /// authorization injection. A cached token whose expiry is strictly in
    /// the future is returned without any network call.
    pub async fn get_access_token(&self) -> Result<Option<String>, TokenError> {
        let Some(oauth) = &self.oauth else {
            return Ok(None);
        };

        let mut state = self.state.lock().await;

        if let (Some(token), Some(expires_at)) = (&state.access_token, state.expires_at) {
            if expires_at > Instant::now() {
                return Ok(Some(token.clone()));
            }
        }

        let cached_refresh = state.refresh_token.clone();
        let response = match cached_refresh {
            Some(refresh_token) => {
                tracing::debug!("Access token expired, performing refresh-token grant");
                let result = self.refresh_grant(oauth, &refresh_token).await;
                if let Err(TokenError::Grant { status, .. }) = &result {
                    if status.is_client_error() {
                        // The refresh token was rejected outright; fall back
                        // to client credentials on the next attempt.
                        tracing::warn!(status = %status, "Refresh token rejected, discarding it");
                        state.refresh_token = None;
                    }
                }
                result?
            }
            None => {
                tracing::debug!("No cached token, performing client-credentials grant");
                self.client_credentials_grant(oauth).await?
            }
        };

        let expires_at = Instant::now() + Duration::from_secs(response.expires_in);
        state.access_token = Some(response.access_token.clone());
        state.expires_at = Some(expires_at);
        // Absence of a refresh token in the response clears any cached one.
        state.refresh_token = response.refresh_token;

        tracing::debug!(expires_in = response.expires_in, "Acquired access token");
        Ok(Some(response.access_token))
    }

    async fn refresh_grant(
        &self,
        oauth: &OAuthConfig,
        refresh_token: &str,
    ) -> Result<TokenResponse, TokenError> {
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", oauth.client_id.as_str()),
            ("client_secret", oauth.client_secret.as_str()),
        ];

        let response = self
            .http
            .post(&oauth.endpoint_url)
            .header(CACHE_CONTROL, "no-cache")
            .form(&params)
            .send()
            .await?;

        Self::read_token_response(response).await
    }

    async fn client_credentials_grant(
        &self,
        oauth: &OAuthConfig,
    ) -> Result<TokenResponse, TokenError> {
        let mut params = vec![("grant_type", "client_credentials")];
        if let Some(scope) = &oauth.scope {
            params.push(("scope", scope.as_str()));
        }

        let response = self
            .http
            .post(&oauth.endpoint_url)
            .basic_auth(&oauth.client_id, Some(&oauth.client_secret))
            .header(CACHE_CONTROL, "no-cache")
            .form(&params)
            .send()
            .await?;

        Self::read_token_response(response).await
    }

    async fn read_token_response(response: reqwest::Response) -> Result<TokenResponse, TokenError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TokenError::Grant { status, body });
        }
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde_json::json;
    use std::sync::Arc;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn oauth(server: &MockServer, scope: Option<&str>) -> OAuthConfig {
        OAuthConfig {
            endpoint_url: format!("{}/token", server.uri()),
            client_id: "svc".to_string(),
            client_secret: "hunter2".to_string(),
            scope: scope.map(str::to_string),
        }
    }

    fn manager(config: OAuthConfig) -> TokenManager {
        TokenManager::new(Some(config), Duration::from_secs(5)).unwrap()
    }

    fn token_body(token: &str, expires_in: u64, refresh: Option<&str>) -> serde_json::Value {
        let mut body = json!({"access_token": token, "expires_in": expires_in});
        if let Some(refresh) = refresh {
            body["refresh_token"] = json!(refresh);
        }
        body
    }

    #[tokio::test]
    async fn unconfigured_manager_returns_no_token() {
        let manager = TokenManager::new(None, Duration::from_secs(5)).unwrap();
        assert_eq!(manager.get_access_token().await.unwrap(), None);
        assert!(!manager.is_configured());
    }

    #[tokio::test]
    async fn client_credentials_grant_uses_basic_auth_and_form_body() {
        let server = MockServer::start().await;
        let expected = format!("Basic {}", STANDARD.encode("svc:hunter2"));
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(header("authorization", expected.as_str()))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains("scope=read"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(token_body("tok-1", 3600, None)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let manager = manager(oauth(&server, Some("read")));
        let token = manager.get_access_token().await.unwrap();
        assert_eq!(token.as_deref(), Some("tok-1"));
    }

    #[tokio::test]
    async fn valid_token_is_cached_without_further_grants() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(token_body("tok-1", 3600, None)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let manager = manager(oauth(&server, None));
        let first = manager.get_access_token().await.unwrap();
        let second = manager.get_access_token().await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn expired_token_triggers_exactly_one_new_grant() {
        let server = MockServer::start().await;
        // expires_in of zero means the token is already stale on the next
        // call, forcing a second grant.
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("tok", 0, None)))
            .expect(2)
            .mount(&server)
            .await;

        let manager = manager(oauth(&server, None));
        manager.get_access_token().await.unwrap();
        manager.get_access_token().await.unwrap();
    }

    #[tokio::test]
    async fn refresh_token_is_used_when_cached() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(token_body("tok-1", 0, Some("refresh-1"))),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=refresh-1"))
            .and(body_string_contains("client_id=svc"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(token_body("tok-2", 3600, None)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let manager = manager(oauth(&server, None));
        assert_eq!(
            manager.get_access_token().await.unwrap().as_deref(),
            Some("tok-1")
        );
        assert_eq!(
            manager.get_access_token().await.unwrap().as_deref(),
            Some("tok-2")
        );
    }

    #[tokio::test]
    async fn grant_failure_propagates_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
            .mount(&server)
            .await;

        let manager = manager(oauth(&server, None));
        let err = manager.get_access_token().await.unwrap_err();
        match err {
            TokenError::Grant { status, body } => {
                assert_eq!(status.as_u16(), 500);
                assert_eq!(body, "upstream exploded");
            }
            other => panic!("expected grant error, got {other}"),
        }
    }

    #[tokio::test]
    async fn rejected_refresh_token_is_discarded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(token_body("tok-1", 0, Some("refresh-1"))),
            )
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
            .expect(1)
            .mount(&server)
            .await;

        let manager = manager(oauth(&server, None));
        manager.get_access_token().await.unwrap();

        // The refresh grant is rejected with a 4xx and the refresh token
        // dropped, so the next call falls back to client credentials.
        assert!(manager.get_access_token().await.is_err());
        assert_eq!(
            manager.get_access_token().await.unwrap().as_deref(),
            Some("tok-1")
        );
    }

    #[tokio::test]
    async fn concurrent_callers_share_a_single_grant() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(token_body("tok-1", 3600, None))
                    .set_delay(Duration::from_millis(100)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let manager = Arc::new(manager(oauth(&server, None)));
        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let manager = manager.clone();
                tokio::spawn(async move { manager.get_access_token().await.unwrap() })
            })
            .collect();

        for task in tasks {
            assert_eq!(task.await.unwrap().as_deref(), Some("tok-1"));
        }
    }
}
