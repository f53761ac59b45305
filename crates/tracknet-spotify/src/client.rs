//! Spotify Web API client
//!
//! Provides a typed HTTP client for interacting with the Spotify Web API.
//! Handles bearer headers, 429 back-off, the single refresh-and-retry on
//! `401`, and JSON deserialization.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use oauth2::TokenUrl;
//! use tracknet_core::domain::CredentialBundle;
//! use tracknet_spotify::auth::TokenManager;
//! use tracknet_spotify::client::SpotifyClient;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let http = reqwest::Client::new();
//! let tokens = Arc::new(TokenManager::new(
//!     CredentialBundle::new("id", "secret", "access", "refresh"),
//!     TokenUrl::new("https://accounts.spotify.com/api/token".to_string())?,
//!     "http://localhost:8888/callback",
//!     http.clone(),
//! ));
//! let client = SpotifyClient::new(http, tokens);
//! let page: serde_json::Value = client
//!     .get_json("/playlists/3ubgXaHeBn1CWLUZPXvqkj/tracks", &[("limit", "100".into())])
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::auth::TokenManager;
use crate::rate_limit::RetryPolicy;
use crate::SpotifyError;

/// Base URL for the Spotify Web API
pub const SPOTIFY_BASE_URL: &str = "https://api.spotify.com/v1";

/// HTTP client for Spotify Web API calls
///
/// Wraps `reqwest::Client` with bearer authentication taken from a shared
/// [`TokenManager`] and base URL construction.
pub struct SpotifyClient {
    /// The underlying HTTP client
    client: Client,
    /// Base URL for API requests
    base_url: String,
    /// Source of the bearer token
    tokens: Arc<TokenManager>,
    retry: RetryPolicy,
}

impl SpotifyClient {
    /// Creates a new SpotifyClient against the public API
    pub fn new(client: Client, tokens: Arc<TokenManager>) -> Self {
        Self::with_base_url(client, tokens, SPOTIFY_BASE_URL)
    }

    /// Creates a new SpotifyClient with a custom base URL (useful for testing)
    pub fn with_base_url(
        client: Client,
        tokens: Arc<TokenManager>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
            retry: RetryPolicy::default(),
        }
    }

    /// Sets the 429 retry policy
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Returns the token manager shared with this client
    pub fn tokens(&self) -> &Arc<TokenManager> {
        &self.tokens
    }

    /// Returns the base URL for API requests
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Creates an authenticated request builder for the given method and path
    ///
    /// # Arguments
    /// * `method` - HTTP method
    /// * `path` - API path relative to base URL (e.g., "/artists")
    pub async fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client
            .request(method, &url)
            .bearer_auth(self.tokens.bearer().await)
    }

    /// Sends one request, absorbing 429 responses.
    ///
    /// On HTTP 429 the `Retry-After` header is honoured and the request is
    /// rebuilt with the current bearer token and resent, at most
    /// `max_retries` times. Any other status, including 401, is returned to
    /// the caller untouched.
    ///
    /// # Arguments
    /// * `method` - HTTP method
    /// * `path` - API path relative to base URL
    /// * `query` - Query string pairs
    /// * `body` - Optional JSON body
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&serde_json::Value>,
    ) -> Result<Response, SpotifyError> {
        let max_retries = self.retry.max_retries;

        for attempt in 0..=max_retries {
            let mut request = self.request(method.clone(), path).await.query(query);
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request.send().await?;

            if response.status() != StatusCode::TOO_MANY_REQUESTS {
                if attempt > 0 {
                    info!(path, attempt, "Request succeeded after retry");
                }
                return Ok(response);
            }

            if attempt >= max_retries {
                warn!(path, attempts = attempt + 1, "429 retry limit exhausted");
                break;
            }

            let retry_after = self.retry.retry_after(response.headers());
            info!(
                path,
                attempt,
                retry_after_ms = retry_after.as_millis() as u64,
                "Received 429, backing off"
            );
            tokio::time::sleep(retry_after).await;
        }

        Err(SpotifyError::TooManyRequests {
            attempts: max_retries + 1,
        })
    }

    /// GETs `path` and deserializes the JSON body.
    ///
    /// A `401` triggers one token refresh and one retry with the new token;
    /// a second `401` yields [`SpotifyError::Unauthorized`].
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, SpotifyError> {
        let mut response = self.send(Method::GET, path, query, None).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            debug!(path, "Access token rejected, refreshing");
            self.tokens.refresh().await?;
            response = self.send(Method::GET, path, query, None).await?;
            if response.status() == StatusCode::UNAUTHORIZED {
                let body = response.text().await.unwrap_or_default();
                warn!(path, "Still unauthorized after token refresh");
                return Err(SpotifyError::Unauthorized(format!(
                    "GET {path} rejected after token refresh: {body}"
                )));
            }
        }

        let response = ensure_success(response).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| SpotifyError::InvalidResponse(format!("GET {path}: {e}")))
    }
}

/// Turns a non-2xx response into [`SpotifyError::Status`]
pub(crate) async fn ensure_success(response: Response) -> Result<Response, SpotifyError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(SpotifyError::Status {
        status: status.as_u16(),
        body,
    })
}
