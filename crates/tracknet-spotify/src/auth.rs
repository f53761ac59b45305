//! Access token management for the Spotify Web API
//!
//! Spotify access tokens expire after an hour. Instead of tracking expiry,
//! tracknet reacts to `401 Unauthorized`: the caller asks the
//! [`TokenManager`] to exchange the refresh token for a new access token
//! (OAuth2 refresh-token grant, client authenticated with HTTP Basic) and
//! retries once.
//!
//! The manager is the only place where the access token changes. It is
//! shared by the fetcher and the mutator through an `Arc`.

use oauth2::basic::{BasicClient, BasicRequestTokenError};
use oauth2::{
    ClientId, ClientSecret, EndpointNotSet, EndpointSet, HttpClientError, RefreshToken,
    RequestTokenError, TokenResponse, TokenUrl,
};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use tracknet_core::domain::{AuthError, CredentialBundle};

type RefreshClient =
    BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Owns the credential bundle of a run and refreshes its access token
pub struct TokenManager {
    oauth: RefreshClient,
    http: reqwest::Client,
    redirect_uri: String,
    credentials: RwLock<CredentialBundle>,
}

impl TokenManager {
    /// Creates a manager for `credentials`
    ///
    /// # Arguments
    /// * `credentials` - Bundle resolved from the credential store
    /// * `token_url` - Provider token endpoint
    /// * `redirect_uri` - Redirect URI registered for the application
    /// * `http` - Client used for the token request
    pub fn new(
        credentials: CredentialBundle,
        token_url: TokenUrl,
        redirect_uri: impl Into<String>,
        http: reqwest::Client,
    ) -> Self {
        let oauth = BasicClient::new(ClientId::new(credentials.client_id.clone()))
            .set_client_secret(ClientSecret::new(credentials.client_secret.clone()))
            .set_token_uri(token_url);

        Self {
            oauth,
            http,
            redirect_uri: redirect_uri.into(),
            credentials: RwLock::new(credentials),
        }
    }

    /// Current access token, for an `Authorization: Bearer` header
    pub async fn bearer(&self) -> String {
        self.credentials.read().await.access_token.clone()
    }

    /// Copy of the held bundle, including any rotated tokens
    pub async fn credentials(&self) -> CredentialBundle {
        self.credentials.read().await.clone()
    }

    /// Exchanges the refresh token for a new access token
    ///
    /// On success the held access token is replaced, and so is the refresh
    /// token when the provider rotates it.
    ///
    /// # Errors
    /// - [`AuthError::Transport`] if the token endpoint cannot be reached
    /// - [`AuthError::RefreshRejected`] for any non-2xx or unparseable answer
    pub async fn refresh(&self) -> Result<(), AuthError> {
        info!("Refreshing access token");

        let refresh_token = RefreshToken::new(self.credentials.read().await.refresh_token.clone());
        let response = self
            .oauth
            .exchange_refresh_token(&refresh_token)
            .add_extra_param("redirect_uri", self.redirect_uri.clone())
            .request_async(&self.http)
            .await
            .map_err(|e| {
                let err = classify_refresh_error(e);
                warn!(error = %err, "Token refresh failed");
                err
            })?;

        let mut credentials = self.credentials.write().await;
        credentials.access_token = response.access_token().secret().clone();
        if let Some(rotated) = response.refresh_token() {
            debug!("Provider rotated the refresh token");
            credentials.refresh_token = rotated.secret().clone();
        }

        info!("Successfully refreshed access token");
        Ok(())
    }
}

fn classify_refresh_error(e: BasicRequestTokenError<HttpClientError<reqwest::Error>>) -> AuthError {
    match e {
        RequestTokenError::Request(inner) => AuthError::Transport(inner.to_string()),
        RequestTokenError::ServerResponse(resp) => AuthError::RefreshRejected(resp.to_string()),
        RequestTokenError::Parse(err, _body) => {
            AuthError::RefreshRejected(format!("unparseable token response: {err}"))
        }
        RequestTokenError::Other(msg) => AuthError::RefreshRejected(msg),
    }
}
