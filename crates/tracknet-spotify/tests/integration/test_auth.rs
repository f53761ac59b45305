//! Integration tests for the access token refresh
//!
//! Verifies the refresh-token grant against a mock token endpoint:
//! - HTTP Basic client authentication and form body
//! - Replacement of the access token, and of a rotated refresh token
//! - Rejected and unparseable answers

use std::sync::Arc;

use oauth2::TokenUrl;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tracknet_core::domain::AuthError;
use tracknet_spotify::auth::TokenManager;

use crate::common;

fn manager(server: &MockServer) -> Arc<TokenManager> {
    Arc::new(TokenManager::new(
        common::bundle(),
        TokenUrl::new(format!("{}/api/token", server.uri())).unwrap(),
        "http://localhost:8888/callback",
        reqwest::Client::new(),
    ))
}

#[tokio::test]
async fn test_refresh_posts_basic_auth_and_refresh_grant() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(header("authorization", common::BASIC_AUTH))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=refresh-token"))
        .and(body_string_contains("redirect_uri="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "new-access",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tokens = manager(&server);
    tokens.refresh().await.expect("refresh succeeds");

    assert_eq!(tokens.bearer().await, "new-access");
    // Not rotated: the original refresh token is kept
    assert_eq!(tokens.credentials().await.refresh_token, "refresh-token");
}

#[tokio::test]
async fn test_refresh_stores_rotated_refresh_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "new-access",
            "token_type": "bearer",
            "refresh_token": "rotated-refresh"
        })))
        .mount(&server)
        .await;

    let tokens = manager(&server);
    tokens.refresh().await.unwrap();

    let credentials = tokens.credentials().await;
    assert_eq!(credentials.access_token, "new-access");
    assert_eq!(credentials.refresh_token, "rotated-refresh");
    assert_eq!(credentials.client_id, "client-id");
}

#[tokio::test]
async fn test_refresh_rejected_by_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Refresh token revoked"
        })))
        .mount(&server)
        .await;

    let tokens = manager(&server);
    let err = tokens.refresh().await.unwrap_err();

    assert!(matches!(err, AuthError::RefreshRejected(_)), "got {err:?}");
    assert_eq!(tokens.bearer().await, common::STALE_TOKEN);
}

#[tokio::test]
async fn test_refresh_rejected_on_unparseable_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html>maintenance</html>")
                .append_header("Content-Type", "text/html"),
        )
        .mount(&server)
        .await;

    let err = manager(&server).refresh().await.unwrap_err();
    assert!(matches!(err, AuthError::RefreshRejected(_)), "got {err:?}");
}
