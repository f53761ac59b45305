//! Shared test helpers for Spotify Web API integration tests
//!
//! Provides wiremock-based mock server setup for the Spotify endpoints.
//! Each helper mounts the necessary mock endpoints; [`setup`] returns a
//! connector pointing at the mock server.

#![allow(dead_code)]

use std::time::Duration;

use chrono::{DateTime, Utc};
use oauth2::TokenUrl;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use tracknet_core::domain::{CredentialBundle, PlaylistId};
use tracknet_spotify::provider::{SpotifyConnector, SpotifySettings};
use tracknet_spotify::rate_limit::RetryPolicy;

pub const PLAYLIST: &str = "testplaylist";
pub const STALE_TOKEN: &str = "stale-token";
pub const FRESH_TOKEN: &str = "fresh-token";

/// base64("client-id:client-secret")
pub const BASIC_AUTH: &str = "Basic Y2xpZW50LWlkOmNsaWVudC1zZWNyZXQ=";

pub fn playlist() -> PlaylistId {
    PLAYLIST.parse().expect("valid playlist id")
}

pub fn playlist_path() -> String {
    format!("/playlists/{PLAYLIST}/tracks")
}

pub fn bundle() -> CredentialBundle {
    CredentialBundle::new("client-id", "client-secret", STALE_TOKEN, "refresh-token")
}

pub fn settings(server: &MockServer) -> SpotifySettings {
    SpotifySettings {
        api_base_url: server.uri(),
        token_url: TokenUrl::new(format!("{}/api/token", server.uri())).expect("token url"),
        redirect_uri: "http://localhost:8888/callback".to_string(),
        page_size: 100,
        max_pages: 50,
        mutation_batch_size: 100,
        artist_batch_size: 50,
        retry: RetryPolicy {
            max_retries: 2,
            default_retry_after: Duration::ZERO,
        },
    }
}

/// Starts a mock server and returns a connector bound to it
pub async fn setup() -> (MockServer, SpotifyConnector) {
    let server = MockServer::start().await;
    let connector = SpotifyConnector::new(reqwest::Client::new(), settings(&server));
    (server, connector)
}

/// Like [`setup`] with custom settings
pub async fn setup_with(
    tweak: impl FnOnce(&mut SpotifySettings),
) -> (MockServer, SpotifyConnector) {
    let server = MockServer::start().await;
    let mut settings = settings(&server);
    tweak(&mut settings);
    let connector = SpotifyConnector::new(reqwest::Client::new(), settings);
    (server, connector)
}

// ============================================================================
// Payload builders
// ============================================================================

pub fn days_ago(days: i64) -> DateTime<Utc> {
    Utc::now() - chrono::Duration::days(days)
}

/// One playlist entry with a single credited artist
pub fn item(id: &str, artist_id: &str, added_at: DateTime<Utc>) -> Value {
    json!({
        "added_at": added_at.to_rfc3339(),
        "track": {
            "id": id,
            "uri": format!("spotify:track:{id}"),
            "name": format!("Song {id}"),
            "artists": [{"id": artist_id, "name": format!("Artist {artist_id}")}]
        }
    })
}

/// `count` entries with ids `t{start}..`, all by artist `ar1`
pub fn items(start: usize, count: usize) -> Vec<Value> {
    (start..start + count)
        .map(|n| item(&format!("t{n}"), "ar1", days_ago(1)))
        .collect()
}

pub fn features(id: &str) -> Value {
    json!({
        "id": id,
        "danceability": 0.5, "energy": 0.6, "key": 2, "loudness": -7.0,
        "mode": 1, "speechiness": 0.05, "acousticness": 0.2,
        "instrumentalness": 0.0, "liveness": 0.1, "valence": 0.4,
        "tempo": 118.0, "duration_ms": 200000, "time_signature": 4
    })
}

/// Values of the comma-separated `ids` query parameter
pub fn ids_param(req: &Request) -> Vec<String> {
    req.url
        .query_pairs()
        .find(|(k, _)| k == "ids")
        .map(|(_, v)| v.split(',').map(str::to_string).collect())
        .unwrap_or_default()
}

/// URIs carried by a mutation request body
pub fn body_uris(req: &Request) -> Vec<String> {
    let body: Value = serde_json::from_slice(&req.body).expect("json body");
    if let Some(uris) = body.get("uris") {
        return uris
            .as_array()
            .expect("uris array")
            .iter()
            .map(|u| u.as_str().expect("uri").to_string())
            .collect();
    }
    body["tracks"]
        .as_array()
        .expect("tracks array")
        .iter()
        .map(|t| t["uri"].as_str().expect("uri").to_string())
        .collect()
}

pub fn bearer(req: &Request) -> String {
    req.headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

// ============================================================================
// Mock mounts
// ============================================================================

/// Mounts one playlist page at `offset`, expected exactly once
pub async fn mount_page(server: &MockServer, offset: usize, items: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path(playlist_path()))
        .and(query_param("limit", "100"))
        .and(query_param("offset", offset.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": items })))
        .expect(1)
        .mount(server)
        .await;
}

/// Mounts `/audio-features` answering every requested id, in order
pub async fn mount_features_echo(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/audio-features"))
        .respond_with(|req: &Request| {
            let body: Vec<Value> = ids_param(req).iter().map(|id| features(id)).collect();
            ResponseTemplate::new(200).set_body_json(json!({ "audio_features": body }))
        })
        .mount(server)
        .await;
}

/// Mounts `/artists` answering every requested id with `genres`
pub async fn mount_artists_echo(server: &MockServer, genres: &[&str]) {
    let genres: Vec<String> = genres.iter().map(|g| g.to_string()).collect();
    Mock::given(method("GET"))
        .and(path("/artists"))
        .respond_with(move |req: &Request| {
            let body: Vec<Value> = ids_param(req)
                .iter()
                .map(|id| json!({"id": id, "genres": genres}))
                .collect();
            ResponseTemplate::new(200).set_body_json(json!({ "artists": body }))
        })
        .mount(server)
        .await;
}

/// Mounts the token endpoint handing out [`FRESH_TOKEN`], expected once
pub async fn mount_token_refresh(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(header("authorization", BASIC_AUTH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": FRESH_TOKEN,
            "token_type": "Bearer",
            "expires_in": 3600,
            "scope": "playlist-modify-private"
        })))
        .expect(1)
        .mount(server)
        .await;
}
