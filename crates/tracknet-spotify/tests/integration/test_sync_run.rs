//! End-to-end sync runs against the mock API
//!
//! Wires the environment credential store, the Spotify connector and the
//! sync use case together the way the CLI does.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use tracknet_core::domain::{RemovalPolicy, SecretRef, Track, TrackCollection, TrackId};
use tracknet_core::usecases::{SyncPlaylistUseCase, SyncRequest, SyncRunError, SyncStage};
use tracknet_spotify::credentials::{
    EnvCredentialStore, ENV_ACCESS_TOKEN, ENV_CLIENT_ID, ENV_CLIENT_SECRET, ENV_REFRESH_TOKEN,
};
use tracknet_spotify::provider::SpotifyConnector;

use crate::common;

fn env_store() -> EnvCredentialStore {
    let vars = HashMap::from([
        (ENV_CLIENT_ID.to_string(), "client-id".to_string()),
        (ENV_CLIENT_SECRET.to_string(), "client-secret".to_string()),
        (ENV_ACCESS_TOKEN.to_string(), common::STALE_TOKEN.to_string()),
        (ENV_REFRESH_TOKEN.to_string(), "refresh-token".to_string()),
    ]);
    EnvCredentialStore::with_vars(vars)
}

fn use_case(store: EnvCredentialStore, connector: SpotifyConnector) -> SyncPlaylistUseCase {
    SyncPlaylistUseCase::new(
        Arc::new(store),
        Arc::new(connector),
        SecretRef::new("spotify_35", "us-east-2"),
    )
}

fn snapshot(ids: &[&str]) -> TrackCollection {
    ids.iter()
        .map(|id| {
            Track::new(
                id.parse::<TrackId>().unwrap(),
                format!("spotify:track:{id}"),
                format!("Song {id}"),
                "Artist ar1",
                "ar1",
                common::days_ago(3),
            )
        })
        .collect()
}

fn ids(collection: &TrackCollection) -> Vec<&str> {
    collection.iter().map(|t| t.id.as_str()).collect()
}

#[tokio::test]
async fn test_sync_removes_tracks_missing_since_previous_snapshot() {
    let (server, connector) = common::setup().await;
    let page = ["a", "c", "e", "f"]
        .iter()
        .map(|id| common::item(id, "ar1", common::days_ago(2)))
        .collect();
    common::mount_page(&server, 0, page).await;
    common::mount_features_echo(&server).await;
    common::mount_artists_echo(&server, &["indie"]).await;
    Mock::given(method("DELETE"))
        .and(path(common::playlist_path()))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let request = SyncRequest::new(
        common::playlist(),
        snapshot(&["a", "b", "c", "d", "e"]),
        Duration::days(30),
    );
    let outcome = use_case(env_store(), connector)
        .run(request)
        .await
        .expect("sync succeeds");

    assert_eq!(ids(&outcome.snapshot), vec!["a", "c", "e", "f"]);
    assert_eq!(ids(&outcome.report.removed), vec!["b", "d"]);
    assert_eq!(outcome.report.fetched, 4);

    let requests = server.received_requests().await.unwrap();
    let delete = requests
        .iter()
        .find(|r| r.method.as_str() == "DELETE")
        .expect("one DELETE");
    assert_eq!(
        common::body_uris(delete),
        vec!["spotify:track:b", "spotify:track:d"]
    );
}

#[tokio::test]
async fn test_sync_stale_policy_removes_old_tracks() {
    let (server, connector) = common::setup().await;
    let page = vec![
        common::item("new", "ar1", common::days_ago(1)),
        common::item("old", "ar1", common::days_ago(45)),
    ];
    common::mount_page(&server, 0, page).await;
    common::mount_features_echo(&server).await;
    common::mount_artists_echo(&server, &["indie"]).await;
    Mock::given(method("DELETE"))
        .and(path(common::playlist_path()))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let request = SyncRequest::new(common::playlist(), TrackCollection::new(), Duration::days(30))
        .with_policy(RemovalPolicy::Stale);
    let outcome = use_case(env_store(), connector).run(request).await.unwrap();

    assert_eq!(ids(&outcome.snapshot), vec!["new"]);
    assert_eq!(ids(&outcome.report.removed), vec!["old"]);
    assert_eq!(outcome.report.stale, 1);
}

#[tokio::test]
async fn test_sync_without_removals_sends_no_mutation() {
    let (server, connector) = common::setup().await;
    common::mount_page(&server, 0, common::items(0, 3)).await;
    common::mount_features_echo(&server).await;
    common::mount_artists_echo(&server, &["indie"]).await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let previous = snapshot(&["t0", "t1", "t2"]);
    let outcome = use_case(env_store(), connector)
        .run(SyncRequest::new(common::playlist(), previous, Duration::days(30)))
        .await
        .unwrap();

    assert!(outcome.report.removed.is_empty());
    assert_eq!(outcome.snapshot.len(), 3);
}

#[tokio::test]
async fn test_sync_missing_credentials_fails_before_any_request() {
    let (server, connector) = common::setup().await;

    let err = use_case(EnvCredentialStore::with_vars(HashMap::new()), connector)
        .run(SyncRequest::new(
            common::playlist(),
            TrackCollection::new(),
            Duration::days(30),
        ))
        .await
        .unwrap_err();

    assert_eq!(err.stage(), SyncStage::Credentials);
    assert!(matches!(err, SyncRunError::Credentials(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_sync_failed_removal_reports_mutation_stage() {
    let (server, connector) = common::setup().await;
    common::mount_page(&server, 0, common::items(0, 1)).await;
    common::mount_features_echo(&server).await;
    common::mount_artists_echo(&server, &["indie"]).await;
    Mock::given(method("DELETE"))
        .and(path(common::playlist_path()))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = use_case(env_store(), connector)
        .run(SyncRequest::new(
            common::playlist(),
            snapshot(&["gone"]),
            Duration::days(30),
        ))
        .await
        .unwrap_err();

    assert_eq!(err.stage(), SyncStage::Mutation);
}

#[tokio::test]
async fn test_sync_keeps_tracks_after_a_page_of_duplicates() {
    let (server, connector) = common::setup().await;
    common::mount_page(&server, 0, common::items(0, 100)).await;
    common::mount_page(&server, 100, common::items(0, 100)).await;
    common::mount_page(&server, 200, common::items(200, 10)).await;
    common::mount_features_echo(&server).await;
    common::mount_artists_echo(&server, &["indie"]).await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let outcome = use_case(env_store(), connector)
        .run(SyncRequest::new(
            common::playlist(),
            snapshot(&["t205"]),
            Duration::days(30),
        ))
        .await
        .unwrap();

    assert_eq!(outcome.report.fetched, 110);
    assert!(outcome.report.removed.is_empty());
    assert!(outcome.snapshot.contains_id(&"t205".parse().unwrap()));
}
