//! Integration tests for batched playlist mutations
//!
//! Verifies chunking, request bodies, the single refresh on 401 and
//! fail-fast behavior of add and remove operations.

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tracknet_core::domain::{AuthError, MutationError, Track, TrackCollection};
use tracknet_core::ports::ICollectionProvider;

use crate::common;

fn tracks(count: usize) -> TrackCollection {
    (0..count)
        .map(|n| {
            Track::new(
                format!("t{n}").parse().unwrap(),
                format!("spotify:track:t{n}"),
                format!("Song t{n}"),
                "Artist",
                "ar1",
                common::days_ago(40),
            )
        })
        .collect()
}

async fn mutation_requests(server: &MockServer, verb: &str) -> Vec<wiremock::Request> {
    server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.method.as_str() == verb && r.url.path() == common::playlist_path())
        .collect()
}

#[tokio::test]
async fn test_remove_chunks_in_order() {
    let (server, connector) = common::setup().await;
    Mock::given(method("DELETE"))
        .and(path(common::playlist_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"snapshot_id": "s1"})))
        .expect(3)
        .mount(&server)
        .await;

    let batch = tracks(250);
    connector
        .provider(common::bundle())
        .remove_tracks(&common::playlist(), &batch)
        .await
        .expect("remove succeeds");

    let requests = mutation_requests(&server, "DELETE").await;
    let sent: Vec<Vec<String>> = requests.iter().map(common::body_uris).collect();
    assert_eq!(
        sent.iter().map(Vec::len).collect::<Vec<_>>(),
        vec![100, 100, 50]
    );
    assert_eq!(sent[0][0], "spotify:track:t0");
    assert_eq!(sent[1][0], "spotify:track:t100");
    assert_eq!(sent[2][49], "spotify:track:t249");

    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["tracks"][0], json!({"uri": "spotify:track:t0"}));
}

#[tokio::test]
async fn test_add_posts_uris_body() {
    let (server, connector) = common::setup().await;
    Mock::given(method("POST"))
        .and(path(common::playlist_path()))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"snapshot_id": "s1"})))
        .expect(1)
        .mount(&server)
        .await;

    connector
        .provider(common::bundle())
        .add_tracks(&common::playlist(), &tracks(3))
        .await
        .unwrap();

    let requests = mutation_requests(&server, "POST").await;
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(
        body,
        json!({"uris": ["spotify:track:t0", "spotify:track:t1", "spotify:track:t2"]})
    );
}

#[tokio::test]
async fn test_empty_mutation_makes_no_calls() {
    let (server, connector) = common::setup().await;
    let provider = connector.provider(common::bundle());

    provider
        .remove_tracks(&common::playlist(), &TrackCollection::new())
        .await
        .unwrap();
    provider
        .add_tracks(&common::playlist(), &TrackCollection::new())
        .await
        .unwrap();

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_401_mid_batch_refreshes_and_retries_same_chunk() {
    let (server, connector) = common::setup().await;
    // First chunk goes through with the old token, the second is refused
    Mock::given(method("DELETE"))
        .and(path(common::playlist_path()))
        .and(header("authorization", "Bearer stale-token"))
        .respond_with(ResponseTemplate::new(200))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(common::playlist_path()))
        .and(header("authorization", "Bearer stale-token"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(common::playlist_path()))
        .and(header("authorization", "Bearer fresh-token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;
    common::mount_token_refresh(&server).await;

    connector
        .provider(common::bundle())
        .remove_tracks(&common::playlist(), &tracks(250))
        .await
        .unwrap();

    let requests = mutation_requests(&server, "DELETE").await;
    let firsts: Vec<String> = requests
        .iter()
        .map(|r| common::body_uris(r)[0].clone())
        .collect();
    assert_eq!(
        firsts,
        vec![
            "spotify:track:t0",
            "spotify:track:t100",
            "spotify:track:t100",
            "spotify:track:t200"
        ]
    );
}

#[tokio::test]
async fn test_second_401_is_rejected_without_another_refresh() {
    let (server, connector) = common::setup().await;
    Mock::given(method("DELETE"))
        .and(path(common::playlist_path()))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;
    common::mount_token_refresh(&server).await;

    let err = connector
        .provider(common::bundle())
        .remove_tracks(&common::playlist(), &tracks(5))
        .await
        .unwrap_err();

    assert!(
        matches!(err, MutationError::Rejected { chunk_index: 0, .. }),
        "got {err:?}"
    );
}

#[tokio::test]
async fn test_failed_chunk_stops_remaining_chunks() {
    let (server, connector) = common::setup().await;
    Mock::given(method("DELETE"))
        .and(path(common::playlist_path()))
        .respond_with(ResponseTemplate::new(200))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(common::playlist_path()))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream failure"))
        .mount(&server)
        .await;

    let err = connector
        .provider(common::bundle())
        .remove_tracks(&common::playlist(), &tracks(250))
        .await
        .unwrap_err();

    match err {
        MutationError::Rejected {
            chunk_index,
            reason,
        } => {
            assert_eq!(chunk_index, 1);
            assert!(reason.contains("500"), "reason: {reason}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(mutation_requests(&server, "DELETE").await.len(), 2);
}

#[tokio::test]
async fn test_failed_refresh_during_mutation_is_auth_error() {
    let (server, connector) = common::setup().await;
    Mock::given(method("POST"))
        .and(path(common::playlist_path()))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "invalid_client"})))
        .expect(1)
        .mount(&server)
        .await;

    let err = connector
        .provider(common::bundle())
        .add_tracks(&common::playlist(), &tracks(2))
        .await
        .unwrap_err();

    assert!(
        matches!(err, MutationError::Auth(AuthError::RefreshRejected(_))),
        "got {err:?}"
    );
}

#[tokio::test]
async fn test_mutation_gives_up_after_429_budget() {
    let (server, connector) = common::setup().await;
    Mock::given(method("DELETE"))
        .and(path(common::playlist_path()))
        .respond_with(ResponseTemplate::new(429).append_header("Retry-After", "0"))
        .expect(3)
        .mount(&server)
        .await;

    let err = connector
        .provider(common::bundle())
        .remove_tracks(&common::playlist(), &tracks(1))
        .await
        .unwrap_err();

    assert!(
        matches!(err, MutationError::Transport { chunk_index: 0, .. }),
        "got {err:?}"
    );
}
