//! Batched playlist mutations
//!
//! Spotify accepts at most 100 tracks per add or remove call. The
//! [`BatchMutator`] splits a track list into chunks and sends them in
//! order, one request at a time:
//!
//! - `POST /playlists/{id}/tracks` with `{"uris": [...]}` to add
//! - `DELETE /playlists/{id}/tracks` with `{"tracks": [{"uri": ...}]}` to remove
//!
//! The first `401` of a sequence triggers exactly one token refresh; the
//! failed chunk and all remaining chunks are then sent with the new token.
//! Any later failure aborts the sequence.

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use tracknet_core::domain::{MutationError, PlaylistId, TrackCollection};

use crate::client::SpotifyClient;

/// Provider maximum of URIs per mutation call
pub const MAX_MUTATION_BATCH: usize = 100;

/// Direction of a mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Add,
    Remove,
}

impl MutationKind {
    fn method(self) -> Method {
        match self {
            Self::Add => Method::POST,
            Self::Remove => Method::DELETE,
        }
    }

    /// JSON body for one chunk of URIs
    pub fn body(self, uris: &[&str]) -> Value {
        match self {
            Self::Add => json!({ "uris": uris }),
            Self::Remove => json!({
                "tracks": uris.iter().map(|uri| json!({ "uri": uri })).collect::<Vec<_>>()
            }),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
        }
    }
}

/// Applies add/remove operations in provider-sized chunks
pub struct BatchMutator {
    client: Arc<SpotifyClient>,
    batch_size: usize,
}

impl BatchMutator {
    pub fn new(client: Arc<SpotifyClient>) -> Self {
        Self {
            client,
            batch_size: MAX_MUTATION_BATCH,
        }
    }

    /// Overrides the chunk size, clamped to `1..=100`
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.clamp(1, MAX_MUTATION_BATCH);
        self
    }

    /// Removes `tracks` from `playlist`
    pub async fn remove(
        &self,
        playlist: &PlaylistId,
        tracks: &TrackCollection,
    ) -> Result<(), MutationError> {
        self.apply(MutationKind::Remove, playlist, &tracks.uris())
            .await
    }

    /// Appends `tracks` to `playlist`
    pub async fn add(
        &self,
        playlist: &PlaylistId,
        tracks: &TrackCollection,
    ) -> Result<(), MutationError> {
        self.apply(MutationKind::Add, playlist, &tracks.uris()).await
    }

    /// Sends `uris` in chunks, in order.
    ///
    /// # Errors
    /// - [`MutationError::Rejected`] for a non-2xx answer, or any 401 once
    ///   the token was already refreshed
    /// - [`MutationError::Transport`] when a chunk cannot be delivered
    /// - [`MutationError::Auth`] when the token refresh fails
    pub async fn apply(
        &self,
        kind: MutationKind,
        playlist: &PlaylistId,
        uris: &[&str],
    ) -> Result<(), MutationError> {
        if uris.is_empty() {
            debug!(op = kind.as_str(), "No tracks, skipping mutation");
            return Ok(());
        }

        let path = format!("/playlists/{}/tracks", playlist.as_str());
        let chunks: Vec<&[&str]> = uris.chunks(self.batch_size).collect();
        let mut refreshed = false;
        let mut index = 0;

        while index < chunks.len() {
            let body = kind.body(chunks[index]);
            let response = self
                .client
                .send(kind.method(), &path, &[], Some(&body))
                .await
                .map_err(|e| e.into_mutation_error(index))?;

            let status = response.status();
            if status.is_success() {
                debug!(
                    op = kind.as_str(),
                    chunk = index,
                    size = chunks[index].len(),
                    "Mutation chunk applied"
                );
                index += 1;
                continue;
            }

            if status == StatusCode::UNAUTHORIZED && !refreshed {
                debug!(chunk = index, "Access token rejected, refreshing");
                self.client.tokens().refresh().await?;
                refreshed = true;
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            warn!(
                op = kind.as_str(),
                chunk = index,
                status = status.as_u16(),
                "Mutation chunk rejected"
            );
            return Err(MutationError::Rejected {
                chunk_index: index,
                reason: format!("HTTP {}: {}", status.as_u16(), body),
            });
        }

        info!(
            op = kind.as_str(),
            playlist = %playlist,
            tracks = uris.len(),
            chunks = chunks.len(),
            "Mutation completed"
        );
        Ok(())
    }
}
