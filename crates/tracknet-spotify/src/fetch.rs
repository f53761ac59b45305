//! Paginated playlist retrieval
//!
//! A playlist is read with `GET /playlists/{id}/tracks?limit=N&offset=M`
//! until a page comes back shorter than requested. Each page is enriched
//! with one `GET /audio-features?ids=` call; once every page is in, the
//! distinct artists are looked up in chunks through `GET /artists?ids=` to
//! attach up to three genres per track.
//!
//! ## Termination
//!
//! - A page whose item count differs from the page size ends the scan.
//! - Counting is done on raw entries, before de-duplication: a full page
//!   of repeated tracks is still a full page and the scan goes on.
//! - Needing more than `max_pages` pages fails with
//!   [`FetchError::PageLimitExceeded`], which is also where a provider
//!   serving the same page forever ends up. A truncated collection would
//!   make the reconciler remove tracks that are still there.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info, warn};

use tracknet_core::domain::{
    AudioFeatures, FetchError, PlaylistId, Track, TrackCollection, TrackId, MAX_GENRES,
};

use crate::client::SpotifyClient;

/// Provider maximum for `limit`
pub const MAX_PAGE_SIZE: u32 = 100;

/// Provider maximum of ids per `/artists` call
pub const MAX_ARTIST_BATCH: usize = 50;

// ============================================================================
// Spotify API response types
// ============================================================================

/// One page of `GET /playlists/{id}/tracks`
#[derive(Debug, Deserialize)]
pub(crate) struct PlaylistPage {
    pub items: Vec<PlaylistItem>,
}

/// Playlist entry wrapping a track
#[derive(Debug, Deserialize)]
pub(crate) struct PlaylistItem {
    pub added_at: Option<DateTime<Utc>>,
    /// `null` for unavailable or removed content
    pub track: Option<TrackObject>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TrackObject {
    /// `null` for local files
    pub id: Option<String>,
    pub uri: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ArtistRef {
    pub id: Option<String>,
    pub name: Option<String>,
}

/// `GET /audio-features` body, order-aligned with the requested ids
#[derive(Debug, Deserialize)]
pub(crate) struct AudioFeaturesResponse {
    pub audio_features: Vec<Option<AudioFeatures>>,
}

/// `GET /artists` body, order-aligned with the requested ids
#[derive(Debug, Deserialize)]
pub(crate) struct ArtistsResponse {
    pub artists: Vec<Option<ArtistObject>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ArtistObject {
    #[serde(default)]
    pub genres: Vec<String>,
}

/// Converts a playlist entry into a domain [`Track`].
///
/// Returns `Ok(None)` for entries without a track or a track id; those
/// cannot be addressed by later mutations.
pub(crate) fn item_to_track(item: PlaylistItem) -> Result<Option<Track>, FetchError> {
    let Some(track) = item.track else {
        return Ok(None);
    };
    let Some(raw_id) = track.id else {
        return Ok(None);
    };

    let id = TrackId::new(raw_id.clone())
        .map_err(|e| FetchError::Malformed(format!("track id '{raw_id}': {e}")))?;
    let missing = |field: &str| FetchError::Malformed(format!("track {raw_id}: missing {field}"));

    let added_at = item.added_at.ok_or_else(|| missing("added_at"))?;
    let uri = track.uri.ok_or_else(|| missing("uri"))?;
    let name = track.name.ok_or_else(|| missing("name"))?;

    let (artist, artist_id) = track
        .artists
        .into_iter()
        .next()
        .map(|a| (a.name.unwrap_or_default(), a.id.unwrap_or_default()))
        .unwrap_or_default();

    Ok(Some(Track::new(id, uri, name, artist, artist_id, added_at)))
}

// ============================================================================
// PaginatedFetcher
// ============================================================================

/// Reads a whole playlist page by page and enriches every track
pub struct PaginatedFetcher {
    client: Arc<SpotifyClient>,
    page_size: u32,
    max_pages: u32,
    artist_batch_size: usize,
}

impl PaginatedFetcher {
    /// Creates a fetcher with provider-maximum page and batch sizes
    pub fn new(client: Arc<SpotifyClient>) -> Self {
        Self {
            client,
            page_size: MAX_PAGE_SIZE,
            max_pages: 1000,
            artist_batch_size: MAX_ARTIST_BATCH,
        }
    }

    /// Overrides the page size, clamped to `1..=100`
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    /// Overrides the page ceiling, at least 1
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    /// Overrides the artist chunk size, clamped to `1..=50`
    pub fn with_artist_batch_size(mut self, size: usize) -> Self {
        self.artist_batch_size = size.clamp(1, MAX_ARTIST_BATCH);
        self
    }

    /// Retrieves every track of `playlist`, de-duplicated by id (first
    /// occurrence wins) and enriched with audio features and genres.
    ///
    /// # Errors
    /// - [`FetchError::Unauthorized`] when a request is still rejected after
    ///   one token refresh
    /// - [`FetchError::Auth`] when that refresh fails
    /// - [`FetchError::Malformed`] for unexpected bodies or misaligned
    ///   enrichment responses
    /// - [`FetchError::PageLimitExceeded`] when the collection does not end
    ///   within `max_pages` pages
    /// - [`FetchError::Transport`] for everything else
    pub async fn fetch_collection(
        &self,
        playlist: &PlaylistId,
    ) -> Result<TrackCollection, FetchError> {
        let path = format!("/playlists/{}/tracks", playlist.as_str());
        let mut collection = TrackCollection::new();
        let mut seen: HashSet<TrackId> = HashSet::new();
        let mut skipped = 0usize;
        let mut duplicates = 0usize;
        let mut page_index: u32 = 0;

        loop {
            if page_index >= self.max_pages {
                warn!(
                    playlist = %playlist,
                    max_pages = self.max_pages,
                    "Playlist did not end within the page limit"
                );
                return Err(FetchError::PageLimitExceeded {
                    resource: playlist.to_string(),
                    max_pages: self.max_pages,
                });
            }

            let offset = u64::from(page_index) * u64::from(self.page_size);
            let query = [
                ("limit", self.page_size.to_string()),
                ("offset", offset.to_string()),
            ];
            let page: PlaylistPage = self.client.get_json(&path, &query).await?;
            let item_count = page.items.len();
            page_index += 1;

            let mut fresh = Vec::with_capacity(item_count);
            let mut repeated = 0usize;
            for item in page.items {
                match item_to_track(item)? {
                    None => skipped += 1,
                    Some(track) if seen.insert(track.id.clone()) => fresh.push(track),
                    Some(_) => repeated += 1,
                }
            }
            duplicates += repeated;

            self.attach_features(&mut fresh).await?;
            collection.extend(fresh);

            debug!(
                playlist = %playlist,
                offset,
                items = item_count,
                total = collection.len(),
                "Fetched playlist page"
            );

            if item_count != self.page_size as usize {
                break;
            }
        }

        if skipped > 0 {
            warn!(playlist = %playlist, skipped, "Skipped entries without a track id");
        }

        self.attach_genres(&mut collection).await?;

        info!(
            playlist = %playlist,
            pages = page_index,
            tracks = collection.len(),
            duplicates,
            "Fetched playlist"
        );
        Ok(collection)
    }

    /// One `/audio-features` call for the tracks of a page
    async fn attach_features(&self, tracks: &mut [Track]) -> Result<(), FetchError> {
        if tracks.is_empty() {
            return Ok(());
        }

        let ids = tracks
            .iter()
            .map(|t| t.id.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let response: AudioFeaturesResponse = self
            .client
            .get_json("/audio-features", &[("ids", ids)])
            .await?;

        if response.audio_features.len() != tracks.len() {
            return Err(FetchError::Malformed(format!(
                "audio-features returned {} entries for {} ids",
                response.audio_features.len(),
                tracks.len()
            )));
        }

        for (track, features) in tracks.iter_mut().zip(response.audio_features) {
            track.features = features;
        }
        Ok(())
    }

    /// Looks up the genres of every distinct artist, in chunks
    async fn attach_genres(&self, collection: &mut TrackCollection) -> Result<(), FetchError> {
        let genres = self.artist_genres(&unique_artist_ids(collection)).await?;

        let tracks = std::mem::take(collection);
        *collection = tracks
            .into_iter()
            .map(|mut track| {
                let tags = genres.get(&track.artist_id).cloned().unwrap_or_default();
                track.set_genres(tags);
                track
            })
            .collect();
        Ok(())
    }

    async fn artist_genres(
        &self,
        artist_ids: &[String],
    ) -> Result<HashMap<String, Vec<String>>, FetchError> {
        let mut genres = HashMap::with_capacity(artist_ids.len());

        for chunk in artist_ids.chunks(self.artist_batch_size) {
            let response: ArtistsResponse = self
                .client
                .get_json("/artists", &[("ids", chunk.join(","))])
                .await?;

            if response.artists.len() != chunk.len() {
                return Err(FetchError::Malformed(format!(
                    "artists returned {} entries for {} ids",
                    response.artists.len(),
                    chunk.len()
                )));
            }

            for (id, artist) in chunk.iter().zip(response.artists) {
                let tags: Vec<String> = artist
                    .map(|a| a.genres.into_iter().take(MAX_GENRES).collect())
                    .unwrap_or_default();
                genres.insert(id.clone(), tags);
            }
        }

        debug!(artists = genres.len(), "Resolved artist genres");
        Ok(genres)
    }
}

/// Non-empty artist ids in first-seen order
fn unique_artist_ids(collection: &TrackCollection) -> Vec<String> {
    let mut seen = HashSet::new();
    collection
        .iter()
        .map(|t| t.artist_id.as_str())
        .filter(|id| !id.is_empty() && seen.insert(*id))
        .map(str::to_string)
        .collect()
}
