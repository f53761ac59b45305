//! Track and TrackCollection entities
//!
//! A [`Track`] is one addressable item of a playlist, enriched with audio
//! attributes and up to three genre tags. A [`TrackCollection`] is an
//! ordered sequence of tracks that behaves as a set keyed by [`TrackId`]
//! once [`TrackCollection::dedup_by_id`] has run.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::newtypes::TrackId;

/// Sentinel genre recorded when the artist lookup yields nothing
pub const NO_GENRE: &str = "No Genre";

/// Maximum number of genre tags kept per track
pub const MAX_GENRES: usize = 3;

// ============================================================================
// AudioFeatures
// ============================================================================

/// Numeric audio attributes of a track
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioFeatures {
    pub danceability: f64,
    pub energy: f64,
    pub key: i32,
    pub loudness: f64,
    pub mode: i32,
    pub speechiness: f64,
    pub acousticness: f64,
    pub instrumentalness: f64,
    pub liveness: f64,
    pub valence: f64,
    pub tempo: f64,
    pub duration_ms: u64,
    pub time_signature: i32,
}

// ============================================================================
// Track
// ============================================================================

/// A single track of a collection resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Provider-unique identifier
    pub id: TrackId,
    /// Identifier used in mutation requests (e.g. "spotify:track:...")
    pub uri: String,
    pub name: String,
    /// Name of the first credited artist
    pub artist: String,
    /// ID of the first credited artist (empty when the provider has none)
    pub artist_id: String,
    /// When the track was inserted into the source collection
    pub added_at: DateTime<Utc>,
    /// Audio attributes; `None` when the provider has no analysis
    #[serde(default)]
    pub features: Option<AudioFeatures>,
    /// At most [`MAX_GENRES`] tags, empty until enrichment
    #[serde(default)]
    pub genres: Vec<String>,
}

impl Track {
    /// Creates a track without enrichment data
    pub fn new(
        id: TrackId,
        uri: impl Into<String>,
        name: impl Into<String>,
        artist: impl Into<String>,
        artist_id: impl Into<String>,
        added_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            uri: uri.into(),
            name: name.into(),
            artist: artist.into(),
            artist_id: artist_id.into(),
            added_at,
            features: None,
            genres: Vec::new(),
        }
    }

    /// Replaces the genre tags, keeping at most [`MAX_GENRES`] and falling
    /// back to [`NO_GENRE`] when the list is empty
    pub fn set_genres<I, S>(&mut self, genres: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genres = genres
            .into_iter()
            .take(MAX_GENRES)
            .map(Into::into)
            .collect();
        if self.genres.is_empty() {
            self.genres.push(NO_GENRE.to_string());
        }
    }
}

// ============================================================================
// TrackCollection
// ============================================================================

/// Ordered sequence of tracks, a set keyed by `id` after de-duplication
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackCollection {
    tracks: Vec<Track>,
}

impl TrackCollection {
    /// Creates an empty collection
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Track> {
        self.tracks.iter()
    }

    pub fn as_slice(&self) -> &[Track] {
        &self.tracks
    }

    pub fn push(&mut self, track: Track) {
        self.tracks.push(track);
    }

    pub fn into_vec(self) -> Vec<Track> {
        self.tracks
    }

    /// Set of IDs present in the collection
    pub fn ids(&self) -> HashSet<&TrackId> {
        self.tracks.iter().map(|t| &t.id).collect()
    }

    pub fn contains_id(&self, id: &TrackId) -> bool {
        self.tracks.iter().any(|t| &t.id == id)
    }

    /// Mutation URIs in collection order
    pub fn uris(&self) -> Vec<&str> {
        self.tracks.iter().map(|t| t.uri.as_str()).collect()
    }

    /// Removes later occurrences of an already-seen `id`, keeping the first.
    ///
    /// Returns the number of tracks dropped.
    pub fn dedup_by_id(&mut self) -> usize {
        let before = self.tracks.len();
        let mut seen = HashSet::with_capacity(before);
        self.tracks.retain(|t| seen.insert(t.id.clone()));
        before - self.tracks.len()
    }
}

impl From<Vec<Track>> for TrackCollection {
    fn from(tracks: Vec<Track>) -> Self {
        Self { tracks }
    }
}

impl FromIterator<Track> for TrackCollection {
    fn from_iter<I: IntoIterator<Item = Track>>(iter: I) -> Self {
        Self {
            tracks: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for TrackCollection {
    type Item = Track;
    type IntoIter = std::vec::IntoIter<Track>;

    fn into_iter(self) -> Self::IntoIter {
        self.tracks.into_iter()
    }
}

impl<'a> IntoIterator for &'a TrackCollection {
    type Item = &'a Track;
    type IntoIter = std::slice::Iter<'a, Track>;

    fn into_iter(self) -> Self::IntoIter {
        self.tracks.iter()
    }
}

impl Extend<Track> for TrackCollection {
    fn extend<I: IntoIterator<Item = Track>>(&mut self, iter: I) {
        self.tracks.extend(iter);
    }
}
