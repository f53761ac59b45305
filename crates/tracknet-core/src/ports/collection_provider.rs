//! Collection provider port (driven/secondary port)
//!
//! This module defines the capability set a music service must offer for a
//! sync run: fetch a whole collection, refresh the authorization, and add or
//! remove tracks in batches. The Spotify adapter is the conforming
//! implementation; tests use in-memory fakes.
//!
//! ## Design Notes
//!
//! - Methods return the typed errors from [`crate::domain::errors`] so the
//!   orchestrator can report which stage failed.
//! - Uses `#[async_trait]` for async trait methods.
//! - Implementations own their token state; callers never see or mutate the
//!   access token.

use crate::domain::{
    AuthError, CredentialBundle, FetchError, MutationError, PlaylistId, TrackCollection,
};

// ============================================================================
// ICollectionProvider trait
// ============================================================================

/// Port trait for collection operations against a music provider
///
/// ## Implementation Notes
///
/// - `fetch_collection` must return a collection de-duplicated by track ID
///   and enriched with audio features and genres.
/// - An authorization rejection is answered with at most one call to the
///   token refresh per logical operation.
/// - Requests are issued one at a time; implementations must not fan out
///   concurrent requests with the same credential.
#[async_trait::async_trait]
pub trait ICollectionProvider: Send + Sync {
    /// Retrieves every track of a collection
    ///
    /// # Arguments
    /// * `playlist` - The collection to read
    async fn fetch_collection(&self, playlist: &PlaylistId) -> Result<TrackCollection, FetchError>;

    /// Exchanges the refresh token for a new access token
    async fn refresh(&self) -> Result<(), AuthError>;

    /// Inserts `tracks` into a collection, in provider-sized batches
    async fn add_tracks(
        &self,
        playlist: &PlaylistId,
        tracks: &TrackCollection,
    ) -> Result<(), MutationError>;

    /// Removes `tracks` from a collection, in provider-sized batches
    async fn remove_tracks(
        &self,
        playlist: &PlaylistId,
        tracks: &TrackCollection,
    ) -> Result<(), MutationError>;
}

// ============================================================================
// ICollectionConnector trait
// ============================================================================

/// Builds a provider bound to one credential bundle
///
/// The orchestrator resolves credentials at the start of every run and
/// hands ownership of the bundle to the provider through this factory.
pub trait ICollectionConnector: Send + Sync {
    fn connect(&self, credentials: CredentialBundle) -> Box<dyn ICollectionProvider>;
}
