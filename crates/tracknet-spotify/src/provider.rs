//! SpotifyCollectionProvider - ICollectionProvider implementation for the Spotify Web API
//!
//! Wraps a shared [`SpotifyClient`] and delegates to the fetch and mutate
//! modules to fulfil the [`ICollectionProvider`] port contract.
//!
//! ## Design Notes
//!
//! - The fetcher and the mutator share one [`TokenManager`] through the
//!   client, so a refresh triggered by either is seen by both.
//! - [`SpotifyConnector`] builds a fresh provider for every credential
//!   bundle; nothing outlives a run.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use oauth2::TokenUrl;
use tracing::debug;

use tracknet_core::config::Config;
use tracknet_core::domain::{
    AuthError, CredentialBundle, FetchError, MutationError, PlaylistId, TrackCollection,
};
use tracknet_core::ports::{ICollectionConnector, ICollectionProvider};

use crate::auth::TokenManager;
use crate::client::SpotifyClient;
use crate::fetch::PaginatedFetcher;
use crate::mutate::BatchMutator;
use crate::rate_limit::RetryPolicy;

// ============================================================================
// SpotifySettings
// ============================================================================

/// Endpoint and batching settings shared by every provider built by a connector
#[derive(Debug, Clone)]
pub struct SpotifySettings {
    pub api_base_url: String,
    pub token_url: TokenUrl,
    pub redirect_uri: String,
    pub page_size: u32,
    pub max_pages: u32,
    pub mutation_batch_size: usize,
    pub artist_batch_size: usize,
    pub retry: RetryPolicy,
}

impl SpotifySettings {
    /// Extracts the provider settings from the application configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let token_url = TokenUrl::new(config.spotify.token_url.clone())
            .with_context(|| format!("Invalid token URL: {}", config.spotify.token_url))?;

        Ok(Self {
            api_base_url: config.spotify.api_base_url.clone(),
            token_url,
            redirect_uri: config.spotify.redirect_uri.clone(),
            page_size: config.spotify.page_size,
            max_pages: config.spotify.max_pages,
            mutation_batch_size: config.spotify.mutation_batch_size,
            artist_batch_size: config.spotify.artist_batch_size,
            retry: RetryPolicy::from(&config.rate_limiting),
        })
    }
}

// ============================================================================
// SpotifyCollectionProvider
// ============================================================================

/// Collection provider that delegates to the Spotify Web API
pub struct SpotifyCollectionProvider {
    client: Arc<SpotifyClient>,
    fetcher: PaginatedFetcher,
    mutator: BatchMutator,
}

impl SpotifyCollectionProvider {
    /// Creates a provider with the page and batch sizes of `settings`
    pub fn new(client: Arc<SpotifyClient>, settings: &SpotifySettings) -> Self {
        let fetcher = PaginatedFetcher::new(Arc::clone(&client))
            .with_page_size(settings.page_size)
            .with_max_pages(settings.max_pages)
            .with_artist_batch_size(settings.artist_batch_size);
        let mutator =
            BatchMutator::new(Arc::clone(&client)).with_batch_size(settings.mutation_batch_size);

        Self {
            client,
            fetcher,
            mutator,
        }
    }

    /// Current credential bundle, including tokens refreshed during the run
    pub async fn credentials(&self) -> CredentialBundle {
        self.client.tokens().credentials().await
    }
}

#[async_trait::async_trait]
impl ICollectionProvider for SpotifyCollectionProvider {
    async fn fetch_collection(&self, playlist: &PlaylistId) -> Result<TrackCollection, FetchError> {
        debug!(playlist = %playlist, "SpotifyCollectionProvider::fetch_collection");
        self.fetcher.fetch_collection(playlist).await
    }

    async fn refresh(&self) -> Result<(), AuthError> {
        self.client.tokens().refresh().await
    }

    async fn add_tracks(
        &self,
        playlist: &PlaylistId,
        tracks: &TrackCollection,
    ) -> Result<(), MutationError> {
        debug!(playlist = %playlist, count = tracks.len(), "SpotifyCollectionProvider::add_tracks");
        self.mutator.add(playlist, tracks).await
    }

    async fn remove_tracks(
        &self,
        playlist: &PlaylistId,
        tracks: &TrackCollection,
    ) -> Result<(), MutationError> {
        debug!(playlist = %playlist, count = tracks.len(), "SpotifyCollectionProvider::remove_tracks");
        self.mutator.remove(playlist, tracks).await
    }
}

// ============================================================================
// SpotifyConnector
// ============================================================================

/// Builds a [`SpotifyCollectionProvider`] per credential bundle
pub struct SpotifyConnector {
    http: reqwest::Client,
    settings: SpotifySettings,
}

impl SpotifyConnector {
    pub fn new(http: reqwest::Client, settings: SpotifySettings) -> Self {
        Self { http, settings }
    }

    /// Creates a connector whose HTTP client honours `spotify.request_timeout_secs`
    pub fn from_config(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.spotify.request_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self::new(http, SpotifySettings::from_config(config)?))
    }

    pub fn settings(&self) -> &SpotifySettings {
        &self.settings
    }

    /// Like [`ICollectionConnector::connect`], but keeps the concrete type
    pub fn provider(&self, credentials: CredentialBundle) -> SpotifyCollectionProvider {
        let tokens = Arc::new(TokenManager::new(
            credentials,
            self.settings.token_url.clone(),
            self.settings.redirect_uri.clone(),
            self.http.clone(),
        ));
        let client = SpotifyClient::with_base_url(
            self.http.clone(),
            tokens,
            self.settings.api_base_url.clone(),
        )
        .with_retry_policy(self.settings.retry);

        SpotifyCollectionProvider::new(Arc::new(client), &self.settings)
    }
}

impl ICollectionConnector for SpotifyConnector {
    fn connect(&self, credentials: CredentialBundle) -> Box<dyn ICollectionProvider> {
        Box::new(self.provider(credentials))
    }
}

// ============================================================================
// Tests
// ============================================================================
