//! Playlist synchronization use case
//!
//! One run resolves credentials, fetches the current state of a playlist,
//! partitions it by age, removes the tracks selected by the configured
//! [`RemovalPolicy`] and hands back the recent tracks as the new snapshot.
//! Every step is sequential; the first failure aborts the run and no
//! snapshot is produced.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

use crate::domain::{
    partition_by_age, CredentialError, FetchError, MutationError, PlaylistId, RemovalPolicy,
    SecretRef, TrackCollection,
};
use crate::ports::{ICollectionConnector, ICollectionProvider, ICredentialStore};

// ============================================================================
// Errors
// ============================================================================

/// Stage of a run, reported with every failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStage {
    Credentials,
    Fetch,
    Mutation,
}

impl fmt::Display for SyncStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Credentials => "credentials",
            Self::Fetch => "fetch",
            Self::Mutation => "mutation",
        })
    }
}

/// Error aborting a run
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncRunError {
    #[error("credentials stage failed: {0}")]
    Credentials(#[from] CredentialError),

    #[error("fetch stage failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("mutation stage failed: {0}")]
    Mutation(#[from] MutationError),
}

impl SyncRunError {
    pub fn stage(&self) -> SyncStage {
        match self {
            Self::Credentials(_) => SyncStage::Credentials,
            Self::Fetch(_) => SyncStage::Fetch,
            Self::Mutation(_) => SyncStage::Mutation,
        }
    }
}

// ============================================================================
// Request / outcome
// ============================================================================

/// Inputs of a single run
#[derive(Debug, Clone)]
pub struct SyncRequest {
    pub playlist: PlaylistId,
    /// Snapshot returned by the previous successful run (empty on first run)
    pub previous: TrackCollection,
    /// Maximum age of a recent track
    pub cutoff: Duration,
    pub policy: RemovalPolicy,
    /// Reference instant for the age partition
    pub now: DateTime<Utc>,
}

impl SyncRequest {
    pub fn new(playlist: PlaylistId, previous: TrackCollection, cutoff: Duration) -> Self {
        Self {
            playlist,
            previous,
            cutoff,
            policy: RemovalPolicy::default(),
            now: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: RemovalPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }
}

/// Summary of a successful run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncReport {
    pub run_id: Uuid,
    pub playlist: PlaylistId,
    pub policy: RemovalPolicy,
    /// Distinct tracks returned by the fetch
    pub fetched: usize,
    pub recent: usize,
    pub stale: usize,
    /// Tracks deleted upstream, in request order
    pub removed: TrackCollection,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// New snapshot plus the report of the run that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct SyncOutcome {
    pub snapshot: TrackCollection,
    pub report: SyncReport,
}

// ============================================================================
// Use case
// ============================================================================

/// Composes credential resolution, fetch, reconciliation and mutation
pub struct SyncPlaylistUseCase {
    credential_store: Arc<dyn ICredentialStore>,
    connector: Arc<dyn ICollectionConnector>,
    secret: SecretRef,
}

impl SyncPlaylistUseCase {
    /// Creates a new SyncPlaylistUseCase
    ///
    /// # Arguments
    ///
    /// * `credential_store` - Backend resolving the credential bundle
    /// * `connector` - Binds the bundle to a collection provider
    /// * `secret` - Which secret to resolve at the start of every run
    pub fn new(
        credential_store: Arc<dyn ICredentialStore>,
        connector: Arc<dyn ICollectionConnector>,
        secret: SecretRef,
    ) -> Self {
        Self {
            credential_store,
            connector,
            secret,
        }
    }

    /// Executes one sync run
    ///
    /// Sequence: resolve credentials, fetch, partition by age, select the
    /// removable set per `request.policy`, remove it upstream (skipped when
    /// empty), return the recent partition as the new snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SyncRunError`] tagged with the failing stage. A failed run
    /// never yields a snapshot.
    pub async fn run(&self, request: SyncRequest) -> Result<SyncOutcome, SyncRunError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "sync_run",
            run_id = %run_id,
            playlist = %request.playlist
        );
        self.run_inner(run_id, request).instrument(span).await
    }

    async fn run_inner(
        &self,
        run_id: Uuid,
        request: SyncRequest,
    ) -> Result<SyncOutcome, SyncRunError> {
        let started_at = Utc::now();
        let SyncRequest {
            playlist,
            previous,
            cutoff,
            policy,
            now,
        } = request;

        let provider = self.connect().await?;

        let current = provider
            .fetch_collection(&playlist)
            .await
            .inspect_err(|e| warn!(error = %e, "Fetch failed"))?;
        let fetched = current.len();

        let partition = partition_by_age(current, cutoff, now);
        debug!(
            recent = partition.recent.len(),
            stale = partition.stale.len(),
            "Partitioned collection by age"
        );

        let removed = policy.select(&previous, &partition);
        if removed.is_empty() {
            debug!(policy = %policy, "Nothing to remove");
        } else {
            info!(policy = %policy, count = removed.len(), "Removing tracks");
            provider
                .remove_tracks(&playlist, &removed)
                .await
                .inspect_err(|e| warn!(error = %e, "Removal failed"))?;
        }

        let report = SyncReport {
            run_id,
            playlist,
            policy,
            fetched,
            recent: partition.recent.len(),
            stale: partition.stale.len(),
            removed,
            started_at,
            finished_at: Utc::now(),
        };

        info!(
            fetched = report.fetched,
            recent = report.recent,
            removed = report.removed.len(),
            "Sync run completed"
        );

        Ok(SyncOutcome {
            snapshot: partition.recent,
            report,
        })
    }

    /// Fetches a playlist without reconciling or mutating it
    pub async fn fetch(&self, playlist: &PlaylistId) -> Result<TrackCollection, SyncRunError> {
        let provider = self.connect().await?;
        Ok(provider.fetch_collection(playlist).await?)
    }

    /// Moves `tracks` from `source` to `target`
    ///
    /// The tracks are added to `target` first; they are only removed from
    /// `source` once every insert has succeeded.
    pub async fn promote(
        &self,
        source: &PlaylistId,
        target: &PlaylistId,
        tracks: &TrackCollection,
    ) -> Result<(), SyncRunError> {
        if tracks.is_empty() {
            debug!("No tracks to promote");
            return Ok(());
        }

        let provider = self.connect().await?;
        info!(
            source = %source,
            target = %target,
            count = tracks.len(),
            "Promoting tracks"
        );
        provider.add_tracks(target, tracks).await?;
        provider.remove_tracks(source, tracks).await?;
        Ok(())
    }

    async fn connect(&self) -> Result<Box<dyn ICollectionProvider>, SyncRunError> {
        debug!(secret = %self.secret, "Resolving credentials");
        let bundle = self
            .credential_store
            .get(&self.secret)
            .await
            .inspect_err(|e| warn!(error = %e, "Credential lookup failed"))?;
        Ok(self.connector.connect(bundle))
    }
}
