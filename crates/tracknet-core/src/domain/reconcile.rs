//! Reconciliation of a fetched collection against time and prior state
//!
//! Two independent, pure operations:
//! - [`partition_by_age`] splits a collection into recent and stale tracks
//! - [`removable_set`] computes the tracks of a previous snapshot that are
//!   absent from the current one
//!
//! Which of the two drives upstream removal is decided by a
//! [`RemovalPolicy`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::track::TrackCollection;

/// Result of [`partition_by_age`]
///
/// Every source track lands in exactly one side.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimePartition {
    /// Tracks added no longer than the cutoff before `now`
    pub recent: TrackCollection,
    /// Tracks added strictly earlier than the cutoff
    pub stale: TrackCollection,
}

impl TimePartition {
    /// Total number of tracks across both sides
    pub fn len(&self) -> usize {
        self.recent.len() + self.stale.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recent.is_empty() && self.stale.is_empty()
    }
}

/// Splits `collection` by the age of each track relative to `now`.
///
/// A track is recent when `now - added_at <= cutoff`. Both sides are ordered
/// by ascending `added_at`; equal timestamps keep their fetch order.
pub fn partition_by_age(
    collection: TrackCollection,
    cutoff: Duration,
    now: DateTime<Utc>,
) -> TimePartition {
    let mut tracks = collection.into_vec();
    // `sort_by_key` is stable
    tracks.sort_by_key(|t| t.added_at);

    let (recent, stale): (Vec<_>, Vec<_>) = tracks
        .into_iter()
        .partition(|t| now.signed_duration_since(t.added_at) <= cutoff);

    TimePartition {
        recent: recent.into(),
        stale: stale.into(),
    }
}

/// Tracks of `previous` whose `id` does not appear in `current`, in
/// `previous` order.
pub fn removable_set(previous: &TrackCollection, current: &TrackCollection) -> TrackCollection {
    let current_ids = current.ids();
    previous
        .iter()
        .filter(|t| !current_ids.contains(&t.id))
        .cloned()
        .collect()
}

// ============================================================================
// RemovalPolicy
// ============================================================================

/// Which computed set a sync run deletes from the source collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalPolicy {
    /// Tracks of the previous snapshot missing from the new recent set
    #[default]
    SnapshotDiff,
    /// The stale side of the fresh partition
    Stale,
    /// Never remove anything
    None,
}

impl RemovalPolicy {
    /// All accepted policy names
    pub const NAMES: &'static [&'static str] = &["snapshot_diff", "stale", "none"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SnapshotDiff => "snapshot_diff",
            Self::Stale => "stale",
            Self::None => "none",
        }
    }

    /// Picks the tracks to remove for this policy
    pub fn select(&self, previous: &TrackCollection, partition: &TimePartition) -> TrackCollection {
        match self {
            Self::SnapshotDiff => removable_set(previous, &partition.recent),
            Self::Stale => partition.stale.clone(),
            Self::None => TrackCollection::new(),
        }
    }
}

impl fmt::Display for RemovalPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RemovalPolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "snapshot_diff" => Ok(Self::SnapshotDiff),
            "stale" => Ok(Self::Stale),
            "none" => Ok(Self::None),
            other => Err(DomainError::InvalidRemovalPolicy(other.to_string())),
        }
    }
}
