//! Sync command - Fetch, reconcile and prune a playlist
//!
//! Provides the `tracknet sync` CLI command which:
//! 1. Loads the previous snapshot (a missing file means an empty one)
//! 2. Runs the sync use case with the configured removal policy
//! 3. Persists the new snapshot, only when the run succeeded
//! 4. Prints a summary

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Duration;
use clap::Args;
use tracing::{debug, info};

use tracknet_core::domain::{RemovalPolicy, TrackCollection};
use tracknet_core::usecases::{SyncReport, SyncRequest};

use super::CommandContext;
use crate::output::{plural, to_json};

#[derive(Debug, Args)]
pub struct SyncCommand {
    /// Playlist to sync (defaults to sync.playlist_id)
    #[arg(long)]
    pub playlist: Option<String>,

    /// Tracks added more than this many days ago are stale
    #[arg(long)]
    pub cutoff_days: Option<u32>,

    /// Which tracks to remove: snapshot_diff, stale or none
    #[arg(long)]
    pub policy: Option<RemovalPolicy>,

    /// Snapshot file (defaults to sync.snapshot_path)
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// Compute removals without deleting anything
    #[arg(long)]
    pub dry_run: bool,
}

impl SyncCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let formatter = ctx.formatter();
        let config = &ctx.config;

        let playlist = ctx.playlist(self.playlist.as_deref())?;
        let cutoff_days = self.cutoff_days.unwrap_or(config.sync.cutoff_days);
        if cutoff_days == 0 {
            anyhow::bail!("--cutoff-days must be greater than 0");
        }
        let policy = self.effective_policy(config.sync.removal_policy);
        let snapshot_path = self
            .snapshot
            .clone()
            .unwrap_or_else(|| config.sync.snapshot_path.clone());

        let previous = load_snapshot(&snapshot_path)?;
        info!(
            playlist = %playlist,
            cutoff_days,
            policy = %policy,
            previous = previous.len(),
            "Starting sync"
        );

        let request = SyncRequest::new(playlist, previous, Duration::days(i64::from(cutoff_days)))
            .with_policy(policy);
        let outcome = ctx.use_case()?.run(request).await?;

        if self.dry_run {
            debug!("Dry run, snapshot left untouched");
        } else {
            save_snapshot(&snapshot_path, &outcome.snapshot)?;
        }

        if ctx.format.is_json() {
            let mut json = to_json(&outcome.report)?;
            json["dry_run"] = self.dry_run.into();
            json["snapshot_path"] = snapshot_path.display().to_string().into();
            formatter.print_json(&json);
        } else {
            print_report(formatter.as_ref(), &outcome.report, self.dry_run);
            if !self.dry_run {
                formatter.info(&format!("Snapshot saved to {}", snapshot_path.display()));
            }
        }

        Ok(())
    }

    /// `--dry-run` always wins over `--policy` and the configured policy
    fn effective_policy(&self, configured: RemovalPolicy) -> RemovalPolicy {
        if self.dry_run {
            RemovalPolicy::None
        } else {
            self.policy.unwrap_or(configured)
        }
    }
}

fn print_report(
    formatter: &dyn crate::output::OutputFormatter,
    report: &SyncReport,
    dry_run: bool,
) {
    let elapsed = report.finished_at - report.started_at;
    formatter.success(&format!(
        "Synced {} in {:.1}s",
        report.playlist,
        elapsed.num_milliseconds() as f64 / 1000.0
    ));
    formatter.field("Fetched", &plural(report.fetched, "track"));
    formatter.field("Recent", &report.recent.to_string());
    formatter.field("Stale", &report.stale.to_string());
    formatter.field("Policy", report.policy.as_str());

    if dry_run {
        formatter.info("Dry run: no tracks were removed");
    } else if report.removed.is_empty() {
        formatter.field("Removed", "nothing");
    } else {
        formatter.field("Removed", &plural(report.removed.len(), "track"));
        for track in report.removed.iter() {
            formatter.info(&format!("  - {} ({})", track.name, track.artist));
        }
    }
}

/// Reads a snapshot file; a missing file is an empty snapshot
pub fn load_snapshot(path: &Path) -> Result<TrackCollection> {
    if !path.exists() {
        debug!(path = %path.display(), "No previous snapshot");
        return Ok(TrackCollection::new());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse snapshot {}", path.display()))
}

/// Writes a snapshot through a temporary file and a rename
pub fn save_snapshot(path: &Path, snapshot: &TrackCollection) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(snapshot).context("Failed to serialize snapshot")?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("Failed to replace snapshot {}", path.display()))?;

    debug!(path = %path.display(), tracks = snapshot.len(), "Saved snapshot");
    Ok(())
}
