//! Promote command - Move tracks from one playlist to another
//!
//! Tracks are named by URI. They are added to the target first and only
//! removed from the source once every insert succeeded.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;

use tracknet_core::domain::{Track, TrackCollection, TrackId};

use super::{parse_playlist, CommandContext};
use crate::output::plural;

#[derive(Debug, Args)]
pub struct PromoteCommand {
    /// Playlist the tracks are taken from
    #[arg(long = "from")]
    pub source: String,

    /// Playlist the tracks are added to
    #[arg(long = "to")]
    pub target: String,

    /// Track URIs, e.g. spotify:track:4uLU6hMCjMI75M1A2tKUQC
    #[arg(required = true)]
    pub uris: Vec<String>,
}

impl PromoteCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let formatter = ctx.formatter();
        let source = parse_playlist(&self.source)?;
        let target = parse_playlist(&self.target)?;
        let tracks = tracks_from_uris(&self.uris)?;

        ctx.use_case()?.promote(&source, &target, &tracks).await?;

        if ctx.format.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": true,
                "source": source.as_str(),
                "target": target.as_str(),
                "promoted": self.uris,
            }));
        } else {
            formatter.success(&format!(
                "Moved {} from {} to {}",
                plural(tracks.len(), "track"),
                source,
                target
            ));
        }
        Ok(())
    }
}

/// Builds mutation-only tracks; the id is the last `:` segment of the URI
fn tracks_from_uris(uris: &[String]) -> Result<TrackCollection> {
    let now = Utc::now();
    let mut tracks: TrackCollection = uris
        .iter()
        .map(|uri| -> Result<Track> {
            let id = uri.rsplit(':').next().unwrap_or_default();
            let id = TrackId::new(id.to_string())
                .with_context(|| format!("Invalid track URI '{uri}'"))?;
            Ok(Track::new(id, uri.clone(), "", "", "", now))
        })
        .collect::<Result<Vec<_>>>()?
        .into();
    tracks.dedup_by_id();
    Ok(tracks)
}
