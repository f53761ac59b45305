//! Fetch command - Print a playlist without modifying it

use anyhow::Result;
use clap::Args;
use tracing::info;

use tracknet_core::domain::Track;

use super::CommandContext;
use crate::output::{plural, to_json};

#[derive(Debug, Args)]
pub struct FetchCommand {
    /// Playlist to fetch (defaults to sync.playlist_id)
    #[arg(long)]
    pub playlist: Option<String>,
}

impl FetchCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let formatter = ctx.formatter();
        let playlist = ctx.playlist(self.playlist.as_deref())?;

        let collection = ctx.use_case()?.fetch(&playlist).await?;
        info!(playlist = %playlist, tracks = collection.len(), "Fetched playlist");

        if ctx.format.is_json() {
            formatter.print_json(&to_json(&collection)?);
            return Ok(());
        }

        formatter.success(&format!(
            "{} in {}",
            plural(collection.len(), "track"),
            playlist
        ));
        for track in collection.iter() {
            formatter.info(&track_line(track));
        }
        Ok(())
    }
}

/// `added  name - artist  [genres]`
fn track_line(track: &Track) -> String {
    format!(
        "{}  {} - {}  [{}]",
        track.added_at.format("%Y-%m-%d"),
        track.name,
        track.artist,
        track.genres.join(", ")
    )
}
