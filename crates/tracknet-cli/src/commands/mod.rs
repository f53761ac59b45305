//! CLI subcommands and the wiring they share

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use tracknet_core::config::Config;
use tracknet_core::domain::{PlaylistId, SecretRef};
use tracknet_core::ports::ICredentialStore;
use tracknet_core::usecases::SyncPlaylistUseCase;
use tracknet_spotify::credentials::{EnvCredentialStore, KeyringCredentialStore};
use tracknet_spotify::provider::SpotifyConnector;

use crate::output::{get_formatter, OutputFormat, OutputFormatter};

pub mod config;
pub mod credentials;
pub mod fetch;
pub mod promote;
pub mod sync;

/// Loaded configuration and global flags handed to every command
pub struct CommandContext {
    pub config: Config,
    /// Where `config` was read from (or would be)
    pub config_path: PathBuf,
    pub format: OutputFormat,
}

impl CommandContext {
    pub fn formatter(&self) -> Box<dyn OutputFormatter> {
        get_formatter(self.format.is_json())
    }

    /// Secret reference from the `credentials` section
    pub fn secret(&self) -> SecretRef {
        SecretRef::new(
            self.config.credentials.secret_name.clone(),
            self.config.credentials.region.clone(),
        )
    }

    /// Credential store selected by `credentials.backend`
    pub fn credential_store(&self) -> Result<Arc<dyn ICredentialStore>> {
        match self.config.credentials.backend.as_str() {
            "env" => Ok(Arc::new(EnvCredentialStore::new())),
            "keyring" => Ok(Arc::new(KeyringCredentialStore::new())),
            other => bail!("Unknown credentials backend '{other}' (expected env or keyring)"),
        }
    }

    /// Wires the configured credential store and the Spotify connector
    pub fn use_case(&self) -> Result<SyncPlaylistUseCase> {
        let connector =
            SpotifyConnector::from_config(&self.config).context("Failed to set up Spotify client")?;
        Ok(SyncPlaylistUseCase::new(
            self.credential_store()?,
            Arc::new(connector),
            self.secret(),
        ))
    }

    /// `--playlist` if given, otherwise `sync.playlist_id`
    pub fn playlist(&self, flag: Option<&str>) -> Result<PlaylistId> {
        let raw = flag
            .map(str::to_string)
            .or_else(|| self.config.sync.playlist_id.clone())
            .context("No playlist given: pass --playlist or set sync.playlist_id")?;
        parse_playlist(&raw)
    }
}

pub fn parse_playlist(raw: &str) -> Result<PlaylistId> {
    raw.parse()
        .with_context(|| format!("Invalid playlist id '{raw}'"))
}

#[cfg(test)]
pub(crate) fn test_context(config: Config) -> CommandContext {
    CommandContext {
        config,
        config_path: PathBuf::from("/tmp/tracknet-test/config.yaml"),
        format: OutputFormat::Human,
    }
}
