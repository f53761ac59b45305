//! Credentials commands - Provision and check Spotify credentials
//!
//! Provides the `tracknet credentials` CLI subcommands which:
//! 1. `store`  - Copies the bundle from the `spot_*` environment variables
//!    into the system keyring.
//! 2. `clear`  - Removes the bundle from the keyring.
//! 3. `check`  - Resolves the bundle from the configured backend and
//!    exchanges the refresh token once to prove it works.

use anyhow::{Context, Result};
use clap::Subcommand;
use tracing::{info, warn};

use tracknet_core::domain::CredentialBundle;
use tracknet_core::ports::{ICollectionProvider, ICredentialStore};
use tracknet_spotify::credentials::{EnvCredentialStore, KeyringCredentialStore};
use tracknet_spotify::provider::SpotifyConnector;

use super::CommandContext;

#[derive(Debug, Subcommand)]
pub enum CredentialsCommand {
    /// Store the bundle from the environment in the keyring
    Store,
    /// Remove the bundle from the keyring
    Clear,
    /// Resolve the bundle and verify the refresh token
    Check,
}

impl CredentialsCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        match self {
            CredentialsCommand::Store => execute_store(ctx).await,
            CredentialsCommand::Clear => execute_clear(ctx),
            CredentialsCommand::Check => execute_check(ctx).await,
        }
    }
}

async fn execute_store(ctx: &CommandContext) -> Result<()> {
    let formatter = ctx.formatter();
    let secret = ctx.secret();

    let bundle = EnvCredentialStore::new()
        .get(&secret)
        .await
        .context("Failed to read credentials from the environment")?;
    KeyringCredentialStore::new()
        .store(&secret, &bundle)
        .context("Failed to store credentials in keyring")?;

    if ctx.format.is_json() {
        formatter.print_json(&serde_json::json!({"success": true, "secret": secret.to_string()}));
    } else {
        formatter.success(&format!("Stored credentials for {secret} in the keyring"));
    }
    Ok(())
}

fn execute_clear(ctx: &CommandContext) -> Result<()> {
    let formatter = ctx.formatter();
    let secret = ctx.secret();

    KeyringCredentialStore::new()
        .clear(&secret)
        .context("Failed to clear credentials from keyring")?;

    if ctx.format.is_json() {
        formatter.print_json(&serde_json::json!({"success": true, "secret": secret.to_string()}));
    } else {
        formatter.success(&format!("Removed credentials for {secret}"));
    }
    Ok(())
}

async fn execute_check(ctx: &CommandContext) -> Result<()> {
    let formatter = ctx.formatter();
    let secret = ctx.secret();
    let backend = ctx.config.credentials.backend.as_str();

    let bundle = ctx
        .credential_store()?
        .get(&secret)
        .await
        .with_context(|| format!("Failed to resolve {secret} from the {backend} backend"))?;
    info!(secret = %secret, backend, "Resolved credentials");

    let provider = SpotifyConnector::from_config(&ctx.config)?.provider(bundle.clone());
    provider
        .refresh()
        .await
        .context("Refresh token was not accepted")?;

    let refreshed = provider.credentials().await;
    match after_refresh(backend, &bundle, &refreshed) {
        AfterRefresh::Store => {
            KeyringCredentialStore::new()
                .store(&secret, &refreshed)
                .context("Failed to update credentials in keyring")?;
        }
        AfterRefresh::ReportRotation => {
            warn!(secret = %secret, backend, "Refresh token was rotated and cannot be written back");
            formatter.warn(
                "The refresh token was rotated; update spot_REF or switch to the keyring backend",
            );
        }
        AfterRefresh::Nothing => {}
    }

    if ctx.format.is_json() {
        formatter.print_json(&serde_json::json!({
            "valid": true,
            "secret": secret.to_string(),
            "backend": backend,
        }));
    } else {
        formatter.success("Credentials are valid");
        formatter.field("Secret", &secret.to_string());
        formatter.field("Backend", backend);
    }
    Ok(())
}

/// What `check` does with the bundle after a successful refresh
#[derive(Debug, PartialEq, Eq)]
enum AfterRefresh {
    /// Write the refreshed bundle back to the keyring
    Store,
    /// The backend is read-only and the refresh token changed
    ReportRotation,
    Nothing,
}

fn after_refresh(
    backend: &str,
    resolved: &CredentialBundle,
    refreshed: &CredentialBundle,
) -> AfterRefresh {
    if backend == "keyring" {
        AfterRefresh::Store
    } else if resolved.refresh_token != refreshed.refresh_token {
        AfterRefresh::ReportRotation
    } else {
        AfterRefresh::Nothing
    }
}
