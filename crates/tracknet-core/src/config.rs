//! Configuration module for tracknet.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::RemovalPolicy;

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for tracknet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub spotify: SpotifyConfig,
    pub credentials: CredentialsConfig,
    pub sync: SyncConfig,
    pub rate_limiting: RateLimitingConfig,
    pub logging: LoggingConfig,
}

/// Provider API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotifyConfig {
    /// Base URL of the Web API, without a trailing slash.
    pub api_base_url: String,
    /// OAuth token endpoint used for the refresh grant.
    pub token_url: String,
    /// Redirect URI registered with the application.
    pub redirect_uri: String,
    /// Items requested per collection page (provider maximum is 100).
    pub page_size: u32,
    /// Hard ceiling on pages fetched for a single collection.
    pub max_pages: u32,
    /// URIs per add/remove call (provider maximum is 100).
    pub mutation_batch_size: usize,
    /// Artist ids per metadata lookup (provider maximum is 50).
    pub artist_batch_size: usize,
    pub request_timeout_secs: u64,
}

/// Where the credential bundle comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    /// Backend: `env` or `keyring`.
    pub backend: String,
    /// Name of the secret holding the four credential strings.
    pub secret_name: String,
    pub region: String,
}

/// Synchronization run settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Source playlist. `None` until configured or passed on the command line.
    pub playlist_id: Option<String>,
    /// Tracks older than this many days are stale.
    pub cutoff_days: u32,
    pub removal_policy: RemovalPolicy,
    /// JSON file holding the snapshot of the previous run.
    pub snapshot_path: PathBuf,
}

/// HTTP 429 handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitingConfig {
    /// Throttled retries allowed per request before giving up.
    pub max_retries: u32,
    /// Wait used when a 429 carries no usable `Retry-After` header.
    pub default_retry_after_secs: u64,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Output format: `pretty` or `json`.
    pub format: String,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/tracknet/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("tracknet")
            .join("config.yaml")
    }

    /// The cutoff as a duration.
    pub fn cutoff(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.sync.cutoff_days))
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.spotify.com/v1".to_string(),
            token_url: "https://accounts.spotify.com/api/token".to_string(),
            redirect_uri: "http://localhost:8888/callback".to_string(),
            page_size: 100,
            max_pages: 1000,
            mutation_batch_size: 100,
            artist_batch_size: 50,
            request_timeout_secs: 30,
        }
    }
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            backend: "env".to_string(),
            secret_name: "spotify_35".to_string(),
            region: "us-east-2".to_string(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("tracknet");
        Self {
            playlist_id: None,
            cutoff_days: 30,
            removal_policy: RemovalPolicy::default(),
            snapshot_path: data_dir.join("snapshot.json"),
        }
    }
}

impl Default for RateLimitingConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            default_retry_after_secs: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"sync.cutoff_days"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid values for `logging.format`.
const VALID_LOG_FORMATS: &[&str] = &["pretty", "json"];

/// Valid values for `credentials.backend`.
pub const VALID_CREDENTIAL_BACKENDS: &[&str] = &["env", "keyring"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let mut push = |field: &str, message: String| {
            errors.push(ValidationError {
                field: field.into(),
                message,
            });
        };

        // --- spotify ---
        for (field, value) in [
            ("spotify.api_base_url", &self.spotify.api_base_url),
            ("spotify.token_url", &self.spotify.token_url),
        ] {
            if !(value.starts_with("http://") || value.starts_with("https://")) {
                push(field, format!("'{value}' is not an http(s) URL"));
            }
        }
        if self.spotify.page_size == 0 || self.spotify.page_size > 100 {
            push("spotify.page_size", "must be in range 1..=100".into());
        }
        if self.spotify.max_pages == 0 {
            push("spotify.max_pages", "must be greater than 0".into());
        }
        if self.spotify.mutation_batch_size == 0 || self.spotify.mutation_batch_size > 100 {
            push("spotify.mutation_batch_size", "must be in range 1..=100".into());
        }
        if self.spotify.artist_batch_size == 0 || self.spotify.artist_batch_size > 50 {
            push("spotify.artist_batch_size", "must be in range 1..=50".into());
        }
        if self.spotify.request_timeout_secs == 0 {
            push("spotify.request_timeout_secs", "must be greater than 0".into());
        }

        // --- credentials ---
        if !VALID_CREDENTIAL_BACKENDS.contains(&self.credentials.backend.as_str()) {
            push(
                "credentials.backend",
                format!(
                    "invalid backend '{}'; valid options: {}",
                    self.credentials.backend,
                    VALID_CREDENTIAL_BACKENDS.join(", ")
                ),
            );
        }
        if self.credentials.secret_name.trim().is_empty() {
            push("credentials.secret_name", "must not be empty".into());
        }

        // --- sync ---
        if self.sync.cutoff_days == 0 {
            push("sync.cutoff_days", "must be greater than 0".into());
        }
        if let Some(id) = &self.sync.playlist_id {
            if let Err(e) = crate::domain::PlaylistId::new(id.clone()) {
                push("sync.playlist_id", e.to_string());
            }
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            push(
                "logging.level",
                format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            );
        }
        if !VALID_LOG_FORMATS.contains(&self.logging.format.as_str()) {
            push(
                "logging.format",
                format!(
                    "invalid format '{}'; valid options: {}",
                    self.logging.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            );
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use tracknet_core::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .sync_playlist_id("3ubgXaHeBn1CWLUZPXvqkj")
///     .sync_cutoff_days(14)
///     .logging_level("debug")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- spotify ---

    pub fn spotify_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.spotify.api_base_url = url.into();
        self
    }

    pub fn spotify_token_url(mut self, url: impl Into<String>) -> Self {
        self.config.spotify.token_url = url.into();
        self
    }

    pub fn spotify_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.config.spotify.redirect_uri = uri.into();
        self
    }

    pub fn spotify_page_size(mut self, n: u32) -> Self {
        self.config.spotify.page_size = n;
        self
    }

    pub fn spotify_max_pages(mut self, n: u32) -> Self {
        self.config.spotify.max_pages = n;
        self
    }

    pub fn spotify_mutation_batch_size(mut self, n: usize) -> Self {
        self.config.spotify.mutation_batch_size = n;
        self
    }

    pub fn spotify_artist_batch_size(mut self, n: usize) -> Self {
        self.config.spotify.artist_batch_size = n;
        self
    }

    pub fn spotify_request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.spotify.request_timeout_secs = secs;
        self
    }

    // --- credentials ---

    pub fn credentials_backend(mut self, backend: impl Into<String>) -> Self {
        self.config.credentials.backend = backend.into();
        self
    }

    pub fn credentials_secret_name(mut self, name: impl Into<String>) -> Self {
        self.config.credentials.secret_name = name.into();
        self
    }

    pub fn credentials_region(mut self, region: impl Into<String>) -> Self {
        self.config.credentials.region = region.into();
        self
    }

    // --- sync ---

    pub fn sync_playlist_id(mut self, id: impl Into<String>) -> Self {
        self.config.sync.playlist_id = Some(id.into());
        self
    }

    pub fn sync_cutoff_days(mut self, days: u32) -> Self {
        self.config.sync.cutoff_days = days;
        self
    }

    pub fn sync_removal_policy(mut self, policy: RemovalPolicy) -> Self {
        self.config.sync.removal_policy = policy;
        self
    }

    pub fn sync_snapshot_path(mut self, path: PathBuf) -> Self {
        self.config.sync.snapshot_path = path;
        self
    }

    // --- rate_limiting ---

    pub fn rate_limiting_max_retries(mut self, n: u32) -> Self {
        self.config.rate_limiting.max_retries = n;
        self
    }

    pub fn rate_limiting_default_retry_after_secs(mut self, secs: u64) -> Self {
        self.config.rate_limiting.default_retry_after_secs = secs;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn logging_format(mut self, format: impl Into<String>) -> Self {
        self.config.logging.format = format.into();
        self
    }

    /// Consume the builder and return the final [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Consume the builder, validate, and return the [`Config`] or errors.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let errors = self.config.validate();
        if errors.is_empty() {
            Ok(self.config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
