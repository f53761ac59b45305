//! tracknet Spotify - Spotify Web API client
//!
//! Provides async client for:
//! - Access token refresh (OAuth2 refresh-token grant)
//! - Paginated playlist retrieval with audio-feature and genre enrichment
//! - Batched playlist mutations (add/remove)
//! - Credential resolution from the environment or the system keyring
//!
//! ## Modules
//!
//! - [`auth`] - Token manager, the single owner of the access token
//! - [`client`] - Spotify Web API HTTP client
//! - [`fetch`] - Paginated collection retrieval and enrichment
//! - [`mutate`] - Chunked add/remove requests
//! - [`credentials`] - `ICredentialStore` adapters
//! - [`provider`] - `ICollectionProvider` implementation

pub mod auth;
pub mod client;
pub mod credentials;
pub mod fetch;
pub mod mutate;
pub mod provider;
pub mod rate_limit;

use thiserror::Error;
use tracknet_core::domain::{AuthError, FetchError, MutationError};

/// Errors that can occur when communicating with the Spotify Web API
#[derive(Debug, Error)]
pub enum SpotifyError {
    /// The request was still rejected with 401 after a token refresh
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Any other non-success status
    #[error("HTTP {status}: {body}")]
    Status {
        /// Response status code
        status: u16,
        /// Response body, as text
        body: String,
    },

    /// 429 responses kept coming after every allowed retry
    #[error("Too many requests: gave up after {attempts} attempts")]
    TooManyRequests {
        /// Requests sent, including the first
        attempts: u32,
    },

    /// A network-level error occurred
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// The API response could not be parsed or was malformed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Token refresh failed
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl SpotifyError {
    /// Maps the error of one mutation chunk onto the domain taxonomy
    pub fn into_mutation_error(self, chunk_index: usize) -> MutationError {
        match self {
            Self::NetworkError(_) | Self::TooManyRequests { .. } => MutationError::Transport {
                chunk_index,
                reason: self.to_string(),
            },
            Self::Auth(e) => MutationError::Auth(e),
            Self::Unauthorized(_) | Self::Status { .. } | Self::InvalidResponse(_) => {
                MutationError::Rejected {
                    chunk_index,
                    reason: self.to_string(),
                }
            }
        }
    }
}

impl From<SpotifyError> for FetchError {
    fn from(e: SpotifyError) -> Self {
        match e {
            SpotifyError::Unauthorized(msg) => FetchError::Unauthorized(msg),
            SpotifyError::InvalidResponse(msg) => FetchError::Malformed(msg),
            SpotifyError::Auth(e) => FetchError::Auth(e),
            SpotifyError::Status { .. }
            | SpotifyError::TooManyRequests { .. }
            | SpotifyError::NetworkError(_) => FetchError::Transport(e.to_string()),
        }
    }
}
