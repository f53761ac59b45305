//! Domain error types
//!
//! This module defines the error taxonomy shared by the domain, the port
//! traits and the adapters:
//! - [`DomainError`] for validation failures of domain values
//! - [`AuthError`] for token refresh failures
//! - [`FetchError`] for collection retrieval failures
//! - [`MutationError`] for batched add/remove failures
//! - [`CredentialError`] for credential resolution failures

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid track identifier
    #[error("Invalid track ID: {0}")]
    InvalidTrackId(String),

    /// Invalid playlist identifier
    #[error("Invalid playlist ID: {0}")]
    InvalidPlaylistId(String),

    /// Unknown removal policy name
    #[error("Invalid removal policy: {0}")]
    InvalidRemovalPolicy(String),
}

/// Errors raised while exchanging a refresh token for a new access token
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The token endpoint answered with a non-success status or an
    /// unparseable body. No further authorized calls are possible.
    #[error("Refresh token rejected: {0}")]
    RefreshRejected(String),

    /// The token endpoint could not be reached
    #[error("Token endpoint unreachable: {0}")]
    Transport(String),
}

/// Errors raised while fetching a collection
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Network or transport level failure (including exhausted 429 retries)
    #[error("Transport error: {0}")]
    Transport(String),

    /// The response body was missing expected fields
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// The request was still unauthorized after one token refresh
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The page ceiling was reached before the collection ended
    #[error("Page limit of {max_pages} exceeded while fetching {resource}")]
    PageLimitExceeded {
        /// Collection being fetched
        resource: String,
        /// Configured ceiling
        max_pages: u32,
    },

    /// The token refresh triggered by a 401 failed
    #[error("Token refresh failed: {0}")]
    Auth(#[from] AuthError),
}

/// Errors raised while applying add/remove batches
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MutationError {
    /// A batch was refused by the provider. Batches after `chunk_index`
    /// were not attempted.
    #[error("Mutation batch {chunk_index} rejected: {reason}")]
    Rejected {
        /// Zero-based index of the first failed batch
        chunk_index: usize,
        /// Provider status or message
        reason: String,
    },

    /// A batch could not be delivered
    #[error("Mutation batch {chunk_index} failed in transport: {reason}")]
    Transport {
        /// Zero-based index of the failed batch
        chunk_index: usize,
        /// Underlying transport message
        reason: String,
    },

    /// The token refresh triggered by a 401 failed
    #[error("Token refresh failed: {0}")]
    Auth(#[from] AuthError),
}

impl MutationError {
    /// Index of the batch that failed, if the failure is tied to one
    pub fn chunk_index(&self) -> Option<usize> {
        match self {
            Self::Rejected { chunk_index, .. } | Self::Transport { chunk_index, .. } => {
                Some(*chunk_index)
            }
            Self::Auth(_) => None,
        }
    }
}

/// Errors raised while resolving credentials from a secret backend
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// The secret (or one of its keys) does not exist
    #[error("Credential not found: {0}")]
    NotFound(String),

    /// The secret exists but could not be decoded into a bundle
    #[error("Malformed credential: {0}")]
    Malformed(String),

    /// The backend itself failed
    #[error("Credential backend error: {0}")]
    Backend(String),
}
