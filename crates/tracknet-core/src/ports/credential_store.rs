//! Credential store port
//!
//! Resolves the four opaque secrets of a [`CredentialBundle`] from an
//! external secret backend. The core never writes credentials back.

use crate::domain::{CredentialBundle, CredentialError, SecretRef};

/// Port trait for secret backends
#[async_trait::async_trait]
pub trait ICredentialStore: Send + Sync {
    /// Returns the bundle stored under `secret`
    async fn get(&self, secret: &SecretRef) -> Result<CredentialBundle, CredentialError>;

    /// Re-reads the bundle from the backend, bypassing any cached value
    ///
    /// Backends without a cache can rely on the default, which is `get`.
    async fn refresh(&self, secret: &SecretRef) -> Result<CredentialBundle, CredentialError> {
        self.get(secret).await
    }
}
