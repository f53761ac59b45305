//! Credential store adapters
//!
//! - [`EnvCredentialStore`] reads the four secrets from environment variables
//! - [`KeyringCredentialStore`] keeps them as one JSON entry in the system
//!   keyring (GNOME Keyring, KDE Wallet, macOS Keychain)

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::{debug, info};

use tracknet_core::domain::{CredentialBundle, CredentialError, SecretRef};
use tracknet_core::ports::ICredentialStore;

/// Environment variable holding the client id
pub const ENV_CLIENT_ID: &str = "spot_clientID";
/// Environment variable holding the client secret
pub const ENV_CLIENT_SECRET: &str = "spot_clientSECRET";
/// Environment variable holding the access token
pub const ENV_ACCESS_TOKEN: &str = "spot_ACC";
/// Environment variable holding the refresh token
pub const ENV_REFRESH_TOKEN: &str = "spot_REF";

/// Keyring service name for storing credential bundles
const KEYRING_SERVICE: &str = "tracknet";

// ============================================================================
// EnvCredentialStore
// ============================================================================

/// Reads credentials from environment variables
///
/// The secret reference is only used in error messages: the variable names
/// are fixed.
#[derive(Debug, Default)]
pub struct EnvCredentialStore {
    /// Fixed variables instead of the process environment
    vars: Option<HashMap<String, String>>,
}

impl EnvCredentialStore {
    /// Reads from the process environment
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads from `vars` instead of the process environment
    pub fn with_vars(vars: HashMap<String, String>) -> Self {
        Self { vars: Some(vars) }
    }

    fn lookup(&self, key: &str) -> Option<String> {
        let value = match &self.vars {
            Some(vars) => vars.get(key).cloned(),
            None => std::env::var(key).ok(),
        };
        value.filter(|v| !v.is_empty())
    }
}

#[async_trait]
impl ICredentialStore for EnvCredentialStore {
    async fn get(&self, secret: &SecretRef) -> Result<CredentialBundle, CredentialError> {
        let require = |key: &str| {
            self.lookup(key).ok_or_else(|| {
                CredentialError::NotFound(format!("{secret}: environment variable {key} is not set"))
            })
        };

        let bundle = CredentialBundle::new(
            require(ENV_CLIENT_ID)?,
            require(ENV_CLIENT_SECRET)?,
            require(ENV_ACCESS_TOKEN)?,
            require(ENV_REFRESH_TOKEN)?,
        );
        debug!(secret = %secret, "Loaded credentials from environment");
        Ok(bundle)
    }
}

// ============================================================================
// KeyringCredentialStore
// ============================================================================

/// Stores and retrieves credential bundles from the system keyring
///
/// Bundles are serialized as JSON under the service name "tracknet" with
/// `<region>/<name>` of the secret reference as the username.
#[derive(Debug)]
pub struct KeyringCredentialStore {
    service: String,
}

impl Default for KeyringCredentialStore {
    fn default() -> Self {
        Self {
            service: KEYRING_SERVICE.to_string(),
        }
    }
}

impl KeyringCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a different keyring service name
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, secret: &SecretRef) -> Result<keyring::Entry, CredentialError> {
        keyring::Entry::new(&self.service, &secret.to_string())
            .map_err(|e| CredentialError::Backend(format!("keyring entry for {secret}: {e}")))
    }

    /// Stores `bundle` under `secret`, replacing any previous value
    pub fn store(&self, secret: &SecretRef, bundle: &CredentialBundle) -> Result<(), CredentialError> {
        let json = serde_json::to_string(bundle)
            .map_err(|e| CredentialError::Malformed(format!("serialize bundle: {e}")))?;

        self.entry(secret)?
            .set_password(&json)
            .map_err(|e| CredentialError::Backend(format!("store {secret}: {e}")))?;

        info!(secret = %secret, "Stored credentials in keyring");
        Ok(())
    }

    /// Removes the bundle stored under `secret`; absent entries are not an error
    pub fn clear(&self, secret: &SecretRef) -> Result<(), CredentialError> {
        match self.entry(secret)?.delete_credential() {
            Ok(()) => {
                info!(secret = %secret, "Cleared credentials from keyring");
                Ok(())
            }
            Err(keyring::Error::NoEntry) => {
                debug!(secret = %secret, "No credentials to clear");
                Ok(())
            }
            Err(e) => Err(CredentialError::Backend(format!("clear {secret}: {e}"))),
        }
    }
}

#[async_trait]
impl ICredentialStore for KeyringCredentialStore {
    async fn get(&self, secret: &SecretRef) -> Result<CredentialBundle, CredentialError> {
        match self.entry(secret)?.get_password() {
            Ok(json) => {
                let bundle = parse_bundle(&json)?;
                debug!(secret = %secret, "Loaded credentials from keyring");
                Ok(bundle)
            }
            Err(keyring::Error::NoEntry) => Err(CredentialError::NotFound(secret.to_string())),
            Err(e) => Err(CredentialError::Backend(format!("read {secret}: {e}"))),
        }
    }
}

/// Parses a stored bundle; every field must be present and non-empty
fn parse_bundle(json: &str) -> Result<CredentialBundle, CredentialError> {
    let bundle: CredentialBundle = serde_json::from_str(json)
        .map_err(|e| CredentialError::Malformed(format!("stored bundle is not valid JSON: {e}")))?;

    for (field, value) in [
        ("client_id", &bundle.client_id),
        ("client_secret", &bundle.client_secret),
        ("access_token", &bundle.access_token),
        ("refresh_token", &bundle.refresh_token),
    ] {
        if value.is_empty() {
            return Err(CredentialError::Malformed(format!("{field} is empty")));
        }
    }
    Ok(bundle)
}
