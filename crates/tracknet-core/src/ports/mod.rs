//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the domain core
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`ICollectionProvider`] - Fetch and mutate collections on a music provider
//! - [`ICollectionConnector`] - Binds a provider to a credential bundle
//! - [`ICredentialStore`] - Resolves credentials from a secret backend

pub mod collection_provider;
pub mod credential_store;

pub use collection_provider::{ICollectionConnector, ICollectionProvider};
pub use credential_store::ICredentialStore;
