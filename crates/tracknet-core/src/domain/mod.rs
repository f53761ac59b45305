//! Domain entities and business logic
//!
//! This module contains the core domain types for tracknet:
//! - Newtypes for validated provider identifiers
//! - Track and collection types
//! - The credential bundle
//! - Reconciliation (age partitioning, snapshot diffing)
//! - Domain-specific error types

pub mod credentials;
pub mod errors;
pub mod newtypes;
pub mod reconcile;
pub mod track;

// Re-export commonly used types
pub use credentials::{CredentialBundle, SecretRef};
pub use errors::{AuthError, CredentialError, DomainError, FetchError, MutationError};
pub use newtypes::*;
pub use reconcile::{partition_by_age, removable_set, RemovalPolicy, TimePartition};
pub use track::{AudioFeatures, Track, TrackCollection, MAX_GENRES, NO_GENRE};
