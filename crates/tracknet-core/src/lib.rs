//! tracknet Core - Domain logic for playlist synchronization
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `Track`, `TrackCollection`, `CredentialBundle`, `TimePartition`
//! - **Reconciliation** - `partition_by_age`, `removable_set`, `RemovalPolicy`
//! - **Use cases** - `SyncPlaylistUseCase`
//! - **Port definitions** - Traits for adapters: `ICollectionProvider`, `ICollectionConnector`, `ICredentialStore`
//!
//! # Architecture
//!
//! This crate follows the hexagonal (ports & adapters) architecture pattern.
//! The domain module contains pure business logic with no I/O.
//! Ports define trait interfaces that adapter crates implement.
//! Use cases orchestrate domain functions through port interfaces.

pub mod config;
pub mod domain;
pub mod ports;
pub mod usecases;
