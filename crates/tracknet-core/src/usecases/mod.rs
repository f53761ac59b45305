//! Use cases (interactors) for tracknet
//!
//! Use cases orchestrate domain functions and port interfaces. They are thin
//! coordinators that delegate reconciliation rules to the domain and all
//! I/O to ports.
//!
//! ## Use Cases
//!
//! - [`SyncPlaylistUseCase`] - Fetch, reconcile and prune a playlist; promote tracks

pub mod sync_playlist;

pub use sync_playlist::{
    SyncOutcome, SyncPlaylistUseCase, SyncReport, SyncRequest, SyncRunError, SyncStage,
};
