// # sbat-core
//
// Core library for the SBAT exam slot watcher.
//
// ## Architecture Overview
//
// This library provides the polling/authentication/change-detection core:
// - **Authenticator**: Trait for acquiring a bearer token from the identity endpoint
// - **SlotSource**: Trait for querying one exam-center partition of the availability endpoint
// - **CredentialStore**: Trait for loading/persisting operator credentials
// - **reconcile**: Change detection against cumulative and previous-cycle state
// - **Watcher**: The poll loop that orchestrates fetch → reconcile → notify → sleep
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from HTTP and shell code
// 2. **One-Directional Events**: The watcher emits events on a channel; it never
//    calls into presentation code
// 3. **Library-First**: Any shell (CLI, GUI) embeds the same core
// 4. **In-Memory State**: Observation state lives for one poll session only

pub mod cadence;
pub mod config;
pub mod cred;
pub mod error;
pub mod reconcile;
pub mod traits;
pub mod types;
pub mod watcher;

// Re-export core types for convenience
pub use cadence::CadenceConfig;
pub use config::WatcherConfig;
pub use cred::{FileCredentialStore, MemoryCredentialStore};
pub use error::{Error, Result};
pub use reconcile::{ObservationState, reconcile};
pub use traits::{Authenticator, CredentialStore, FetchError, SlotSource};
pub use types::{Center, Credentials, QueryTemplate, Slot, SlotKey, SlotQuery};
pub use watcher::{Watcher, WatcherEvent};
