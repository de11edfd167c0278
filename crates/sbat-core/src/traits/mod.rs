//! Core traits
//!
//! These traits are the seams between the watcher and its collaborators:
//! the HTTP client crate implements [`Authenticator`] and [`SlotSource`],
//! shells provide a [`CredentialStore`].

pub mod authenticator;
pub mod credential_store;
pub mod slot_source;

pub use authenticator::Authenticator;
pub use credential_store::CredentialStore;
pub use slot_source::{FetchError, SlotSource};
