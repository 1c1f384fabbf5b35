//! Vault module — the encrypted secret store.
//!
//! This module provides:
//! - The container codec and payload types (`format`)
//! - Owner-only atomic file writes (`fs`)
//! - Time-bounded unlock sessions (`session`)
//! - The `Vault` engine and its lock/unlock state machine (`store`)

pub mod format;
pub mod fs;
pub mod session;
pub mod store;

// Re-export the most commonly used items.
pub use format::{Projects, VaultContainer, VaultPlaintext, CURRENT_VERSION};
pub use session::{SessionStore, UnlockSession, DEFAULT_SESSION_TTL_MINUTES};
pub use store::{KeyListing, Vault, VaultState, CONTAINER_FILE, SESSION_FILE};
