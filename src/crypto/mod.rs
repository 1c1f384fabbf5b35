//! Cryptographic primitives for Keystash.
//!
//! This module provides:
//! - AES-256-GCM sealing and opening (`encryption`)
//! - Argon2id password-based key derivation (`kdf`)
//! - The zeroizing key handle plus verifier/fingerprint digests (`keys`)

pub mod encryption;
pub mod kdf;
pub mod keys;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{seal, open, derive_key_with_params, ...};
pub use encryption::{open, seal, NONCE_LEN};
pub use kdf::{derive_key_with_params, generate_salt, Argon2Params, KEY_LEN, SALT_LEN};
pub use keys::{key_fingerprint, password_verifier, verify_password, DerivedKey, DIGEST_LEN};
