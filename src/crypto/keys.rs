//! Key handle and one-way digests.
//!
//! - `DerivedKey` holds the Argon2id output and wipes it on drop.
//! - `password_verifier` is a salted SHA-256 of the master password, stored
//!   in the container to reject wrong passwords before any decryption.
//!   It is computed from the password, never from the derived key.  It is
//!   a fast hash, so a stolen container can be brute-forced against it
//!   at SHA-256 speed rather than Argon2id speed.
//! - `key_fingerprint` is a SHA-256 of the derived key, stored in the
//!   session record so a restored key can be recognized.  Neither digest
//!   can be turned back into a key.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use super::kdf::{KEY_LEN, SALT_LEN};
use crate::errors::{KeystashError, Result};

/// Length of the verifier and fingerprint digests (SHA-256).
pub const DIGEST_LEN: usize = 32;

const VERIFIER_CONTEXT: &[u8] = b"keystash-password-verifier:v1";
const FINGERPRINT_CONTEXT: &[u8] = b"keystash-key-fingerprint:v1";

/// A wrapper around a 32-byte derived key that automatically zeroes
/// its memory when dropped.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct DerivedKey {
    bytes: [u8; KEY_LEN],
}

impl DerivedKey {
    /// Create a new `DerivedKey` from raw bytes.
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Rebuild a key from a byte slice (e.g. read back from a credential store).
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != KEY_LEN {
            return Err(KeystashError::KeyDerivationFailed(format!(
                "key must be {KEY_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        let mut key = Self::new([0u8; KEY_LEN]);
        key.bytes.copy_from_slice(bytes);
        Ok(key)
    }

    /// Access the raw key bytes (e.g. to pass to `seal`/`open`).
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }

    pub(crate) fn as_mut_bytes(&mut self) -> &mut [u8; KEY_LEN] {
        &mut self.bytes
    }

    /// Non-reversible digest identifying this key.
    pub fn fingerprint(&self) -> [u8; DIGEST_LEN] {
        key_fingerprint(&self.bytes)
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedKey(<redacted>)")
    }
}

/// Compute the stored password verifier for `password` under the vault salt.
pub fn password_verifier(password: &[u8], salt: &[u8; SALT_LEN]) -> [u8; DIGEST_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(VERIFIER_CONTEXT);
    hasher.update(salt);
    hasher.update(password);
    hasher.finalize().into()
}

/// Check `password` against a stored verifier in constant time.
pub fn verify_password(password: &[u8], salt: &[u8; SALT_LEN], expected: &[u8]) -> bool {
    let actual = password_verifier(password, salt);
    actual[..].ct_eq(expected).into()
}

/// Compute the session fingerprint of a raw key.
pub fn key_fingerprint(key: &[u8]) -> [u8; DIGEST_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(FINGERPRINT_CONTEXT);
    hasher.update(key);
    hasher.finalize().into()
}
