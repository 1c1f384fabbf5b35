//! Time-bounded unlock sessions.
//!
//! A session file sits next to the container and records when the vault
//! was last unlocked, a fingerprint of the derived key, and an expiry:
//!
//! ```text
//! { "unlocked_at": "<rfc3339>", "key_hash": "<b64>", "expires_at": "<rfc3339>" }
//! ```
//!
//! The record never contains key material.  An expired or unreadable
//! record is indistinguishable from a missing one and is deleted when
//! detected.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

use super::format::{base64_decode, base64_encode, to_json};
use super::fs::{remove_if_exists, write_private_atomic};
use crate::crypto::DerivedKey;
use crate::errors::{KeystashError, Result};

/// Default lifetime of a session, counted from the unlock.
pub const DEFAULT_SESSION_TTL_MINUTES: i64 = 15;

/// Record of a recent successful unlock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockSession {
    pub unlocked_at: DateTime<Utc>,

    #[serde(
        rename = "key_hash",
        serialize_with = "base64_encode",
        deserialize_with = "base64_decode"
    )]
    pub key_fingerprint: Vec<u8>,

    pub expires_at: DateTime<Utc>,
}

impl UnlockSession {
    /// Start a session for `key` now, lasting `ttl`.
    pub fn start(key: &DerivedKey, ttl: Duration) -> Result<Self> {
        Self::start_at(key, Utc::now(), ttl)
    }

    /// Start a session for `key` at an explicit instant.
    ///
    /// Fails with `Config` if the expiry does not fit in a timestamp.
    pub fn start_at(key: &DerivedKey, now: DateTime<Utc>, ttl: Duration) -> Result<Self> {
        let expires_at = now.checked_add_signed(ttl).ok_or_else(|| {
            KeystashError::Config(format!(
                "session TTL of {} minutes is out of range",
                ttl.num_minutes()
            ))
        })?;
        Ok(Self {
            unlocked_at: now,
            key_fingerprint: key.fingerprint().to_vec(),
            expires_at,
        })
    }

    /// A session is valid strictly before its expiry.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    /// Whether `key` is the key this session was started with.
    pub fn matches_key(&self, key: &DerivedKey) -> bool {
        key.fingerprint()[..].ct_eq(&self.key_fingerprint[..]).into()
    }
}

/// Reads and writes the session file.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist `session`, replacing any previous record.
    pub fn save(&self, session: &UnlockSession) -> Result<()> {
        let bytes = to_json("session", session)?;
        write_private_atomic(&self.path, &bytes)?;
        debug!(expires_at = %session.expires_at, "session saved");
        Ok(())
    }

    /// Load the current session, if one is valid right now.
    pub fn load(&self) -> Result<UnlockSession> {
        self.load_at(Utc::now())
    }

    /// Load the session as of `now`.
    ///
    /// Fails with `SessionNotFound` when the file is absent, unparseable or
    /// expired; the latter two also delete the file.
    pub fn load_at(&self, now: DateTime<Utc>) -> Result<UnlockSession> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(KeystashError::SessionNotFound);
            }
            Err(e) => return Err(e.into()),
        };

        let session: UnlockSession = match serde_json::from_slice(&bytes) {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "discarding unreadable session file");
                self.clear()?;
                return Err(KeystashError::SessionNotFound);
            }
        };

        if !session.is_valid_at(now) {
            debug!(expired_at = %session.expires_at, "session expired");
            self.clear()?;
            return Err(KeystashError::SessionNotFound);
        }

        Ok(session)
    }

    /// Delete the session file.  Missing is fine.
    pub fn clear(&self) -> Result<()> {
        remove_if_exists(&self.path)
    }
}
