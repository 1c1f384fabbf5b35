use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{KeystashError, Result};

/// User-level configuration, loaded from `<vault_dir>/config.toml`.
///
/// Every field has a sensible default so Keystash works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Minutes a session stays valid after an unlock (default: 15).
    #[serde(default = "default_session_ttl_minutes")]
    pub session_ttl_minutes: i64,

    /// Seconds before a copied secret is wiped from the clipboard (default: 15).
    #[serde(default = "default_clipboard_clear_seconds")]
    pub clipboard_clear_seconds: u64,

    /// Argon2 memory cost in KiB for new vaults (default: 64 MB).
    #[serde(default = "default_argon2_memory_kib")]
    pub argon2_memory_kib: u32,

    /// Argon2 iteration count for new vaults (default: 3).
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,

    /// Argon2 parallelism degree for new vaults (default: 4).
    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,

    /// Park the session key in the OS keyring so later commands skip the
    /// password prompt (default: true; needs the `keyring-store` feature).
    #[serde(default = "default_session_keyring")]
    pub session_keyring: bool,
}

/// Longest accepted session: one year.
pub const MAX_SESSION_TTL_MINUTES: i64 = 365 * 24 * 60;

// ── Serde default helpers ────────────────────────────────────────────

fn default_session_ttl_minutes() -> i64 {
    crate::vault::DEFAULT_SESSION_TTL_MINUTES
}

fn default_clipboard_clear_seconds() -> u64 {
    15
}

fn default_argon2_memory_kib() -> u32 {
    65_536 // 64 MB
}

fn default_argon2_iterations() -> u32 {
    3
}

fn default_argon2_parallelism() -> u32 {
    4
}

fn default_session_keyring() -> bool {
    true
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            session_ttl_minutes: default_session_ttl_minutes(),
            clipboard_clear_seconds: default_clipboard_clear_seconds(),
            argon2_memory_kib: default_argon2_memory_kib(),
            argon2_iterations: default_argon2_iterations(),
            argon2_parallelism: default_argon2_parallelism(),
            session_keyring: default_session_keyring(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the vault directory.
    const FILE_NAME: &'static str = "config.toml";

    /// Load settings from `<vault_dir>/config.toml`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(vault_dir: &Path) -> Result<Self> {
        let config_path = vault_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            KeystashError::Config(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        if !(1..=MAX_SESSION_TTL_MINUTES).contains(&settings.session_ttl_minutes) {
            return Err(KeystashError::Config(format!(
                "session_ttl_minutes must be between 1 and {MAX_SESSION_TTL_MINUTES} (got {})",
                settings.session_ttl_minutes
            )));
        }

        Ok(settings)
    }

    /// Convert the Argon2 settings into crypto-layer params.
    pub fn argon2_params(&self) -> crate::crypto::Argon2Params {
        crate::crypto::Argon2Params {
            memory_kib: self.argon2_memory_kib,
            iterations: self.argon2_iterations,
            parallelism: self.argon2_parallelism,
        }
    }
}

/// The vault directory used when none is given: `~/.keystash`.
pub fn default_vault_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(".keystash"))
        .ok_or_else(|| KeystashError::Config("cannot determine home directory".into()))
}

// ── Tests ────────────────────────────────────────────────────────────
