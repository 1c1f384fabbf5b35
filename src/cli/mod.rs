//! CLI module — Clap argument parser, output helpers, and command implementations.

pub mod clipboard;
pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::Parser;
use zeroize::Zeroizing;

use crate::config::{default_vault_dir, Settings};
use crate::errors::{KeystashError, Result};
use crate::vault::Vault;

/// Minimum password length to prevent trivially weak passwords.
const MIN_PASSWORD_LEN: usize = 8;

/// Environment variable consulted before prompting for the master password.
pub const PASSWORD_ENV: &str = "KEYSTASH_PASSWORD";

/// Keystash CLI: password-protected secret store.
#[derive(Parser)]
#[command(
    name = "keystash",
    about = "Password-protected local secret store",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Vault directory (default: ~/.keystash)
    #[arg(long, env = "KEYSTASH_DIR", global = true)]
    pub vault_dir: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create a new vault
    Init,

    /// Unlock the vault for the session window
    Unlock,

    /// Lock the vault and end the session
    Lock,

    /// Show whether the vault exists and is unlocked
    Status,

    /// Add a secret (overwrites an existing one)
    Add {
        /// Secret path as project/key
        path: String,
        /// Secret value (omit for hidden prompt)
        value: Option<String>,
    },

    /// Change the value of an existing secret
    Update {
        /// Secret path as project/key
        path: String,
    },

    /// Print a secret's value
    Get {
        /// Secret path as project/key
        path: String,
    },

    /// Copy a secret to the clipboard, clearing it after a delay
    Copy {
        /// Secret path as project/key
        path: String,
        /// Seconds before the clipboard is cleared
        #[arg(short, long)]
        ttl: Option<u64>,
    },

    /// List all projects and keys
    List,

    /// Find keys whose project or key name contains a keyword
    Search {
        /// Case-insensitive keyword
        keyword: String,
    },

    /// Print a project's secrets in .env format
    Inject {
        /// Project to export
        #[arg(short, long)]
        project: String,
    },

    /// Delete every secret in the vault
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Resolve the vault directory from the CLI arguments.
pub fn vault_dir(cli: &Cli) -> Result<PathBuf> {
    match &cli.vault_dir {
        Some(dir) => Ok(dir.clone()),
        None => default_vault_dir(),
    }
}

/// Build the vault engine for this invocation.
pub fn open_vault(cli: &Cli) -> Result<(Vault, Settings)> {
    let dir = vault_dir(cli)?;
    let settings = Settings::load(&dir)?;
    let vault = Vault::from_settings(&dir, &settings)?;
    Ok((vault, settings))
}

/// Make sure the vault is unlocked, prompting for the password if the
/// session cannot be restored.
pub fn ensure_unlocked(vault: &mut Vault) -> Result<()> {
    if !vault.exists() {
        return Err(KeystashError::VaultNotFound(vault.path().to_path_buf()));
    }
    if vault.is_unlocked() {
        return Ok(());
    }
    let password = prompt_password()?;
    vault.unlock(password.as_bytes())
}

/// Get the master password, trying in order:
/// 1. `KEYSTASH_PASSWORD` environment variable
/// 2. Interactive prompt
///
/// Returns `Zeroizing<String>` so the password is wiped from memory on drop.
pub fn prompt_password() -> Result<Zeroizing<String>> {
    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        if !pw.is_empty() {
            return Ok(Zeroizing::new(pw));
        }
    }

    let pw = dialoguer::Password::new()
        .with_prompt("Enter master password")
        .interact()
        .map_err(|e| KeystashError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Prompt for a new password with confirmation (used during `init`).
///
/// Also respects `KEYSTASH_PASSWORD` for scripted usage.
/// Enforces a minimum password length.
pub fn prompt_new_password() -> Result<Zeroizing<String>> {
    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        if !pw.is_empty() {
            if pw.len() < MIN_PASSWORD_LEN {
                return Err(KeystashError::CommandFailed(format!(
                    "password must be at least {MIN_PASSWORD_LEN} characters"
                )));
            }
            return Ok(Zeroizing::new(pw));
        }
    }

    loop {
        let password = Zeroizing::new(
            dialoguer::Password::new()
                .with_prompt("Choose master password")
                .with_confirmation(
                    "Confirm master password",
                    "Passwords do not match, try again",
                )
                .interact()
                .map_err(|e| KeystashError::CommandFailed(format!("password prompt: {e}")))?,
        );

        if password.len() < MIN_PASSWORD_LEN {
            output::warning(&format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters. Try again."
            ));
            continue;
        }

        return Ok(password);
    }
}

/// Prompt for a secret value with hidden input.
pub fn prompt_secret_value(label: &str) -> Result<Zeroizing<String>> {
    let value = dialoguer::Password::new()
        .with_prompt(label)
        .interact()
        .map_err(|e| KeystashError::CommandFailed(format!("input prompt: {e}")))?;
    Ok(Zeroizing::new(value))
}

/// Split a `project/key` argument into its two non-empty parts.
pub fn parse_secret_path(path: &str) -> Result<(&str, &str)> {
    match path.split_once('/') {
        Some((project, key)) if !project.is_empty() && !key.is_empty() && !key.contains('/') => {
            Ok((project, key))
        }
        _ => Err(KeystashError::CommandFailed(format!(
            "invalid secret path '{path}' — use project/key"
        ))),
    }
}

/// Convert a key name into an environment variable name.
///
/// ASCII letters are upper-cased, digits kept, everything else becomes `_`.
pub fn to_env_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}
