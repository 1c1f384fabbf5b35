//! `keystash copy` — put a secret on the clipboard for a limited time.

use std::time::Duration;

use zeroize::Zeroizing;

use crate::cli::clipboard::copy_with_clear;
use crate::cli::output;
use crate::cli::{ensure_unlocked, open_vault, parse_secret_path, Cli};
use crate::errors::Result;

/// Execute the `copy` command.
pub fn execute(cli: &Cli, path: &str, ttl: Option<u64>) -> Result<()> {
    let (project, key) = parse_secret_path(path)?;

    let (mut vault, settings) = open_vault(cli)?;
    ensure_unlocked(&mut vault)?;

    let value = Zeroizing::new(vault.get(project, key)?);
    let seconds = ttl.unwrap_or(settings.clipboard_clear_seconds);

    let lease = copy_with_clear(&value, Duration::from_secs(seconds))?;
    output::success(&format!("Copied {project}/{key} to clipboard"));
    output::info(&format!("Clipboard will be cleared in {seconds} seconds"));

    lease.wait()
}
