//! `keystash reset` — erase every secret and lock the vault.

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{ensure_unlocked, open_vault, Cli};
use crate::errors::{KeystashError, Result};

/// Execute the `reset` command.
pub fn execute(cli: &Cli, force: bool) -> Result<()> {
    let (mut vault, _settings) = open_vault(cli)?;
    ensure_unlocked(&mut vault)?;

    if !force {
        let confirmed = Confirm::new()
            .with_prompt("Delete ALL secrets? This cannot be undone")
            .default(false)
            .interact()
            .map_err(|e| KeystashError::CommandFailed(format!("confirmation prompt: {e}")))?;
        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    vault.reset()?;
    output::success("All secrets deleted. Vault locked.");
    Ok(())
}
