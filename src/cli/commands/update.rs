//! `keystash update` — change the value of an existing secret.

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{ensure_unlocked, open_vault, parse_secret_path, prompt_secret_value, Cli};
use crate::errors::{KeystashError, Result};

/// Execute the `update` command.
pub fn execute(cli: &Cli, path: &str) -> Result<()> {
    let (project, key) = parse_secret_path(path)?;

    let (mut vault, _settings) = open_vault(cli)?;
    ensure_unlocked(&mut vault)?;

    // Must already exist; `add` is the way to create.
    let current = zeroize::Zeroizing::new(vault.get(project, key)?);

    output::info(&format!("Updating {project}/{key}"));
    let new_value = prompt_secret_value("New value")?;

    if new_value.is_empty() {
        return Err(KeystashError::CommandFailed("value cannot be empty".into()));
    }
    if *new_value == *current {
        output::info("No changes made.");
        return Ok(());
    }

    let confirmed = Confirm::new()
        .with_prompt("Update?")
        .default(false)
        .interact()
        .map_err(|e| KeystashError::CommandFailed(format!("confirmation prompt: {e}")))?;
    if !confirmed {
        return Err(KeystashError::UserCancelled);
    }

    vault.add_or_update(project, key, &new_value)?;
    output::success(&format!("Updated {project}/{key}"));
    Ok(())
}
