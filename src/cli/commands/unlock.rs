//! `keystash unlock` — unlock the vault for the session window.

use crate::cli::output;
use crate::cli::{open_vault, prompt_password, Cli};
use crate::errors::{KeystashError, Result};

/// Execute the `unlock` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let (mut vault, settings) = open_vault(cli)?;

    if !vault.exists() {
        return Err(KeystashError::VaultNotFound(vault.path().to_path_buf()));
    }

    let password = prompt_password()?;
    vault.unlock(password.as_bytes())?;

    if vault.session_restorable() {
        output::success(&format!(
            "Vault unlocked for {} minutes",
            settings.session_ttl_minutes
        ));
    } else {
        output::success("Password verified");
        output::warning(
            "No OS keyring available: every command will ask for the password again.",
        );
        output::tip("Set KEYSTASH_PASSWORD for scripted use.");
    }
    Ok(())
}
