//! `keystash init` — create a new vault.

use crate::cli::output;
use crate::cli::{open_vault, prompt_new_password, Cli};
use crate::errors::{KeystashError, Result};

/// Execute the `init` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let (mut vault, _settings) = open_vault(cli)?;

    if vault.exists() {
        output::tip("Use `keystash add project/key` to add secrets to the existing vault.");
        return Err(KeystashError::VaultAlreadyExists(vault.path().to_path_buf()));
    }

    let password = prompt_new_password()?;
    vault.initialize(password.as_bytes())?;

    let path_display = vault.path().display();
    output::success(&format!("Vault created at {path_display}"));
    output::warning("There is no way to recover your secrets without the master password.");
    output::tip("Add your first secret: keystash add myapp/api_key");

    Ok(())
}
