//! `keystash status` — report whether the vault exists and is unlocked.

use crate::cli::output;
use crate::cli::{open_vault, Cli};
use crate::errors::Result;
use crate::vault::VaultState;

/// Execute the `status` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let (mut vault, _settings) = open_vault(cli)?;

    // Give a valid session the chance to restore the unlocked state.
    vault.is_unlocked();

    let path_display = vault.path().display();
    match vault.state() {
        VaultState::Uninitialized => {
            output::info(&format!("No vault at {path_display}"));
            output::tip("Run `keystash init` to create one.");
        }
        VaultState::Locked => {
            output::info(&format!("Vault at {path_display} is locked"));
        }
        VaultState::Unlocked => {
            output::success(&format!("Vault at {path_display} is unlocked"));
        }
    }
    Ok(())
}
