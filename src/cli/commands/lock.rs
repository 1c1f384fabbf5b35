//! `keystash lock` — drop the session.

use crate::cli::output;
use crate::cli::{open_vault, Cli};
use crate::errors::Result;

/// Execute the `lock` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let (mut vault, _settings) = open_vault(cli)?;
    vault.lock()?;
    output::success("Vault locked");
    Ok(())
}
