//! `keystash search` — find keys by project or key name.

use crate::cli::output;
use crate::cli::{ensure_unlocked, open_vault, Cli};
use crate::errors::Result;

/// Execute the `search` command.
pub fn execute(cli: &Cli, keyword: &str) -> Result<()> {
    let (mut vault, _settings) = open_vault(cli)?;
    ensure_unlocked(&mut vault)?;

    let found = vault.search(keyword)?;
    if found.is_empty() {
        output::info(&format!("No secrets match '{keyword}'"));
        return Ok(());
    }

    output::print_listing_table(&found);
    Ok(())
}
