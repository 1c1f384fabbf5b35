//! `keystash list` — display every project and key in a table.

use crate::cli::output;
use crate::cli::{ensure_unlocked, open_vault, Cli};
use crate::errors::Result;

/// Execute the `list` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let (mut vault, _settings) = open_vault(cli)?;
    ensure_unlocked(&mut vault)?;

    let listing = vault.list()?;
    let total: usize = listing.values().map(|keys| keys.len()).sum();

    if total == 0 {
        output::info("No secrets in this vault yet.");
        output::tip("Run `keystash add project/key` to add your first secret.");
        return Ok(());
    }

    output::info(&format!(
        "{} project(s) — {} secret(s)",
        listing.len(),
        total
    ));
    output::print_listing_table(&listing);

    Ok(())
}
