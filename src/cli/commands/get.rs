//! `keystash get` — print a single secret's value.

use zeroize::Zeroizing;

use crate::cli::{ensure_unlocked, open_vault, parse_secret_path, Cli};
use crate::errors::Result;

/// Execute the `get` command.
pub fn execute(cli: &Cli, path: &str) -> Result<()> {
    let (project, key) = parse_secret_path(path)?;

    let (mut vault, _settings) = open_vault(cli)?;
    ensure_unlocked(&mut vault)?;

    let value = Zeroizing::new(vault.get(project, key)?);
    println!("{}", value.as_str());

    Ok(())
}
