//! `keystash add` — add or overwrite a secret.

use std::io::{self, IsTerminal, Read};

use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::{ensure_unlocked, open_vault, parse_secret_path, prompt_secret_value, Cli};
use crate::errors::{KeystashError, Result};

/// Execute the `add` command.
pub fn execute(cli: &Cli, path: &str, value: Option<&str>) -> Result<()> {
    let (project, key) = parse_secret_path(path)?;

    // Determine the secret value from one of three sources.
    let secret_value = if let Some(v) = value {
        output::warning("Value provided on command line — it may appear in shell history.");
        Zeroizing::new(v.to_string())
    } else if !io::stdin().is_terminal() {
        let mut buf = Zeroizing::new(String::new());
        io::stdin().read_to_string(&mut buf)?;
        Zeroizing::new(buf.trim_end().to_string())
    } else {
        prompt_secret_value(&format!("Value for {project}/{key}"))?
    };

    if secret_value.is_empty() {
        return Err(KeystashError::CommandFailed("value cannot be empty".into()));
    }

    let (mut vault, _settings) = open_vault(cli)?;
    ensure_unlocked(&mut vault)?;
    vault.add_or_update(project, key, &secret_value)?;

    output::success(&format!("Secret stored: {project}/{key}"));
    Ok(())
}
