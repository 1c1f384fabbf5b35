//! `keystash inject` — print a project's secrets as `.env` lines.
//!
//! Informational messages go to stderr so stdout can be redirected
//! straight into a file.

use std::collections::BTreeMap;

use crate::cli::{ensure_unlocked, open_vault, to_env_key, Cli};
use crate::errors::Result;

/// Execute the `inject` command.
pub fn execute(cli: &Cli, project: &str) -> Result<()> {
    let (mut vault, _settings) = open_vault(cli)?;
    ensure_unlocked(&mut vault)?;

    let secrets = vault.get_project(project)?;
    eprintln!("Exporting {} secrets from project '{project}'", secrets.len());

    let sorted: BTreeMap<String, String> = secrets.into_iter().collect();
    print!("{}", format_as_env(project, &sorted));
    Ok(())
}

/// Render secrets as a `.env` document, sorted by key.
pub fn format_as_env(project: &str, secrets: &BTreeMap<String, String>) -> String {
    let mut out = format!("# Environment variables for project: {project}\n\n");
    for (key, value) in secrets {
        out.push_str(&to_env_key(key));
        out.push('=');
        out.push_str(value);
        out.push('\n');
    }
    out
}
