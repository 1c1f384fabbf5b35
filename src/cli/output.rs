//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::vault::KeyListing;

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Flatten a listing into `(project, keys)` rows, both sorted.
///
/// The engine makes no ordering promise, so sorting happens here.
pub fn sorted_rows(listing: &KeyListing) -> Vec<(String, Vec<String>)> {
    let mut rows: Vec<(String, Vec<String>)> = listing
        .iter()
        .map(|(project, keys)| {
            let mut keys: Vec<String> = keys.iter().cloned().collect();
            keys.sort();
            (project.clone(), keys)
        })
        .collect();
    rows.sort_by(|a, b| a.0.cmp(&b.0));
    rows
}

/// Print a table of projects and their keys.
pub fn print_listing_table(listing: &KeyListing) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Project", "Key"]);

    for (project, keys) in sorted_rows(listing) {
        for key in keys {
            table.add_row(vec![project.clone(), key]);
        }
    }

    println!("{table}");
}
