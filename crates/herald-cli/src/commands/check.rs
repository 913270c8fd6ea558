//! Check command implementation
//!
//! Offline validation of the static configuration: every sync item and
//! managed thread is resolved, and every problem is reported.

use std::path::Path;

use colored::Colorize;

use herald_config::{ConfigResolver, load_static};

use crate::error::{CliError, Result};

/// Run the check command
///
/// Loads the configuration at `config_path` and resolves every work
/// item. All problems are listed, not just the first one hit.
pub fn run_check(config_path: &Path) -> Result<()> {
    println!(
        "{} Checking configuration at {}...",
        "=>".blue().bold(),
        config_path.display().to_string().cyan()
    );

    let config = load_static(config_path)?;
    let resolver = ConfigResolver::new(&config);
    let errors = resolver.check();

    if errors.is_empty() {
        let pairs = resolver.sync_pairs().len();
        let threads = resolver.thread_items().len();
        println!(
            "{} Configuration is valid: {} sync item(s), {} thread item(s).",
            "OK".green().bold(),
            pairs,
            threads
        );
        return Ok(());
    }

    println!(
        "{} Configuration has {} problem(s):",
        "INVALID".red().bold(),
        errors.len()
    );
    for error in &errors {
        println!("   {} {}", "!".red(), error);
    }
    Err(CliError::user("Configuration check failed"))
}
