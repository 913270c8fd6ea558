//! Init command implementation
//!
//! Writes the embedded example configuration so a new deployment has a
//! commented starting point.

use std::path::Path;

use colored::Colorize;

use herald_config::write_example;

use crate::error::Result;

/// Run the init command
///
/// Writes the example configuration to `config_path`, creating parent
/// directories as needed. An existing file is only replaced when
/// `force` is set.
pub fn run_init(config_path: &Path, force: bool) -> Result<()> {
    write_example(config_path, force)?;

    println!(
        "{} Example configuration written to {}",
        "OK".green().bold(),
        config_path.display().to_string().cyan()
    );
    println!(
        "Edit the accounts and items, then run {} to validate.",
        "herald check".cyan()
    );
    Ok(())
}
