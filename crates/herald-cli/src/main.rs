//! Herald agent CLI
//!
//! Operational tooling around the agent library: validate configuration
//! offline, inspect resolved work items and thread state, and bootstrap
//! a new deployment with the example config.

mod cli;
mod commands;
mod error;

use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use cli::{Cli, Commands};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(e.exit_code());
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Setup tracing if verbose
    if cli.verbose {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .with_target(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .expect("Failed to set tracing subscriber");
        tracing::debug!("Verbose mode enabled");
    }

    match cli.command {
        Some(Commands::Check) => commands::run_check(&config_path(cli.config)?),
        Some(Commands::Info) => {
            commands::run_info(&config_path(cli.config)?, &state_path(cli.state)?)
        }
        Some(Commands::Init { force }) => commands::run_init(&config_path(cli.config)?, force),
        None => {
            // No command provided - show help hint
            println!("{} Herald agent CLI", "herald".green().bold());
            println!();
            println!("Run {} for available commands.", "herald --help".cyan());
            Ok(())
        }
    }
}

/// Explicit `--config` path, or the platform default.
fn config_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path),
        None => Ok(herald_config::default_config_path()?),
    }
}

/// Explicit `--state` path, or the platform default.
fn state_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path),
        None => Ok(herald_config::default_state_path()?),
    }
}
