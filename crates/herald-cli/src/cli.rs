//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Herald - Sync document sections and rotate scheduled threads
#[derive(Parser, Debug)]
#[command(name = "herald")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the static configuration file (TOML or JSON)
    #[arg(short, long, global = true, env = "HERALD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Path to the dynamic state file
    #[arg(short, long, global = true, env = "HERALD_STATE")]
    pub state: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Validate the configuration without contacting any host
    ///
    /// Resolves every sync item and managed thread, reporting all
    /// problems found rather than stopping at the first.
    Check,

    /// Show resolved work items and the persisted thread state
    Info,

    /// Write a commented example configuration file
    ///
    /// Examples:
    ///   herald init                        # Default platform path
    ///   herald init --config herald.toml   # Explicit location
    ///   herald init --force                # Overwrite an existing file
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },
}
