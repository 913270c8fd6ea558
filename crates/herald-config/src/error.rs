//! Error types for herald-config

use std::path::PathBuf;

use crate::interval::IntervalParseError;

/// Result type for herald-config operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading, resolving, or persisting
/// configuration and dynamic state
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration file not found at expected path
    #[error("Configuration not found at {path}")]
    ConfigNotFound { path: PathBuf },

    /// Refusing to overwrite an existing configuration file
    #[error("Configuration already exists at {path}")]
    ConfigExists { path: PathBuf },

    /// Configuration file exists but has no content
    #[error("Configuration file is empty: {path}")]
    ConfigEmpty { path: PathBuf },

    /// Configuration file extension is not a supported format
    #[error("Unsupported configuration format: {path} (expected .toml or .json)")]
    UnsupportedFormat { path: PathBuf },

    /// Configuration or state file failed to parse
    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// A required field is unset after folding every layer
    #[error("Missing required field `{field}` for {scope}")]
    MissingField { field: &'static str, scope: String },

    /// A managed-thread alias endpoint was configured where content is read from
    #[error("{scope}: a managed-thread alias cannot be used as a sync source")]
    AliasAsSource { scope: String },

    /// An endpoint references an account with no `[accounts.<name>]` entry
    #[error("Unknown account `{account}` referenced by {scope}")]
    UnknownAccount { account: String, scope: String },

    /// Work items are configured but the `[accounts]` table is empty
    #[error("Configuration declares work items but no accounts")]
    NoAccounts,

    /// A sync item declares no targets at all
    #[error("{scope}: sync item declares no targets")]
    NoTargets { scope: String },

    /// Another process holds the exclusive instance lock
    #[error("Another instance is already running (lock held at {path})")]
    InstanceAlreadyRunning { path: PathBuf },

    /// No platform default directory is available for a path
    #[error("No platform default for the {what} path; pass one explicitly")]
    DefaultPathUnavailable { what: &'static str },

    /// Interval specification error
    #[error(transparent)]
    Interval(#[from] IntervalParseError),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
