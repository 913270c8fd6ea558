//! Error types for herald-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from herald-config
    #[error(transparent)]
    Config(#[from] herald_config::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }

    /// Process exit code for this error.
    ///
    /// Configuration and user errors exit 3, unhandled runtime failures
    /// exit 1. Argument errors exit 2 through clap itself, so wrapping
    /// scripts can tell the three classes apart.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io(_) | Self::Config(herald_config::Error::Io(_)) => 1,
            Self::Config(_) | Self::User { .. } => 3,
        }
    }
}
