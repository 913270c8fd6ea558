//! Error types for herald-core

/// Result type for herald-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a whole tick
///
/// Per-target and per-item failures never surface here; they are
/// reported inside [`crate::report::TickReport`] so the rest of the
/// pass still runs.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration or state persistence error
    #[error(transparent)]
    Config(#[from] herald_config::Error),

    /// Section extraction or replacement error
    #[error(transparent)]
    Content(#[from] herald_content::Error),

    /// Remote document host error
    #[error(transparent)]
    Host(#[from] crate::host::HostError),
}
