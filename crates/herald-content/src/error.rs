//! Error types for herald-content

/// Result type for herald-content operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while locating or rewriting sections
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("Section anchor not found: {anchor}")]
    SectionNotFound { anchor: String },

    #[error("Malformed section: extra start anchor {anchor} at byte {position} before the first end anchor")]
    MalformedSection { anchor: String, position: usize },
}

impl Error {
    /// True when the anchor pair simply is not in the document, as
    /// opposed to being present but malformed.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::SectionNotFound { .. })
    }
}
