//! The seam between the agent and a remote document service
//!
//! One [`DocumentHost`] implementation per hosting platform. The
//! engine only speaks in terms of this trait; tests drive it with an
//! in-memory host.

use chrono::{DateTime, Utc};

use crate::endpoint::EndpointId;

/// Result type for host operations
pub type HostResult<T> = std::result::Result<T, HostError>;

/// Failure surfaced by a document host
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// The addressed document or post does not exist
    #[error("{endpoint} not found on the host")]
    NotFound { endpoint: String },

    /// The acting account lacks permission for the operation
    #[error("access denied for {endpoint}")]
    AccessDenied { endpoint: String },

    /// The host understood the request and refused it
    #[error("host rejected the request: {reason}")]
    Rejected { reason: String },

    /// Network trouble, throttling, or a host-side outage
    #[error("transient host failure: {reason}")]
    Transient { reason: String },
}

impl HostError {
    pub fn not_found(endpoint: &EndpointId) -> Self {
        Self::NotFound {
            endpoint: endpoint.to_string(),
        }
    }
}

/// Identity of a newly created thread post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedPost {
    /// Host-assigned post id
    pub id: String,
    /// Canonical URL of the post
    pub url: String,
}

/// Metadata for an existing post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostInfo {
    pub url: String,
    pub created_at: DateTime<Utc>,
}

/// A remote service hosting the documents the agent maintains.
///
/// Methods take the acting account by its configuration name;
/// credentials stay behind the implementation. Every operation is
/// synchronous and fallible.
pub trait DocumentHost {
    /// Full current content of a document.
    fn get(&self, endpoint: &EndpointId) -> HostResult<String>;

    /// Replace a document's content. `reason` is recorded where the
    /// host keeps revision history.
    fn put(&self, endpoint: &EndpointId, content: &str, reason: &str) -> HostResult<()>;

    /// Create a new thread post, returning its host-assigned identity.
    fn create_post(
        &self,
        account: &str,
        community: &str,
        title: &str,
        body: &str,
    ) -> HostResult<CreatedPost>;

    /// Metadata for an existing post.
    fn post_info(&self, account: &str, community: &str, thread_id: &str) -> HostResult<PostInfo>;

    /// Post ids currently pinned in a community, top slot first.
    fn pinned(&self, account: &str, community: &str) -> HostResult<Vec<String>>;

    /// Pin a post; `bottom` selects the lower slot on hosts that
    /// distinguish slots.
    fn pin(&self, account: &str, community: &str, thread_id: &str, bottom: bool) -> HostResult<()>;

    /// Remove a post from the pinned set.
    fn unpin(&self, account: &str, community: &str, thread_id: &str) -> HostResult<()>;

    /// Approve a held post (moderator self-approval).
    fn approve(&self, account: &str, community: &str, thread_id: &str) -> HostResult<()>;
}
