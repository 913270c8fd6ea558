//! Concrete addresses for remote documents

use std::fmt;

use herald_config::{EndpointKind, EndpointSettings};

/// Fully-qualified address of one remote document.
///
/// Unlike [`EndpointSettings`], an `EndpointId` never holds a
/// `current_thread` alias; the sync engine resolves aliases to the
/// live post id before anything reaches a host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointId {
    pub kind: EndpointKind,
    pub community: String,
    /// Document name; for threads, the host-assigned post id.
    pub name: String,
    /// Account the operation authenticates as.
    pub account: String,
}

impl EndpointId {
    /// Address of a live thread post.
    pub fn thread(community: &str, thread_id: &str, account: &str) -> Self {
        Self {
            kind: EndpointKind::Thread,
            community: community.to_string(),
            name: thread_id.to_string(),
            account: account.to_string(),
        }
    }
}

impl From<&EndpointSettings> for EndpointId {
    fn from(settings: &EndpointSettings) -> Self {
        Self {
            kind: settings.kind,
            community: settings.community.clone(),
            name: settings.name.clone(),
            account: settings.account.clone(),
        }
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}/{}", self.kind, self.community, self.name)
    }
}
