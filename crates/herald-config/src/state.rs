//! Dynamic runtime state: which thread is live and when it last rotated
//!
//! Static configuration describes what the agent should do; this module
//! holds the part that changes as it does it. One record per managed
//! thread item, keyed by the item's configuration key.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::settings::{InitialThread, ThreadSettings};

/// Live state for a single managed thread item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThreadState {
    /// Identifier of the thread currently being maintained, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,

    /// Sequence number of the live thread. The next rotation posts
    /// `thread_number + 1`.
    #[serde(default)]
    pub thread_number: u32,

    /// When the live thread was created or adopted. `None` until the
    /// first rotation this agent performs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_post_time: Option<DateTime<Utc>>,
}

impl ThreadState {
    /// Seed state for an item seen for the first time, adopting any
    /// pre-existing thread named in the configuration.
    pub fn from_initial(initial: &InitialThread) -> Self {
        Self {
            thread_id: initial.thread_id.clone(),
            thread_number: initial.thread_number,
            last_post_time: None,
        }
    }
}

/// Everything the agent persists between wakeups.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DynamicState {
    /// Per-item thread records, keyed by `[threads.items]` key.
    #[serde(default)]
    pub threads: BTreeMap<String, ThreadState>,
}

impl DynamicState {
    /// Fetch the record for `settings`, seeding it from the item's
    /// configured initial state on first sight. Configuration edits to
    /// `initial` never touch an already-seeded record.
    pub fn thread_entry(&mut self, settings: &ThreadSettings) -> &mut ThreadState {
        self.threads
            .entry(settings.key.clone())
            .or_insert_with(|| ThreadState::from_initial(&settings.initial))
    }
}
