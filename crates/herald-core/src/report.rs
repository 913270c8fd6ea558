//! Reports from a single wakeup
//!
//! The engine never aborts a tick for a single bad item or target;
//! everything that went wrong lands here instead, keyed the way the
//! configuration keys it.

use serde::Serialize;

/// How one sync target fared
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetOutcome {
    /// Candidate content matched the remote byte for byte; no write
    Unchanged,
    /// New content written
    Updated,
    /// This target failed; its siblings were still attempted
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetReport {
    /// `[sync.items.<item>.targets]` key
    pub key: String,
    pub outcome: TargetOutcome,
}

/// Outcome of one sync pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairReport {
    /// `[sync.items]` key
    pub key: String,
    /// Set when the source could not be resolved, fetched, or parsed;
    /// no targets were attempted
    pub source_error: Option<String>,
    pub targets: Vec<TargetReport>,
}

impl PairReport {
    pub fn source_failed(key: &str, reason: String) -> Self {
        Self {
            key: key.to_string(),
            source_error: Some(reason),
            targets: Vec::new(),
        }
    }

    pub fn has_failures(&self) -> bool {
        self.source_error.is_some()
            || self
                .targets
                .iter()
                .any(|target| matches!(target.outcome, TargetOutcome::Failed { .. }))
    }
}

/// What a tick did to one managed thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadOutcome {
    /// Not due; the live thread's body was synced from its source
    /// instead
    Synced { body: TargetOutcome },
    /// A new thread is live and recorded in state
    Rotated { thread_id: String, thread_number: u32 },
    /// Rotation failed before any post was created
    Failed { reason: String },
    /// The new thread exists but the state flush failed; until a later
    /// flush succeeds, a restart may rotate this item again
    FlushFailed { thread_id: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreadReport {
    /// `[threads.items]` key
    pub key: String,
    pub outcome: ThreadOutcome,
    /// Post-creation migration problems that did not stop the rotation
    pub warnings: Vec<String>,
}

impl ThreadReport {
    pub fn synced(key: &str, body: TargetOutcome) -> Self {
        Self {
            key: key.to_string(),
            outcome: ThreadOutcome::Synced { body },
            warnings: Vec::new(),
        }
    }

    pub fn failed(key: &str, reason: String) -> Self {
        Self {
            key: key.to_string(),
            outcome: ThreadOutcome::Failed { reason },
            warnings: Vec::new(),
        }
    }

    pub fn is_failure(&self) -> bool {
        match &self.outcome {
            ThreadOutcome::Failed { .. } | ThreadOutcome::FlushFailed { .. } => true,
            ThreadOutcome::Synced { body } => matches!(body, TargetOutcome::Failed { .. }),
            ThreadOutcome::Rotated { .. } => false,
        }
    }
}

/// Everything one wakeup did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
    pub pairs: Vec<PairReport>,
    pub threads: Vec<ThreadReport>,
}

impl TickReport {
    pub fn has_failures(&self) -> bool {
        self.pairs.iter().any(PairReport::has_failures)
            || self.threads.iter().any(ThreadReport::is_failure)
    }

    /// One-line account of the tick for the loop log. Thread body syncs
    /// count with the target outcomes; the thread tally covers
    /// rotations and rotation failures only.
    pub fn summary(&self) -> String {
        let mut updated = 0usize;
        let mut unchanged = 0usize;
        let mut failed = self.pairs.iter().filter(|p| p.source_error.is_some()).count();
        let pair_outcomes = self.pairs.iter().flat_map(|pair| &pair.targets).map(|t| &t.outcome);
        let body_outcomes = self.threads.iter().filter_map(|t| match &t.outcome {
            ThreadOutcome::Synced { body } => Some(body),
            _ => None,
        });
        for outcome in pair_outcomes.chain(body_outcomes) {
            match outcome {
                TargetOutcome::Updated => updated += 1,
                TargetOutcome::Unchanged => unchanged += 1,
                TargetOutcome::Failed { .. } => failed += 1,
            }
        }
        let rotated = self
            .threads
            .iter()
            .filter(|t| matches!(t.outcome, ThreadOutcome::Rotated { .. }))
            .count();
        let thread_failures = self
            .threads
            .iter()
            .filter(|t| {
                matches!(
                    t.outcome,
                    ThreadOutcome::Failed { .. } | ThreadOutcome::FlushFailed { .. }
                )
            })
            .count();
        format!(
            "{updated} updated, {unchanged} unchanged, {failed} failed; \
             {rotated} rotated, {thread_failures} thread failures"
        )
    }
}
