//! Section sync across remote documents
//!
//! One pass per pair: fetch the source document once, extract its
//! section, then prepare and write each target independently. A target
//! that fails is recorded and its siblings still run; only a source
//! failure abandons the pair.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use herald_config::{EndpointKind, EndpointSettings, SyncPair, SyncTarget};
use herald_content::{apply_rules, truncate_lines};

use crate::endpoint::EndpointId;
use crate::host::DocumentHost;
use crate::report::{PairReport, TargetOutcome, TargetReport};

/// Revision note attached to sync writes where the host keeps history.
const SYNC_REASON: &str = "herald: routine content sync";

/// Pushes source sections into their targets.
pub struct SyncEngine<'a> {
    host: &'a dyn DocumentHost,
    /// Live post id per managed-thread key, snapshotted for the tick;
    /// `current_thread` targets resolve through this map.
    thread_ids: BTreeMap<String, String>,
}

impl<'a> SyncEngine<'a> {
    pub fn new(host: &'a dyn DocumentHost) -> Self {
        Self {
            host,
            thread_ids: BTreeMap::new(),
        }
    }

    /// Fix where `current_thread` endpoints point for this pass.
    pub fn with_thread_ids(host: &'a dyn DocumentHost, thread_ids: BTreeMap<String, String>) -> Self {
        Self { host, thread_ids }
    }

    /// Run one sync pass over a resolved pair.
    pub fn sync_pair(&self, pair: &SyncPair) -> PairReport {
        debug!(item = %pair.key, "syncing pair");

        let source_id = EndpointId::from(&pair.source);
        let document = match self.host.get(&source_id) {
            Ok(document) => document,
            Err(error) => {
                warn!(item = %pair.key, %error, "source fetch failed");
                return PairReport::source_failed(&pair.key, format!("fetching {source_id}: {error}"));
            }
        };
        let section = match pair.source.marker.extract(&document) {
            Ok(section) => section,
            Err(error) => {
                warn!(item = %pair.key, %error, "source section missing");
                return PairReport::source_failed(&pair.key, format!("reading {source_id}: {error}"));
            }
        };

        let targets = pair
            .targets
            .iter()
            .map(|target| TargetReport {
                key: target.key.clone(),
                outcome: self.sync_target(section, target),
            })
            .collect();

        PairReport {
            key: pair.key.clone(),
            source_error: None,
            targets,
        }
    }

    fn sync_target(&self, section: &str, target: &SyncTarget) -> TargetOutcome {
        let settings = match &target.settings {
            Ok(settings) => settings,
            Err(error) => {
                return TargetOutcome::Failed {
                    reason: error.to_string(),
                };
            }
        };
        match self.push_section(section, settings) {
            Ok(outcome) => outcome,
            Err(reason) => {
                warn!(target = %target.key, %reason, "target sync failed");
                TargetOutcome::Failed { reason }
            }
        }
    }

    /// Write `section` into the target's marked span, skipping the
    /// write when the remote already matches byte for byte.
    fn push_section(&self, section: &str, settings: &EndpointSettings) -> Result<TargetOutcome, String> {
        let endpoint = self.address(settings)?;
        let prepared = prepare_section(section, settings);

        let current = self
            .host
            .get(&endpoint)
            .map_err(|error| format!("fetching {endpoint}: {error}"))?;
        let candidate = settings
            .marker
            .replace(&current, &prepared)
            .map_err(|error| format!("updating {endpoint}: {error}"))?;

        if candidate == current {
            debug!(%endpoint, "already current");
            return Ok(TargetOutcome::Unchanged);
        }

        self.host
            .put(&endpoint, &candidate, SYNC_REASON)
            .map_err(|error| format!("writing {endpoint}: {error}"))?;
        info!(%endpoint, "section updated");
        Ok(TargetOutcome::Updated)
    }

    /// Concrete address for an endpoint, resolving `current_thread`
    /// aliases through the tick's snapshot.
    fn address(&self, settings: &EndpointSettings) -> Result<EndpointId, String> {
        if settings.kind != EndpointKind::CurrentThread {
            return Ok(EndpointId::from(settings));
        }
        match self.thread_ids.get(&settings.name) {
            Some(thread_id) => Ok(EndpointId::thread(
                &settings.community,
                thread_id,
                &settings.account,
            )),
            None => Err(format!("no live thread for `{}` yet", settings.name)),
        }
    }
}

/// Target-side preparation: truncation first, then the ordered replace
/// rules.
pub(crate) fn prepare_section(section: &str, settings: &EndpointSettings) -> String {
    let truncated = match settings.truncate_lines {
        Some(limit) => truncate_lines(section, limit),
        None => section.to_string(),
    };
    apply_rules(&truncated, &settings.replace_patterns)
}
