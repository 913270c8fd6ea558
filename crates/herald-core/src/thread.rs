//! Scheduled thread rotation and live-thread upkeep
//!
//! A due thread item gets a successor posted from its template source,
//! then the retiring thread is migrated across: approval, pinning, a
//! redirect notice, and link rewrites on configured pages. Off cycle,
//! the item instead syncs the live thread's body from the same source,
//! replacing the auto-sync span the body was created with. Everything
//! after the create call is best-effort; the rotation itself commits
//! when the state flush lands on disk. Between the create and the
//! flush a crash leaves the new thread unrecorded, so a restart can
//! post a duplicate; within one process the in-memory record advances
//! before the flush and a failed flush cannot cause one.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

use herald_config::{
    DynamicState, EndpointKind, EndpointSettings, PinMode, StateStore, SyncPair, SyncTarget,
    ThreadSettings, ThreadState, flatten_context,
};
use herald_content::fill_template;

use crate::endpoint::EndpointId;
use crate::host::DocumentHost;
use crate::report::{TargetOutcome, ThreadOutcome, ThreadReport};
use crate::sync::{SyncEngine, prepare_section};

/// Anchor pattern wrapped around a generated thread body, so sync
/// items targeting the live thread can replace the span later.
pub const AUTO_SYNC_PATTERN: &str = "Auto Sync";

/// Revision note for writes made while migrating a retiring thread.
const MIGRATE_REASON: &str = "herald: thread rotation";

/// Rotates managed threads and migrates their predecessors.
pub struct ThreadLifecycle<'a> {
    host: &'a dyn DocumentHost,
    store: &'a StateStore,
}

impl<'a> ThreadLifecycle<'a> {
    pub fn new(host: &'a dyn DocumentHost, store: &'a StateStore) -> Self {
        Self { host, store }
    }

    /// Rotate `settings` if its interval says so, mutating and flushing
    /// `state` on success. The flush is the commit point. Off cycle,
    /// the live thread's body is synced from the item's source instead.
    ///
    /// An item with no live thread bootstraps on the first tick; one
    /// with rotation disabled never rotates but still gets body upkeep.
    pub fn manage(
        &self,
        settings: &ThreadSettings,
        state: &mut DynamicState,
        now: DateTime<Utc>,
    ) -> ThreadReport {
        let record = state.thread_entry(settings).clone();

        let Some(interval) = &settings.interval else {
            return match &record.thread_id {
                Some(thread_id) => {
                    debug!(item = %settings.key, "rotation disabled");
                    self.sync_body(settings, thread_id)
                }
                None => ThreadReport::failed(
                    &settings.key,
                    "no live thread and rotation is disabled".to_string(),
                ),
            };
        };

        if let Some(thread_id) = &record.thread_id {
            let last = match record.last_post_time {
                Some(last) => last,
                None => {
                    // Adopted thread: its age comes from the host, once.
                    match self
                        .host
                        .post_info(&settings.account, &settings.post_community, thread_id)
                    {
                        Ok(post) => {
                            state.thread_entry(settings).last_post_time = Some(post.created_at);
                            post.created_at
                        }
                        Err(host_error) => {
                            return ThreadReport::failed(
                                &settings.key,
                                format!("looking up adopted thread {thread_id}: {host_error}"),
                            );
                        }
                    }
                }
            };
            if !interval.next_due(last, now) {
                debug!(item = %settings.key, "not due");
                return self.sync_body(settings, thread_id);
            }
        }

        self.rotate(settings, state, &record, now)
    }

    fn rotate(
        &self,
        settings: &ThreadSettings,
        state: &mut DynamicState,
        previous: &ThreadState,
        now: DateTime<Utc>,
    ) -> ThreadReport {
        let mut warnings = Vec::new();
        let next_number = previous.thread_number + 1;
        info!(item = %settings.key, number = next_number, "rotating thread");

        // Built-ins describe the post being made, so the split identity
        // fields feed the template, not the moderating ones.
        let mut vars = flatten_context(&settings.context);
        vars.insert("community".to_string(), settings.post_community.clone());
        vars.insert("account".to_string(), settings.post_account.clone());
        vars.insert("thread_number".to_string(), next_number.to_string());
        vars.insert(
            "thread_number_previous".to_string(),
            previous.thread_number.to_string(),
        );
        if let Some(previous_id) = &previous.thread_id {
            vars.insert("thread_id_previous".to_string(), previous_id.clone());
        }
        vars.insert("date".to_string(), now.format("%Y-%m-%d").to_string());
        vars.insert(
            "datetime".to_string(),
            now.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        );

        let title = fill_template(&settings.title_template, &vars);
        let body = match self.build_body(settings) {
            Ok(body) => body,
            Err(reason) => return ThreadReport::failed(&settings.key, reason),
        };

        // Nothing is mutated until the post exists; a create failure
        // leaves the item exactly as it was.
        let created = match self.host.create_post(
            &settings.post_account,
            &settings.post_community,
            &title,
            &body,
        ) {
            Ok(created) => created,
            Err(host_error) => {
                return ThreadReport::failed(
                    &settings.key,
                    format!("creating thread: {host_error}"),
                );
            }
        };

        if settings.approve_new {
            if let Err(host_error) =
                self.host
                    .approve(&settings.account, &settings.post_community, &created.id)
            {
                warnings.push(format!("approving {}: {host_error}", created.id));
            }
        }
        self.migrate_pins(settings, previous.thread_id.as_deref(), &created.id, &mut warnings);

        if let Some(previous_id) = &previous.thread_id {
            vars.insert("post_title".to_string(), title.clone());
            vars.insert("thread_id".to_string(), created.id.clone());
            vars.insert("thread_url".to_string(), created.url.clone());
            self.leave_redirect(settings, previous_id, &vars, &mut warnings);
            self.update_links(settings, previous_id, &created.url, &mut warnings);
        }

        // Commit. The in-memory record advances first, so a failed
        // flush cannot make this process rotate the item twice.
        let record = state.thread_entry(settings);
        record.thread_id = Some(created.id.clone());
        record.thread_number = next_number;
        record.last_post_time = Some(now);

        let outcome = match self.store.save(state) {
            Ok(()) => ThreadOutcome::Rotated {
                thread_id: created.id,
                thread_number: next_number,
            },
            Err(save_error) => {
                error!(
                    item = %settings.key,
                    thread_id = %created.id,
                    %save_error,
                    "state flush failed after rotation, new thread needs manual verification"
                );
                ThreadOutcome::FlushFailed {
                    thread_id: created.id,
                    reason: save_error.to_string(),
                }
            }
        };
        ThreadReport {
            key: settings.key.clone(),
            outcome,
            warnings,
        }
    }

    /// New thread body: the template source's section through the usual
    /// prepare pipeline, wrapped in sync anchors. Only titles and
    /// redirect notices render template variables; body text passes
    /// through verbatim.
    fn build_body(&self, settings: &ThreadSettings) -> Result<String, String> {
        let source = &settings.source;
        let endpoint = EndpointId::from(source);
        let document = self
            .host
            .get(&endpoint)
            .map_err(|error| format!("fetching {endpoint}: {error}"))?;
        let section = source
            .marker
            .extract(&document)
            .map_err(|error| format!("reading {endpoint}: {error}"))?;

        let prepared = prepare_section(section, source);
        Ok(source.marker_for_pattern(AUTO_SYNC_PATTERN).wrap(&prepared))
    }

    /// Off-cycle upkeep: push the source section into the live thread's
    /// auto-sync span, exactly as a sync pair targeting the thread
    /// would. The synthetic target carries the source's transforms, so
    /// a body fresh from [`Self::build_body`] reads back unchanged.
    fn sync_body(&self, settings: &ThreadSettings, thread_id: &str) -> ThreadReport {
        let source = &settings.source;
        let target = EndpointSettings {
            kind: EndpointKind::Thread,
            community: settings.post_community.clone(),
            name: thread_id.to_string(),
            account: settings.post_account.clone(),
            enabled: true,
            marker: source.marker_for_pattern(AUTO_SYNC_PATTERN),
            replace_patterns: source.replace_patterns.clone(),
            truncate_lines: source.truncate_lines,
            context: source.context.clone(),
        };
        let pair = SyncPair {
            key: format!("{}.sync", settings.key),
            description: None,
            source: source.clone(),
            targets: vec![SyncTarget {
                key: "body".to_string(),
                settings: Ok(target),
            }],
        };

        let report = SyncEngine::new(self.host).sync_pair(&pair);
        let body = match report.source_error {
            Some(reason) => TargetOutcome::Failed { reason },
            None => report
                .targets
                .into_iter()
                .next()
                .map_or(TargetOutcome::Unchanged, |target| target.outcome),
        };
        ThreadReport::synced(&settings.key, body)
    }

    fn migrate_pins(
        &self,
        settings: &ThreadSettings,
        previous: Option<&str>,
        new_id: &str,
        warnings: &mut Vec<String>,
    ) {
        // Pin state lives on the posts, so these calls act in the
        // posting community under the moderating account.
        let account = &settings.account;
        let community = &settings.post_community;
        match settings.pin_mode {
            PinMode::None => {}
            PinMode::Top | PinMode::Bottom => {
                if let Some(previous_id) = previous {
                    if let Err(host_error) = self.host.unpin(account, community, previous_id) {
                        warnings.push(format!("unpinning {previous_id}: {host_error}"));
                    }
                }
                let bottom = settings.pin_mode == PinMode::Bottom;
                if let Err(host_error) = self.host.pin(account, community, new_id, bottom) {
                    warnings.push(format!("pinning {new_id}: {host_error}"));
                }
            }
            PinMode::Auto => {
                // Mirror the retiring thread: pin the successor only if
                // the predecessor was pinned, reusing its slot.
                let Some(previous_id) = previous else { return };
                let pinned = match self.host.pinned(account, community) {
                    Ok(pinned) => pinned,
                    Err(host_error) => {
                        warnings.push(format!("listing pinned threads: {host_error}"));
                        return;
                    }
                };
                let Some(slot) = pinned.iter().position(|id| id == previous_id) else {
                    debug!(item = %settings.key, "retiring thread was not pinned");
                    return;
                };
                if let Err(host_error) = self.host.unpin(account, community, previous_id) {
                    warnings.push(format!("unpinning {previous_id}: {host_error}"));
                }
                if let Err(host_error) = self.host.pin(account, community, new_id, slot > 0) {
                    warnings.push(format!("pinning {new_id}: {host_error}"));
                }
            }
        }
    }

    /// Prepend the redirect notice to the retiring thread's body.
    fn leave_redirect(
        &self,
        settings: &ThreadSettings,
        previous_id: &str,
        vars: &BTreeMap<String, String>,
        warnings: &mut Vec<String>,
    ) {
        if !settings.redirect_op {
            return;
        }
        let notice = fill_template(&settings.redirect_template, vars);
        let endpoint =
            EndpointId::thread(&settings.post_community, previous_id, &settings.post_account);
        let body = match self.host.get(&endpoint) {
            Ok(body) => body,
            Err(host_error) => {
                warnings.push(format!("fetching retiring thread {previous_id}: {host_error}"));
                return;
            }
        };
        let updated = if body.is_empty() {
            notice
        } else {
            format!("{notice}\n\n{body}")
        };
        if let Err(host_error) = self.host.put(&endpoint, &updated, MIGRATE_REASON) {
            warnings.push(format!("writing redirect to {previous_id}: {host_error}"));
        }
    }

    /// Rewrite links on the configured pages from the retiring thread's
    /// URL to the successor's.
    fn update_links(
        &self,
        settings: &ThreadSettings,
        previous_id: &str,
        new_url: &str,
        warnings: &mut Vec<String>,
    ) {
        if settings.link_update_pages.is_empty() {
            return;
        }
        let old_url = match self
            .host
            .post_info(&settings.post_account, &settings.post_community, previous_id)
        {
            Ok(post) => post.url,
            Err(host_error) => {
                warnings.push(format!(
                    "looking up {previous_id} for link updates: {host_error}"
                ));
                return;
            }
        };

        for page in &settings.link_update_pages {
            let endpoint = EndpointId {
                kind: herald_config::EndpointKind::WikiPage,
                community: settings.community.clone(),
                name: page.clone(),
                account: settings.account.clone(),
            };
            let content = match self.host.get(&endpoint) {
                Ok(content) => content,
                Err(host_error) => {
                    warnings.push(format!("fetching {endpoint}: {host_error}"));
                    continue;
                }
            };
            let updated = content.replace(&old_url, new_url);
            if updated == content {
                debug!(%endpoint, "no links to update");
                continue;
            }
            if let Err(host_error) = self.host.put(&endpoint, &updated, MIGRATE_REASON) {
                warnings.push(format!("updating links on {endpoint}: {host_error}"));
            }
        }
    }
}
