//! Layer resolution: fold partial overlays into validated work items
//!
//! Precedence, least to most specific:
//!
//! 1. global `[defaults]`
//! 2. module defaults (`[sync.defaults]` / `[threads.defaults]`)
//! 3. item defaults (`[sync.items.<k>.defaults]`)
//! 4. the item's `source` table
//! 5. a target's own table (targets only)
//!
//! A sync target therefore inherits everything its source set (pattern,
//! rules, identity) and overrides only what it declares itself, with
//! the source's replace rules always running before the target's own.

use tracing::debug;

use crate::error::{Error, Result};
use crate::interval::{FloatingUnit, IntervalSpec};
use crate::model::{StaticConfig, SyncItem};
use crate::overlay::{EndpointOverlay, ThreadOverlay};
use crate::settings::{
    DEFAULT_REDIRECT_TEMPLATE, DEFAULT_TITLE_TEMPLATE, EndpointKind, EndpointSettings,
    InitialThread, SyncPair, SyncTarget, ThreadSettings, Toggle,
};

use herald_content::{DEFAULT_END_SUFFIX, DEFAULT_START_SUFFIX, SectionMarker};

/// Whether an endpoint is being resolved as something read from or
/// something written to; some kinds are only valid on one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointRole {
    Source,
    Target,
}

/// Resolves layered configuration into per-item work descriptions.
///
/// Resolution is a pure function of the parsed config; errors are
/// produced per item (and per target within an item) so one broken
/// entry never hides the rest.
pub struct ConfigResolver<'a> {
    config: &'a StaticConfig,
}

impl<'a> ConfigResolver<'a> {
    pub fn new(config: &'a StaticConfig) -> Self {
        Self { config }
    }

    /// Fold `layers` (least specific first) and validate the result for
    /// `role`, applying hard defaults for fields no layer set.
    ///
    /// # Errors
    ///
    /// [`Error::MissingField`] when `community`, `name`, or `account`
    /// remain unset; [`Error::AliasAsSource`] for a `current_thread`
    /// endpoint in source position; [`Error::UnknownAccount`] when the
    /// resolved account has no `[accounts]` entry.
    pub fn resolve_endpoint(
        &self,
        layers: &[&EndpointOverlay],
        scope: &str,
        role: EndpointRole,
    ) -> Result<EndpointSettings> {
        let merged = EndpointOverlay::fold(layers);

        let kind = merged.kind.unwrap_or_default();
        if role == EndpointRole::Source && kind == EndpointKind::CurrentThread {
            return Err(Error::AliasAsSource {
                scope: scope.to_string(),
            });
        }

        let community = merged.community.ok_or_else(|| Error::MissingField {
            field: "community",
            scope: scope.to_string(),
        })?;
        let name = merged.name.ok_or_else(|| Error::MissingField {
            field: "name",
            scope: scope.to_string(),
        })?;
        let account = merged.account.ok_or_else(|| Error::MissingField {
            field: "account",
            scope: scope.to_string(),
        })?;
        if !self.config.accounts.contains_key(&account) {
            return Err(Error::UnknownAccount {
                account,
                scope: scope.to_string(),
            });
        }

        Ok(EndpointSettings {
            kind,
            community,
            name,
            account,
            enabled: merged.enabled.unwrap_or(true),
            marker: SectionMarker {
                pattern: merged.pattern.and_then(Toggle::into_option),
                pattern_start: merged
                    .pattern_start
                    .unwrap_or_else(|| DEFAULT_START_SUFFIX.to_string()),
                pattern_end: merged
                    .pattern_end
                    .unwrap_or_else(|| DEFAULT_END_SUFFIX.to_string()),
            },
            replace_patterns: merged.replace_patterns,
            truncate_lines: merged.truncate_lines.and_then(Toggle::into_option),
            context: merged.context,
        })
    }

    /// Resolve every enabled sync item into a [`SyncPair`], one keyed
    /// result per item.
    pub fn sync_pairs(&self) -> Vec<(String, Result<SyncPair>)> {
        let module = &self.config.sync;
        if !module.enabled {
            debug!("sync module disabled, no pairs resolved");
            return Vec::new();
        }

        let mut pairs = Vec::new();
        for (key, item) in &module.items {
            if !item.enabled {
                debug!(item = %key, "sync item disabled, skipping");
                continue;
            }
            match self.resolve_sync_item(key, item) {
                Ok(Some(pair)) => pairs.push((key.clone(), Ok(pair))),
                Ok(None) => {}
                Err(error) => pairs.push((key.clone(), Err(error))),
            }
        }
        pairs
    }

    fn resolve_sync_item(&self, key: &str, item: &SyncItem) -> Result<Option<SyncPair>> {
        let scope = format!("sync.items.{key}");
        let module = &self.config.sync;

        let source = self.resolve_endpoint(
            &[
                &self.config.defaults,
                &module.defaults,
                &item.defaults,
                &item.source,
            ],
            &format!("{scope}.source"),
            EndpointRole::Source,
        )?;
        if !source.enabled {
            debug!(item = %key, "sync source disabled, skipping item");
            return Ok(None);
        }

        if item.targets.is_empty() {
            return Err(Error::NoTargets { scope });
        }

        let mut targets = Vec::new();
        for (target_key, overlay) in &item.targets {
            let target_scope = format!("{scope}.targets.{target_key}");
            let settings = self.resolve_endpoint(
                &[
                    &self.config.defaults,
                    &module.defaults,
                    &item.defaults,
                    &item.source,
                    overlay,
                ],
                &target_scope,
                EndpointRole::Target,
            );
            match settings {
                Ok(resolved) if !resolved.enabled => {
                    debug!(target = %target_scope, "target disabled, skipping");
                }
                other => targets.push(SyncTarget {
                    key: target_key.clone(),
                    settings: other,
                }),
            }
        }
        if targets.is_empty() {
            debug!(item = %key, "every target disabled, skipping item");
            return Ok(None);
        }

        Ok(Some(SyncPair {
            key: key.to_string(),
            description: item.description.clone(),
            source,
            targets,
        }))
    }

    /// Resolve every thread item, one keyed result per item. Disabled
    /// items are resolved too (their `enabled` flag is part of the
    /// overlay); callers skip them.
    pub fn thread_items(&self) -> Vec<(String, Result<ThreadSettings>)> {
        let module = &self.config.threads;
        if !module.enabled {
            debug!("threads module disabled, no items resolved");
            return Vec::new();
        }

        module
            .items
            .iter()
            .map(|(key, item)| (key.clone(), self.resolve_thread_item(key, item)))
            .collect()
    }

    fn resolve_thread_item(&self, key: &str, item: &ThreadOverlay) -> Result<ThreadSettings> {
        let scope = format!("threads.items.{key}");

        let mut merged = ThreadOverlay::seeded_from(&self.config.defaults);
        merged.merge(&self.config.threads.defaults);
        merged.merge(item);

        let community = merged.community.clone().ok_or_else(|| Error::MissingField {
            field: "community",
            scope: scope.clone(),
        })?;
        let account = merged.account.clone().ok_or_else(|| Error::MissingField {
            field: "account",
            scope: scope.clone(),
        })?;
        if !self.config.accounts.contains_key(&account) {
            return Err(Error::UnknownAccount {
                account,
                scope,
            });
        }

        // Posting identity falls back field-by-field to the moderating
        // one.
        let post_account = merged
            .target_context
            .account
            .clone()
            .unwrap_or_else(|| account.clone());
        if !self.config.accounts.contains_key(&post_account) {
            return Err(Error::UnknownAccount {
                account: post_account,
                scope: format!("{scope}.target_context"),
            });
        }
        let post_community = merged
            .target_context
            .community
            .clone()
            .unwrap_or_else(|| community.clone());

        // The thread's identity and context sit beneath its source, so
        // the source inherits them unless it says otherwise.
        let identity = EndpointOverlay {
            community: Some(community.clone()),
            account: Some(account.clone()),
            context: merged.context.clone(),
            ..EndpointOverlay::default()
        };
        let source = self.resolve_endpoint(
            &[&self.config.defaults, &identity, &merged.source],
            &format!("{scope}.source"),
            EndpointRole::Source,
        )?;

        let interval = match merged.interval {
            None => Some(IntervalSpec::Floating(FloatingUnit::Months)),
            Some(Toggle::Off) => None,
            Some(Toggle::On(spec)) => Some(spec),
        };

        Ok(ThreadSettings {
            key: key.to_string(),
            enabled: merged.enabled.unwrap_or(true),
            community,
            account,
            post_account,
            post_community,
            title_template: merged
                .title_template
                .unwrap_or_else(|| DEFAULT_TITLE_TEMPLATE.to_string()),
            interval,
            pin_mode: merged.pin_mode.unwrap_or_default(),
            approve_new: merged.approve_new.unwrap_or(true),
            redirect_op: merged.redirect_op.unwrap_or(true),
            redirect_template: merged
                .redirect_template
                .unwrap_or_else(|| DEFAULT_REDIRECT_TEMPLATE.to_string()),
            link_update_pages: merged.link_update_pages.unwrap_or_default(),
            initial: InitialThread {
                thread_id: merged.initial.thread_id.and_then(Toggle::into_option),
                thread_number: merged.initial.thread_number.unwrap_or(0),
            },
            source,
            context: merged.context,
        })
    }

    /// Run full offline validation, collecting every resolution error
    /// across both modules.
    pub fn check(&self) -> Vec<Error> {
        let mut errors = Vec::new();

        let has_work = (self.config.sync.enabled && !self.config.sync.items.is_empty())
            || (self.config.threads.enabled && !self.config.threads.items.is_empty());
        if has_work && self.config.accounts.is_empty() {
            errors.push(Error::NoAccounts);
        }

        for (_, pair) in self.sync_pairs() {
            match pair {
                Ok(pair) => {
                    for target in pair.targets {
                        if let Err(error) = target.settings {
                            errors.push(error);
                        }
                    }
                }
                Err(error) => errors.push(error),
            }
        }
        for (_, item) in self.thread_items() {
            if let Err(error) = item {
                errors.push(error);
            }
        }
        errors
    }
}
