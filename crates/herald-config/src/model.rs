//! Static configuration file model
//!
//! The raw shape of `config.toml` (or `.json`): account tables, the
//! global `[defaults]` overlay, and the `[sync]` / `[threads]` modules.
//! Everything stays partial here; [`crate::resolver`] folds the layers
//! into resolved work items.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::overlay::{EndpointOverlay, ThreadOverlay};

fn default_true() -> bool {
    true
}

fn default_wake_interval() -> u64 {
    60
}

/// Opaque per-account settings handed to the platform client
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountSettings {
    #[serde(flatten)]
    pub settings: Map<String, Value>,
}

/// One `[sync.items.<key>]` table
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncItem {
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Item-level defaults applied beneath both source and targets
    #[serde(default)]
    pub defaults: EndpointOverlay,
    #[serde(default)]
    pub source: EndpointOverlay,
    #[serde(default)]
    pub targets: BTreeMap<String, EndpointOverlay>,
}

/// The `[sync]` module table
#[derive(Debug, Clone, Deserialize)]
pub struct SyncModule {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub defaults: EndpointOverlay,
    #[serde(default)]
    pub items: BTreeMap<String, SyncItem>,
}

impl Default for SyncModule {
    fn default() -> Self {
        Self {
            enabled: true,
            defaults: EndpointOverlay::default(),
            items: BTreeMap::new(),
        }
    }
}

/// The `[threads]` module table; each item is itself a thread overlay
/// merged on top of `[threads.defaults]`
#[derive(Debug, Clone, Deserialize)]
pub struct ThreadsModule {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub defaults: ThreadOverlay,
    #[serde(default)]
    pub items: BTreeMap<String, ThreadOverlay>,
}

impl Default for ThreadsModule {
    fn default() -> Self {
        Self {
            enabled: true,
            defaults: ThreadOverlay::default(),
            items: BTreeMap::new(),
        }
    }
}

/// A parsed configuration file
#[derive(Debug, Clone, Deserialize)]
pub struct StaticConfig {
    /// Seconds the run loop sleeps between ticks
    #[serde(default = "default_wake_interval")]
    pub wake_interval_secs: u64,
    #[serde(default)]
    pub accounts: BTreeMap<String, AccountSettings>,
    /// Global overlay beneath every endpoint and thread item
    #[serde(default)]
    pub defaults: EndpointOverlay,
    #[serde(default)]
    pub sync: SyncModule,
    #[serde(default)]
    pub threads: ThreadsModule,
}

impl Default for StaticConfig {
    fn default() -> Self {
        Self {
            wake_interval_secs: default_wake_interval(),
            accounts: BTreeMap::new(),
            defaults: EndpointOverlay::default(),
            sync: SyncModule::default(),
            threads: ThreadsModule::default(),
        }
    }
}

/// Commented example configuration written by `herald init`
pub const EXAMPLE_CONFIG: &str = r####"# herald configuration
#
# Settings resolve least specific to most specific:
#   [defaults] -> module defaults -> item defaults -> source/target.
# Set a field once at the broadest level that works and override only
# where needed. `replace_patterns` lists concatenate across levels
# instead of overriding; `context` tables merge key by key.

wake_interval_secs = 60

# Accounts the agent may act as. Keys are referenced by `account`
# fields below; the values are handed to the platform client verbatim.
[accounts.main_bot]
site = "example"
client_id = "CLIENT_ID_HERE"

[accounts.announce_bot]
site = "example"
client_id = "SECOND_CLIENT_ID_HERE"

[defaults]
account = "main_bot"
community = "mycommunity"

[defaults.context]
signoff = "- the mod team"

# ---------------------------------------------------------------------
# Section sync: mirror anchor-delimited sections between documents.
# ---------------------------------------------------------------------
[sync]
enabled = true

[sync.items.rules]
description = "Mirror the rules section into the sidebar widget"

[sync.items.rules.source]
kind = "wiki_page"
name = "rules"
pattern = "Rules"

# Widgets have no anchors of their own: `pattern = false` replaces the
# whole widget body with the extracted section.
[sync.items.rules.targets.sidebar]
kind = "widget"
name = "Community Rules"
pattern = false
truncate_lines = 20

[[sync.items.rules.targets.sidebar.replace_patterns]]
find = "## "
replace = "### "

# ---------------------------------------------------------------------
# Periodic threads: recreated on a schedule, body synced in between.
# ---------------------------------------------------------------------
[threads]
enabled = true

[threads.items.discussion]
title_template = "{community} Discussion Thread (#{thread_number})"
interval = "monthly"
pin_mode = "auto"
approve_new = true
link_update_pages = ["index"]

[threads.items.discussion.initial]
thread_number = 0

# Identity the rotated post is published under. Pins, approvals, and
# the link pages above stay with the moderating account and community.
[threads.items.discussion.target_context]
account = "announce_bot"

[threads.items.discussion.source]
kind = "wiki_page"
name = "discussion_template"
pattern = "Thread Body"
"####;
