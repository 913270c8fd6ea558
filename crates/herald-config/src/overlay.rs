//! Partial configuration layers and their merge rules
//!
//! Every level of the config hierarchy (global `[defaults]`, module
//! `defaults`, item `defaults`, source/target tables) deserializes into
//! the same overlay shape. Overlays merge strictly right-biased per
//! field: a later layer's set field wins, an unset field inherits.
//! Two exceptions, by contract: `replace_patterns` lists concatenate in
//! layer order, and `context` tables union recursively with later keys
//! winning.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use herald_content::ReplaceRule;

use crate::interval::IntervalSpec;
use crate::settings::{EndpointKind, PinMode, Toggle};

/// One partial endpoint configuration layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EndpointOverlay {
    pub kind: Option<EndpointKind>,
    pub community: Option<String>,
    pub name: Option<String>,
    pub account: Option<String>,
    pub enabled: Option<bool>,
    /// Section pattern; `false` forces whole-document mode
    pub pattern: Option<Toggle<String>>,
    pub pattern_start: Option<String>,
    pub pattern_end: Option<String>,
    #[serde(default)]
    pub replace_patterns: Vec<ReplaceRule>,
    /// Line cap for synced content; `false` disables an inherited cap
    pub truncate_lines: Option<Toggle<usize>>,
    #[serde(default)]
    pub context: Map<String, Value>,
}

impl EndpointOverlay {
    /// Merge a more specific layer into this one.
    ///
    /// Set fields in `other` override, `replace_patterns` append, and
    /// `context` keys union recursively with `other` winning.
    pub fn merge(&mut self, other: &EndpointOverlay) {
        if other.kind.is_some() {
            self.kind = other.kind;
        }
        if other.community.is_some() {
            self.community.clone_from(&other.community);
        }
        if other.name.is_some() {
            self.name.clone_from(&other.name);
        }
        if other.account.is_some() {
            self.account.clone_from(&other.account);
        }
        if other.enabled.is_some() {
            self.enabled = other.enabled;
        }
        if other.pattern.is_some() {
            self.pattern.clone_from(&other.pattern);
        }
        if other.pattern_start.is_some() {
            self.pattern_start.clone_from(&other.pattern_start);
        }
        if other.pattern_end.is_some() {
            self.pattern_end.clone_from(&other.pattern_end);
        }
        self.replace_patterns
            .extend(other.replace_patterns.iter().cloned());
        if other.truncate_lines.is_some() {
            self.truncate_lines.clone_from(&other.truncate_lines);
        }
        merge_context(&mut self.context, &other.context);
    }

    /// Fold an ordered slice of layers, least specific first, into one
    /// overlay.
    pub fn fold(layers: &[&EndpointOverlay]) -> EndpointOverlay {
        let mut merged = EndpointOverlay::default();
        for layer in layers {
            merged.merge(layer);
        }
        merged
    }
}

/// Partial seed state carried in thread item configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InitialOverlay {
    /// Live thread to adopt; `false` means start with none
    pub thread_id: Option<Toggle<String>>,
    pub thread_number: Option<u32>,
}

impl InitialOverlay {
    fn merge(&mut self, other: &InitialOverlay) {
        if other.thread_id.is_some() {
            self.thread_id.clone_from(&other.thread_id);
        }
        if other.thread_number.is_some() {
            self.thread_number = other.thread_number;
        }
    }
}

/// Partial posting-identity override carried in thread configuration.
///
/// A thread item moderates under its own `account`/`community` but may
/// publish each rotation under a different identity; unset fields fall
/// back to the moderating ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetContextOverlay {
    pub account: Option<String>,
    pub community: Option<String>,
}

impl TargetContextOverlay {
    fn merge(&mut self, other: &TargetContextOverlay) {
        if other.account.is_some() {
            self.account.clone_from(&other.account);
        }
        if other.community.is_some() {
            self.community.clone_from(&other.community);
        }
    }
}

/// One partial periodic-thread configuration layer.
///
/// `[threads.defaults]` and every `[threads.items.<key>]` table share
/// this shape; an item is just the most specific layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThreadOverlay {
    pub enabled: Option<bool>,
    pub community: Option<String>,
    pub account: Option<String>,
    pub title_template: Option<String>,
    /// Rotation cadence; `false` disables scheduled rotation
    pub interval: Option<Toggle<IntervalSpec>>,
    pub pin_mode: Option<PinMode>,
    pub approve_new: Option<bool>,
    pub redirect_op: Option<bool>,
    pub redirect_template: Option<String>,
    pub link_update_pages: Option<Vec<String>>,
    #[serde(default)]
    pub initial: InitialOverlay,
    #[serde(default)]
    pub target_context: TargetContextOverlay,
    #[serde(default)]
    pub source: EndpointOverlay,
    #[serde(default)]
    pub context: Map<String, Value>,
}

impl ThreadOverlay {
    /// Lift the identity fields of a global endpoint overlay into a
    /// thread base layer, so thread items inherit `community`, `account`,
    /// and context variables from `[defaults]` like endpoints do.
    pub fn seeded_from(defaults: &EndpointOverlay) -> ThreadOverlay {
        ThreadOverlay {
            community: defaults.community.clone(),
            account: defaults.account.clone(),
            context: defaults.context.clone(),
            ..ThreadOverlay::default()
        }
    }

    /// Merge a more specific layer into this one, nested `source`
    /// overlay included.
    pub fn merge(&mut self, other: &ThreadOverlay) {
        if other.enabled.is_some() {
            self.enabled = other.enabled;
        }
        if other.community.is_some() {
            self.community.clone_from(&other.community);
        }
        if other.account.is_some() {
            self.account.clone_from(&other.account);
        }
        if other.title_template.is_some() {
            self.title_template.clone_from(&other.title_template);
        }
        if other.interval.is_some() {
            self.interval.clone_from(&other.interval);
        }
        if other.pin_mode.is_some() {
            self.pin_mode = other.pin_mode;
        }
        if other.approve_new.is_some() {
            self.approve_new = other.approve_new;
        }
        if other.redirect_op.is_some() {
            self.redirect_op = other.redirect_op;
        }
        if other.redirect_template.is_some() {
            self.redirect_template.clone_from(&other.redirect_template);
        }
        if other.link_update_pages.is_some() {
            self.link_update_pages.clone_from(&other.link_update_pages);
        }
        self.initial.merge(&other.initial);
        self.target_context.merge(&other.target_context);
        self.source.merge(&other.source);
        merge_context(&mut self.context, &other.context);
    }
}

/// Union two context tables, recursing into sub-tables, `other` winning
/// on key collisions.
fn merge_context(base: &mut Map<String, Value>, other: &Map<String, Value>) {
    for (key, other_value) in other {
        if let Some(base_value) = base.get_mut(key) {
            deep_merge_value(base_value, other_value);
        } else {
            base.insert(key.clone(), other_value.clone());
        }
    }
}

/// Deep merge two JSON values: objects merge recursively with `other`
/// taking precedence, everything else is replaced outright.
fn deep_merge_value(base: &mut Value, other: &Value) {
    match (base, other) {
        (Value::Object(base_map), Value::Object(other_map)) => {
            for (key, other_val) in other_map {
                if let Some(base_val) = base_map.get_mut(key) {
                    deep_merge_value(base_val, other_val);
                } else {
                    base_map.insert(key.clone(), other_val.clone());
                }
            }
        }
        (base, other) => {
            *base = other.clone();
        }
    }
}

/// Flatten a context table into string template variables, dot-joining
/// nested table keys (`{author.name}`).
pub fn flatten_context(context: &Map<String, Value>) -> BTreeMap<String, String> {
    let mut vars = BTreeMap::new();
    flatten_into(&mut vars, "", context);
    vars
}

fn flatten_into(vars: &mut BTreeMap<String, String>, prefix: &str, map: &Map<String, Value>) {
    for (key, value) in map {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::Object(nested) => flatten_into(vars, &name, nested),
            Value::String(s) => {
                vars.insert(name, s.clone());
            }
            other => {
                vars.insert(name, other.to_string());
            }
        }
    }
}
