//! Resolved configuration types
//!
//! Everything in this module is the *output* of layer resolution: plain,
//! fully-populated values with every default already applied. The
//! partial, mergeable counterparts live in [`crate::overlay`].

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use herald_content::{ReplaceRule, SectionMarker};

use crate::interval::IntervalSpec;

/// Hard default for thread titles.
pub const DEFAULT_TITLE_TEMPLATE: &str = "{community} Discussion Thread (#{thread_number})";

/// Hard default for the notice injected into a retired thread.
pub const DEFAULT_REDIRECT_TEMPLATE: &str =
    "This thread is no longer being updated, and has been replaced by:\n\n# [{post_title}]({thread_url})";

/// The kind of remote document an endpoint addresses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointKind {
    /// A named wiki-style page
    #[default]
    WikiPage,
    /// The body of a specific post
    Thread,
    /// A text-backed sidebar widget
    Widget,
    /// Alias for a periodic item's live thread; `name` holds the
    /// `[threads.items]` key and the real post id comes from dynamic
    /// state at sync time
    CurrentThread,
}

impl fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::WikiPage => "wiki_page",
            Self::Thread => "thread",
            Self::Widget => "widget",
            Self::CurrentThread => "current_thread",
        };
        f.write_str(label)
    }
}

/// How a freshly rotated thread is pinned in its community
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PinMode {
    /// Never pin, never unpin
    None,
    /// Re-pin only if the retiring thread was pinned, reusing its slot
    #[default]
    Auto,
    /// Always pin to the top slot
    Top,
    /// Always pin to the bottom slot
    Bottom,
}

impl PinMode {
    fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Auto => "auto",
            Self::Top => "top",
            Self::Bottom => "bottom",
        }
    }
}

impl Serialize for PinMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PinMode {
    /// Accepts the mode name or a bare bool: `false` disables pinning
    /// and `true` means a plain bottom pin.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Flag(bool),
            Name(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Flag(false) => Ok(Self::None),
            Raw::Flag(true) => Ok(Self::Bottom),
            Raw::Name(name) => match name.as_str() {
                "none" => Ok(Self::None),
                "auto" => Ok(Self::Auto),
                "top" => Ok(Self::Top),
                "bottom" => Ok(Self::Bottom),
                other => Err(D::Error::unknown_variant(
                    other,
                    &["none", "auto", "top", "bottom"],
                )),
            },
        }
    }
}

/// A config value that may be explicitly disabled with `false`.
///
/// Distinct from leaving the field unset: an upper layer's `false`
/// switches the feature off even when a lower layer supplied a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle<T> {
    Off,
    On(T),
}

impl<T> Toggle<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Off => None,
            Self::On(value) => Some(value),
        }
    }
}

impl<T: Serialize> Serialize for Toggle<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Off => serializer.serialize_bool(false),
            Self::On(value) => value.serialize(serializer),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Toggle<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw<T> {
            Flag(bool),
            Value(T),
        }

        match Raw::<T>::deserialize(deserializer)? {
            Raw::Flag(false) => Ok(Self::Off),
            Raw::Flag(true) => Err(D::Error::custom("expected a value or `false`")),
            Raw::Value(value) => Ok(Self::On(value)),
        }
    }
}

/// A fully-resolved endpoint: where a document lives, which account acts
/// on it, and how its synced section is located and transformed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointSettings {
    pub kind: EndpointKind,
    /// Community/site container the document lives in
    pub community: String,
    /// Page name, post id, widget name, or thread-item key for aliases
    pub name: String,
    /// Account identity to act as
    pub account: String,
    pub enabled: bool,
    /// Anchor pair delimiting the synced section; whole-document when
    /// no pattern is configured
    pub marker: SectionMarker,
    /// Substitution rules, already concatenated across layers
    pub replace_patterns: Vec<ReplaceRule>,
    /// Keep at most this many lines of extracted content
    pub truncate_lines: Option<usize>,
    /// Template variables merged across layers
    pub context: serde_json::Map<String, serde_json::Value>,
}

impl EndpointSettings {
    /// Marker for the same endpoint with the pattern swapped out, used
    /// when a thread body is synced under its own dedicated anchor pair.
    pub fn marker_for_pattern(&self, pattern: impl Into<String>) -> SectionMarker {
        SectionMarker {
            pattern: Some(pattern.into()),
            pattern_start: self.marker.pattern_start.clone(),
            pattern_end: self.marker.pattern_end.clone(),
        }
    }
}

/// Seed values for a periodic item's dynamic state on first sight
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InitialThread {
    /// Pre-existing live thread to adopt, if any
    pub thread_id: Option<String>,
    /// Counter the next created thread continues from
    pub thread_number: u32,
}

/// A fully-resolved periodic thread item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreadSettings {
    /// `[threads.items]` key
    pub key: String,
    pub enabled: bool,
    /// Community the item is moderated from; link pages live here and
    /// rotated posts default to here
    pub community: String,
    /// Moderating account; approvals, pins, lookups, and link rewrites
    /// act as it
    pub account: String,
    /// Account the rotated thread is published as; defaults to `account`
    pub post_account: String,
    /// Community the rotated thread is published in; defaults to
    /// `community`
    pub post_community: String,
    /// Template for new thread titles
    pub title_template: String,
    /// Rotation cadence; `None` rotates only by manual intervention
    pub interval: Option<IntervalSpec>,
    pub pin_mode: PinMode,
    /// Approve the new thread right after creation
    pub approve_new: bool,
    /// Prepend a redirect notice to the retired thread's body
    pub redirect_op: bool,
    /// Template for the redirect notice
    pub redirect_template: String,
    /// Wiki pages whose links to the old thread are rewritten on rotation
    pub link_update_pages: Vec<String>,
    /// State seeds used when dynamic state has no entry yet
    pub initial: InitialThread,
    /// Where the thread body content is read from
    pub source: EndpointSettings,
    /// Template variables for titles and redirect notices
    pub context: serde_json::Map<String, serde_json::Value>,
}

/// One resolved target of a sync item; resolution errors are carried
/// per target so one broken target cannot hide its siblings.
#[derive(Debug)]
pub struct SyncTarget {
    pub key: String,
    pub settings: crate::error::Result<EndpointSettings>,
}

/// A fully-resolved sync item: one source, one or more targets.
///
/// Built fresh from static config each tick and discarded afterwards.
#[derive(Debug)]
pub struct SyncPair {
    pub key: String,
    pub description: Option<String>,
    pub source: EndpointSettings,
    pub targets: Vec<SyncTarget>,
}
