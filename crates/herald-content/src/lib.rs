//! Section codec and text transforms for Herald
//!
//! Locates anchor-delimited sections inside remote documents, extracts
//! and replaces their content without disturbing surrounding text, and
//! applies the ordered substitution and truncation rules configured for
//! a sync target. Purely textual; no network or filesystem concerns.

pub mod error;
pub mod section;
pub mod transform;

pub use error::{Error, Result};
pub use section::{DEFAULT_END_SUFFIX, DEFAULT_START_SUFFIX, SectionMarker};
pub use transform::{ReplaceRule, apply_rules, fill_template, truncate_lines};
