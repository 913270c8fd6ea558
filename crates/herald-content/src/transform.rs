//! Ordered literal text substitutions, line truncation, and template fill

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One literal find/replace rule applied to synced content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaceRule {
    /// Literal substring to search for
    pub find: String,
    /// Literal replacement text
    pub replace: String,
}

impl ReplaceRule {
    pub fn new(find: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            find: find.into(),
            replace: replace.into(),
        }
    }
}

/// Apply replace rules strictly in order, each rule operating on the
/// previous rule's output, so a later rule may rewrite text introduced
/// by an earlier one.
pub fn apply_rules(text: &str, rules: &[ReplaceRule]) -> String {
    let mut output = text.to_string();
    for rule in rules {
        output = output.replace(&rule.find, &rule.replace);
    }
    output
}

/// Keep at most `limit` leading lines of `text`.
///
/// Text already within the limit is returned unchanged, trailing line
/// terminator included.
pub fn truncate_lines(text: &str, limit: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() <= limit {
        return text.to_string();
    }
    lines[..limit].join("\n")
}

/// Substitute `{key}` placeholders from `vars` into `template`.
///
/// Placeholders with no matching variable are left verbatim, so a stray
/// brace or a typo never aborts the caller.
pub fn fill_template(template: &str, vars: &BTreeMap<String, String>) -> String {
    let mut output = template.to_string();
    for (key, value) in vars {
        output = output.replace(&format!("{{{key}}}"), value);
    }
    output
}
