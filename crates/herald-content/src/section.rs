//! Anchor-delimited section location, extraction, and replacement
//!
//! Synced sections are delimited by a pair of invisible markdown anchors
//! derived from a configured pattern token, e.g. for the pattern `Rules`:
//!
//! ```text
//! [](/# Rules Start)
//!
//! ...synced content...
//!
//! [](/# Rules End)
//! ```
//!
//! The anchors render to nothing on every markdown surface the documents
//! live on, so they can sit in user-visible pages without polluting them.

use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::error::{Error, Result};

/// Suffix appended to the pattern to form the start anchor token.
pub const DEFAULT_START_SUFFIX: &str = " Start";
/// Suffix appended to the pattern to form the end anchor token.
pub const DEFAULT_END_SUFFIX: &str = " End";

/// Render one anchor string for a fully-suffixed pattern token.
fn anchor(token: &str) -> String {
    format!("[](/# {token})")
}

/// A start/end anchor pair delimiting one synced section.
///
/// A marker with no pattern treats the entire document as the section;
/// extraction returns the whole body and replacement produces a document
/// containing only the (re-padded) new section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionMarker {
    /// Section token, or `None` for whole-document mode
    pub pattern: Option<String>,
    /// Appended to the pattern to form the start anchor
    pub pattern_start: String,
    /// Appended to the pattern to form the end anchor
    pub pattern_end: String,
}

impl Default for SectionMarker {
    fn default() -> Self {
        Self::whole_document()
    }
}

impl SectionMarker {
    /// Marker for a named section using the default anchor suffixes
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: Some(pattern.into()),
            pattern_start: DEFAULT_START_SUFFIX.to_string(),
            pattern_end: DEFAULT_END_SUFFIX.to_string(),
        }
    }

    /// Marker treating the entire document body as the section
    pub fn whole_document() -> Self {
        Self {
            pattern: None,
            pattern_start: DEFAULT_START_SUFFIX.to_string(),
            pattern_end: DEFAULT_END_SUFFIX.to_string(),
        }
    }

    /// The literal start anchor, or `None` in whole-document mode
    pub fn start_anchor(&self) -> Option<String> {
        self.pattern
            .as_ref()
            .map(|p| anchor(&format!("{p}{}", self.pattern_start)))
    }

    /// The literal end anchor, or `None` in whole-document mode
    pub fn end_anchor(&self) -> Option<String> {
        self.pattern
            .as_ref()
            .map(|p| anchor(&format!("{p}{}", self.pattern_end)))
    }

    /// Locate the inner span between the first start anchor and the first
    /// end anchor that follows it.
    ///
    /// # Errors
    ///
    /// [`Error::SectionNotFound`] when either anchor is missing or the
    /// only end anchor precedes the start anchor;
    /// [`Error::MalformedSection`] when a second start anchor occurs
    /// before the first end anchor.
    pub fn locate(&self, document: &str) -> Result<Range<usize>> {
        let (Some(start), Some(end)) = (self.start_anchor(), self.end_anchor()) else {
            return Ok(0..document.len());
        };

        let start_pos = document
            .find(&start)
            .ok_or_else(|| Error::SectionNotFound {
                anchor: start.clone(),
            })?;
        let content_start = start_pos + start.len();

        let end_offset =
            document[content_start..]
                .find(&end)
                .ok_or_else(|| Error::SectionNotFound {
                    anchor: end.clone(),
                })?;
        let content_end = content_start + end_offset;

        if let Some(extra) = document[content_start..content_end].find(&start) {
            return Err(Error::MalformedSection {
                anchor: start,
                position: content_start + extra,
            });
        }

        Ok(content_start..content_end)
    }

    /// Extract the section content, verbatim, including any padding
    /// between the anchors and the content itself.
    pub fn extract<'a>(&self, document: &'a str) -> Result<&'a str> {
        let span = self.locate(document)?;
        Ok(&document[span])
    }

    /// Replace the section content, leaving everything outside the
    /// anchors untouched.
    ///
    /// The new content is trimmed and re-padded with blank lines so the
    /// anchors and the synced text sit on their own lines regardless of
    /// how the source was formatted. Passing back content previously
    /// returned by [`extract`](Self::extract) yields the input document
    /// unchanged, byte for byte.
    pub fn replace(&self, document: &str, section: &str) -> Result<String> {
        let span = self.locate(document)?;
        if &document[span.clone()] == section {
            return Ok(document.to_string());
        }

        let padded = pad_section(section);
        if self.pattern.is_none() {
            return Ok(padded);
        }

        let mut result = String::with_capacity(document.len() + padded.len());
        result.push_str(&document[..span.start]);
        result.push_str(&padded);
        result.push_str(&document[span.end..]);
        Ok(result)
    }

    /// Render a fresh document body consisting solely of this marker's
    /// anchors around the given content, ready for later [`replace`]
    /// calls against it.
    ///
    /// [`replace`]: Self::replace
    pub fn wrap(&self, content: &str) -> String {
        match (self.start_anchor(), self.end_anchor()) {
            (Some(start), Some(end)) => format!("{start}{}{end}", pad_section(content)),
            _ => content.trim().to_string(),
        }
    }
}

/// Trim and re-pad section content with blank lines on both sides.
fn pad_section(content: &str) -> String {
    format!("\n\n{}\n\n", content.trim())
}
