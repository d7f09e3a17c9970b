//! Bounded text windows for named return sections.

use serde::Deserialize;

/// Anchor phrases that open and close a section.
///
/// Both lists are tried in order and matched case-sensitively. End anchors
/// are only searched for after the start anchor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SectionAnchors {
    pub start: Vec<String>,
    #[serde(default)]
    pub end: Vec<String>,
}

impl SectionAnchors {
    /// Returns the section's text, from its start anchor up to (excluding)
    /// the first end anchor found, or to the end of `text`.
    ///
    /// An absent section is an empty string.
    #[must_use]
    pub fn locate<'a>(&self, text: &'a str) -> &'a str {
        let Some((start, anchor_len)) = self
            .start
            .iter()
            .find_map(|anchor| text.find(anchor.as_str()).map(|idx| (idx, anchor.len())))
        else {
            return "";
        };

        let body = start + anchor_len;
        let end = self
            .end
            .iter()
            .find_map(|anchor| text[body..].find(anchor.as_str()).map(|idx| body + idx))
            .unwrap_or(text.len());

        &text[start..end]
    }
}
