//! Scalar header fields (GSTIN, legal name, period, ...).

use std::collections::BTreeSet;

use gstr_extract_returns_models::{GeneralDetails, GeneralField};
use regex::Regex;

/// A labelled pattern for one [`GeneralField`].
///
/// Several rules may target the same field; the first one that matches
/// wins.
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub field: GeneralField,
    pub pattern: Regex,
}

/// Returns the trimmed first capture group of the first match.
#[must_use]
pub fn first_capture(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Applies every rule to the full document text.
///
/// Fields without a matching rule keep their "Not Found" sentinel and the
/// state is derived from whatever GSTIN was found.
#[must_use]
pub fn extract_general(document: &str, text: &str, rules: &[FieldRule]) -> GeneralDetails {
    let mut details = GeneralDetails::unresolved(document);
    let mut resolved = BTreeSet::new();

    for rule in rules {
        if resolved.contains(&rule.field) {
            continue;
        }
        if let Some(value) = first_capture(&rule.pattern, text) {
            details.set(rule.field, value);
            resolved.insert(rule.field);
        }
    }

    for field in GeneralField::all() {
        if !resolved.contains(field) {
            log::debug!("{document}: {field} not found");
        }
    }

    details
}
