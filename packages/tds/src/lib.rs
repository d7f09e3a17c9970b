#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! TDS return and tax challan extraction.
//!
//! Each supported document kind ([`TdsForm`]) has a small, fixed set of
//! labelled fields. Extraction produces [`TdsRecord`]s: an ordered list of
//! `(name, value)` pairs per record, with [`NOT_FOUND`] for anything the
//! document does not show. Form 26Q/27Q returns produce a details record
//! followed by one record per challan summary row; every other kind
//! produces a single record.

pub mod challan;
pub mod form24;
pub mod form26;
pub mod hdfc;

use gstr_extract_pdf::ExtractedText;
pub use gstr_extract_returns_models::NOT_FOUND;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Errors for documents that cannot be read with the selected layout.
#[derive(Debug, thiserror::Error)]
pub enum TdsError {
    /// The document has fewer lines than the fixed layout needs.
    #[error("Document has {found} lines, the {form} layout needs at least {needed}")]
    TooShort {
        form: TdsForm,
        found: usize,
        needed: usize,
    },

    /// A positional field did not hold the expected kind of value.
    #[error("Unreadable {field} value: {value:?}")]
    Value { field: &'static str, value: String },
}

/// Kind of TDS document.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TdsForm {
    /// Quarterly salary TDS return.
    Form24q,
    /// Quarterly non-salary TDS return (Form 26Q and Form 27Q share a
    /// layout).
    Form26q,
    /// Income Tax Department challan with a tax breakup table.
    ChallanWithBreakup,
    /// Income Tax Department challan without a tax breakup table.
    ChallanWithoutBreakup,
    /// HDFC Bank challan counterfoil.
    HdfcChallan,
}

impl TdsForm {
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Form24q,
            Self::Form26q,
            Self::ChallanWithBreakup,
            Self::ChallanWithoutBreakup,
            Self::HdfcChallan,
        ]
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Form24q => "Form 24Q",
            Self::Form26q => "Form 26Q & Form 27Q",
            Self::ChallanWithBreakup => "Income Tax Department with Tax Breakup",
            Self::ChallanWithoutBreakup => "Income Tax Department without Tax Breakup",
            Self::HdfcChallan => "HDFC Bank",
        }
    }
}

/// A field value as it will be written out.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TdsValue {
    Text(String),
    Number(f64),
}

impl TdsValue {
    #[must_use]
    pub fn not_found() -> Self {
        Self::Text(NOT_FOUND.to_owned())
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Number(_) => None,
        }
    }
}

impl From<&str> for TdsValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for TdsValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Option<String>> for TdsValue {
    fn from(value: Option<String>) -> Self {
        value.map_or_else(Self::not_found, Self::Text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TdsField {
    pub name: String,
    pub value: TdsValue,
}

/// One output row of a TDS document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TdsRecord {
    /// Name of the source document.
    pub document: String,
    pub form: TdsForm,
    /// Fields in output column order.
    pub fields: Vec<TdsField>,
}

impl TdsRecord {
    #[must_use]
    pub fn new(document: &str, form: TdsForm) -> Self {
        Self {
            document: document.to_owned(),
            form,
            fields: Vec::new(),
        }
    }

    /// Sets `name`, replacing an earlier value or appending a new column.
    pub fn set(&mut self, name: &str, value: impl Into<TdsValue>) {
        let value = value.into();
        match self.fields.iter_mut().find(|f| f.name == name) {
            Some(field) => field.value = value,
            None => self.fields.push(TdsField {
                name: name.to_owned(),
                value,
            }),
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TdsValue> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.value)
    }

    /// Convenience accessor for text fields.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(TdsValue::as_text)
    }
}

/// Extracts the records of one document of kind `form`.
///
/// # Errors
///
/// Returns an error only for fixed-layout documents that do not fit their
/// layout; missing fields are reported as [`NOT_FOUND`].
pub fn extract_tds(
    form: TdsForm,
    document: &str,
    text: &ExtractedText,
) -> Result<Vec<TdsRecord>, TdsError> {
    let records = match form {
        TdsForm::Form24q => vec![form24::extract(document, text)],
        TdsForm::Form26q => form26::extract(document, text),
        TdsForm::ChallanWithBreakup => vec![challan::extract_with_breakup(document, &text.full_text())],
        TdsForm::ChallanWithoutBreakup => {
            vec![challan::extract_without_breakup(document, &text.full_text())]
        }
        TdsForm::HdfcChallan => vec![hdfc::extract(document, &text.full_text())?],
    };

    log::info!(
        "{document}: {} record(s) from {}",
        records.len(),
        form.label()
    );

    Ok(records)
}

/// Returns the trimmed first capture group of the first match.
fn first_capture(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Formats an amount with two decimals and comma thousands separators.
#[must_use]
pub fn format_amount(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (idx, digit) in int_part.chars().enumerate() {
        if idx > 0 && (int_part.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_amounts_with_grouping() {
        assert_eq!(format_amount(0.0), "0.00");
        assert_eq!(format_amount(999.5), "999.50");
        assert_eq!(format_amount(1_234_567.891), "1,234,567.89");
        assert_eq!(format_amount(-12_000.0), "-12,000.00");
    }

    #[test]
    fn set_replaces_existing_field_in_place() {
        let mut record = TdsRecord::new("a.pdf", TdsForm::ChallanWithBreakup);
        record.set("TAN", "MUMA12345B");
        record.set("Name", "ACME");
        record.set("TAN", "PNEA99999C");
        assert_eq!(record.fields.len(), 2);
        assert_eq!(record.fields[0].name, "TAN");
        assert_eq!(record.text("TAN"), Some("PNEA99999C"));
    }

    #[test]
    fn missing_optional_values_become_not_found() {
        let mut record = TdsRecord::new("a.pdf", TdsForm::Form26q);
        record.set("Date", None::<String>);
        assert_eq!(record.text("Date"), Some(NOT_FOUND));
    }

    #[test]
    fn every_form_has_a_label() {
        for form in TdsForm::all() {
            assert!(!form.label().is_empty());
        }
        assert_eq!(TdsForm::HdfcChallan.to_string(), "hdfc_challan");
    }
}
