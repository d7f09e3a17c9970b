//! Form 26Q / 27Q quarterly return statements.

use std::sync::LazyLock;

use gstr_extract_pdf::ExtractedText;
use regex::{Regex, RegexBuilder};

use crate::{TdsForm, TdsRecord, first_capture};

static PERIOD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"period\s+(Q\d)").unwrap_or_else(|_| unreachable!()));

static DATE_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(From\s+(\d{2}/\d{2}/\d{2})\s+to\s+(\d{2}/\d{2}/\d{2})")
        .unwrap_or_else(|_| unreachable!())
});

static FORM_NO_RE: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"Form\s+No\.\s*(\d{2}\w)")
        .case_insensitive(true)
        .build()
        .unwrap_or_else(|_| unreachable!())
});

static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Date:\s*(\d{2}/\d{2}/\d{4})").unwrap_or_else(|_| unreachable!()));

/// Column headers of the challan summary table.
pub const TABLE_HEADERS: [&str; 6] = [
    "Sr. No.",
    "Return Type",
    "No. of Deductee / Party Records",
    "Amount Paid (₹)",
    "Tax Deducted / Collected (₹)",
    "Tax Deposited (₹)",
];

/// Returns the statement details record followed by one record per
/// summary table row.
#[must_use]
pub fn extract(document: &str, text: &ExtractedText) -> Vec<TdsRecord> {
    let full_text = text.full_text();
    let mut records = vec![details(document, &full_text)];

    let mut rows = text
        .grids()
        .flat_map(|grid| grid.rows.iter())
        .filter(|row| row.len() == TABLE_HEADERS.len())
        .peekable();

    if rows.peek().is_some_and(|row| row[0] == TABLE_HEADERS[0]) {
        rows.next();
    }

    for row in rows {
        let mut record = TdsRecord::new(document, TdsForm::Form26q);
        for (header, cell) in TABLE_HEADERS.iter().zip(row) {
            record.set(header, cell.as_str());
        }
        records.push(record);
    }

    log::debug!("{document}: {} summary rows", records.len() - 1);

    records
}

fn details(document: &str, text: &str) -> TdsRecord {
    let mut record = TdsRecord::new(document, TdsForm::Form26q);

    record.set("Period", first_capture(&PERIOD_RE, text));
    record.set(
        "Date Range",
        DATE_RANGE_RE
            .captures(text)
            .map(|caps| format!("{} to {}", &caps[1], &caps[2])),
    );
    // The first "Form No." is the form's own title; the filed form number
    // is the second.
    record.set(
        "Form No.",
        FORM_NO_RE
            .captures_iter(text)
            .nth(1)
            .map(|caps| caps[1].to_owned()),
    );
    record.set("Date", first_capture(&DATE_RE, text));

    record
}
