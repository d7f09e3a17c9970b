//! Form 24Q quarterly salary return statements.
//!
//! Only the first page with text is read: it carries the statement header
//! and the totals row.

use std::sync::LazyLock;

use gstr_extract_pdf::ExtractedText;
use regex::{Regex, RegexBuilder};

use crate::{TdsForm, TdsRecord, first_capture, format_amount};

static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4}-\d{4}|\d{4}-\d{2})").unwrap_or_else(|_| unreachable!())
});

static QUARTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Q(\d)").unwrap_or_else(|_| unreachable!()));

static REGULAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new("Regular")
        .case_insensitive(true)
        .build()
        .unwrap_or_else(|_| unreachable!())
});

static STATEMENT_TYPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"Type of Statement[^\n]*?(Regular|Original|Correction)")
        .case_insensitive(true)
        .build()
        .unwrap_or_else(|_| unreachable!())
});

static FILING_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(\d{1,2}\s+(?:January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{4})",
    )
    .unwrap_or_else(|_| unreachable!())
});

static AMOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d,]*\.?\d*").unwrap_or_else(|_| unreachable!()));

/// Minimum number of digits for a token to count as a statement total.
const MIN_TOTAL_DIGITS: usize = 8;

pub const TOTAL_TAX_DEDUCTED: &str = "Total Tax Deducted (₹)";
pub const TOTAL_CHALLAN_AMOUNT: &str = "Total Challan Amount (₹)";
pub const TOTAL_TAX_DEPOSITED: &str = "Total Tax Deposited as per Deductee Details (₹)";

#[must_use]
pub fn extract(document: &str, text: &ExtractedText) -> TdsRecord {
    let page = text.first_text_page().map_or("", |p| p.text.as_str());
    let mut record = TdsRecord::new(document, TdsForm::Form24q);

    record.set(
        "Form No.",
        page.contains("24Q").then(|| "24Q".to_owned()),
    );
    record.set("Financial Year", first_capture(&YEAR_RE, page));
    record.set(
        "Quarter",
        first_capture(&QUARTER_RE, page).map(|q| format!("Q{q}")),
    );
    record.set(
        "Periodicity",
        REGULAR_RE.is_match(page).then(|| "Regular".to_owned()),
    );
    record.set("Date of Filing", first_capture(&FILING_DATE_RE, page));

    let totals = page.lines().find_map(totals_row);
    if totals.is_none() {
        log::debug!("{document}: no totals row on the first page");
    }
    let [deducted, challan, deposited] = totals.map_or([None, None, None], |t| t.map(Some));
    record.set(TOTAL_TAX_DEDUCTED, deducted);
    record.set(TOTAL_CHALLAN_AMOUNT, challan);
    record.set(TOTAL_TAX_DEPOSITED, deposited);

    record.set(
        "Type of Statement",
        first_capture(&STATEMENT_TYPE_RE, page),
    );

    record
}

/// Reads the totals from a row holding at least three large amounts.
///
/// The challan amount is the largest; tax deducted is the second amount
/// unless that one is the largest, in which case it is the first; tax
/// deposited is the third. Returned formatted, in that order.
fn totals_row(line: &str) -> Option<[String; 3]> {
    let amounts: Vec<f64> = AMOUNT_RE
        .find_iter(line)
        .map(|m| m.as_str())
        .filter(|token| token.chars().filter(char::is_ascii_digit).count() >= MIN_TOTAL_DIGITS)
        .filter_map(|token| token.replace(',', "").parse::<f64>().ok())
        .collect();

    if amounts.len() < 3 {
        return None;
    }

    let max_idx = amounts
        .iter()
        .enumerate()
        .fold(0, |best, (idx, value)| if *value > amounts[best] { idx } else { best });
    let deducted_idx = if max_idx == 1 { 0 } else { 1 };

    Some([
        format_amount(amounts[deducted_idx]),
        format_amount(amounts[max_idx]),
        format_amount(amounts[2]),
    ])
}
