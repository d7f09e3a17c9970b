//! Income Tax Department challan receipts (ITNS 281).
//!
//! Receipts come in two layouts. The newer one carries a "Tax Breakup
//! Details" table and is read line by line; the older one is a plain
//! `label : value` sheet read with anchored patterns.

use std::sync::LazyLock;

use regex::Regex;

use crate::{NOT_FOUND, TdsForm, TdsRecord, first_capture};

pub const WITH_BREAKUP_FIELDS: [&str; 12] = [
    "TAN",
    "Name",
    "Assessment Year",
    "Financial Year",
    "Nature of Payment",
    "Challan No.",
    "Tender Date",
    "Tax",
    "Interest",
    "Penalty",
    "Fee (Sec. 234E)",
    "TOTAL",
];

/// Breakup rows: line prefix and output field.
const BREAKUP_ROWS: &[(&str, &str)] = &[
    ("ATax", "Tax"),
    ("DInterest", "Interest"),
    ("EPenalty", "Penalty"),
    ("FFee under section 234E", "Fee (Sec. 234E)"),
    ("Total (A+B+C+D+E+F)", "TOTAL"),
];

/// Labelled lines whose value follows the last colon: line marker and
/// output field.
const LABELLED_ROWS: &[(&str, &str)] = &[
    ("Assessment Year", "Assessment Year"),
    ("Financial Year", "Financial Year"),
    ("Nature of Payment", "Nature of Payment"),
    ("Challan No", "Challan No."),
];

static NAME_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Name\s*:\s*").unwrap_or_else(|_| unreachable!()));

static WITHOUT_BREAKUP_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("TAN", r"TAN\s*:\s*([A-Z0-9]+)"),
        ("Name", r"TAN\s*:\s*[A-Z0-9]+\s*\n\s*([A-Za-z&.,\s]+)\n"),
        ("Assessment Year", r"Assessment Year\s*:\s*(\d{4}-\d{2})"),
        ("Financial Year", r"Financial Year\s*:\s*(\d{4}-\d{2})"),
        ("Nature of Payment", r"Nature of Payment\s*:\s*(\w+)"),
        ("Amount (in Rs.)", r"Amount \(in Rs\.\)\s*:\s*₹\s*([\d,]+)"),
        ("Challan No.", r"Challan No\s*:\s*(\d+)"),
        ("Tender Date", r"Tender Date\s*:\s*(\d{1,2}/\d{1,2}/\d{4})"),
    ]
    .into_iter()
    .map(|(field, pattern)| (field, Regex::new(pattern).unwrap_or_else(|_| unreachable!())))
    .collect()
});

fn after_last<'a>(line: &'a str, delimiter: char) -> &'a str {
    line.rsplit(delimiter).next().unwrap_or(line).trim()
}

/// Reads a receipt that carries a tax breakup table.
///
/// Each field takes the value of the last line that mentions it.
#[must_use]
pub fn extract_with_breakup(document: &str, text: &str) -> TdsRecord {
    let mut record = TdsRecord::new(document, TdsForm::ChallanWithBreakup);
    for field in WITH_BREAKUP_FIELDS {
        record.set(field, NOT_FOUND);
    }

    let lines: Vec<&str> = text.lines().collect();
    for (idx, line) in lines.iter().enumerate() {
        if line.contains("TAN") {
            record.set("TAN", after_last(line, ':'));
            if let Some(next) = lines.get(idx + 1) {
                record.set("Name", NAME_PREFIX_RE.replace(next.trim(), "").into_owned());
            }
        } else if let Some((_, field)) = LABELLED_ROWS
            .iter()
            .find(|(marker, _)| line.contains(marker))
        {
            record.set(field, after_last(line, ':'));
        } else if line.contains("Tender Date") {
            let raw = after_last(line, ':');
            let date = raw.split("Tax Breakup Details").next().unwrap_or(raw);
            record.set("Tender Date", date.trim());
        } else if let Some((_, field)) = BREAKUP_ROWS
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix))
        {
            record.set(field, after_last(line, '₹'));
        }
    }

    record
}

/// Reads a receipt without a tax breakup table.
#[must_use]
pub fn extract_without_breakup(document: &str, text: &str) -> TdsRecord {
    let mut record = TdsRecord::new(document, TdsForm::ChallanWithoutBreakup);
    for (field, pattern) in WITHOUT_BREAKUP_PATTERNS.iter() {
        record.set(field, first_capture(pattern, text));
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    const WITH_BREAKUP: &str = "\
Challan Receipt
TAN : MUMA12345B
Name : ACME TRADERS PRIVATE LIMITED
Assessment Year : 2025-26
Financial Year : 2024-25
Major Head : Income Tax (Other than Companies) (0021)
Nature of Payment : 94C
Amount (in Rs.) : ₹ 12,500
Challan No : 04512
Tender Date : 07/08/2024Tax Breakup Details
ATax ₹ 12,000
BSurcharge ₹ 0
CCess ₹ 0
DInterest ₹ 500
EPenalty ₹ 0
FFee under section 234E ₹ 0
Total (A+B+C+D+E+F) ₹ 12,500
";

    #[test]
    fn reads_breakup_receipt() {
        let record = extract_with_breakup("c.pdf", WITH_BREAKUP);
        assert_eq!(record.text("TAN"), Some("MUMA12345B"));
        assert_eq!(record.text("Name"), Some("ACME TRADERS PRIVATE LIMITED"));
        assert_eq!(record.text("Assessment Year"), Some("2025-26"));
        assert_eq!(record.text("Financial Year"), Some("2024-25"));
        assert_eq!(record.text("Nature of Payment"), Some("94C"));
        assert_eq!(record.text("Challan No."), Some("04512"));
        assert_eq!(record.text("Tender Date"), Some("07/08/2024"));
        assert_eq!(record.text("Tax"), Some("12,000"));
        assert_eq!(record.text("Interest"), Some("500"));
        assert_eq!(record.text("Fee (Sec. 234E)"), Some("0"));
        assert_eq!(record.text("TOTAL"), Some("12,500"));
    }

    #[test]
    fn breakup_fields_keep_fixed_order() {
        let record = extract_with_breakup("c.pdf", "Total (A+B+C+D+E+F) ₹ 10\nTAN : X1");
        let names: Vec<_> = record.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, WITH_BREAKUP_FIELDS);
        assert_eq!(record.text("Penalty"), Some(NOT_FOUND));
        assert_eq!(record.text("TOTAL"), Some("10"));
    }

    #[test]
    fn reads_plain_receipt() {
        let text = "\
TAN : PNEA99999C
GLOBAL EXPORTS & CO.
Assessment Year : 2024-25
Financial Year : 2023-24
Nature of Payment : 92B
Amount (in Rs.) : ₹ 1,00,000
Challan No : 20011
Tender Date : 7/3/2024
";
        let record = extract_without_breakup("p.pdf", text);
        assert_eq!(record.text("TAN"), Some("PNEA99999C"));
        assert_eq!(record.text("Name"), Some("GLOBAL EXPORTS & CO."));
        assert_eq!(record.text("Assessment Year"), Some("2024-25"));
        assert_eq!(record.text("Nature of Payment"), Some("92B"));
        assert_eq!(record.text("Amount (in Rs.)"), Some("1,00,000"));
        assert_eq!(record.text("Challan No."), Some("20011"));
        assert_eq!(record.text("Tender Date"), Some("7/3/2024"));
    }

    #[test]
    fn plain_receipt_reports_missing_fields() {
        let record = extract_without_breakup("p.pdf", "TAN : PNEA99999C");
        assert_eq!(record.fields.len(), 8);
        assert_eq!(record.text("TAN"), Some("PNEA99999C"));
        assert_eq!(record.text("Tender Date"), Some(NOT_FOUND));
    }
}
