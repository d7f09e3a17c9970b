//! HDFC Bank challan counterfoils.
//!
//! The counterfoil is a fixed form: every field sits on a known line, so
//! fields are read by line index and token position rather than by label.

use crate::{TdsError, TdsForm, TdsRecord, TdsValue};

/// Lines the counterfoil layout reads from.
const MIN_LINES: usize = 20;

const DATE_OF_RECEIPT_LINE: usize = 12;
const NATURE_OF_PAYMENT_LINE: usize = 7;
const BASIC_TAX_LINE: usize = 9;
const CHALLAN_NO_LINE: usize = 10;
const PENALTY_LINE: usize = 12;
const CHALLAN_SERIAL_LINE: usize = 13;
const INTEREST_LINE: usize = 14;
const FEE_LINE: usize = 15;
const TOTAL_LINE: usize = 16;
const REALISATION_DATE_LINE: usize = 19;

/// Reads a counterfoil.
///
/// # Errors
///
/// * [`TdsError::TooShort`] if the text has fewer lines than the layout
/// * [`TdsError::Value`] if a numeric position holds something else
pub fn extract(document: &str, text: &str) -> Result<TdsRecord, TdsError> {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() < MIN_LINES {
        return Err(TdsError::TooShort {
            form: TdsForm::HdfcChallan,
            found: lines.len(),
            needed: MIN_LINES,
        });
    }

    let (total, drawn_on) = lines[TOTAL_LINE]
        .split_once("Drawn on")
        .unwrap_or((lines[TOTAL_LINE], ""));

    let mut record = TdsRecord::new(document, TdsForm::HdfcChallan);
    record.set(
        "Date of Receipt",
        token(lines[DATE_OF_RECEIPT_LINE], Position::Last, "Date of Receipt")?,
    );
    record.set(
        "Nature of Payment",
        lines[NATURE_OF_PAYMENT_LINE]
            .trim()
            .replace("Nature of Payment ", ""),
    );
    record.set(
        "Basic Tax",
        amount("Basic Tax", &lines[BASIC_TAX_LINE].replace("Basic Tax", ""))?,
    );
    record.set(
        "Interest",
        amount("Interest", token(lines[INTEREST_LINE], Position::At(1), "Interest")?)?,
    );
    record.set(
        "Penalty",
        amount("Penalty", token(lines[PENALTY_LINE], Position::At(1), "Penalty")?)?,
    );
    record.set(
        "Fee (Sec. 234E)",
        amount("Fee (Sec. 234E)", token(lines[FEE_LINE], Position::At(3), "Fee (Sec. 234E)")?)?,
    );
    record.set("TOTAL Amount", amount("TOTAL Amount", &total.replace("TOTAL", ""))?);
    record.set("Drawn on", drawn_on.trim());
    record.set(
        "Payment Realisation Date",
        token(lines[REALISATION_DATE_LINE], Position::Last, "Payment Realisation Date")?,
    );
    record.set(
        "Challan No",
        count("Challan No", token(lines[CHALLAN_NO_LINE], Position::Last, "Challan No")?)?,
    );
    record.set(
        "Challan Serial No.",
        count(
            "Challan Serial No.",
            token(lines[CHALLAN_SERIAL_LINE], Position::Last, "Challan Serial No.")?,
        )?,
    );

    Ok(record)
}

#[derive(Clone, Copy)]
enum Position {
    At(usize),
    Last,
}

fn token<'a>(line: &'a str, position: Position, field: &'static str) -> Result<&'a str, TdsError> {
    let mut tokens = line.split_whitespace();
    match position {
        Position::At(idx) => tokens.nth(idx),
        Position::Last => tokens.last(),
    }
    .ok_or_else(|| TdsError::Value {
        field,
        value: line.to_owned(),
    })
}

fn amount(field: &'static str, raw: &str) -> Result<TdsValue, TdsError> {
    let cleaned = raw.trim().replace(',', "");
    cleaned
        .parse::<f64>()
        .map(TdsValue::Number)
        .map_err(|_| TdsError::Value {
            field,
            value: raw.trim().to_owned(),
        })
}

/// Whole numbers such as challan numbers are written out as numbers too.
fn count(field: &'static str, raw: &str) -> Result<TdsValue, TdsError> {
    let cleaned = raw.trim().replace(',', "");
    cleaned
        .parse::<u32>()
        .map(|n| TdsValue::Number(f64::from(n)))
        .map_err(|_| TdsError::Value {
            field,
            value: raw.trim().to_owned(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counterfoil() -> String {
        [
            "HDFC BANK",
            "Challan No./ITNS 281",
            "Tax Deducted/Collected at Source from",
            "TAN MUMA12345B",
            "Name ACME TRADERS",
            "Assessment Year 2025-26",
            "Major Head 0021",
            "Nature of Payment 94C Contractors",
            "Minor Head 200",
            "Basic Tax 12,000.00",
            "BSR Code 0510308 Challan No 00421",
            "Surcharge 0.00",
            "Penalty 150.00 Date of Receipt 07/08/2024",
            "Education Cess 0.00 Challan Serial No. 12,345",
            "Interest 500.00 Others 0.00",
            "Fee u/s 234E 0.00",
            "TOTAL 12,650.00 Drawn on HDFC Bank Ltd",
            "Payment mode Net Banking",
            "Taxpayer Counterfoil",
            "Payment Realisation Date 08/08/2024",
        ]
        .join("\n")
    }

    #[test]
    fn reads_counterfoil_by_position() {
        let record = extract("h.pdf", &counterfoil()).unwrap();
        assert_eq!(record.text("Date of Receipt"), Some("07/08/2024"));
        assert_eq!(record.text("Nature of Payment"), Some("94C Contractors"));
        assert_eq!(record.get("Basic Tax"), Some(&TdsValue::Number(12_000.0)));
        assert_eq!(record.get("Interest"), Some(&TdsValue::Number(500.0)));
        assert_eq!(record.get("Penalty"), Some(&TdsValue::Number(150.0)));
        assert_eq!(record.get("Fee (Sec. 234E)"), Some(&TdsValue::Number(0.0)));
        assert_eq!(record.get("TOTAL Amount"), Some(&TdsValue::Number(12_650.0)));
        assert_eq!(record.text("Drawn on"), Some("HDFC Bank Ltd"));
        assert_eq!(record.text("Payment Realisation Date"), Some("08/08/2024"));
        assert_eq!(record.get("Challan No"), Some(&TdsValue::Number(421.0)));
        assert_eq!(record.get("Challan Serial No."), Some(&TdsValue::Number(12_345.0)));
    }

    #[test]
    fn short_text_is_rejected() {
        let err = extract("h.pdf", "HDFC BANK\nonly two lines").unwrap_err();
        assert!(matches!(
            err,
            TdsError::TooShort {
                found: 2,
                needed: MIN_LINES,
                ..
            }
        ));
    }

    #[test]
    fn non_numeric_amount_is_an_error() {
        let text = counterfoil().replace("Basic Tax 12,000.00", "Basic Tax twelve");
        let err = extract("h.pdf", &text).unwrap_err();
        assert!(matches!(err, TdsError::Value { field: "Basic Tax", .. }));
    }
}
