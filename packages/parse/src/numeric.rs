//! Locale-formatted amount parsing.
//!
//! Amounts in return PDFs carry thousands separators (western and Indian
//! grouping), rupee glyphs, `-` / `Nil` placeholders and the odd layout
//! artifact. Nothing here ever fails: anything unparsable is `0.0`.

use std::sync::LazyLock;

use regex::Regex;

static NON_NUMERIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\d\s,.]").unwrap_or_else(|_| unreachable!()));

/// Grouped amounts: `1,000.00`, `1,00,000`, and `0.00` (under a thousand
/// there is nothing to group).
static GROUPED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d{1,3}(?:,\d{2,3})*\.\d+\b|\b\d{1,3}(?:,\d{2,3})+\b")
        .unwrap_or_else(|_| unreachable!())
});

static DECIMAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d+\.\d+\b").unwrap_or_else(|_| unreachable!()));

static INTEGER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d+\b").unwrap_or_else(|_| unreachable!()));

/// Line-scan patterns, tried in order.
static LINE_PATTERNS: [&LazyLock<Regex>; 3] = [&GROUPED_RE, &DECIMAL_RE, &INTEGER_RE];

static AMOUNT_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\d,]+\.?\d*").unwrap_or_else(|_| unreachable!()));

const PLACEHOLDERS: &[&str] = &["-", "–", "—", "nil", "na", "n/a"];

/// Normalizes an optional amount string to a float.
///
/// Absent values, blanks and "no data" placeholders are `0.0`, as is any
/// string that still fails to parse once separators and currency marks are
/// removed.
#[must_use]
pub fn normalize_amount(value: Option<&str>) -> f64 {
    let Some(raw) = value else {
        return 0.0;
    };

    let trimmed = raw.trim();
    if trimmed.is_empty()
        || PLACEHOLDERS
            .iter()
            .any(|p| trimmed.eq_ignore_ascii_case(p))
    {
        return 0.0;
    }

    let stripped = trimmed
        .trim_start_matches("Rs.")
        .trim_start_matches("INR")
        .replace(['E', 'F'], "");
    let cleaned: String = stripped
        .chars()
        .filter(|c| !matches!(c, ',' | '₹') && !c.is_whitespace())
        .collect();

    parse_finite(&cleaned).unwrap_or(0.0)
}

/// Parses a number after dropping grouping commas, rejecting non-finite
/// results such as `inf` or `NaN`.
#[must_use]
pub fn parse_amount(value: &str) -> Option<f64> {
    parse_finite(&value.trim().replace(',', ""))
}

fn parse_finite(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Extracts the numbers of a line with the first pattern that matches
/// anything: grouped amounts, then plain decimals, then integers.
///
/// Non-numeric characters are blanked first, so `₹1,000.00` and
/// `1,000.00/-` both read as `1000.0`.
#[must_use]
pub fn numbers_in_line(line: &str) -> Vec<f64> {
    let clean = NON_NUMERIC_RE.replace_all(line, " ");
    LINE_PATTERNS
        .iter()
        .map(|re| {
            re.find_iter(&clean)
                .filter_map(|m| parse_amount(m.as_str()))
                .collect::<Vec<f64>>()
        })
        .find(|numbers| !numbers.is_empty())
        .unwrap_or_default()
}

/// Extracts the amount tokens of a payment line.
///
/// Dash placeholders produce no token, so positions count numeric cells
/// only.
#[must_use]
pub fn amounts_in_line(line: &str) -> Vec<f64> {
    AMOUNT_TOKEN_RE
        .find_iter(line)
        .filter_map(|m| parse_amount(m.as_str()))
        .collect()
}
