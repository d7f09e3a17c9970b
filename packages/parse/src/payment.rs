//! Section-tagged payment table (Table 6.1).
//!
//! Payment lines are read one at a time after a section header ("(A) Other
//! than reverse charge" / "(B) Reverse charge") has been seen. Each line is
//! dispatched on its tax head prefix and its amount tokens are mapped to
//! named slots through the per-version layout table. The same tax head has
//! a different column layout in each section, and the layouts differ
//! between form versions.

use std::collections::BTreeMap;

use gstr_extract_pdf::grid::is_value_token;
use gstr_extract_returns_models::{
    PaymentField, PaymentRow, PaymentSchema, PaymentSection, PaymentValues, TaxHead,
};

use crate::numeric::amounts_in_line;
use crate::section::SectionAnchors;

/// Lowercase phrases identifying a section header line.
#[derive(Debug, Clone)]
pub struct SectionMarker {
    pub section: PaymentSection,
    /// The line must contain at least one of these.
    pub any: Vec<String>,
    /// The line must contain none of these.
    pub exclude: Vec<String>,
}

impl SectionMarker {
    #[must_use]
    pub fn matches(&self, line: &str) -> bool {
        self.any.iter().any(|m| line.contains(m.as_str()))
            && !self.exclude.iter().any(|m| line.contains(m.as_str()))
    }
}

/// Column mapping of one tax head within one section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentLayout {
    /// Lines with fewer amount tokens are ignored.
    pub min_values: usize,
    /// Slot filled from each token position. Missing positions read as 0.
    pub positions: Vec<(PaymentField, usize)>,
}

impl PaymentLayout {
    #[must_use]
    pub fn map(&self, amounts: &[f64]) -> Option<PaymentValues> {
        if amounts.len() < self.min_values {
            return None;
        }

        let mut values = PaymentValues::default();
        for (field, position) in &self.positions {
            values.set(*field, amounts.get(*position).copied().unwrap_or(0.0));
        }
        Some(values)
    }
}

/// A compiled payment table for one form version.
#[derive(Debug, Clone)]
pub struct PaymentRule {
    pub schema: PaymentSchema,
    pub section: SectionAnchors,
    /// Checked in order; the first match switches the active section.
    pub markers: Vec<SectionMarker>,
    /// Lowercase phrases marking header lines to skip.
    pub skip: Vec<String>,
    /// Shorter trimmed lines are ignored.
    pub min_line_len: usize,
    pub layouts: BTreeMap<(TaxHead, PaymentSection), PaymentLayout>,
}

/// Re-joins tax head labels that the PDF text split over several lines.
///
/// `Integrated` / `tax` / values (likewise `Central` and `State/UT`) and
/// `Cess` / values become single lines. Lines are trimmed.
#[must_use]
pub fn join_split_labels(text: &str) -> Vec<String> {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    let starts_with_value = |line: &str| {
        line.split_whitespace()
            .next()
            .is_some_and(is_value_token)
    };

    let mut joined = Vec::with_capacity(lines.len());
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        let lower = line.to_lowercase();

        if matches!(lower.as_str(), "integrated" | "central" | "state/ut")
            && lines.get(i + 1).is_some_and(|l| l.eq_ignore_ascii_case("tax"))
            && lines.get(i + 2).copied().is_some_and(starts_with_value)
        {
            joined.push(format!("{line} tax {}", lines[i + 2]));
            i += 3;
        } else if lower == "cess" && lines.get(i + 1).copied().is_some_and(starts_with_value) {
            joined.push(format!("{line} {}", lines[i + 1]));
            i += 2;
        } else {
            joined.push(line.to_owned());
            i += 1;
        }
    }

    joined
}

/// Recovers the payment table from a document's full text.
///
/// Always returns at least one row per (section, tax head) pair, sections
/// first, so every document has the same shape. Pairs without a matching
/// line get a zero row with `recovered == false`.
#[must_use]
pub fn recover_payments(document: &str, text: &str, rule: &PaymentRule) -> Vec<PaymentRow> {
    let window = rule.section.locate(text);
    if window.is_empty() {
        log::warn!("{document}: {} section not found", rule.schema.title);
    }

    let mut found: BTreeMap<(TaxHead, PaymentSection), Vec<PaymentValues>> = BTreeMap::new();
    let mut active: Option<PaymentSection> = None;

    for line in join_split_labels(window) {
        if line.is_empty() || line.chars().count() < rule.min_line_len {
            continue;
        }
        let lower = line.to_lowercase();

        if let Some(marker) = rule.markers.iter().find(|m| m.matches(&lower)) {
            active = Some(marker.section);
            continue;
        }

        if rule.skip.iter().any(|s| lower.contains(s.as_str())) {
            continue;
        }

        let Some(section) = active else {
            continue;
        };
        let Some(tax) = TaxHead::all()
            .iter()
            .copied()
            .find(|t| lower.starts_with(t.line_prefix()))
        else {
            continue;
        };
        let Some(layout) = rule.layouts.get(&(tax, section)) else {
            log::debug!("{document}: no {tax} layout for {section}");
            continue;
        };

        let amounts = amounts_in_line(&line);
        match layout.map(&amounts) {
            Some(values) => found.entry((tax, section)).or_default().push(values),
            None => log::debug!(
                "{document}: {tax} line in {section} has {} amounts, need {}",
                amounts.len(),
                layout.min_values,
            ),
        }
    }

    let mut rows = Vec::new();
    for section in PaymentSection::all() {
        for tax in TaxHead::all() {
            let row = |values: PaymentValues, recovered: bool| PaymentRow {
                document: document.to_owned(),
                tax: *tax,
                section: *section,
                values,
                recovered,
            };
            match found.remove(&(*tax, *section)) {
                Some(values) => rows.extend(values.into_iter().map(|v| row(v, true))),
                None => rows.push(row(PaymentValues::default(), false)),
            }
        }
    }

    rows
}

#[cfg(test)]
mod tests {
    use gstr_extract_returns_models::PaymentField::{
        InterestPaidInCash, ItcCentral, ItcCess, ItcIntegrated, ItcStateUt, LateFeePaidInCash,
        PaidInCash, TaxPayable,
    };
    use gstr_extract_returns_models::PaymentSection::{OtherThanReverseCharge as A, ReverseCharge as B};

    use super::*;

    const TABLE_6_1: &str = "\
6.1 Payment of tax
Description Total tax payable Tax paid through ITC Tax paid in cash Interest paid in cash Late fee paid in cash
Integrated tax Central tax State/UT tax Cess
(A) Other than reverse charge
Integrated tax 1825356.00 1825356.00 0.00 0.00 - 0.00 0.00 -
Central tax 16730998.00 2122418.00 14608580.00 - - 0.00 0.00 0.00
State/UT
tax
16730998.00 2122418.00 - 14608580.00 - 0.00 0.00 0.00
Cess 0.00 - - - 0.00 0.00 0.00 -
(B) Reverse charge
Central tax 71100.00 - - - - 71100.00 - -
Breakup of tax liability declared
Integrated tax 999.00 999.00
";

    fn marker(section: PaymentSection, any: &[&str], exclude: &[&str]) -> SectionMarker {
        SectionMarker {
            section,
            any: any.iter().map(|s| (*s).to_owned()).collect(),
            exclude: exclude.iter().map(|s| (*s).to_owned()).collect(),
        }
    }

    fn layout(min_values: usize, positions: &[(PaymentField, usize)]) -> PaymentLayout {
        PaymentLayout {
            min_values,
            positions: positions.to_vec(),
        }
    }

    fn rule_2024() -> PaymentRule {
        let mut layouts = BTreeMap::new();
        for section in [A, B] {
            layouts.insert(
                (TaxHead::Integrated, section),
                layout(
                    2,
                    &[
                        (TaxPayable, 0),
                        (ItcIntegrated, 1),
                        (ItcCentral, 2),
                        (ItcStateUt, 3),
                        (PaidInCash, 4),
                        (InterestPaidInCash, 5),
                    ],
                ),
            );
        }
        layouts.insert(
            (TaxHead::Central, A),
            layout(
                3,
                &[
                    (TaxPayable, 0),
                    (ItcIntegrated, 1),
                    (ItcCentral, 2),
                    (InterestPaidInCash, 3),
                    (LateFeePaidInCash, 4),
                ],
            ),
        );
        layouts.insert(
            (TaxHead::Central, B),
            layout(1, &[(TaxPayable, 0), (PaidInCash, 1)]),
        );
        layouts.insert(
            (TaxHead::StateUt, A),
            layout(
                3,
                &[
                    (TaxPayable, 0),
                    (ItcIntegrated, 1),
                    (ItcStateUt, 2),
                    (InterestPaidInCash, 3),
                    (LateFeePaidInCash, 4),
                ],
            ),
        );
        layouts.insert(
            (TaxHead::Cess, A),
            layout(
                1,
                &[
                    (TaxPayable, 0),
                    (ItcCess, 1),
                    (PaidInCash, 2),
                    (InterestPaidInCash, 3),
                ],
            ),
        );

        PaymentRule {
            schema: PaymentSchema {
                id: "table_6_1".to_owned(),
                title: "Table 6.1".to_owned(),
                columns: Vec::new(),
            },
            section: SectionAnchors {
                start: vec!["6.1 Payment of tax".to_owned()],
                end: vec!["Breakup of tax liability".to_owned()],
            },
            markers: vec![
                marker(A, &["other than reverse charge"], &[]),
                marker(B, &["reverse charge"], &["other than"]),
            ],
            skip: ["description", "total tax payable", "tax paid through", "integrated tax central tax"]
                .map(str::to_owned)
                .to_vec(),
            min_line_len: 0,
            layouts,
        }
    }

    fn find(rows: &[PaymentRow], tax: TaxHead, section: PaymentSection) -> &PaymentRow {
        rows.iter()
            .find(|r| r.tax == tax && r.section == section)
            .unwrap()
    }

    #[test]
    fn joins_split_tax_head_labels() {
        let lines = join_split_labels("State/UT\ntax\n1.00 2.00\nCess\n- 3.00\nCess\nheader");
        assert_eq!(lines, vec!["State/UT tax 1.00 2.00", "Cess - 3.00", "Cess", "header"]);
    }

    #[test]
    fn maps_positions_per_tax_head_and_section() {
        let rows = recover_payments("a.pdf", TABLE_6_1, &rule_2024());

        let integrated = find(&rows, TaxHead::Integrated, A);
        assert!(integrated.recovered);
        assert!((integrated.values.tax_payable - 1_825_356.0).abs() < f64::EPSILON);
        assert!((integrated.values.itc_integrated - 1_825_356.0).abs() < f64::EPSILON);

        let central = find(&rows, TaxHead::Central, A);
        assert!((central.values.tax_payable - 16_730_998.0).abs() < f64::EPSILON);
        assert!((central.values.itc_integrated - 2_122_418.0).abs() < f64::EPSILON);
        assert!((central.values.itc_central - 14_608_580.0).abs() < f64::EPSILON);
        assert!(central.values.paid_in_cash.abs() < f64::EPSILON);

        let state = find(&rows, TaxHead::StateUt, A);
        assert!(state.recovered);
        assert!((state.values.itc_state_ut - 14_608_580.0).abs() < f64::EPSILON);

        let central_b = find(&rows, TaxHead::Central, B);
        assert!((central_b.values.tax_payable - 71_100.0).abs() < f64::EPSILON);
        assert!((central_b.values.paid_in_cash - 71_100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn every_section_and_tax_head_has_a_row() {
        let rows = recover_payments("a.pdf", TABLE_6_1, &rule_2024());
        assert_eq!(rows.len(), 8);
        assert_eq!(rows[0].section, A);
        assert_eq!(rows[4].section, B);

        let integrated_b = find(&rows, TaxHead::Integrated, B);
        assert!(!integrated_b.recovered);
        assert_eq!(integrated_b.values, PaymentValues::default());
    }

    #[test]
    fn lines_after_the_section_end_are_ignored() {
        let rows = recover_payments("a.pdf", TABLE_6_1, &rule_2024());
        assert!(
            rows.iter()
                .all(|r| (r.values.tax_payable - 999.0).abs() > f64::EPSILON)
        );
    }

    #[test]
    fn rows_before_any_section_header_are_ignored() {
        let text = "6.1 Payment of tax\nIntegrated tax 5.00 5.00\n";
        let rows = recover_payments("a.pdf", text, &rule_2024());
        assert!(rows.iter().all(|r| !r.recovered));
    }

    #[test]
    fn missing_section_yields_zero_rows() {
        let rows = recover_payments("a.pdf", "no payment table", &rule_2024());
        assert_eq!(rows.len(), 8);
        assert!(rows.iter().all(|r| !r.recovered && r.document == "a.pdf"));
    }

    #[test]
    fn short_lines_are_skipped_when_configured() {
        let mut rule = rule_2024();
        rule.min_line_len = 10;
        let text = "6.1 Payment of tax\n(A) Other than reverse charge\nCess 1 2\n";
        let rows = recover_payments("a.pdf", text, &rule);
        assert!(!find(&rows, TaxHead::Cess, A).recovered);

        rule.min_line_len = 0;
        let rows = recover_payments("a.pdf", text, &rule);
        assert!(find(&rows, TaxHead::Cess, A).recovered);
    }

    #[test]
    fn too_few_amounts_reject_the_line() {
        let text = "6.1 Payment of tax\n(A) Other than reverse charge\nCentral tax 10.00 - -\n";
        let rows = recover_payments("a.pdf", text, &rule_2024());
        assert!(!find(&rows, TaxHead::Central, A).recovered);
    }

    #[test]
    fn header_matching_is_case_insensitive() {
        let text = "6.1 Payment of tax\n(A) OTHER THAN REVERSE CHARGE\nINTEGRATED TAX 7.00 7.00\n";
        let rows = recover_payments("a.pdf", text, &rule_2024());
        let integrated = find(&rows, TaxHead::Integrated, A);
        assert!(integrated.recovered);
        assert!((integrated.values.tax_payable - 7.0).abs() < f64::EPSILON);
    }
}
