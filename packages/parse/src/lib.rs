#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Field, table and payment row recovery for GST return text.
//!
//! A [`CompiledTemplate`] describes one return form version. Running it
//! over a document's [`ExtractedText`] yields the document's general
//! details, one row per category of every category table and the
//! section-tagged payment rows. Extraction never fails: anything that
//! cannot be read comes back as a "Not Found" field or a zero row, so every
//! document produces the same shape.

pub mod fields;
pub mod numeric;
pub mod payment;
pub mod recover;
pub mod registry;
pub mod section;
pub mod template;

use gstr_extract_pdf::ExtractedText;
use gstr_extract_returns_models::{GeneralDetails, PaymentRow, TableRow};
use serde::Serialize;

pub use registry::TemplateRegistry;
pub use template::{CompiledTemplate, TemplateError};

/// Everything recovered from one return document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnExtraction {
    pub general: GeneralDetails,
    pub tables: Vec<TableRow>,
    pub payments: Vec<PaymentRow>,
}

/// Runs `template` over one document.
#[must_use]
pub fn extract_return(
    document: &str,
    text: &ExtractedText,
    template: &CompiledTemplate,
) -> ReturnExtraction {
    let full_text = text.full_text();
    if full_text.trim().is_empty() {
        log::warn!("{document}: no text to extract from");
    }

    let general = fields::extract_general(document, &full_text, &template.fields);

    let tables: Vec<TableRow> = template
        .tables
        .iter()
        .flat_map(|rule| recover::recover_table(document, &full_text, rule))
        .collect();

    let payments = template
        .payment
        .as_ref()
        .map(|rule| payment::recover_payments(document, &full_text, rule))
        .unwrap_or_default();

    log::info!(
        "{document}: {} ({}), {}/{} table rows and {}/{} payment rows recovered",
        template.name,
        general.gstin,
        tables.iter().filter(|r| !r.is_default()).count(),
        tables.len(),
        payments.iter().filter(|r| r.recovered).count(),
        payments.len(),
    );

    ReturnExtraction {
        general,
        tables,
        payments,
    }
}

#[cfg(test)]
mod tests {
    use gstr_extract_returns_models::{NOT_FOUND, PaymentSection, RecoveryStrategy, TaxHead};

    use super::*;

    const GSTR3B_2024: &str = "\
Form GSTR-3B
Year 2024-25
Period April
1. GSTIN of the supplier 29AABCT1332L1ZU
2(a). Legal name of the registered person BLUE RIVER FOODS LLP
Date of ARN 20/05/2024
3.1 Details of Outward Supplies and inward supplies liable to reverse charge
Nature of Supplies Total Taxable Value Integrated Tax Central Tax State/UT Tax Cess
(a) Outward taxable supplies (other than zero rated, nil rated and exempted) 1,000.00 180.00 0.00 0.00 0.00
(b) Outward taxable supplies (zero rated) 0.00 0.00 - - 0.00
(d) Inward supplies (liable to reverse charge) 500.00 0.00 45.00 45.00 0.00
3.1.1 Details of Supplies notified under section 9(5)
4. Eligible ITC
Details Integrated tax Central tax State/UT tax Cess
(5) All other ITC 4,162,091.37 359,432.35 359,432.35 0.00
B. ITC Reversed
(2) Others 0.00 43,560.51 43,560.51 0.00
C. Net ITC available (A-B) 3,330,656.76 168,954.99 168,954.99 0.00
5. Values of exempt, nil-rated and non-GST inward supplies
\x0C6.1 Payment of tax
(A) Other than reverse charge
Integrated tax 1825356.00 1825356.00 0.00 0.00 - 0.00 0.00 -
Central tax 16730998.00 2122418.00 14608580.00 - - 0.00 0.00 0.00
(B) Reverse charge
Central tax 71100.00 - - - - 71100.00 - -
Breakup of tax liability declared
";

    fn extract(id: &str, raw: &str) -> ReturnExtraction {
        let registry = TemplateRegistry::load().unwrap();
        let text = ExtractedText::from_pages(raw.split('\x0C'));
        extract_return("sample.pdf", &text, registry.get(id).unwrap())
    }

    #[test]
    fn extracts_general_details() {
        let result = extract("gstr3b_2024", GSTR3B_2024);
        assert_eq!(result.general.gstin, "29AABCT1332L1ZU");
        assert_eq!(result.general.state, "Karnataka");
        assert_eq!(result.general.legal_name, "BLUE RIVER FOODS LLP");
        assert_eq!(result.general.filing_date, "20/05/2024");
        assert_eq!(result.general.financial_year, "2024-25");
        assert_eq!(result.general.period, "April");
    }

    #[test]
    fn recovers_table_rows_in_fixed_shape() {
        let result = extract("gstr3b_2024", GSTR3B_2024);
        let table_3_1: Vec<_> = result.tables.iter().filter(|r| r.table == "table_3_1").collect();
        let table_4: Vec<_> = result.tables.iter().filter(|r| r.table == "table_4").collect();
        assert_eq!(table_3_1.len(), 5);
        assert_eq!(table_4.len(), 11);

        assert_eq!(table_3_1[0].values, vec![1000.0, 180.0, 0.0, 0.0, 0.0]);
        assert_eq!(table_3_1[0].strategy, RecoveryStrategy::Grid);
        assert_eq!(table_3_1[3].values, vec![500.0, 0.0, 45.0, 45.0, 0.0]);
        assert!(table_3_1[4].is_default());

        let all_other = table_4.iter().find(|r| r.label == "(5) All other ITC").unwrap();
        assert_eq!(all_other.values, vec![4_162_091.37, 359_432.35, 359_432.35, 0.0]);
    }

    #[test]
    fn recovers_payment_rows_with_section_tags() {
        let result = extract("gstr3b_2024", GSTR3B_2024);
        assert_eq!(result.payments.len(), 8);

        let central_a = result
            .payments
            .iter()
            .find(|r| r.tax == TaxHead::Central && r.section == PaymentSection::OtherThanReverseCharge)
            .unwrap();
        assert!((central_a.values.itc_central - 14_608_580.0).abs() < f64::EPSILON);

        let central_b = result
            .payments
            .iter()
            .find(|r| r.tax == TaxHead::Central && r.section == PaymentSection::ReverseCharge)
            .unwrap();
        assert!((central_b.values.paid_in_cash - 71_100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn garbage_text_keeps_schema_stable() {
        let result = extract("gstr3b_2025", "completely unrelated content\nwith no anchors");
        assert_eq!(result.general.gstin, NOT_FOUND);
        assert_eq!(result.tables.len(), 16);
        assert!(result.tables.iter().all(TableRow::is_default));
        assert_eq!(result.payments.len(), 8);
        assert!(result.payments.iter().all(|r| !r.recovered));
    }

    #[test]
    fn gstr1_totals_and_b2b_tables() {
        let text = "\
GSTIN: 27AAACR5055K1Z7
Legal name of the registered person: ACME TRADERS PVT LTD
Financial year 2024-25
Tax period April
4A - Taxable outward supplies made to registered persons (other than reverse charge supplies)
Total 12 Invoice 1,00,000.00 18,000.00 0.00 0.00 0.00
4B - Taxable outward supplies made to registered persons attracting tax on reverse charge
Total 2 Invoice 5,000.00 0.00 450.00 450.00 0.00
Total Liability (Outward supplies other than Reverse charge) 1,00,000.00 18,000.00 0.00 0.00 0.00
";
        let result = extract("gstr1", text);
        assert_eq!(result.general.gstin, "27AAACR5055K1Z7");
        assert_eq!(result.general.state, "Maharashtra");
        assert_eq!(result.general.period, "April");
        assert_eq!(result.general.filing_date, NOT_FOUND);

        let row = |table: &str| result.tables.iter().find(|r| r.table == table).unwrap();
        assert_eq!(row("table_4a").values, vec![12.0, 100_000.0, 18_000.0, 0.0, 0.0, 0.0]);
        assert_eq!(row("table_4b").values, vec![2.0, 5_000.0, 0.0, 450.0, 450.0, 0.0]);
        assert_eq!(
            row("total_liability").values,
            vec![100_000.0, 18_000.0, 0.0, 0.0, 0.0]
        );
        assert!(result.payments.is_empty());
    }
}
