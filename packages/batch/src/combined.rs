//! Combined-View Builder: one denormalized table per batch.
//!
//! For each document, in order of first appearance, the view holds a
//! `FILE INFO` header row carrying the document's general details, one row
//! per table and payment row of that document, and a separator row. Every
//! row repeats the general details and has the same column set; value
//! columns a row does not use are zero.

use gstr_extract_returns_models::{
    CombinedLayout, GeneralDetails, PaymentField, PaymentRow, TableRow, UNKNOWN_STATE,
};
use serde::Serialize;

use crate::aggregate::BatchResult;

pub const FILE_INFO: &str = "FILE INFO";
pub const FILE_INFO_DESCRIPTION: &str = "File Information";
pub const SEPARATOR: &str = "----------------------";

const DATA_TYPE: &str = "Data Type";
const SECTION: &str = "Section";
const DESCRIPTION: &str = "Description";

/// Document columns at the head of every layout.
const GENERAL_COLUMNS: [&str; 7] = [
    "File Name",
    "GSTIN",
    "State",
    "Legal Name",
    "Date",
    "Financial Year",
    "Period",
];

const GSTR3B_2024_VALUES: [&str; 10] = [
    "Total Taxable Value",
    "Integrated Tax",
    "Central Tax",
    "State/UT Tax",
    "Cess",
    "Total Tax Payable",
    "Tax Paid Through ITC",
    "Tax Paid in Cash",
    "Interest Paid in Cash",
    "Late Fee Paid in Cash",
];

const GSTR3B_2025_VALUES: [&str; 15] = [
    "Tax Payable",
    "Adjustment of Negative Liability",
    "Net Tax Payable",
    "Total Taxable Value",
    "Integrated Tax",
    "Central Tax",
    "State/UT Tax",
    "Cess",
    "Tax Paid Through ITC - Integrated",
    "Tax Paid Through ITC - Central",
    "Tax Paid Through ITC - State/UT",
    "Tax Paid Through ITC - Cess",
    "Tax Paid in Cash",
    "Interest Paid in Cash",
    "Late Fee Paid in Cash",
];

/// Combined-view columns fed by each payment slot on the 2025 layout.
const GSTR3B_2025_PAYMENT_COLUMNS: [(PaymentField, &str); 10] = [
    (PaymentField::TaxPayable, "Tax Payable"),
    (
        PaymentField::AdjustmentOfNegativeLiability,
        "Adjustment of Negative Liability",
    ),
    (PaymentField::NetTaxPayable, "Net Tax Payable"),
    (PaymentField::ItcIntegrated, "Tax Paid Through ITC - Integrated"),
    (PaymentField::ItcCentral, "Tax Paid Through ITC - Central"),
    (PaymentField::ItcStateUt, "Tax Paid Through ITC - State/UT"),
    (PaymentField::ItcCess, "Tax Paid Through ITC - Cess"),
    (PaymentField::PaidInCash, "Tax Paid in Cash"),
    (PaymentField::InterestPaidInCash, "Interest Paid in Cash"),
    (PaymentField::LateFeePaidInCash, "Late Fee Paid in Cash"),
];

/// One cell of the combined view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Number(f64),
    Blank,
}

impl Cell {
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Number(_) | Self::Blank => None,
        }
    }

    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) | Self::Blank => None,
        }
    }
}

/// One row of the combined view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedRow {
    pub document: String,
    pub cells: Vec<Cell>,
}

/// The combined view of a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedView {
    pub columns: Vec<String>,
    pub rows: Vec<CombinedRow>,
}

impl CombinedView {
    /// Builds the view for every document of `result`.
    #[must_use]
    pub fn build(result: &BatchResult) -> Self {
        let columns = columns_for(result);
        let layout = Layout {
            kind: result.layout,
            columns: &columns,
        };

        let mut rows = Vec::new();
        for document in result.documents() {
            let base = layout.base_row(document, result.general_for(document));

            let mut header = base.clone();
            header.set(&columns, DATA_TYPE, Cell::Text(FILE_INFO.to_owned()));
            header.set(
                &columns,
                DESCRIPTION,
                Cell::Text(FILE_INFO_DESCRIPTION.to_owned()),
            );
            rows.push(header);

            for schema in &result.table_schemas {
                for row in result
                    .table_rows(&schema.id)
                    .filter(|r| r.document == document)
                {
                    let mut data = base.clone();
                    layout.fill_table(&mut data, &schema.title, &schema.columns, row);
                    rows.push(data);
                }
            }

            for payment in result.payments.iter().filter(|r| r.document == document) {
                let mut data = base.clone();
                let title = result
                    .payment_schema
                    .as_ref()
                    .map_or("Payment", |s| s.title.as_str());
                layout.fill_payment(&mut data, title, payment, result);
                rows.push(data);
            }

            let mut separator = CombinedRow {
                document: document.to_owned(),
                cells: vec![Cell::Blank; columns.len()],
            };
            separator.set(&columns, DESCRIPTION, Cell::Text(SEPARATOR.to_owned()));
            rows.push(separator);
        }

        log::debug!(
            "Combined view: {} rows over {} columns",
            rows.len(),
            columns.len()
        );

        Self { columns, rows }
    }

    /// Position of the column named `name`.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<usize> {
        column_index(&self.columns, name)
    }
}

impl CombinedRow {
    fn set(&mut self, columns: &[String], name: &str, cell: Cell) {
        if let Some(idx) = column_index(columns, name) {
            self.cells[idx] = cell;
        }
    }
}

/// Column names match case-insensitively so table headers such as
/// "Integrated tax" land in "Integrated Tax".
fn column_index(columns: &[String], name: &str) -> Option<usize> {
    columns.iter().position(|c| c.eq_ignore_ascii_case(name))
}

fn columns_for(result: &BatchResult) -> Vec<String> {
    let mut columns: Vec<String> = GENERAL_COLUMNS.iter().map(|c| (*c).to_owned()).collect();
    columns.push(DATA_TYPE.to_owned());

    match result.layout {
        CombinedLayout::Gstr3b2024 => {
            columns.push(DESCRIPTION.to_owned());
            columns.extend(GSTR3B_2024_VALUES.iter().map(|c| (*c).to_owned()));
        }
        CombinedLayout::Gstr3b2025 => {
            columns.push(SECTION.to_owned());
            columns.push(DESCRIPTION.to_owned());
            columns.extend(GSTR3B_2025_VALUES.iter().map(|c| (*c).to_owned()));
        }
        CombinedLayout::Generic => {
            columns.push(DESCRIPTION.to_owned());
            let value_columns = result
                .table_schemas
                .iter()
                .flat_map(|s| s.columns.iter())
                .chain(
                    result
                        .payment_schema
                        .iter()
                        .flat_map(|s| s.columns.iter().map(|c| &c.header)),
                );
            for column in value_columns {
                if column_index(&columns, column).is_none() {
                    columns.push(column.clone());
                }
            }
        }
    }

    columns
}

struct Layout<'a> {
    kind: CombinedLayout,
    columns: &'a [String],
}

impl Layout<'_> {
    /// Value columns start right after the description column.
    fn first_value_column(&self) -> usize {
        column_index(self.columns, DESCRIPTION).map_or(self.columns.len(), |idx| idx + 1)
    }

    fn base_row(&self, document: &str, general: Option<&GeneralDetails>) -> CombinedRow {
        let first_value = self.first_value_column();
        let mut cells: Vec<Cell> = (0..self.columns.len())
            .map(|idx| {
                if idx < first_value {
                    Cell::Blank
                } else {
                    Cell::Number(0.0)
                }
            })
            .collect();

        let text = |value: Option<&str>| Cell::Text(value.unwrap_or(UNKNOWN_STATE).to_owned());
        cells[0] = Cell::Text(document.to_owned());
        cells[1] = text(general.map(|g| g.gstin.as_str()));
        cells[2] = text(general.map(|g| g.state.as_str()));
        cells[3] = text(general.map(|g| g.legal_name.as_str()));
        cells[4] = text(general.map(|g| g.filing_date.as_str()));
        cells[5] = text(general.map(|g| g.financial_year.as_str()));
        cells[6] = text(general.map(|g| g.period.as_str()));

        CombinedRow {
            document: document.to_owned(),
            cells,
        }
    }

    fn fill_table(&self, data: &mut CombinedRow, title: &str, headers: &[String], row: &TableRow) {
        data.set(self.columns, DATA_TYPE, Cell::Text(title.to_owned()));
        data.set(self.columns, DESCRIPTION, Cell::Text(row.label.clone()));
        for (header, value) in headers.iter().zip(&row.values) {
            data.set(self.columns, header, Cell::Number(*value));
        }
    }

    fn fill_payment(
        &self,
        data: &mut CombinedRow,
        title: &str,
        row: &PaymentRow,
        result: &BatchResult,
    ) {
        let columns = self.columns;
        let number = |field: PaymentField| Cell::Number(row.values.get(field));
        data.set(columns, DATA_TYPE, Cell::Text(title.to_owned()));

        match self.kind {
            CombinedLayout::Gstr3b2024 => {
                data.set(
                    columns,
                    DESCRIPTION,
                    Cell::Text(format!("{} - {}", row.section.label(), row.tax.label())),
                );
                data.set(columns, "Total Tax Payable", number(PaymentField::TaxPayable));
                data.set(
                    columns,
                    "Tax Paid Through ITC",
                    Cell::Number(row.values.itc_total()),
                );
                data.set(columns, "Tax Paid in Cash", number(PaymentField::PaidInCash));
                data.set(
                    columns,
                    "Interest Paid in Cash",
                    number(PaymentField::InterestPaidInCash),
                );
                data.set(
                    columns,
                    "Late Fee Paid in Cash",
                    number(PaymentField::LateFeePaidInCash),
                );
            }
            CombinedLayout::Gstr3b2025 => {
                data.set(columns, SECTION, Cell::Text(row.section.label().to_owned()));
                data.set(columns, DESCRIPTION, Cell::Text(row.tax.label().to_owned()));
                for (field, column) in GSTR3B_2025_PAYMENT_COLUMNS {
                    data.set(columns, column, number(field));
                }
            }
            CombinedLayout::Generic => {
                data.set(
                    columns,
                    DESCRIPTION,
                    Cell::Text(format!("{} - {}", row.section.label(), row.tax.label())),
                );
                for column in result.payment_schema.iter().flat_map(|s| &s.columns) {
                    data.set(columns, &column.header, number(column.field));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use gstr_extract_parse::TemplateRegistry;
    use gstr_extract_returns_models::{PaymentSection, PaymentValues, RecoveryStrategy, TaxHead};

    use super::*;

    fn general(document: &str, gstin: &str) -> GeneralDetails {
        let mut details = GeneralDetails::unresolved(document);
        details.set(gstr_extract_returns_models::GeneralField::Gstin, gstin.to_owned());
        details
    }

    fn table_row(document: &str, table: &str, label: &str, values: Vec<f64>) -> TableRow {
        TableRow {
            document: document.to_owned(),
            table: table.to_owned(),
            label: label.to_owned(),
            values,
            strategy: RecoveryStrategy::Grid,
        }
    }

    fn payment(document: &str, tax: TaxHead, section: PaymentSection) -> PaymentRow {
        let values = PaymentValues {
            tax_payable: 100.0,
            itc_integrated: 10.0,
            itc_central: 20.0,
            paid_in_cash: 70.0,
            ..PaymentValues::default()
        };
        PaymentRow {
            document: document.to_owned(),
            tax,
            section,
            values,
            recovered: true,
        }
    }

    fn batch(template: &str) -> BatchResult {
        let registry = TemplateRegistry::load().unwrap();
        let mut result = BatchResult::empty(registry.get(template).unwrap());
        result.general = vec![
            general("a.pdf", "29AABCT1332L1ZU"),
            general("b.pdf", "27AAACR5055K1Z7"),
        ];
        result.tables = vec![
            table_row("a.pdf", "table_3_1", "(a) Outward", vec![1.0, 2.0, 3.0, 4.0, 5.0]),
            table_row("a.pdf", "table_4", "(5) All other ITC", vec![6.0, 7.0, 8.0, 9.0]),
        ];
        result.payments = vec![payment(
            "a.pdf",
            TaxHead::Central,
            PaymentSection::OtherThanReverseCharge,
        )];
        result
    }

    fn cell<'a>(view: &'a CombinedView, row: usize, column: &str) -> &'a Cell {
        &view.rows[row].cells[view.column(column).unwrap()]
    }

    #[test]
    fn gstr3b_2024_layout() {
        let view = CombinedView::build(&batch("gstr3b_2024"));
        assert_eq!(view.columns.len(), 19);

        // a.pdf: header, two table rows, one payment row, separator.
        assert_eq!(cell(&view, 0, "Data Type").as_text(), Some(FILE_INFO));
        assert_eq!(cell(&view, 0, "State").as_text(), Some("Karnataka"));
        assert_eq!(cell(&view, 1, "Data Type").as_text(), Some("Table 3.1"));
        assert_eq!(cell(&view, 1, "Total Taxable Value").as_number(), Some(1.0));
        assert_eq!(cell(&view, 2, "Data Type").as_text(), Some("Table 4"));
        assert_eq!(cell(&view, 2, "Integrated Tax").as_number(), Some(6.0));
        assert_eq!(cell(&view, 2, "Total Taxable Value").as_number(), Some(0.0));
        assert_eq!(
            cell(&view, 3, "Description").as_text(),
            Some("(A) Other than reverse charge - Central tax")
        );
        assert_eq!(cell(&view, 3, "Tax Paid Through ITC").as_number(), Some(30.0));
        assert_eq!(cell(&view, 3, "Tax Paid in Cash").as_number(), Some(70.0));
        assert_eq!(cell(&view, 4, "Description").as_text(), Some(SEPARATOR));
        assert_eq!(cell(&view, 4, "GSTIN"), &Cell::Blank);
    }

    #[test]
    fn gstr3b_2025_layout_splits_itc_and_section() {
        let view = CombinedView::build(&batch("gstr3b_2025"));
        assert_eq!(view.columns.len(), 25);
        assert_eq!(
            cell(&view, 3, "Section").as_text(),
            Some("(A) Other than reverse charge")
        );
        assert_eq!(cell(&view, 3, "Description").as_text(), Some("Central tax"));
        assert_eq!(cell(&view, 3, "Tax Payable").as_number(), Some(100.0));
        assert_eq!(
            cell(&view, 3, "Tax Paid Through ITC - Central").as_number(),
            Some(20.0)
        );
    }

    #[test]
    fn documents_without_rows_get_header_and_separator() {
        let view = CombinedView::build(&batch("gstr3b_2024"));
        let b_rows: Vec<_> = view.rows.iter().filter(|r| r.document == "b.pdf").collect();
        assert_eq!(b_rows.len(), 2);
        assert_eq!(view.rows.len(), 5 + 2);
    }

    #[test]
    fn generic_layout_unions_table_columns() {
        let registry = TemplateRegistry::load().unwrap();
        let mut result = BatchResult::empty(registry.get("gstr1").unwrap());
        result.general = vec![general("g.pdf", "27AAACR5055K1Z7")];
        result.tables = vec![table_row(
            "g.pdf",
            "table_4a",
            "Taxable outward supplies",
            vec![12.0, 1000.0, 180.0, 0.0, 0.0, 0.0],
        )];

        let view = CombinedView::build(&result);
        assert_eq!(
            &view.columns[9..],
            &[
                "Taxable Value",
                "IGST",
                "CGST",
                "SGST",
                "Cess",
                "No. of records",
                "Value",
                "Integrated Tax",
                "Central Tax",
                "State/UT Tax",
            ]
        );
        assert_eq!(cell(&view, 1, "No. of records").as_number(), Some(12.0));
        assert_eq!(cell(&view, 1, "Cess").as_number(), Some(0.0));
        assert_eq!(cell(&view, 1, "Taxable Value").as_number(), Some(0.0));
    }

    #[test]
    fn missing_general_details_read_unknown() {
        let mut result = batch("gstr3b_2024");
        result.general.clear();
        let view = CombinedView::build(&result);
        assert_eq!(cell(&view, 0, "GSTIN").as_text(), Some(UNKNOWN_STATE));
        assert_eq!(cell(&view, 0, "File Name").as_text(), Some("a.pdf"));
    }
}
