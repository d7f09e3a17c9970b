//! Workbook export with `rust_xlsxwriter`.
//!
//! GST batches are written as one sheet for the combined view, one for the
//! general details and one per table, all restricted to the filtered
//! documents. TDS batches are written to a single `Extracted Data` sheet.
//! Failed documents get an `Errors` sheet in both cases.

use std::path::Path;

use gstr_extract_returns_models::GeneralField;
use gstr_extract_tds::TdsValue;
use rust_xlsxwriter::{Format, Workbook, XlsxError};

use crate::aggregate::{BatchResult, DocumentError, TdsBatchResult};
use crate::combined::{Cell, CombinedView};

pub const COMBINED_SHEET: &str = "Filtered Combined Data";
pub const GENERAL_SHEET: &str = "Filtered General Details";
pub const TDS_SHEET: &str = "Extracted Data";
pub const ERRORS_SHEET: &str = "Errors";

const FILE_NAME: &str = "File Name";
const MAX_SHEET_NAME: usize = 31;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Xlsx(#[from] XlsxError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A sheet to be written: name, header row and data rows.
struct Sheet {
    name: String,
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

/// Clips `name` to Excel's sheet name limit and replaces the characters
/// Excel rejects.
#[must_use]
pub fn sheet_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            c => c,
        })
        .take(MAX_SHEET_NAME)
        .collect()
}

fn text(value: &str) -> Cell {
    Cell::Text(value.to_owned())
}

/// Writes the filtered GST batch and its combined view to `path`.
///
/// # Errors
///
/// Returns an error if the output directory cannot be created or the
/// workbook cannot be written.
pub fn write_gst_workbook(
    path: &Path,
    result: &BatchResult,
    combined: &CombinedView,
) -> Result<(), ExportError> {
    let mut sheets = vec![Sheet {
        name: COMBINED_SHEET.to_owned(),
        headers: combined.columns.clone(),
        rows: combined.rows.iter().map(|r| r.cells.clone()).collect(),
    }];

    let mut general_headers = vec![FILE_NAME.to_owned()];
    general_headers.extend(GeneralField::all().iter().map(|f| f.label().to_owned()));
    general_headers.push("State".to_owned());
    sheets.push(Sheet {
        name: GENERAL_SHEET.to_owned(),
        headers: general_headers,
        rows: result
            .general
            .iter()
            .map(|g| {
                let mut row = vec![text(&g.document)];
                row.extend(GeneralField::all().iter().map(|f| text(g.get(*f))));
                row.push(text(&g.state));
                row
            })
            .collect(),
    });

    for schema in &result.table_schemas {
        let mut headers = vec![FILE_NAME.to_owned(), schema.label_column.clone()];
        headers.extend(schema.columns.iter().cloned());
        sheets.push(Sheet {
            name: format!("Filtered {}", schema.title),
            headers,
            rows: result
                .table_rows(&schema.id)
                .map(|r| {
                    let mut row = vec![text(&r.document), text(&r.label)];
                    row.extend(r.values.iter().map(|v| Cell::Number(*v)));
                    row
                })
                .collect(),
        });
    }

    if let Some(schema) = &result.payment_schema {
        let mut headers = vec![
            FILE_NAME.to_owned(),
            "Tax Type".to_owned(),
            "Section".to_owned(),
        ];
        headers.extend(schema.columns.iter().map(|c| c.header.clone()));
        sheets.push(Sheet {
            name: format!("Filtered {}", schema.title),
            headers,
            rows: result
                .payments
                .iter()
                .map(|p| {
                    let mut row = vec![
                        text(&p.document),
                        text(p.tax.label()),
                        text(p.section.label()),
                    ];
                    row.extend(
                        schema
                            .columns
                            .iter()
                            .map(|c| Cell::Number(p.values.get(c.field))),
                    );
                    row
                })
                .collect(),
        });
    }

    sheets.extend(errors_sheet(&result.errors));

    write_workbook(path, &sheets)
}

/// Writes a TDS batch to `path`.
///
/// Columns are the file name followed by every field name in order of
/// first appearance; records without a field leave its cell blank.
///
/// # Errors
///
/// Returns an error if the output directory cannot be created or the
/// workbook cannot be written.
pub fn write_tds_workbook(path: &Path, result: &TdsBatchResult) -> Result<(), ExportError> {
    let mut headers = vec![FILE_NAME.to_owned()];
    for record in &result.records {
        for field in &record.fields {
            if !headers.contains(&field.name) {
                headers.push(field.name.clone());
            }
        }
    }

    let rows = result
        .records
        .iter()
        .map(|record| {
            let mut row = vec![text(&record.document)];
            row.extend(headers[1..].iter().map(|name| match record.get(name) {
                Some(TdsValue::Text(value)) => text(value),
                Some(TdsValue::Number(value)) => Cell::Number(*value),
                None => Cell::Blank,
            }));
            row
        })
        .collect();

    let mut sheets = vec![Sheet {
        name: TDS_SHEET.to_owned(),
        headers,
        rows,
    }];
    sheets.extend(errors_sheet(&result.errors));

    write_workbook(path, &sheets)
}

fn errors_sheet(errors: &[DocumentError]) -> Option<Sheet> {
    if errors.is_empty() {
        return None;
    }

    Some(Sheet {
        name: ERRORS_SHEET.to_owned(),
        headers: vec![FILE_NAME.to_owned(), "Error".to_owned()],
        rows: errors
            .iter()
            .map(|e| vec![text(&e.document), text(&e.message)])
            .collect(),
    })
}

fn write_workbook(path: &Path, sheets: &[Sheet]) -> Result<(), ExportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet_name(&sheet.name))?;

        for (col, header) in sheet.headers.iter().enumerate() {
            worksheet.write_string_with_format(0, column(col)?, header, &header_format)?;
        }

        for (idx, cells) in sheet.rows.iter().enumerate() {
            let row = u32::try_from(idx + 1).map_err(|_| XlsxError::RowColumnLimitError)?;
            for (col, cell) in cells.iter().enumerate() {
                match cell {
                    Cell::Text(value) => {
                        worksheet.write_string(row, column(col)?, value)?;
                    }
                    Cell::Number(value) => {
                        worksheet.write_number(row, column(col)?, *value)?;
                    }
                    Cell::Blank => {}
                }
            }
        }

        worksheet.set_freeze_panes(1, 0)?;
        worksheet.autofit();

        log::debug!("Sheet {:?}: {} rows", sheet.name, sheet.rows.len());
    }

    workbook.save(path)?;
    log::info!("Wrote {} sheets to {}", sheets.len(), path.display());

    Ok(())
}

fn column(idx: usize) -> Result<u16, XlsxError> {
    u16::try_from(idx).map_err(|_| XlsxError::RowColumnLimitError)
}

#[cfg(test)]
mod tests {
    use gstr_extract_parse::TemplateRegistry;
    use gstr_extract_pdf::PlainTextExtractor;
    use gstr_extract_tds::TdsForm;

    use crate::aggregate::{Document, extract_batch, extract_tds_batch};
    use crate::progress::NullProgress;

    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir()
            .join(format!("gstr_extract_export_{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn sheet_names_are_clipped_and_cleaned() {
        assert_eq!(sheet_name("Filtered Table 3.1"), "Filtered Table 3.1");
        assert_eq!(sheet_name("a/b:c"), "a_b_c");
        let long = sheet_name("Filtered Taxable outward supplies made to registered persons");
        assert_eq!(long.chars().count(), MAX_SHEET_NAME);
    }

    #[test]
    fn writes_gst_workbook_with_errors_sheet() {
        let registry = TemplateRegistry::load().unwrap();
        let documents = vec![
            Document::new("a.txt", b"1. GSTIN of the supplier 29AABCT1332L1ZU\n".to_vec()),
            Document::new("b.txt", vec![0xff]),
        ];
        let result = extract_batch(
            &documents,
            &PlainTextExtractor,
            registry.get("gstr3b_2025").unwrap(),
            &NullProgress,
        );
        let combined = CombinedView::build(&result);

        let path = temp_path("gst.xlsx");
        write_gst_workbook(&path, &result, &combined).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn writes_tds_workbook() {
        let documents = vec![Document::new(
            "c.txt",
            b"TAN : PNEA99999C\nChallan No : 20011\n".to_vec(),
        )];
        let result = extract_tds_batch(
            &documents,
            &PlainTextExtractor,
            TdsForm::ChallanWithoutBreakup,
            &NullProgress,
        );

        let path = temp_path("tds.xlsx");
        write_tds_workbook(&path, &result).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
        std::fs::remove_file(&path).ok();
    }
}
