//! Document Aggregator: runs a per-document pipeline over a batch.
//!
//! Documents are processed one after another with no shared state. A
//! document that fails is recorded as a [`DocumentError`] and the batch
//! carries on with the next one.

use std::collections::BTreeSet;

use gstr_extract_parse::{CompiledTemplate, extract_return};
use gstr_extract_pdf::TextExtractor;
use gstr_extract_returns_models::{
    CombinedLayout, GeneralDetails, PaymentRow, PaymentSchema, TableRow, TableSchema,
};
use gstr_extract_tds::{TdsForm, TdsRecord, extract_tds};
use serde::Serialize;

use crate::ExtractError;
use crate::progress::ProgressCallback;

/// One input document: its display name and raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Name used to tag every row the document produces.
    pub name: String,
    pub bytes: Vec<u8>,
}

impl Document {
    #[must_use]
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// A document that could not be processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentError {
    pub document: String,
    pub message: String,
}

/// Runs `process` over every document, isolating failures.
///
/// Returns the successful outputs in document order along with one error
/// entry per failed document.
pub fn run_batch<T, E, F>(
    documents: &[Document],
    progress: &dyn ProgressCallback,
    mut process: F,
) -> (Vec<T>, Vec<DocumentError>)
where
    E: std::fmt::Display,
    F: FnMut(&Document) -> Result<T, E>,
{
    progress.start(documents.len() as u64);

    let mut outputs = Vec::with_capacity(documents.len());
    let mut errors = Vec::new();

    for document in documents {
        progress.document(&document.name);

        match process(document) {
            Ok(output) => {
                outputs.push(output);
                progress.done(false);
            }
            Err(e) => {
                log::error!("{}: {e}", document.name);
                errors.push(DocumentError {
                    document: document.name.clone(),
                    message: e.to_string(),
                });
                progress.done(true);
            }
        }
    }

    progress.finish(documents.len(), errors.len());

    (outputs, errors)
}

/// Everything recovered from a batch of GST return documents.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    /// Identifier of the template the batch was read with.
    pub template: String,
    pub layout: CombinedLayout,
    pub table_schemas: Vec<TableSchema>,
    pub payment_schema: Option<PaymentSchema>,
    pub general: Vec<GeneralDetails>,
    pub tables: Vec<TableRow>,
    pub payments: Vec<PaymentRow>,
    pub errors: Vec<DocumentError>,
}

impl BatchResult {
    /// An empty result shaped by `template`.
    #[must_use]
    pub fn empty(template: &CompiledTemplate) -> Self {
        Self {
            template: template.id.clone(),
            layout: template.combined_layout,
            table_schemas: template.table_schemas().cloned().collect(),
            payment_schema: template.payment_schema().cloned(),
            general: Vec::new(),
            tables: Vec::new(),
            payments: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Names of every document that produced any result, in order of first
    /// appearance.
    #[must_use]
    pub fn documents(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.general
            .iter()
            .map(|g| g.document.as_str())
            .chain(self.tables.iter().map(|r| r.document.as_str()))
            .chain(self.payments.iter().map(|r| r.document.as_str()))
            .filter(|name| seen.insert(*name))
            .collect()
    }

    /// Rows of one table, across all documents.
    pub fn table_rows<'a>(&'a self, table: &'a str) -> impl Iterator<Item = &'a TableRow> {
        self.tables.iter().filter(move |r| r.table == table)
    }

    /// General details of `document`, if it was processed.
    #[must_use]
    pub fn general_for(&self, document: &str) -> Option<&GeneralDetails> {
        self.general.iter().find(|g| g.document == document)
    }
}

/// Reads every document with `extractor` and runs `template` over it.
#[must_use]
pub fn extract_batch(
    documents: &[Document],
    extractor: &dyn TextExtractor,
    template: &CompiledTemplate,
    progress: &dyn ProgressCallback,
) -> BatchResult {
    log::info!(
        "Extracting {} documents with template {}",
        documents.len(),
        template.id
    );

    let (extractions, errors) =
        run_batch(documents, progress, |document| -> Result<_, ExtractError> {
            let text = extractor.extract_named(&document.name, &document.bytes)?;
            Ok(extract_return(&document.name, &text, template))
        });

    let mut result = BatchResult::empty(template);
    for extraction in extractions {
        result.general.push(extraction.general);
        result.tables.extend(extraction.tables);
        result.payments.extend(extraction.payments);
    }
    result.errors = errors;

    result
}

/// Everything recovered from a batch of TDS documents.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TdsBatchResult {
    pub form: TdsForm,
    pub records: Vec<TdsRecord>,
    pub errors: Vec<DocumentError>,
}

/// Reads every document with `extractor` as a TDS document of kind `form`.
#[must_use]
pub fn extract_tds_batch(
    documents: &[Document],
    extractor: &dyn TextExtractor,
    form: TdsForm,
    progress: &dyn ProgressCallback,
) -> TdsBatchResult {
    log::info!("Extracting {} documents as {}", documents.len(), form.label());

    let (records, errors) =
        run_batch(documents, progress, |document| -> Result<_, ExtractError> {
            let text = extractor.extract_named(&document.name, &document.bytes)?;
            Ok(extract_tds(form, &document.name, &text)?)
        });

    TdsBatchResult {
        form,
        records: records.into_iter().flatten().collect(),
        errors,
    }
}
