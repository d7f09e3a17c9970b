#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Batch processing of tax filing documents.
//!
//! Runs the return and TDS extractors over a batch of documents with
//! per-document failure isolation ([`aggregate`]), builds the combined
//! per-document view ([`combined`]), narrows results with multi-select
//! filters ([`filter`]) and writes workbooks ([`export`]).

pub mod aggregate;
pub mod combined;
pub mod export;
pub mod filter;
pub mod progress;

use gstr_extract_pdf::PdfError;
use gstr_extract_tds::TdsError;

pub use aggregate::{BatchResult, Document, DocumentError, TdsBatchResult};
pub use combined::CombinedView;
pub use export::ExportError;
pub use filter::{FilterDimension, Filters, Selection};
pub use progress::{NullProgress, ProgressCallback};

/// Reasons a single document fails.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error(transparent)]
    Pdf(#[from] PdfError),

    #[error(transparent)]
    Tds(#[from] TdsError),
}
