#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Text and table grid extraction for tax filing PDFs.
//!
//! Every parser downstream works on two views of a document: the
//! flattened text of all pages and the table grids recovered per page.
//! Both come from an [`ExtractedText`], produced by a [`TextExtractor`].
//!
//! [`PdfTextExtractor`] reads real PDFs with pure-Rust text extraction
//! ([`pdf_extract`]); [`PlainTextExtractor`] accepts text that was already
//! extracted (pages separated by form feeds), which is how fixtures and
//! `.txt` dumps are fed through the same pipeline. [`AutoExtractor`]
//! chooses between the two by file extension.

pub mod grid;

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use serde::Serialize;

pub use grid::TableGrid;

/// Errors specific to text extraction.
#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    /// The PDF could not be parsed.
    #[error("PDF extraction error: {0}")]
    Extraction(String),

    /// The PDF backend panicked on malformed input.
    #[error("PDF backend panicked: {0}")]
    Panicked(String),

    /// A `.pdf` document without the `%PDF` header.
    #[error("Not a PDF document (missing %PDF header)")]
    NotPdf,

    /// The document was read but holds no text.
    #[error("Document contains no extractable text")]
    NoText,

    /// Pre-extracted text was not valid UTF-8.
    #[error("Invalid text encoding: {0}")]
    Encoding(#[from] std::str::Utf8Error),
}

/// The text of one page and the grids recovered from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageText {
    /// 1-based page number.
    pub number: usize,
    pub text: String,
    pub grids: Vec<TableGrid>,
}

/// All pages of one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractedText {
    pub pages: Vec<PageText>,
}

impl ExtractedText {
    /// Builds an [`ExtractedText`] from raw page strings, recovering grids
    /// for each page.
    #[must_use]
    pub fn from_pages<I, S>(pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let pages = pages
            .into_iter()
            .enumerate()
            .map(|(idx, text)| {
                let text = text.into();
                let grids = grid::grids_from_text(&text);
                PageText {
                    number: idx + 1,
                    text,
                    grids,
                }
            })
            .collect();

        Self { pages }
    }

    /// Text of every non-blank page joined with newlines.
    #[must_use]
    pub fn full_text(&self) -> String {
        self.pages
            .iter()
            .filter(|p| !p.text.trim().is_empty())
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Iterates over every grid on every page, in page order.
    pub fn grids(&self) -> impl Iterator<Item = &TableGrid> {
        self.pages.iter().flat_map(|p| p.grids.iter())
    }

    /// The first page that carries any text.
    #[must_use]
    pub fn first_text_page(&self) -> Option<&PageText> {
        self.pages.iter().find(|p| !p.text.trim().is_empty())
    }

    /// Returns `true` if no page carries any text.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.first_text_page().is_none()
    }
}

/// Turns raw document bytes into an [`ExtractedText`].
pub trait TextExtractor {
    /// # Errors
    ///
    /// Returns an error if the bytes cannot be read as a document at all.
    fn extract(&self, bytes: &[u8]) -> Result<ExtractedText, PdfError>;

    /// Like [`TextExtractor::extract`], for a document known by file name.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes cannot be read as a document at all.
    fn extract_named(&self, _name: &str, bytes: &[u8]) -> Result<ExtractedText, PdfError> {
        self.extract(bytes)
    }
}

const PDF_SIGNATURE: &[u8] = b"%PDF";

/// Readers accept the header anywhere in the first kilobyte.
const SIGNATURE_WINDOW: usize = 1024;

fn has_pdf_signature(bytes: &[u8]) -> bool {
    bytes[..bytes.len().min(SIGNATURE_WINDOW)]
        .windows(PDF_SIGNATURE.len())
        .any(|w| w == PDF_SIGNATURE)
}

fn non_blank(text: ExtractedText) -> Result<ExtractedText, PdfError> {
    if text.is_blank() {
        Err(PdfError::NoText)
    } else {
        Ok(text)
    }
}

/// Extracts page text from PDF bytes with [`pdf_extract`].
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractedText, PdfError> {
        if !has_pdf_signature(bytes) {
            return Err(PdfError::NotPdf);
        }

        // The backend panics on some malformed streams instead of erroring.
        let pages = catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem_by_pages(bytes)
        }))
        .map_err(|payload| PdfError::Panicked(panic_message(payload.as_ref())))?
        .map_err(|e| PdfError::Extraction(format!("failed to extract text from PDF: {e}")))?;

        log::debug!(
            "Extracted {} pages ({} bytes of text) from PDF",
            pages.len(),
            pages.iter().map(String::len).sum::<usize>()
        );

        let text = ExtractedText::from_pages(pages);
        if text.is_blank() {
            log::warn!("PDF contains no extractable text (scanned document?)");
        }

        non_blank(text)
    }
}

/// Reads already-extracted UTF-8 text; form feeds separate pages.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractedText, PdfError> {
        let text = std::str::from_utf8(bytes)?;
        Ok(ExtractedText::from_pages(text.split('\x0C')))
    }
}

/// Picks the backend by file extension: `.txt` documents are read as
/// plain text, everything else as PDF. Either way a document without any
/// text is an error.
///
/// Without a name, bytes carrying the PDF signature go to the PDF backend
/// and anything else is read as text.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoExtractor;

impl AutoExtractor {
    fn is_text_name(name: &str) -> bool {
        std::path::Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("txt"))
    }
}

impl TextExtractor for AutoExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractedText, PdfError> {
        if has_pdf_signature(bytes) {
            PdfTextExtractor.extract(bytes)
        } else {
            non_blank(PlainTextExtractor.extract(bytes)?)
        }
    }

    fn extract_named(&self, name: &str, bytes: &[u8]) -> Result<ExtractedText, PdfError> {
        if Self::is_text_name(name) {
            non_blank(PlainTextExtractor.extract(bytes)?)
        } else {
            PdfTextExtractor.extract(bytes)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_splits_pages_on_form_feed() {
        let text = PlainTextExtractor
            .extract(b"page one\n\x0Cpage two\n")
            .unwrap();
        assert_eq!(text.pages.len(), 2);
        assert_eq!(text.pages[1].number, 2);
        assert_eq!(text.pages[1].text, "page two\n");
    }

    #[test]
    fn full_text_skips_blank_pages() {
        let text = ExtractedText::from_pages(["first", "   ", "third"]);
        assert_eq!(text.full_text(), "first\nthird");
        assert_eq!(text.first_text_page().unwrap().number, 1);
    }

    #[test]
    fn pages_carry_recovered_grids() {
        let text = ExtractedText::from_pages([
            "Header line\n(1) Import of goods 1.00 2.00 3.00 4.00\n",
            "no table here",
        ]);
        assert_eq!(text.grids().count(), 1);
        assert!(text.pages[1].grids.is_empty());
    }

    #[test]
    fn invalid_utf8_is_an_error() {
        let result = PlainTextExtractor.extract(&[0xff, 0xfe, 0x00]);
        assert!(matches!(result, Err(PdfError::Encoding(_))));
    }

    #[test]
    fn garbage_bytes_are_an_error_not_a_panic() {
        let result = PdfTextExtractor.extract(b"definitely not a pdf");
        assert!(result.is_err());
    }

    #[test]
    fn auto_extractor_reads_text_without_pdf_signature() {
        let text = AutoExtractor.extract(b"GSTIN 29AABCT1332L1ZU\n").unwrap();
        assert_eq!(text.full_text(), "GSTIN 29AABCT1332L1ZU\n");
    }

    #[test]
    fn auto_extractor_sends_pdf_signature_to_backend() {
        let result = AutoExtractor.extract(b"%PDF-1.7\nbroken");
        assert!(!matches!(result, Ok(ref text) if !text.is_blank()));
    }

    #[test]
    fn pdf_names_never_fall_back_to_text() {
        let result = AutoExtractor.extract_named("html.pdf", b"<html>502 Bad Gateway</html>");
        assert!(matches!(result, Err(PdfError::NotPdf)));

        let result = AutoExtractor.extract_named("empty.pdf", b"");
        assert!(matches!(result, Err(PdfError::NotPdf)));
    }

    #[test]
    fn text_names_use_plain_text_but_reject_empty_files() {
        let text = AutoExtractor.extract_named("dump.TXT", b"Period April\n").unwrap();
        assert_eq!(text.full_text(), "Period April\n");

        let result = AutoExtractor.extract_named("empty.txt", b"  \n");
        assert!(matches!(result, Err(PdfError::NoText)));
    }

    #[test]
    fn signature_is_found_after_leading_junk() {
        assert!(has_pdf_signature(b"\xEF\xBB\xBF%PDF-1.4"));
        assert!(!has_pdf_signature(b"<html>"));
    }

    #[test]
    fn empty_document_is_blank() {
        assert!(ExtractedText::from_pages(Vec::<String>::new()).is_blank());
    }
}
