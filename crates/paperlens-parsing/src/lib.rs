//! Metadata extraction and render encoding for paper text.
//!
//! This crate is pure text processing: it takes raw extracted text and
//! produces bibliographic metadata plus the render-encoded storage form.
//! PDF backends live elsewhere (see `paperlens-pdf-mupdf`) behind the
//! [`PdfBackend`] trait, so this crate never links a PDF library.

use std::path::Path;

use thiserror::Error;

pub mod metadata;
pub mod render;

pub use metadata::{
    extract_metadata, ABSTRACT_NOT_FOUND, AUTHOR_SCAN_LINES, UNKNOWN_AUTHORS, UNKNOWN_TITLE,
};
pub use render::{decode_line_breaks, decode_whitespace, encode_line_breaks, encode_whitespace};
// Re-export domain types from core (canonical definitions live there)
pub use paperlens_core::{PaperMetadata, PdfBackend, LINE_BREAK, NBSP_PAIR};

#[derive(Error, Debug)]
pub enum ParsingError {
    #[error("backend error: {0}")]
    Backend(#[from] paperlens_core::BackendError),
}

/// Extract metadata from a PDF on disk, using `backend` for text extraction.
pub fn extract_from_pdf(
    path: &Path,
    backend: &dyn PdfBackend,
) -> Result<PaperMetadata, ParsingError> {
    let text = backend.extract_text(path)?;
    Ok(extract_metadata(&text))
}
