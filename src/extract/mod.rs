//! Text extraction from documents.
//!
//! Extracts linear text using one extractor per format:
//! - PDF via lopdf, one fragment per page
//! - DOCX via the zip container and its `word/document.xml` part, one fragment
//!   per paragraph
//!
//! Extractors sit behind the [`Extractor`] trait and are selected by
//! [`FileKind`](crate::models::FileKind) through an [`ExtractorRegistry`].
//! New formats are added by registering another implementation.

mod backend;
mod docx;
mod pdf;
mod registry;

pub use backend::{ExtractionError, ExtractionResult, Extractor, FRAGMENT_SEPARATOR};
pub use docx::{DocxExtractor, Paragraphs};
pub use pdf::{PageFragments, PageText, PdfExtractor};
pub use registry::ExtractorRegistry;
