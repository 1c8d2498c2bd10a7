//! PDF text extraction using lopdf.

use std::collections::btree_map;
use std::path::Path;

use lopdf::{Document, ObjectId};

use super::backend::{ExtractionError, ExtractionResult, Extractor};

/// Text of a single page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    /// Page number, starting at 1.
    pub number: u32,
    /// Extracted text, empty if the page had none.
    pub text: String,
    /// Whether the page content stream decoded.
    pub decoded: bool,
}

/// Lazy iterator over page text in page-tree order.
///
/// Each page is decoded only when requested. The iterator is consumed as it
/// goes and cannot be restarted.
pub struct PageFragments<'a> {
    document: &'a Document,
    pages: btree_map::IntoIter<u32, ObjectId>,
}

impl<'a> PageFragments<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self {
            document,
            pages: document.get_pages().into_iter(),
        }
    }
}

impl Iterator for PageFragments<'_> {
    type Item = PageText;

    fn next(&mut self) -> Option<Self::Item> {
        let (number, _) = self.pages.next()?;
        let page = match self.document.extract_text(&[number]) {
            Ok(text) => PageText {
                number,
                text: text.trim_end().to_string(),
                decoded: true,
            },
            Err(e) => {
                tracing::debug!("Page {} has no decodable text: {}", number, e);
                PageText {
                    number,
                    text: String::new(),
                    decoded: false,
                }
            }
        };
        Some(page)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.pages.size_hint()
    }
}

/// Extracts one fragment per page.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Extractor for PdfExtractor {
    fn name(&self) -> &'static str {
        "pdf"
    }

    fn extract(&self, path: &Path) -> Result<ExtractionResult, ExtractionError> {
        let document =
            Document::load(path).map_err(|e| ExtractionError::Malformed(e.to_string()))?;

        let mut fragments = Vec::new();
        let mut decoded = 0usize;
        for page in PageFragments::new(&document) {
            if page.decoded {
                decoded += 1;
            }
            fragments.push(page.text);
        }

        // A page without text is fine, a document where nothing decodes is not
        if !fragments.is_empty() && decoded == 0 {
            return Err(ExtractionError::Unreadable(format!(
                "none of {} pages could be decoded",
                fragments.len()
            )));
        }

        tracing::debug!(
            "Extracted {} pages ({} decoded) from PDF",
            fragments.len(),
            decoded
        );
        Ok(ExtractionResult::from_fragments(fragments))
    }
}
