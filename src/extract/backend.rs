//! Extractor contract and the result it produces.

use std::path::Path;

use thiserror::Error;

/// Separator placed between fragments when concatenating.
pub const FRAGMENT_SEPARATOR: &str = "\n";

/// Errors that can occur during text extraction.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Malformed document: {0}")]
    Malformed(String),

    #[error("Unreadable document: {0}")]
    Unreadable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Text extracted from one document.
///
/// Holds the ordered fragments (pages or paragraphs), the concatenated text
/// and its metrics. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    fragments: Vec<String>,
    text: String,
    char_count: usize,
}

impl ExtractionResult {
    /// Join fragments with [`FRAGMENT_SEPARATOR`] and compute metrics.
    pub fn from_fragments<I>(fragments: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let fragments: Vec<String> = fragments.into_iter().collect();
        let text = fragments.join(FRAGMENT_SEPARATOR);
        let char_count = text.chars().count();
        Self {
            fragments,
            text,
            char_count,
        }
    }

    /// An empty document. Zero fragments, zero characters.
    pub fn empty() -> Self {
        Self::from_fragments(Vec::new())
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    /// Number of characters in the concatenated text.
    pub fn char_count(&self) -> usize {
        self.char_count
    }

    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }
}

/// A format-specific text extractor.
///
/// Implementations are CPU-bound and synchronous; the pipeline runs them on a
/// blocking worker thread.
pub trait Extractor: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Extract the text of the document at `path`.
    ///
    /// An empty document is a successful result with zero fragments.
    fn extract(&self, path: &Path) -> Result<ExtractionResult, ExtractionError>;
}
