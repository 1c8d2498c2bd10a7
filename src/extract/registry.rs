//! Mapping from document format to extractor.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::backend::Extractor;
use super::docx::DocxExtractor;
use super::pdf::PdfExtractor;
use crate::models::FileKind;

/// Extractors keyed by [`FileKind`], built once at startup.
#[derive(Clone, Default)]
pub struct ExtractorRegistry {
    extractors: HashMap<FileKind, Arc<dyn Extractor>>,
}

impl ExtractorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in PDF and DOCX extractors.
    pub fn with_defaults() -> Self {
        Self::new()
            .with(FileKind::Pdf, PdfExtractor::new())
            .with(FileKind::Docx, DocxExtractor::new())
    }

    /// Register an extractor, replacing any previous one for `kind`.
    pub fn with<E>(mut self, kind: FileKind, extractor: E) -> Self
    where
        E: Extractor + 'static,
    {
        self.register(kind, Arc::new(extractor));
        self
    }

    /// Register a shared extractor, replacing any previous one for `kind`.
    ///
    /// `FileKind::Unsupported` is never dispatched and is ignored here.
    pub fn register(&mut self, kind: FileKind, extractor: Arc<dyn Extractor>) {
        if kind == FileKind::Unsupported {
            tracing::warn!(
                "Ignoring extractor {} registered for unsupported kind",
                extractor.name()
            );
            return;
        }
        self.extractors.insert(kind, extractor);
    }

    /// Find the extractor for `kind`.
    pub fn get(&self, kind: FileKind) -> Option<Arc<dyn Extractor>> {
        self.extractors.get(&kind).cloned()
    }

    pub fn contains(&self, kind: FileKind) -> bool {
        self.extractors.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }
}

impl fmt::Debug for ExtractorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries: Vec<(&'static str, &'static str)> = self
            .extractors
            .iter()
            .map(|(kind, extractor)| (kind.as_str(), extractor.name()))
            .collect();
        entries.sort();
        f.debug_map().entries(entries).finish()
    }
}
