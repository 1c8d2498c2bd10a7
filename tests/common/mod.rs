//! Fakes and fixtures shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use docpipe::scanner::ScanError;
use docpipe::{
    BlobFetcher, ContentScanner, DocumentReference, ExtractionError, ExtractionResult, Extractor,
    FetchError, ScanVerdict, ScratchHandle,
};

/// In-memory storage keyed by `container/key`.
#[derive(Default)]
pub struct FakeFetcher {
    objects: HashMap<String, Vec<u8>>,
    delay: Option<Duration>,
    fail: bool,
    pub calls: Arc<AtomicUsize>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(mut self, container: &str, key: &str, bytes: Vec<u8>) -> Self {
        self.objects.insert(format!("{}/{}", container, key), bytes);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlobFetcher for FakeFetcher {
    fn name(&self) -> &str {
        "fake"
    }

    async fn fetch(
        &self,
        reference: &DocumentReference,
        scratch: &mut ScratchHandle,
    ) -> Result<u64, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(FetchError::Request("connection reset by peer".to_string()));
        }
        let bytes = self
            .objects
            .get(&reference.to_string())
            .ok_or(FetchError::NotFound)?;
        let mut writer = scratch.writer().await?;
        writer.write_chunk(bytes).await?;
        Ok(writer.finish().await?)
    }
}

/// Scanner returning a fixed verdict.
pub struct FakeScanner {
    verdict: ScanVerdict,
    delay: Option<Duration>,
    error: bool,
    pub calls: Arc<AtomicUsize>,
}

impl FakeScanner {
    pub fn clean() -> Self {
        Self::with_verdict(ScanVerdict::Clean)
    }

    pub fn infected() -> Self {
        Self::with_verdict(ScanVerdict::Infected {
            signature: "Eicar-Test-Signature".to_string(),
        })
    }

    pub fn unavailable() -> Self {
        Self::with_verdict(ScanVerdict::Unavailable {
            reason: "engine offline".to_string(),
        })
    }

    /// Scanner whose engine call fails outright.
    pub fn erroring() -> Self {
        Self {
            error: true,
            ..Self::clean()
        }
    }

    pub fn with_verdict(verdict: ScanVerdict) -> Self {
        Self {
            verdict,
            delay: None,
            error: false,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentScanner for FakeScanner {
    fn name(&self) -> &str {
        "fake"
    }

    async fn is_available(&self) -> bool {
        !self.error
    }

    fn availability_hint(&self) -> String {
        "none".to_string()
    }

    async fn scan_file(&self, path: &Path) -> Result<ScanVerdict, ScanError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(path.exists(), "scanner must see the fetched blob");
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.error {
            return Err(ScanError::Protocol("garbled reply".to_string()));
        }
        Ok(self.verdict.clone())
    }
}

#[derive(Clone)]
pub enum SpyMode {
    Succeed(Vec<String>),
    /// Fail with a message that names the file path.
    Fail,
    Panic,
}

/// Extractor that counts its calls.
#[derive(Clone)]
pub struct SpyExtractor {
    mode: SpyMode,
    pub calls: Arc<AtomicUsize>,
}

impl SpyExtractor {
    pub fn new(mode: SpyMode) -> Self {
        Self {
            mode,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn succeeding() -> Self {
        Self::new(SpyMode::Succeed(vec!["spy text".to_string()]))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Extractor for SpyExtractor {
    fn name(&self) -> &'static str {
        "spy"
    }

    fn extract(&self, path: &Path) -> Result<ExtractionResult, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.mode {
            SpyMode::Succeed(fragments) => Ok(ExtractionResult::from_fragments(fragments.clone())),
            SpyMode::Fail => Err(ExtractionError::Malformed(format!(
                "cannot parse {}",
                path.display()
            ))),
            SpyMode::Panic => panic!("extractor blew up on {}", path.display()),
        }
    }
}

/// Number of entries directly under `dir`.
pub fn entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

/// A PDF with one text page per entry; empty entries are blank pages.
pub fn pdf_bytes(pages: &[&str]) -> Vec<u8> {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let kids: Vec<Object> = pages
        .iter()
        .map(|text| {
            let mut operations = Vec::new();
            if !text.is_empty() {
                operations = vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 14.into()]),
                    Operation::new("Td", vec![100.into(), 600.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ];
            }
            let content = Content { operations };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            Object::Reference(doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }))
        })
        .collect();

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// A DOCX container with one paragraph per entry.
pub fn docx_bytes(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| {
            let escaped = p
                .replace('&', "&amp;")
                .replace('<', "&lt;")
                .replace('>', "&gt;");
            format!("<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>", escaped)
        })
        .collect();
    let document = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
         <w:body>{}<w:sectPr/></w:body></w:document>",
        body
    );
    docx_with_document(Some(&document))
}

/// A zip container with the given `word/document.xml`, or without one.
pub fn docx_with_document(document: Option<&str>) -> Vec<u8> {
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    writer.start_file("[Content_Types].xml", options).unwrap();
    writer
        .write_all(
            b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
              <Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
              <Default Extension=\"xml\" ContentType=\"application/xml\"/></Types>",
        )
        .unwrap();
    if let Some(document) = document {
        writer.start_file("word/document.xml", options).unwrap();
        writer.write_all(document.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}
