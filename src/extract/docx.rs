//! DOCX text extraction.
//!
//! A DOCX file is a zip container; the body lives in `word/document.xml`.
//! The part is streamed through quick-xml and each `w:p` element becomes one
//! fragment.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use zip::result::ZipError;
use zip::ZipArchive;

use super::backend::{ExtractionError, ExtractionResult, Extractor};

/// Zip entry holding the main document body.
const DOCUMENT_PART: &str = "word/document.xml";

/// Streaming iterator over paragraph text in document order.
///
/// Text runs (`w:t`) are concatenated, `w:tab` becomes a tab and
/// `w:br`/`w:cr` become newlines. Paragraphs nested inside text boxes are
/// folded into their enclosing paragraph.
pub struct Paragraphs<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    current: Option<String>,
    depth: usize,
    in_text: bool,
    done: bool,
}

impl<R: BufRead> Paragraphs<R> {
    pub fn new(source: R) -> Self {
        Self {
            reader: Reader::from_reader(source),
            buf: Vec::new(),
            current: None,
            depth: 0,
            in_text: false,
            done: false,
        }
    }

    fn push(&mut self, text: &str) {
        if let Some(current) = self.current.as_mut() {
            current.push_str(text);
        }
    }

    fn fail(&mut self, message: String) -> Option<Result<String, ExtractionError>> {
        self.done = true;
        Some(Err(ExtractionError::Malformed(message)))
    }
}

impl<R: BufRead> Iterator for Paragraphs<R> {
    type Item = Result<String, ExtractionError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            self.buf.clear();
            let event = match self.reader.read_event_into(&mut self.buf) {
                Ok(event) => event.into_owned(),
                Err(e) => {
                    let position = self.reader.buffer_position();
                    return self.fail(format!("invalid document XML at byte {}: {}", position, e));
                }
            };

            match event {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"p" => {
                        if self.depth == 0 {
                            self.current = Some(String::new());
                        }
                        self.depth += 1;
                    }
                    b"t" => self.in_text = true,
                    _ => {}
                },
                Event::Empty(e) => match e.local_name().as_ref() {
                    b"p" if self.depth == 0 => return Some(Ok(String::new())),
                    b"tab" => self.push("\t"),
                    b"br" | b"cr" => self.push("\n"),
                    _ => {}
                },
                Event::Text(t) if self.in_text => match t.unescape() {
                    Ok(text) => self.push(&text),
                    Err(e) => return self.fail(format!("invalid text escape: {}", e)),
                },
                Event::CData(t) if self.in_text => {
                    let text = String::from_utf8_lossy(&t).into_owned();
                    self.push(&text);
                }
                Event::End(e) => match e.local_name().as_ref() {
                    b"t" => self.in_text = false,
                    b"p" if self.depth > 0 => {
                        self.depth -= 1;
                        if self.depth == 0 {
                            if let Some(paragraph) = self.current.take() {
                                return Some(Ok(paragraph));
                            }
                        }
                    }
                    _ => {}
                },
                Event::Eof => {
                    self.done = true;
                    if self.depth > 0 {
                        return Some(Err(ExtractionError::Malformed(
                            "document XML ended inside a paragraph".to_string(),
                        )));
                    }
                    return None;
                }
                _ => {}
            }
        }
    }
}

/// Extracts one fragment per paragraph.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocxExtractor;

impl DocxExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Extractor for DocxExtractor {
    fn name(&self) -> &'static str {
        "docx"
    }

    fn extract(&self, path: &Path) -> Result<ExtractionResult, ExtractionError> {
        let file = File::open(path)?;
        let mut archive = ZipArchive::new(BufReader::new(file))
            .map_err(|e| ExtractionError::Malformed(format!("not a DOCX container: {}", e)))?;

        let part = archive.by_name(DOCUMENT_PART).map_err(|e| match e {
            ZipError::FileNotFound => {
                ExtractionError::Malformed(format!("missing {}", DOCUMENT_PART))
            }
            other => ExtractionError::Unreadable(other.to_string()),
        })?;

        let fragments = Paragraphs::new(BufReader::new(part)).collect::<Result<Vec<_>, _>>()?;
        tracing::debug!("Extracted {} paragraphs from DOCX", fragments.len());
        Ok(ExtractionResult::from_fragments(fragments))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use tempfile::tempdir;

    fn paragraphs(body: &str) -> Vec<String> {
        let xml = format!(
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}<w:sectPr/></w:body></w:document>"#,
            body
        );
        Paragraphs::new(Cursor::new(xml.into_bytes()))
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn test_paragraphs_in_order() {
        let result = paragraphs(
            r#"<w:p><w:r><w:t>First</w:t></w:r></w:p><w:p><w:r><w:t>Second</w:t></w:r></w:p>"#,
        );
        assert_eq!(result, vec!["First", "Second"]);
    }

    #[test]
    fn test_runs_are_concatenated() {
        let result = paragraphs(
            r#"<w:p><w:r><w:t xml:space="preserve">Hello </w:t></w:r><w:r><w:rPr><w:b/></w:rPr><w:t>bold</w:t></w:r><w:r><w:t> world</w:t></w:r></w:p>"#,
        );
        assert_eq!(result, vec!["Hello bold world"]);
    }

    #[test]
    fn test_tabs_breaks_and_entities() {
        let result = paragraphs(
            r#"<w:p><w:r><w:t>a</w:t><w:tab/><w:t>b</w:t><w:br/><w:t>Fish &amp; Chips</w:t></w:r></w:p>"#,
        );
        assert_eq!(result, vec!["a\tb\nFish & Chips"]);
    }

    #[test]
    fn test_empty_paragraphs_are_kept() {
        let result = paragraphs(r#"<w:p/><w:p><w:pPr/></w:p><w:p><w:r><w:t>x</w:t></w:r></w:p>"#);
        assert_eq!(result, vec!["", "", "x"]);
    }

    #[test]
    fn test_ignores_non_text_elements() {
        let result = paragraphs(
            r#"<w:p><w:r><w:instrText>PAGE</w:instrText><w:delText>gone</w:delText><w:t>kept</w:t></w:r></w:p>"#,
        );
        assert_eq!(result, vec!["kept"]);
    }

    #[test]
    fn test_nested_paragraphs_fold_into_outer() {
        let result = paragraphs(
            r#"<w:p><w:r><w:t>outer </w:t><w:txbxContent><w:p><w:r><w:t>inner</w:t></w:r></w:p></w:txbxContent></w:r></w:p>"#,
        );
        assert_eq!(result, vec!["outer inner"]);
    }

    #[test]
    fn test_truncated_xml_is_malformed() {
        let xml = r#"<w:document xmlns:w="x"><w:body><w:p><w:r><w:t>cut"#;
        let result: Result<Vec<_>, _> = Paragraphs::new(Cursor::new(xml.as_bytes())).collect();
        assert!(matches!(result, Err(ExtractionError::Malformed(_))));
    }

    #[test]
    fn test_not_a_zip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plain.docx");
        std::fs::write(&path, b"plain text pretending").unwrap();

        let err = DocxExtractor::new().extract(&path).unwrap_err();
        assert!(matches!(err, ExtractionError::Malformed(_)));
    }
}
