//! Document references and format discrimination.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies one stored object by container and key.
///
/// Created once per invocation and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentReference {
    container_id: String,
    object_key: String,
}

impl DocumentReference {
    /// Create a reference to `object_key` inside `container_id`.
    pub fn new(container_id: impl Into<String>, object_key: impl Into<String>) -> Self {
        Self {
            container_id: container_id.into(),
            object_key: object_key.into(),
        }
    }

    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    pub fn object_key(&self) -> &str {
        &self.object_key
    }

    /// Last path component of the key.
    pub fn file_name(&self) -> &str {
        self.object_key
            .rsplit('/')
            .find(|part| !part.is_empty())
            .unwrap_or("object")
    }

    /// Format of the object, decided by its key suffix.
    pub fn file_kind(&self) -> FileKind {
        FileKind::from_key(&self.object_key)
    }
}

impl fmt::Display for DocumentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.container_id, self.object_key)
    }
}

/// Document format discriminator used to select an extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileKind {
    Pdf,
    Docx,
    Unsupported,
}

impl FileKind {
    /// Classify an object key by case-insensitive suffix.
    ///
    /// `.pdf` is PDF, `.docx` is DOCX, everything else is unsupported.
    pub fn from_key(key: &str) -> Self {
        let lower = key.to_lowercase();
        if lower.ends_with(".pdf") {
            FileKind::Pdf
        } else if lower.ends_with(".docx") {
            FileKind::Docx
        } else {
            FileKind::Unsupported
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Pdf => "pdf",
            FileKind::Docx => "docx",
            FileKind::Unsupported => "unsupported",
        }
    }

    /// Canonical MIME type for supported kinds.
    pub fn mime_type(&self) -> Option<&'static str> {
        match self {
            FileKind::Pdf => Some("application/pdf"),
            FileKind::Docx => {
                Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document")
            }
            FileKind::Unsupported => None,
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
