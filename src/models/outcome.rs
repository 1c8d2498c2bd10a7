//! Pipeline outcome and the report handed back to the invoking system.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::extract::ExtractionResult;
use crate::utils::sanitize_message;

/// Classification of a failed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    /// The object could not be retrieved into scratch storage.
    FetchError,
    /// The scanner flagged the content as malicious.
    SecurityRejected,
    /// The scanner could not produce a verdict.
    ScanError,
    /// No extractor handles the object's format.
    UnsupportedType,
    /// The extractor could not read the document.
    ExtractionError,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::FetchError => "FETCH_ERROR",
            FailureKind::SecurityRejected => "SECURITY_REJECTED",
            FailureKind::ScanError => "SCAN_ERROR",
            FailureKind::UnsupportedType => "UNSUPPORTED_TYPE",
            FailureKind::ExtractionError => "EXTRACTION_ERROR",
        }
    }

    /// Whether re-invoking the pipeline on the same object may succeed.
    ///
    /// Only fetch failures are considered transient. Scan failures stay
    /// non-retryable until the scanner is known to be healthy again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FailureKind::FetchError)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The single value a pipeline run returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    Success(ExtractionResult),
    Failure { kind: FailureKind, message: String },
}

impl PipelineOutcome {
    /// Build a failure with a sanitized, bounded message.
    pub fn failure(kind: FailureKind, message: impl AsRef<str>) -> Self {
        PipelineOutcome::Failure {
            kind,
            message: sanitize_message(message.as_ref()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PipelineOutcome::Success(_))
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            PipelineOutcome::Success(_) => None,
            PipelineOutcome::Failure { kind, .. } => Some(*kind),
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            PipelineOutcome::Success(_) => None,
            PipelineOutcome::Failure { message, .. } => Some(message),
        }
    }

    pub fn result(&self) -> Option<&ExtractionResult> {
        match self {
            PipelineOutcome::Success(result) => Some(result),
            PipelineOutcome::Failure { .. } => None,
        }
    }

    pub fn into_result(self) -> Option<ExtractionResult> {
        match self {
            PipelineOutcome::Success(result) => Some(result),
            PipelineOutcome::Failure { .. } => None,
        }
    }

    /// Summarize this outcome for the invoking system.
    pub fn report(&self) -> PipelineReport {
        match self {
            PipelineOutcome::Success(result) => PipelineReport {
                status: ReportStatus::Success,
                failure_kind: None,
                message: None,
                extracted_char_count: Some(result.char_count()),
                extracted_fragment_count: Some(result.fragment_count()),
            },
            PipelineOutcome::Failure { kind, message } => PipelineReport {
                status: ReportStatus::Failure,
                failure_kind: Some(*kind),
                message: Some(message.clone()),
                extracted_char_count: None,
                extracted_fragment_count: None,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    Success,
    Failure,
}

/// Structured result reported to the invoking system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineReport {
    pub status: ReportStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_kind: Option<FailureKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_char_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_fragment_count: Option<usize>,
}
