//! Data models for pipeline input and output.

mod document;
mod outcome;

pub use document::{DocumentReference, FileKind};
pub use outcome::{FailureKind, PipelineOutcome, PipelineReport, ReportStatus};
