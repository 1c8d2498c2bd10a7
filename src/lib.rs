//! docpipe - document ingestion stage.
//!
//! Retrieves an uploaded object, screens it with a malware scanner and
//! extracts its text according to its format. Every run produces a single
//! classified [`PipelineOutcome`].

pub mod config;
pub mod event;
pub mod extract;
pub mod models;
pub mod scanner;
pub mod scratch;
pub mod services;
pub mod storage;
pub mod utils;

pub use extract::{ExtractionError, ExtractionResult, Extractor, ExtractorRegistry};
pub use models::{DocumentReference, FailureKind, FileKind, PipelineOutcome, PipelineReport};
pub use scanner::{ContentScanner, ScanVerdict};
pub use scratch::ScratchHandle;
pub use services::pipeline::{Pipeline, PipelineConfig};
pub use storage::{BlobFetcher, FetchError};
