//! Pipeline configuration and stage failure types.

use std::path::PathBuf;
use std::time::Duration;

use crate::models::FailureKind;

/// Default upper bound on a fetched blob (256 MiB).
pub const DEFAULT_MAX_BLOB_BYTES: u64 = 256 * 1024 * 1024;

/// Configuration for the pipeline service.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Parent directory for per-run scratch directories. System temp dir if unset.
    pub scratch_dir: Option<PathBuf>,
    pub max_blob_bytes: u64,
    pub fetch_timeout: Duration,
    pub scan_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            scratch_dir: None,
            max_blob_bytes: DEFAULT_MAX_BLOB_BYTES,
            fetch_timeout: Duration::from_secs(60),
            scan_timeout: Duration::from_secs(120),
        }
    }
}

/// A classified failure raised at a stage boundary.
///
/// `detail` is logged in full; the outcome only carries a sanitized copy.
#[derive(Debug)]
pub(crate) struct StageFailure {
    pub kind: FailureKind,
    pub detail: String,
}

impl StageFailure {
    pub fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}
