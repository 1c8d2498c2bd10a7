//! Document pipeline service.
//!
//! Runs one document through fetch, scan and extraction, strictly in that
//! order, and classifies the first failure. Collaborators are injected so
//! the service holds no process-wide state and concurrent runs share
//! nothing mutable.

mod types;

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use futures::StreamExt;
use tokio::time::timeout;

use crate::extract::{ExtractionResult, ExtractorRegistry};
use crate::models::{DocumentReference, FailureKind, FileKind, PipelineOutcome};
use crate::scanner::{ContentScanner, ScanVerdict};
use crate::scratch::ScratchHandle;
use crate::storage::BlobFetcher;

pub use types::{PipelineConfig, DEFAULT_MAX_BLOB_BYTES};
use types::StageFailure;

/// Service that turns a document reference into a [`PipelineOutcome`].
#[derive(Clone)]
pub struct Pipeline {
    fetcher: Arc<dyn BlobFetcher>,
    scanner: Arc<dyn ContentScanner>,
    registry: Arc<ExtractorRegistry>,
    config: Arc<PipelineConfig>,
}

impl Pipeline {
    /// Create a new pipeline service.
    pub fn new(
        fetcher: Arc<dyn BlobFetcher>,
        scanner: Arc<dyn ContentScanner>,
        registry: ExtractorRegistry,
        config: PipelineConfig,
    ) -> Self {
        Self {
            fetcher,
            scanner,
            registry: Arc::new(registry),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn registry(&self) -> &ExtractorRegistry {
        &self.registry
    }

    pub fn scanner(&self) -> &Arc<dyn ContentScanner> {
        &self.scanner
    }

    /// Process one document.
    ///
    /// Never panics and never returns an internal error type; every fault is
    /// folded into the outcome. Scratch storage is gone by the time this
    /// returns.
    pub async fn run(&self, reference: &DocumentReference) -> PipelineOutcome {
        let started = Instant::now();
        match self.execute(reference).await {
            Ok(result) => {
                tracing::info!(
                    container = reference.container_id(),
                    key = reference.object_key(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Extracted text length: {} ({} fragments)",
                    result.char_count(),
                    result.fragment_count()
                );
                PipelineOutcome::Success(result)
            }
            Err(failure) => {
                tracing::warn!(
                    container = reference.container_id(),
                    key = reference.object_key(),
                    kind = failure.kind.as_str(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Pipeline failed: {}",
                    failure.detail
                );
                PipelineOutcome::failure(failure.kind, &failure.detail)
            }
        }
    }

    /// Process several documents with at most `concurrency` in flight.
    ///
    /// Outcomes are returned in input order.
    pub async fn run_batch(
        &self,
        references: &[DocumentReference],
        concurrency: usize,
    ) -> Vec<PipelineOutcome> {
        futures::stream::iter(references)
            .map(|reference| self.run(reference))
            .buffered(concurrency.max(1))
            .collect()
            .await
    }

    async fn execute(
        &self,
        reference: &DocumentReference,
    ) -> Result<ExtractionResult, StageFailure> {
        let mut scratch = ScratchHandle::acquire(
            self.config.scratch_dir.as_deref(),
            reference.file_name(),
            self.config.max_blob_bytes,
        )
        .map_err(|e| {
            StageFailure::new(
                FailureKind::FetchError,
                format!("scratch storage unavailable: {}", e),
            )
        })?;

        self.fetch(reference, &mut scratch).await?;
        self.scan(reference, scratch.path()).await?;
        self.extract(reference, &scratch).await
    }

    async fn fetch(
        &self,
        reference: &DocumentReference,
        scratch: &mut ScratchHandle,
    ) -> Result<u64, StageFailure> {
        let started = Instant::now();
        let fetched = timeout(self.config.fetch_timeout, self.fetcher.fetch(reference, scratch))
            .await
            .map_err(|_| {
                StageFailure::new(
                    FailureKind::FetchError,
                    format!(
                        "fetch timed out after {}s",
                        self.config.fetch_timeout.as_secs_f32()
                    ),
                )
            })?
            .map_err(|e| {
                StageFailure::new(
                    FailureKind::FetchError,
                    format!("{} fetch failed: {}", self.fetcher.name(), e),
                )
            })?;

        tracing::debug!(
            stage = "fetch",
            container = reference.container_id(),
            key = reference.object_key(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Fetched {} bytes",
            fetched
        );
        Ok(fetched)
    }

    async fn scan(&self, reference: &DocumentReference, path: &Path) -> Result<(), StageFailure> {
        let started = Instant::now();
        let verdict = timeout(self.config.scan_timeout, self.scanner.scan(path))
            .await
            .unwrap_or_else(|_| ScanVerdict::Unavailable {
                reason: format!(
                    "scan timed out after {}s",
                    self.config.scan_timeout.as_secs_f32()
                ),
            });

        tracing::debug!(
            stage = "scan",
            container = reference.container_id(),
            key = reference.object_key(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Scan verdict: {:?}",
            verdict
        );

        match verdict {
            ScanVerdict::Clean => Ok(()),
            ScanVerdict::Infected { signature } => Err(StageFailure::new(
                FailureKind::SecurityRejected,
                format!("malware detected: {}", signature),
            )),
            ScanVerdict::Unavailable { reason } => Err(StageFailure::new(
                FailureKind::ScanError,
                format!("{} could not scan: {}", self.scanner.name(), reason),
            )),
        }
    }

    async fn extract(
        &self,
        reference: &DocumentReference,
        scratch: &ScratchHandle,
    ) -> Result<ExtractionResult, StageFailure> {
        let kind = reference.file_kind();
        let extractor = self.registry.get(kind).ok_or_else(|| {
            StageFailure::new(
                FailureKind::UnsupportedType,
                format!("no extractor for {}", reference.file_name()),
            )
        })?;

        let started = Instant::now();
        let path = scratch.path().to_path_buf();
        let name = extractor.name();
        let extracted = tokio::task::spawn_blocking(move || {
            log_sniffed_type(&path, kind);
            extractor.extract(&path)
        })
        .await;

        tracing::debug!(
            stage = "extract",
            container = reference.container_id(),
            key = reference.object_key(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Ran {} extractor",
            name
        );

        match extracted {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(e)) => Err(StageFailure::new(
                FailureKind::ExtractionError,
                format!("{} extraction failed: {}", name, e),
            )),
            Err(e) if e.is_panic() => Err(StageFailure::new(
                FailureKind::ExtractionError,
                format!("{} extractor panicked", name),
            )),
            Err(e) => Err(StageFailure::new(
                FailureKind::ExtractionError,
                format!("{} extractor did not finish: {}", name, e),
            )),
        }
    }
}

/// Log when the content does not look like the format its key claims.
///
/// Dispatch stays key-based; this only helps diagnose mislabelled uploads.
fn log_sniffed_type(path: &Path, kind: FileKind) {
    let Some(expected) = kind.mime_type() else {
        return;
    };
    match infer::get_from_path(path) {
        Ok(Some(sniffed)) if sniffed.mime_type() != expected => {
            tracing::debug!(
                "Content looks like {} but key says {}",
                sniffed.mime_type(),
                expected
            );
        }
        Ok(None) => tracing::debug!("Content type not recognised, expected {}", expected),
        _ => {}
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("fetcher", &self.fetcher.name())
            .field("scanner", &self.scanner.name())
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish()
    }
}
